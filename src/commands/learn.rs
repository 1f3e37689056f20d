use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::command::{CommandHandler, Context, Outcome};
use crate::error::ServiceResult;
use crate::reply::{Embed, Reply};
use crate::storage::Stores;

pub struct LearningPath {
    pub topic: &'static str,
    pub title: &'static str,
    pub color: u32,
    pub resources: &'static [&'static str],
}

pub const PATHS: &[LearningPath] = &[
    LearningPath {
        topic: "javascript",
        title: "JavaScript Learning Path",
        color: 0xf7df1e,
        resources: &[
            "📖 [MDN JavaScript Guide](https://developer.mozilla.org/en-US/docs/Web/JavaScript/Guide)",
            "📚 [JavaScript.info](https://javascript.info/)",
            "🎥 [JavaScript Crash Course](https://www.youtube.com/watch?v=hdI2bqOjy3c)",
            "💪 [JavaScript30](https://javascript30.com/)",
            "🧪 [Codewars JavaScript](https://www.codewars.com/?language=javascript)",
        ],
    },
    LearningPath {
        topic: "react",
        title: "React Learning Path",
        color: 0x61dafb,
        resources: &[
            "📖 [Official React Docs](https://react.dev/learn)",
            "🎥 [React Tutorial for Beginners](https://www.youtube.com/watch?v=Ke90Tje7VS0)",
            "💪 [React Challenges](https://react-challenges.vercel.app/)",
            "🛠️ [Vite](https://vitejs.dev/guide/)",
            "📚 [React Router](https://reactrouter.com/)",
        ],
    },
    LearningPath {
        topic: "nodejs",
        title: "Node.js Learning Path",
        color: 0x339933,
        resources: &[
            "📖 [Node.js Learn](https://nodejs.org/en/learn)",
            "📚 [Node.js API Reference](https://nodejs.org/api/)",
            "💪 [NodeSchool](https://nodeschool.io/)",
            "🛠️ [Express Guide](https://expressjs.com/en/guide/routing.html)",
        ],
    },
    LearningPath {
        topic: "python",
        title: "Python Learning Path",
        color: 0x3776ab,
        resources: &[
            "📖 [Python.org Tutorial](https://docs.python.org/3/tutorial/)",
            "📚 [Real Python](https://realpython.com/)",
            "💪 [HackerRank Python](https://www.hackerrank.com/domains/python)",
            "🎥 [Python Crash Course](https://www.youtube.com/watch?v=rfscVS0vtbw)",
            "🧪 [LeetCode Python](https://leetcode.com/problemset/all/?languageTags=python)",
        ],
    },
    LearningPath {
        topic: "datastructures",
        title: "Data Structures",
        color: 0x00897b,
        resources: &[
            "📚 [VisuAlgo](https://visualgo.net/)",
            "📖 [Open Data Structures](https://opendatastructures.org/)",
            "💪 [HackerRank Data Structures](https://www.hackerrank.com/domains/data-structures)",
        ],
    },
    LearningPath {
        topic: "algorithms",
        title: "Algorithms & Data Structures",
        color: 0xff6b6b,
        resources: &[
            "📖 [Introduction to Algorithms (CLRS)](https://mitpress.mit.edu/books/introduction-algorithms-third-edition)",
            "🎥 [MIT 6.006 Introduction to Algorithms](https://www.youtube.com/playlist?list=PLUl4u3cNGP61Oq3tWYp6V_F-5jb5L2iHb)",
            "💪 [LeetCode](https://leetcode.com/)",
            "📚 [Algorithm Visualizer](https://algorithm-visualizer.org/)",
            "🧪 [HackerRank Algorithms](https://www.hackerrank.com/domains/algorithms)",
        ],
    },
    LearningPath {
        topic: "systemdesign",
        title: "System Design",
        color: 0x9c27b0,
        resources: &[
            "📖 [System Design Primer](https://github.com/donnemartin/system-design-primer)",
            "🎥 [System Design Interview](https://www.youtube.com/c/SystemDesignInterview)",
            "📚 [High Scalability](http://highscalability.com/)",
            "💪 [System Design Questions](https://github.com/checkcheckzz/system-design-interview)",
            "🛠️ [AWS Architecture Center](https://aws.amazon.com/architecture/)",
        ],
    },
    LearningPath {
        topic: "devops",
        title: "DevOps Learning Path",
        color: 0x2496ed,
        resources: &[
            "📖 [Docker Getting Started](https://docs.docker.com/get-started/)",
            "📚 [Kubernetes Basics](https://kubernetes.io/docs/tutorials/kubernetes-basics/)",
            "🛠️ [GitHub Actions](https://docs.github.com/en/actions/learn-github-actions)",
            "🗺️ [DevOps Roadmap](https://roadmap.sh/devops)",
        ],
    },
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LearnTopic {
    pub topic: String,
}

pub fn find_path(topic: &str) -> Option<&'static LearningPath> {
    let topic = topic.trim().to_lowercase();
    PATHS.iter().find(|p| p.topic == topic)
}

impl CommandHandler for LearnTopic {
    fn run(self, _ctx: &Context, _stores: &Stores) -> ServiceResult<Outcome> {
        let Some(path) = find_path(&self.topic) else {
            return Ok(Reply::notice("❌ Topic not found!").into());
        };

        let embed = Embed::new(path.color, format!("🎓 {}", path.title))
            .description("Here are some curated resources to help you learn:")
            .field("Recommended Resources", path.resources.join("\n"))
            .footer("Happy learning! Set a goal with /goal set");
        Ok(Reply::embed(embed).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::ctx;

    #[test]
    fn every_topic_resolves() {
        for topic in [
            "javascript",
            "react",
            "nodejs",
            "python",
            "datastructures",
            "algorithms",
            "systemdesign",
            "devops",
        ] {
            let path = find_path(topic).unwrap();
            assert!(!path.resources.is_empty(), "{topic}");
        }
        assert_eq!(find_path(" Python ").unwrap().topic, "python");
    }

    #[test]
    fn unknown_topic_is_a_notice() {
        let outcome = LearnTopic {
            topic: "cobol".into(),
        }
        .run(&ctx("U1"), &Stores::default())
        .unwrap();
        assert_eq!(outcome.reply, Reply::notice("❌ Topic not found!"));
    }
}
