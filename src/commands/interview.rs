use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::command::{CommandHandler, Context, Outcome};
use crate::error::ServiceResult;
use crate::reply::{Embed, Reply, colors};
use crate::storage::Stores;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    #[default]
    Technical,
    Behavioral,
    System,
    Coding,
}

impl QuestionKind {
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::Technical => "Technical",
            QuestionKind::Behavioral => "Behavioral",
            QuestionKind::System => "System",
            QuestionKind::Coding => "Coding",
        }
    }

    pub fn questions(&self) -> &'static [&'static str] {
        match self {
            QuestionKind::Technical => &[
                "Explain the difference between `let`, `const`, and `var` in JavaScript.",
                "What is the difference between SQL and NoSQL databases?",
                "Explain REST API principles and HTTP methods.",
                "What is the difference between synchronous and asynchronous programming?",
                "Explain the concept of Big O notation.",
            ],
            QuestionKind::Behavioral => &[
                "Tell me about a challenging project you worked on.",
                "How do you handle tight deadlines?",
                "Describe a time when you had to learn a new technology quickly.",
                "How do you approach debugging a complex problem?",
                "Tell me about a time you received constructive feedback.",
            ],
            QuestionKind::System => &[
                "Design a URL shortening service like bit.ly",
                "How would you design a chat application like WhatsApp?",
                "Design a caching system for a web application.",
                "How would you design a social media feed?",
                "Design a file storage system like Dropbox.",
            ],
            QuestionKind::Coding => &[
                "Write a function to reverse a linked list.",
                "Find the two numbers in an array that sum to a target.",
                "Implement a function to check if a string is a palindrome.",
                "Write code to find the longest substring without repeating characters.",
                "Implement a binary search algorithm.",
            ],
        }
    }

    pub fn tips(&self) -> &'static str {
        match self {
            QuestionKind::Coding => {
                "• Think out loud\n• Start with a brute force approach\n• Consider edge cases\n• Optimize if possible"
            }
            QuestionKind::Behavioral => {
                "• Use the STAR method (Situation, Task, Action, Result)\n• Be specific with examples\n• Focus on your role and contributions"
            }
            QuestionKind::Technical | QuestionKind::System => {
                "• Ask clarifying questions\n• Start with high-level design\n• Consider scalability and trade-offs"
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InterviewQuestion {
    #[serde(rename = "type", default)]
    pub kind: Option<QuestionKind>,
}

impl CommandHandler for InterviewQuestion {
    fn run(self, ctx: &Context, _stores: &Stores) -> ServiceResult<Outcome> {
        let kind = self.kind.unwrap_or_default();
        let questions = kind.questions();
        let question = questions[ctx.pick(questions.len())];

        let embed = Embed::new(colors::INTERVIEW, format!("🎯 {} Interview Question", kind.label()))
            .description(question)
            .field("Tips", kind.tips())
            .footer("Take your time to think through the answer!");
        Ok(Reply::embed(embed).into())
    }
}
