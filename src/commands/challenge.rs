use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::command::{CommandHandler, Context, Mutation, Outcome};
use crate::error::ServiceResult;
use crate::key::derive_key;
use crate::query::{contains_ci, group_count};
use crate::reply::{Embed, Reply, colors, truncate};
use crate::storage::Stores;
use crate::types::{ChallengeAssignment, Difficulty};

pub struct CatalogEntry {
    pub title: &'static str,
    pub description: &'static str,
    pub difficulty: Difficulty,
    pub tags: &'static [&'static str],
}

pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        title: "Array Manipulation",
        description: "Write a function that finds the second largest number in an array.",
        difficulty: Difficulty::Easy,
        tags: &["arrays", "algorithms"],
    },
    CatalogEntry {
        title: "String Reversal",
        description: "Reverse a string without using built-in reverse methods.",
        difficulty: Difficulty::Easy,
        tags: &["strings", "algorithms"],
    },
    CatalogEntry {
        title: "Binary Tree Traversal",
        description: "Implement in-order traversal of a binary tree.",
        difficulty: Difficulty::Medium,
        tags: &["trees", "recursion"],
    },
    CatalogEntry {
        title: "API Rate Limiter",
        description: "Design a rate limiter that allows N requests per minute.",
        difficulty: Difficulty::Hard,
        tags: &["system-design", "algorithms"],
    },
    CatalogEntry {
        title: "Responsive Navigation",
        description: "Create a mobile-first responsive navigation component.",
        difficulty: Difficulty::Medium,
        tags: &["css", "frontend", "responsive"],
    },
];

const SOLUTION_PREVIEW_CHARS: usize = 500;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChallengeDraw {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChallengeComplete {
    /// Full title or any part of it.
    pub title: String,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChallengesCompleted {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChallengeStats {}

impl CommandHandler for ChallengeDraw {
    fn run(self, ctx: &Context, stores: &Stores) -> ServiceResult<Outcome> {
        let entry = &CATALOG[ctx.pick(CATALOG.len())];

        let embed = Embed::new(colors::CHALLENGE, "💪 Daily Coding Challenge")
            .field("Challenge", entry.title)
            .field("Description", entry.description)
            .inline_field("Difficulty", entry.difficulty.as_str())
            .inline_field("Tags", entry.tags.join(", "))
            .footer("Use /challenge-complete when done! Share your solution in #code-review");
        let outcome = Outcome::reply(Reply::embed(embed));

        // A repeat draw keeps the existing assignment untouched.
        let key = derive_key(ctx.owner(), entry.title);
        if stores.challenges.has(&key) {
            return Ok(outcome);
        }

        let assignment = ChallengeAssignment {
            owner_id: ctx.owner().to_string(),
            title: entry.title.to_string(),
            description: entry.description.to_string(),
            difficulty: entry.difficulty,
            tags: entry.tags.iter().map(|t| t.to_string()).collect(),
            assigned_at: ctx.now,
            completed: false,
            completed_at: None,
            solution: None,
            notes: None,
        };
        Ok(outcome.with_mutation(Mutation::Challenge(key, assignment)))
    }
}

impl CommandHandler for ChallengeComplete {
    fn run(self, ctx: &Context, stores: &Stores) -> ServiceResult<Outcome> {
        let query = self.title.to_lowercase();
        let matches: Vec<(&String, &ChallengeAssignment)> = stores
            .challenges
            .owned_by(ctx.owner())
            .filter(|(_, c)| contains_ci(&c.title, &query))
            .collect();

        let (key, challenge) = match matches.as_slice() {
            [] => {
                return Ok(Reply::notice(format!(
                    "❌ No challenge found matching \"{query}\". Try /challenge first or use the exact challenge title."
                ))
                .into());
            }
            [single] => *single,
            several => {
                let titles: Vec<&str> = several.iter().map(|(_, c)| c.title.as_str()).collect();
                return Ok(Reply::notice(format!(
                    "❌ Multiple challenges found. Be more specific:\n{}",
                    titles.join("\n")
                ))
                .into());
            }
        };

        if challenge.completed {
            return Ok(Reply::notice(format!(
                "✅ You already completed \"{}\"!",
                challenge.title
            ))
            .into());
        }

        let mut challenge = challenge.clone();
        challenge.completed = true;
        challenge.completed_at = Some(ctx.now);
        challenge.solution = self.solution;
        challenge.notes = self.notes;

        let mut embed = Embed::new(colors::SUCCESS, "🎉 Challenge Completed!")
            .field("Challenge", challenge.title.as_str())
            .inline_field("Difficulty", challenge.difficulty.as_str())
            .inline_field("Completed", ctx.now.format("%Y-%m-%d").to_string())
            .footer("Great job! Try /challenge for another one!");
        if let Some(solution) = &challenge.solution {
            embed = embed.field(
                "Your Solution",
                format!("```\n{}```", truncate(solution, SOLUTION_PREVIEW_CHARS)),
            );
        }

        Ok(Outcome::reply(Reply::embed(embed))
            .with_mutation(Mutation::Challenge(key.clone(), challenge)))
    }
}

fn owner_assignments<'a>(stores: &'a Stores, owner: &'a str) -> Vec<&'a ChallengeAssignment> {
    stores.challenges.owned_by(owner).map(|(_, c)| c).collect()
}

fn nothing_attempted() -> Outcome {
    Reply::notice("💪 No challenges attempted yet! Use `/challenge` to get started.").into()
}

impl CommandHandler for ChallengesCompleted {
    fn run(self, ctx: &Context, stores: &Stores) -> ServiceResult<Outcome> {
        let assignments = owner_assignments(stores, ctx.owner());
        if assignments.is_empty() {
            return Ok(nothing_attempted());
        }

        let lines: Vec<String> = assignments
            .iter()
            .filter(|c| c.completed)
            .map(|c| {
                let date = c
                    .completed_at
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "unknown date".to_string());
                format!("**{}** ({}) - {date}", c.title, c.difficulty.as_str())
            })
            .collect();

        if lines.is_empty() {
            return Ok(Reply::notice("🎯 No challenges completed yet! Keep working!").into());
        }

        let embed = Embed::new(colors::SUCCESS, "✅ Your Completed Challenges")
            .description(lines.join("\n"));
        Ok(Reply::embed(embed).into())
    }
}

impl CommandHandler for ChallengeStats {
    fn run(self, ctx: &Context, stores: &Stores) -> ServiceResult<Outcome> {
        let assignments = owner_assignments(stores, ctx.owner());
        if assignments.is_empty() {
            return Ok(nothing_attempted());
        }

        let completed: Vec<&ChallengeAssignment> =
            assignments.iter().copied().filter(|c| c.completed).collect();
        let pending = assignments.len() - completed.len();
        let success_rate =
            (completed.len() as f64 / assignments.len() as f64 * 100.0).round() as u32;

        let mut embed = Embed::new(colors::STATS, "📊 Your Challenge Statistics")
            .inline_field("Completed", completed.len().to_string())
            .inline_field("Pending", pending.to_string())
            .inline_field("Success Rate", format!("{success_rate}%"));

        let by_difficulty = group_count(completed.iter().copied(), |c| c.difficulty);
        if !by_difficulty.is_empty() {
            let breakdown: Vec<String> = by_difficulty
                .iter()
                .map(|(difficulty, count)| format!("{}: {count}", difficulty.as_str()))
                .collect();
            embed = embed.field("By Difficulty", breakdown.join("\n"));
        }
        Ok(Reply::embed(embed).into())
    }
}
