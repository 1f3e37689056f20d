use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::command::{CommandHandler, Context, Mutation, Outcome};
use crate::error::ServiceResult;
use crate::reply::{Embed, Reply, code_block, colors, truncate};
use crate::storage::Stores;
use crate::types::{Review, ReviewFeedback, ReviewStatus};

const CODE_PREVIEW_CHARS: usize = 1000;
const LIST_LIMIT: usize = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReviewSubmit {
    pub title: String,
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReviewList {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReviewRespond {
    pub id: u64,
    pub feedback: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReviewClose {
    pub id: u64,
}

/// Creation time in ms, bumped past every existing id.
fn next_review_id(ctx: &Context, stores: &Stores) -> u64 {
    let now = u64::try_from(ctx.now.timestamp_millis()).unwrap_or_default();
    let highest = stores.reviews.values().map(|r| r.id).max();
    match highest {
        Some(highest) if highest >= now => highest + 1,
        _ => now,
    }
}

fn not_found() -> Outcome {
    Reply::notice("❌ Review not found!").into()
}

impl CommandHandler for ReviewSubmit {
    fn run(self, ctx: &Context, stores: &Stores) -> ServiceResult<Outcome> {
        let id = next_review_id(ctx, stores);
        let description = self
            .description
            .as_deref()
            .unwrap_or("No specific feedback requested");

        let embed = Embed::new(colors::ALERT, "🔍 Code Review Submitted!")
            .description(format!("**{}** (ID: {id})", self.title))
            .inline_field("Language", self.language.as_str())
            .inline_field("Status", "Pending Review")
            .field("Description", description)
            .field(
                "Code",
                code_block(&self.language, &truncate(&self.code, CODE_PREVIEW_CHARS)),
            )
            .footer("Others can now provide feedback using /review feedback");

        let review = Review {
            id,
            title: self.title,
            code: self.code,
            language: self.language,
            description: self.description,
            owner_id: ctx.owner().to_string(),
            author_name: ctx.caller.name.clone(),
            feedback: Vec::new(),
            status: ReviewStatus::Pending,
            created_at: ctx.now,
        };
        Ok(Outcome::reply(Reply::embed(embed))
            .with_mutation(Mutation::Review(id.to_string(), review)))
    }
}

impl CommandHandler for ReviewList {
    fn run(self, _ctx: &Context, stores: &Stores) -> ServiceResult<Outcome> {
        let lines: Vec<String> = stores
            .reviews
            .values()
            .filter(|r| r.status == ReviewStatus::Pending)
            .take(LIST_LIMIT)
            .map(|r| {
                format!(
                    "**{}**: {} ({}) - by {}",
                    r.id, r.title, r.language, r.author_name
                )
            })
            .collect();
        if lines.is_empty() {
            return Ok(Reply::notice("🔍 No pending code reviews!").into());
        }

        let embed = Embed::new(colors::ALERT, "🔍 Pending Code Reviews")
            .description(lines.join("\n"))
            .footer("Use /review feedback [id] to provide feedback");
        Ok(Reply::embed(embed).into())
    }
}

impl CommandHandler for ReviewRespond {
    fn run(self, ctx: &Context, stores: &Stores) -> ServiceResult<Outcome> {
        let key = self.id.to_string();
        let Some(review) = stores.reviews.get(&key) else {
            return Ok(not_found());
        };
        if review.status == ReviewStatus::Closed {
            return Ok(Reply::notice(format!(
                "🔒 Review {} is closed and no longer takes feedback.",
                review.id
            ))
            .into());
        }

        let mut review = review.clone();
        review.feedback.push(ReviewFeedback {
            owner_id: ctx.owner().to_string(),
            author_name: ctx.caller.name.clone(),
            feedback: self.feedback.clone(),
            timestamp: ctx.now,
        });

        let embed = Embed::new(colors::TIMER, "💬 Feedback Added!")
            .description(format!("Feedback added to review: **{}**", review.title))
            .field("Your Feedback", self.feedback);
        Ok(Outcome::reply(Reply::embed(embed)).with_mutation(Mutation::Review(key, review)))
    }
}

impl CommandHandler for ReviewClose {
    fn run(self, ctx: &Context, stores: &Stores) -> ServiceResult<Outcome> {
        let key = self.id.to_string();
        let Some(review) = stores.reviews.get(&key) else {
            return Ok(not_found());
        };
        if review.owner_id != ctx.owner() {
            return Ok(Reply::notice("❌ Only the author can close this review.").into());
        }
        if review.status == ReviewStatus::Closed {
            return Ok(Reply::notice(format!("✅ Review {} is already closed.", review.id)).into());
        }

        let mut review = review.clone();
        review.status = ReviewStatus::Closed;

        let embed = Embed::new(colors::SUCCESS, "🔒 Review Closed")
            .description(format!("**{}** (ID: {})", review.title, review.id))
            .inline_field("Feedback Received", review.feedback.len().to_string());
        Ok(Outcome::reply(Reply::embed(embed)).with_mutation(Mutation::Review(key, review)))
    }
}
