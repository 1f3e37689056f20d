use chrono::Duration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::command::{CommandHandler, Context, Mutation, Outcome};
use crate::error::ServiceResult;
use crate::key::derive_key;
use crate::query::{group_sum, top_n};
use crate::reply::{Embed, Reply, colors};
use crate::storage::Stores;
use crate::types::ProgressLog;

const TOP_TOPICS: usize = 5;
const WEEK_DAYS: i64 = 7;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProgressLogSession {
    pub topic: String,
    pub hours: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProgressStats {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProgressWeek {}

/// Logs are keyed by creation time; two sessions in the same millisecond get
/// consecutive keys instead of overwriting each other.
fn session_key(ctx: &Context, stores: &Stores) -> String {
    let mut stamp = ctx.now.timestamp_millis();
    loop {
        let key = derive_key(ctx.owner(), &stamp.to_string());
        if !stores.progress.has(&key) {
            return key;
        }
        stamp += 1;
    }
}

fn nothing_logged() -> Outcome {
    Reply::notice("📊 No progress logged yet!").into()
}

impl CommandHandler for ProgressLogSession {
    fn run(self, ctx: &Context, stores: &Stores) -> ServiceResult<Outcome> {
        let date = ctx.now.date_naive();
        let embed = Embed::new(colors::TIMER, "📊 Progress Logged!")
            .inline_field("Topic", self.topic.as_str())
            .inline_field("Hours", self.hours.to_string())
            .inline_field("Date", date.to_string())
            .field("Notes", self.notes.as_deref().unwrap_or("No notes provided"))
            .footer("Great job! Keep up the learning momentum!");

        let key = session_key(ctx, stores);
        let log = ProgressLog {
            owner_id: ctx.owner().to_string(),
            topic: self.topic,
            hours: self.hours,
            notes: self.notes,
            date,
            created_at: ctx.now,
        };
        Ok(Outcome::reply(Reply::embed(embed)).with_mutation(Mutation::Progress(key, log)))
    }
}

/// `total / count` in tenths, ties rounded up.
fn tenths_half_up(total: u64, count: u64) -> u64 {
    (total * 20 + count) / (count * 2)
}

impl CommandHandler for ProgressStats {
    fn run(self, ctx: &Context, stores: &Stores) -> ServiceResult<Outcome> {
        let logs: Vec<&ProgressLog> = stores.progress.owned_by(ctx.owner()).map(|(_, l)| l).collect();
        if logs.is_empty() {
            return Ok(nothing_logged());
        }

        let total: u64 = logs.iter().map(|l| u64::from(l.hours)).sum();
        let average = tenths_half_up(total, logs.len() as u64);
        let by_topic = group_sum(logs.iter().copied(), |l| l.topic.clone(), |l| u64::from(l.hours));
        let top: Vec<String> = top_n(by_topic, TOP_TOPICS)
            .into_iter()
            .map(|(topic, hours)| format!("{topic}: {hours}h"))
            .collect();

        let embed = Embed::new(colors::STATS, "📊 Your Learning Statistics")
            .inline_field("Total Hours Logged", total.to_string())
            .inline_field("Sessions Logged", logs.len().to_string())
            .inline_field(
                "Average per Session",
                format!("{}.{}h", average / 10, average % 10),
            )
            .field("Top Topics", top.join("\n"))
            .footer("Keep up the great work!");
        Ok(Reply::embed(embed).into())
    }
}

impl CommandHandler for ProgressWeek {
    fn run(self, ctx: &Context, stores: &Stores) -> ServiceResult<Outcome> {
        let today = ctx.now.date_naive();
        let since = today - Duration::days(WEEK_DAYS - 1);
        let logs: Vec<&ProgressLog> = stores
            .progress
            .owned_by(ctx.owner())
            .map(|(_, l)| l)
            .filter(|l| l.date >= since && l.date <= today)
            .collect();

        if logs.is_empty() {
            return Ok(Reply::notice("📊 Nothing logged in the last 7 days.").into());
        }

        let total: u64 = logs.iter().map(|l| u64::from(l.hours)).sum();
        let mut per_day = group_sum(logs.iter().copied(), |l| l.date, |l| u64::from(l.hours));
        per_day.sort_keys();
        let days: Vec<String> = per_day
            .iter()
            .map(|(date, hours)| format!("{date}: {hours}h"))
            .collect();

        let embed = Embed::new(colors::STATS, "📅 Your Week in Review")
            .description(format!("{since} to {today}"))
            .inline_field("Hours", total.to_string())
            .inline_field("Sessions", logs.len().to_string())
            .field("By Day", days.join("\n"));
        Ok(Reply::embed(embed).into())
    }
}
