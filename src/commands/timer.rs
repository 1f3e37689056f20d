use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::command::{CommandHandler, Context, FollowUp, Outcome};
use crate::error::ServiceResult;
use crate::reply::{Embed, Reply, colors};
use crate::storage::Stores;

pub const MAX_MINUTES: u32 = 24 * 60;
const DEFAULT_TASK: &str = "coding session";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimerStart {
    /// 1 to 1440.
    pub minutes: u32,
    #[serde(default)]
    pub task: Option<String>,
}

pub fn completion_embed(minutes: u32, task: &str) -> Embed {
    Embed::new(colors::ALERT, "⏰ Timer Complete!")
        .description(format!(
            "Your {minutes} minute session for **{task}** is complete!"
        ))
        .footer("Great job! Take a break or start another session.")
}

impl CommandHandler for TimerStart {
    fn run(self, _ctx: &Context, _stores: &Stores) -> ServiceResult<Outcome> {
        let minutes = self.minutes;
        if !(1..=MAX_MINUTES).contains(&minutes) {
            return Ok(Reply::notice(format!(
                "❌ Timer length must be between 1 and {MAX_MINUTES} minutes."
            ))
            .into());
        }
        let task = self.task.as_deref().unwrap_or(DEFAULT_TASK);

        let embed = Embed::new(colors::TIMER, "⏰ Timer Started!")
            .description(format!("{minutes} minute timer for: **{task}**"))
            .inline_field("Duration", format!("{minutes} minutes"))
            .inline_field("Task", task)
            .footer("Focus and happy coding!");

        Ok(Outcome::reply(Reply::embed(embed)).with_follow_up(FollowUp {
            after: Duration::from_secs(u64::from(minutes) * 60),
            embed: completion_embed(minutes, task),
        }))
    }
}
