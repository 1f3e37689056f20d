use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::command::{Announcement, CommandHandler, Context, Outcome};
use crate::error::ServiceResult;
use crate::reply::{Embed, Reply, colors};
use crate::storage::Stores;

pub const WELCOME_CHANNEL: &str = "general";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberJoin {
    pub guild_id: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

pub fn welcome_embed(username: &str, avatar_url: Option<&str>) -> Embed {
    let embed = Embed::new(colors::SUCCESS, "Welcome to the Learning Community! 🎉")
        .description(format!(
            "Hey {username}! Ready to level up your coding skills?"
        ))
        .field("🚀 Getting Started", "Use `/challenge` to get a coding challenge!")
        .field("📝 Save Code", "Use `/snippet save` to store useful code snippets")
        .field("🎯 Set Goals", "Use `/goal set` to track your learning objectives")
        .footer("Happy coding! 💻");
    match avatar_url {
        Some(url) => embed.thumbnail(url),
        None => embed,
    }
}

impl CommandHandler for MemberJoin {
    fn run(self, ctx: &Context, _stores: &Stores) -> ServiceResult<Outcome> {
        let username = if ctx.caller.name.is_empty() {
            ctx.owner()
        } else {
            ctx.caller.name.as_str()
        };
        let embed = welcome_embed(username, self.avatar_url.as_deref());

        Ok(Outcome::reply(Reply::notice(format!("👋 Welcoming {username}")))
            .with_announcement(Announcement {
                guild_id: self.guild_id,
                channel_name: WELCOME_CHANNEL.to_string(),
                embed,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::ctx;

    #[test]
    fn welcome_targets_general_of_the_joined_guild() {
        let outcome = MemberJoin {
            guild_id: "g1".into(),
            avatar_url: Some("https://cdn.example/a.png".into()),
        }
        .run(&ctx("U9"), &Stores::default())
        .unwrap();

        assert!(outcome.mutations.is_empty());
        assert_eq!(outcome.announcements.len(), 1);
        let announcement = &outcome.announcements[0];
        assert_eq!(announcement.guild_id, "g1");
        assert_eq!(announcement.channel_name, "general");
        assert_eq!(
            announcement.embed.description.as_deref(),
            Some("Hey tester! Ready to level up your coding skills?")
        );
        assert_eq!(
            announcement.embed.thumbnail.as_ref().map(|t| t.url.as_str()),
            Some("https://cdn.example/a.png")
        );
    }

    #[test]
    fn nameless_member_is_greeted_by_id() {
        let mut ctx = ctx("U9");
        ctx.caller.name.clear();
        let outcome = MemberJoin {
            guild_id: "g1".into(),
            avatar_url: None,
        }
        .run(&ctx, &Stores::default())
        .unwrap();
        let embed = &outcome.announcements[0].embed;
        assert_eq!(embed.description.as_deref(), Some("Hey U9! Ready to level up your coding skills?"));
        assert_eq!(embed.thumbnail, None);
    }
}
