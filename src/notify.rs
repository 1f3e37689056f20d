//! Outbound delivery of messages that are not direct command replies.

use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::command::Destination;
use crate::error::{ServiceError, ServiceResult};
use crate::reply::Embed;

const API_BASE: &str = "https://discord.com/api/v10";
/// Discord channel type for text channels.
const GUILD_TEXT: u8 = 0;
/// Largest page `/users/@me/guilds` returns.
const GUILD_PAGE_LIMIT: usize = 200;

/// Sends embeds to the chat platform. Calls block; async callers go through
/// `spawn_blocking`.
pub trait Notifier: Send + Sync {
    /// Delivers a delayed reply for an earlier interaction.
    fn follow_up(&self, destination: &Destination, embed: &Embed) -> ServiceResult<()>;

    /// Ids of every guild the bot is a member of.
    fn guilds(&self) -> ServiceResult<Vec<String>>;

    /// Ids of the text channels called `channel_name` in one guild.
    fn text_channels(&self, guild_id: &str, channel_name: &str) -> ServiceResult<Vec<String>>;

    fn post(&self, channel_id: &str, embed: &Embed) -> ServiceResult<()>;
}

#[derive(Debug, Deserialize)]
struct Guild {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Channel {
    id: String,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    name: Option<String>,
}

pub struct DiscordNotifier {
    agent: ureq::Agent,
    token: String,
    application_id: String,
}

impl DiscordNotifier {
    pub fn new(token: &str, application_id: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            token: token.to_string(),
            application_id: application_id.to_string(),
        }
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{API_BASE}{endpoint}")
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }

    fn get_json<T: for<'de> Deserialize<'de>>(&self, endpoint: &str) -> ServiceResult<T> {
        let response = self
            .agent
            .get(&self.api_url(endpoint))
            .set("Authorization", &self.authorization())
            .call()
            .map_err(|e| ServiceError::NetworkError(format!("GET {endpoint}: {e}")))?;
        response
            .into_json()
            .map_err(|e| ServiceError::ApiError(format!("GET {endpoint}: {e}")))
    }
}

fn guild_page_endpoint(after: Option<&str>) -> String {
    match after {
        Some(after) => format!("/users/@me/guilds?limit={GUILD_PAGE_LIMIT}&after={after}"),
        None => format!("/users/@me/guilds?limit={GUILD_PAGE_LIMIT}"),
    }
}

/// Walks the guild listing page by page until a short page comes back.
fn collect_guilds<F>(mut fetch_page: F) -> ServiceResult<Vec<String>>
where
    F: FnMut(Option<&str>) -> ServiceResult<Vec<Guild>>,
{
    let mut ids: Vec<String> = Vec::new();
    loop {
        let page = fetch_page(ids.last().map(String::as_str))?;
        let full = page.len() >= GUILD_PAGE_LIMIT;
        ids.extend(page.into_iter().map(|g| g.id));
        if !full {
            return Ok(ids);
        }
    }
}

fn matching_text_channels(channels: Vec<Channel>, channel_name: &str) -> Vec<String> {
    channels
        .into_iter()
        .filter(|c| c.kind == GUILD_TEXT && c.name.as_deref() == Some(channel_name))
        .map(|c| c.id)
        .collect()
}

impl Notifier for DiscordNotifier {
    fn follow_up(&self, destination: &Destination, embed: &Embed) -> ServiceResult<()> {
        match destination {
            Destination::Interaction { token } => {
                // Interaction webhooks authenticate through the token in the path.
                let endpoint = format!("/webhooks/{}/{token}", self.application_id);
                self.agent
                    .post(&self.api_url(&endpoint))
                    .send_json(json!({ "embeds": [embed] }))
                    .map_err(|e| ServiceError::NetworkError(format!("follow-up: {e}")))?;
                Ok(())
            }
            Destination::Channel { id } => self.post(id, embed),
        }
    }

    fn guilds(&self) -> ServiceResult<Vec<String>> {
        collect_guilds(|after| self.get_json(&guild_page_endpoint(after)))
    }

    fn text_channels(&self, guild_id: &str, channel_name: &str) -> ServiceResult<Vec<String>> {
        let channels: Vec<Channel> = self.get_json(&format!("/guilds/{guild_id}/channels"))?;
        Ok(matching_text_channels(channels, channel_name))
    }

    fn post(&self, channel_id: &str, embed: &Embed) -> ServiceResult<()> {
        let endpoint = format!("/channels/{channel_id}/messages");
        self.agent
            .post(&self.api_url(&endpoint))
            .set("Authorization", &self.authorization())
            .send_json(json!({ "embeds": [embed] }))
            .map_err(|e| ServiceError::NetworkError(format!("POST {endpoint}: {e}")))?;
        Ok(())
    }
}
