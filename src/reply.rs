use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod colors {
    pub const SUCCESS: u32 = 0x00ff00;
    pub const INFO: u32 = 0x0099ff;
    pub const GOAL: u32 = 0xffaa00;
    pub const CHALLENGE: u32 = 0xff6b6b;
    pub const STATS: u32 = 0x9c27b0;
    pub const DOCS: u32 = 0x4fc3f7;
    pub const TIMER: u32 = 0x4caf50;
    pub const ALERT: u32 = 0xff9800;
    pub const GITHUB: u32 = 0x24292e;
    pub const INTERVIEW: u32 = 0x2196f3;
    pub const FORMAT: u32 = 0x795548;
}

pub const GENERIC_FAILURE: &str = "There was an error while executing this command!";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EmbedThumbnail {
    pub url: String,
}

/// Rich message body, shaped like a Discord embed object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedThumbnail>,
}

impl Embed {
    pub fn new(color: u32, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            color,
            fields: Vec::new(),
            footer: None,
            thumbnail: None,
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline: false,
        });
        self
    }

    pub fn inline_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline: true,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(EmbedThumbnail { url: url.into() });
        self
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// What a command answers with: a plain notice or one or more embeds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Reply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default)]
    pub ephemeral: bool,
}

impl Reply {
    /// Short message visible only to the caller.
    pub fn notice(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embeds: Vec::new(),
            ephemeral: true,
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embeds: vec![embed],
            ephemeral: false,
        }
    }

    pub fn failure() -> Self {
        Self::notice(GENERIC_FAILURE)
    }

    pub fn first_embed(&self) -> Option<&Embed> {
        self.embeds.first()
    }
}

/// Cuts `text` to at most `limit` characters, marking the cut with `...`.
pub fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Wraps code in a fenced block tagged with `language`.
pub fn code_block(language: &str, code: &str) -> String {
    format!("```{language}\n{code}```")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
        assert_eq!(truncate("äöüß", 2), "äö...");
    }

    #[test]
    fn notice_is_ephemeral_and_embed_is_public() {
        assert!(Reply::notice("x").ephemeral);
        let reply = Reply::embed(Embed::new(colors::INFO, "t").inline_field("a", "b"));
        assert!(!reply.ephemeral);
        assert_eq!(reply.first_embed().and_then(|e| e.field_value("a")), Some("b"));
    }

    #[test]
    fn embed_serializes_like_platform_object() {
        let embed = Embed::new(colors::SUCCESS, "Done").footer("bye");
        let value = serde_json::to_value(&embed).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"title": "Done", "color": 65280, "footer": {"text": "bye"}})
        );
    }
}
