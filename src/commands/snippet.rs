use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::command::{CommandHandler, Context, Mutation, Outcome};
use crate::error::ServiceResult;
use crate::key::derive_key;
use crate::query::any_contains_ci;
use crate::reply::{Embed, Reply, code_block, colors};
use crate::storage::Stores;
use crate::types::Snippet;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SnippetSave {
    pub name: String,
    pub code: String,
    pub language: String,
    /// Comma separated.
    #[serde(default)]
    pub tags: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SnippetGet {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SnippetList {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SnippetSearch {
    pub tag: String,
}

fn parse_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|tags| {
        tags.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn tag_summary(tags: &[String]) -> String {
    if tags.is_empty() {
        "None".to_string()
    } else {
        tags.join(", ")
    }
}

fn summary_line(snippet: &Snippet) -> String {
    format!("**{}** ({})", snippet.name, snippet.language)
}

impl CommandHandler for SnippetSave {
    fn run(self, ctx: &Context, _stores: &Stores) -> ServiceResult<Outcome> {
        let tags = parse_tags(self.tags.as_deref());
        let embed = Embed::new(colors::SUCCESS, "✅ Snippet Saved!")
            .description(format!("Saved snippet: **{}**", self.name))
            .inline_field("Language", self.language.as_str())
            .inline_field("Tags", tag_summary(&tags));

        let key = derive_key(ctx.owner(), &self.name);
        let snippet = Snippet {
            name: self.name,
            code: self.code,
            language: self.language,
            tags,
            owner_id: ctx.owner().to_string(),
            created_at: ctx.now,
        };
        Ok(Outcome::reply(Reply::embed(embed)).with_mutation(Mutation::Snippet(key, snippet)))
    }
}

impl CommandHandler for SnippetGet {
    fn run(self, ctx: &Context, stores: &Stores) -> ServiceResult<Outcome> {
        let Some(snippet) = stores.snippets.get(&derive_key(ctx.owner(), &self.name)) else {
            return Ok(Reply::notice(format!("❌ Snippet \"{}\" not found!", self.name)).into());
        };

        let embed = Embed::new(colors::INFO, format!("📝 {}", snippet.name))
            .description(code_block(&snippet.language, &snippet.code))
            .inline_field("Language", snippet.language.as_str())
            .inline_field("Tags", tag_summary(&snippet.tags))
            .inline_field("Created", snippet.created_at.format("%Y-%m-%d").to_string());
        Ok(Reply::embed(embed).into())
    }
}

impl CommandHandler for SnippetList {
    fn run(self, ctx: &Context, stores: &Stores) -> ServiceResult<Outcome> {
        let lines: Vec<String> = stores
            .snippets
            .owned_by(ctx.owner())
            .map(|(_, s)| summary_line(s))
            .collect();

        if lines.is_empty() {
            return Ok(Reply::notice("📝 You have no saved snippets yet!").into());
        }

        let embed = Embed::new(colors::INFO, "📚 Your Code Snippets").description(lines.join("\n"));
        Ok(Reply::embed(embed).into())
    }
}

impl CommandHandler for SnippetSearch {
    fn run(self, ctx: &Context, stores: &Stores) -> ServiceResult<Outcome> {
        let tag = self.tag.to_lowercase();
        let lines: Vec<String> = stores
            .snippets
            .owned_by(ctx.owner())
            .filter(|(_, s)| any_contains_ci(&s.tags, &tag))
            .map(|(_, s)| summary_line(s))
            .collect();

        if lines.is_empty() {
            return Ok(Reply::notice(format!("❌ No snippets found with tag \"{tag}\"")).into());
        }

        let embed = Embed::new(colors::INFO, format!("🔍 Snippets with tag: {tag}"))
            .description(lines.join("\n"));
        Ok(Reply::embed(embed).into())
    }
}
