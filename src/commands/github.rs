use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::command::{CommandHandler, Context, Mutation, Outcome};
use crate::error::ServiceResult;
use crate::key::derive_key;
use crate::reply::{Embed, Reply, colors};
use crate::storage::Stores;
use crate::types::TrackedRepo;

static REPO_URL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"github\.com/([^/\s]+/[^/\s]+)").ok());

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RepoTrack {
    /// `owner/name` or a github.com URL.
    pub repo: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RepoList {}

/// Extracts `owner/name` from a URL; anything else is taken as-is.
pub fn repo_name(input: &str) -> String {
    let input = input.trim();
    REPO_URL
        .as_ref()
        .and_then(|re| re.captures(input))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches(".git").to_string())
        .unwrap_or_else(|| input.to_string())
}

impl CommandHandler for RepoTrack {
    fn run(self, ctx: &Context, _stores: &Stores) -> ServiceResult<Outcome> {
        let name = repo_name(&self.repo);
        let url = format!("https://github.com/{name}");

        let embed = Embed::new(colors::GITHUB, "📂 Repository Tracked!")
            .description(format!("Now tracking: **{name}**"))
            .field("Repository", format!("[{name}]({url})"))
            .footer("Use /github list to see everything you track");

        let key = derive_key(ctx.owner(), &name);
        let repo = TrackedRepo {
            name,
            url,
            owner_id: ctx.owner().to_string(),
            added_at: ctx.now,
        };
        Ok(Outcome::reply(Reply::embed(embed)).with_mutation(Mutation::Repo(key, repo)))
    }
}

impl CommandHandler for RepoList {
    fn run(self, ctx: &Context, stores: &Stores) -> ServiceResult<Outcome> {
        let lines: Vec<String> = stores
            .repos
            .owned_by(ctx.owner())
            .map(|(_, r)| format!("[{}]({})", r.name, r.url))
            .collect();
        if lines.is_empty() {
            return Ok(Reply::notice("📂 You're not tracking any repositories yet!").into());
        }

        let embed = Embed::new(colors::GITHUB, "📂 Your Tracked Repositories")
            .description(lines.join("\n"));
        Ok(Reply::embed(embed).into())
    }
}
