use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::command::{CommandHandler, Context, Outcome};
use crate::error::ServiceResult;
use crate::reply::{Embed, Reply, colors};
use crate::storage::Stores;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocsSource {
    #[default]
    Mdn,
    React,
    Nodejs,
    Python,
    Rust,
}

impl DocsSource {
    pub fn label(&self) -> &'static str {
        match self {
            DocsSource::Mdn => "MDN",
            DocsSource::React => "REACT",
            DocsSource::Nodejs => "NODEJS",
            DocsSource::Python => "PYTHON",
            DocsSource::Rust => "RUST",
        }
    }

    /// Search deep link; Node.js has no search endpoint, so it links the API index.
    pub fn search_url(&self, query: &str) -> String {
        let q = urlencoding::encode(query);
        match self {
            DocsSource::Mdn => format!("https://developer.mozilla.org/en-US/search?q={q}"),
            DocsSource::React => format!("https://react.dev/search?q={q}"),
            DocsSource::Nodejs => "https://nodejs.org/api/".to_string(),
            DocsSource::Python => format!("https://docs.python.org/3/search.html?q={q}"),
            DocsSource::Rust => format!("https://doc.rust-lang.org/std/?search={q}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DocsLookup {
    pub query: String,
    #[serde(default)]
    pub source: Option<DocsSource>,
}

impl CommandHandler for DocsLookup {
    fn run(self, _ctx: &Context, _stores: &Stores) -> ServiceResult<Outcome> {
        let source = self.source.unwrap_or_default();
        let embed = Embed::new(colors::DOCS, format!("📚 Documentation Search: {}", self.query))
            .description(format!(
                "Search results for \"{}\" in {}",
                self.query,
                source.label()
            ))
            .field(
                "Direct Link",
                format!("[Click here to search]({})", source.search_url(&self.query)),
            );
        Ok(Reply::embed(embed).into())
    }
}
