use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::command::{CommandHandler, Context, Outcome};
use crate::error::ServiceResult;
use crate::reply::{Embed, Reply, code_block, colors};
use crate::storage::Stores;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormatCode {
    pub code: String,
    pub language: String,
}

/// Line breaks after `;` and `,`, an indented break after `{`, a break before `}`.
/// Purely lexical; string literals are not special-cased.
pub fn relayout(code: &str) -> String {
    let mut out = String::with_capacity(code.len() * 2);
    for ch in code.chars() {
        match ch {
            ';' | ',' => {
                out.push(ch);
                out.push('\n');
            }
            '{' => out.push_str("{\n  "),
            '}' => out.push_str("\n}"),
            _ => out.push(ch),
        }
    }
    out
}

impl CommandHandler for FormatCode {
    fn run(self, _ctx: &Context, _stores: &Stores) -> ServiceResult<Outcome> {
        let embed = Embed::new(colors::FORMAT, "🎨 Formatted Code")
            .description(code_block(&self.language, &relayout(&self.code)))
            .footer("Code formatting completed!");
        Ok(Reply::embed(embed).into())
    }
}
