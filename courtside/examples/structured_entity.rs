//! Map a model reply into any `JsonSchema` type.
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! cargo run --example structured_entity
//! ```

#![allow(clippy::print_stdout)]

use courtside::prelude::*;
use courtside::structured;
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Arena {
    name: String,
    home_team: String,
    city: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let client = OpenAI::from_env()?;

    let request = ChatRequest::new("gpt-4o-mini").user("List three NBA arenas.");
    let arenas: Vec<Arena> = structured::entity(&client, request).await?;

    for arena in arenas {
        println!("{} in {} ({})", arena.name, arena.city, arena.home_team);
    }

    Ok(())
}
