//! List NBA teams with OpenAI structured output.
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! cargo run --example openai_teams
//! ```

#![allow(clippy::print_stdout)]

use std::sync::Arc;

use courtside::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let client = OpenAI::from_env()?;
    let service = TeamsService::new(Arc::new(client))?;

    for query in [TeamQuery::All, TeamQuery::EasternConference] {
        let teams = service.get_teams(query).await?;
        println!("{} ({} teams)", query.prompt(), teams.len());
        for team in &teams {
            println!("  {team}");
        }
    }

    Ok(())
}
