//! Interactive console for the solace pipeline.
//!
//! Reads user turns from stdin, runs each through the pipeline, and prints
//! the reply. `--json` prints the full turn record instead.
//!
//! # Environment Variables
//!
//! - `SOLACE_STORAGE_DIR` — base directory for the glyph DB, learned
//!   lexicon, and archetype library
//! - `RUST_LOG` — log filter (default: "info")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin solace
//! cargo run --bin solace -- --json
//! ```

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use solace::pipeline::{Orchestrator, OrchestratorConfig};
use solace::{ConversationContext, Role, Turn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let json_output = std::env::args().any(|a| a == "--json");

    let orchestrator = Arc::new(Orchestrator::new(OrchestratorConfig::default())?);
    let mut context = ConversationContext::default();
    let user_id = "console".to_string();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    print!("> ");
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text == "exit" || text == "quit" {
            break;
        }

        let outcome = orchestrator
            .aparse_input(
                text.to_string(),
                Some(context.clone()),
                Some(user_id.clone()),
            )
            .await;

        if json_output {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            println!("{}", outcome.voltage_response);
            if !outcome.ritual_prompt.is_empty() {
                println!("{}", outcome.ritual_prompt);
            }
        }

        context.push(Turn::new(Role::User, text));
        context.push(Turn::new(Role::Assistant, outcome.voltage_response));
        print!("> ");
        stdout.flush()?;
    }

    Ok(())
}
