//! Terminal chat client: one question per line, `/clear` to start over,
//! EOF to quit.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use reviewbot::about;
use reviewbot::chat::render::render_turn;
use reviewbot::core::config::AppPaths;
use reviewbot::core::logging;
use reviewbot::state::AppState;

const CLEAR_COMMAND: &str = "/clear";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, false).context("Failed to install logging")?;

    let state = AppState::initialize(paths).await?;
    state.spawn_index_warmup();
    let mut controller = state.pipeline.new_controller();

    let mut stdout = tokio::io::stdout();
    stdout.write_all(about::banner().as_bytes()).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line == CLEAR_COMMAND {
            controller.clear();
            stdout.write_all(b"Conversation cleared.\n").await?;
            continue;
        }

        let output = match controller.ask(line).await {
            Ok(turn) => render_turn(turn),
            Err(err) => format!("Error: {}\n", err),
        };
        stdout.write_all(output.as_bytes()).await?;
    }

    stdout.write_all(b"\nGoodbye.\n").await?;
    stdout.flush().await?;
    tracing::info!(
        "Terminal chat exited after {} answers",
        controller.transcript().assistant_turns()
    );
    Ok(())
}
