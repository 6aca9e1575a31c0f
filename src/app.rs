use crate::backend::{self, project, Backend};
use crate::chat::{stream_turn, ChatHistory, Observer, Role};
use crate::config;
use anyhow::Context;
use std::io::Write;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Prints streaming progress to stdout as it arrives.
pub struct ConsoleObserver;

impl Observer for ConsoleObserver {
    fn on_role_announced(&mut self, role: Role) {
        print!("{role}: ");
        std::io::stdout().flush().ok();
    }

    fn on_content(&mut self, delta: &str) {
        print!("{delta}");
        std::io::stdout().flush().ok();
    }
}

pub fn build_backend(
    cfg: Option<&config::Config>,
    backend_name: &str,
) -> anyhow::Result<Box<dyn Backend + Send + Sync>> {
    match backend_name {
        "echo" => {
            let delay_ms = cfg.and_then(|c| c.echo.delay_ms).unwrap_or(80);
            Ok(Box::new(backend::echo::EchoBackend::new(delay_ms)))
        }
        "scripted" => {
            let Some(path) = cfg.and_then(|c| c.scripted.script.clone()) else {
                anyhow::bail!("scripted backend needs scripted.script in config.toml");
            };
            let b = backend::scripted::ScriptedBackend::load(&path)
                .with_context(|| format!("failed to load script: {}", path.display()))?;
            Ok(Box::new(b))
        }
        other => anyhow::bail!("unknown backend: {other}"),
    }
}

/// Answer a single prompt and exit.
pub async fn run_once(
    backend: &(dyn Backend + Send + Sync),
    model: &str,
    system: &str,
    prompt: String,
    no_stream: bool,
) -> anyhow::Result<()> {
    let mut history = ChatHistory::new(system);
    history.push_user(prompt);

    if no_stream {
        return print_completed(backend, model, &history).await;
    }

    let mut observer = ConsoleObserver;
    stream_turn(backend, model, &mut history, Role::Assistant, &mut observer)
        .await
        .context("backend failed while streaming")?;
    println!();
    Ok(())
}

/// Non-streaming path: fetch one completed result and narrow it to the
/// backend's payload shape before printing.
async fn print_completed(
    backend: &(dyn Backend + Send + Sync),
    model: &str,
    history: &ChatHistory,
) -> anyhow::Result<()> {
    use crate::backend::echo::EchoCompletion;
    use crate::backend::scripted::ScriptedCompletion;

    let req = backend::ChatRequest {
        model: model.to_string(),
        turns: history.turns().to_vec(),
    };
    let result = backend
        .chat(req)
        .await
        .context("backend failed to complete")?;

    let text = match backend.name() {
        "echo" => project::<EchoCompletion>(&result)?.text.clone(),
        "scripted" => project::<ScriptedCompletion>(&result)?.text.clone(),
        other => anyhow::bail!("no result projection for backend: {other}"),
    };
    println!("{}: {text}", Role::Assistant);
    Ok(())
}

/// Interactive multi-turn session: one history, one assistant turn streamed
/// per user line.
pub async fn run_chat(
    backend: &(dyn Backend + Send + Sync),
    model: &str,
    system: &str,
) -> anyhow::Result<()> {
    use tokio::io::{AsyncBufReadExt, BufReader};

    let mut history = ChatHistory::new(system);
    println!("{}: {system}", Role::System);
    println!("------------------------");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut observer = ConsoleObserver;

    loop {
        print!("{}: ", Role::User);
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if prompt == "/quit" || prompt == "/exit" {
            break;
        }

        history.push_user(prompt);

        stream_turn(backend, model, &mut history, Role::Assistant, &mut observer)
            .await
            .context("backend failed while streaming")?;
        println!();
        println!("------------------------");
    }

    tracing::debug!(turns = history.len(), "session ended");
    Ok(())
}
