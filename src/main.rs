mod app;
mod backend;
mod chat;
mod cli;
mod config;
mod paths;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = cli::Args::parse();

    let config_dir = paths::config_dir()?;
    let cfg = config::Config::load_optional(config_dir.join("config.toml"))?;
    tracing::debug!(?config_dir, ?cfg, "resolved config");

    let model = args
        .model
        .clone()
        .or_else(|| cfg.as_ref().and_then(|c| c.model.clone()))
        .unwrap_or_else(|| "echo-1".to_string());

    let backend_name = args
        .backend
        .clone()
        .or_else(|| cfg.as_ref().and_then(|c| c.backend.clone()))
        .unwrap_or_else(|| "echo".to_string());

    let system = args
        .system
        .clone()
        .or_else(|| cfg.as_ref().and_then(|c| c.system.clone()))
        .unwrap_or_else(|| app::DEFAULT_SYSTEM_PROMPT.to_string());

    let backend = app::build_backend(cfg.as_ref(), &backend_name)?;

    if let Some(cli::Command::Chat) = args.cmd {
        return app::run_chat(backend.as_ref(), &model, &system).await;
    }

    let prompt = args.prompt.join(" ");
    if prompt.trim().is_empty() {
        anyhow::bail!("No prompt provided. Try: chatloop \"Hello\" or `chatloop chat`");
    }

    app::run_once(backend.as_ref(), &model, &system, prompt, args.no_stream).await
}
