use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default model (optional)
    pub model: Option<String>,

    /// Backend identifier (e.g., "echo")
    pub backend: Option<String>,

    /// System prompt seeding each session
    pub system: Option<String>,

    #[serde(default)]
    pub echo: EchoConfig,

    #[serde(default)]
    pub scripted: ScriptedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EchoConfig {
    /// Delay between streamed fragments, in milliseconds
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScriptedConfig {
    /// Path to the fragment script file
    pub script: Option<PathBuf>,
}

impl Config {
    /// Load config if the file exists, otherwise return Ok(None).
    pub fn load_optional(path: impl AsRef<Path>) -> anyhow::Result<Option<Self>> {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::new(e))
                    .with_context(|| format!("failed to read config: {}", path.display()))
            }
        };

        let s = String::from_utf8(bytes).context("config is not valid UTF-8")?;
        let cfg: Config = toml::from_str(&s)
            .with_context(|| format!("failed to parse TOML: {}", path.display()))?;
        Ok(Some(cfg))
    }
}
