//! Backend that replays a script of fragments from a JSON file.
//!
//! Deterministic stand-in for a live provider: role announcements, no-op
//! fragments, and mid-stream failures can all be reproduced on demand.
//!
//! Script format:
//!
//! ```json
//! {
//!   "fragments": [
//!     { "role": "assistant", "delta": "" },
//!     { "delta": "Try " },
//!     { "delta": "'Sapiens'." }
//!   ],
//!   "error": "optional message; when present the stream fails after the fragments"
//! }
//! ```

use super::{Backend, BackendError, ChatRequest, Fragment, FragmentStream, ModelResult};
use crate::chat::Role;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    script: Script,
}

#[derive(Debug, Clone, Deserialize)]
struct Script {
    #[serde(default)]
    fragments: Vec<ScriptFragment>,

    /// When set, the stream fails with this message after the fragments.
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ScriptFragment {
    #[serde(default)]
    role: Option<Role>,

    #[serde(default)]
    delta: String,
}

impl ScriptedBackend {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| BackendError::ScriptRead {
            path: path.to_path_buf(),
            source,
        })?;
        let script = serde_json::from_slice(&bytes).map_err(|source| BackendError::ScriptParse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { script })
    }

    fn items(&self) -> Vec<Result<Fragment, BackendError>> {
        let mut out: Vec<Result<Fragment, BackendError>> = self
            .script
            .fragments
            .iter()
            .map(|f| {
                Ok(Fragment {
                    role: f.role,
                    delta: f.delta.clone(),
                })
            })
            .collect();

        if let Some(msg) = &self.script.error {
            out.push(Err(BackendError::Stream(msg.clone())));
        }
        out
    }
}

/// Payload of [`ScriptedBackend`]'s non-streaming path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedCompletion {
    pub model: String,
    pub text: String,
}

impl Backend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn stream_chat(
        &self,
        _req: ChatRequest,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<FragmentStream, BackendError>> + Send>,
    > {
        let items = self.items();
        Box::pin(async move { Ok(Box::pin(tokio_stream::iter(items)) as FragmentStream) })
    }

    fn chat(
        &self,
        req: ChatRequest,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<ModelResult, BackendError>> + Send>,
    > {
        let items = self.items();
        Box::pin(async move {
            let mut text = String::new();
            for item in items {
                text.push_str(&item?.delta);
            }
            Ok(ModelResult::Scripted(ScriptedCompletion {
                model: req.model,
                text,
            }))
        })
    }
}
