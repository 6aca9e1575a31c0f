pub mod echo;
pub mod result;
pub mod scripted;

pub use result::{project, ModelResult};

use crate::chat::{Role, Turn};
use futures_core::stream::BoxStream;
use std::path::PathBuf;

/// One completion request: the target model plus a snapshot of the history.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub turns: Vec<Turn>,
}

/// One incremental piece of a streamed response.
///
/// `role` is carried by at most a few fragments (typically the first);
/// `delta` may be empty on role-only or keep-alive fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub role: Option<Role>,
    pub delta: String,
}

impl Fragment {
    pub fn delta(text: impl Into<String>) -> Self {
        Self {
            role: None,
            delta: text.into(),
        }
    }

    pub fn role_announcement(role: Role) -> Self {
        Self {
            role: Some(role),
            delta: String::new(),
        }
    }
}

/// Failure while setting up or consuming a backend response.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("failed to start stream: {0}")]
    Setup(String),

    #[error("stream failed: {0}")]
    Stream(String),

    #[error("failed to read script {path}: {source}")]
    ScriptRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse script {path}: {source}")]
    ScriptParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub type FragmentStream = BoxStream<'static, Result<Fragment, BackendError>>;

/// Completion backend.
///
/// Given a conversation, produces either a lazy, finite, non-restartable
/// stream of fragments or a whole response at once.
pub trait Backend {
    fn name(&self) -> &'static str;

    /// Start streaming a response.
    fn stream_chat(
        &self,
        req: ChatRequest,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<FragmentStream, BackendError>> + Send>,
    >;

    /// Produce the whole response at once.
    fn chat(
        &self,
        req: ChatRequest,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<ModelResult, BackendError>> + Send>,
    >;
}
