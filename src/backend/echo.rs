use super::{Backend, BackendError, ChatRequest, Fragment, FragmentStream, ModelResult};
use crate::chat::Role;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Local backend that echoes the last user turn back as a dripped stream.
///
/// No network and no credentials; stands in for a real provider so the chat
/// loop can be exercised end to end.
#[derive(Debug, Clone)]
pub struct EchoBackend {
    delay: std::time::Duration,
}

impl EchoBackend {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: std::time::Duration::from_millis(delay_ms),
        }
    }
}

/// Payload of [`EchoBackend`]'s non-streaming path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoCompletion {
    pub model: String,
    pub text: String,
}

fn reply_text(req: &ChatRequest) -> String {
    let prompt = req
        .turns
        .iter()
        .rev()
        .find(|t| t.role == Role::User)
        .map(|t| t.content.as_str())
        .unwrap_or("");
    format!("You said: {prompt}")
}

impl Backend for EchoBackend {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn stream_chat(
        &self,
        req: ChatRequest,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<FragmentStream, BackendError>> + Send>,
    > {
        let delay = self.delay;

        Box::pin(async move {
            let text = reply_text(&req);
            let (tx, rx) = mpsc::channel::<Result<Fragment, BackendError>>(32);

            tokio::spawn(async move {
                // Real providers announce the responding role before content.
                if tx
                    .send(Ok(Fragment::role_announcement(Role::Assistant)))
                    .await
                    .is_err()
                {
                    return;
                }

                for piece in text.split_inclusive(' ') {
                    tokio::time::sleep(delay).await;
                    if tx.send(Ok(Fragment::delta(piece))).await.is_err() {
                        break;
                    }
                }
            });

            Ok(Box::pin(ReceiverStream::new(rx)) as FragmentStream)
        })
    }

    fn chat(
        &self,
        req: ChatRequest,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<ModelResult, BackendError>> + Send>,
    > {
        Box::pin(async move {
            let text = reply_text(&req);
            Ok(ModelResult::Echo(EchoCompletion {
                model: req.model,
                text,
            }))
        })
    }
}
