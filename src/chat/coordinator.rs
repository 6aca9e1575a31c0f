use crate::backend::{Backend, BackendError, ChatRequest};
use crate::chat::{ChatHistory, Role, Turn};
use tokio_stream::StreamExt;

/// Receives streaming progress for real-time display, independent of the
/// history mutation [`stream_turn`] performs at the end.
pub trait Observer {
    fn on_role_announced(&mut self, role: Role);
    fn on_content(&mut self, delta: &str);
}

/// Stream one `role` turn from `backend` into `history`.
///
/// Drains the fragment stream, echoing progress to `observer`, and appends
/// exactly one finalized turn once the stream is exhausted. Partial content
/// is visible only through the observer, never through `history`. On any
/// backend error nothing is appended and the error propagates; abandoning
/// the returned future mid-stream likewise appends nothing.
///
/// The first role-bearing fragment announces the role, before any content is
/// emitted. A role that first shows up after content has already flowed is
/// ignored as an announcement (its delta still counts). Fragments with no
/// role and an empty delta are inert.
///
/// Caller contract: `history` is non-empty and its last turn was not
/// authored by `role`.
pub async fn stream_turn(
    backend: &(dyn Backend + Send + Sync),
    model: &str,
    history: &mut ChatHistory,
    role: Role,
    observer: &mut dyn Observer,
) -> Result<Turn, BackendError> {
    debug_assert!(!history.is_empty(), "history must be seeded before streaming");
    debug_assert!(
        history.last().map(|t| t.role) != Some(role),
        "two {role} turns must not be streamed back to back"
    );

    let req = ChatRequest {
        model: model.to_string(),
        turns: history.turns().to_vec(),
    };

    let mut stream = backend.stream_chat(req).await?;

    let mut content = String::new();
    let mut role_announced = false;

    while let Some(item) = stream.next().await {
        let fragment = item?;

        if !role_announced && content.is_empty() {
            if let Some(announced) = fragment.role {
                observer.on_role_announced(announced);
                role_announced = true;
            }
        }

        if !fragment.delta.is_empty() {
            content.push_str(&fragment.delta);
            observer.on_content(&fragment.delta);
        }
    }

    let turn = Turn::new(role, content);
    history.push(turn.clone());
    tracing::debug!(%role, chars = turn.content.len(), "turn committed");
    Ok(turn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Fragment, FragmentStream, ModelResult};
    use std::sync::Mutex;

    /// Replays a canned list of items; the stream is not restartable.
    struct VecBackend {
        items: Mutex<Option<Vec<Result<Fragment, BackendError>>>>,
    }

    impl VecBackend {
        fn new(items: Vec<Result<Fragment, BackendError>>) -> Self {
            Self {
                items: Mutex::new(Some(items)),
            }
        }
    }

    impl Backend for VecBackend {
        fn name(&self) -> &'static str {
            "test"
        }

        fn stream_chat(
            &self,
            _req: ChatRequest,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<FragmentStream, BackendError>> + Send>,
        > {
            let items = self
                .items
                .lock()
                .unwrap()
                .take()
                .expect("stream is not restartable");
            Box::pin(async move { Ok(Box::pin(tokio_stream::iter(items)) as FragmentStream) })
        }

        fn chat(
            &self,
            _req: ChatRequest,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<ModelResult, BackendError>> + Send>,
        > {
            Box::pin(async { Err(BackendError::Setup("not supported".into())) })
        }
    }

    /// Fails before any fragment is produced.
    struct BrokenBackend;

    impl Backend for BrokenBackend {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn stream_chat(
            &self,
            _req: ChatRequest,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<FragmentStream, BackendError>> + Send>,
        > {
            Box::pin(async { Err(BackendError::Setup("no transport".into())) })
        }

        fn chat(
            &self,
            _req: ChatRequest,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<ModelResult, BackendError>> + Send>,
        > {
            Box::pin(async { Err(BackendError::Setup("no transport".into())) })
        }
    }

    #[derive(Debug, PartialEq)]
    enum Event {
        Role(Role),
        Content(String),
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
    }

    impl Observer for Recorder {
        fn on_role_announced(&mut self, role: Role) {
            self.events.push(Event::Role(role));
        }

        fn on_content(&mut self, delta: &str) {
            self.events.push(Event::Content(delta.to_string()));
        }
    }

    fn librarian_history() -> ChatHistory {
        let mut h = ChatHistory::new("You are a librarian");
        h.push_user("Hi, I'm looking for book suggestions");
        h
    }

    #[tokio::test]
    async fn role_then_content_in_arrival_order() {
        let backend = VecBackend::new(vec![
            Ok(Fragment::role_announcement(Role::Assistant)),
            Ok(Fragment::delta("Try ")),
            Ok(Fragment::delta("'Sapiens'.")),
        ]);
        let mut history = librarian_history();
        let mut observer = Recorder::default();

        let turn = stream_turn(&backend, "m", &mut history, Role::Assistant, &mut observer)
            .await
            .unwrap();

        assert_eq!(turn, Turn::new(Role::Assistant, "Try 'Sapiens'."));
        assert_eq!(history.last(), Some(&turn));
        assert_eq!(
            observer.events,
            vec![
                Event::Role(Role::Assistant),
                Event::Content("Try ".into()),
                Event::Content("'Sapiens'.".into()),
            ]
        );
    }

    #[tokio::test]
    async fn committed_content_is_the_concatenation_of_deltas() {
        let backend = VecBackend::new(vec![
            Ok(Fragment::delta("a")),
            Ok(Fragment::delta("b")),
            Ok(Fragment::delta("c")),
        ]);
        let mut history = librarian_history();
        let before = history.len();
        let mut observer = Recorder::default();

        let turn = stream_turn(&backend, "m", &mut history, Role::Assistant, &mut observer)
            .await
            .unwrap();

        assert_eq!(turn.content, "abc");
        assert_eq!(history.len(), before + 1);
    }

    #[tokio::test]
    async fn empty_stream_still_commits_an_empty_turn() {
        let backend = VecBackend::new(vec![]);
        let mut history = librarian_history();
        let mut observer = Recorder::default();

        let turn = stream_turn(&backend, "m", &mut history, Role::Assistant, &mut observer)
            .await
            .unwrap();

        assert_eq!(turn, Turn::new(Role::Assistant, ""));
        assert_eq!(history.last(), Some(&turn));
        assert!(observer.events.is_empty());
    }

    #[tokio::test]
    async fn mid_stream_error_leaves_history_untouched() {
        let backend = VecBackend::new(vec![
            Ok(Fragment::delta("partial")),
            Err(BackendError::Stream("connection reset".into())),
        ]);
        let mut history = librarian_history();
        let before = history.len();
        let mut observer = Recorder::default();

        let err = stream_turn(&backend, "m", &mut history, Role::Assistant, &mut observer)
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Stream(_)));
        assert_eq!(history.len(), before);
        // The partial delta still reached the observer before the failure.
        assert_eq!(observer.events, vec![Event::Content("partial".into())]);
    }

    #[tokio::test]
    async fn setup_error_leaves_history_untouched() {
        let mut history = librarian_history();
        let before = history.len();
        let mut observer = Recorder::default();

        let err = stream_turn(&BrokenBackend, "m", &mut history, Role::Assistant, &mut observer)
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Setup(_)));
        assert_eq!(history.len(), before);
        assert!(observer.events.is_empty());
    }

    #[tokio::test]
    async fn no_op_fragments_are_inert() {
        let backend = VecBackend::new(vec![
            Ok(Fragment::default()),
            Ok(Fragment::role_announcement(Role::Assistant)),
            Ok(Fragment::default()),
            Ok(Fragment::delta("x")),
            Ok(Fragment::default()),
        ]);
        let mut history = librarian_history();
        let mut observer = Recorder::default();

        let turn = stream_turn(&backend, "m", &mut history, Role::Assistant, &mut observer)
            .await
            .unwrap();

        assert_eq!(turn.content, "x");
        assert_eq!(
            observer.events,
            vec![Event::Role(Role::Assistant), Event::Content("x".into())]
        );
    }

    #[tokio::test]
    async fn only_the_first_role_announcement_counts() {
        let backend = VecBackend::new(vec![
            Ok(Fragment::role_announcement(Role::Assistant)),
            Ok(Fragment {
                role: Some(Role::Assistant),
                delta: "hi".into(),
            }),
        ]);
        let mut history = librarian_history();
        let mut observer = Recorder::default();

        stream_turn(&backend, "m", &mut history, Role::Assistant, &mut observer)
            .await
            .unwrap();

        assert_eq!(
            observer.events,
            vec![Event::Role(Role::Assistant), Event::Content("hi".into())]
        );
    }

    #[tokio::test]
    async fn role_arriving_after_content_is_not_announced() {
        let backend = VecBackend::new(vec![
            Ok(Fragment::delta("a")),
            Ok(Fragment {
                role: Some(Role::Assistant),
                delta: " b".into(),
            }),
        ]);
        let mut history = librarian_history();
        let mut observer = Recorder::default();

        let turn = stream_turn(&backend, "m", &mut history, Role::Assistant, &mut observer)
            .await
            .unwrap();

        assert_eq!(turn.content, "a b");
        assert_eq!(
            observer.events,
            vec![Event::Content("a".into()), Event::Content(" b".into())]
        );
    }

    #[tokio::test]
    async fn backend_sees_the_history_snapshot() {
        struct AssertingBackend;

        impl Backend for AssertingBackend {
            fn name(&self) -> &'static str {
                "asserting"
            }

            fn stream_chat(
                &self,
                req: ChatRequest,
            ) -> std::pin::Pin<
                Box<
                    dyn std::future::Future<Output = Result<FragmentStream, BackendError>> + Send,
                >,
            > {
                Box::pin(async move {
                    assert_eq!(req.model, "m");
                    assert_eq!(req.turns.len(), 2);
                    assert_eq!(req.turns[0].role, Role::System);
                    assert_eq!(req.turns[1].role, Role::User);
                    let items: Vec<Result<Fragment, BackendError>> = Vec::new();
                    Ok(Box::pin(tokio_stream::iter(items)) as FragmentStream)
                })
            }

            fn chat(
                &self,
                _req: ChatRequest,
            ) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = Result<ModelResult, BackendError>> + Send>,
            > {
                Box::pin(async { Err(BackendError::Setup("not supported".into())) })
            }
        }

        let mut history = librarian_history();
        let mut observer = Recorder::default();
        stream_turn(&AssertingBackend, "m", &mut history, Role::Assistant, &mut observer)
            .await
            .unwrap();
    }
}
