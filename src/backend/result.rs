use super::echo::EchoCompletion;
use super::scripted::ScriptedCompletion;

/// Tag identifying which backend payload a [`ModelResult`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Echo,
    Scripted,
}

impl std::fmt::Display for ResultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ResultKind::Echo => "echo",
            ResultKind::Scripted => "scripted",
        })
    }
}

/// Backend-specific completion payload behind a discriminant.
///
/// Returned from the non-streaming path; callers that need the concrete
/// payload narrow it with [`project`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelResult {
    Echo(EchoCompletion),
    Scripted(ScriptedCompletion),
}

impl ModelResult {
    pub fn kind(&self) -> ResultKind {
        match self {
            ModelResult::Echo(_) => ResultKind::Echo,
            ModelResult::Scripted(_) => ResultKind::Scripted,
        }
    }
}

/// Payload types that can be projected out of a [`ModelResult`].
pub trait ResultShape: Sized {
    const KIND: ResultKind;

    fn peel(result: &ModelResult) -> Option<&Self>;
}

impl ResultShape for EchoCompletion {
    const KIND: ResultKind = ResultKind::Echo;

    fn peel(result: &ModelResult) -> Option<&Self> {
        match result {
            ModelResult::Echo(r) => Some(r),
            _ => None,
        }
    }
}

impl ResultShape for ScriptedCompletion {
    const KIND: ResultKind = ResultKind::Scripted;

    fn peel(result: &ModelResult) -> Option<&Self> {
        match result {
            ModelResult::Scripted(r) => Some(r),
            _ => None,
        }
    }
}

/// Projection of a result to an incompatible payload shape.
#[derive(Debug, thiserror::Error)]
#[error("result carries a {actual} payload, not {expected}")]
pub struct ShapeMismatch {
    pub expected: ResultKind,
    pub actual: ResultKind,
}

/// Narrow `result` to the payload shape `T`.
///
/// This is a typed view, not a conversion: the payload is borrowed in place,
/// never mutated or copied.
pub fn project<T: ResultShape>(result: &ModelResult) -> Result<&T, ShapeMismatch> {
    T::peel(result).ok_or(ShapeMismatch {
        expected: T::KIND,
        actual: result.kind(),
    })
}
