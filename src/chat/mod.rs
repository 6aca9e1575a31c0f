pub mod coordinator;
pub mod history;

pub use coordinator::{stream_turn, Observer};
pub use history::{ChatHistory, Role, Turn};
