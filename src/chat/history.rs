use serde::{Deserialize, Serialize};

/// Author of a [`Turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        })
    }
}

/// One finalized, attributed message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Ordered, append-only conversation history.
///
/// One instance per session, seeded with a system turn. Turns are immutable
/// once appended; there is no mutable access to existing entries.
#[derive(Debug, Clone)]
pub struct ChatHistory {
    turns: Vec<Turn>,
}

impl ChatHistory {
    /// New history seeded with a system turn.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::new(Role::System, system_prompt)],
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::new(Role::User, content));
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_history_is_seeded_with_a_system_turn() {
        let h = ChatHistory::new("You are a librarian");
        assert_eq!(h.len(), 1);
        assert_eq!(h.last(), Some(&Turn::new(Role::System, "You are a librarian")));
    }

    #[test]
    fn turns_keep_append_order() {
        let mut h = ChatHistory::new("sys");
        h.push_user("hi");
        h.push(Turn::new(Role::Assistant, "hello"));
        let roles: Vec<Role> = h.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
    }
}
