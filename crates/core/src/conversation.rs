//! Conversation-related types.

use lingua_model::{Response, Role, Turn};

/// How much of the transcript is replayed to the model on each turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Window {
    /// Replay everything.
    #[default]
    Unbounded,
    /// Replay only the last `n` user/assistant pairs. The transcript itself
    /// keeps every turn.
    LastTurns(usize),
}

/// Represents a conversation.
///
/// Turns are only ever appended in user/assistant pairs, so the transcript
/// always alternates and starts with a user turn.
#[derive(Clone, Default, Debug)]
pub struct Conversation {
    pub(crate) turns: Vec<Turn>,
}

impl Conversation {
    /// Returns every recorded turn, oldest first.
    #[inline]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the number of recorded turns.
    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` if nothing has been recorded yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Returns the turns to replay under `window`.
    pub fn history(&self, window: Window) -> &[Turn] {
        match window {
            Window::Unbounded => &self.turns,
            Window::LastTurns(pairs) => {
                let keep = pairs.saturating_mul(2).min(self.turns.len());
                &self.turns[self.turns.len() - keep..]
            }
        }
    }

    /// Records a completed exchange.
    pub(crate) fn push_exchange(&mut self, user: Turn, response: &Response) {
        debug_assert_eq!(user.role, Role::User);
        let mut assistant = Turn::assistant(response.text.clone());
        assistant.tool_calls = response.tool_calls.clone();
        self.turns.push(user);
        self.turns.push(assistant);
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(pairs: usize) -> Conversation {
        let mut conversation = Conversation::default();
        for i in 0..pairs {
            let response = Response {
                text: format!("answer {i}"),
                ..Default::default()
            };
            conversation.push_exchange(Turn::user(format!("question {i}")), &response);
        }
        conversation
    }

    #[test]
    fn test_alternates() {
        let conversation = conversation(3);
        assert_eq!(conversation.len(), 6);
        for (i, turn) in conversation.turns().iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(turn.role, expected);
        }
    }

    #[test]
    fn test_window() {
        let conversation = conversation(3);
        assert_eq!(conversation.history(Window::Unbounded).len(), 6);

        let history = conversation.history(Window::LastTurns(1));
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text, "question 2");

        assert_eq!(conversation.history(Window::LastTurns(10)).len(), 6);
        assert!(conversation.history(Window::LastTurns(0)).is_empty());
    }
}
