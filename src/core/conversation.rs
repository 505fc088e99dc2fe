//! In-memory chat transcript for a single session.
//!
//! The transcript is append-only and never persisted. Alongside it live two
//! one-shot scratch slots filled between sends: a hybrid prompt produced by
//! the reasoning helper and an image attached to the upcoming user turn.
//! Both are consumed together by [`Conversation::take_pending_turn`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Scratch state consumed by exactly one send.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PendingTurn {
    pub hybrid_prompt: Option<String>,
    pub image: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    pending_hybrid_prompt: Option<String>,
    pending_image: Option<Vec<u8>>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message. Whitespace-only input is rejected and leaves
    /// the transcript untouched; returns whether the message was appended.
    pub fn append_user(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.messages.push(Message::new(Role::User, text));
        true
    }

    pub fn append_assistant(&mut self, text: &str) {
        self.messages.push(Message::new(Role::Assistant, text));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn set_hybrid_prompt(&mut self, prompt: String) {
        self.pending_hybrid_prompt = Some(prompt);
    }

    pub fn has_hybrid_prompt(&self) -> bool {
        self.pending_hybrid_prompt.is_some()
    }

    pub fn set_image(&mut self, bytes: Vec<u8>) {
        self.pending_image = Some(bytes);
    }

    pub fn has_image(&self) -> bool {
        self.pending_image.is_some()
    }

    /// Take both scratch slots, clearing them. Each is used by at most one
    /// send.
    pub fn take_pending_turn(&mut self) -> PendingTurn {
        PendingTurn {
            hybrid_prompt: self.pending_hybrid_prompt.take(),
            image: self.pending_image.take(),
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.pending_hybrid_prompt = None;
        self.pending_image = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_user_input_is_a_noop() {
        let mut conversation = Conversation::new();
        assert!(!conversation.append_user(""));
        assert!(!conversation.append_user("   \t\n"));
        assert!(conversation.messages().is_empty());
    }

    #[test]
    fn transcript_preserves_order() {
        let mut conversation = Conversation::new();
        assert!(conversation.append_user("first"));
        conversation.append_assistant("second");
        assert!(conversation.append_user("third"));

        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(conversation.messages()[2].content, "third");
    }

    #[test]
    fn pending_turn_is_one_shot() {
        let mut conversation = Conversation::new();
        conversation.set_hybrid_prompt("use both frameworks".to_string());
        conversation.set_image(vec![0xff, 0xd8]);

        let turn = conversation.take_pending_turn();
        assert_eq!(turn.hybrid_prompt.as_deref(), Some("use both frameworks"));
        assert_eq!(turn.image.as_deref(), Some(&[0xff, 0xd8][..]));

        let second = conversation.take_pending_turn();
        assert_eq!(second, PendingTurn::default());
    }

    #[test]
    fn clear_drops_transcript_and_scratch() {
        let mut conversation = Conversation::new();
        conversation.append_user("hello");
        conversation.set_hybrid_prompt("prompt".to_string());

        conversation.clear();

        assert!(conversation.messages().is_empty());
        assert!(!conversation.has_hybrid_prompt());
    }
}
