use revcast_core::{Message, Role};

/// Conversation history for one agent run, capped at a number of messages.
/// The oldest messages are dropped first, and a message leaves together with
/// the tool results that directly follow it.
pub struct ContextWindow {
    messages: Vec<Message>,
    system_prompt: Option<String>,
    max_messages: usize,
}

impl ContextWindow {
    /// Empty window holding at most `max_messages`.
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: Vec::new(),
            system_prompt: None,
            max_messages,
        }
    }

    /// Set the system prompt.
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = Some(prompt.into());
    }

    /// The system prompt, if set.
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// Append a message, evicting the oldest beyond the cap.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        while self.messages.len() > self.max_messages {
            self.evict_oldest();
        }
    }

    fn evict_oldest(&mut self) {
        let results = self
            .messages
            .iter()
            .skip(1)
            .take_while(|m| m.role == Role::Tool)
            .count();
        self.messages.drain(..=results);
    }

    /// Messages in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Rough token estimate at four characters per token.
    pub fn estimated_tokens(&self) -> usize {
        let sys = self.system_prompt.as_ref().map_or(0, |s| s.len() / 4);
        sys + self.messages.iter().map(|m| m.content.len() / 4).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_oldest_messages_evicted() {
        let id = Uuid::new_v4();
        let mut window = ContextWindow::new(2);
        window.push(Message::user("first", id));
        window.push(Message::assistant("second", id));
        window.push(Message::user("third", id));

        let contents: Vec<_> = window.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["second", "third"]);
    }

    #[test]
    fn test_tool_results_leave_with_their_call() {
        let id = Uuid::new_v4();
        let mut window = ContextWindow::new(4);
        window.push(Message::user("task", id));
        window.push(Message::assistant("call one", id));
        window.push(Message::tool("result one", id));
        window.push(Message::assistant("call two", id));
        window.push(Message::tool("result two", id));
        window.push(Message::assistant("answer", id));

        let contents: Vec<_> = window.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["call two", "result two", "answer"]);
        assert_ne!(window.messages()[0].role, Role::Tool);
    }

    #[test]
    fn test_token_estimate_includes_system_prompt() {
        let mut window = ContextWindow::new(10);
        window.set_system_prompt("12345678");
        window.push(Message::user("abcd", Uuid::new_v4()));
        assert_eq!(window.estimated_tokens(), 3);
        assert_eq!(window.system_prompt(), Some("12345678"));
    }
}
