//! Message types for LLM communication.

use serde::{Deserialize, Serialize};

/// Role of a message in a chat completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions and context for the model.
    System,
    /// The question being asked.
    User,
    /// A model reply.
    Assistant,
}

impl Role {
    /// Returns the role as a string for API requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

}

/// Per-request sampling settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    /// Overrides the client's default model.
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl CompletionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let system = Message::system("You are a SQL expert.");
        assert_eq!(system.role, Role::System);
        assert_eq!(Message::user("hi").role, Role::User);
        assert_eq!(Message::user("hello").content, "hello");
    }

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_string(&Message::user("Top products")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"Top products"}"#);
    }

    #[test]
    fn test_options_builder() {
        let options = CompletionOptions::new()
            .model("gpt-4-0125-preview")
            .temperature(0.1)
            .max_tokens(500);
        assert_eq!(options.model.as_deref(), Some("gpt-4-0125-preview"));
        assert_eq!(options.temperature, Some(0.1));
        assert_eq!(options.max_tokens, Some(500));
        assert_eq!(CompletionOptions::default().model, None);
    }
}
