use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub enum MessageType {
    Info,
    Success,
    Warning,
    Error,
}

/// A status-bar notification that clears itself after a while. Warnings
/// and errors stay visible longer than routine confirmations.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub content: String,
    pub message_type: MessageType,
    pub created_at: Instant,
    pub auto_clear_duration: Option<Duration>,
}

impl StatusMessage {
    pub fn new(content: String, message_type: MessageType) -> Self {
        let auto_clear_duration = Self::default_duration_for_type(&message_type);
        Self {
            content,
            message_type,
            created_at: Instant::now(),
            auto_clear_duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        if let Some(duration) = self.auto_clear_duration {
            self.created_at.elapsed() > duration
        } else {
            false
        }
    }

    fn default_duration_for_type(message_type: &MessageType) -> Option<Duration> {
        match message_type {
            MessageType::Info => Some(Duration::from_secs(3)),
            MessageType::Success => Some(Duration::from_secs(2)),
            MessageType::Warning => Some(Duration::from_secs(5)),
            MessageType::Error => Some(Duration::from_secs(7)),
        }
    }
}

#[derive(Clone, Default)]
pub struct StatusManager {
    current_message: Option<StatusMessage>,
}

impl StatusManager {
    pub fn new() -> Self {
        Self {
            current_message: None,
        }
    }

    pub fn set_info(&mut self, message: String) {
        self.current_message = Some(StatusMessage::new(message, MessageType::Info));
    }

    pub fn set_success(&mut self, message: String) {
        self.current_message = Some(StatusMessage::new(message, MessageType::Success));
    }

    pub fn set_warning(&mut self, message: String) {
        self.current_message = Some(StatusMessage::new(message, MessageType::Warning));
    }

    pub fn set_error(&mut self, message: String) {
        self.current_message = Some(StatusMessage::new(message, MessageType::Error));
    }

    pub fn clear(&mut self) {
        self.current_message = None;
    }

    pub fn update(&mut self) {
        if let Some(ref message) = self.current_message {
            if message.is_expired() {
                self.current_message = None;
            }
        }
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.current_message.as_ref()
    }
}
