use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Role name in the remote collaborator's vocabulary.
    pub fn to_api_role(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "model",
        }
    }

    /// Label shown under each message in the transcript.
    pub fn display_label(self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "AI Assistant",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }

    pub fn is_assistant(self) -> bool {
        self == Role::Assistant
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

/// A single transcript entry. Fields are private so a message cannot change
/// after it has been created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    text: String,
    timestamp: DateTime<Local>,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self::with_timestamp(role, text, Local::now())
    }

    pub fn with_timestamp(role: Role, text: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn is_assistant(&self) -> bool {
        self.role.is_assistant()
    }

    /// `HH:MM:SS` in local time, used for the transcript label.
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn assistant_maps_to_model_role() {
        assert_eq!(Role::Assistant.to_api_role(), "model");
        assert_eq!(Role::User.to_api_role(), "user");
    }

    #[test]
    fn invalid_role_strings_are_rejected() {
        assert!(Role::try_from("bot").is_err());
        assert_eq!(Role::try_from("assistant"), Ok(Role::Assistant));
    }

    #[test]
    fn time_label_uses_local_clock_format() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 9, 4, 7).unwrap();
        let message = Message::with_timestamp(Role::User, "hi", at);
        assert_eq!(message.time_label(), "09:04:07");
    }

    #[test]
    fn role_serializes_as_plain_string() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
