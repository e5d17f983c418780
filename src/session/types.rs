//! Session types for the chat view

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A chat message owned by the session view.
///
/// Content is mutable only while the message is the active stream target;
/// once settled it never changes.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Citation labels; replaced wholesale by each `sources` frame
    pub sources: Vec<String>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            sources: Vec::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// One conversational turn as sent to the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
}

/// Financial profile attached to chat requests for personalized guidance.
/// Field names mirror the backend contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    pub income: String,
    pub employment_status: String,
    pub tax_regime: String,
    pub homeowner_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children_ages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parents_age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investment_capacity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_appetite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financial_goals: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_investments: Option<Vec<String>>,
}

/// Cached session state persisted through the injected store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_ids_are_unique() {
        let a = ChatMessage::user("one");
        let b = ChatMessage::user("one");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = HistoryMessage {
            role: Role::Assistant,
            content: "hi".into(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"assistant\""));
    }

    #[test]
    fn test_profile_camel_case_wire_format() {
        let profile = UserProfile {
            age: Some(32),
            income: "₹15 LPA".into(),
            employment_status: "Salaried".into(),
            tax_regime: "New Regime".into(),
            homeowner_status: "Rented".into(),
            ..Default::default()
        };

        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"employmentStatus\":\"Salaried\""));
        assert!(json.contains("\"taxRegime\":\"New Regime\""));
        assert!(!json.contains("risk_appetite"));
    }

    #[test]
    fn test_session_snapshot_roundtrip() {
        let snapshot = SessionSnapshot {
            profile: None,
            user_id: Some("u1".into()),
            session_id: Some("s1".into()),
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: SessionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.user_id.as_deref(), Some("u1"));
        assert_eq!(back.session_id.as_deref(), Some("s1"));
    }
}
