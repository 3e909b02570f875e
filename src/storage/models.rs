use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub id: String,
    pub billing_email: Option<String>,
    pub last_payment: Option<DateTime<Utc>>,
    pub next_payment: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: SubscriptionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    OnHold,
    Cancelled,
    Expired,
    Other(String),
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionStatus::Active => write!(f, "active"),
            SubscriptionStatus::OnHold => write!(f, "on-hold"),
            SubscriptionStatus::Cancelled => write!(f, "cancelled"),
            SubscriptionStatus::Expired => write!(f, "expired"),
            SubscriptionStatus::Other(status) => write!(f, "{}", status),
        }
    }
}

impl From<String> for SubscriptionStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "active" => SubscriptionStatus::Active,
            "on-hold" => SubscriptionStatus::OnHold,
            "cancelled" => SubscriptionStatus::Cancelled,
            "expired" => SubscriptionStatus::Expired,
            _ => SubscriptionStatus::Other(value),
        }
    }
}

impl From<SubscriptionStatus> for String {
    fn from(value: SubscriptionStatus) -> Self {
        value.to_string()
    }
}

impl Subscription {
    pub fn new(id: impl Into<String>, billing_email: Option<&str>) -> Self {
        Self {
            id: id.into(),
            billing_email: billing_email.map(str::to_string),
            last_payment: None,
            next_payment: None,
            status: SubscriptionStatus::Active,
        }
    }

    /// A record the engine can act on: it has an identifier and is active
    pub fn is_well_formed(&self) -> bool {
        !self.id.trim().is_empty() && self.status == SubscriptionStatus::Active
    }
}

/// One persisted summary of a batch run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateLogEntry {
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub target_date: DateTime<Utc>,
    pub cutoff_date: DateTime<Utc>,
    pub excluded_count: usize,
    pub mode: String,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionNote {
    pub subscription_id: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text_round_trip() {
        for status in [
            SubscriptionStatus::Active,
            SubscriptionStatus::OnHold,
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::Expired,
        ] {
            assert_eq!(SubscriptionStatus::from(status.to_string()), status);
        }
    }

    #[test]
    fn test_unknown_status_is_kept_verbatim() {
        let status = SubscriptionStatus::from("pending-cancel".to_string());
        assert_eq!(status, SubscriptionStatus::Other("pending-cancel".to_string()));
        assert_eq!(status.to_string(), "pending-cancel");
    }

    #[test]
    fn test_status_deserializes_from_plain_string() {
        let sub: Subscription = serde_json::from_str(
            r#"{"id":"1","billing_email":null,"last_payment":null,"next_payment":null,"status":"on-hold"}"#,
        )
        .unwrap();
        assert_eq!(sub.status, SubscriptionStatus::OnHold);
        assert!(!sub.is_well_formed());
    }
}
