use serde::Serialize;
use tracing::debug;
use crate::{
    error::Result,
    schedule::{date_rule::DateRule, exclusions::ExclusionSet},
    storage::{
        models::{Subscription, SubscriptionStatus},
        store::SubscriptionStore,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    WillUpdate,
    WillSkip,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    None,
    ExcludedIdentity,
    RecentPayment,
    InvalidRecord,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::None => write!(f, ""),
            SkipReason::ExcludedIdentity => write!(f, "Email excluded"),
            SkipReason::RecentPayment => write!(f, "Recent payment"),
            SkipReason::InvalidRecord => write!(f, "Invalid record"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub outcome: Outcome,
    pub reason: SkipReason,
}

impl Classification {
    pub const UPDATE: Classification = Classification {
        outcome: Outcome::WillUpdate,
        reason: SkipReason::None,
    };

    pub fn skip(reason: SkipReason) -> Self {
        Self { outcome: Outcome::WillSkip, reason }
    }

    pub fn invalid() -> Self {
        Self {
            outcome: Outcome::Error,
            reason: SkipReason::InvalidRecord,
        }
    }

    pub fn will_update(&self) -> bool {
        self.outcome == Outcome::WillUpdate
    }
}

/// Decides whether a subscription gets the new date
///
/// Checks run in order and the first match wins:
/// 1. malformed record (no id or not active) is an error
/// 2. excluded billing identity is skipped
/// 3. last payment strictly after the cutoff is skipped
/// 4. everything else is updated
pub struct SubscriptionClassifier<'a> {
    rule: &'a DateRule,
    exclusions: &'a ExclusionSet,
}

impl<'a> SubscriptionClassifier<'a> {
    pub fn new(rule: &'a DateRule, exclusions: &'a ExclusionSet) -> Self {
        Self { rule, exclusions }
    }

    pub fn classify(&self, record: &Subscription) -> Classification {
        if !record.is_well_formed() {
            debug!("Subscription '{}' is malformed (status: {})", record.id, record.status);
            return Classification::invalid();
        }

        self.classify_fields(&record.id, record.billing_email.as_deref(), record.last_payment)
    }

    /// Classify a subscription by looking up its fields one at a time in the store
    pub fn classify_by_id<S: SubscriptionStore>(&self, store: &S, id: &str) -> Result<Classification> {
        if id.trim().is_empty() {
            return Ok(Classification::invalid());
        }

        let status = store.get_status(id)?;
        if status != SubscriptionStatus::Active {
            debug!("Subscription '{}' is not active (status: {})", id, status);
            return Ok(Classification::invalid());
        }

        let identity = store.get_billing_identity(id)?;
        let last_payment = store.get_last_payment(id)?;
        Ok(self.classify_fields(id, identity.as_deref(), last_payment))
    }

    fn classify_fields(
        &self,
        id: &str,
        identity: Option<&str>,
        last_payment: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Classification {
        if self.exclusions.contains(identity) {
            debug!("Subscription {} has an excluded billing email", id);
            return Classification::skip(SkipReason::ExcludedIdentity);
        }

        match last_payment {
            Some(paid) if self.rule.is_recent(paid) => {
                debug!(
                    "Subscription {} paid at {}, after cutoff {}",
                    id,
                    paid.format("%Y-%m-%d %H:%M:%S"),
                    self.rule.cutoff_date().format("%Y-%m-%d %H:%M:%S")
                );
                Classification::skip(SkipReason::RecentPayment)
            }
            Some(_) => Classification::UPDATE,
            None => {
                debug!("Subscription {} has no payment history", id);
                Classification::UPDATE
            }
        }
    }
}
