use chrono::{DateTime, Utc};
use crate::{
    error::Result,
    storage::models::{Subscription, SubscriptionStatus},
};

/// Source of truth for subscription records
#[cfg_attr(test, mockall::automock)]
pub trait SubscriptionStore {
    /// Every subscription whose status is active, in store order
    fn list_active(&self) -> Result<Vec<Subscription>>;

    fn get_status(&self, id: &str) -> Result<SubscriptionStatus>;

    fn get_billing_identity(&self, id: &str) -> Result<Option<String>>;

    fn get_last_payment(&self, id: &str) -> Result<Option<DateTime<Utc>>>;

    fn set_next_payment(&self, id: &str, date: DateTime<Utc>) -> Result<()>;

    fn append_note(&self, id: &str, text: &str) -> Result<()>;
}

/// Whole-value key/value persistence
#[cfg_attr(test, mockall::automock)]
pub trait OptionStore {
    fn load_option(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the stored value atomically
    fn save_option(&self, key: &str, value: &str) -> Result<()>;

    fn delete_option(&self, key: &str) -> Result<()>;
}
