use chrono::{DateTime, Utc};
use crate::storage::models::Subscription;

/// Receives progress from a batch run, synchronously and in fetch order
pub trait BatchObserver {
    /// Called once for every subscription whose date was written
    fn record_updated(&self, subscription: &Subscription, new_date: DateTime<Utc>);

    /// Called after each candidate, updated or not
    fn record_processed(&self, _processed: usize, _total: usize) {}
}
