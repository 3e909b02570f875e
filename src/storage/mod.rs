pub mod db;
pub mod models;
pub mod store;
pub mod update_log;

pub use db::Database;
pub use models::{Subscription, SubscriptionNote, SubscriptionStatus, UpdateLogEntry};
pub use store::{OptionStore, SubscriptionStore};
pub use update_log::UpdateLog;
