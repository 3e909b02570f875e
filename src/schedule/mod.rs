pub mod date_rule;
pub mod exclusions;
pub mod classifier;
pub mod observer;
pub mod engine;
pub mod batch;
pub mod service;

pub use date_rule::DateRule;
pub use exclusions::ExclusionSet;
pub use classifier::{Classification, Outcome, SkipReason, SubscriptionClassifier};
pub use observer::BatchObserver;
pub use engine::UpdateEngine;
pub use batch::{BatchProcessor, BatchResult, RecordPreview, RunMode};
pub use service::{DateManager, UpdateRequest, UpdateResponse};
