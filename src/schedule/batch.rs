use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::{
    error::{DateManagerError, Result},
    schedule::{
        classifier::{Classification, Outcome, SkipReason, SubscriptionClassifier},
        date_rule::DateRule,
        engine::UpdateEngine,
        exclusions::ExclusionSet,
        observer::BatchObserver,
    },
    storage::store::SubscriptionStore,
};
use tracing::{debug, info, warn};
use std::time::Duration;

pub const SAMPLE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Apply,
    Preview,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Apply => write!(f, "apply"),
            RunMode::Preview => write!(f, "preview"),
        }
    }
}

/// What a preview run would do to one subscription
#[derive(Debug, Clone, Serialize)]
pub struct RecordPreview {
    pub id: String,
    pub billing_email: Option<String>,
    pub current_date: Option<DateTime<Utc>>,
    pub outcome: Outcome,
    pub reason: SkipReason,
}

/// Aggregate outcome of one batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub mode: RunMode,
    pub total: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
    pub sample: Vec<RecordPreview>,
}

impl BatchResult {
    pub fn summary_message(&self) -> String {
        match self.mode {
            RunMode::Apply => format!(
                "Update complete! Updated: {}, Skipped: {}, Errors: {}",
                self.updated, self.skipped, self.errors
            ),
            RunMode::Preview => format!(
                "Preview complete! Will update: {}, Will skip: {}, Errors: {}",
                self.updated, self.skipped, self.errors
            ),
        }
    }
}

/// Runs the classifier over every active subscription with pacing
pub struct BatchProcessor<'a, S: SubscriptionStore> {
    engine: UpdateEngine<'a, S>,
    batch_size: usize,
    batch_delay: Duration,
}

impl<'a, S: SubscriptionStore> BatchProcessor<'a, S> {
    pub fn new(engine: UpdateEngine<'a, S>, batch_size: usize, batch_delay_ms: u64) -> Self {
        Self {
            engine,
            batch_size: batch_size.max(1),
            batch_delay: Duration::from_millis(batch_delay_ms),
        }
    }

    /// One complete pass over the store's active subscriptions
    ///
    /// Preview never writes. In apply mode a failed write is counted as an
    /// error for that record and the run continues.
    pub async fn run(
        &self,
        rule: &DateRule,
        exclusions: &ExclusionSet,
        mode: RunMode,
        observer: Option<&dyn BatchObserver>,
    ) -> Result<BatchResult> {
        let candidates = self
            .engine
            .store()
            .list_active()
            .map_err(|e| DateManagerError::StoreUnavailable(e.to_string()))?;

        let total = candidates.len();
        info!(
            "Processing {} active subscriptions ({} mode, {} exclusions, chunks of {})",
            total,
            mode,
            exclusions.len(),
            self.batch_size
        );

        let classifier = SubscriptionClassifier::new(rule, exclusions);
        let mut result = BatchResult {
            mode,
            total,
            ..BatchResult::default()
        };

        for (index, subscription) in candidates.iter().enumerate() {
            let mut classification = classifier.classify(subscription);

            if mode == RunMode::Apply && classification.will_update() {
                if let Err(e) = self.engine.update_subscription(subscription, rule, observer) {
                    warn!("Failed to update subscription {}: {}", subscription.id, e);
                    classification = Classification::invalid();
                }
            }

            debug!(
                "Subscription {} -> {:?} {:?}",
                subscription.id, classification.outcome, classification.reason
            );

            match classification.outcome {
                Outcome::WillUpdate => result.updated += 1,
                Outcome::WillSkip => result.skipped += 1,
                Outcome::Error => result.errors += 1,
            }

            if mode == RunMode::Preview && result.sample.len() < SAMPLE_SIZE {
                result.sample.push(RecordPreview {
                    id: subscription.id.clone(),
                    billing_email: subscription.billing_email.clone(),
                    current_date: subscription.next_payment,
                    outcome: classification.outcome,
                    reason: classification.reason,
                });
            }

            if let Some(observer) = observer {
                observer.record_processed(index + 1, total);
            }

            // Pause between chunks, not after the last record
            let processed = index + 1;
            if processed % self.batch_size == 0 && processed < total && !self.batch_delay.is_zero() {
                debug!("Processed {}/{}, pausing {:?}", processed, total, self.batch_delay);
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        info!(
            "Batch complete ({}): {} updated, {} skipped, {} errors",
            mode, result.updated, result.skipped, result.errors
        );

        Ok(result)
    }
}
