use serde::{Deserialize, Serialize};
use tracing::{error, info};
use crate::{
    config::EngineConfig,
    error::{DateManagerError, ErrorCategory, Result},
    schedule::{
        batch::{BatchProcessor, BatchResult, RecordPreview, RunMode},
        date_rule::DateRule,
        engine::UpdateEngine,
        exclusions::ExclusionSet,
        observer::BatchObserver,
    },
    storage::{
        store::{OptionStore, SubscriptionStore},
        update_log::UpdateLog,
    },
};

/// Raw input handed over by the calling layer after its own permission checks
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequest {
    pub new_date: String,
    pub exclude_after: String,
    #[serde(default)]
    pub excluded_emails: String,
    #[serde(default)]
    pub mode: RunMode,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum UpdateResponse {
    Success {
        updated: usize,
        skipped: usize,
        errors: usize,
        total: usize,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        sample: Option<Vec<RecordPreview>>,
    },
    Failure {
        error_message: String,
        category: ErrorCategory,
    },
}

impl UpdateResponse {
    pub fn from_result(result: &Result<BatchResult>) -> Self {
        match result {
            Ok(batch) => UpdateResponse::Success {
                updated: batch.updated,
                skipped: batch.skipped,
                errors: batch.errors,
                total: batch.total,
                message: batch.summary_message(),
                sample: match batch.mode {
                    RunMode::Preview => Some(batch.sample.clone()),
                    RunMode::Apply => None,
                },
            },
            Err(e) => UpdateResponse::from_error(e),
        }
    }

    pub fn from_error(error: &DateManagerError) -> Self {
        UpdateResponse::Failure {
            error_message: error.to_string(),
            category: error.category(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UpdateResponse::Success { .. })
    }
}

/// Validates a request, runs the batch and records it in the update log
pub struct DateManager<'a, S: SubscriptionStore, O: OptionStore> {
    processor: BatchProcessor<'a, S>,
    log: UpdateLog<'a, O>,
}

impl<'a, S: SubscriptionStore, O: OptionStore> DateManager<'a, S, O> {
    pub fn new(store: &'a S, options: &'a O, config: &EngineConfig) -> Self {
        Self {
            processor: BatchProcessor::new(
                UpdateEngine::new(store),
                config.batch_size(),
                config.batch_delay_ms,
            ),
            log: UpdateLog::new(options),
        }
    }

    pub fn log(&self) -> &UpdateLog<'a, O> {
        &self.log
    }

    /// Validation errors return before the store is touched
    pub async fn execute(
        &self,
        request: &UpdateRequest,
        actor: &str,
        observer: Option<&dyn BatchObserver>,
    ) -> Result<BatchResult> {
        let rule = DateRule::validate(&request.new_date, &request.exclude_after)?;
        let exclusions = ExclusionSet::from_text(&request.excluded_emails);

        info!(
            "{} requested {} run: target {}, cutoff {}, {} excluded emails",
            actor,
            request.mode,
            rule.target_date().format("%Y-%m-%d %H:%M:%S"),
            rule.cutoff_date().format("%Y-%m-%d %H:%M:%S"),
            exclusions.len()
        );

        let result = self.processor.run(&rule, &exclusions, request.mode, observer).await?;
        self.log.record(&result, &rule, exclusions.len(), actor);

        Ok(result)
    }

    pub async fn handle(
        &self,
        request: &UpdateRequest,
        actor: &str,
        observer: Option<&dyn BatchObserver>,
    ) -> UpdateResponse {
        let result = self.execute(request, actor, observer).await;
        if let Err(e) = &result {
            error!("Update request from {} failed: {}", actor, e);
        }
        UpdateResponse::from_result(&result)
    }
}
