use chrono::Utc;
use tracing::{debug, warn};
use crate::{
    error::{DateManagerError, Result},
    schedule::{batch::BatchResult, date_rule::DateRule},
    storage::{models::UpdateLogEntry, store::OptionStore},
    ENGINE_VERSION,
};

pub const UPDATE_LOG_KEY: &str = "update_log";
pub const MAX_LOG_ENTRIES: usize = 10;

/// Bounded, most-recent-first history of batch runs
pub struct UpdateLog<'a, O: OptionStore> {
    store: &'a O,
}

impl<'a, O: OptionStore> UpdateLog<'a, O> {
    pub fn new(store: &'a O) -> Self {
        Self { store }
    }

    /// Record a run summary. Persistence failures are reported and swallowed.
    pub fn record(&self, result: &BatchResult, rule: &DateRule, excluded_count: usize, actor: &str) {
        let entry = UpdateLogEntry {
            timestamp: Utc::now(),
            actor: actor.to_string(),
            target_date: rule.target_date(),
            cutoff_date: rule.cutoff_date(),
            excluded_count,
            mode: result.mode.to_string(),
            updated: result.updated,
            skipped: result.skipped,
            errors: result.errors,
            version: ENGINE_VERSION.to_string(),
        };

        if let Err(e) = self.prepend(entry) {
            warn!("Failed to persist update log entry: {}", e);
        }
    }

    fn prepend(&self, entry: UpdateLogEntry) -> Result<()> {
        let mut entries = match self.list() {
            Ok(entries) => entries,
            Err(DateManagerError::JsonError(e)) => {
                warn!("Stored update log is unreadable, starting a new one: {}", e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(0, entry);
        entries.truncate(MAX_LOG_ENTRIES);

        let encoded = serde_json::to_string(&entries)?;
        self.store.save_option(UPDATE_LOG_KEY, &encoded)?;

        debug!("Update log now holds {} entries", entries.len());
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<UpdateLogEntry>> {
        match self.store.load_option(UPDATE_LOG_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.store.delete_option(UPDATE_LOG_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        schedule::batch::RunMode,
        storage::{db::Database, store::MockOptionStore},
    };

    fn rule() -> DateRule {
        DateRule::validate("2024-02-01", "2024-01-15").unwrap()
    }

    fn result_with(updated: usize) -> BatchResult {
        BatchResult {
            mode: RunMode::Apply,
            total: updated,
            updated,
            ..BatchResult::default()
        }
    }

    #[test]
    fn test_retains_newest_ten_entries() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("log.db").to_str().unwrap()).unwrap();
        let log = UpdateLog::new(&db);

        for i in 0..15 {
            log.record(&result_with(i), &rule(), 2, "ops");
        }

        let entries = log.list().unwrap();
        assert_eq!(entries.len(), MAX_LOG_ENTRIES);
        assert_eq!(entries[0].updated, 14);
        assert_eq!(entries[9].updated, 5);
        assert_eq!(entries[0].actor, "ops");
        assert_eq!(entries[0].excluded_count, 2);
        assert_eq!(entries[0].version, ENGINE_VERSION);
    }

    #[test]
    fn test_clear_empties_history() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("log.db").to_str().unwrap()).unwrap();
        let log = UpdateLog::new(&db);

        log.record(&result_with(1), &rule(), 0, "ops");
        assert_eq!(log.list().unwrap().len(), 1);

        log.clear().unwrap();
        assert!(log.list().unwrap().is_empty());
    }

    #[test]
    fn test_record_swallows_persistence_failure() {
        let mut store = MockOptionStore::new();
        store.expect_load_option().returning(|_| Ok(None));
        store
            .expect_save_option()
            .times(1)
            .returning(|_, _| Err(DateManagerError::StoreUnavailable("disk full".to_string())));

        let log = UpdateLog::new(&store);
        log.record(&result_with(3), &rule(), 0, "ops");
    }

    #[test]
    fn test_record_replaces_unreadable_history() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("log.db").to_str().unwrap()).unwrap();
        db.save_option(UPDATE_LOG_KEY, "not json").unwrap();

        let log = UpdateLog::new(&db);
        assert!(log.list().is_err());

        for i in 1..=3 {
            log.record(&result_with(i), &rule(), 0, "ops");
        }

        let entries = log.list().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].updated, 3);
        assert_eq!(entries[2].updated, 1);
    }

    #[test]
    fn test_record_keeps_history_when_load_fails() {
        let mut store = MockOptionStore::new();
        store
            .expect_load_option()
            .returning(|_| Err(DateManagerError::StoreUnavailable("locked".to_string())));
        store.expect_save_option().times(0);

        let log = UpdateLog::new(&store);
        log.record(&result_with(1), &rule(), 0, "ops");
    }
}
