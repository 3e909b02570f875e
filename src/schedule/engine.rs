use crate::{
    error::Result,
    schedule::{date_rule::DateRule, observer::BatchObserver},
    storage::{models::Subscription, store::SubscriptionStore},
    ENGINE_VERSION,
};
use tracing::{info, warn};

/// Writes the new next-payment date onto one subscription
pub struct UpdateEngine<'a, S: SubscriptionStore> {
    store: &'a S,
}

impl<'a, S: SubscriptionStore> UpdateEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    /// Set `next_payment` to the rule's target and annotate the record
    ///
    /// Only the date write can fail the update. A failed annotation is logged
    /// and the update still counts.
    pub fn update_subscription(
        &self,
        subscription: &Subscription,
        rule: &DateRule,
        observer: Option<&dyn BatchObserver>,
    ) -> Result<()> {
        let target = rule.target_date();
        self.store.set_next_payment(&subscription.id, target)?;

        info!(
            "Subscription {} next payment set to {}",
            subscription.id,
            target.format("%Y-%m-%d %H:%M:%S")
        );

        let note = Self::audit_note(rule);
        if let Err(e) = self.store.append_note(&subscription.id, &note) {
            warn!("Could not annotate subscription {}: {}", subscription.id, e);
        }

        if let Some(observer) = observer {
            observer.record_updated(subscription, target);
        }

        Ok(())
    }

    pub fn audit_note(rule: &DateRule) -> String {
        format!(
            "Next payment date updated to {} by subscription date manager, version {}",
            rule.target_date().format("%Y-%m-%d %H:%M:%S"),
            ENGINE_VERSION
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::DateManagerError, storage::store::MockSubscriptionStore};
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        updated: RefCell<Vec<String>>,
    }

    impl BatchObserver for Recorder {
        fn record_updated(&self, subscription: &Subscription, _new_date: chrono::DateTime<chrono::Utc>) {
            self.updated.borrow_mut().push(subscription.id.clone());
        }
    }

    fn rule() -> DateRule {
        DateRule::validate("2024-02-01", "2024-01-15").unwrap()
    }

    #[test]
    fn test_note_failure_does_not_fail_update() {
        let rule = rule();
        let mut store = MockSubscriptionStore::new();
        store
            .expect_set_next_payment()
            .withf(move |id, date| id == "1" && *date == rule.target_date())
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_append_note()
            .times(1)
            .returning(|_, _| Err(DateManagerError::StoreUnavailable("notes locked".to_string())));

        let recorder = Recorder::default();
        let engine = UpdateEngine::new(&store);
        engine
            .update_subscription(&Subscription::new("1", None), &rule, Some(&recorder))
            .unwrap();

        assert_eq!(*recorder.updated.borrow(), vec!["1".to_string()]);
    }

    #[test]
    fn test_write_failure_skips_note_and_observer() {
        let rule = rule();
        let mut store = MockSubscriptionStore::new();
        store
            .expect_set_next_payment()
            .returning(|id, _| Err(DateManagerError::SubscriptionNotFound(id.to_string())));
        store.expect_append_note().times(0);

        let recorder = Recorder::default();
        let engine = UpdateEngine::new(&store);
        let result = engine.update_subscription(&Subscription::new("1", None), &rule, Some(&recorder));

        assert!(result.is_err());
        assert!(recorder.updated.borrow().is_empty());
    }

    #[test]
    fn test_audit_note_mentions_version() {
        let note = UpdateEngine::<MockSubscriptionStore>::audit_note(&rule());
        assert!(note.contains("2024-02-01 00:00:00"));
        assert!(note.contains(ENGINE_VERSION));
    }
}
