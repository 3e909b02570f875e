use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};
use chrono::{DateTime, Utc};
use crate::{
    error::{DateManagerError, Result},
    storage::{
        models::{Subscription, SubscriptionNote, SubscriptionStatus},
        store::{OptionStore, SubscriptionStore},
    },
};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS subscriptions (
                id TEXT PRIMARY KEY,
                billing_email TEXT,
                last_payment TEXT,
                next_payment TEXT,
                status TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS subscription_notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subscription_id TEXT NOT NULL,
                note TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (subscription_id) REFERENCES subscriptions(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS options (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_subscription_status ON subscriptions(status)",
            [],
        )?;

        Ok(())
    }

    pub fn upsert_subscription(&self, subscription: &Subscription) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO subscriptions
             (id, billing_email, last_payment, next_payment, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                subscription.id,
                subscription.billing_email,
                subscription.last_payment.map(|dt| dt.to_rfc3339()),
                subscription.next_payment.map(|dt| dt.to_rfc3339()),
                subscription.status.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Active subscriptions for display, capped at `limit`
    pub fn list_subscriptions(&self, limit: usize) -> Result<Vec<Subscription>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, billing_email, last_payment, next_payment, status
             FROM subscriptions
             WHERE status = 'active'
             ORDER BY id
             LIMIT ?1"
        )?;

        let subscriptions = stmt
            .query_map([limit as i64], row_to_subscription)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(subscriptions)
    }

    pub fn get_subscription(&self, id: &str) -> Result<Option<Subscription>> {
        let subscription = self.conn
            .query_row(
                "SELECT id, billing_email, last_payment, next_payment, status
                 FROM subscriptions
                 WHERE id = ?1",
                [id],
                row_to_subscription,
            )
            .optional()?;

        Ok(subscription)
    }

    pub fn notes_for(&self, id: &str) -> Result<Vec<SubscriptionNote>> {
        let mut stmt = self.conn.prepare(
            "SELECT subscription_id, note, created_at
             FROM subscription_notes
             WHERE subscription_id = ?1
             ORDER BY id"
        )?;

        let notes = stmt
            .query_map([id], |row| {
                Ok(SubscriptionNote {
                    subscription_id: row.get(0)?,
                    note: row.get(1)?,
                    created_at: parse_timestamp(2, row.get(2)?)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(notes)
    }

    fn require_subscription(&self, id: &str) -> Result<Subscription> {
        self.get_subscription(id)?
            .ok_or_else(|| DateManagerError::SubscriptionNotFound(id.to_string()))
    }
}

impl SubscriptionStore for Database {
    fn list_active(&self) -> Result<Vec<Subscription>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, billing_email, last_payment, next_payment, status
             FROM subscriptions
             WHERE status = 'active'"
        )?;

        let subscriptions = stmt
            .query_map([], row_to_subscription)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(subscriptions)
    }

    fn get_status(&self, id: &str) -> Result<SubscriptionStatus> {
        Ok(self.require_subscription(id)?.status)
    }

    fn get_billing_identity(&self, id: &str) -> Result<Option<String>> {
        Ok(self.require_subscription(id)?.billing_email)
    }

    fn get_last_payment(&self, id: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.require_subscription(id)?.last_payment)
    }

    fn set_next_payment(&self, id: &str, date: DateTime<Utc>) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE subscriptions SET next_payment = ?1 WHERE id = ?2",
            params![date.to_rfc3339(), id],
        )?;

        if changed == 0 {
            return Err(DateManagerError::SubscriptionNotFound(id.to_string()));
        }
        Ok(())
    }

    fn append_note(&self, id: &str, text: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO subscription_notes (subscription_id, note, created_at)
             VALUES (?1, ?2, ?3)",
            params![id, text, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

impl OptionStore for Database {
    fn load_option(&self, key: &str) -> Result<Option<String>> {
        let value = self.conn
            .query_row("SELECT value FROM options WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn save_option(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO options (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete_option(&self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM options WHERE key = ?1", [key])?;
        Ok(())
    }
}

fn row_to_subscription(row: &Row<'_>) -> rusqlite::Result<Subscription> {
    let status: String = row.get(4)?;

    Ok(Subscription {
        id: row.get(0)?,
        billing_email: row.get(1)?,
        last_payment: parse_optional_timestamp(2, row.get(2)?)?,
        next_payment: parse_optional_timestamp(3, row.get(3)?)?,
        status: SubscriptionStatus::from(status),
    })
}

fn parse_timestamp(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_optional_timestamp(idx: usize, value: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(idx, v)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn open_temp() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::new(path.to_str().unwrap()).unwrap();
        (dir, db)
    }

    #[test]
    fn test_list_active_filters_by_status() {
        let (_dir, db) = open_temp();

        db.upsert_subscription(&Subscription::new("1", Some("a@x.com"))).unwrap();
        let mut cancelled = Subscription::new("2", Some("b@x.com"));
        cancelled.status = SubscriptionStatus::Cancelled;
        db.upsert_subscription(&cancelled).unwrap();

        let active = db.list_active().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "1");
    }

    #[test]
    fn test_timestamps_round_trip_through_store() {
        let (_dir, db) = open_temp();
        let paid = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();

        let mut sub = Subscription::new("7", None);
        sub.last_payment = Some(paid);
        db.upsert_subscription(&sub).unwrap();

        assert_eq!(db.get_last_payment("7").unwrap(), Some(paid));
        assert_eq!(db.get_billing_identity("7").unwrap(), None);
    }

    #[test]
    fn test_set_next_payment_on_missing_subscription_fails() {
        let (_dir, db) = open_temp();
        let date = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let err = db.set_next_payment("missing", date).unwrap_err();
        assert!(matches!(err, DateManagerError::SubscriptionNotFound(_)));
    }

    #[test]
    fn test_set_next_payment_and_notes() {
        let (_dir, db) = open_temp();
        let date = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        db.upsert_subscription(&Subscription::new("42", Some("c@x.com"))).unwrap();

        db.set_next_payment("42", date).unwrap();
        db.append_note("42", "moved").unwrap();

        let stored = db.get_subscription("42").unwrap().unwrap();
        assert_eq!(stored.next_payment, Some(date));

        let notes = db.notes_for("42").unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].note, "moved");
    }

    #[test]
    fn test_option_store_replaces_value() {
        let (_dir, db) = open_temp();

        assert_eq!(db.load_option("k").unwrap(), None);
        db.save_option("k", "one").unwrap();
        db.save_option("k", "two").unwrap();
        assert_eq!(db.load_option("k").unwrap(), Some("two".to_string()));

        db.delete_option("k").unwrap();
        assert_eq!(db.load_option("k").unwrap(), None);
    }

    #[test]
    fn test_list_subscriptions_respects_limit() {
        let (_dir, db) = open_temp();
        for i in 0..5 {
            db.upsert_subscription(&Subscription::new(format!("s{}", i), None)).unwrap();
        }

        assert_eq!(db.list_subscriptions(3).unwrap().len(), 3);
    }
}
