use thiserror::Error;

use crate::models::{MessageRow, UserRow};

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    /// A message named a sender or receiver with no user row.
    #[error("message references an unknown user")]
    UnknownUser,

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0} connection lock poisoned")]
    Poisoned(&'static str),
}

/// Persistence for users and direct messages.
///
/// Every method is a single statement against the backend. Implementations
/// are blocking; async callers run them on `spawn_blocking`.
pub trait Store: Send + Sync {
    /// Fails with [`StoreError::DuplicateEmail`] if `email` is taken.
    fn create_user(&self, user: &UserRow) -> Result<()>;

    fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>>;

    fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>>;

    /// Returns `false` when no user has `id`.
    fn set_profile_picture(&self, id: &str, picture: &str) -> Result<bool>;

    /// Returns `false` when no user has `id`.
    fn set_password(&self, id: &str, password_hash: &str) -> Result<bool>;

    /// Fails with [`StoreError::UnknownUser`] unless both parties exist.
    fn insert_message(&self, message: &MessageRow) -> Result<()>;

    /// Messages between `a` and `b` in either direction, oldest first.
    fn get_conversation(&self, a: &str, b: &str) -> Result<Vec<MessageRow>>;
}

/// Behaviour every backend must share. Each backend's test module calls
/// these against a fresh instance.
#[cfg(test)]
pub(crate) mod conformance {
    use super::*;
    use crate::models::format_timestamp;
    use chrono::{Duration, TimeZone, Utc};

    pub fn user(id: &str, email: &str) -> UserRow {
        UserRow {
            id: id.into(),
            email: email.into(),
            password: format!("hash-of-{id}"),
            profile_picture: None,
            created_at: format_timestamp(Utc::now()),
        }
    }

    fn message(id: &str, sender: &str, receiver: &str, offset_ms: i64) -> MessageRow {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        MessageRow {
            id: id.into(),
            sender: sender.into(),
            receiver: receiver.into(),
            text: format!("text {id}"),
            created_at: format_timestamp(base + Duration::milliseconds(offset_ms)),
        }
    }

    pub fn create_and_lookup(store: &dyn Store) {
        store.create_user(&user("u1", "a@x.com")).unwrap();

        let by_email = store.get_user_by_email("a@x.com").unwrap().unwrap();
        assert_eq!(by_email.id, "u1");
        assert_eq!(by_email.password, "hash-of-u1");
        assert_eq!(by_email.profile_picture, None);

        let by_id = store.get_user_by_id("u1").unwrap().unwrap();
        assert_eq!(by_id, by_email);

        assert!(store.get_user_by_email("nobody@x.com").unwrap().is_none());
        assert!(store.get_user_by_id("missing").unwrap().is_none());
    }

    pub fn duplicate_email_conflicts(store: &dyn Store) {
        store.create_user(&user("u1", "a@x.com")).unwrap();

        let err = store.create_user(&user("u2", "a@x.com")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail), "got {err:?}");
        assert!(store.get_user_by_id("u2").unwrap().is_none());
    }

    pub fn updates_profile_fields(store: &dyn Store) {
        store.create_user(&user("u1", "a@x.com")).unwrap();

        assert!(store.set_profile_picture("u1", "https://cdn/p.png").unwrap());
        assert!(store.set_password("u1", "new-hash").unwrap());

        let row = store.get_user_by_id("u1").unwrap().unwrap();
        assert_eq!(row.profile_picture.as_deref(), Some("https://cdn/p.png"));
        assert_eq!(row.password, "new-hash");

        assert!(!store.set_profile_picture("ghost", "x").unwrap());
        assert!(!store.set_password("ghost", "x").unwrap());
    }

    pub fn conversation_is_bidirectional_and_ordered(store: &dyn Store) {
        for (id, email) in [("a", "a@x.com"), ("b", "b@x.com"), ("c", "c@x.com")] {
            store.create_user(&user(id, email)).unwrap();
        }

        // Inserted out of time order on purpose
        store.insert_message(&message("m2", "b", "a", 20)).unwrap();
        store.insert_message(&message("m1", "a", "b", 10)).unwrap();
        store.insert_message(&message("m3", "a", "c", 15)).unwrap();
        store.insert_message(&message("m4", "a", "b", 30)).unwrap();

        let from_a: Vec<String> = store
            .get_conversation("a", "b")
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(from_a, ["m1", "m2", "m4"]);

        let from_b: Vec<String> = store
            .get_conversation("b", "a")
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(from_b, from_a);

        assert!(store.get_conversation("b", "c").unwrap().is_empty());
    }

    pub fn message_requires_both_users(store: &dyn Store) {
        store.create_user(&user("a", "a@x.com")).unwrap();

        let err = store.insert_message(&message("m1", "a", "ghost", 0)).unwrap_err();
        assert!(matches!(err, StoreError::UnknownUser), "got {err:?}");

        let err = store.insert_message(&message("m2", "ghost", "a", 0)).unwrap_err();
        assert!(matches!(err, StoreError::UnknownUser), "got {err:?}");

        assert!(store.get_conversation("a", "ghost").unwrap().is_empty());
    }

    pub fn same_instant_keeps_insertion_order(store: &dyn Store) {
        store.create_user(&user("a", "a@x.com")).unwrap();
        store.create_user(&user("b", "b@x.com")).unwrap();

        store.insert_message(&message("first", "a", "b", 0)).unwrap();
        store.insert_message(&message("second", "b", "a", 0)).unwrap();

        let ids: Vec<String> = store
            .get_conversation("a", "b")
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, ["first", "second"]);
    }
}
