use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::models::{MessageRow, UserRow};
use crate::store::{Result, Store, StoreError};

/// Process-local store. Data lives as long as the value; used for tests and
/// throwaway dev servers.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, UserRow>>,
    messages: Mutex<Vec<MessageRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn users(&self) -> Result<MutexGuard<'_, HashMap<String, UserRow>>> {
        self.users.lock().map_err(|_| StoreError::Poisoned("users"))
    }

    fn messages(&self) -> Result<MutexGuard<'_, Vec<MessageRow>>> {
        self.messages
            .lock()
            .map_err(|_| StoreError::Poisoned("messages"))
    }
}

impl Store for MemoryStore {
    fn create_user(&self, user: &UserRow) -> Result<()> {
        let mut users = self.users()?;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        Ok(self.users()?.values().find(|u| u.email == email).cloned())
    }

    fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        Ok(self.users()?.get(id).cloned())
    }

    fn set_profile_picture(&self, id: &str, picture: &str) -> Result<bool> {
        Ok(match self.users()?.get_mut(id) {
            Some(user) => {
                user.profile_picture = Some(picture.to_string());
                true
            }
            None => false,
        })
    }

    fn set_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        Ok(match self.users()?.get_mut(id) {
            Some(user) => {
                user.password = password_hash.to_string();
                true
            }
            None => false,
        })
    }

    fn insert_message(&self, message: &MessageRow) -> Result<()> {
        // Lock order: users, then messages
        let users = self.users()?;
        if !users.contains_key(&message.sender) || !users.contains_key(&message.receiver) {
            return Err(StoreError::UnknownUser);
        }
        self.messages()?.push(message.clone());
        Ok(())
    }

    fn get_conversation(&self, a: &str, b: &str) -> Result<Vec<MessageRow>> {
        let mut rows: Vec<MessageRow> = self
            .messages()?
            .iter()
            .filter(|m| {
                (m.sender == a && m.receiver == b) || (m.sender == b && m.receiver == a)
            })
            .cloned()
            .collect();

        // Stable sort: equal timestamps keep insertion order
        rows.sort_by(|x, y| x.created_at.cmp(&y.created_at));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::conformance;

    #[test]
    fn create_and_lookup() {
        conformance::create_and_lookup(&MemoryStore::new());
    }

    #[test]
    fn duplicate_email_conflicts() {
        conformance::duplicate_email_conflicts(&MemoryStore::new());
    }

    #[test]
    fn updates_profile_fields() {
        conformance::updates_profile_fields(&MemoryStore::new());
    }

    #[test]
    fn conversation_is_bidirectional_and_ordered() {
        conformance::conversation_is_bidirectional_and_ordered(&MemoryStore::new());
    }

    #[test]
    fn message_requires_both_users() {
        conformance::message_requires_both_users(&MemoryStore::new());
    }

    #[test]
    fn same_instant_keeps_insertion_order() {
        conformance::same_instant_keeps_insertion_order(&MemoryStore::new());
    }
}
