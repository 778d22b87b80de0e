//! Cross-platform identity anchor: [`UnifiedUser`] ties one or more platform
//! accounts to one person.

use std::sync::Mutex;

use uuid::Uuid;

use crate::types::{AccountId, PlatformAccount};

/// One user of the bot system. Currently one account per user; the shape
/// allows multiple accounts from different platforms to be tied together later.
#[derive(Debug)]
pub struct UnifiedUser {
    id: Uuid,
    accounts: Mutex<Vec<PlatformAccount>>,
}

impl UnifiedUser {
    pub fn new(account: PlatformAccount) -> Self {
        Self {
            id: Uuid::new_v4(),
            accounts: Mutex::new(vec![account]),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The primary account (first registered).
    pub fn primary_account(&self) -> PlatformAccount {
        self.accounts.lock().unwrap()[0].clone()
    }

    /// Display name of the primary account.
    pub fn user_name(&self) -> String {
        self.primary_account().name
    }

    /// Handle of the primary account, if it has one.
    pub fn handle(&self) -> Option<String> {
        self.primary_account().handle.filter(|h| !h.is_empty())
    }

    /// Whether this user owns the given platform account id.
    pub fn owns(&self, account_id: &AccountId) -> bool {
        self.accounts.lock().unwrap().iter().any(|a| &a.id == account_id)
    }

    /// Refreshes the stored account matching `account.id` with freshly observed
    /// values. Returns true when the observed name or handle diverged from the
    /// cached ones (the caller raises a user-updated notification then).
    pub fn refresh_account(&self, account: &PlatformAccount) -> bool {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(existing) = accounts.iter_mut().find(|a| a.id == account.id) {
            if existing.name != account.name || existing.handle != account.handle {
                *existing = account.clone();
                return true;
            }
        }
        false
    }
}
