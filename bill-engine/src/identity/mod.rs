//! Identity provider
//!
//! Email/password login against the document store.
//!
//! | Collection | Key | Body |
//! |------------|-----|------|
//! | `credentials` | normalized email | `{uid, password_hash, created_at}` |
//! | `staff` | normalized email | [`StaffProfile`] |
//!
//! An account with no staff profile is the owner: admin, every section.

pub mod password;

use crate::error::IdentityError;
use crate::security_log;
use crate::store::{DocumentStore, collections};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared::models::{Principal, Section, StaffProfile};
use shared::util::now_millis;
use std::sync::Arc;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<Principal, IdentityError>;

    async fn logout(&self);

    fn current(&self) -> Option<Principal>;

    /// Current principal, if it may open `section`
    fn authorize(&self, section: Section) -> Result<Principal, IdentityError> {
        let principal = self.current().ok_or(IdentityError::NotLoggedIn)?;
        if principal.has_access(section) {
            Ok(principal)
        } else {
            Err(IdentityError::AccessDenied(section))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Credentials {
    uid: String,
    password_hash: String,
    created_at: i64,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Store-backed identity provider
pub struct StaffDirectory {
    store: Arc<dyn DocumentStore>,
    current: RwLock<Option<Principal>>,
}

impl StaffDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            current: RwLock::new(None),
        }
    }

    /// Create login credentials; returns the new uid
    pub async fn register_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<String, IdentityError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(IdentityError::InvalidCredentials);
        }
        if self.store.get(collections::CREDENTIALS, &email).await?.is_some() {
            return Err(IdentityError::AlreadyRegistered(email));
        }

        let password_hash = password::hash_password(password)
            .map_err(|e| IdentityError::Backend(format!("password hashing failed: {}", e)))?;
        let credentials = Credentials {
            uid: uuid::Uuid::new_v4().simple().to_string(),
            password_hash,
            created_at: now_millis(),
        };
        let body = serde_json::to_value(&credentials)
            .map_err(|e| IdentityError::Backend(e.to_string()))?;
        self.store
            .set(collections::CREDENTIALS, &email, body)
            .await?;

        security_log!(INFO, "account_registered", email = %email, uid = %credentials.uid);
        Ok(credentials.uid)
    }

    /// Create or replace the staff profile of an email
    pub async fn set_staff_profile(
        &self,
        email: &str,
        profile: &StaffProfile,
    ) -> Result<(), IdentityError> {
        let email = normalize_email(email);
        let body =
            serde_json::to_value(profile).map_err(|e| IdentityError::Backend(e.to_string()))?;
        self.store.set(collections::STAFF, &email, body).await?;
        Ok(())
    }

    async fn principal_for(&self, uid: String, email: String) -> Result<Principal, IdentityError> {
        match self.store.get(collections::STAFF, &email).await? {
            Some(doc) => {
                let profile: StaffProfile = doc.decode()?;
                Ok(Principal::staff(uid, email, profile))
            }
            None => Ok(Principal::admin(uid, email)),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaffDirectory {
    async fn login(&self, email: &str, password: &str) -> Result<Principal, IdentityError> {
        let email = normalize_email(email);
        let Some(doc) = self.store.get(collections::CREDENTIALS, &email).await? else {
            security_log!(WARN, "login_failed", email = %email, reason = "unknown_user");
            return Err(IdentityError::UserNotFound);
        };
        let credentials: Credentials = doc.decode()?;

        if !password::verify_password(password, &credentials.password_hash) {
            security_log!(WARN, "login_failed", email = %email, reason = "bad_password");
            return Err(IdentityError::InvalidCredentials);
        }

        let principal = self.principal_for(credentials.uid, email).await?;
        security_log!(
            INFO,
            "login",
            email = %principal.email,
            is_admin = principal.is_admin
        );
        *self.current.write() = Some(principal.clone());
        Ok(principal)
    }

    async fn logout(&self) {
        if let Some(principal) = self.current.write().take() {
            security_log!(INFO, "logout", email = %principal.email);
        }
    }

    fn current(&self) -> Option<Principal> {
        self.current.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn directory() -> StaffDirectory {
        StaffDirectory::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_owner_without_profile_is_admin() {
        let dir = directory();
        dir.register_account("Owner@Example.com ", "pw").await.unwrap();

        let principal = dir.login("owner@example.com", "pw").await.unwrap();
        assert!(principal.is_admin);
        assert_eq!(principal.name, "Admin");
        assert!(dir.authorize(Section::Dashboard).is_ok());
    }

    #[tokio::test]
    async fn test_staff_access() {
        let dir = directory();
        dir.register_account("cashier@example.com", "pw").await.unwrap();
        dir.set_staff_profile(
            "cashier@example.com",
            &StaffProfile {
                name: "Ravi".to_string(),
                access: vec![Section::Billing, Section::Orders],
            },
        )
        .await
        .unwrap();

        assert_eq!(dir.authorize(Section::Billing), Err(IdentityError::NotLoggedIn));

        let principal = dir.login("cashier@example.com", "pw").await.unwrap();
        assert_eq!(principal.name, "Ravi");
        assert!(!principal.is_admin);
        assert!(dir.authorize(Section::Billing).is_ok());
        assert_eq!(
            dir.authorize(Section::Dashboard),
            Err(IdentityError::AccessDenied(Section::Dashboard))
        );

        dir.logout().await;
        assert!(dir.current().is_none());
    }

    #[tokio::test]
    async fn test_login_failures() {
        let dir = directory();
        dir.register_account("a@example.com", "right").await.unwrap();

        assert_eq!(
            dir.login("a@example.com", "wrong").await,
            Err(IdentityError::InvalidCredentials)
        );
        assert_eq!(
            dir.login("nobody@example.com", "x").await,
            Err(IdentityError::UserNotFound)
        );
        assert!(dir.current().is_none());

        assert!(matches!(
            dir.register_account("A@example.com", "again").await,
            Err(IdentityError::AlreadyRegistered(_))
        ));
    }
}
