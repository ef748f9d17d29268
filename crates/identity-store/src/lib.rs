//! Local record of employees the engine has created.
//!
//! The store backs two things: the duplicate-name pre-check that runs before
//! any browser is launched, and resolving a claim's employee id into the
//! display name the typeahead searches for. Lookup and insert are separate
//! calls, so two concurrent creations of the same name can both pass the
//! pre-check.

use async_trait::async_trait;
use hrm_core_types::EmployeeIdentity;
use thiserror::Error;

pub mod connection;
pub mod memory;
pub mod sqlite;

pub use connection::{connect, connect_with_settings, DbPool};
pub use memory::InMemoryIdentityStore;
pub use sqlite::SqliteIdentityStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("employee id '{0}' is already recorded")]
    Conflict(String),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_id(&self, employee_id: &str)
        -> Result<Option<EmployeeIdentity>, StoreError>;

    /// Exact match on all three parts; an absent middle name only matches an
    /// absent middle name.
    async fn find_by_name(
        &self,
        first_name: &str,
        middle_name: Option<&str>,
        last_name: &str,
    ) -> Result<Option<EmployeeIdentity>, StoreError>;

    /// Records a new identity. An already recorded `employee_id` is a
    /// [`StoreError::Conflict`].
    async fn add(&self, identity: EmployeeIdentity) -> Result<EmployeeIdentity, StoreError>;

    async fn exists(&self, employee_id: &str) -> Result<bool, StoreError> {
        Ok(self.find_by_id(employee_id).await?.is_some())
    }
}
