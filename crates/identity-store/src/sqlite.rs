use chrono::Utc;
use hrm_core_types::EmployeeIdentity;
use sqlx::{sqlite::SqliteRow, Row};
use tracing::{debug, info};

use super::{IdentityStore, StoreError};
use crate::connection::{connect, DbPool};

const CREATE_EMPLOYEES: &str = "CREATE TABLE IF NOT EXISTS employees (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id TEXT NOT NULL UNIQUE,
    first_name TEXT NOT NULL,
    middle_name TEXT NULL,
    last_name TEXT NOT NULL,
    created_at TEXT NOT NULL
)";

pub struct SqliteIdentityStore {
    pool: DbPool,
}

impl SqliteIdentityStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Connects and creates the table when it does not exist yet.
    pub async fn open(database_url: &str) -> Result<Self, StoreError> {
        let store = Self::new(connect(database_url).await?);
        store.ensure_schema().await?;
        info!(database_url = %database_url, "identity store ready");
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_EMPLOYEES).execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl IdentityStore for SqliteIdentityStore {
    async fn find_by_id(
        &self,
        employee_id: &str,
    ) -> Result<Option<EmployeeIdentity>, StoreError> {
        let row = sqlx::query(
            "SELECT employee_id, first_name, middle_name, last_name
             FROM employees
             WHERE employee_id = ?",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(identity_from_row).transpose()
    }

    async fn find_by_name(
        &self,
        first_name: &str,
        middle_name: Option<&str>,
        last_name: &str,
    ) -> Result<Option<EmployeeIdentity>, StoreError> {
        let row = sqlx::query(
            "SELECT employee_id, first_name, middle_name, last_name
             FROM employees
             WHERE first_name = ? AND middle_name IS ? AND last_name = ?
             ORDER BY id ASC
             LIMIT 1",
        )
        .bind(first_name)
        .bind(middle_name)
        .bind(last_name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(identity_from_row).transpose()
    }

    async fn add(&self, identity: EmployeeIdentity) -> Result<EmployeeIdentity, StoreError> {
        let result = sqlx::query(
            "INSERT INTO employees (employee_id, first_name, middle_name, last_name, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&identity.employee_id)
        .bind(&identity.first_name)
        .bind(identity.middle_name.as_deref())
        .bind(&identity.last_name)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(employee_id = %identity.employee_id, "employee recorded");
                Ok(identity)
            }
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                Err(StoreError::Conflict(identity.employee_id))
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn identity_from_row(row: SqliteRow) -> Result<EmployeeIdentity, StoreError> {
    let employee_id: String = row.try_get("employee_id")?;
    if employee_id.is_empty() {
        return Err(StoreError::Decode("empty employee_id".to_string()));
    }
    Ok(EmployeeIdentity {
        employee_id,
        first_name: row.try_get("first_name")?,
        middle_name: row.try_get("middle_name")?,
        last_name: row.try_get("last_name")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_with_settings;
    use hrm_core_types::NewEmployee;

    async fn memory_store() -> SqliteIdentityStore {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect test pool");
        let store = SqliteIdentityStore::new(pool);
        store.ensure_schema().await.expect("create schema");
        store
    }

    #[tokio::test]
    async fn null_middle_name_matches_only_null() {
        let store = memory_store().await;
        store
            .add(NewEmployee::new("Jane", "Doe").into_identity("0042"))
            .await
            .unwrap();
        store
            .add(
                NewEmployee::new("Jane", "Doe")
                    .with_middle_name("Q")
                    .into_identity("0043"),
            )
            .await
            .unwrap();

        let plain = store.find_by_name("Jane", None, "Doe").await.unwrap().unwrap();
        assert_eq!(plain.employee_id, "0042");
        let middle = store
            .find_by_name("Jane", Some("Q"), "Doe")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(middle.employee_id, "0043");
        assert_eq!(middle.middle_name.as_deref(), Some("Q"));
    }

    #[tokio::test]
    async fn unique_employee_id_is_a_conflict() {
        let store = memory_store().await;
        store
            .add(NewEmployee::new("Jane", "Doe").into_identity("0042"))
            .await
            .unwrap();
        let err = store
            .add(NewEmployee::new("John", "Roe").into_identity("0042"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(id) if id == "0042"));
        assert!(store.exists("0042").await.unwrap());
        assert!(!store.exists("0099").await.unwrap());
    }
}
