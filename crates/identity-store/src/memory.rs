use std::collections::HashMap;

use hrm_core_types::EmployeeIdentity;
use tokio::sync::RwLock;

use super::{IdentityStore, StoreError};

/// Process-local store. Contents are lost on exit.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    employees: RwLock<HashMap<String, EmployeeIdentity>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.employees.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.employees.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by_id(
        &self,
        employee_id: &str,
    ) -> Result<Option<EmployeeIdentity>, StoreError> {
        let employees = self.employees.read().await;
        Ok(employees.get(employee_id).cloned())
    }

    async fn find_by_name(
        &self,
        first_name: &str,
        middle_name: Option<&str>,
        last_name: &str,
    ) -> Result<Option<EmployeeIdentity>, StoreError> {
        let employees = self.employees.read().await;
        Ok(employees
            .values()
            .find(|e| {
                e.first_name == first_name
                    && e.middle_name.as_deref() == middle_name
                    && e.last_name == last_name
            })
            .cloned())
    }

    async fn add(&self, identity: EmployeeIdentity) -> Result<EmployeeIdentity, StoreError> {
        let mut employees = self.employees.write().await;
        if employees.contains_key(&identity.employee_id) {
            return Err(StoreError::Conflict(identity.employee_id));
        }
        employees.insert(identity.employee_id.clone(), identity.clone());
        Ok(identity)
    }
}
