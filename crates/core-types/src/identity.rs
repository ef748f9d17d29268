//! Identities and work items the flows operate on.

use serde::{Deserialize, Serialize};

/// Name triple supplied by the caller before any id exists.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
}

impl NewEmployee {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            middle_name: None,
            last_name: last_name.into(),
        }
    }

    pub fn with_middle_name(mut self, middle_name: impl Into<String>) -> Self {
        self.middle_name = Some(middle_name.into());
        self
    }

    /// Middle name with blank values treated as absent.
    pub fn middle(&self) -> Option<&str> {
        self.middle_name
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Binds the authoritative id read back from the target system.
    pub fn into_identity(self, employee_id: impl Into<String>) -> EmployeeIdentity {
        let middle_name = self.middle().map(str::to_string);
        EmployeeIdentity {
            employee_id: employee_id.into(),
            first_name: self.first_name,
            middle_name,
            last_name: self.last_name,
        }
    }
}

/// An employee as persisted after the target system assigned its id.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EmployeeIdentity {
    pub employee_id: String,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
}

impl EmployeeIdentity {
    /// Human-readable name used for UI-level lookup.
    pub fn display_name(&self) -> String {
        let mut parts = vec![self.first_name.trim()];
        if let Some(middle) = self.middle_name.as_deref().map(str::trim) {
            if !middle.is_empty() {
                parts.push(middle);
            }
        }
        parts.push(self.last_name.trim());
        parts.join(" ")
    }
}

/// One of the five job dropdowns, in the order they are resolved.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobField {
    JobTitle,
    JobCategory,
    SubUnit,
    Location,
    EmploymentStatus,
}

impl JobField {
    pub const ORDER: [JobField; 5] = [
        JobField::JobTitle,
        JobField::JobCategory,
        JobField::SubUnit,
        JobField::Location,
        JobField::EmploymentStatus,
    ];

    /// Label shown next to the dropdown; also used in failure messages.
    pub fn label(&self) -> &'static str {
        match self {
            JobField::JobTitle => "Job Title",
            JobField::JobCategory => "Job Category",
            JobField::SubUnit => "Sub Unit",
            JobField::Location => "Location",
            JobField::EmploymentStatus => "Employment Status",
        }
    }
}

/// Five free-text labels, each resolved against a live dropdown.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct JobDetails {
    pub job_title: String,
    pub job_category: String,
    pub sub_unit: String,
    pub location: String,
    pub employment_status: String,
}

impl JobDetails {
    pub fn value(&self, field: JobField) -> &str {
        match field {
            JobField::JobTitle => &self.job_title,
            JobField::JobCategory => &self.job_category,
            JobField::SubUnit => &self.sub_unit,
            JobField::Location => &self.location,
            JobField::EmploymentStatus => &self.employment_status,
        }
    }

    /// Fields paired with their requested labels in resolution order.
    pub fn ordered(&self) -> impl Iterator<Item = (JobField, &str)> + '_ {
        JobField::ORDER
            .into_iter()
            .map(move |field| (field, self.value(field)))
    }
}

/// How the claimant is identified on the wire. Exactly one path is used per run.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRef {
    Id(String),
    Name(String),
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub employee: EmployeeRef,
    pub event: String,
    pub currency: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl ClaimRequest {
    pub fn remarks(&self) -> Option<&str> {
        self.remarks
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClaimResult {
    pub reference_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_skips_blank_middle() {
        let identity = NewEmployee::new("Jane", "Doe")
            .with_middle_name("  ")
            .into_identity("0042");
        assert_eq!(identity.middle_name, None);
        assert_eq!(identity.display_name(), "Jane Doe");
    }

    #[test]
    fn display_name_includes_middle() {
        let identity = NewEmployee::new("Peter", "Griffin")
            .with_middle_name("Lowenbrau")
            .into_identity("ABC123D");
        assert_eq!(identity.display_name(), "Peter Lowenbrau Griffin");
    }

    #[test]
    fn job_fields_resolve_in_fixed_order() {
        let job = JobDetails {
            job_title: "QA Engineer".into(),
            job_category: "Professionals".into(),
            sub_unit: "Engineering".into(),
            location: "HQ".into(),
            employment_status: "Full-Time".into(),
        };
        let labels: Vec<_> = job.ordered().map(|(field, _)| field.label()).collect();
        assert_eq!(
            labels,
            ["Job Title", "Job Category", "Sub Unit", "Location", "Employment Status"]
        );
        assert_eq!(job.value(JobField::Location), "HQ");
    }
}
