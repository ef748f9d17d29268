//! Wire shapes accepted by the invocation surface (HTTP and CLI) and their validation.

use serde::{Deserialize, Serialize};

use crate::failure::Failure;
use crate::identity::{ClaimRequest, EmployeeRef, JobDetails, NewEmployee};

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub job_category: String,
    #[serde(default)]
    pub sub_unit: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub employment_status: String,
}

impl From<JobInfo> for JobDetails {
    fn from(info: JobInfo) -> Self {
        JobDetails {
            job_title: info.job_title.trim().to_string(),
            job_category: info.job_category.trim().to_string(),
            sub_unit: info.sub_unit.trim().to_string(),
            location: info.location.trim().to_string(),
            employment_status: info.employment_status.trim().to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub job: JobInfo,
}

impl CreateEmployeeRequest {
    /// Validates required fields and splits the request into the flow inputs.
    pub fn into_parts(self) -> Result<(NewEmployee, JobDetails), Failure> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(Failure::invalid_request(
                "FirstName and LastName are required",
            ));
        }

        let job = JobDetails::from(self.job);
        let missing: Vec<&str> = job
            .ordered()
            .filter(|(_, value)| value.is_empty())
            .map(|(field, _)| field.label())
            .collect();
        if !missing.is_empty() {
            return Err(Failure::invalid_request(format!(
                "Job details are required: {}",
                missing.join(", ")
            )));
        }

        let mut employee = NewEmployee::new(self.first_name.trim(), self.last_name.trim());
        if let Some(middle) = self.middle_name.as_deref().map(str::trim) {
            if !middle.is_empty() {
                employee = employee.with_middle_name(middle);
            }
        }
        Ok((employee, job))
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClaimRequest {
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl CreateClaimRequest {
    /// Validates the request and picks the single employee resolution path.
    ///
    /// The id path is only taken when an id lookup is available; otherwise the
    /// display name is required.
    pub fn into_claim(self, id_lookup_available: bool) -> Result<ClaimRequest, Failure> {
        let id = non_blank(self.employee_id.as_deref());
        let name = non_blank(self.employee_name.as_deref());
        if id.is_none() && name.is_none() {
            return Err(Failure::invalid_request(
                "Either EmployeeId or EmployeeName must be provided",
            ));
        }
        if self.event.trim().is_empty() || self.currency.trim().is_empty() {
            return Err(Failure::invalid_request("Event and Currency are required"));
        }

        let employee = match (id, name) {
            (Some(id), _) if id_lookup_available => EmployeeRef::Id(id.to_string()),
            (_, Some(name)) => EmployeeRef::Name(name.to_string()),
            _ => {
                return Err(Failure::invalid_request(
                    "EmployeeName is required when employee lookup by id is disabled",
                ))
            }
        };

        Ok(ClaimRequest {
            employee,
            event: self.event.trim().to_string(),
            currency: self.currency.trim().to_string(),
            remarks: non_blank(self.remarks.as_deref()).map(str::to_string),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::FailureKind;

    fn full_job() -> JobInfo {
        JobInfo {
            job_title: "QA Engineer".into(),
            job_category: "Professionals".into(),
            sub_unit: "Engineering".into(),
            location: "Texas R&D".into(),
            employment_status: "Full-Time Permanent".into(),
        }
    }

    #[test]
    fn employee_request_deserializes_camel_case() {
        let request: CreateEmployeeRequest = serde_json::from_str(
            r#"{"firstName":"Jane","lastName":"Doe","job":{"jobTitle":"QA Engineer","jobCategory":"Professionals","subUnit":"Engineering","location":"Texas R&D","employmentStatus":"Full-Time Permanent"}}"#,
        )
        .unwrap();
        let (employee, job) = request.into_parts().unwrap();
        assert_eq!(employee.first_name, "Jane");
        assert_eq!(employee.middle_name, None);
        assert_eq!(job.sub_unit, "Engineering");
    }

    #[test]
    fn employee_request_requires_names() {
        let request = CreateEmployeeRequest {
            first_name: " ".into(),
            last_name: "Doe".into(),
            job: full_job(),
            ..Default::default()
        };
        let failure = request.into_parts().unwrap_err();
        assert_eq!(failure.kind, FailureKind::InvalidRequest);
    }

    #[test]
    fn employee_request_lists_missing_job_fields() {
        let mut job = full_job();
        job.sub_unit.clear();
        job.employment_status = "  ".into();
        let request = CreateEmployeeRequest {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            job,
            ..Default::default()
        };
        let failure = request.into_parts().unwrap_err();
        assert_eq!(
            failure.message,
            "Job details are required: Sub Unit, Employment Status"
        );
    }

    #[test]
    fn claim_prefers_id_when_lookup_available() {
        let request = CreateClaimRequest {
            employee_id: Some("ABC123D".into()),
            employee_name: Some("Peter Griffin".into()),
            event: "Medical Reimbursement".into(),
            currency: "United States Dollar".into(),
            remarks: Some("  ".into()),
        };
        let claim = request.clone().into_claim(true).unwrap();
        assert_eq!(claim.employee, EmployeeRef::Id("ABC123D".into()));
        assert_eq!(claim.remarks, None);

        let claim = request.into_claim(false).unwrap();
        assert_eq!(claim.employee, EmployeeRef::Name("Peter Griffin".into()));
    }

    #[test]
    fn claim_requires_some_employee_reference() {
        let request = CreateClaimRequest {
            event: "Travel Allowance".into(),
            currency: "Euro".into(),
            ..Default::default()
        };
        let failure = request.into_claim(true).unwrap_err();
        assert_eq!(
            failure.message,
            "Either EmployeeId or EmployeeName must be provided"
        );
    }

    #[test]
    fn claim_requires_event_and_currency() {
        let request = CreateClaimRequest {
            employee_name: Some("Jane Doe".into()),
            event: "Travel Allowance".into(),
            ..Default::default()
        };
        let failure = request.into_claim(true).unwrap_err();
        assert_eq!(failure.message, "Event and Currency are required");
    }

    #[test]
    fn id_only_claim_needs_lookup() {
        let request = CreateClaimRequest {
            employee_id: Some("ABC123D".into()),
            event: "Travel Allowance".into(),
            currency: "Euro".into(),
            ..Default::default()
        };
        assert_eq!(
            request.into_claim(false).unwrap_err().kind,
            FailureKind::InvalidRequest
        );
    }
}
