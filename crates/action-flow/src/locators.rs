//! Page locator catalog for the OrangeHRM UI.
//!
//! Selectors are facts about the application, not about the flows, so the
//! whole catalog deserializes from configuration with every field defaulted.

use cdp_adapter::Locator;
use hrm_core_types::JobField;
use serde::{Deserialize, Serialize};

/// `//label[text()='X']/../..//div[@class='oxd-select-text-input']`
pub fn labelled_select(label: &str) -> Locator {
    Locator::xpath(format!(
        "//label[text()='{label}']/../..//div[@class='oxd-select-text-input']"
    ))
}

/// `//label[text()='X']/../..//input`
pub fn labelled_input(label: &str) -> Locator {
    Locator::xpath(format!("//label[text()='{label}']/../..//input"))
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageCatalog {
    pub common: CommonLocators,
    pub login: LoginLocators,
    pub employee: EmployeeLocators,
    pub job: JobLocators,
    pub claim: ClaimLocators,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonLocators {
    pub busy_spinner: Locator,
    pub success_toast: Locator,
    pub error_toast: Locator,
    pub dropdown_options: Locator,
    /// Clicked to close an open dropdown.
    pub dismiss_target: Locator,
}

impl Default for CommonLocators {
    fn default() -> Self {
        Self {
            busy_spinner: Locator::css(".oxd-loading-spinner"),
            success_toast: Locator::css(".oxd-toast.oxd-toast--success"),
            error_toast: Locator::css(".oxd-toast.oxd-toast--error"),
            dropdown_options: Locator::css(".oxd-select-option"),
            dismiss_target: Locator::css("body"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginLocators {
    pub username: Locator,
    pub password: Locator,
    pub submit: Locator,
    /// Appears once the session is authenticated.
    pub landmark: Locator,
}

impl Default for LoginLocators {
    fn default() -> Self {
        Self {
            username: Locator::name("username"),
            password: Locator::name("password"),
            submit: Locator::xpath("//button[@type='submit']"),
            landmark: Locator::css("h6"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeLocators {
    pub pim_menu: Locator,
    pub add_employee_link: Locator,
    pub first_name: Locator,
    pub middle_name: Locator,
    pub last_name: Locator,
    pub employee_id: Locator,
    pub save_button: Locator,
    pub personal_details_header: Locator,
    /// Regex whose first capture group is the id in the post-save URL.
    pub id_url_pattern: String,
}

impl Default for EmployeeLocators {
    fn default() -> Self {
        Self {
            pim_menu: Locator::xpath("//span[text()='PIM']"),
            add_employee_link: Locator::xpath("//a[text()='Add Employee']"),
            first_name: Locator::name("firstName"),
            middle_name: Locator::name("middleName"),
            last_name: Locator::name("lastName"),
            employee_id: labelled_input("Employee Id"),
            save_button: Locator::xpath("//button[@type='submit']"),
            personal_details_header: Locator::xpath("//h6[normalize-space()='Personal Details']"),
            id_url_pattern: r"empNumber=(\d+)".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobLocators {
    pub job_tab: Locator,
    pub job_title: Locator,
    pub job_category: Locator,
    pub sub_unit: Locator,
    pub location: Locator,
    pub employment_status: Locator,
    pub joined_date: Locator,
    pub save_button: Locator,
}

impl JobLocators {
    pub fn dropdown(&self, field: JobField) -> &Locator {
        match field {
            JobField::JobTitle => &self.job_title,
            JobField::JobCategory => &self.job_category,
            JobField::SubUnit => &self.sub_unit,
            JobField::Location => &self.location,
            JobField::EmploymentStatus => &self.employment_status,
        }
    }
}

impl Default for JobLocators {
    fn default() -> Self {
        Self {
            job_tab: Locator::xpath("//a[text()='Job']"),
            job_title: labelled_select(JobField::JobTitle.label()),
            job_category: labelled_select(JobField::JobCategory.label()),
            sub_unit: labelled_select(JobField::SubUnit.label()),
            location: labelled_select(JobField::Location.label()),
            employment_status: labelled_select(JobField::EmploymentStatus.label()),
            joined_date: labelled_input("Joined Date"),
            save_button: Locator::xpath("//button[@type='submit']"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimLocators {
    pub claim_menu: Locator,
    pub assign_claim_link: Locator,
    pub employee_name: Locator,
    pub suggestions: Locator,
    /// Suggestion texts shown while the search is still running.
    pub suggestions_loading: Vec<String>,
    /// Suggestion texts meaning the search finished with no match.
    pub suggestions_empty: Vec<String>,
    pub event: Locator,
    pub currency: Locator,
    pub remarks: Locator,
    pub create_button: Locator,
    pub modal: Locator,
    pub details_url_pattern: String,
    pub reference_id: Locator,
}

impl Default for ClaimLocators {
    fn default() -> Self {
        Self {
            claim_menu: Locator::xpath("//span[text()='Claim']"),
            assign_claim_link: Locator::xpath("//a[text()='Assign Claim']"),
            employee_name: labelled_input("Employee Name"),
            suggestions: Locator::css(".oxd-autocomplete-option"),
            suggestions_loading: vec!["Searching....".to_string()],
            suggestions_empty: vec!["No Records Found".to_string()],
            event: labelled_select("Event"),
            currency: labelled_select("Currency"),
            remarks: Locator::xpath("//label[text()='Remarks']/../..//textarea"),
            create_button: Locator::css("button[type='submit']"),
            modal: Locator::css(".oxd-dialog"),
            details_url_pattern: r"/claim/assignClaim/id/\d+".to_string(),
            reference_id: Locator::xpath(
                "//label[text()='Reference Id']/ancestor::div[contains(@class, 'oxd-input-group')]//input[contains(@class, 'oxd-input') and @disabled]",
            ),
        }
    }
}
