//! Scripted stand-in for the OrangeHRM UI.
//!
//! Pages are groups of elements attached and detached as the user navigates,
//! so locators shared between pages (the submit button) resolve the way they
//! do in the live application. Reactions run on real time with short fixed
//! delays; pair the site with [`FakeHrmSite::settings`] for fast flows.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use action_primitives::{Diagnostics, SettlePauses};
use cdp_adapter::scripted::{ElementId, ScriptedBrowser, ScriptedElement, ScriptedLauncher, ScriptedPage};
use cdp_adapter::{DriverError, Locator, ScriptArg};
use hrm_core_types::JobField;
use serde_json::Value;

use crate::kit::{FlowKit, FlowSettings};
use crate::locators::PageCatalog;

pub const BASE_URL: &str = "https://hrm.test";
pub const UNSELECTED: &str = "-- Select --";

const INDICATOR_DELAY: Duration = Duration::from_millis(20);
const CONFIRMATION_DELAY: Duration = Duration::from_millis(40);
const TOAST_LIFETIME: Duration = Duration::from_millis(150);

/// How the site answers a form submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveResponse {
    Accepted,
    /// Shows the error toast.
    Rejected,
    /// Shows nothing at all.
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimConfirmation {
    Modal,
    Url,
}

#[derive(Clone, Debug)]
pub struct SiteOptions {
    pub username: String,
    pub password: String,
    pub job_options: HashMap<JobField, Vec<String>>,
    pub events: Vec<String>,
    pub currencies: Vec<String>,
    /// Display names the typeahead knows about.
    pub directory: Vec<String>,
    /// Searches without a match keep showing the loading placeholder.
    pub stalled_search: bool,
    /// Pre-filled value of the Employee Id field.
    pub suggested_id: String,
    /// Numeric id put in the post-save URL; `None` leaves it out.
    pub emp_number: Option<String>,
    /// Value the Employee Id field keeps whatever is injected.
    pub id_override: Option<String>,
    pub employee_save: SaveResponse,
    pub job_save: SaveResponse,
    pub claim_save: SaveResponse,
    pub claim_confirmation: ClaimConfirmation,
    pub reference_id: String,
}

impl Default for SiteOptions {
    fn default() -> Self {
        let labels = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<Vec<_>>();
        let job_options = HashMap::from([
            (JobField::JobTitle, labels(&["QA Engineer", "Software Engineer"])),
            (JobField::JobCategory, labels(&["Professionals", "Technicians"])),
            (JobField::SubUnit, labels(&["Engineering", "Administration"])),
            (JobField::Location, labels(&["Texas R&D", "New York Sales Office"])),
            (
                JobField::EmploymentStatus,
                labels(&["Full-Time Permanent", "Part-Time Internship"]),
            ),
        ]);
        Self {
            username: "Admin".into(),
            password: "admin123".into(),
            job_options,
            events: labels(&["Travel Allowance", "Medical Reimbursement"]),
            currencies: labels(&["Euro", "United States Dollar"]),
            directory: labels(&["Peter Lowenbrau Griffin"]),
            stalled_search: false,
            suggested_id: "0312".into(),
            emp_number: Some("42".into()),
            id_override: None,
            employee_save: SaveResponse::Accepted,
            job_save: SaveResponse::Accepted,
            claim_save: SaveResponse::Accepted,
            claim_confirmation: ClaimConfirmation::Modal,
            reference_id: "202610170000012".into(),
        }
    }
}

pub struct FakeHrmSite {
    browser: Arc<ScriptedBrowser>,
    catalog: PageCatalog,
    dropdowns: HashMap<&'static str, ElementId>,
    employee_name: ElementId,
    remarks: ElementId,
    joined_date: ElementId,
}

fn attach(page: &mut ScriptedPage, ids: &[ElementId]) {
    for id in ids {
        page.show(*id);
    }
}

fn detach(page: &mut ScriptedPage, ids: &[ElementId]) {
    for id in ids {
        page.detach(*id);
    }
}

fn set_text(page: &mut ScriptedPage, id: ElementId, text: &str) {
    if let Some(element) = page.element_mut(id) {
        element.text = text.to_string();
    }
}

/// Wires the submit reaction shared by every form.
fn on_submit<F>(
    browser: &ScriptedBrowser,
    button: ElementId,
    response: SaveResponse,
    success: ElementId,
    error: ElementId,
    confirm: F,
) where
    F: Fn(&mut ScriptedPage) + Send + Sync + 'static,
{
    match response {
        SaveResponse::Accepted => {
            browser.on_click_after(button, INDICATOR_DELAY, move |page| page.show(success));
            browser.on_click_after(button, CONFIRMATION_DELAY, confirm);
            browser.on_click_after(button, TOAST_LIFETIME, move |page| page.hide(success));
        }
        SaveResponse::Rejected => {
            browser.on_click_after(button, INDICATOR_DELAY, move |page| page.show(error));
        }
        SaveResponse::Ignored => {}
    }
}

impl FakeHrmSite {
    pub fn new() -> Self {
        Self::build(SiteOptions::default())
    }

    pub fn build(options: SiteOptions) -> Self {
        let catalog = PageCatalog::default();
        let browser = ScriptedBrowser::new("about:blank");
        let mut dropdowns = HashMap::new();

        let common = catalog.common.clone();
        let body = browser.add(ScriptedElement::new(common.dismiss_target.clone()));
        let success = browser.add(ScriptedElement::new(common.success_toast.clone()).hidden());
        let error = browser.add(ScriptedElement::new(common.error_toast.clone()).hidden());
        {
            let options_locator = common.dropdown_options.clone();
            browser.on_click(body, move |page| page.detach_matching(&options_locator));
        }

        // Login page, attached from the start.
        let login = &catalog.login;
        let username = browser.add(ScriptedElement::input(login.username.clone()));
        let password = browser.add(ScriptedElement::input(login.password.clone()));
        let submit = browser.add(ScriptedElement::new(login.submit.clone()));
        let login_page = [username, password, submit];

        let employee = &catalog.employee;
        let claim = &catalog.claim;
        let landmark = browser.add(
            ScriptedElement::new(login.landmark.clone())
                .with_text("Dashboard")
                .detached(),
        );
        let pim_menu = browser.add(ScriptedElement::new(employee.pim_menu.clone()).detached());
        let claim_menu = browser.add(ScriptedElement::new(claim.claim_menu.clone()).detached());
        let dashboard = [landmark, pim_menu, claim_menu];
        {
            let (user, pass) = (options.username.clone(), options.password.clone());
            browser.on_click(submit, move |page| {
                if page.value(username) == user && page.value(password) == pass {
                    detach(page, &login_page);
                    attach(page, &dashboard);
                    page.url = format!("{BASE_URL}/web/index.php/dashboard/index");
                }
            });
        }

        // PIM > Add Employee.
        let add_link =
            browser.add(ScriptedElement::new(employee.add_employee_link.clone()).detached());
        browser.on_click(pim_menu, move |page| page.show(add_link));

        let first = browser.add(ScriptedElement::input(employee.first_name.clone()).detached());
        let middle = browser.add(ScriptedElement::input(employee.middle_name.clone()).detached());
        let last = browser.add(ScriptedElement::input(employee.last_name.clone()).detached());
        let form_id = browser.add(
            ScriptedElement::input(employee.employee_id.clone())
                .with_attr("value", options.suggested_id.clone())
                .detached(),
        );
        let save = browser.add(ScriptedElement::new(employee.save_button.clone()).detached());
        let add_form = [first, middle, last, form_id, save];
        browser.on_click(add_link, move |page| {
            attach(page, &add_form);
            page.url = format!("{BASE_URL}/web/index.php/pim/addEmployee");
        });

        {
            let id_override = options.id_override.clone();
            browser.on_script(move |page, _script, args| match args {
                [ScriptArg::Element(handle), ScriptArg::Value(Value::String(value))] => {
                    let stored = id_override.clone().unwrap_or_else(|| value.clone());
                    page.set_attr(handle.id(), "value", stored.clone());
                    Ok(Value::String(stored))
                }
                _ => Err(DriverError::Script("unexpected script arguments".into())),
            });
        }

        // Personal Details, reached after a successful save.
        let header = browser.add(
            ScriptedElement::new(employee.personal_details_header.clone())
                .with_text("Personal Details")
                .detached(),
        );
        let details_id =
            browser.add(ScriptedElement::input(employee.employee_id.clone()).detached());
        let job = &catalog.job;
        let job_tab = browser.add(ScriptedElement::new(job.job_tab.clone()).detached());
        let details = [header, details_id, job_tab];
        {
            let emp_number = options.emp_number.clone();
            on_submit(&browser, save, options.employee_save, success, error, move |page| {
                let id = page.value(form_id);
                page.set_attr(details_id, "value", id);
                detach(page, &add_form);
                attach(page, &details);
                page.url = match &emp_number {
                    Some(number) => format!(
                        "{BASE_URL}/web/index.php/pim/viewPersonalDetails?empNumber={number}"
                    ),
                    None => format!("{BASE_URL}/web/index.php/pim/viewPersonalDetails"),
                };
            });
        }

        // Job tab.
        let mut job_page = Vec::new();
        for field in JobField::ORDER {
            let labels = options.job_options.get(&field).cloned().unwrap_or_default();
            let id = Self::dropdown(&browser, &common.dropdown_options, job.dropdown(field), &labels);
            dropdowns.insert(field.label(), id);
            job_page.push(id);
        }
        let joined_date = browser.add(ScriptedElement::input(job.joined_date.clone()).detached());
        let job_save = browser.add(ScriptedElement::new(job.save_button.clone()).detached());
        job_page.extend([joined_date, job_save]);
        {
            let job_page = job_page.clone();
            browser.on_click(job_tab, move |page| attach(page, &job_page));
        }
        on_submit(&browser, job_save, options.job_save, success, error, |_| {});

        // Claim > Assign Claim.
        let assign_link =
            browser.add(ScriptedElement::new(claim.assign_claim_link.clone()).detached());
        browser.on_click(claim_menu, move |page| page.show(assign_link));

        let employee_name =
            browser.add(ScriptedElement::input(claim.employee_name.clone()).detached());
        let event = Self::dropdown(&browser, &common.dropdown_options, &claim.event, &options.events);
        let currency =
            Self::dropdown(&browser, &common.dropdown_options, &claim.currency, &options.currencies);
        dropdowns.insert("Event", event);
        dropdowns.insert("Currency", currency);
        let remarks = browser.add(ScriptedElement::input(claim.remarks.clone()).detached());
        let create = browser.add(ScriptedElement::new(claim.create_button.clone()).detached());
        let claim_form = [employee_name, event, currency, remarks, create];
        browser.on_click(assign_link, move |page| {
            attach(page, &claim_form);
            page.url = format!("{BASE_URL}/web/index.php/claim/assignClaim");
        });

        // Typeahead: the loading placeholder sorts ahead of real candidates.
        let placeholder_text = claim.suggestions_loading.first().cloned().unwrap_or_default();
        let empty_text = claim.suggestions_empty.first().cloned().unwrap_or_default();
        let placeholder = browser.add(
            ScriptedElement::new(claim.suggestions.clone())
                .with_text(placeholder_text)
                .detached(),
        );
        let no_records = browser.add(
            ScriptedElement::new(claim.suggestions.clone())
                .with_text(empty_text)
                .detached(),
        );
        let mut candidates = Vec::new();
        for name in &options.directory {
            let id = browser.add(
                ScriptedElement::new(claim.suggestions.clone())
                    .with_text(name.clone())
                    .detached(),
            );
            let suggestions = claim.suggestions.clone();
            let chosen = name.clone();
            browser.on_click(id, move |page| {
                page.detach_matching(&suggestions);
                page.set_attr(employee_name, "value", chosen.clone());
            });
            candidates.push((id, name.to_lowercase()));
        }
        {
            let suggestions = claim.suggestions.clone();
            let stalled = options.stalled_search;
            browser.on_keys(employee_name, move |page, _typed| {
                let typed = page.value(employee_name).to_lowercase();
                page.detach_matching(&suggestions);
                let matches: Vec<ElementId> = candidates
                    .iter()
                    .filter(|(_, name)| name.contains(&typed))
                    .map(|(id, _)| *id)
                    .collect();
                if matches.is_empty() && stalled {
                    page.show(placeholder);
                } else if matches.is_empty() {
                    page.show(no_records);
                } else {
                    page.show(placeholder);
                    attach(page, &matches);
                }
            });
        }

        let modal = browser.add(ScriptedElement::new(claim.modal.clone()).detached());
        let reference = browser.add(
            ScriptedElement::input(claim.reference_id.clone())
                .with_attr("value", options.reference_id.clone())
                .with_attr("disabled", "true")
                .detached(),
        );
        {
            let confirmation = options.claim_confirmation;
            on_submit(&browser, create, options.claim_save, success, error, move |page| {
                match confirmation {
                    ClaimConfirmation::Modal => page.show(modal),
                    ClaimConfirmation::Url => {
                        detach(page, &claim_form);
                        page.url = format!("{BASE_URL}/web/index.php/claim/assignClaim/id/7");
                    }
                }
                page.show(reference);
            });
        }

        Self {
            browser,
            catalog,
            dropdowns,
            employee_name,
            remarks,
            joined_date,
        }
    }

    /// A select whose options attach on click; picking one becomes its text.
    fn dropdown(
        browser: &ScriptedBrowser,
        options_locator: &Locator,
        locator: &Locator,
        labels: &[String],
    ) -> ElementId {
        let dropdown = browser.add(
            ScriptedElement::new(locator.clone())
                .with_text(UNSELECTED)
                .detached(),
        );
        let mut option_ids = Vec::new();
        for label in labels {
            let option = browser.add(
                ScriptedElement::new(options_locator.clone())
                    .with_text(label.clone())
                    .detached(),
            );
            let options_locator = options_locator.clone();
            let label = label.clone();
            browser.on_click(option, move |page| {
                page.detach_matching(&options_locator);
                set_text(page, dropdown, &label);
            });
            option_ids.push(option);
        }
        let options_locator = options_locator.clone();
        browser.on_click(dropdown, move |page| {
            page.detach_matching(&options_locator);
            attach(page, &option_ids);
        });
        dropdown
    }

    pub fn browser(&self) -> &Arc<ScriptedBrowser> {
        &self.browser
    }

    pub fn launcher(&self) -> ScriptedLauncher {
        ScriptedLauncher::new(Arc::clone(&self.browser))
    }

    pub fn catalog(&self) -> &PageCatalog {
        &self.catalog
    }

    /// Settings tuned to the site's reaction delays.
    pub fn settings() -> FlowSettings {
        FlowSettings {
            timeout: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(5),
            indicator_window: Duration::from_millis(300),
            suggestion_window: Duration::from_millis(200),
            case_sensitive: false,
            confirm_job_save: true,
            pauses: SettlePauses::none(),
            diagnostics: Diagnostics::disabled(),
        }
    }

    pub fn kit(&self) -> FlowKit {
        FlowKit::new(Arc::new(self.catalog.clone()), Self::settings())
    }

    /// Selected label of the dropdown captioned `label`, if any.
    pub fn selection(&self, label: &str) -> Option<String> {
        let id = *self.dropdowns.get(label)?;
        self.browser
            .with_page(|page| page.element(id).map(|element| element.text.clone()))
            .filter(|text| text != UNSELECTED)
    }

    pub fn employee_name(&self) -> String {
        self.browser.with_page(|page| page.value(self.employee_name))
    }

    pub fn remarks(&self) -> String {
        self.browser.with_page(|page| page.value(self.remarks))
    }

    pub fn joined_date(&self) -> String {
        self.browser.with_page(|page| page.value(self.joined_date))
    }
}

impl Default for FakeHrmSite {
    fn default() -> Self {
        Self::new()
    }
}
