//! Fixed settle pauses.
//!
//! Each pause follows an action whose completion the application does not
//! signal in the DOM (menu animations, debounced typeahead search, modal
//! content rendering). Everything observable goes through the wait strategy
//! instead. Every pause is capped at [`MAX_SETTLE`].

use std::time::Duration;

use tokio::time::sleep;

/// After clicking a top-level menu entry; the side panel expands without an event.
pub const AFTER_MENU: Duration = Duration::from_millis(500);
/// After clicking a submenu link; the routed view mounts without an event.
pub const AFTER_PAGE_LINK: Duration = Duration::from_millis(1000);
/// After opening a dropdown, before its options are read.
pub const AFTER_DROPDOWN_OPEN: Duration = Duration::from_millis(500);
/// After clicking a dropdown option, while the selection commits.
pub const AFTER_OPTION_CLICK: Duration = Duration::from_millis(300);
/// After injecting a value into a framework-managed input.
pub const AFTER_ID_INJECTION: Duration = Duration::from_millis(500);
/// Typeahead debounce before suggestions are read.
pub const TYPEAHEAD_DEBOUNCE: Duration = Duration::from_millis(2000);
/// After a confirmation modal appears, while its content renders.
pub const MODAL_RENDER: Duration = Duration::from_millis(2000);
/// Replaces job-details save confirmation when confirmation is disabled.
pub const JOB_SAVE: Duration = Duration::from_millis(2000);

pub const MAX_SETTLE: Duration = Duration::from_millis(2000);

/// The pause set a flow runs with. Tests use [`SettlePauses::none`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettlePauses {
    pub after_menu: Duration,
    pub after_page_link: Duration,
    pub after_dropdown_open: Duration,
    pub after_option_click: Duration,
    pub after_id_injection: Duration,
    pub typeahead_debounce: Duration,
    pub modal_render: Duration,
    pub job_save: Duration,
}

impl Default for SettlePauses {
    fn default() -> Self {
        Self {
            after_menu: AFTER_MENU,
            after_page_link: AFTER_PAGE_LINK,
            after_dropdown_open: AFTER_DROPDOWN_OPEN,
            after_option_click: AFTER_OPTION_CLICK,
            after_id_injection: AFTER_ID_INJECTION,
            typeahead_debounce: TYPEAHEAD_DEBOUNCE,
            modal_render: MODAL_RENDER,
            job_save: JOB_SAVE,
        }
    }
}

impl SettlePauses {
    pub fn none() -> Self {
        Self {
            after_menu: Duration::ZERO,
            after_page_link: Duration::ZERO,
            after_dropdown_open: Duration::ZERO,
            after_option_click: Duration::ZERO,
            after_id_injection: Duration::ZERO,
            typeahead_debounce: Duration::ZERO,
            modal_render: Duration::ZERO,
            job_save: Duration::ZERO,
        }
    }
}

pub async fn settle(pause: Duration) {
    if pause.is_zero() {
        return;
    }
    sleep(pause.min(MAX_SETTLE)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_stay_within_cap() {
        let pauses = SettlePauses::default();
        for pause in [
            pauses.after_menu,
            pauses.after_page_link,
            pauses.after_dropdown_open,
            pauses.after_option_click,
            pauses.after_id_injection,
            pauses.typeahead_debounce,
            pauses.modal_render,
            pauses.job_save,
        ] {
            assert!(pause <= MAX_SETTLE);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn settle_is_capped() {
        let started = tokio::time::Instant::now();
        settle(Duration::from_secs(60)).await;
        let elapsed = started.elapsed();
        assert!(elapsed >= MAX_SETTLE && elapsed < Duration::from_secs(3));
    }
}
