use std::fmt;

use serde::{Deserialize, Serialize};

/// How an element is located on the page.
///
/// Selectors are facts about the application under automation, so they are
/// data: the locator catalog can be overridden from configuration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    Css(String),
    #[serde(rename = "xpath")]
    XPath(String),
    Name(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Locator::XPath(expression.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Locator::Name(name.into())
    }

    /// CSS selector for locators expressible in CSS.
    pub fn as_css(&self) -> Option<String> {
        match self {
            Locator::Css(selector) => Some(selector.clone()),
            Locator::Name(name) => Some(format!("[name=\"{}\"]", name.replace('"', "\\\""))),
            Locator::XPath(_) => None,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "css={selector}"),
            Locator::XPath(expression) => write!(f, "xpath={expression}"),
            Locator::Name(name) => write!(f, "name={name}"),
        }
    }
}
