//! Safari content blocker entries
//!
//! A [`BlockerEntry`] is one trigger/action pair of the Safari content blocking JSON
//! format. Field names serialize to the Safari keys (`url-filter`, `if-domain`,
//! `action.type`, ...) and absent fields are omitted.

use serde::{Deserialize, Serialize};

/// `url-filter` used by cosmetic rules and by every merged entry. Entries with this
/// filter and no domain restriction apply to every page.
pub const URL_FILTER_COSMETIC_RULES: &str = ".*";

// =============================================================================
// Action
// =============================================================================

/// Safari action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// Cancel the request
    Block,
    /// Hide elements matching `selector`
    CssDisplayNone,
    /// Inject `css` (advanced blocking)
    CssInject,
    /// Apply extended CSS `css` (advanced blocking)
    CssExtended,
    /// Run `scriptlet` (advanced blocking)
    Scriptlet,
    /// Run `script` (advanced blocking)
    Script,
    /// Cancel matching actions of previous entries
    IgnorePreviousRules,
}

impl ActionKind {
    /// Cosmetic actions. Entries of these kinds are dropped once every domain has
    /// been excluded from them.
    pub fn is_cosmetic(self) -> bool {
        match self {
            ActionKind::CssDisplayNone
            | ActionKind::CssInject
            | ActionKind::CssExtended
            | ActionKind::Scriptlet
            | ActionKind::Script => true,
            ActionKind::Block | ActionKind::IgnorePreviousRules => false,
        }
    }
}

/// Action field used to match exceptions against blocking entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKey {
    Selector,
    Css,
    Script,
    Scriptlet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scriptlet: Option<String>,
    #[serde(rename = "scriptletParam", default, skip_serializing_if = "Option::is_none")]
    pub scriptlet_param: Option<String>,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            selector: None,
            css: None,
            script: None,
            scriptlet: None,
            scriptlet_param: None,
        }
    }

    pub fn with_selector(kind: ActionKind, selector: impl Into<String>) -> Self {
        Self {
            selector: Some(selector.into()),
            ..Self::new(kind)
        }
    }

    /// Payload under `key`. Absent and empty payloads are both `None`.
    pub fn payload(&self, key: PayloadKey) -> Option<&str> {
        let value = match key {
            PayloadKey::Selector => &self.selector,
            PayloadKey::Css => &self.css,
            PayloadKey::Script => &self.script,
            PayloadKey::Scriptlet => &self.scriptlet,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }
}

// =============================================================================
// Trigger
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Trigger {
    pub url_filter: String,
    /// Entry applies only on these domains
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_domain: Option<Vec<String>>,
    /// Entry applies everywhere except these domains
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unless_domain: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_filter_is_case_sensitive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_type: Option<Vec<String>>,
}

impl Trigger {
    pub fn new(url_filter: impl Into<String>) -> Self {
        Self {
            url_filter: url_filter.into(),
            if_domain: None,
            unless_domain: None,
            url_filter_is_case_sensitive: None,
            resource_type: None,
            load_type: None,
        }
    }
}

// =============================================================================
// Entry
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockerEntry {
    pub trigger: Trigger,
    pub action: Action,
}

impl BlockerEntry {
    pub fn new(trigger: Trigger, action: Action) -> Self {
        Self { trigger, action }
    }

    /// Element hiding entry for `selector` on every page.
    pub fn css_display_none(selector: impl Into<String>) -> Self {
        Self::new(
            Trigger::new(URL_FILTER_COSMETIC_RULES),
            Action::with_selector(ActionKind::CssDisplayNone, selector),
        )
    }
}
