//! Rule representations
//!
//! Rules are built once from filter list text by [`crate::parser`] and are read-only
//! afterwards. The compiler never mutates them.

use crate::domains::DomainList;
use crate::types::{ContentType, NetworkRuleOption};

/// Error raised while constructing a rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),
    #[error("Invalid modifier: {0}")]
    InvalidModifier(String),
    #[error("Unsupported rule: {0}")]
    UnsupportedRule(String),
    #[error("Syntax error: {0}")]
    Syntax(String),
}

// =============================================================================
// Rule
// =============================================================================

/// A parsed AdGuard rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Network(NetworkRule),
    Cosmetic(CosmeticRule),
}

impl Rule {
    /// Original rule text.
    pub fn rule_text(&self) -> &str {
        match self {
            Rule::Network(rule) => &rule.rule_text,
            Rule::Cosmetic(rule) => &rule.rule_text,
        }
    }

    pub fn is_whitelist(&self) -> bool {
        match self {
            Rule::Network(rule) => rule.is_whitelist,
            Rule::Cosmetic(rule) => rule.is_whitelist,
        }
    }

    pub fn is_important(&self) -> bool {
        match self {
            Rule::Network(rule) => rule.is_important(),
            Rule::Cosmetic(_) => false,
        }
    }

    /// `#%#` / `#@%#` script rule (scriptlets excluded).
    pub fn is_script(&self) -> bool {
        matches!(self, Rule::Cosmetic(rule) if rule.kind == CosmeticKind::Script)
    }

    /// `#%#//scriptlet(...)` / `#@%#//scriptlet(...)` rule.
    pub fn is_scriptlet(&self) -> bool {
        matches!(self, Rule::Cosmetic(rule) if rule.kind == CosmeticKind::Scriptlet)
    }

    pub fn domains(&self) -> &DomainList {
        match self {
            Rule::Network(rule) => &rule.domains,
            Rule::Cosmetic(rule) => &rule.domains,
        }
    }

    pub fn permitted_domains(&self) -> &[String] {
        &self.domains().permitted
    }

    pub fn restricted_domains(&self) -> &[String] {
        &self.domains().restricted
    }

    pub fn as_network(&self) -> Option<&NetworkRule> {
        match self {
            Rule::Network(rule) => Some(rule),
            Rule::Cosmetic(_) => None,
        }
    }
}

// =============================================================================
// Network Rules
// =============================================================================

/// URL blocking or exception rule (`||example.org^$script`, `@@||example.org^`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRule {
    pub rule_text: String,
    /// Pattern part of the rule, without `@@` and options
    pub url_rule_text: String,
    pub is_whitelist: bool,
    pub options: NetworkRuleOption,
    pub permitted_content_types: ContentType,
    pub restricted_content_types: ContentType,
    /// `Some(true)` for `$third-party`, `Some(false)` for `$~third-party`
    pub third_party: Option<bool>,
    pub domains: DomainList,
}

impl NetworkRule {
    pub fn is_option_enabled(&self, option: NetworkRuleOption) -> bool {
        self.options.contains(option)
    }

    pub fn is_important(&self) -> bool {
        self.is_option_enabled(NetworkRuleOption::IMPORTANT)
    }

    pub fn is_match_case(&self) -> bool {
        self.is_option_enabled(NetworkRuleOption::MATCH_CASE)
    }

    pub fn is_badfilter(&self) -> bool {
        self.is_option_enabled(NetworkRuleOption::BADFILTER)
    }

    pub fn is_document_whitelist(&self) -> bool {
        self.is_whitelist && self.is_option_enabled(NetworkRuleOption::DOCUMENT)
    }

    /// True when exactly `option` is set among the page-level exception options.
    pub fn is_single_option(&self, option: NetworkRuleOption) -> bool {
        (self.options & NetworkRuleOption::WHITELIST_ONLY) == option
    }

    /// `/.../` pattern.
    pub fn is_regex(&self) -> bool {
        let text = self.url_rule_text.as_bytes();
        text.len() > 2 && text[0] == b'/' && text[text.len() - 1] == b'/'
    }

    /// True when `badfilter` is a `$badfilter` rule that cancels this one.
    ///
    /// Everything but the `badfilter` option must be equal, except the permitted
    /// domains, which only need to overlap (or both be empty).
    pub fn negates_badfilter(&self, badfilter: &NetworkRule) -> bool {
        if !badfilter.is_badfilter() || self.is_badfilter() {
            return false;
        }
        if self.is_whitelist != badfilter.is_whitelist
            || self.url_rule_text != badfilter.url_rule_text
            || self.third_party != badfilter.third_party
            || self.permitted_content_types != badfilter.permitted_content_types
            || self.restricted_content_types != badfilter.restricted_content_types
            || self.options != (badfilter.options - NetworkRuleOption::BADFILTER)
        {
            return false;
        }
        if !same_domains(&self.domains.restricted, &badfilter.domains.restricted) {
            return false;
        }

        let permitted = &self.domains.permitted;
        let other = &badfilter.domains.permitted;
        if permitted.is_empty() && other.is_empty() {
            return true;
        }
        permitted.iter().any(|domain| other.contains(domain))
    }

    /// Content types this rule applies to after exclusions.
    pub fn content_types(&self) -> ContentType {
        let permitted = if self.permitted_content_types.is_empty() {
            ContentType::ALL
        } else {
            self.permitted_content_types
        };
        permitted & !self.restricted_content_types
    }
}

fn same_domains(left: &[String], right: &[String]) -> bool {
    left.len() == right.len() && left.iter().all(|domain| right.contains(domain))
}

// =============================================================================
// Cosmetic Rules
// =============================================================================

/// Kind of a cosmetic rule, decided by its marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CosmeticKind {
    /// `##`, `#?#` and their exceptions
    ElementHiding,
    /// `#$#`, `#$?#` and their exceptions
    Css,
    /// `#%#` and its exception
    Script,
    /// `#%#//scriptlet(...)` and its exception
    Scriptlet,
}

/// Parsed `//scriptlet('name', 'arg', ...)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptletCall {
    pub name: String,
    pub args: Vec<String>,
}

/// Element hiding, CSS injection, script or scriptlet rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosmeticRule {
    pub rule_text: String,
    pub is_whitelist: bool,
    pub kind: CosmeticKind,
    /// Selector, CSS, script body or the raw scriptlet call
    pub content: String,
    /// Needs the ExtendedCss engine (procedural pseudo-classes or `#?#` marker)
    pub is_extended_css: bool,
    pub scriptlet: Option<ScriptletCall>,
    pub domains: DomainList,
}
