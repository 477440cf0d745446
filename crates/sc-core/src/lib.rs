//! SafariConverter Core Library
//!
//! This crate provides the rule model shared by the converter: AdGuard filter rules
//! parsed into read-only network and cosmetic rule objects.
//!
//! # Modules
//!
//! - `domains`: domain list parsing for `$domain=` and cosmetic rule prefixes
//! - `parser`: filter list text to [`Rule`] objects
//! - `rule`: network and cosmetic rule representations
//! - `url`: domain extraction from URL patterns
//! - `types`: option and content-type bitmasks

pub mod domains;
pub mod parser;
pub mod rule;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use domains::DomainList;
pub use parser::{parse_rule, parse_rules, ParsedRules};
pub use rule::{CosmeticKind, CosmeticRule, NetworkRule, Rule, RuleError, ScriptletCall};
pub use types::{ContentType, NetworkRuleOption};
pub use crate::url::{extract_domain, ExtractedDomain};
