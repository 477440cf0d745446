use sc_core::{NetworkRuleOption, Rule};

use crate::entry::BlockerEntry;

/// Entries produced by one compile call, bucketed by what they do.
///
/// Buckets are disjoint. The serialization order of the Safari-native buckets is
/// fixed by [`CompilationResult::safari_entries`]: later entries may cancel earlier ones
/// with `ignore-previous-rules`, so exceptions must come after what they except.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompilationResult {
    /// Number of rules passed to the compiler
    pub rules_count: usize,
    /// Rules that failed to parse upstream
    pub errors_count: usize,

    pub css_blocking_wide: Vec<BlockerEntry>,
    pub css_blocking_generic_domain_sensitive: Vec<BlockerEntry>,
    pub css_blocking_generic_hide_exceptions: Vec<BlockerEntry>,
    pub css_blocking_domain_sensitive: Vec<BlockerEntry>,
    pub css_elemhide: Vec<BlockerEntry>,
    pub url_blocking: Vec<BlockerEntry>,
    pub other_exceptions: Vec<BlockerEntry>,
    pub important: Vec<BlockerEntry>,
    pub important_exceptions: Vec<BlockerEntry>,
    pub document_exceptions: Vec<BlockerEntry>,

    pub extended_css_blocking_wide: Vec<BlockerEntry>,
    pub extended_css_blocking_generic_domain_sensitive: Vec<BlockerEntry>,
    pub extended_css_blocking_domain_sensitive: Vec<BlockerEntry>,
    pub css_injects: Vec<BlockerEntry>,
    pub script: Vec<BlockerEntry>,
    pub scriptlets: Vec<BlockerEntry>,
}

impl CompilationResult {
    pub fn new(rules_count: usize) -> Self {
        Self {
            rules_count,
            ..Self::default()
        }
    }

    /// Route a `block` entry.
    pub fn add_block_typed_entry(&mut self, entry: BlockerEntry, source: &Rule) {
        if source.is_important() {
            self.important.push(entry);
        } else {
            self.url_blocking.push(entry);
        }
    }

    /// Route an `ignore-previous-rules` entry that is not a cosmetic or script
    /// exception handled by the compiler itself.
    pub fn add_ignore_previous_typed_entry(&mut self, entry: BlockerEntry, source: &Rule) {
        let Some(rule) = source.as_network() else {
            self.other_exceptions.push(entry);
            return;
        };

        if rule.is_document_whitelist() {
            self.document_exceptions.push(entry);
        } else if rule.is_important() {
            self.important_exceptions.push(entry);
        } else if rule.is_single_option(NetworkRuleOption::GENERICHIDE) {
            self.css_blocking_generic_hide_exceptions.push(entry);
        } else if rule.is_single_option(NetworkRuleOption::ELEMHIDE) {
            self.css_elemhide.push(entry);
        } else {
            self.other_exceptions.push(entry);
        }
    }

    /// Entries Safari understands natively, in serialization order.
    pub fn safari_entries(&self) -> Vec<&BlockerEntry> {
        [
            &self.css_blocking_wide,
            &self.css_blocking_generic_domain_sensitive,
            &self.css_blocking_generic_hide_exceptions,
            &self.css_blocking_domain_sensitive,
            &self.css_elemhide,
            &self.url_blocking,
            &self.other_exceptions,
            &self.important,
            &self.important_exceptions,
            &self.document_exceptions,
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Entries for the advanced blocking extension, in serialization order.
    pub fn advanced_entries(&self) -> Vec<&BlockerEntry> {
        [
            &self.extended_css_blocking_wide,
            &self.extended_css_blocking_generic_domain_sensitive,
            &self.extended_css_blocking_domain_sensitive,
            &self.css_injects,
            &self.script,
            &self.scriptlets,
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// No entries in any bucket.
    pub fn is_empty(&self) -> bool {
        self.safari_entries().is_empty() && self.advanced_entries().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Action, ActionKind, Trigger};
    use sc_core::parse_rule;

    fn rule(text: &str) -> Rule {
        parse_rule(text).unwrap().unwrap()
    }

    fn ignore_previous() -> BlockerEntry {
        BlockerEntry::new(Trigger::new(".*"), Action::new(ActionKind::IgnorePreviousRules))
    }

    #[test]
    fn routes_block_entries_by_importance() {
        let mut result = CompilationResult::new(2);
        let entry = BlockerEntry::new(Trigger::new(".*"), Action::new(ActionKind::Block));
        result.add_block_typed_entry(entry.clone(), &rule("||ads.com^$important"));
        result.add_block_typed_entry(entry, &rule("||ads.com^"));
        assert_eq!(result.important.len(), 1);
        assert_eq!(result.url_blocking.len(), 1);
    }

    #[test]
    fn routes_exceptions_by_option() {
        let mut result = CompilationResult::default();
        result.add_ignore_previous_typed_entry(ignore_previous(), &rule("@@||a.com^$document"));
        result.add_ignore_previous_typed_entry(ignore_previous(), &rule("@@||a.com^$important"));
        result.add_ignore_previous_typed_entry(ignore_previous(), &rule("@@||a.com^$generichide"));
        result.add_ignore_previous_typed_entry(ignore_previous(), &rule("@@||a.com^$elemhide"));
        result.add_ignore_previous_typed_entry(ignore_previous(), &rule("@@||a.com^$elemhide,jsinject"));
        result.add_ignore_previous_typed_entry(ignore_previous(), &rule("@@||a.com^"));

        assert_eq!(result.document_exceptions.len(), 1);
        assert_eq!(result.important_exceptions.len(), 1);
        assert_eq!(result.css_blocking_generic_hide_exceptions.len(), 1);
        assert_eq!(result.css_elemhide.len(), 1);
        assert_eq!(result.other_exceptions.len(), 2);
        assert_eq!(result.safari_entries().len(), 6);
        assert!(result.advanced_entries().is_empty());
    }

    #[test]
    fn safari_entries_put_exceptions_last() {
        let mut result = CompilationResult::default();
        result.document_exceptions.push(ignore_previous());
        result.css_blocking_wide.push(BlockerEntry::css_display_none(".ad"));

        let entries = result.safari_entries();
        assert_eq!(entries[0].action.kind, ActionKind::CssDisplayNone);
        assert_eq!(entries[1].action.kind, ActionKind::IgnorePreviousRules);
        assert!(!result.is_empty());
        assert!(CompilationResult::new(10).is_empty());
    }
}
