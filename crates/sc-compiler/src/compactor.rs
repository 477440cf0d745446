//! Element hiding compaction
//!
//! Safari limits the number of entries a content blocker may load, so element hiding
//! entries are merged: generic selectors into a few "wide" entries, and selectors
//! restricted to a single domain into one entry per domain.

use std::collections::HashMap;

use crate::entry::{Action, ActionKind, BlockerEntry, Trigger, URL_FILTER_COSMETIC_RULES};

/// Max number of CSS selectors per merged generic entry.
pub const MAX_SELECTORS_PER_WIDE_RULE: usize = 250;
/// Max number of CSS selectors per merged single-domain entry.
pub const MAX_SELECTORS_PER_DOMAIN_RULE: usize = 250;

const SELECTOR_SEPARATOR: &str = ", ";

/// Output of [`compact_css_rules`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompactedCss {
    /// Merged generic selectors plus generic entries that could not be merged
    pub wide: Vec<BlockerEntry>,
    /// Entries with `if-domain`
    pub domain_sensitive: Vec<BlockerEntry>,
    /// Entries with `unless-domain` only
    pub generic_domain_sensitive: Vec<BlockerEntry>,
}

/// Which trigger domain list [`compact_domain_css_rules`] groups on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainField {
    IfDomain,
    UnlessDomain,
}

impl DomainField {
    fn get(self, trigger: &Trigger) -> Option<&Vec<String>> {
        match self {
            DomainField::IfDomain => trigger.if_domain.as_ref(),
            DomainField::UnlessDomain => trigger.unless_domain.as_ref(),
        }
    }

    fn trigger_for(self, domain: &str) -> Trigger {
        let mut trigger = Trigger::new(URL_FILTER_COSMETIC_RULES);
        match self {
            DomainField::IfDomain => trigger.if_domain = Some(vec![domain.to_string()]),
            DomainField::UnlessDomain => trigger.unless_domain = Some(vec![domain.to_string()]),
        }
        trigger
    }
}

fn create_wide_rule(selectors: &[String]) -> BlockerEntry {
    BlockerEntry::css_display_none(selectors.join(SELECTOR_SEPARATOR))
}

/// Split element hiding entries by domain restriction and fold generic selectors
/// into entries of at most [`MAX_SELECTORS_PER_WIDE_RULE`] selectors.
pub fn compact_css_rules(entries: Vec<BlockerEntry>) -> CompactedCss {
    let mut compacted = CompactedCss::default();
    let mut wide_selectors: Vec<String> = Vec::new();

    for entry in entries {
        if entry.trigger.if_domain.is_some() {
            compacted.domain_sensitive.push(entry);
        } else if entry.trigger.unless_domain.is_some() {
            compacted.generic_domain_sensitive.push(entry);
        } else if entry.action.selector.is_some() && entry.trigger.url_filter == URL_FILTER_COSMETIC_RULES {
            if let Some(selector) = entry.action.selector {
                wide_selectors.push(selector);
            }
            if wide_selectors.len() >= MAX_SELECTORS_PER_WIDE_RULE {
                compacted.wide.push(create_wide_rule(&wide_selectors));
                wide_selectors.clear();
            }
        } else {
            compacted.wide.push(entry);
        }
    }

    if !wide_selectors.is_empty() {
        compacted.wide.push(create_wide_rule(&wide_selectors));
    }

    compacted
}

/// Merge entries restricted to exactly one domain on `field` into one entry per
/// domain, chunked by [`MAX_SELECTORS_PER_DOMAIN_RULE`].
///
/// Entries with zero or several domains, and domains with a single entry, are passed
/// through unchanged. Merged groups follow the pass-through entries in order of the
/// first appearance of their domain.
pub fn compact_domain_css_rules(entries: Vec<BlockerEntry>, field: DomainField) -> Vec<BlockerEntry> {
    let mut result = Vec::with_capacity(entries.len());
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<BlockerEntry>)> = Vec::new();

    for entry in entries {
        let domain = match field.get(&entry.trigger) {
            Some(domains) if domains.len() == 1 => domains[0].clone(),
            _ => {
                result.push(entry);
                continue;
            }
        };

        match group_index.get(&domain) {
            Some(&index) => groups[index].1.push(entry),
            None => {
                group_index.insert(domain.clone(), groups.len());
                groups.push((domain, vec![entry]));
            }
        }
    }

    for (domain, group) in groups {
        if group.len() <= 1 {
            result.extend(group);
            continue;
        }
        result.extend(create_domain_wide_entries(&domain, field, &group));
    }

    result
}

fn create_domain_wide_entries(domain: &str, field: DomainField, group: &[BlockerEntry]) -> Vec<BlockerEntry> {
    let trigger = field.trigger_for(domain);

    group
        .chunks(MAX_SELECTORS_PER_DOMAIN_RULE)
        .map(|chunk| {
            let selectors: Vec<&str> = chunk.iter().filter_map(|e| e.action.selector.as_deref()).collect();
            BlockerEntry::new(
                trigger.clone(),
                Action::with_selector(ActionKind::CssDisplayNone, selectors.join(SELECTOR_SEPARATOR)),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generic(count: usize) -> Vec<BlockerEntry> {
        (0..count).map(|i| BlockerEntry::css_display_none(format!(".ad-{i}"))).collect()
    }

    fn on_domain(selector: &str, field: DomainField, domains: &[&str]) -> BlockerEntry {
        let mut entry = BlockerEntry::css_display_none(selector);
        let list = Some(domains.iter().map(|d| d.to_string()).collect());
        match field {
            DomainField::IfDomain => entry.trigger.if_domain = list,
            DomainField::UnlessDomain => entry.trigger.unless_domain = list,
        }
        entry
    }

    fn selector_count(entry: &BlockerEntry) -> usize {
        entry.action.selector.as_deref().map_or(0, |s| s.split(SELECTOR_SEPARATOR).count())
    }

    #[test]
    fn folds_generic_selectors_in_bounded_chunks() {
        let compacted = compact_css_rules(generic(600));
        assert_eq!(compacted.wide.len(), 3);

        let counts: Vec<usize> = compacted.wide.iter().map(selector_count).collect();
        assert_eq!(counts, vec![250, 250, 100]);

        let first = compacted.wide[0].action.selector.as_deref().unwrap();
        assert!(first.starts_with(".ad-0, .ad-1, .ad-2"));
        let last = compacted.wide[2].action.selector.as_deref().unwrap();
        assert!(last.starts_with(".ad-500, "));
        assert!(last.ends_with(".ad-599"));
        assert_eq!(compacted.wide[2].trigger, Trigger::new(URL_FILTER_COSMETIC_RULES));
    }

    #[test]
    fn splits_by_domain_restriction() {
        let mut non_catch_all = BlockerEntry::css_display_none(".x");
        non_catch_all.trigger.url_filter = "^https?://example\\.org".to_string();

        let entries = vec![
            on_domain(".a", DomainField::IfDomain, &["*a.com"]),
            BlockerEntry::css_display_none(".g1"),
            on_domain(".b", DomainField::UnlessDomain, &["*b.com"]),
            non_catch_all.clone(),
            BlockerEntry::css_display_none(".g2"),
        ];

        let compacted = compact_css_rules(entries);
        assert_eq!(compacted.domain_sensitive.len(), 1);
        assert_eq!(compacted.generic_domain_sensitive.len(), 1);
        assert_eq!(compacted.wide.len(), 2);
        assert_eq!(compacted.wide[0], non_catch_all);
        assert_eq!(compacted.wide[1].action.selector.as_deref(), Some(".g1, .g2"));
    }

    #[test]
    fn exact_multiple_leaves_no_partial_chunk() {
        let compacted = compact_css_rules(generic(250));
        assert_eq!(compacted.wide.len(), 1);
        assert!(compact_css_rules(Vec::new()).wide.is_empty());
    }

    #[test]
    fn groups_single_domain_entries_in_chunks() {
        let entries: Vec<BlockerEntry> = (0..300)
            .map(|i| on_domain(&format!(".s{i}"), DomainField::IfDomain, &["*example.org"]))
            .collect();

        let result = compact_domain_css_rules(entries, DomainField::IfDomain);
        assert_eq!(result.len(), 2);
        assert_eq!(selector_count(&result[0]), 250);
        assert_eq!(selector_count(&result[1]), 50);
        assert!(result[1].action.selector.as_deref().unwrap().starts_with(".s250, "));
        for entry in &result {
            assert_eq!(entry.trigger.if_domain, Some(vec!["*example.org".to_string()]));
            assert_eq!(entry.trigger.url_filter, URL_FILTER_COSMETIC_RULES);
            assert_eq!(entry.action.kind, ActionKind::CssDisplayNone);
        }
    }

    #[test]
    fn passes_through_singletons_and_multi_domain_entries() {
        let multi = on_domain(".m", DomainField::IfDomain, &["*a.com", "*b.com"]);
        let single = on_domain(".s", DomainField::IfDomain, &["*c.com"]);
        let entries = vec![
            on_domain(".x", DomainField::IfDomain, &["*a.com"]),
            multi.clone(),
            single.clone(),
            on_domain(".y", DomainField::IfDomain, &["*a.com"]),
        ];

        let result = compact_domain_css_rules(entries, DomainField::IfDomain);
        assert_eq!(result.len(), 3);
        assert!(result.contains(&multi));
        assert!(result.contains(&single));

        let merged = result
            .iter()
            .find(|e| e.action.selector.as_deref() == Some(".x, .y"))
            .expect("merged entry for a.com");
        assert_eq!(merged.trigger.if_domain, Some(vec!["*a.com".to_string()]));
    }

    #[test]
    fn groups_on_unless_domain() {
        let entries = vec![
            on_domain(".x", DomainField::UnlessDomain, &["*a.com"]),
            on_domain(".y", DomainField::UnlessDomain, &["*a.com"]),
        ];

        let result = compact_domain_css_rules(entries, DomainField::UnlessDomain);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].trigger.unless_domain, Some(vec!["*a.com".to_string()]));
        assert_eq!(result[0].trigger.if_domain, None);

        let untouched = compact_domain_css_rules(
            vec![on_domain(".x", DomainField::IfDomain, &["*a.com"]), on_domain(".y", DomainField::IfDomain, &["*a.com"])],
            DomainField::UnlessDomain,
        );
        assert_eq!(untouched.len(), 2);
    }
}
