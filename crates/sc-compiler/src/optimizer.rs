use std::collections::{HashMap, HashSet};

use sc_core::{NetworkRule, Rule};

pub struct OptimizeStats {
    pub before: usize,
    pub after: usize,
    pub deduped: usize,
    pub badfilter_rules: usize,
    pub badfiltered_rules: usize,
}

/// Apply `$badfilter` rules and drop exact duplicates.
pub fn optimize_rules(rules: &mut Vec<Rule>) -> OptimizeStats {
    let before = rules.len();
    let mut badfilters: HashMap<BadfilterKey, Vec<NetworkRule>> = HashMap::new();
    let mut badfilter_rules = 0usize;

    for rule in rules.iter() {
        if let Some(network) = badfilter_rule(rule) {
            badfilter_rules += 1;
            badfilters
                .entry(BadfilterKey::from(network))
                .or_default()
                .push(network.clone());
        }
    }

    let mut badfiltered_rules = 0usize;
    if !badfilters.is_empty() {
        rules.retain(|rule| {
            let Some(network) = rule.as_network() else {
                return true;
            };
            if network.is_badfilter() {
                return false;
            }
            let cancelled = badfilters
                .get(&BadfilterKey::from(network))
                .is_some_and(|candidates| {
                    candidates.iter().any(|badfilter| network.negates_badfilter(badfilter))
                });
            if cancelled {
                badfiltered_rules += 1;
                return false;
            }
            true
        });
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut deduped = 0usize;
    rules.retain(|rule| {
        if seen.insert(rule.rule_text().to_string()) {
            true
        } else {
            deduped += 1;
            false
        }
    });

    let after = rules.len();

    OptimizeStats {
        before,
        after,
        deduped,
        badfilter_rules,
        badfiltered_rules,
    }
}

fn badfilter_rule(rule: &Rule) -> Option<&NetworkRule> {
    rule.as_network().filter(|network| network.is_badfilter())
}

/// Bucket for `$badfilter` candidates. A `$badfilter` rule can only cancel rules of
/// the same kind with the same pattern; the rest is checked by
/// [`NetworkRule::negates_badfilter`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BadfilterKey {
    is_whitelist: bool,
    pattern: String,
}

impl From<&NetworkRule> for BadfilterKey {
    fn from(rule: &NetworkRule) -> Self {
        Self {
            is_whitelist: rule.is_whitelist,
            pattern: rule.url_rule_text.clone(),
        }
    }
}
