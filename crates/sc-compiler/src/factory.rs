//! Rule to entry conversion
//!
//! [`EntryFactory`] is the seam between rule parsing and compilation: it turns one
//! rule into at most one candidate entry. The compiler only ever talks to the trait.

use log::debug;

use sc_core::{extract_domain, ContentType, CosmeticKind, CosmeticRule, NetworkRule, NetworkRuleOption, Rule};

use crate::entry::{Action, ActionKind, BlockerEntry, Trigger, URL_FILTER_COSMETIC_RULES};

/// Prefix matching any scheme followed by an optional subdomain, used for `||`.
const URL_FILTER_START: &str = "^[htpsw]+:\\/\\/([a-z0-9-]+\\.)?";
/// Replacement for a trailing `^`.
const URL_FILTER_END_SEPARATOR: &str = "([\\/:&\\?].*)?$";
/// Replacement for a `^` in the middle of a pattern.
const URL_FILTER_SEPARATOR: &str = "[\\/:&\\?]";

/// Page-level exception options converted to domain-wide `ignore-previous-rules`.
const PAGE_EXCEPTION_OPTIONS: NetworkRuleOption = NetworkRuleOption::DOCUMENT
    .union(NetworkRuleOption::ELEMHIDE)
    .union(NetworkRuleOption::GENERICHIDE)
    .union(NetworkRuleOption::JSINJECT)
    .union(NetworkRuleOption::CONTENT)
    .union(NetworkRuleOption::URLBLOCK);

/// Creates the candidate entry for a rule.
pub trait EntryFactory {
    /// `None` when the rule has no Safari equivalent.
    fn create_blocker_entry(&self, rule: &Rule) -> Option<BlockerEntry>;
}

/// Why a rule could not be converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Unsupported(&'static str);

/// Default [`EntryFactory`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockerEntryFactory {
    advanced_blocking: bool,
}

impl BlockerEntryFactory {
    pub fn new(advanced_blocking: bool) -> Self {
        Self { advanced_blocking }
    }

    fn require_advanced(&self) -> Result<(), Unsupported> {
        if self.advanced_blocking {
            Ok(())
        } else {
            Err(Unsupported("advanced blocking is disabled"))
        }
    }

    fn cosmetic_entry(&self, source: &Rule, rule: &CosmeticRule) -> Result<BlockerEntry, Unsupported> {
        let mut trigger = Trigger::new(URL_FILTER_COSMETIC_RULES);
        apply_domains(&mut trigger, source)?;

        let content = rule.content.clone();
        let (kind, mut action) = match rule.kind {
            CosmeticKind::ElementHiding if !rule.is_extended_css => {
                (ActionKind::CssDisplayNone, Action::with_selector(ActionKind::CssDisplayNone, content))
            }
            CosmeticKind::ElementHiding => {
                self.require_advanced()?;
                let mut action = Action::new(ActionKind::CssExtended);
                action.css = Some(content);
                (ActionKind::CssExtended, action)
            }
            CosmeticKind::Css => {
                self.require_advanced()?;
                let mut action = Action::new(ActionKind::CssInject);
                action.css = Some(content);
                (ActionKind::CssInject, action)
            }
            CosmeticKind::Script => {
                self.require_advanced()?;
                let mut action = Action::new(ActionKind::Script);
                action.script = Some(content);
                (ActionKind::Script, action)
            }
            CosmeticKind::Scriptlet => {
                self.require_advanced()?;
                let call = rule.scriptlet.as_ref().ok_or(Unsupported("missing scriptlet call"))?;
                let mut action = Action::new(ActionKind::Scriptlet);
                action.scriptlet = Some(call.name.clone());
                action.scriptlet_param = Some(
                    serde_json::json!({ "name": call.name, "args": call.args }).to_string(),
                );
                (ActionKind::Scriptlet, action)
            }
        };

        action.kind = if rule.is_whitelist { ActionKind::IgnorePreviousRules } else { kind };
        Ok(BlockerEntry::new(trigger, action))
    }

    fn network_entry(&self, source: &Rule, rule: &NetworkRule) -> Result<BlockerEntry, Unsupported> {
        if rule.is_badfilter() {
            return Err(Unsupported("$badfilter rules are applied before compilation"));
        }

        if rule.is_whitelist && rule.options.intersects(PAGE_EXCEPTION_OPTIONS) {
            if let Some(entry) = page_exception_entry(rule) {
                return Ok(entry);
            }
        }

        let mut trigger = Trigger::new(url_filter(rule)?);
        apply_domains(&mut trigger, source)?;

        if rule.is_match_case() {
            trigger.url_filter_is_case_sensitive = Some(true);
        }

        let content_types = rule.content_types();
        if content_types.is_empty() {
            return Err(Unsupported("all content types are excluded"));
        }
        if content_types != ContentType::ALL {
            let resource_types = content_types.safari_resource_types();
            trigger.resource_type = Some(resource_types.into_iter().map(String::from).collect());
        }

        trigger.load_type = rule.third_party.map(|third_party| {
            vec![if third_party { "third-party" } else { "first-party" }.to_string()]
        });

        let kind = if rule.is_whitelist {
            ActionKind::IgnorePreviousRules
        } else {
            ActionKind::Block
        };
        Ok(BlockerEntry::new(trigger, Action::new(kind)))
    }
}

impl EntryFactory for BlockerEntryFactory {
    fn create_blocker_entry(&self, rule: &Rule) -> Option<BlockerEntry> {
        let entry = match rule {
            Rule::Network(network) => self.network_entry(rule, network),
            Rule::Cosmetic(cosmetic) => self.cosmetic_entry(rule, cosmetic),
        };

        match entry {
            Ok(entry) => Some(entry),
            Err(Unsupported(reason)) => {
                debug!("Cannot convert '{}': {}", rule.rule_text(), reason);
                None
            }
        }
    }
}

/// `@@||example.org^$elemhide` and friends apply to pages on the domain rather than
/// to requests matching the pattern.
fn page_exception_entry(rule: &NetworkRule) -> Option<BlockerEntry> {
    let extracted = extract_domain(&rule.url_rule_text);
    if extracted.domain.is_empty() || extracted.pattern_matches_path {
        return None;
    }

    let mut trigger = Trigger::new(URL_FILTER_COSMETIC_RULES);
    trigger.if_domain = Some(vec![format!("*{}", extracted.domain)]);
    Some(BlockerEntry::new(trigger, Action::new(ActionKind::IgnorePreviousRules)))
}

/// Permitted domains go to `if-domain`, restricted ones to `unless-domain`, both with
/// a `*` prefix so that subdomains match too.
fn apply_domains(trigger: &mut Trigger, rule: &Rule) -> Result<(), Unsupported> {
    let permitted = rule.permitted_domains();
    let restricted = rule.restricted_domains();
    if !permitted.is_empty() && !restricted.is_empty() {
        return Err(Unsupported("Safari does not support both permitted and restricted domains"));
    }

    let prefixed = |list: &[String]| list.iter().map(|d| format!("*{d}")).collect::<Vec<_>>();
    if !permitted.is_empty() {
        trigger.if_domain = Some(prefixed(permitted));
    }
    if !restricted.is_empty() {
        trigger.unless_domain = Some(prefixed(restricted));
    }
    Ok(())
}

/// `/regex/` patterns are passed through without the slashes.
fn url_filter(rule: &NetworkRule) -> Result<String, Unsupported> {
    let pattern = rule.url_rule_text.as_str();
    if !rule.is_regex() {
        return pattern_to_url_filter(pattern);
    }
    if !pattern.is_ascii() {
        return Err(Unsupported("url-filter must be ASCII"));
    }
    Ok(pattern[1..pattern.len() - 1].to_string())
}

/// Basic translation of a network pattern to a Safari `url-filter`.
fn pattern_to_url_filter(pattern: &str) -> Result<String, Unsupported> {
    if !pattern.is_ascii() {
        return Err(Unsupported("url-filter must be ASCII"));
    }

    if pattern.is_empty() || pattern == "*" || pattern == "||" {
        return Ok(URL_FILTER_COSMETIC_RULES.to_string());
    }

    let mut filter = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;

    if let Some(stripped) = rest.strip_prefix("||") {
        filter.push_str(URL_FILTER_START);
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('|') {
        filter.push('^');
        rest = stripped;
    }

    let right_anchor = rest.ends_with('|');
    if right_anchor {
        rest = &rest[..rest.len() - 1];
    }

    let last = rest.len().saturating_sub(1);
    for (i, c) in rest.char_indices() {
        match c {
            '*' => filter.push_str(".*"),
            '^' if i == last => filter.push_str(URL_FILTER_END_SEPARATOR),
            '^' => filter.push_str(URL_FILTER_SEPARATOR),
            '.' | '+' | '?' | '$' | '{' | '}' | '(' | ')' | '[' | ']' | '/' | '\\' | '|' => {
                filter.push('\\');
                filter.push(c);
            }
            c => filter.push(c),
        }
    }

    if right_anchor && !filter.ends_with('$') {
        filter.push('$');
    }

    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_core::parse_rule;

    fn convert(text: &str, advanced: bool) -> Option<BlockerEntry> {
        let rule = parse_rule(text).unwrap().unwrap();
        BlockerEntryFactory::new(advanced).create_blocker_entry(&rule)
    }

    #[test]
    fn translates_url_patterns() {
        assert_eq!(
            pattern_to_url_filter("||example.org^").unwrap(),
            "^[htpsw]+:\\/\\/([a-z0-9-]+\\.)?example\\.org([\\/:&\\?].*)?$"
        );
        assert_eq!(
            pattern_to_url_filter("||example.org/this$is$path").unwrap(),
            "^[htpsw]+:\\/\\/([a-z0-9-]+\\.)?example\\.org\\/this\\$is\\$path"
        );
        assert_eq!(pattern_to_url_filter("|https://ads.").unwrap(), "^https:\\/\\/ads\\.");
        assert_eq!(pattern_to_url_filter("/banner*.gif|").unwrap(), "\\/banner.*\\.gif$");
        assert_eq!(pattern_to_url_filter("").unwrap(), ".*");
        assert!(pattern_to_url_filter("||пример.рф^").is_err());
    }

    #[test]
    fn converts_element_hiding() {
        let entry = convert("example.org,example.com##.banner", false).unwrap();
        assert_eq!(entry.action.kind, ActionKind::CssDisplayNone);
        assert_eq!(entry.action.selector.as_deref(), Some(".banner"));
        assert_eq!(entry.trigger.url_filter, URL_FILTER_COSMETIC_RULES);
        assert_eq!(
            entry.trigger.if_domain,
            Some(vec!["*example.org".to_string(), "*example.com".to_string()])
        );

        let entry = convert("~example.org#@#.banner", false).unwrap();
        assert_eq!(entry.action.kind, ActionKind::IgnorePreviousRules);
        assert_eq!(entry.action.selector.as_deref(), Some(".banner"));
        assert_eq!(entry.trigger.unless_domain, Some(vec!["*example.org".to_string()]));

        assert!(convert("example.org,~sub.example.org##.banner", false).is_none());
    }

    #[test]
    fn advanced_rules_need_advanced_blocking() {
        assert!(convert("##div:has(.ad)", false).is_none());
        assert!(convert("example.org#%#window.x = 1;", false).is_none());

        let entry = convert("##div:has(.ad)", true).unwrap();
        assert_eq!(entry.action.kind, ActionKind::CssExtended);
        assert_eq!(entry.action.css.as_deref(), Some("div:has(.ad)"));

        let entry = convert("example.org#@$#body { color: red }", true).unwrap();
        assert_eq!(entry.action.kind, ActionKind::IgnorePreviousRules);
        assert_eq!(entry.action.css.as_deref(), Some("body { color: red }"));

        let entry = convert("example.org#%#window.x = 1;", true).unwrap();
        assert_eq!(entry.action.kind, ActionKind::Script);
        assert_eq!(entry.action.script.as_deref(), Some("window.x = 1;"));
    }

    #[test]
    fn converts_scriptlets() {
        let entry = convert("example.org#%#//scriptlet('set-constant', 'ads', 'false')", true).unwrap();
        assert_eq!(entry.action.kind, ActionKind::Scriptlet);
        assert_eq!(entry.action.scriptlet.as_deref(), Some("set-constant"));
        assert_eq!(
            entry.action.scriptlet_param.as_deref(),
            Some(r#"{"args":["ads","false"],"name":"set-constant"}"#)
        );
    }

    #[test]
    fn converts_network_rules() {
        let entry = convert("||ads.com^$script,third-party,match-case,domain=a.com", false).unwrap();
        assert_eq!(entry.action.kind, ActionKind::Block);
        assert_eq!(entry.trigger.resource_type, Some(vec!["script".to_string()]));
        assert_eq!(entry.trigger.load_type, Some(vec!["third-party".to_string()]));
        assert_eq!(entry.trigger.url_filter_is_case_sensitive, Some(true));
        assert_eq!(entry.trigger.if_domain, Some(vec!["*a.com".to_string()]));

        let entry = convert("@@||ads.com^", false).unwrap();
        assert_eq!(entry.action.kind, ActionKind::IgnorePreviousRules);
        assert_eq!(entry.trigger.resource_type, None);

        assert!(convert("||ads.com^$badfilter", false).is_none());
    }

    #[test]
    fn passes_regex_patterns_through() {
        let entry = convert("/ads\\d+/$domain=~a.com", false).unwrap();
        assert_eq!(entry.trigger.url_filter, "ads\\d+");
        assert_eq!(entry.trigger.unless_domain, Some(vec!["*a.com".to_string()]));

        // a plain pattern starting with a slash is not a regex
        let entry = convert("/banner/ad.gif", false).unwrap();
        assert_eq!(entry.trigger.url_filter, "\\/banner\\/ad\\.gif");
    }

    #[test]
    fn converts_page_exceptions() {
        let entry = convert("@@||example.org^$elemhide", false).unwrap();
        assert_eq!(entry.action.kind, ActionKind::IgnorePreviousRules);
        assert_eq!(entry.trigger.url_filter, URL_FILTER_COSMETIC_RULES);
        assert_eq!(entry.trigger.if_domain, Some(vec!["*example.org".to_string()]));
    }
}
