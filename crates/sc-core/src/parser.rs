use log::debug;

use crate::domains::DomainList;
use crate::rule::{CosmeticKind, CosmeticRule, NetworkRule, Rule, RuleError, ScriptletCall};
use crate::types::{ContentType, NetworkRuleOption};

/// Rules parsed from a filter list, plus the lines that failed.
#[derive(Debug, Default)]
pub struct ParsedRules {
    pub rules: Vec<Rule>,
    /// (line number starting at 1, rule text, error)
    pub errors: Vec<(usize, String, RuleError)>,
}

/// Parse every line of a filter list. Invalid rules are collected in `errors` and
/// never reach the compiler.
pub fn parse_rules<I, S>(lines: I) -> ParsedRules
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = ParsedRules::default();

    for (index, raw_line) in lines.into_iter().enumerate() {
        let line = raw_line.as_ref();
        match parse_rule(line) {
            Ok(Some(rule)) => parsed.rules.push(rule),
            Ok(None) => {}
            Err(err) => {
                debug!("Skipping rule '{}': {}", line.trim(), err);
                parsed.errors.push((index + 1, line.trim().to_string(), err));
            }
        }
    }

    parsed
}

/// Parse a single rule. Returns `Ok(None)` for blank lines and comments.
pub fn parse_rule(text: &str) -> Result<Option<Rule>, RuleError> {
    let line = text.trim();
    if line.is_empty() || is_comment_line(line) {
        return Ok(None);
    }

    if let Some((pos, marker)) = find_cosmetic_marker(line) {
        return parse_cosmetic_rule(line, pos, marker).map(|rule| Some(Rule::Cosmetic(rule)));
    }

    parse_network_rule(line).map(|rule| Some(Rule::Network(rule)))
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with('!') || line.starts_with('[') || line.starts_with("# ") || line == "#"
}

// =============================================================================
// Cosmetic Rules
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct CosmeticMarker {
    text: &'static str,
    whitelist: bool,
    kind: CosmeticKind,
    extended: bool,
}

const fn marker(text: &'static str, whitelist: bool, kind: CosmeticKind, extended: bool) -> CosmeticMarker {
    CosmeticMarker { text, whitelist, kind, extended }
}

/// Longest markers first so that `#@$?#` wins over `#@$#`.
const COSMETIC_MARKERS: [CosmeticMarker; 10] = [
    marker("#@$?#", true, CosmeticKind::Css, true),
    marker("#@$#", true, CosmeticKind::Css, false),
    marker("#@?#", true, CosmeticKind::ElementHiding, true),
    marker("#@%#", true, CosmeticKind::Script, false),
    marker("#$?#", false, CosmeticKind::Css, true),
    marker("#@#", true, CosmeticKind::ElementHiding, false),
    marker("#$#", false, CosmeticKind::Css, false),
    marker("#?#", false, CosmeticKind::ElementHiding, true),
    marker("#%#", false, CosmeticKind::Script, false),
    marker("##", false, CosmeticKind::ElementHiding, false),
];

const SCRIPTLET_PREFIX: &str = "//scriptlet(";

/// Pseudo-classes that only the ExtendedCss engine understands.
const EXTENDED_CSS_MARKERS: [&str; 12] = [
    ":has(",
    ":has-text(",
    ":contains(",
    ":-abp-has(",
    ":-abp-contains(",
    ":matches-css(",
    ":matches-css-before(",
    ":matches-css-after(",
    ":xpath(",
    ":upward(",
    ":remove(",
    "[-ext-",
];

fn find_cosmetic_marker(line: &str) -> Option<(usize, CosmeticMarker)> {
    for (pos, _) in line.match_indices('#') {
        let rest = &line[pos..];
        if let Some(marker) = COSMETIC_MARKERS.iter().find(|m| rest.starts_with(m.text)) {
            // `||example.org/#ads` is a network rule, not a cosmetic one.
            let prefix = &line[..pos];
            if prefix.bytes().any(|b| matches!(b, b'/' | b'|' | b'^' | b'$' | b'@')) {
                return None;
            }
            return Some((pos, *marker));
        }
    }
    None
}

fn parse_cosmetic_rule(line: &str, pos: usize, marker: CosmeticMarker) -> Result<CosmeticRule, RuleError> {
    let domains_text = &line[..pos];
    let content = line[pos + marker.text.len()..].trim();

    let domains = if domains_text.is_empty() {
        DomainList::default()
    } else {
        DomainList::parse(domains_text, b',')?
    };

    let mut kind = marker.kind;
    let mut scriptlet = None;

    match kind {
        CosmeticKind::ElementHiding => {
            if content.is_empty() {
                return Err(RuleError::Syntax("empty selector".to_string()));
            }
            if content.starts_with('+') || content.starts_with('^') {
                return Err(RuleError::UnsupportedRule(format!("'{}' syntax is not supported", &content[..1])));
            }
        }
        CosmeticKind::Css => {
            if !content.contains('{') || !content.ends_with('}') {
                return Err(RuleError::Syntax(format!("invalid CSS injection '{content}'")));
            }
        }
        CosmeticKind::Script => {
            if let Some(call) = content.strip_prefix(SCRIPTLET_PREFIX) {
                let call = parse_scriptlet_call(call)?;
                if call.name.is_empty() && !marker.whitelist {
                    return Err(RuleError::Syntax("scriptlet name is required".to_string()));
                }
                kind = CosmeticKind::Scriptlet;
                scriptlet = Some(call);
            } else if content.is_empty() {
                return Err(RuleError::Syntax("empty script".to_string()));
            }
        }
        CosmeticKind::Scriptlet => {
            return Err(RuleError::Syntax("scriptlets use the script marker".to_string()));
        }
    }

    let is_extended_css = match kind {
        CosmeticKind::ElementHiding | CosmeticKind::Css => {
            marker.extended || EXTENDED_CSS_MARKERS.iter().any(|m| content.contains(m))
        }
        _ => false,
    };

    Ok(CosmeticRule {
        rule_text: line.to_string(),
        is_whitelist: marker.whitelist,
        kind,
        content: content.to_string(),
        is_extended_css,
        scriptlet,
        domains,
    })
}

/// Parse the argument list of `//scriptlet('name', 'arg')`, starting after the
/// opening parenthesis.
fn parse_scriptlet_call(call: &str) -> Result<ScriptletCall, RuleError> {
    let inner = call
        .trim_end()
        .strip_suffix(')')
        .ok_or_else(|| RuleError::Syntax("unterminated scriptlet call".to_string()))?;

    let mut args = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let quote = match chars.next() {
            None => break,
            Some(c @ ('\'' | '"')) => c,
            Some(c) => {
                return Err(RuleError::Syntax(format!("unexpected '{c}' in scriptlet arguments")));
            }
        };

        let mut arg = String::new();
        let mut closed = false;
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        if escaped != quote {
                            arg.push('\\');
                        }
                        arg.push(escaped);
                    }
                }
                c if c == quote => {
                    closed = true;
                    break;
                }
                c => arg.push(c),
            }
        }
        if !closed {
            return Err(RuleError::Syntax("unterminated scriptlet argument".to_string()));
        }
        args.push(arg);

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => break,
            Some(',') => continue,
            Some(c) => {
                return Err(RuleError::Syntax(format!("unexpected '{c}' after scriptlet argument")));
            }
        }
    }

    let mut args = args.into_iter();
    let name = args.next().unwrap_or_default();
    Ok(ScriptletCall {
        name,
        args: args.collect(),
    })
}

// =============================================================================
// Network Rules
// =============================================================================

fn parse_network_rule(line: &str) -> Result<NetworkRule, RuleError> {
    let (is_whitelist, body) = match line.strip_prefix("@@") {
        Some(rest) => (true, rest),
        None => (false, line),
    };

    let (pattern, options_text) = split_rule_options(body);

    let mut rule = NetworkRule {
        rule_text: line.to_string(),
        url_rule_text: pattern.to_string(),
        is_whitelist,
        options: NetworkRuleOption::empty(),
        permitted_content_types: ContentType::empty(),
        restricted_content_types: ContentType::empty(),
        third_party: None,
        domains: DomainList::default(),
    };

    if let Some(options_text) = options_text {
        parse_options(options_text, &mut rule)?;
    }

    if pattern.is_empty() && rule.domains.permitted.is_empty() && options_text.is_none() {
        return Err(RuleError::Syntax("empty rule pattern".to_string()));
    }

    let whitelist_only = NetworkRuleOption::WHITELIST_ONLY - NetworkRuleOption::DOCUMENT;
    if !is_whitelist && rule.options.intersects(whitelist_only) {
        return Err(RuleError::InvalidModifier(format!(
            "{:?} can only be used in exception rules",
            rule.options & whitelist_only
        )));
    }

    Ok(rule)
}

/// Options start after the last `$`; a `/regex/` pattern without options keeps its
/// `$` anchors.
fn split_rule_options(body: &str) -> (&str, Option<&str>) {
    if body.len() > 2 && body.starts_with('/') && body.ends_with('/') {
        return (body, None);
    }

    match body.rfind('$') {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    }
}

fn parse_options(text: &str, rule: &mut NetworkRule) -> Result<(), RuleError> {
    let mut type_include = ContentType::empty();
    let mut type_exclude = ContentType::empty();

    for raw in text.split(',') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        if let Some((name, value)) = raw.split_once('=') {
            if name.eq_ignore_ascii_case("domain") {
                rule.domains.add_domains(value, b'|')?;
                continue;
            }
            return Err(RuleError::InvalidModifier(format!("unsupported option '{name}'")));
        }

        let raw_lower = raw.to_ascii_lowercase();
        let (negated, name) = match raw_lower.strip_prefix('~') {
            Some(rest) => (true, rest),
            None => (false, raw_lower.as_str()),
        };

        match name {
            "third-party" | "3p" => {
                rule.third_party = Some(!negated);
                continue;
            }
            "first-party" | "1p" => {
                rule.third_party = Some(negated);
                continue;
            }
            "all" if !negated => continue,
            _ => {}
        }

        if let Some(mask) = ContentType::from_type_name(name) {
            if negated {
                type_exclude |= mask;
            } else {
                type_include |= mask;
            }
            continue;
        }

        if let Some(option) = NetworkRuleOption::from_option_name(name) {
            if negated {
                return Err(RuleError::InvalidModifier(format!("'{name}' cannot be negated")));
            }
            rule.options |= option;
            if option.intersects(NetworkRuleOption::WHITELIST_ONLY | NetworkRuleOption::POPUP) {
                type_include |= ContentType::DOCUMENT;
            }
            continue;
        }

        return Err(RuleError::InvalidModifier(format!("unknown option '{raw}'")));
    }

    rule.permitted_content_types = type_include;
    rule.restricted_content_types = type_exclude;
    Ok(())
}
