//! Exception resolution
//!
//! Cosmetic and script exceptions (`#@#`, `#@$#`, `#@%#`) do not become entries of
//! their own. They rewrite the domain restrictions of the blocking entries that share
//! their payload, or remove those entries altogether. `$specifichide` exceptions strip
//! their domain from domain-specific element hiding entries.

use std::collections::HashMap;

use crate::entry::{BlockerEntry, PayloadKey, Trigger};

/// Apply `exceptions` to `blocking` entries with the same payload under `key`.
///
/// Entries that end up excluded everywhere are dropped. Relative order is kept.
pub fn apply_action_exceptions(
    mut blocking: Vec<BlockerEntry>,
    exceptions: &[BlockerEntry],
    key: PayloadKey,
) -> Vec<BlockerEntry> {
    let mut by_payload: HashMap<&str, Vec<&BlockerEntry>> = HashMap::new();
    for exception in exceptions {
        if let Some(payload) = exception.action.payload(key) {
            by_payload.entry(payload).or_default().push(exception);
        }
    }

    if by_payload.is_empty() {
        return blocking;
    }

    for entry in &mut blocking {
        let Some(matching) = entry.action.payload(key).and_then(|p| by_payload.get(p)) else {
            continue;
        };
        for exception in matching {
            apply_exception_domains(&exception.trigger, &mut entry.trigger);
        }
    }

    blocking.retain(|entry| !is_disabled_by_exceptions(entry));
    blocking
}

fn is_disabled_by_exceptions(entry: &BlockerEntry) -> bool {
    let trigger = &entry.trigger;

    let excluded_everywhere = matches!(
        (&trigger.if_domain, &trigger.unless_domain),
        (Some(domains), None) | (None, Some(domains)) if domains.is_empty()
    );
    if excluded_everywhere && entry.action.kind.is_cosmetic() {
        return true;
    }

    // An `unless-domain` exception added to an `if-domain` entry leaves both lists
    // populated: the exception covers every permitted domain.
    matches!(
        (&trigger.if_domain, &trigger.unless_domain),
        (Some(permitted), Some(excluded)) if !permitted.is_empty() && !excluded.is_empty()
    )
}

/// Narrow `rule` by the domains of one matching exception.
///
/// A rule already restricted on the compared list only loses domains it actually
/// lists. An unrestricted rule gains the excluded domains in `unless-domain`. A
/// generic exception empties `if-domain`, which the caller treats as excluded
/// everywhere.
pub fn apply_exception_domains(exception: &Trigger, rule: &mut Trigger) {
    let (excluded, compared_is_restricted) = match (&exception.if_domain, &exception.unless_domain) {
        (Some(domains), _) => (domains, rule.if_domain.as_ref().is_some_and(|d| !d.is_empty())),
        (None, Some(domains)) => (domains, rule.unless_domain.as_ref().is_some_and(|d| !d.is_empty())),
        (None, None) => {
            rule.if_domain = Some(Vec::new());
            return;
        }
    };
    if excluded.is_empty() {
        return;
    }

    if !compared_is_restricted {
        rule.unless_domain.get_or_insert_with(Vec::new).extend(excluded.iter().cloned());
        return;
    }

    for domain in excluded {
        let compared = if exception.if_domain.is_some() {
            &rule.if_domain
        } else {
            &rule.unless_domain
        };
        if !compared.as_ref().is_some_and(|d| d.contains(domain)) {
            continue;
        }

        if let Some(if_domain) = rule.if_domain.as_mut() {
            if_domain.retain(|d| d != domain);
        } else if let Some(unless_domain) = rule.unless_domain.as_mut() {
            unless_domain.retain(|d| d != domain);
        }
    }
}

/// Remove `$specifichide` domains from the `if-domain` of every entry.
///
/// Matching is literal string equality against the `*`-prefixed domains collected by
/// the compiler. Entries whose `if-domain` becomes empty are dropped; entries without
/// `if-domain` are kept as they are.
pub fn apply_specifichide(mut blocking: Vec<BlockerEntry>, exception_domains: &[String]) -> Vec<BlockerEntry> {
    if exception_domains.is_empty() {
        return blocking;
    }

    blocking.retain_mut(|entry| match entry.trigger.if_domain.as_mut() {
        Some(if_domain) => {
            if_domain.retain(|d| !exception_domains.contains(d));
            !if_domain.is_empty()
        }
        None => true,
    });
    blocking
}
