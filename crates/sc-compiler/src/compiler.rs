//! Rule compilation pipeline
//!
//! One pass classifies the generated entries into per-action buckets, then each
//! cosmetic bucket goes through exception resolution, `$specifichide` and
//! compaction.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};

use sc_core::{extract_domain, NetworkRuleOption, Rule};

use crate::compactor::{compact_css_rules, compact_domain_css_rules, DomainField};
use crate::entry::{ActionKind, BlockerEntry, PayloadKey};
use crate::exceptions::{apply_action_exceptions, apply_specifichide};
use crate::factory::{BlockerEntryFactory, EntryFactory};
use crate::result::CompilationResult;

/// Cooperative cancellation flag shared with the caller.
///
/// A cancelled compile returns an empty [`CompilationResult`]; it cannot be resumed.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompilerOptions {
    /// Skip generic element hiding entries (`css_blocking_wide`)
    pub optimize: bool,
    /// Produce entries for the advanced blocking extension
    pub advanced_blocking: bool,
}

/// Entries sorted by action before exceptions are applied.
#[derive(Debug, Default)]
struct Buckets {
    css_blocking: Vec<BlockerEntry>,
    css_exceptions: Vec<BlockerEntry>,
    cosmetic_css_exceptions: Vec<BlockerEntry>,
    css_injects: Vec<BlockerEntry>,
    extended_css_blocking: Vec<BlockerEntry>,
    script_rules: Vec<BlockerEntry>,
    script_exceptions: Vec<BlockerEntry>,
    scriptlets: Vec<BlockerEntry>,
    scriptlet_exceptions: Vec<BlockerEntry>,
    /// `*`-prefixed domains of `$specifichide` exceptions
    specifichide_domains: Vec<String>,
}

/// Compiles rules into a [`CompilationResult`].
pub struct Compiler<F = BlockerEntryFactory> {
    options: CompilerOptions,
    factory: F,
}

impl Compiler<BlockerEntryFactory> {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            factory: BlockerEntryFactory::new(options.advanced_blocking),
        }
    }
}

impl<F: EntryFactory> Compiler<F> {
    /// Use a custom entry factory.
    pub fn with_factory(options: CompilerOptions, factory: F) -> Self {
        Self { options, factory }
    }

    /// Compile without cancellation.
    pub fn compile(&self, rules: &[Rule]) -> CompilationResult {
        self.compile_rules(rules, &Cancellation::new())
    }

    /// Compile `rules`, checking `cancel` between steps.
    pub fn compile_rules(&self, rules: &[Rule], cancel: &Cancellation) -> CompilationResult {
        let mut result = CompilationResult::new(rules.len());

        let Some(mut buckets) = self.classify(rules, &mut result, cancel) else {
            return CompilationResult::default();
        };
        if cancel.is_cancelled() {
            return CompilationResult::default();
        }

        let css_blocking = apply_action_exceptions(
            std::mem::take(&mut buckets.css_blocking),
            &buckets.css_exceptions,
            PayloadKey::Selector,
        );
        let css_blocking = apply_specifichide(css_blocking, &buckets.specifichide_domains);
        let compacted = compact_css_rules(css_blocking);
        if !self.options.optimize {
            result.css_blocking_wide = compacted.wide;
        }
        result.css_blocking_generic_domain_sensitive =
            compact_domain_css_rules(compacted.generic_domain_sensitive, DomainField::UnlessDomain);
        result.css_blocking_domain_sensitive =
            compact_domain_css_rules(compacted.domain_sensitive, DomainField::IfDomain);

        if cancel.is_cancelled() {
            return CompilationResult::default();
        }

        if self.options.advanced_blocking && !self.compile_advanced(buckets, &mut result, cancel) {
            return CompilationResult::default();
        }

        info!(
            "Compiled {} rules: {} Safari entries, {} advanced entries",
            result.rules_count,
            result.safari_entries().len(),
            result.advanced_entries().len()
        );

        result
    }

    /// Sort entries into buckets. Returns `None` when cancelled.
    fn classify(&self, rules: &[Rule], result: &mut CompilationResult, cancel: &Cancellation) -> Option<Buckets> {
        let mut buckets = Buckets::default();

        for rule in rules {
            if cancel.is_cancelled() {
                return None;
            }

            if let Some(network_rule) = rule.as_network() {
                if network_rule.is_option_enabled(NetworkRuleOption::SPECIFICHIDE) {
                    let extracted = extract_domain(&network_rule.url_rule_text);
                    if !extracted.domain.is_empty() && !extracted.pattern_matches_path {
                        buckets.specifichide_domains.push(format!("*{}", extracted.domain));
                        continue;
                    }
                }
            }

            let Some(entry) = self.factory.create_blocker_entry(rule) else {
                continue;
            };

            match entry.action.kind {
                ActionKind::Block => result.add_block_typed_entry(entry, rule),
                ActionKind::CssDisplayNone => buckets.css_blocking.push(entry),
                ActionKind::CssInject => buckets.css_injects.push(entry),
                ActionKind::CssExtended => buckets.extended_css_blocking.push(entry),
                ActionKind::Scriptlet => buckets.scriptlets.push(entry),
                ActionKind::Script => buckets.script_rules.push(entry),
                ActionKind::IgnorePreviousRules => {
                    if rule.is_scriptlet() {
                        buckets.scriptlet_exceptions.push(entry);
                    } else if rule.is_script() {
                        buckets.script_exceptions.push(entry);
                    } else if entry.action.payload(PayloadKey::Selector).is_some() {
                        buckets.css_exceptions.push(entry);
                    } else if entry.action.payload(PayloadKey::Css).is_some() {
                        buckets.cosmetic_css_exceptions.push(entry);
                    } else {
                        result.add_ignore_previous_typed_entry(entry, rule);
                    }
                }
            }
        }

        debug!(
            "Classified {} rules: {} element hiding, {} element hiding exceptions, {} specifichide domains",
            rules.len(),
            buckets.css_blocking.len(),
            buckets.css_exceptions.len(),
            buckets.specifichide_domains.len()
        );

        Some(buckets)
    }

    /// Fill the advanced blocking buckets. Returns `false` when cancelled.
    fn compile_advanced(&self, buckets: Buckets, result: &mut CompilationResult, cancel: &Cancellation) -> bool {
        let css_exceptions: Vec<BlockerEntry> = buckets
            .css_exceptions
            .into_iter()
            .chain(buckets.cosmetic_css_exceptions)
            .collect();

        let extended = apply_action_exceptions(buckets.extended_css_blocking, &css_exceptions, PayloadKey::Css);
        let extended = apply_specifichide(extended, &buckets.specifichide_domains);
        let compacted = compact_css_rules(extended);
        if !self.options.optimize {
            result.extended_css_blocking_wide = compacted.wide;
        }
        result.extended_css_blocking_generic_domain_sensitive = compacted.generic_domain_sensitive;
        result.extended_css_blocking_domain_sensitive = compacted.domain_sensitive;

        if cancel.is_cancelled() {
            return false;
        }

        let css_injects = apply_action_exceptions(buckets.css_injects, &css_exceptions, PayloadKey::Css);
        result.css_injects = apply_specifichide(css_injects, &buckets.specifichide_domains);

        if cancel.is_cancelled() {
            return false;
        }

        result.script = apply_action_exceptions(buckets.script_rules, &buckets.script_exceptions, PayloadKey::Script);
        result.scriptlets =
            apply_action_exceptions(buckets.scriptlets, &buckets.scriptlet_exceptions, PayloadKey::Scriptlet);

        !cancel.is_cancelled()
    }
}
