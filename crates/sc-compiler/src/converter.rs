//! Filter list text to Safari content blocker JSON.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sc_core::parse_rules;

use crate::compiler::{Cancellation, Compiler, CompilerOptions};
use crate::optimizer::optimize_rules;
use crate::version::SafariVersion;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to serialize entries: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Output of one conversion.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    /// Safari entries produced before truncation
    pub total_converted_count: usize,
    /// Safari entries written to `converted`
    pub converted_count: usize,
    /// Lines that failed to parse
    pub errors_count: usize,
    /// Entries were dropped to fit the Safari limit
    pub over_limit: bool,
    /// Safari content blocker JSON
    pub converted: String,
    pub advanced_blocking_converted_count: usize,
    /// Entries for the advanced blocking extension, when enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced_blocking: Option<String>,
}

pub struct ContentBlockerConverter {
    version: SafariVersion,
    options: CompilerOptions,
    limit: Option<usize>,
}

impl ContentBlockerConverter {
    pub fn new(version: SafariVersion, options: CompilerOptions) -> Self {
        Self {
            version,
            options,
            limit: None,
        }
    }

    /// Lower the entry limit below the one of the target Safari version.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn rules_limit(&self) -> usize {
        let version_limit = self.version.rules_limit();
        self.limit.map_or(version_limit, |limit| limit.min(version_limit))
    }

    pub fn convert_array<I, S>(&self, lines: I) -> Result<ConversionResult, ConvertError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.convert_array_with(lines, &Cancellation::new())
    }

    pub fn convert_array_with<I, S>(&self, lines: I, cancel: &Cancellation) -> Result<ConversionResult, ConvertError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = parse_rules(lines);

        let mut rules = parsed.rules;
        let stats = optimize_rules(&mut rules);
        debug!(
            "Optimized {} -> {} rules ({} duplicates, {} badfilter, {} badfiltered)",
            stats.before, stats.after, stats.deduped, stats.badfilter_rules, stats.badfiltered_rules
        );

        let compiler = Compiler::new(self.options);
        let mut compiled = compiler.compile_rules(&rules, cancel);
        compiled.errors_count = parsed.errors.len();

        let entries = compiled.safari_entries();
        let total = entries.len();
        let limit = self.rules_limit();
        let over_limit = total > limit;
        if over_limit {
            warn!("{total} entries exceed the limit of {limit}, extra entries are dropped");
        }
        let kept: Vec<_> = entries.into_iter().take(limit).collect();

        let advanced_blocking = if self.options.advanced_blocking {
            Some(serde_json::to_string(&compiled.advanced_entries())?)
        } else {
            None
        };

        let result = ConversionResult {
            total_converted_count: total,
            converted_count: kept.len(),
            errors_count: compiled.errors_count,
            over_limit,
            converted: serde_json::to_string(&kept)?,
            advanced_blocking_converted_count: compiled.advanced_entries().len(),
            advanced_blocking,
        };

        info!(
            "Converted {} entries for {:?} ({} errors)",
            result.converted_count, self.version, result.errors_count
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{ActionKind, BlockerEntry};

    fn converter(options: CompilerOptions) -> ContentBlockerConverter {
        ContentBlockerConverter::new(SafariVersion::Safari15, options)
    }

    #[test]
    fn converts_element_hiding() {
        let result = converter(CompilerOptions::default())
            .convert_array(["##.banner", "example.org##.ad", "! comment"])
            .unwrap();

        assert_eq!(result.converted_count, 2);
        assert_eq!(result.total_converted_count, 2);
        assert_eq!(result.errors_count, 0);
        assert!(!result.over_limit);
        assert!(result.advanced_blocking.is_none());

        let entries: Vec<BlockerEntry> = serde_json::from_str(&result.converted).unwrap();
        assert_eq!(entries[0].action.selector.as_deref(), Some(".banner"));
        assert_eq!(entries[1].trigger.if_domain, Some(vec!["*example.org".to_string()]));
    }

    #[test]
    fn counts_errors() {
        let result = converter(CompilerOptions::default())
            .convert_array(["||ads.com^$unknown-option", "##.ad"])
            .unwrap();
        assert_eq!(result.errors_count, 1);
        assert_eq!(result.converted_count, 1);
    }

    #[test]
    fn excepted_rules_produce_empty_json() {
        let result = converter(CompilerOptions::default())
            .convert_array(["##.ad", "#@#.ad"])
            .unwrap();
        assert_eq!(result.converted, "[]");
        assert_eq!(result.converted_count, 0);
    }

    #[test]
    fn applies_badfilter() {
        let result = converter(CompilerOptions::default())
            .convert_array(["||ads.com^", "||ads.com^$badfilter", "||ads.com^"])
            .unwrap();
        assert_eq!(result.converted_count, 0);
    }

    #[test]
    fn truncates_to_limit() {
        let lines: Vec<String> = (0..5).map(|i| format!("||ads{i}.com^")).collect();
        let result = converter(CompilerOptions::default())
            .with_limit(3)
            .convert_array(&lines)
            .unwrap();

        assert!(result.over_limit);
        assert_eq!(result.total_converted_count, 5);
        assert_eq!(result.converted_count, 3);
        let entries: Vec<BlockerEntry> = serde_json::from_str(&result.converted).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.action.kind == ActionKind::Block));
    }

    #[test]
    fn limit_never_exceeds_version_limit() {
        let converter = ContentBlockerConverter::new(SafariVersion::Safari14, CompilerOptions::default())
            .with_limit(1_000_000);
        assert_eq!(converter.rules_limit(), 50_000);
    }

    #[test]
    fn serializes_advanced_entries_separately() {
        let options = CompilerOptions {
            optimize: false,
            advanced_blocking: true,
        };
        let result = converter(options)
            .convert_array(["example.org#%#//scriptlet('abort-on-property-read', 'alert')", "##.ad"])
            .unwrap();

        assert_eq!(result.converted_count, 1);
        assert_eq!(result.advanced_blocking_converted_count, 1);
        let advanced: Vec<BlockerEntry> = serde_json::from_str(result.advanced_blocking.as_deref().unwrap()).unwrap();
        assert_eq!(advanced[0].action.kind, ActionKind::Scriptlet);
        assert_eq!(advanced[0].action.scriptlet.as_deref(), Some("abort-on-property-read"));
    }

    #[test]
    fn result_uses_camel_case_keys() {
        let json = serde_json::to_value(ConversionResult::default()).unwrap();
        assert!(json.get("totalConvertedCount").is_some());
        assert!(json.get("overLimit").is_some());
        assert!(json.get("advancedBlockingConvertedCount").is_some());
        assert!(json.get("advancedBlocking").is_none());
    }
}
