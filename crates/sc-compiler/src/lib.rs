//! SafariConverter Compiler
//!
//! This crate compiles parsed AdGuard rules into Safari content blocker entries,
//! plus entries for the advanced blocking extension.
//!
//! Pipeline: classify rules into buckets, resolve cosmetic exceptions, drop
//! `$specifichide` targets, then compact element hiding entries under Safari's limits.

pub mod compactor;
pub mod compiler;
pub mod converter;
pub mod entry;
pub mod exceptions;
pub mod factory;
pub mod optimizer;
pub mod result;
pub mod version;

pub use compiler::{Cancellation, Compiler, CompilerOptions};
pub use converter::{ContentBlockerConverter, ConversionResult, ConvertError};
pub use entry::{Action, ActionKind, BlockerEntry, PayloadKey, Trigger, URL_FILTER_COSMETIC_RULES};
pub use factory::{BlockerEntryFactory, EntryFactory};
pub use optimizer::{optimize_rules, OptimizeStats};
pub use result::CompilationResult;
pub use version::{SafariVersion, UnsupportedVersion};
