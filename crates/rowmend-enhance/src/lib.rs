//! rowmend enhancement
//!
//! Range-scoped, append-only edits to a [`rowmend_record::RecordSet`].
//!
//! # Core Concepts
//!
//! - [`RangeSelector`]: Closed ordinal interval scoping one edit batch
//! - [`Enhancement`]: Text appended to one field, addressed by key or ordinal
//! - [`EnhancementSet`]: Batch of enhancements, at most one per target
//! - [`enhance`]: Pure transform from input records to output records
//! - [`ParserRegistry`]: JSON, YAML and TOML enhancement sources
//!
//! # Example
//!
//! ```rust,ignore
//! use rowmend_enhance::{enhance, load_enhancements, EnhanceOptions, RangeSelector};
//!
//! let selector: RangeSelector = "102..201".parse()?;
//! let enhancements = load_enhancements("batch2.yaml")?;
//! let outcome = enhance(&records, selector, &enhancements, &EnhanceOptions::new())?;
//! println!("{} records enhanced", outcome.report.modified_count());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod enhancement;
mod enhancer;
mod error;
mod selector;
pub mod source;

pub use enhancement::{Enhancement, EnhancementSet, EnhancementTarget, ParagraphSeparator};
pub use enhancer::{
    enhance, CoveragePolicy, EnhanceOptions, EnhanceOutcome, EnhanceReport,
    DEFAULT_TARGET_COLUMN,
};
pub use error::EnhanceError;
pub use selector::{RangeSelector, SelectorError};
pub use source::{default_parsers, load_enhancements, EnhancementParser, ParserRegistry, SourceError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
