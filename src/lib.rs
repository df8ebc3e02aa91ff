//! # provql
//!
//! Declarative queries over versioned metadata records: select, group and
//! pick "the latest version of each unit matching X" from a lazily streamed
//! collection.
//!
//! The crate stitches the workspace together:
//!
//! - `provql-types`: identifiers, versions and version ranges
//! - `provql-engine`: expression trees and their evaluation
//! - `provql-core`: query drivers, configuration and the compile boundary
//!
//! ```ignore
//! use provql::{LatestQuery, QueryConfig, load_records};
//!
//! let records = load_records("repository.json".as_ref())?;
//! let latest = LatestQuery { kind: Some("unit".into()), id_pattern: None }
//!     .run(records, &QueryConfig::default())?;
//! ```

pub mod error;
pub mod queries;
pub mod records;

pub use error::ProvqlError;
pub use queries::{LatestQuery, MatchFilter};
pub use records::{load_records, load_translations, parse_records, parse_translations, render_records};

pub use provql_core::{
    CompileError, ContextQueryDriver, DriverError, ElementShape, ExpressionFactory,
    MatchQueryDriver, PerformHooks, QueryConfig,
};
pub use provql_engine::{
    EvaluationContext, Expression, FilterKind, Lambda, MatchQuery, Operator, Parameters,
    QueryError, QueryObject, Record, Sequence, SequenceQuery, TranslationSupport,
    TranslationTable, Value, evaluate, evaluate_as_sequence, sequence_of,
};
pub use provql_types::{ItemId, Version, VersionError, VersionRange};
