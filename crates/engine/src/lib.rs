//! Expression model and evaluator for the provql query language.
//!
//! Queries select, group and transform sequences of versioned metadata
//! records ("the latest version of each unit matching X"). A parser outside
//! this crate produces an [`Expression`] tree; this crate evaluates it.
//!
//! # Key Types
//!
//! - [`Expression`]: immutable expression tree
//! - [`EvaluationContext`]: per-invocation parameters, variables and working set
//! - [`Value`] / [`Sequence`]: scalar results and lazy single-pass collections
//! - [`MatchQuery`] / [`SequenceQuery`]: the protocol external query objects implement
//!
//! # Example
//!
//! ```ignore
//! use provql_engine::{Expression, EvaluationContext, Lambda, evaluate_as_sequence, sequence_of};
//!
//! let expr = Expression::everything()
//!     .select(Lambda::new("x", Expression::variable("x").member("id").equals(Expression::parameter(0))))
//!     .latest();
//! let ctx = EvaluationContext::new().with_everything(sequence_of(units));
//! let latest: Vec<_> = evaluate_as_sequence(&expr, &ctx)?.collect::<Result<_, _>>()?;
//! ```

pub mod ast;
pub mod context;
pub mod engine;
pub mod error;
mod filters;
mod operators;
pub mod query;
pub mod translation;
pub mod value;

pub use ast::{EVERYTHING, Expression, FilterKind, Lambda, Operator, ParameterRef, THIS};
pub use context::{EvaluationContext, Parameters, TranslationBinding, VariableScope};
pub use engine::{evaluate, evaluate_as_sequence, evaluate_predicate};
pub use error::QueryError;
pub use query::{MatchQuery, PerformScope, QueryObject, SequenceQuery};
pub use translation::{TranslationSupport, TranslationTable};
pub use value::{Record, Sequence, Value, empty_sequence, sequence_of};

pub use provql_types::{ItemId, Version, VersionRange};
