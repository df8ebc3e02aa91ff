//! Query drivers for provql expressions.
//!
//! The engine evaluates expression trees; this crate packages a compiled
//! tree with its parameters and configuration so it can be handed around
//! as an ordinary query object.
//!
//! - [`MatchQueryDriver`] tests candidates one at a time against a predicate.
//! - [`ContextQueryDriver`] runs a whole-collection query over its input.

pub mod config;
pub mod context_query;
mod driver;
pub mod error;
pub mod factory;
pub mod hooks;
pub mod match_query;

pub use config::QueryConfig;
pub use context_query::ContextQueryDriver;
pub use error::{CompileError, DriverError};
pub use factory::ExpressionFactory;
pub use hooks::PerformHooks;
pub use match_query::{ElementShape, MatchQueryDriver};

pub use provql_engine;
pub use provql_types;
