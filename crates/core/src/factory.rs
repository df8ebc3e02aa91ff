use provql_engine::Expression;

use crate::error::CompileError;

/// Turns query source text into expression trees. Implemented by the
/// language front end; trees it returns are assumed well formed.
pub trait ExpressionFactory {
    /// Compiles a collection-level query, e.g.
    /// `everything.select(x | x.id == $0).latest()`.
    fn compile(&self, source: &str) -> Result<Expression, CompileError>;

    /// Compiles a single-candidate predicate, e.g. `id == $0`.
    fn compile_predicate(&self, source: &str) -> Result<Expression, CompileError>;
}
