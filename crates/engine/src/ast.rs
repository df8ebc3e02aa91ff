//! Expression tree types.
//!
//! Core types: [`Expression`], [`Operator`], [`FilterKind`], [`Lambda`].
//!
//! Trees are produced by an external parser (or built directly with the
//! constructor helpers below) and are immutable afterwards. A tree holds no
//! per-evaluation state, so one tree can back any number of independent
//! evaluations.

use std::fmt;

use crate::value::Value;

/// The variable bound to the current candidate.
pub const THIS: &str = "this";
/// The variable naming the context's full working set.
pub const EVERYTHING: &str = "everything";

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    Variable(String),
    Parameter(ParameterRef),
    Lambda(Lambda),
    FunctionCall {
        operator: Operator,
        operands: Vec<Expression>,
    },
    CollectionFilter {
        kind: FilterKind,
        source: Box<Expression>,
        lambda: Option<Lambda>,
    },
}

/// A predicate or mapping closure over one bound variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub variable: String,
    pub body: Box<Expression>,
}

impl Lambda {
    pub fn new(variable: impl Into<String>, body: Expression) -> Self {
        Self {
            variable: variable.into(),
            body: Box::new(body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParameterRef {
    Index(usize),
    Name(String),
}

impl fmt::Display for ParameterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterRef::Index(i) => write!(f, "${}", i),
            ParameterRef::Name(name) => write!(f, "${}", name),
        }
    }
}

/// Sequence-to-sequence operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// Keep items the lambda accepts.
    Select,
    /// Drop items the lambda accepts.
    Reject,
    /// Map every item through the lambda.
    Collect,
    /// Keep the greatest version per identifier.
    Latest,
    /// Drop repeated items, first occurrence wins.
    Unique,
}

impl FilterKind {
    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::Select => "select",
            FilterKind::Reject => "reject",
            FilterKind::Collect => "collect",
            FilterKind::Latest => "latest",
            FilterKind::Unique => "unique",
        }
    }
}

/// The closed set of compiled-in operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    And,
    Or,
    Not,
    Member,
    Matches,
    Translated,
    Exists,
    All,
    First,
    Count,
    Limit,
    WrappedQuery,
}

impl Operator {
    pub const ALL: [Operator; 18] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::Less,
        Operator::LessOrEqual,
        Operator::Greater,
        Operator::GreaterOrEqual,
        Operator::And,
        Operator::Or,
        Operator::Not,
        Operator::Member,
        Operator::Matches,
        Operator::Translated,
        Operator::Exists,
        Operator::All,
        Operator::First,
        Operator::Count,
        Operator::Limit,
        Operator::WrappedQuery,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
            Operator::Less => "<",
            Operator::LessOrEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Not => "!",
            Operator::Member => "member",
            Operator::Matches => "~=",
            Operator::Translated => "translated",
            Operator::Exists => "exists",
            Operator::All => "all",
            Operator::First => "first",
            Operator::Count => "count",
            Operator::Limit => "limit",
            Operator::WrappedQuery => "query",
        }
    }

    /// Looks up an operator by the name the parser uses for it.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Minimum and (optional) maximum operand count.
    pub fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Operator::Not | Operator::Count => (1, Some(1)),
            Operator::And | Operator::Or => (2, None),
            Operator::WrappedQuery => (1, Some(2)),
            _ => (2, Some(2)),
        }
    }

    /// Operators whose natural result is a collection.
    pub fn is_sequence_valued(&self) -> bool {
        matches!(self, Operator::Limit | Operator::WrappedQuery)
    }

    fn is_infix(&self) -> bool {
        matches!(
            self,
            Operator::Equals
                | Operator::NotEquals
                | Operator::Less
                | Operator::LessOrEqual
                | Operator::Greater
                | Operator::GreaterOrEqual
                | Operator::And
                | Operator::Or
                | Operator::Matches
        )
    }
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable(name.into())
    }

    pub fn this() -> Self {
        Expression::Variable(THIS.to_string())
    }

    pub fn everything() -> Self {
        Expression::Variable(EVERYTHING.to_string())
    }

    pub fn parameter(index: usize) -> Self {
        Expression::Parameter(ParameterRef::Index(index))
    }

    pub fn named_parameter(name: impl Into<String>) -> Self {
        Expression::Parameter(ParameterRef::Name(name.into()))
    }

    pub fn lambda(variable: impl Into<String>, body: Expression) -> Self {
        Expression::Lambda(Lambda::new(variable, body))
    }

    pub fn call(operator: Operator, operands: Vec<Expression>) -> Self {
        Expression::FunctionCall { operator, operands }
    }

    /// Wraps an external query object (first operand) with an optional target.
    pub fn wrapped_query(query: Expression, target: Option<Expression>) -> Self {
        let mut operands = vec![query];
        operands.extend(target);
        Self::call(Operator::WrappedQuery, operands)
    }

    pub fn member(self, property: &str) -> Self {
        Self::call(Operator::Member, vec![self, Self::literal(property)])
    }

    pub fn translated(self, property: &str) -> Self {
        Self::call(Operator::Translated, vec![self, Self::literal(property)])
    }

    pub fn equals(self, other: Expression) -> Self {
        Self::call(Operator::Equals, vec![self, other])
    }

    pub fn not_equals(self, other: Expression) -> Self {
        Self::call(Operator::NotEquals, vec![self, other])
    }

    pub fn less(self, other: Expression) -> Self {
        Self::call(Operator::Less, vec![self, other])
    }

    pub fn less_or_equal(self, other: Expression) -> Self {
        Self::call(Operator::LessOrEqual, vec![self, other])
    }

    pub fn greater(self, other: Expression) -> Self {
        Self::call(Operator::Greater, vec![self, other])
    }

    pub fn greater_or_equal(self, other: Expression) -> Self {
        Self::call(Operator::GreaterOrEqual, vec![self, other])
    }

    pub fn matches(self, other: Expression) -> Self {
        Self::call(Operator::Matches, vec![self, other])
    }

    pub fn and(self, other: Expression) -> Self {
        Self::call(Operator::And, vec![self, other])
    }

    pub fn or(self, other: Expression) -> Self {
        Self::call(Operator::Or, vec![self, other])
    }

    pub fn negate(self) -> Self {
        Self::call(Operator::Not, vec![self])
    }

    pub fn filter(self, kind: FilterKind, lambda: Option<Lambda>) -> Self {
        Expression::CollectionFilter {
            kind,
            source: Box::new(self),
            lambda,
        }
    }

    pub fn select(self, lambda: Lambda) -> Self {
        self.filter(FilterKind::Select, Some(lambda))
    }

    pub fn reject(self, lambda: Lambda) -> Self {
        self.filter(FilterKind::Reject, Some(lambda))
    }

    pub fn collect(self, lambda: Lambda) -> Self {
        self.filter(FilterKind::Collect, Some(lambda))
    }

    pub fn latest(self) -> Self {
        self.filter(FilterKind::Latest, None)
    }

    pub fn unique(self) -> Self {
        self.filter(FilterKind::Unique, None)
    }

    pub fn exists(self, lambda: Lambda) -> Self {
        Self::call(Operator::Exists, vec![self, Expression::Lambda(lambda)])
    }

    pub fn all(self, lambda: Lambda) -> Self {
        Self::call(Operator::All, vec![self, Expression::Lambda(lambda)])
    }

    pub fn first(self, lambda: Lambda) -> Self {
        Self::call(Operator::First, vec![self, Expression::Lambda(lambda)])
    }

    pub fn count(self) -> Self {
        Self::call(Operator::Count, vec![self])
    }

    pub fn limit(self, count: Expression) -> Self {
        Self::call(Operator::Limit, vec![self, count])
    }

    /// Visits this node and every node below it, parents first.
    pub fn walk<'e>(&'e self, visit: &mut impl FnMut(&'e Expression)) {
        visit(self);
        match self {
            Expression::Literal(_) | Expression::Variable(_) | Expression::Parameter(_) => {}
            Expression::Lambda(lambda) => lambda.body.walk(visit),
            Expression::FunctionCall { operands, .. } => {
                for operand in operands {
                    operand.walk(visit);
                }
            }
            Expression::CollectionFilter { source, lambda, .. } => {
                source.walk(visit);
                if let Some(lambda) = lambda {
                    lambda.body.walk(visit);
                }
            }
        }
    }

    /// Whether evaluating this tree can require locale-aware lookups.
    pub fn needs_translations(&self) -> bool {
        let mut found = false;
        self.walk(&mut |e| {
            if matches!(
                e,
                Expression::FunctionCall {
                    operator: Operator::Translated,
                    ..
                }
            ) {
                found = true;
            }
        });
        found
    }

    /// Every parameter the tree references, in visit order.
    pub fn parameter_refs(&self) -> Vec<&ParameterRef> {
        let mut refs = Vec::new();
        self.walk(&mut |e| {
            if let Expression::Parameter(r) = e {
                refs.push(r);
            }
        });
        refs
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.variable, self.body)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Variable(name) => write!(f, "{}", name),
            Expression::Parameter(r) => write!(f, "{}", r),
            Expression::Lambda(lambda) => write!(f, "{}", lambda),
            Expression::FunctionCall { operator, operands } => match (operator, operands.as_slice()) {
                (Operator::Member, [target, Expression::Literal(Value::String(name))]) => {
                    write!(f, "{}.{}", target, name)
                }
                (Operator::Not, [operand]) => write!(f, "!{}", operand),
                (op, [first, rest @ ..]) if op.is_infix() => {
                    write!(f, "({}", first)?;
                    for operand in rest {
                        write!(f, " {} {}", op.name(), operand)?;
                    }
                    write!(f, ")")
                }
                (op, operands) => {
                    write!(f, "{}(", op.name())?;
                    for (i, operand) in operands.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", operand)?;
                    }
                    write!(f, ")")
                }
            },
            Expression::CollectionFilter {
                kind,
                source,
                lambda,
            } => match lambda {
                Some(lambda) => write!(f, "{}.{}({})", source, kind.name(), lambda),
                None => write!(f, "{}.{}()", source, kind.name()),
            },
        }
    }
}
