//! Filter evaluation and query compilation for SensorThings collections.
//!
//! Parsed `$filter` trees ([`Expr`]) are resolved against an entity's
//! [`PropertyMap`] into backend-neutral [`Predicate`]s, which the storage
//! layer executes through the [`eval`] module.
//!
//! ```text
//! Expr ──FilterEvaluator──▶ Predicate ──QueryCompiler──▶ QueryPlan
//! ```

pub mod compiler;
pub mod error;
pub mod eval;
pub mod evaluator;
pub mod expr;
pub mod functions;
pub mod predicate;
pub mod scalar;
pub mod schema;
pub mod spatial;

pub use compiler::{OrderBy, Paging, QueryCompiler, QueryOptions, QueryPlan, SortDirection, SortKey};
pub use error::{FilterError, FilterResult};
pub use eval::{ColumnSource, Row, Standalone};
pub use evaluator::FilterEvaluator;
pub use expr::{BinaryOp, Expr, LambdaKind, Literal, UnaryOp};
pub use functions::Func;
pub use predicate::{builder, ArithOp, CmpOp, ColumnRef, Hop, Predicate, ScalarExpr};
pub use scalar::Scalar;
pub use schema::{Property, PropertyMap, SchemaRegistry, ValueType};
