//! Translation of parsed filter expressions into predicates.

use chrono::{DateTime, Utc};

use crate::error::{FilterError, FilterResult};
use crate::expr::{BinaryOp, Expr, Literal, UnaryOp};
use crate::functions::Func;
use crate::predicate::{builder, ArithOp, CmpOp, ColumnRef, Hop, Predicate, ScalarExpr};
use crate::scalar::Scalar;
use crate::schema::{Property, PropertyMap, SchemaRegistry, ValueType};
use crate::spatial;

/// An evaluated sub-expression.
#[derive(Debug, Clone)]
enum Operand {
    Value { expr: ScalarExpr, ty: ValueType },
    /// A time property stored as a start/end pair.
    Span { start: ScalarExpr, end: ScalarExpr },
}

impl Operand {
    /// Collapse to a single value; spans are represented by their start.
    fn into_value(self) -> (ScalarExpr, ValueType) {
        match self {
            Operand::Value { expr, ty } => (expr, ty),
            Operand::Span { start, .. } => (start, ValueType::DateTime),
        }
    }

    fn ty(&self) -> ValueType {
        match self {
            Operand::Value { ty, .. } => *ty,
            Operand::Span { .. } => ValueType::DateTime,
        }
    }
}

fn literal_type(lit: &Literal) -> ValueType {
    match lit {
        Literal::Null => ValueType::Any,
        Literal::Boolean(_) => ValueType::Boolean,
        Literal::Integer(_) | Literal::Decimal(_) => ValueType::Number,
        Literal::String(_) => ValueType::String,
        Literal::DateTime(_) => ValueType::DateTime,
        Literal::Date(_) => ValueType::Date,
        Literal::TimeOfDay(_) => ValueType::TimeOfDay,
        Literal::Geometry(_) => ValueType::Geometry,
    }
}

fn comparison_op(op: BinaryOp) -> Option<CmpOp> {
    Some(match op {
        BinaryOp::Eq => CmpOp::Eq,
        BinaryOp::Ne => CmpOp::Ne,
        BinaryOp::Lt => CmpOp::Lt,
        BinaryOp::Le => CmpOp::Le,
        BinaryOp::Gt => CmpOp::Gt,
        BinaryOp::Ge => CmpOp::Ge,
        _ => return None,
    })
}

fn arith_op(op: BinaryOp) -> Option<ArithOp> {
    Some(match op {
        BinaryOp::Add => ArithOp::Add,
        BinaryOp::Sub => ArithOp::Sub,
        BinaryOp::Mul => ArithOp::Mul,
        BinaryOp::Div => ArithOp::Div,
        BinaryOp::Mod => ArithOp::Mod,
        _ => return None,
    })
}

/// Walks expression trees rooted at one entity type.
pub struct FilterEvaluator<'a> {
    registry: &'a dyn SchemaRegistry,
    root: &'static PropertyMap,
    now: DateTime<Utc>,
}

impl<'a> FilterEvaluator<'a> {
    pub fn new(
        registry: &'a dyn SchemaRegistry,
        root: &'static PropertyMap,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            registry,
            root,
            now,
        }
    }

    pub fn root(&self) -> &'static PropertyMap {
        self.root
    }

    /// Translate a boolean expression into a predicate.
    pub fn predicate(&self, expr: &Expr) -> FilterResult<Predicate> {
        match expr {
            Expr::Binary { op, left, right } => match op {
                BinaryOp::And => Ok(builder::and(
                    self.predicate(left)?,
                    self.predicate(right)?,
                )),
                BinaryOp::Or => Ok(builder::or(self.predicate(left)?, self.predicate(right)?)),
                _ => match comparison_op(*op) {
                    Some(cmp) => self.comparison(expr, cmp, left, right),
                    None => Err(FilterError::invalid(expr, "arithmetic is not a condition")),
                },
            },
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => Ok(builder::not(self.predicate(operand)?)),
            Expr::Literal(Literal::Boolean(b)) => Ok(Predicate::Const(*b)),
            _ => match self.operand(expr)? {
                Operand::Value { expr: value, ty }
                    if matches!(ty, ValueType::Boolean | ValueType::Any) =>
                {
                    Ok(builder::truthy(value))
                }
                _ => Err(FilterError::invalid(expr, "expression is not a condition")),
            },
        }
    }

    /// Translate a value-producing expression.
    pub fn scalar(&self, expr: &Expr) -> FilterResult<ScalarExpr> {
        Ok(self.operand(expr)?.into_value().0)
    }

    /// Resolve an `$orderby` key to the columns it sorts by.
    ///
    /// Only plain property paths are accepted. A time span sorts by its start
    /// and then its end.
    pub fn sort_columns(&self, expr: &Expr) -> FilterResult<Vec<ColumnRef>> {
        let Expr::Member(path) = expr else {
            return Err(FilterError::invalid(
                expr,
                "orderby expression must be a property reference",
            ));
        };
        let as_column = |e: ScalarExpr| match e {
            ScalarExpr::Column(c) => Some(c),
            _ => None,
        };
        let columns = match self.member(expr, path)? {
            Operand::Value { expr: value, .. } => as_column(value).into_iter().collect(),
            Operand::Span { start, end } => {
                as_column(start).into_iter().chain(as_column(end)).collect()
            }
        };
        Ok(columns)
    }

    fn operand(&self, expr: &Expr) -> FilterResult<Operand> {
        match expr {
            Expr::Literal(lit) => Ok(Operand::Value {
                expr: ScalarExpr::Literal(Scalar::from(lit)),
                ty: literal_type(lit),
            }),
            Expr::Member(path) => self.member(expr, path),
            Expr::Binary { op, left, right } => {
                let Some(arith) = arith_op(*op) else {
                    return Err(FilterError::invalid(expr, "condition used as a value"));
                };
                let (l, lt) = self.operand(left)?.into_value();
                let (r, rt) = self.operand(right)?.into_value();
                if !lt.is_numeric() || !rt.is_numeric() {
                    return Err(FilterError::invalid(expr, "arithmetic requires numeric operands"));
                }
                Ok(Operand::Value {
                    expr: builder::arith(arith, l, r),
                    ty: ValueType::Number,
                })
            }
            Expr::Unary {
                op: UnaryOp::Minus,
                operand,
            } => {
                let (inner, ty) = self.operand(operand)?.into_value();
                if !ty.is_numeric() {
                    return Err(FilterError::invalid(expr, "negation requires a numeric operand"));
                }
                Ok(Operand::Value {
                    expr: ScalarExpr::Negate(Box::new(inner)),
                    ty: ValueType::Number,
                })
            }
            Expr::Unary {
                op: UnaryOp::Not, ..
            } => Err(FilterError::invalid(expr, "condition used as a value")),
            Expr::Method { name, args } => self.method(expr, name, args),
            Expr::Lambda { .. } => Err(FilterError::invalid(
                expr,
                "lambda operators are not supported",
            )),
        }
    }

    fn member(&self, expr: &Expr, path: &[String]) -> FilterResult<Operand> {
        if path.is_empty() {
            return Err(FilterError::invalid(expr, "empty property path"));
        }
        let mut map = self.root;
        let mut hops: Vec<Hop> = Vec::new();
        for (i, segment) in path.iter().enumerate() {
            let last = i + 1 == path.len();
            let Some((name, property)) = map.entry(segment) else {
                return Err(FilterError::invalid(
                    expr,
                    format!("unknown property '{}' on {}", segment, map.entity),
                ));
            };
            match property {
                Property::Relation { target } => {
                    if last {
                        return Err(FilterError::invalid(
                            expr,
                            format!("navigation property '{}' used as a value", name),
                        ));
                    }
                    map = self.registry.property_map(target).ok_or_else(|| {
                        FilterError::invalid(expr, format!("unknown entity type {}", target))
                    })?;
                    hops.push(Hop {
                        relation: name,
                        target,
                    });
                }
                Property::Column { name: column, ty } => {
                    if !last {
                        return Err(FilterError::invalid(
                            expr,
                            format!("cannot navigate into '{}'", name),
                        ));
                    }
                    return Ok(Operand::Value {
                        expr: ScalarExpr::Column(ColumnRef {
                            hops,
                            column,
                            json_path: Vec::new(),
                        }),
                        ty,
                    });
                }
                Property::Span { start, end } => {
                    if !last {
                        return Err(FilterError::invalid(
                            expr,
                            format!("cannot navigate into '{}'", name),
                        ));
                    }
                    let column = |c: &'static str| {
                        ScalarExpr::Column(ColumnRef {
                            hops: hops.clone(),
                            column: c,
                            json_path: Vec::new(),
                        })
                    };
                    return Ok(Operand::Span {
                        start: column(start),
                        end: column(end),
                    });
                }
                Property::Json { name: column } => {
                    let json_path: Vec<String> = path[i + 1..].to_vec();
                    let ty = if json_path.is_empty() {
                        ValueType::Json
                    } else {
                        ValueType::Any
                    };
                    return Ok(Operand::Value {
                        expr: ScalarExpr::Column(ColumnRef {
                            hops,
                            column,
                            json_path,
                        }),
                        ty,
                    });
                }
            }
        }
        Err(FilterError::invalid(expr, "property path ends at a relation"))
    }

    fn comparison(&self, expr: &Expr, op: CmpOp, left: &Expr, right: &Expr) -> FilterResult<Predicate> {
        let left = self.operand(left)?;
        let right = self.operand(right)?;
        let (lt, rt) = (left.ty(), right.ty());
        let numeric = lt.is_numeric() && rt.is_numeric();
        if !numeric && !lt.comparable_with(&rt) {
            return Err(FilterError::invalid(
                expr,
                format!("cannot compare {:?} with {:?}", lt, rt),
            ));
        }
        let predicate = match (left, right) {
            (Operand::Value { expr: l, .. }, Operand::Value { expr: r, .. }) => {
                builder::compare(op, l, r)
            }
            (Operand::Span { start, end }, Operand::Value { expr: v, .. }) => {
                span_vs_value(op, start, end, v)
            }
            (Operand::Value { expr: v, .. }, Operand::Span { start, end }) => {
                span_vs_value(op.flip(), start, end, v)
            }
            (
                Operand::Span { start: s1, end: e1 },
                Operand::Span { start: s2, end: e2 },
            ) => span_vs_span(op, (s1, e1), (s2, e2)),
        };
        Ok(predicate)
    }

    fn method(&self, expr: &Expr, name: &str, args: &[Expr]) -> FilterResult<Operand> {
        if args.is_empty() {
            let instant = match name.to_ascii_lowercase().as_str() {
                "now" => self.now,
                "mindatetime" => DateTime::<Utc>::MIN_UTC,
                "maxdatetime" => DateTime::<Utc>::MAX_UTC,
                _ => {
                    return Err(FilterError::UnsupportedFunction {
                        name: name.to_string(),
                        arity: 0,
                    })
                }
            };
            return Ok(Operand::Value {
                expr: ScalarExpr::Literal(Scalar::DateTime(instant)),
                ty: ValueType::DateTime,
            });
        }

        let func = Func::lookup(name, args.len()).ok_or_else(|| FilterError::UnsupportedFunction {
            name: name.to_string(),
            arity: args.len(),
        })?;

        let mut operands = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let (value, ty) = self.operand(arg)?.into_value();
            if !func.accepts(i, ty) {
                return Err(FilterError::invalid(
                    expr,
                    format!("argument {} of {} has type {:?}", i + 1, name, ty),
                ));
            }
            operands.push(value);
        }

        if func == Func::StRelate {
            if let Some(ScalarExpr::Literal(Scalar::String(pattern))) = operands.get(2) {
                if !spatial::is_valid_pattern(pattern) {
                    return Err(FilterError::invalid(expr, "invalid DE-9IM pattern"));
                }
            }
        }

        Ok(Operand::Value {
            expr: builder::call(func, operands),
            ty: func.result_type(),
        })
    }
}

/// Compare a `[start, end]` span with an instant.
///
/// Equality requires both ends to equal the instant; ordering compares the
/// nearer end, so `lt` holds only when the whole span lies before it.
fn span_vs_value(op: CmpOp, start: ScalarExpr, end: ScalarExpr, value: ScalarExpr) -> Predicate {
    match op {
        CmpOp::Eq => builder::and(builder::eq(start, value.clone()), builder::eq(end, value)),
        CmpOp::Ne => builder::not(span_vs_value(CmpOp::Eq, start, end, value)),
        CmpOp::Lt => builder::lt(end, value),
        CmpOp::Le => builder::le(end, value),
        CmpOp::Gt => builder::gt(start, value),
        CmpOp::Ge => builder::ge(start, value),
    }
}

fn span_vs_span(
    op: CmpOp,
    (s1, e1): (ScalarExpr, ScalarExpr),
    (s2, e2): (ScalarExpr, ScalarExpr),
) -> Predicate {
    match op {
        CmpOp::Eq => builder::and(builder::eq(s1, s2), builder::eq(e1, e2)),
        CmpOp::Ne => builder::not(span_vs_span(CmpOp::Eq, (s1, e1), (s2, e2))),
        CmpOp::Lt => builder::lt(e1, s2),
        CmpOp::Le => builder::le(e1, s2),
        CmpOp::Gt => builder::gt(s1, e2),
        CmpOp::Ge => builder::ge(s1, e2),
    }
}
