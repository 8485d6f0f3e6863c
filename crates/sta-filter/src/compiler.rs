//! Query options to execution plan.

use tracing::debug;

use crate::error::{FilterError, FilterResult};
use crate::evaluator::FilterEvaluator;
use crate::expr::Expr;
use crate::predicate::{builder, ColumnRef, Predicate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: Expr,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(path: &str) -> Self {
        Self {
            expr: Expr::member(path),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(path: &str) -> Self {
        Self {
            expr: Expr::member(path),
            direction: SortDirection::Descending,
        }
    }
}

/// Already-parsed query options for one collection request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub filter: Option<Expr>,
    pub order_by: Vec<OrderBy>,
    pub skip: Option<usize>,
    pub top: Option<usize>,
    pub select: Option<Vec<String>>,
    /// Passed through for the serialization layer.
    pub expand: Vec<String>,
    pub count: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub column: ColumnRef,
    pub direction: SortDirection,
}

/// A paged, sorted, filtered query over one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub predicate: Option<Predicate>,
    pub sort: Vec<SortKey>,
    pub offset: usize,
    pub limit: usize,
    pub select: Option<Vec<&'static str>>,
    pub expand: Vec<String>,
    pub count: bool,
}

impl QueryPlan {
    /// Plan that returns every row matching `predicate` in id order.
    pub fn matching(predicate: Predicate) -> Self {
        Self {
            predicate: Some(predicate),
            sort: vec![SortKey {
                column: ColumnRef::local("id"),
                direction: SortDirection::Ascending,
            }],
            offset: 0,
            limit: usize::MAX,
            select: None,
            expand: Vec::new(),
            count: false,
        }
    }
}

/// Page size limits applied to `$top`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub default_top: usize,
    pub max_top: usize,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            default_top: 100,
            max_top: 10_000,
        }
    }
}

pub struct QueryCompiler<'a> {
    evaluator: FilterEvaluator<'a>,
    paging: Paging,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(evaluator: FilterEvaluator<'a>, paging: Paging) -> Self {
        Self { evaluator, paging }
    }

    /// Compile options into a plan.
    ///
    /// `scope` restricts the collection further, e.g. to the Datastreams of
    /// one Thing, and is combined with the filter by conjunction.
    pub fn compile(&self, options: &QueryOptions, scope: Option<Predicate>) -> FilterResult<QueryPlan> {
        let filter = options
            .filter
            .as_ref()
            .map(|f| self.evaluator.predicate(f))
            .transpose()?;
        let predicate = match (scope, filter) {
            (Some(s), Some(f)) => Some(builder::and(s, f)),
            (s, f) => s.or(f),
        };

        let mut sort = Vec::new();
        for order in &options.order_by {
            for column in self.evaluator.sort_columns(&order.expr)? {
                sort.push(SortKey {
                    column,
                    direction: order.direction,
                });
            }
        }
        let has_id_tiebreak = sort
            .last()
            .map(|k| k.column == ColumnRef::local("id"))
            .unwrap_or(false);
        if !has_id_tiebreak {
            sort.push(SortKey {
                column: ColumnRef::local("id"),
                direction: SortDirection::Ascending,
            });
        }

        let select = match &options.select {
            Some(names) => Some(self.select(names)?),
            None => None,
        };

        let limit = options
            .top
            .unwrap_or(self.paging.default_top)
            .min(self.paging.max_top);
        let offset = options.skip.unwrap_or(0);

        debug!(
            entity = self.evaluator.root().entity,
            sort_keys = sort.len(),
            offset,
            limit,
            filtered = predicate.is_some(),
            "Compiled query plan"
        );

        Ok(QueryPlan {
            predicate,
            sort,
            offset,
            limit,
            select,
            expand: options.expand.clone(),
            count: options.count,
        })
    }

    fn select(&self, names: &[String]) -> FilterResult<Vec<&'static str>> {
        let root = self.evaluator.root();
        names
            .iter()
            .map(|name| {
                let key = if name == "@iot.id" { "id" } else { name.as_str() };
                root.entry(key).map(|(canonical, _)| canonical).ok_or_else(|| {
                    FilterError::invalid(name, format!("unknown property in $select on {}", root.entity))
                })
            })
            .collect()
    }
}
