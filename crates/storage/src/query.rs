//! Query plan execution over [`Tables`].

use sta_filter::{eval, ColumnSource, Hop, QueryPlan, Row, Scalar, SortDirection};
use std::cmp::Ordering;

use crate::entity::Entity;
use crate::store::Tables;

/// Resolves navigation hops from one row through the tables.
pub struct RowContext<'a> {
    tables: &'a Tables,
    row: &'a dyn Row,
}

impl<'a> RowContext<'a> {
    pub fn new(tables: &'a Tables, row: &'a dyn Row) -> Self {
        Self { tables, row }
    }
}

impl ColumnSource for RowContext<'_> {
    fn row_for(&self, hops: &[Hop]) -> Option<&dyn Row> {
        let mut current = self.row;
        for hop in hops {
            let id = current.related_id(hop.relation)?;
            current = self.tables.row(hop.target, &id)?;
        }
        Some(current)
    }
}

/// One page of query results.
#[derive(Debug)]
pub struct Page<'a, T> {
    pub items: Vec<&'a T>,
    /// Total matches before paging, when the plan asked for a count.
    pub total: Option<usize>,
    /// True if rows remain after this page.
    pub has_more: bool,
}

pub fn execute<'a, T: Entity>(tables: &'a Tables, plan: &QueryPlan) -> Page<'a, T> {
    let mut matched: Vec<(Vec<Scalar>, &'a T)> = T::table(tables)
        .iter()
        .filter_map(|row| {
            let ctx = RowContext::new(tables, row);
            if let Some(predicate) = &plan.predicate {
                if !eval::matches(predicate, &ctx) {
                    return None;
                }
            }
            let keys = plan
                .sort
                .iter()
                .map(|key| eval::column_value(&key.column, &ctx))
                .collect();
            Some((keys, row))
        })
        .collect();

    matched.sort_by(|(a, _), (b, _)| {
        for ((x, y), key) in a.iter().zip(b.iter()).zip(plan.sort.iter()) {
            let ord = match key.direction {
                SortDirection::Ascending => x.sort_cmp(y),
                SortDirection::Descending => y.sort_cmp(x),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });

    let total = matched.len();
    let items: Vec<&T> = matched
        .into_iter()
        .skip(plan.offset)
        .take(plan.limit)
        .map(|(_, row)| row)
        .collect();
    let has_more = plan.offset.saturating_add(items.len()) < total;

    Page {
        items,
        total: plan.count.then_some(total),
        has_more,
    }
}
