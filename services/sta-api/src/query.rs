//! Query-option parsing for collection requests.
//!
//! `$top`, `$skip`, `$orderby`, `$count` and `$select` are parsed here.
//! Textual `$filter` and `$expand` are rejected: filters reach the core only
//! as expression trees.

use sta_common::{StaError, StaResult};
use sta_filter::{OrderBy, QueryOptions};
use std::collections::HashMap;

fn parse_count(value: &str, option: &str) -> StaResult<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| StaError::invalid_query(value, format!("{} must be a non-negative integer", option)))
}

fn parse_order_by(value: &str) -> StaResult<Vec<OrderBy>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| {
            let mut parts = term.split_whitespace();
            let path = parts.next().unwrap_or_default();
            let order = match parts.next().map(str::to_ascii_lowercase).as_deref() {
                None | Some("asc") => OrderBy::asc(path),
                Some("desc") => OrderBy::desc(path),
                Some(other) => {
                    return Err(StaError::invalid_query(
                        term,
                        format!("unknown sort direction '{}'", other),
                    ))
                }
            };
            if parts.next().is_some() {
                return Err(StaError::invalid_query(term, "unexpected token in $orderby"));
            }
            Ok(order)
        })
        .collect()
}

/// Build query options from raw request parameters.
pub fn parse_options(params: &HashMap<String, String>) -> StaResult<QueryOptions> {
    let mut options = QueryOptions::default();
    for (key, value) in params {
        match key.as_str() {
            "$top" => options.top = Some(parse_count(value, "$top")?),
            "$skip" => options.skip = Some(parse_count(value, "$skip")?),
            "$orderby" => options.order_by = parse_order_by(value)?,
            "$count" => {
                options.count = match value.trim() {
                    "true" => true,
                    "false" => false,
                    other => {
                        return Err(StaError::invalid_query(other, "$count must be true or false"))
                    }
                }
            }
            "$select" => {
                options.select = Some(
                    value
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect(),
                )
            }
            "$filter" => {
                return Err(StaError::unsupported(
                    "textual $filter expressions are not parsed by this server",
                ))
            }
            "$expand" => return Err(StaError::unsupported("$expand is not supported")),
            other if other.starts_with('$') => {
                return Err(StaError::invalid_query(other, "unknown query option"))
            }
            _ => {}
        }
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sta_common::ErrorKind;
    use sta_filter::SortDirection;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_paging_and_count() {
        let options =
            parse_options(&params(&[("$top", "5"), ("$skip", "10"), ("$count", "true")])).unwrap();
        assert_eq!(options.top, Some(5));
        assert_eq!(options.skip, Some(10));
        assert!(options.count);
    }

    #[test]
    fn test_order_by_terms() {
        let options = parse_options(&params(&[("$orderby", "phenomenonTime desc, id")])).unwrap();
        assert_eq!(options.order_by.len(), 2);
        assert_eq!(options.order_by[0].direction, SortDirection::Descending);
        assert_eq!(options.order_by[1].direction, SortDirection::Ascending);

        let err = parse_options(&params(&[("$orderby", "name sideways")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_rejected_options() {
        let err = parse_options(&params(&[("$filter", "result gt 5")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);

        let err = parse_options(&params(&[("$top", "-1")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let err = parse_options(&params(&[("$bogus", "1")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_select_and_plain_params() {
        let options =
            parse_options(&params(&[("$select", "name, description"), ("page", "2")])).unwrap();
        assert_eq!(
            options.select,
            Some(vec!["name".to_string(), "description".to_string()])
        );
    }
}
