//! Query-string parsing for list endpoints.

use jobboard_core::config::PaginationConfig;
use jobboard_core::error::AppError;
use jobboard_core::pagination::{Filter, ListQuery, PageRequest, SortSpec};
use jobboard_db::Collection;
use std::collections::HashMap;

/// Splits list parameters into the query shape and the page window.
///
/// Everything that is not `page`, `limit`, `sort`, `fields` or
/// `withJobTotals` is an equality filter on a field of `collection`.
pub fn list_request(
    collection: &Collection,
    params: &HashMap<String, String>,
    config: &PaginationConfig,
) -> Result<(ListQuery, PageRequest), AppError> {
    let get = |key: &str| params.get(key).map(String::as_str);

    let with_totals = matches!(get("withJobTotals"), Some("true") | Some("1"));
    let query = ListQuery {
        filter: Filter::from_params(collection.fields, params.iter())?,
        sort: SortSpec::parse(get("sort"), collection.default_sort_field)?,
        projection: ListQuery::parse_projection(get("fields")),
        aggregate: if with_totals { collection.job_totals } else { None },
    };
    let page = PageRequest::from_raw(get("page"), get("limit"), config);

    Ok((query, page))
}
