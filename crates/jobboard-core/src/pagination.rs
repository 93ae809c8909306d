//! Filtered, sorted, paginated reads over a collection.
//!
//! [`paginate`] returns the same envelope for every list endpoint:
//!
//! ```json
//! { "page": 2, "limit": 5, "totalCount": 12, "totalPages": 3,
//!   "hasNextPage": true, "hasPrevPage": true, "results": [ ... ] }
//! ```
//!
//! The page slice and the total count are two independent reads against the
//! same filter. They run concurrently and may observe slightly different
//! snapshots when the collection is being written to; the envelope is not
//! corrected for that.
//!
//! Storage is abstracted behind [`PageSource`]. The PostgreSQL implementation
//! lives in `jobboard-db`.

use crate::config::PaginationConfig;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Query parameters that shape the request instead of filtering it.
pub const RESERVED_PARAMS: &[&str] = &["page", "limit", "sort", "fields", "withJobTotals"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Accepts `asc`, `ascending`, `1`, `desc`, `descending` and `-1`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Some(SortDirection::Asc),
            "desc" | "descending" | "-1" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// How a field's query-string value is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// A database enum, compared through its text form.
    Enum,
    Id,
    Bool,
    Number,
    Timestamp,
}

/// A field a collection exposes to filters, sorting and projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Public (JSON) name.
    pub name: &'static str,
    /// Backing column.
    pub column: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self { name, column, kind }
    }
}

/// Finds a field by its public name.
pub fn find_field<'a>(fields: &'a [FieldSpec], name: &str) -> Option<&'a FieldSpec> {
    fields.iter().find(|f| f.name == name)
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Id(Uuid),
    Bool(bool),
    Number(f64),
    Timestamp(DateTime<Utc>),
}

impl FilterValue {
    /// Parses a raw query-string value for a field of the given kind.
    pub fn parse(field: &str, kind: FieldKind, raw: &str) -> Result<Self, AppError> {
        let invalid = || AppError::Validation(format!("Invalid value for {}: {}", field, raw));
        match kind {
            FieldKind::Text | FieldKind::Enum => Ok(FilterValue::Text(raw.to_string())),
            FieldKind::Id => raw
                .trim()
                .parse::<Uuid>()
                .map(FilterValue::Id)
                .map_err(|_| invalid()),
            FieldKind::Bool => match raw.trim() {
                "true" | "1" => Ok(FilterValue::Bool(true)),
                "false" | "0" => Ok(FilterValue::Bool(false)),
                _ => Err(invalid()),
            },
            FieldKind::Number => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(FilterValue::Number)
                .ok_or_else(invalid),
            FieldKind::Timestamp => DateTime::parse_from_rfc3339(raw.trim())
                .map(|t| FilterValue::Timestamp(t.with_timezone(&Utc)))
                .map_err(|_| invalid()),
        }
    }
}

/// Equality constraints, all of which must hold. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    constraints: Vec<(String, FilterValue)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: FilterValue) -> Self {
        self.constraints.push((field.into(), value));
        self
    }

    /// Builds a filter from query parameters, skipping [`RESERVED_PARAMS`].
    ///
    /// Constraints are ordered by field name so the generated SQL is stable.
    pub fn from_params<'a, I>(fields: &[FieldSpec], params: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut constraints = Vec::new();
        for (name, raw) in params {
            if RESERVED_PARAMS.contains(&name.as_str()) {
                continue;
            }
            let field = find_field(fields, name)
                .ok_or_else(|| AppError::Validation(format!("Unknown filter field: {}", name)))?;
            constraints.push((name.clone(), FilterValue::parse(name, field.kind, raw)?));
        }
        constraints.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(Self { constraints })
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.constraints.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Ordered sort keys. The store appends `id` as a final tie-breaker.
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    keys: Vec<(String, SortDirection)>,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::newest_first()
    }
}

impl SortSpec {
    /// `createdAt` descending.
    pub fn newest_first() -> Self {
        Self::by("createdAt", SortDirection::Desc)
    }

    pub fn by(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            keys: vec![(field.into(), direction)],
        }
    }

    /// Parses the `sort` query parameter.
    ///
    /// - absent or blank: newest first
    /// - a bare direction (`asc`, `-1`, ...): that direction on `default_field`
    /// - `field:dir,field:dir`, `field` (ascending) or `-field` (descending)
    pub fn parse(raw: Option<&str>, default_field: &str) -> Result<Self, AppError> {
        let raw = match raw.map(str::trim).filter(|r| !r.is_empty()) {
            Some(r) => r,
            None => return Ok(Self::newest_first()),
        };

        if let Some(direction) = SortDirection::parse(raw) {
            return Ok(Self::by(default_field, direction));
        }

        let mut keys = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let key = match part.split_once(':') {
                Some((field, dir)) => {
                    let direction = SortDirection::parse(dir).ok_or_else(|| {
                        AppError::Validation(format!("Invalid sort direction: {}", dir))
                    })?;
                    (field.trim().to_string(), direction)
                }
                None => match part.strip_prefix('-') {
                    Some(field) => (field.to_string(), SortDirection::Desc),
                    None => (part.to_string(), SortDirection::Asc),
                },
            };
            keys.push(key);
        }

        if keys.is_empty() {
            return Ok(Self::newest_first());
        }
        Ok(Self { keys })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SortDirection)> {
        self.keys.iter().map(|(k, d)| (k.as_str(), *d))
    }
}

/// Derived aggregate: count the rows of `from` whose `foreign_key` points at
/// each result, exposed as `as_field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinCount {
    pub from: &'static str,
    pub foreign_key: &'static str,
    pub as_field: &'static str,
}

/// Everything about a list request except the page window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub filter: Filter,
    pub sort: SortSpec,
    /// Public field names to return. `None` returns every field.
    pub projection: Option<Vec<String>>,
    pub aggregate: Option<JoinCount>,
}

impl ListQuery {
    /// Checks every referenced field against the collection's fields.
    pub fn validate(&self, fields: &[FieldSpec]) -> Result<(), AppError> {
        for (name, _) in self.filter.iter() {
            if find_field(fields, name).is_none() {
                return Err(AppError::Validation(format!("Unknown filter field: {}", name)));
            }
        }

        for (name, _) in self.sort.iter() {
            let derived = self.aggregate.is_some_and(|agg| agg.as_field == name);
            if !derived && find_field(fields, name).is_none() {
                return Err(AppError::Validation(format!("Unknown sort field: {}", name)));
            }
        }

        if let Some(projection) = &self.projection {
            for name in projection {
                if find_field(fields, name).is_none() {
                    return Err(AppError::Validation(format!("Unknown field: {}", name)));
                }
            }
        }

        Ok(())
    }

    /// Parses the comma separated `fields` parameter.
    pub fn parse_projection(raw: Option<&str>) -> Option<Vec<String>> {
        let fields: Vec<String> = raw?
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();
        if fields.is_empty() {
            None
        } else {
            Some(fields)
        }
    }
}

/// The page window. Both values are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Parses raw query values. Absent, non-numeric or non-positive values
    /// fall back to page 1 and the configured default limit; the limit is
    /// capped at `max_limit`.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>, config: &PaginationConfig) -> Self {
        let parse = |raw: Option<&str>| {
            raw.and_then(|r| r.trim().parse::<i64>().ok())
                .filter(|n| *n >= 1)
                .map(|n| n.min(u32::MAX as i64) as u32)
        };

        let page = parse(page).unwrap_or(1);
        let limit = parse(limit)
            .unwrap_or(config.default_limit)
            .min(config.max_limit);

        Self::new(page, limit)
    }

    /// Rows to skip before the slice starts.
    pub fn skip(&self) -> u64 {
        (u64::from(self.page) - 1) * u64::from(self.limit)
    }
}

/// The pagination envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub page: u32,
    pub limit: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, total_count: u64, request: &PageRequest) -> Self {
        let total_pages = total_count.div_ceil(u64::from(request.limit));
        Self {
            page: request.page,
            limit: request.limit,
            total_count,
            total_pages,
            has_next_page: u64::from(request.page) < total_pages,
            has_prev_page: request.page > 1,
            results,
        }
    }
}

/// A collection the pagination engine can read from.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    /// Fields that filters, sort keys and projections may name.
    fn fields(&self) -> &[FieldSpec];

    /// Reads at most `limit` rows after skipping `skip`, honoring the filter,
    /// sort, projection and aggregate of `query`.
    async fn fetch_slice(
        &self,
        query: &ListQuery,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Self::Item>, AppError>;

    /// Counts every row matching `filter`, ignoring any aggregate join.
    async fn count(&self, filter: &Filter) -> Result<u64, AppError>;
}

/// Runs a list query and wraps the slice in a [`Page`].
///
/// Query-shape problems are reported as `Validation` before any read. Any
/// failure of the slice or count read becomes `QueryFailure`.
pub async fn paginate<S>(
    source: &S,
    query: &ListQuery,
    request: PageRequest,
) -> Result<Page<S::Item>, AppError>
where
    S: PageSource + ?Sized,
{
    query.validate(source.fields())?;

    let (results, total_count) = futures::try_join!(
        source.fetch_slice(query, request.skip(), u64::from(request.limit)),
        source.count(&query.filter),
    )
    .map_err(|e| {
        tracing::error!(page = request.page, limit = request.limit, "pagination failed: {}", e);
        AppError::QueryFailure(e.to_string())
    })?;

    Ok(Page::new(results, total_count, &request))
}
