//! Collection descriptors and the PostgreSQL [`PageSource`].
//!
//! Every list endpoint reads through [`PgCollection`]. Rows come back as
//! JSON objects built with `jsonb_build_object`, keyed by the public field
//! names, so projections need no per-entity row type.
//!
//! Only identifiers from the static descriptors below are spliced into SQL.
//! Every user-supplied value is bound.

use async_trait::async_trait;
use jobboard_core::error::AppError;
use jobboard_core::pagination::{
    find_field, FieldKind, FieldSpec, Filter, FilterValue, JoinCount, ListQuery, PageSource,
    SortDirection,
};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};

/// A table the pagination engine can list.
#[derive(Debug)]
pub struct Collection {
    pub table: &'static str,
    pub fields: &'static [FieldSpec],
    /// Field that a bare `sort=asc|desc` applies to.
    pub default_sort_field: &'static str,
    /// Job totals join, for parents of jobs.
    pub job_totals: Option<JoinCount>,
}

pub static JOBS: Collection = Collection {
    table: "jobs",
    fields: &[
        FieldSpec::new("id", "id", FieldKind::Id),
        FieldSpec::new("title", "title", FieldKind::Text),
        FieldSpec::new("description", "description", FieldKind::Text),
        FieldSpec::new("location", "location", FieldKind::Text),
        FieldSpec::new("salary", "salary", FieldKind::Number),
        FieldSpec::new("category", "category_id", FieldKind::Id),
        FieldSpec::new("company", "company_id", FieldKind::Id),
        FieldSpec::new("jobType", "job_type_id", FieldKind::Id),
        FieldSpec::new("createdBy", "created_by", FieldKind::Id),
        FieldSpec::new("createdAt", "created_at", FieldKind::Timestamp),
        FieldSpec::new("updatedAt", "updated_at", FieldKind::Timestamp),
    ],
    default_sort_field: "createdAt",
    job_totals: None,
};

pub static CATEGORIES: Collection = Collection {
    table: "categories",
    fields: &[
        FieldSpec::new("id", "id", FieldKind::Id),
        FieldSpec::new("name", "name", FieldKind::Text),
        FieldSpec::new("description", "description", FieldKind::Text),
        FieldSpec::new("createdBy", "created_by", FieldKind::Id),
        FieldSpec::new("jobCount", "job_count", FieldKind::Number),
        FieldSpec::new("createdAt", "created_at", FieldKind::Timestamp),
        FieldSpec::new("updatedAt", "updated_at", FieldKind::Timestamp),
    ],
    default_sort_field: "name",
    job_totals: Some(JoinCount {
        from: "jobs",
        foreign_key: "category_id",
        as_field: "jobsTotal",
    }),
};

pub static COMPANIES: Collection = Collection {
    table: "companies",
    fields: &[
        FieldSpec::new("id", "id", FieldKind::Id),
        FieldSpec::new("name", "name", FieldKind::Text),
        FieldSpec::new("description", "description", FieldKind::Text),
        FieldSpec::new("website", "website", FieldKind::Text),
        FieldSpec::new("logo", "logo", FieldKind::Text),
        FieldSpec::new("createdBy", "created_by", FieldKind::Id),
        FieldSpec::new("jobCount", "job_count", FieldKind::Number),
        FieldSpec::new("createdAt", "created_at", FieldKind::Timestamp),
        FieldSpec::new("updatedAt", "updated_at", FieldKind::Timestamp),
    ],
    default_sort_field: "name",
    job_totals: Some(JoinCount {
        from: "jobs",
        foreign_key: "company_id",
        as_field: "jobsTotal",
    }),
};

pub static JOB_TYPES: Collection = Collection {
    table: "job_types",
    fields: &[
        FieldSpec::new("id", "id", FieldKind::Id),
        FieldSpec::new("name", "name", FieldKind::Text),
        FieldSpec::new("description", "description", FieldKind::Text),
        FieldSpec::new("createdBy", "created_by", FieldKind::Id),
        FieldSpec::new("jobCount", "job_count", FieldKind::Number),
        FieldSpec::new("createdAt", "created_at", FieldKind::Timestamp),
        FieldSpec::new("updatedAt", "updated_at", FieldKind::Timestamp),
    ],
    default_sort_field: "name",
    job_totals: Some(JoinCount {
        from: "jobs",
        foreign_key: "job_type_id",
        as_field: "jobsTotal",
    }),
};

/// No `password_hash`: it can be neither listed, filtered nor sorted on.
pub static USERS: Collection = Collection {
    table: "users",
    fields: &[
        FieldSpec::new("id", "id", FieldKind::Id),
        FieldSpec::new("name", "name", FieldKind::Text),
        FieldSpec::new("email", "email", FieldKind::Text),
        FieldSpec::new("role", "role", FieldKind::Enum),
        FieldSpec::new("isActive", "is_active", FieldKind::Bool),
        FieldSpec::new("createdAt", "created_at", FieldKind::Timestamp),
        FieldSpec::new("updatedAt", "updated_at", FieldKind::Timestamp),
    ],
    default_sort_field: "name",
    job_totals: None,
};

pub static MEDIA: Collection = Collection {
    table: "media",
    fields: &[
        FieldSpec::new("id", "id", FieldKind::Id),
        FieldSpec::new("original", "original", FieldKind::Text),
        FieldSpec::new("thumbnail", "thumbnail", FieldKind::Text),
        FieldSpec::new("mobile", "mobile", FieldKind::Text),
        FieldSpec::new("tablet", "tablet", FieldKind::Text),
        FieldSpec::new("desktop", "desktop", FieldKind::Text),
        FieldSpec::new("kind", "kind", FieldKind::Enum),
        FieldSpec::new("createdAt", "created_at", FieldKind::Timestamp),
        FieldSpec::new("updatedAt", "updated_at", FieldKind::Timestamp),
    ],
    default_sort_field: "createdAt",
    job_totals: None,
};

/// Builds the page slice query. `query` must already be validated against
/// the collection's fields.
pub fn slice_query<'a>(
    collection: &Collection,
    query: &ListQuery,
    skip: u64,
    limit: u64,
) -> Result<QueryBuilder<'a, Postgres>, AppError> {
    let mut qb = QueryBuilder::new("SELECT jsonb_build_object(");

    let selected: Vec<&FieldSpec> = match &query.projection {
        Some(names) => {
            let mut picked = vec![field(collection, "id")?];
            for name in names {
                let spec = field(collection, name)?;
                if !picked.iter().any(|p| p.name == spec.name) {
                    picked.push(spec);
                }
            }
            picked
        }
        None => collection.fields.iter().collect(),
    };

    for (i, spec) in selected.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(format!("'{}', t.{}", spec.name, spec.column));
    }
    if let Some(agg) = &query.aggregate {
        qb.push(format!(", '{}', COUNT(j.id)", agg.as_field));
    }
    qb.push(format!(") AS doc FROM {} t", collection.table));

    if let Some(agg) = &query.aggregate {
        qb.push(format!(
            " LEFT JOIN {} j ON j.{} = t.id",
            agg.from, agg.foreign_key
        ));
    }

    push_filter(&mut qb, collection, &query.filter)?;

    if query.aggregate.is_some() {
        qb.push(" GROUP BY t.id");
    }

    qb.push(" ORDER BY ");
    for (name, direction) in query.sort.iter() {
        match &query.aggregate {
            Some(agg) if agg.as_field == name => qb.push("COUNT(j.id)"),
            _ => qb.push(format!("t.{}", field(collection, name)?.column)),
        };
        qb.push(" ").push(direction.as_sql()).push(", ");
    }
    qb.push("t.id ").push(SortDirection::Asc.as_sql());

    qb.push(" LIMIT ").push_bind(to_i64(limit));
    qb.push(" OFFSET ").push_bind(to_i64(skip));

    Ok(qb)
}

/// Builds the total count query. Joins never apply here.
pub fn count_query<'a>(
    collection: &Collection,
    filter: &Filter,
) -> Result<QueryBuilder<'a, Postgres>, AppError> {
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {} t", collection.table));
    push_filter(&mut qb, collection, filter)?;
    Ok(qb)
}

fn push_filter(
    qb: &mut QueryBuilder<'_, Postgres>,
    collection: &Collection,
    filter: &Filter,
) -> Result<(), AppError> {
    for (i, (name, value)) in filter.iter().enumerate() {
        let spec = field(collection, name)?;
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        if spec.kind == FieldKind::Enum {
            qb.push(format!("t.{}::text = ", spec.column));
        } else {
            qb.push(format!("t.{} = ", spec.column));
        }
        match value.clone() {
            FilterValue::Text(v) => qb.push_bind(v),
            FilterValue::Id(v) => qb.push_bind(v),
            FilterValue::Bool(v) => qb.push_bind(v),
            FilterValue::Number(v) => qb.push_bind(v),
            FilterValue::Timestamp(v) => qb.push_bind(v),
        };
    }
    Ok(())
}

fn field<'c>(collection: &'c Collection, name: &str) -> Result<&'c FieldSpec, AppError> {
    find_field(collection.fields, name).ok_or_else(|| {
        AppError::Validation(format!("Unknown field for {}: {}", collection.table, name))
    })
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// A [`Collection`] bound to a pool.
#[derive(Clone)]
pub struct PgCollection {
    pool: PgPool,
    collection: &'static Collection,
}

impl PgCollection {
    pub fn new(pool: PgPool, collection: &'static Collection) -> Self {
        Self { pool, collection }
    }

    pub fn collection(&self) -> &'static Collection {
        self.collection
    }
}

#[async_trait]
impl PageSource for PgCollection {
    type Item = Value;

    fn fields(&self) -> &[FieldSpec] {
        self.collection.fields
    }

    async fn fetch_slice(
        &self,
        query: &ListQuery,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Value>, AppError> {
        let mut qb = slice_query(self.collection, query, skip, limit)?;
        let docs = qb
            .build_query_scalar::<Value>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(docs)
    }

    async fn count(&self, filter: &Filter) -> Result<u64, AppError> {
        let mut qb = count_query(self.collection, filter)?;
        let total: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}
