use sqlx::{QueryBuilder, Sqlite};

use crate::models::{ArticleSearchParams, CategorySearchParams};

pub const MIN_PAGE_SIZE: i64 = 1;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Column
///
/// The searchable columns. Only these names are ever spliced into SQL, every
/// value goes through a bind parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    ArticleTitle,
    ArticleText,
    ArticleCategory,
    ArticlePublisher,
    ArticleCreatedAt,
    CategoryName,
}

impl Column {
    /// Qualified column name, matching the aliases used by the repository queries.
    pub fn as_sql(self) -> &'static str {
        match self {
            Column::ArticleTitle => "a.title",
            Column::ArticleText => "a.text",
            Column::ArticleCategory => "a.category_id",
            Column::ArticlePublisher => "a.publisher_id",
            Column::ArticleCreatedAt => "a.created_at",
            Column::CategoryName => "c.name",
        }
    }
}

/// One condition of a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Case-insensitive substring match. SQLite's `LIKE` only folds ASCII
    /// letters, so `É` and `é` are still distinct.
    Contains { column: Column, needle: String },
    Equals { column: Column, value: i64 },
    /// Inclusive on both ends.
    Between { column: Column, min: i64, max: i64 },
}

/// Filter
///
/// A conjunction of clauses. The empty filter matches everything and renders
/// no `WHERE` at all; each `and` narrows it further. There is no `OR` and no
/// grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Adds the clause only when `present` holds; absent filters leave no trace.
    pub fn and_if(self, present: bool, clause: impl FnOnce() -> Clause) -> Self {
        if present { self.and(clause()) } else { self }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Appends ` WHERE ... AND ...` to the builder, binding every value.
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        for (i, clause) in self.clauses.iter().enumerate() {
            builder.push(if i == 0 { " WHERE " } else { " AND " });
            match clause {
                Clause::Contains { column, needle } => {
                    builder
                        .push(column.as_sql())
                        .push(" LIKE ")
                        .push_bind(like_pattern(needle))
                        .push(" ESCAPE '\\'");
                }
                Clause::Equals { column, value } => {
                    builder.push(column.as_sql()).push(" = ").push_bind(*value);
                }
                Clause::Between { column, min, max } => {
                    builder
                        .push(column.as_sql())
                        .push(" BETWEEN ")
                        .push_bind(*min)
                        .push(" AND ")
                        .push_bind(*max);
                }
            }
        }
    }
}

/// `%needle%` with LIKE wildcards in the needle escaped.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// article_filter
///
/// Text filters apply when non-empty, id filters when non-zero. The date range
/// applies when either bound is set; a missing upper bound becomes `now + 1`
/// so rows created in the current second still match.
pub fn article_filter(params: &ArticleSearchParams, now: i64) -> Filter {
    let date_range = params.min_date != 0 || params.max_date != 0;
    let max = if params.max_date != 0 {
        params.max_date
    } else {
        now + 1
    };

    Filter::new()
        .and_if(!params.title.is_empty(), || Clause::Contains {
            column: Column::ArticleTitle,
            needle: params.title.clone(),
        })
        .and_if(!params.text.is_empty(), || Clause::Contains {
            column: Column::ArticleText,
            needle: params.text.clone(),
        })
        .and_if(params.category_id != 0, || Clause::Equals {
            column: Column::ArticleCategory,
            value: params.category_id,
        })
        .and_if(params.publisher_id != 0, || Clause::Equals {
            column: Column::ArticlePublisher,
            value: params.publisher_id,
        })
        .and_if(date_range, || Clause::Between {
            column: Column::ArticleCreatedAt,
            min: params.min_date,
            max,
        })
}

pub fn category_filter(params: &CategorySearchParams) -> Filter {
    Filter::new().and_if(!params.name.is_empty(), || Clause::Contains {
        column: Column::CategoryName,
        needle: params.name.clone(),
    })
}

/// `page_size` forced into [1, 100].
pub fn clamp_page_size(page_size: i64) -> i64 {
    page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE)
}

/// Pagination
///
/// Normalised `page`/`page_size`: the size is clamped to [1, 100] and the
/// page floored at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    page_size: i64,
}

impl Pagination {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: page.max(1),
            page_size: clamp_page_size(page_size),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// Saturates instead of overflowing, so an absurd `page` reads past the
    /// last row and yields an empty page.
    pub fn offset(&self) -> i64 {
        self.page_size.saturating_mul(self.page - 1)
    }

    pub fn push_limit(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        builder
            .push(" LIMIT ")
            .push_bind(self.limit())
            .push(" OFFSET ")
            .push_bind(self.offset());
    }
}
