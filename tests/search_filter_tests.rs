use blog_api::{
    models::{ArticleSearchParams, CategorySearchParams},
    search::{
        Clause, Column, Filter, MAX_PAGE_SIZE, Pagination, article_filter, category_filter,
        clamp_page_size,
    },
};
use sqlx::{QueryBuilder, Sqlite};

const NOW: i64 = 1_700_000_000;

fn render(filter: &Filter) -> String {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM articles a");
    filter.push_where(&mut builder);
    builder.sql().to_string()
}

// --- Filter combinator ---

#[test]
fn test_empty_filter_renders_no_where() {
    let filter = Filter::new();
    assert!(filter.is_empty());
    assert_eq!(render(&filter), "SELECT * FROM articles a");
}

#[test]
fn test_clauses_are_joined_with_and() {
    let filter = Filter::new()
        .and(Clause::Contains {
            column: Column::ArticleTitle,
            needle: "rust".to_string(),
        })
        .and(Clause::Equals {
            column: Column::ArticleCategory,
            value: 3,
        })
        .and(Clause::Between {
            column: Column::ArticleCreatedAt,
            min: 1,
            max: 2,
        });

    assert_eq!(
        render(&filter),
        "SELECT * FROM articles a WHERE a.title LIKE ? ESCAPE '\\' AND a.category_id = ? \
         AND a.created_at BETWEEN ? AND ?"
    );
}

#[test]
fn test_and_if_skips_absent_clauses() {
    let filter = Filter::new()
        .and_if(false, || Clause::Equals {
            column: Column::ArticlePublisher,
            value: 1,
        })
        .and_if(true, || Clause::Equals {
            column: Column::ArticleCategory,
            value: 2,
        });

    assert_eq!(
        filter.clauses(),
        [Clause::Equals {
            column: Column::ArticleCategory,
            value: 2
        }]
    );
}

// --- Article search parameters ---

#[test]
fn test_default_article_params_match_everything() {
    let filter = article_filter(&ArticleSearchParams::default(), NOW);
    assert!(filter.is_empty());
}

#[test]
fn test_article_params_build_expected_clauses() {
    let params = ArticleSearchParams {
        title: "rust".to_string(),
        publisher_id: 4,
        ..ArticleSearchParams::default()
    };

    assert_eq!(
        article_filter(&params, NOW).clauses(),
        [
            Clause::Contains {
                column: Column::ArticleTitle,
                needle: "rust".to_string()
            },
            Clause::Equals {
                column: Column::ArticlePublisher,
                value: 4
            },
        ]
    );
}

#[test]
fn test_min_date_alone_extends_to_now() {
    let params = ArticleSearchParams {
        min_date: NOW - 60,
        ..ArticleSearchParams::default()
    };

    assert_eq!(
        article_filter(&params, NOW).clauses(),
        [Clause::Between {
            column: Column::ArticleCreatedAt,
            min: NOW - 60,
            max: NOW + 1
        }]
    );
}

#[test]
fn test_max_date_alone_starts_at_epoch() {
    let params = ArticleSearchParams {
        max_date: NOW,
        ..ArticleSearchParams::default()
    };

    assert_eq!(
        article_filter(&params, NOW).clauses(),
        [Clause::Between {
            column: Column::ArticleCreatedAt,
            min: 0,
            max: NOW
        }]
    );
}

#[test]
fn test_category_params() {
    assert!(category_filter(&CategorySearchParams::default()).is_empty());

    let params = CategorySearchParams {
        name: "news".to_string(),
        ..CategorySearchParams::default()
    };
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM categories c");
    category_filter(&params).push_where(&mut builder);
    assert_eq!(
        builder.sql(),
        "SELECT * FROM categories c WHERE c.name LIKE ? ESCAPE '\\'"
    );
}

// --- Pagination ---

#[test]
fn test_pagination_offsets() {
    let page = Pagination::new(3, 10);
    assert_eq!(page.page(), 3);
    assert_eq!(page.limit(), 10);
    assert_eq!(page.offset(), 20);

    assert_eq!(Pagination::new(1, 25).offset(), 0);
}

#[test]
fn test_pagination_clamps_out_of_range_values() {
    let small = Pagination::new(0, 0);
    assert_eq!((small.page(), small.limit(), small.offset()), (1, 1, 0));

    let large = Pagination::new(2, 5_000);
    assert_eq!(large.limit(), MAX_PAGE_SIZE);
    assert_eq!(large.offset(), MAX_PAGE_SIZE);

    let negative = Pagination::new(-4, -1);
    assert_eq!((negative.page(), negative.limit()), (1, 1));
}

#[test]
fn test_offset_saturates_for_huge_pages() {
    let last = Pagination::new(i64::MAX, MAX_PAGE_SIZE);
    assert_eq!(last.offset(), i64::MAX);

    let far = Pagination::new(400_000_000_000_000_000, 100);
    assert_eq!(far.offset(), i64::MAX);

    // One row per page never overflows: offset is exactly page - 1.
    assert_eq!(Pagination::new(i64::MAX, 1).offset(), i64::MAX - 1);
}

#[test]
fn test_clamp_page_size() {
    assert_eq!(clamp_page_size(0), 1);
    assert_eq!(clamp_page_size(42), 42);
    assert_eq!(clamp_page_size(1000), MAX_PAGE_SIZE);
}

#[test]
fn test_push_limit_appends_binds() {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT 1");
    Pagination::new(2, 5).push_limit(&mut builder);
    assert_eq!(builder.sql(), "SELECT 1 LIMIT ? OFFSET ?");
}
