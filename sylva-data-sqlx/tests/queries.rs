mod common;

use common::{connect, data, ids, permits, regions, seed};
use serde_json::json;
use sylva_data::{DataError, FilterInput, QueryParams};

fn params(filter: Option<&str>, sort: Option<&str>, search: &str, limit: u64, offset: u64) -> QueryParams {
    QueryParams {
        filter: filter.map(str::to_string),
        sort: sort.map(str::to_string),
        search: search.to_string(),
        group_by: None,
        limit: Some(limit),
        offset,
    }
}

#[tokio::test]
async fn test_search_skips_soft_deleted_rows() {
    let mut conn = connect().await;
    seed(&mut conn, &[(1, "A", "Y", 2024, false), (2, "B", "N", 2024, true)]).await;

    let page = permits()
        .find_all(&mut conn, &params(None, None, "b", 100, 0))
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
    assert!(!page.has_more());
}

#[tokio::test]
async fn test_search_is_case_insensitive_across_columns() {
    let mut conn = connect().await;
    seed(&mut conn, &[(1, "Hutan Lestari", "Y", 2023, false), (2, "Kebun", "N", 2024, false)]).await;

    let page = permits()
        .find_all(&mut conn, &params(None, None, "lestari", 100, 0))
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![1]);

    // numeric columns are searched through their text form
    let page = permits()
        .find_all(&mut conn, &params(None, None, "2024", 100, 0))
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![2]);
}

#[tokio::test]
async fn test_find_all_defaults_to_id_order_without_deleted_rows() {
    let mut conn = connect().await;
    seed(
        &mut conn,
        &[(3, "C", "Y", 2024, false), (1, "A", "Y", 2024, false), (2, "B", "N", 2024, true)],
    )
    .await;

    let page = permits().find_all(&mut conn, &QueryParams::default()).await.unwrap();
    assert_eq!(ids(&page.items), vec![1, 3]);
    assert_eq!(page.total, 2);
    assert_eq!(page.limit, 100);
}

#[tokio::test]
async fn test_filtering_on_the_marker_shows_deleted_rows() {
    let mut conn = connect().await;
    seed(&mut conn, &[(1, "A", "Y", 2024, false), (2, "B", "N", 2024, true)]).await;

    let page = permits()
        .find_all(&mut conn, &params(Some("is_deleted=true"), None, "", 100, 0))
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![2]);
    assert!(page.items[0].is_deleted);
}

#[tokio::test]
async fn test_or_groups_and_with_flat_filters() {
    let mut conn = connect().await;
    seed(
        &mut conn,
        &[
            (1, "A", "Y", 2024, false),
            (2, "B", "N", 2024, false),
            (3, "C", "X", 2024, false),
            (4, "D", "Y", 2023, false),
        ],
    )
    .await;

    let filter = r#"[["status=Y","status=N"],"year=2024"]"#;
    let page = permits()
        .find_all(&mut conn, &params(Some(filter), None, "", 100, 0))
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![1, 2]);
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn test_comparison_operators_and_sorting() {
    let mut conn = connect().await;
    seed(
        &mut conn,
        &[
            (1, "A", "Y", 2020, false),
            (2, "B", "Y", 2022, false),
            (3, "C", "N", 2024, false),
        ],
    )
    .await;

    let repo = permits();
    let page = repo
        .find_page(&mut conn, repo.query().filter("year>=2021").sort("year:desc"))
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![3, 2]);

    let page = repo
        .find_page(&mut conn, repo.query().filter("year<=2022").filter("status!=N"))
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![1, 2]);

    let page = repo
        .find_page(&mut conn, repo.query().filter("id=3"))
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![3]);
}

#[tokio::test]
async fn test_page_window_and_has_more() {
    let mut conn = connect().await;
    let rows: Vec<_> = (1..=5).map(|i| (i, "P", "Y", 2024, false)).collect();
    seed(&mut conn, &rows).await;

    let repo = permits();
    let mut seen = Vec::new();
    for (offset, expect_more) in [(0, true), (2, true), (4, false)] {
        let page = repo
            .find_all(&mut conn, &params(None, Some("id:asc"), "", 2, offset))
            .await
            .unwrap();
        assert!(page.items.len() <= 2);
        assert_eq!(page.total, 5);
        assert_eq!(page.has_more(), expect_more, "offset {offset}");
        seen.extend(ids(&page.items));
    }
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_zero_limit_returns_everything() {
    let mut conn = connect().await;
    let rows: Vec<_> = (1..=4).map(|i| (i, "P", "Y", 2024, false)).collect();
    seed(&mut conn, &rows).await;

    let repo = permits();
    let page = repo
        .find_all(&mut conn, &params(None, None, "", 0, 0))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 4);
    assert!(page.has_more(), "4 > 0 + 0");

    let page = repo
        .find_all(&mut conn, &params(None, None, "", 0, 1))
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![2, 3, 4]);
    assert_eq!(page.total, 4);
    assert!(page.has_more(), "4 > 1 + 0");
}

#[tokio::test]
async fn test_group_by_counts_groups() {
    let mut conn = connect().await;
    seed(
        &mut conn,
        &[
            (1, "A", "Y", 2024, false),
            (2, "B", "Y", 2024, false),
            (3, "C", "N", 2024, false),
        ],
    )
    .await;

    let query = QueryParams {
        group_by: Some("status".into()),
        ..QueryParams::default()
    };
    let page = permits().find_all(&mut conn, &query).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 2);
}

#[tokio::test]
async fn test_count_applies_filters_and_soft_delete() {
    let mut conn = connect().await;
    seed(
        &mut conn,
        &[(1, "A", "Y", 2024, false), (2, "B", "Y", 2024, true), (3, "C", "N", 2024, false)],
    )
    .await;

    let repo = permits();
    assert_eq!(repo.count(&mut conn, Vec::new()).await.unwrap(), 2);
    assert_eq!(
        repo.count(&mut conn, vec![FilterInput::from("status=Y")]).await.unwrap(),
        1
    );
    assert_eq!(
        repo.count(&mut conn, vec![FilterInput::from("is_deleted=true")]).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_record_type_without_marker_lists_everything() {
    let mut conn = connect().await;
    let repo = regions();
    for (id, name) in [(1, "Jawa"), (2, "Sumatra")] {
        repo.create(&mut conn, &data(json!({"id": id, "name": name})))
            .await
            .unwrap();
    }

    let page = repo
        .find_page(&mut conn, repo.query().search("JAWA"))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "Jawa");
}

#[tokio::test]
async fn test_invalid_tokens_fail_before_touching_the_database() {
    let mut conn = connect().await;
    let repo = permits();

    let err = repo
        .find_all(&mut conn, &params(Some("owner=me"), None, "", 100, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::Validation(_)));

    let err = repo
        .find_all(&mut conn, &params(None, Some("name"), "", 100, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::Syntax(_)));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_repository_takes_page_size_from_config() {
    let yaml = "sylva:\n  data:\n    page:\n      limit: 2\n";
    let config = sylva_core::SylvaConfig::from_yaml_str(yaml, "test").unwrap();
    let repo = sylva_data_sqlx::SqlxRepository::<common::Permit>::from_config(&config).unwrap();
    assert_eq!(repo.config().default_limit, 2);

    let mut conn = connect().await;
    seed(
        &mut conn,
        &[(1, "A", "Y", 2024, false), (2, "B", "Y", 2024, false), (3, "C", "Y", 2024, false)],
    )
    .await;
    let page = repo.find_page(&mut conn, repo.query()).await.unwrap();
    assert_eq!(ids(&page.items), vec![1, 2]);
    assert!(page.has_more());

    let page = repo.find_all(&mut conn, &QueryParams::default()).await.unwrap();
    assert_eq!(page.limit, 2);
    assert_eq!(ids(&page.items), vec![1, 2]);
}
