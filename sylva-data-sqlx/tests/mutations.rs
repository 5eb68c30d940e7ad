mod common;

use common::{connect, data, ids, permits, pool, regions, seed};
use serde_json::json;
use sylva_data::{ColumnType, DataConfig, DataError, FilterInput, QueryParams, RecordDescriptor};
use sylva_data_sqlx::{mutation, SqlxRepository, Tx};

#[tokio::test]
async fn test_create_returns_stored_row_with_nulls() {
    let mut conn = connect().await;
    let permit = permits()
        .create(&mut conn, &data(json!({"id": 7, "name": "A", "status": null})))
        .await
        .unwrap();
    assert_eq!(permit.id, 7);
    assert_eq!(permit.name.as_deref(), Some("A"));
    assert_eq!(permit.status, None);
    assert!(!permit.is_deleted);
}

#[tokio::test]
async fn test_create_duplicate_is_constraint_error() {
    let mut conn = connect().await;
    let repo = permits();
    repo.create(&mut conn, &data(json!({"id": 1}))).await.unwrap();
    let err = repo.create(&mut conn, &data(json!({"id": 1}))).await.unwrap_err();
    assert!(err.is_constraint(), "{err}");
}

#[tokio::test]
async fn test_create_rejects_unknown_columns() {
    let mut conn = connect().await;
    let err = permits()
        .create(&mut conn, &data(json!({"id": 1, "owner": "x"})))
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::Validation(_)));
}

#[tokio::test]
async fn test_update_strips_null_values() {
    let mut conn = connect().await;
    seed(&mut conn, &[(1, "A", "Y", 2024, false)]).await;

    let updated = permits()
        .update(&mut conn, &1, &data(json!({"name": "Z", "status": null})))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name.as_deref(), Some("Z"));
    assert_eq!(updated.status.as_deref(), Some("Y"));
    assert_eq!(updated.year, Some(2024));
}

#[tokio::test]
async fn test_update_with_only_nulls_returns_current_row() {
    let mut conn = connect().await;
    seed(&mut conn, &[(1, "A", "Y", 2024, false)]).await;

    let current = permits()
        .update(&mut conn, &1, &data(json!({"name": null})))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.name.as_deref(), Some("A"));
}

#[tokio::test]
async fn test_update_missing_row() {
    let mut conn = connect().await;
    let repo = permits();
    let result = repo
        .update(&mut conn, &99, &data(json!({"name": "Z"})))
        .await
        .unwrap();
    assert!(result.is_none());

    let err = repo
        .update_existing(&mut conn, &99, &data(json!({"name": "Z"})))
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::NotFound(_)));
}

#[tokio::test]
async fn test_update_only_skips_refresh() {
    let mut conn = connect().await;
    seed(&mut conn, &[(1, "A", "Y", 2024, false)]).await;

    let repo = permits();
    repo.update_only(&mut conn, &1, &data(json!({"year": 2025})))
        .await
        .unwrap();
    let permit = repo.require_by_id(&mut conn, &1).await.unwrap();
    assert_eq!(permit.year, Some(2025));
}

#[tokio::test]
async fn test_soft_delete_hides_row() {
    let mut conn = connect().await;
    seed(&mut conn, &[(1, "A", "Y", 2024, false), (2, "B", "N", 2024, false)]).await;

    let repo = permits();
    assert!(repo.exists(&mut conn, &1).await.unwrap());
    assert!(repo.delete(&mut conn, &1, false).await.unwrap());

    assert!(!repo.exists(&mut conn, &1).await.unwrap());
    assert!(repo.find_by_id(&mut conn, &1).await.unwrap().is_none());
    assert!(matches!(
        repo.require_by_id(&mut conn, &1).await,
        Err(DataError::NotFound(_))
    ));
    let page = repo.find_all(&mut conn, &QueryParams::default()).await.unwrap();
    assert_eq!(ids(&page.items), vec![2]);

    // the row is still stored, only marked
    let marked = repo
        .find_page(&mut conn, repo.query().filter("is_deleted=true"))
        .await
        .unwrap();
    assert_eq!(ids(&marked.items), vec![1]);

    // a second soft delete no longer finds it
    assert!(matches!(
        repo.delete(&mut conn, &1, false).await,
        Err(DataError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_permanent_delete_removes_row() {
    let mut conn = connect().await;
    seed(&mut conn, &[(1, "A", "Y", 2024, false)]).await;

    let repo = permits();
    assert!(repo.delete(&mut conn, &1, true).await.unwrap());
    assert!(!repo.delete(&mut conn, &1, true).await.unwrap());
    assert_eq!(repo.count(&mut conn, vec![FilterInput::from("is_deleted=true")]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_without_marker_is_hard() {
    let mut conn = connect().await;
    let repo = regions();
    repo.create(&mut conn, &data(json!({"id": 1, "name": "Jawa"})))
        .await
        .unwrap();

    assert!(repo.delete(&mut conn, &1, false).await.unwrap());
    assert!(!repo.exists(&mut conn, &1).await.unwrap());
    assert!(!repo.delete(&mut conn, &1, false).await.unwrap());
}

fn five_records(last_id: i64) -> Vec<sylva_data_sqlx::RecordData> {
    [1, 2, 3, 4, last_id]
        .into_iter()
        .map(|id| data(json!({"id": id, "name": format!("P{id}"), "status": "Y"})))
        .collect()
}

#[tokio::test]
async fn test_bulk_create_in_batches() {
    let mut conn = connect().await;
    let repo = permits();

    let created = repo
        .bulk_create_batched(&mut conn, &five_records(5), 2, true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ids(&created), vec![1, 2, 3, 4, 5]);
    assert_eq!(created[4].name.as_deref(), Some("P5"));
}

#[tokio::test]
async fn test_bulk_create_without_records() {
    let mut conn = connect().await;
    let repo = permits();

    let result = repo
        .bulk_create_batched(&mut conn, &five_records(5), 2, false)
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(repo.count(&mut conn, Vec::new()).await.unwrap(), 5);
}

#[tokio::test]
async fn test_failed_batch_keeps_earlier_batches() {
    let mut conn = connect().await;
    let repo = permits();

    // the fifth record reuses id 1, so the third batch (index 2) fails
    let err = repo
        .bulk_create_batched(&mut conn, &five_records(1), 2, false)
        .await
        .unwrap_err();
    match &err {
        DataError::BatchFailed {
            batch,
            committed,
            source,
        } => {
            assert_eq!(*batch, 2);
            assert_eq!(*committed, 4);
            assert!(source.is_constraint());
        }
        other => panic!("expected BatchFailed, got {other}"),
    }
    assert!(err.is_constraint());
    assert_eq!(repo.count(&mut conn, Vec::new()).await.unwrap(), 4);
}

#[tokio::test]
async fn test_bulk_create_validates_everything_first() {
    let mut conn = connect().await;
    let repo = permits();

    let mut records = five_records(5);
    records[4].insert("owner".into(), json!("x"));
    let err = repo
        .bulk_create_batched(&mut conn, &records, 2, false)
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::Validation(_)));
    assert_eq!(repo.count(&mut conn, Vec::new()).await.unwrap(), 0);

    let err = repo
        .bulk_create_batched(&mut conn, &five_records(5), 0, false)
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::Validation(_)));
}

#[tokio::test]
async fn test_bulk_create_empty_input() {
    let mut conn = connect().await;
    let repo = permits();
    assert_eq!(repo.bulk_create(&mut conn, &[], true).await.unwrap(), Some(Vec::new()));
    assert_eq!(repo.bulk_create(&mut conn, &[], false).await.unwrap(), None);
}

#[tokio::test]
async fn test_configured_batch_size_is_used() {
    let mut conn = connect().await;
    let repo = SqlxRepository::<common::Permit>::with_config(DataConfig {
        bulk_batch_size: 2,
        ..DataConfig::default()
    })
    .unwrap();

    let err = repo
        .bulk_create(&mut conn, &five_records(1), false)
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::BatchFailed { batch: 2, committed: 4, .. }));
}

#[tokio::test]
async fn test_bulk_create_wide_table_with_default_batch() {
    let mut conn = connect().await;
    let columns: Vec<String> = (0..40).map(|i| format!("c{i}")).collect();
    let ddl = format!(
        "CREATE TABLE wide ({})",
        columns
            .iter()
            .map(|c| format!("{c} INTEGER"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    sqlx::query(&ddl).execute(&mut conn).await.unwrap();

    let descriptor = columns
        .iter()
        .fold(RecordDescriptor::builder("wide").id_column("c0"), |b, c| {
            b.column(c, ColumnType::Integer)
        })
        .build()
        .unwrap();
    let records: Vec<_> = (0..1000)
        .map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(i, c)| (c.clone(), json!(row * 40 + i)))
                .collect::<sylva_data_sqlx::RecordData>()
        })
        .collect();

    let result = mutation::bulk_create::<common::Permit>(
        &mut conn,
        &descriptor,
        &records,
        DataConfig::default().bulk_batch_size,
        false,
    )
    .await
    .unwrap();
    assert!(result.is_none());

    let total = sqlx::query_scalar::<sqlx::Any, i64>("SELECT COUNT(*) FROM wide")
        .fetch_one(&mut conn)
        .await
        .unwrap();
    assert_eq!(total, 1000);
}

#[tokio::test]
async fn test_rolled_back_transaction_discards_engine_writes() {
    let pool = pool().await;
    let repo = permits();

    let mut tx = Tx::begin(&pool).await.unwrap();
    repo.create(tx.as_mut(), &data(json!({"id": 1, "name": "A"})))
        .await
        .unwrap();
    repo.bulk_create_batched(tx.as_mut(), &five_records(6)[1..], 2, false)
        .await
        .unwrap();
    assert_eq!(repo.count(tx.as_mut(), Vec::new()).await.unwrap(), 5);
    tx.rollback().await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(repo.count(&mut *conn, Vec::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_committed_transaction_keeps_engine_writes() {
    let pool = pool().await;
    let repo = permits();

    let mut tx = Tx::begin(&pool).await.unwrap();
    repo.create(tx.as_mut(), &data(json!({"id": 1, "name": "A"})))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    assert!(repo.exists(&mut *conn, &1).await.unwrap());
}
