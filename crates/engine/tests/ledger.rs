use std::sync::Arc;

use chrono::Utc;
use sea_orm::{Database, DatabaseConnection};

use engine::{Engine, EngineError, Grams, MaterialCategory};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

#[tokio::test]
async fn outward_posting_reduces_balance() {
    let (engine, _db) = engine_with_db().await;

    let epdm = engine
        .new_material(
            "EPDM",
            MaterialCategory::Rubber,
            Some(Grams::new(100_000)),
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(epdm.balance_g, Grams::new(100_000));

    let entry = engine
        .record(
            epdm.id,
            Grams::ZERO,
            Grams::new(30_000),
            "Order A",
            None,
            Utc::now(),
        )
        .await
        .unwrap();

    assert_eq!(entry.inward_g, Grams::ZERO);
    assert_eq!(entry.outward_g, Grams::new(30_000));
    assert_eq!(entry.balance_g, Grams::new(70_000));
    assert_eq!(engine.balance(epdm.id).await.unwrap(), Grams::new(70_000));
}

#[tokio::test]
async fn balance_is_sum_of_history() {
    let (engine, _db) = engine_with_db().await;

    let material = engine
        .new_material("Carbon Black", MaterialCategory::Chemical, None, Utc::now())
        .await
        .unwrap();

    let postings: [(i64, i64); 4] = [(10_000, 0), (0, 4_000), (2_500, 0), (0, 12_000)];
    for (inward, outward) in postings {
        engine
            .record(
                material.id,
                Grams::new(inward),
                Grams::new(outward),
                "Adjustment",
                None,
                Utc::now(),
            )
            .await
            .unwrap();
    }

    let expected: i64 = postings.iter().map(|(inward, outward)| inward - outward).sum();
    assert_eq!(engine.balance(material.id).await.unwrap().grams(), expected);

    let material = engine.material(material.id).await.unwrap();
    assert_eq!(material.entries.len(), postings.len());
    assert!(material.is_reconciled());
    // The ledger has no floor: the last posting overdraws.
    assert!(material.balance_g.is_negative());
}

#[tokio::test]
async fn invalid_transactions_are_rejected() {
    let (engine, _db) = engine_with_db().await;

    let material = engine
        .new_material("EPDM", MaterialCategory::Rubber, None, Utc::now())
        .await
        .unwrap();

    let err = engine
        .record(material.id, Grams::ZERO, Grams::ZERO, "Nothing", None, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransaction(_)));

    let err = engine
        .record(
            material.id,
            Grams::new(-1_000),
            Grams::ZERO,
            "Negative",
            None,
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransaction(_)));

    let err = engine
        .record(
            uuid::Uuid::new_v4(),
            Grams::new(1_000),
            Grams::ZERO,
            "Ghost",
            None,
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    // Nothing was appended by the rejected postings.
    let material = engine.material(material.id).await.unwrap();
    assert!(material.entries.is_empty());
    assert_eq!(material.balance_g, Grams::ZERO);
}

#[tokio::test]
async fn history_is_restartable_and_survives_reload() {
    let (engine, db) = engine_with_db().await;

    let material = engine
        .new_material(
            "EPDM",
            MaterialCategory::Rubber,
            Some(Grams::new(20_000)),
            Utc::now(),
        )
        .await
        .unwrap();
    engine
        .record(
            material.id,
            Grams::ZERO,
            Grams::new(5_000),
            "Order B",
            Some("night shift".to_string()),
            Utc::now(),
        )
        .await
        .unwrap();

    // Re-reading returns the same sequence until a new record call.
    let first = engine.material(material.id).await.unwrap();
    let second = engine.material(material.id).await.unwrap();
    assert_eq!(first.entries, second.entries);

    // A fresh engine built from the same database sees the same ledger.
    let reloaded = Engine::builder().database(db).build().await.unwrap();
    let material = reloaded.material(material.id).await.unwrap();
    assert_eq!(material.entries.len(), 2);
    assert_eq!(material.balance_g, Grams::new(15_000));
    assert_eq!(material.entries[1].particulars, "Order B");
    assert_eq!(material.entries[1].remarks.as_deref(), Some("night shift"));
    assert!(material.is_reconciled());
}

#[tokio::test]
async fn duplicate_material_names_are_rejected() {
    let (engine, _db) = engine_with_db().await;

    engine
        .new_material("EPDM", MaterialCategory::Rubber, None, Utc::now())
        .await
        .unwrap();
    let err = engine
        .new_material(" epdm ", MaterialCategory::Rubber, None, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateName(_)));
}

#[tokio::test]
async fn category_filter_narrows_listing() {
    let (engine, _db) = engine_with_db().await;

    engine
        .new_material("EPDM", MaterialCategory::Rubber, None, Utc::now())
        .await
        .unwrap();
    engine
        .new_material("Zinc Oxide", MaterialCategory::Chemical, None, Utc::now())
        .await
        .unwrap();

    let all = engine.materials(None).await.unwrap();
    assert_eq!(all.len(), 2);

    let chemicals = engine.materials(Some("chemical")).await.unwrap();
    assert_eq!(chemicals.len(), 1);
    assert_eq!(chemicals[0].name, "Zinc Oxide");
}

#[tokio::test]
async fn concurrent_records_chain_off_each_other() {
    let (engine, _db) = engine_with_db().await;

    let material = engine
        .new_material(
            "EPDM",
            MaterialCategory::Rubber,
            Some(Grams::new(50_000)),
            Utc::now(),
        )
        .await
        .unwrap();
    let material_id = material.id;

    let engine = Arc::new(engine);
    let first = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move {
            engine
                .record(
                    material_id,
                    Grams::ZERO,
                    Grams::new(10_000),
                    "Order A",
                    None,
                    Utc::now(),
                )
                .await
        }
    });
    let second = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move {
            engine
                .record(
                    material_id,
                    Grams::ZERO,
                    Grams::new(20_000),
                    "Order B",
                    None,
                    Utc::now(),
                )
                .await
        }
    });

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    // Both postings applied, whatever their arrival order.
    assert_eq!(engine.balance(material_id).await.unwrap(), Grams::new(20_000));

    let material = engine.material(material_id).await.unwrap();
    assert_eq!(material.entries.len(), 3);
    // The later entry chained off the earlier one, not off the opening 50kg.
    let mid = material.entries[1].balance_g;
    let last = &material.entries[2];
    assert!(mid == Grams::new(40_000) || mid == Grams::new(30_000));
    assert_eq!(last.balance_g, mid - last.outward_g);
    assert_eq!(last.balance_g, Grams::new(20_000));
    assert!(material.is_reconciled());
}
