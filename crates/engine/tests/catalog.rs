use chrono::Utc;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use engine::{Engine, EngineError, Grams, Ingredient, IngredientKind};
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

fn ingredient(kind: IngredientKind, name: &str, ratio_g: i64) -> Ingredient {
    Ingredient::new(kind, name.to_string(), Grams::new(ratio_g), None)
}

#[tokio::test]
async fn create_computes_consumption_and_rejects_duplicates() {
    let (engine, _db) = engine_with_db().await;

    let formula = engine
        .new_formula(
            "EPDM-60",
            10,
            vec![
                ingredient(IngredientKind::Rubber, "EPDM", 5_000),
                ingredient(IngredientKind::Chemical, "Zinc Oxide", 1_000),
            ],
            Grams::new(6_000),
        )
        .await
        .unwrap();

    assert_eq!(formula.ingredients[0].consumption_g, Some(Grams::new(50_000)));
    assert_eq!(formula.ingredients[1].consumption_g, Some(Grams::new(10_000)));

    let err = engine
        .new_formula(
            " epdm-60 ",
            5,
            vec![ingredient(IngredientKind::Rubber, "EPDM", 1_000)],
            Grams::new(1_000),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateName(_)));
}

#[tokio::test]
async fn create_rejects_invalid_ingredients() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .new_formula("Empty", 10, Vec::new(), Grams::new(1_000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidIngredients(_)));

    let err = engine
        .new_formula(
            "Mismatch",
            10,
            vec![ingredient(IngredientKind::Rubber, "EPDM", 5_000)],
            Grams::new(4_000),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidIngredients(_)));

    let err = engine
        .new_formula(
            "NoWeight",
            10,
            vec![ingredient(IngredientKind::Rubber, "EPDM", 5_000)],
            Grams::ZERO,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidIngredients(_)));
}

#[tokio::test]
async fn update_replaces_ingredients_and_keeps_total_weight() {
    let (engine, db) = engine_with_db().await;

    let formula = engine
        .new_formula(
            "EPDM-60",
            10,
            vec![ingredient(IngredientKind::Rubber, "EPDM", 5_000)],
            Grams::new(5_000),
        )
        .await
        .unwrap();

    let updated = engine
        .update_formula(
            formula.id,
            "NBR-70",
            vec![
                ingredient(IngredientKind::Rubber, "NBR", 2_000),
                ingredient(IngredientKind::Chemical, "Sulphur", 500),
            ],
        )
        .await
        .unwrap();

    // Total weight stays frozen even though the new ratios sum to 2.5kg.
    assert_eq!(updated.total_weight_g, Grams::new(5_000));
    assert_eq!(updated.name, "NBR-70");
    assert_eq!(updated.ingredients.len(), 2);
    assert_eq!(updated.ingredients[0].consumption_g, Some(Grams::new(20_000)));
    assert_eq!(updated.ingredients[1].consumption_g, Some(Grams::new(5_000)));

    // The update survives a reload.
    let reloaded = Engine::builder().database(db).build().await.unwrap();
    let formula = reloaded.formula(formula.id).await.unwrap();
    assert_eq!(formula.name, "NBR-70");
    assert_eq!(formula.ingredients.len(), 2);
    assert_eq!(formula.total_weight_g, Grams::new(5_000));
}

#[tokio::test]
async fn update_and_delete_unknown_formula_fail() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .update_formula(
            Uuid::new_v4(),
            "Ghost",
            vec![ingredient(IngredientKind::Rubber, "EPDM", 1_000)],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    let err = engine.delete_formula(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn delete_removes_formula() {
    let (engine, _db) = engine_with_db().await;

    let formula = engine
        .new_formula(
            "EPDM-60",
            10,
            vec![ingredient(IngredientKind::Rubber, "EPDM", 5_000)],
            Grams::new(5_000),
        )
        .await
        .unwrap();

    let deleted = engine.delete_formula(formula.id).await.unwrap();
    assert_eq!(deleted.id, formula.id);

    let err = engine.formula(formula.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    assert!(engine.formulas().await.is_empty());
}
