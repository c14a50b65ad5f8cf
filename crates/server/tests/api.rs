use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn test_router() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = engine::Engine::builder().database(db).build().await.unwrap();
    server::router(server::ServerState {
        engine: Arc::new(engine),
    })
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn material_lifecycle() {
    let router = test_router().await;

    let (status, material) = send(
        &router,
        "POST",
        "/materials",
        Some(json!({"name": "EPDM", "category": "rubber", "openingBalance": 100.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(material["balance"], json!(100.0));
    let id = material["id"].as_str().unwrap().to_string();

    let (status, list) = send(&router, "GET", "/materials", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["name"], json!("EPDM"));

    let (status, logged) = send(
        &router,
        "POST",
        &format!("/materials/{id}/transactions"),
        Some(json!({"particulars": "Order A", "outward": 30.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logged["balance"], json!(70.0));
    assert_eq!(logged["entry"]["outward"], json!(30.0));
    assert_eq!(logged["entry"]["balance"], json!(70.0));

    let (status, detail) = send(&router, "GET", &format!("/materials/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["balance"], json!(70.0));
    assert_eq!(detail["logs"].as_array().unwrap().len(), 2);
    assert_eq!(detail["logs"][0]["particulars"], json!("Opening stock"));
}

#[tokio::test]
async fn transaction_errors_map_to_statuses() {
    let router = test_router().await;

    let (_, material) = send(
        &router,
        "POST",
        "/materials",
        Some(json!({"name": "EPDM", "category": "rubber"})),
    )
    .await;
    let id = material["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &router,
        "POST",
        &format!("/materials/{id}/transactions"),
        Some(json!({"particulars": "Nothing"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("nonzero"));

    let (status, _) = send(
        &router,
        "POST",
        &format!("/materials/{}/transactions", uuid::Uuid::new_v4()),
        Some(json!({"particulars": "Ghost", "inward": 1.0})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &router,
        "POST",
        "/materials",
        Some(json!({"name": "EPDM", "category": "rubber"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn formula_endpoints() {
    let router = test_router().await;

    let (status, formula) = send(
        &router,
        "POST",
        "/formulas",
        Some(json!({
            "name": "EPDM-60",
            "lotMultiplier": 10,
            "ingredients": [
                {"type": "rubber", "name": "EPDM", "ratio": 5.0},
                {"type": "chemical", "name": "Zinc Oxide", "ratio": 1.0, "phr": 5.0}
            ],
            "totalWeight": 6.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // Consumption is computed server-side: ratio × lotMultiplier.
    assert_eq!(formula["ingredients"][0]["consumption"], json!(50.0));
    assert_eq!(formula["ingredients"][1]["consumption"], json!(10.0));
    let id = formula["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &router,
        "POST",
        "/formulas",
        Some(json!({
            "name": "EPDM-60",
            "lotMultiplier": 5,
            "ingredients": [{"type": "rubber", "name": "EPDM", "ratio": 1.0}],
            "totalWeight": 1.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &router,
        "POST",
        "/formulas",
        Some(json!({
            "name": "Mismatch",
            "lotMultiplier": 5,
            "ingredients": [{"type": "rubber", "name": "EPDM", "ratio": 1.0}],
            "totalWeight": 2.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("total weight"));

    let (status, updated) = send(
        &router,
        "PUT",
        &format!("/formulas/{id}"),
        Some(json!({
            "name": "NBR-70",
            "ingredients": [{"type": "rubber", "name": "NBR", "ratio": 2.0}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], json!("NBR-70"));
    // Total weight stays frozen at its creation value.
    assert_eq!(updated["totalWeight"], json!(6.0));
    assert_eq!(updated["ingredients"][0]["consumption"], json!(20.0));

    let (status, _) = send(&router, "DELETE", &format!("/formulas/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&router, "GET", &format!("/formulas/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn order_flow() {
    let router = test_router().await;

    let (_, material) = send(
        &router,
        "POST",
        "/materials",
        Some(json!({"name": "EPDM", "category": "rubber", "openingBalance": 100.0})),
    )
    .await;
    let material_id = material["id"].as_str().unwrap().to_string();

    let (_, formula) = send(
        &router,
        "POST",
        "/formulas",
        Some(json!({
            "name": "EPDM-60",
            "lotMultiplier": 10,
            "ingredients": [{"type": "rubber", "name": "EPDM", "ratio": 5.0}],
            "totalWeight": 5.0
        })),
    )
    .await;
    let formula_id = formula["id"].as_str().unwrap().to_string();

    let order_body = json!({
        "date": "11/02/2026",
        "shift": "A",
        "orderNo": "ORD-1",
        "machineNo": "K-2",
        "operator": "Ravi",
        "batchNo": "B-204",
        "batchWeight": 25.0,
        "numberOfBatches": 1,
        "selectedFormulaId": formula_id
    });

    let (status, order) = send(&router, "POST", "/orders", Some(order_body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["draws"][0]["ingredient"], json!("EPDM"));
    assert_eq!(order["draws"][0]["quantity"], json!(50.0));
    assert_eq!(
        order["draws"][0]["materialId"],
        json!(material_id.as_str())
    );

    let (_, detail) = send(&router, "GET", &format!("/materials/{material_id}"), None).await;
    assert_eq!(detail["balance"], json!(50.0));
    assert_eq!(detail["logs"][1]["particulars"], json!("Order ORD-1"));

    let (status, orders) = send(&router, "GET", "/orders?withFormula=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["formula"]["name"], json!("EPDM-60"));

    let mut missing_operator = order_body.clone();
    missing_operator["operator"] = json!("");
    let (status, _) = send(&router, "POST", "/orders", Some(missing_operator)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut unknown_formula = order_body.clone();
    unknown_formula["selectedFormulaId"] = json!(uuid::Uuid::new_v4().to_string());
    let (status, _) = send(&router, "POST", "/orders", Some(unknown_formula)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
