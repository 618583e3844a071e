use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use coffeemaker::config::CorsConfig;
use coffeemaker::routes::build_app;
use coffeemaker::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: Router,
}

struct TestResponse {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }

    fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("response body is not UTF-8")
    }
}

impl TestApp {
    fn new() -> Self {
        let router = build_app(Arc::new(MemoryStore::new()), &CorsConfig::default()).unwrap();
        Self { router }
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
        TestResponse { status, headers, body }
    }

    async fn call(&self, method: Method, path: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(path);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn get(&self, path: &str) -> TestResponse {
        self.call(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.call(Method::POST, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.call(Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> TestResponse {
        self.call(Method::DELETE, path, None).await
    }
}

#[tokio::test]
async fn test_ingredient_lifecycle_scenario() {
    let app = TestApp::new();

    let created = app.post("/ingredient", json!({"name": "Sugar", "amount": 10})).await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.json(), json!({"id": 1, "name": "Sugar", "amount": 10}));

    let duplicate = app.post("/ingredient", json!({"name": "Sugar", "amount": 5})).await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.json(), json!({"errorMessage": "Ingredient Sugar already exists"}));

    // The rejected create left nothing behind
    let all = app.get("/ingredients").await;
    assert_eq!(all.json(), json!([{"id": 1, "name": "Sugar", "amount": 10}]));

    let deleted = app.delete("/ingredient/1").await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.text(), "Ingredient with id 1 has been deleted successfully.");

    let missing = app.get("/ingredient/1").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(
        missing.json(),
        json!({"errorMessage": "Could not find the ingredient with id 1"})
    );
}

#[tokio::test]
async fn test_create_assigns_fresh_ids_and_ignores_client_id() {
    let app = TestApp::new();

    let first = app.post("/ingredient", json!({"id": 40, "name": "Coffee", "amount": 3})).await.json();
    let second = app.post("/ingredient", json!({"id": 40, "name": "Milk", "amount": 7})).await.json();

    assert_eq!(first["id"], json!(1));
    assert_eq!(second["id"], json!(2));

    let fetched = app.get("/ingredient/2").await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.json(), json!({"id": 2, "name": "Milk", "amount": 7}));
}

#[tokio::test]
async fn test_ingredient_update_is_idempotent_and_skips_name_check() {
    let app = TestApp::new();
    app.post("/ingredient", json!({"name": "Sugar", "amount": 10})).await;
    app.post("/ingredient", json!({"name": "Milk", "amount": 4})).await;

    let body = json!({"name": "Sugar", "amount": 2});
    let once = app.put("/ingredient/2", body.clone()).await;
    let twice = app.put("/ingredient/2", body).await;

    assert_eq!(once.status, StatusCode::OK);
    assert_eq!(once.json(), twice.json());
    assert_eq!(twice.json(), json!({"id": 2, "name": "Sugar", "amount": 2}));
}

#[tokio::test]
async fn test_missing_ids_return_not_found_for_every_resource() {
    let app = TestApp::new();
    let ingredient = json!({"name": "Water", "amount": 1});
    let recipe = json!({"name": "Tea", "price": 2, "recipeIngredients": []});

    let cases = [
        ("/ingredient/9", ingredient.clone(), "Could not find the ingredient with id 9"),
        ("/recipe/9", recipe, "Could not find the recipe with id 9"),
        (
            "/recipeIngredient/9",
            ingredient,
            "Could not find the recipe ingredient with id 9",
        ),
    ];

    for (path, body, message) in cases {
        for response in [
            app.get(path).await,
            app.put(path, body.clone()).await,
            app.delete(path).await,
        ] {
            assert_eq!(response.status, StatusCode::NOT_FOUND, "{}", path);
            assert_eq!(response.json(), json!({"errorMessage": message}));
        }
    }

    // Nothing was created along the way
    assert_eq!(app.get("/ingredients").await.json(), json!([]));
    assert_eq!(app.get("/recipes").await.json(), json!([]));
    assert_eq!(app.get("/recipeIngredients").await.json(), json!([]));
}

#[tokio::test]
async fn test_recipe_round_trip_and_cascade() {
    let app = TestApp::new();

    let created = app
        .post(
            "/recipe",
            json!({
                "name": "Latte",
                "price": 4,
                "recipeIngredients": [
                    {"name": "Coffee", "amount": 1},
                    {"name": "Milk", "amount": 2}
                ]
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK);
    let created = created.json();
    assert_eq!(created["name"], json!("Latte"));
    assert_eq!(created["recipeIngredients"].as_array().unwrap().len(), 2);

    let id = created["id"].as_i64().unwrap();
    let fetched = app.get(&format!("/recipe/{}", id)).await.json();
    assert_eq!(fetched, created);
    assert_eq!(app.get("/recipes").await.json(), json!([created]));
    assert_eq!(
        app.get("/recipeIngredients").await.json().as_array().unwrap().len(),
        2
    );

    let deleted = app.delete(&format!("/recipe/{}", id)).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(
        deleted.text(),
        format!("Recipe with id {} has been deleted successfully.", id)
    );
    assert_eq!(app.get("/recipeIngredients").await.json(), json!([]));
}

#[tokio::test]
async fn test_recipe_update_replaces_ingredient_collection() {
    let app = TestApp::new();
    app.post(
        "/recipe",
        json!({
            "name": "Latte",
            "price": 4,
            "recipeIngredients": [
                {"name": "Coffee", "amount": 1},
                {"name": "Milk", "amount": 2}
            ]
        }),
    )
    .await;

    let updated = app
        .put(
            "/recipe/1",
            json!({
                "name": "Flat White",
                "price": 5,
                "recipeIngredients": [{"name": "Coffee", "amount": 2}]
            }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);

    let updated = updated.json();
    assert_eq!(updated["id"], json!(1));
    assert_eq!(updated["name"], json!("Flat White"));
    assert_eq!(updated["price"], json!(5));
    assert_eq!(updated["recipeIngredients"].as_array().unwrap().len(), 1);

    // Old rows are gone, only the replacement remains
    let rows = app.get("/recipeIngredients").await.json();
    assert_eq!(rows, updated["recipeIngredients"]);
}

#[tokio::test]
async fn test_recipe_ingredient_crud() {
    let app = TestApp::new();

    let created = app.post("/recipeIngredient", json!({"name": "Milk", "amount": 2})).await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.json(), json!({"id": 1, "name": "Milk", "amount": 2}));

    // No uniqueness check for recipe ingredients
    let again = app.post("/recipeIngredient", json!({"name": "Milk", "amount": 2})).await;
    assert_eq!(again.status, StatusCode::OK);

    let updated = app.put("/recipeIngredient/1", json!({"name": "Milk", "amount": 3})).await;
    assert_eq!(updated.json(), json!({"id": 1, "name": "Milk", "amount": 3}));

    let deleted = app.delete("/recipeIngredient/1").await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(
        deleted.text(),
        "Recipe ingredient with id 1 has been deleted successfully."
    );
    assert_eq!(
        app.get("/recipeIngredients").await.json(),
        json!([{"id": 2, "name": "Milk", "amount": 2}])
    );
}

#[tokio::test]
async fn test_malformed_input_is_a_bad_request() {
    let app = TestApp::new();

    let missing_field = app.post("/ingredient", json!({"name": "Sugar"})).await;
    assert_eq!(missing_field.status, StatusCode::BAD_REQUEST);
    assert!(missing_field.json()["errorMessage"].is_string());

    let not_json = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/recipe")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(not_json.status, StatusCode::BAD_REQUEST);
    assert!(not_json.json()["errorMessage"].is_string());

    let bad_id = app.get("/ingredient/abc").await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert!(bad_id.json()["errorMessage"].is_string());

    assert_eq!(app.get("/ingredients").await.json(), json!([]));
}

#[tokio::test]
async fn test_purchase_deducts_inventory() {
    let app = TestApp::new();
    app.post("/ingredient", json!({"name": "Coffee", "amount": 10})).await;
    app.post("/ingredient", json!({"name": "Milk", "amount": 5})).await;
    app.post(
        "/recipe",
        json!({
            "name": "Latte",
            "price": 4,
            "recipeIngredients": [
                {"name": "Coffee", "amount": 1},
                {"name": "Milk", "amount": 2}
            ]
        }),
    )
    .await;

    let receipt = app
        .post("/purchase", json!({"items": [{"recipeId": 1, "count": 2}], "payment": 10}))
        .await;
    assert_eq!(receipt.status, StatusCode::OK);
    let receipt = receipt.json();
    assert_eq!(receipt["total"], json!(8));
    assert_eq!(receipt["change"], json!(2));

    assert_eq!(
        app.get("/ingredients").await.json(),
        json!([
            {"id": 1, "name": "Coffee", "amount": 8},
            {"id": 2, "name": "Milk", "amount": 1}
        ])
    );

    // Only one unit of milk left: a second latte cannot be made
    let short = app
        .post("/purchase", json!({"items": [{"recipeId": 1, "count": 1}], "payment": 10}))
        .await;
    assert_eq!(short.status, StatusCode::CONFLICT);
    assert_eq!(short.json(), json!({"errorMessage": "Not enough Milk in stock"}));
    assert_eq!(app.get("/ingredient/1").await.json()["amount"], json!(8));
}

#[tokio::test]
async fn test_purchase_validation_errors() {
    let app = TestApp::new();
    app.post("/recipe", json!({"name": "Water", "price": 1})).await;

    let empty = app.post("/purchase", json!({"items": [], "payment": 5})).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.json(), json!({"errorMessage": "No recipes selected for purchase"}));

    let zero = app
        .post("/purchase", json!({"items": [{"recipeId": 1, "count": 0}], "payment": 5}))
        .await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);

    let unknown = app
        .post("/purchase", json!({"items": [{"recipeId": 7, "count": 1}], "payment": 5}))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(
        unknown.json(),
        json!({"errorMessage": "Could not find the recipe with id 7"})
    );

    let underpaid = app
        .post("/purchase", json!({"items": [{"recipeId": 1, "count": 3}], "payment": 2}))
        .await;
    assert_eq!(underpaid.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        underpaid.json(),
        json!({"errorMessage": "Payment of 2 is less than the total price of 3"})
    );
}

#[tokio::test]
async fn test_purchase_boundary_inputs() {
    let app = TestApp::new();
    app.post("/recipe", json!({"name": "Refund", "price": -1})).await;

    let free = app
        .post("/purchase", json!({"items": [{"recipeId": 1, "count": 1}], "payment": 0}))
        .await;
    assert_eq!(free.status, StatusCode::BAD_REQUEST);
    assert_eq!(free.json(), json!({"errorMessage": "Payment must be greater than 0"}));

    let huge = app
        .post(
            "/purchase",
            json!({"items": [{"recipeId": 1, "count": 1}], "payment": i64::MAX}),
        )
        .await;
    assert_eq!(huge.status, StatusCode::BAD_REQUEST);
    assert_eq!(huge.json(), json!({"errorMessage": "Order total is out of range"}));

    let receipt = app
        .post("/purchase", json!({"items": [{"recipeId": 1, "count": 2}], "payment": 3}))
        .await;
    assert_eq!(receipt.status, StatusCode::OK);
    assert_eq!(receipt.json()["change"], json!(5));
}

#[tokio::test]
async fn test_purchase_with_shared_inventory_name_deducts_first_row() {
    let app = TestApp::new();
    app.post("/ingredient", json!({"name": "Milk", "amount": 10})).await;
    app.post("/ingredient", json!({"name": "Oat", "amount": 10})).await;
    let renamed = app.put("/ingredient/2", json!({"name": "Milk", "amount": 10})).await;
    assert_eq!(renamed.status, StatusCode::OK);
    app.post(
        "/recipe",
        json!({"name": "Steamer", "price": 2, "recipeIngredients": [{"name": "Milk", "amount": 3}]}),
    )
    .await;

    let receipt = app
        .post("/purchase", json!({"items": [{"recipeId": 1, "count": 1}], "payment": 2}))
        .await;
    assert_eq!(receipt.status, StatusCode::OK);
    assert_eq!(
        app.get("/ingredients").await.json(),
        json!([
            {"id": 1, "name": "Milk", "amount": 7},
            {"id": 2, "name": "Milk", "amount": 10}
        ])
    );
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::builder()
                .method(Method::GET)
                .uri("/ingredients")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );

    let preflight = app
        .send(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/ingredient/1")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(preflight.status, StatusCode::OK);
    let methods = preflight
        .headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(methods.contains("PUT"));
    assert!(methods.contains("DELETE"));
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], json!("healthy"));
}
