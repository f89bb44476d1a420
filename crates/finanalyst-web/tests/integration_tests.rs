//! Integration tests for the web frontend
//!
//! The router is driven in-process against the in-memory REST backend.

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use finanalyst_config::Config;
use finanalyst_core::{AppContext, Expense, Income, InMemoryBackend, ListQuery, Transaction};
use finanalyst_web::{create_router, AppState};
use std::sync::Arc;
use tower::ServiceExt;

fn app_with(backend: Arc<InMemoryBackend>, items_per_page: u32) -> Router {
    app_with_context(Arc::new(AppContext::new(backend)), items_per_page)
}

fn app_with_context(ctx: Arc<AppContext>, items_per_page: u32) -> Router {
    let mut config = Config::default();
    config.pagination.items_per_page = items_per_page;
    create_router(AppState { ctx, config })
}

fn backend() -> Arc<InMemoryBackend> {
    Arc::new(
        InMemoryBackend::new()
            .with_collection::<Expense>()
            .with_collection::<Income>()
            .with_collection::<Transaction>(),
    )
}

fn income(name: &str) -> Income {
    Income {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

/// Helper function to send a request using a router
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    form: Option<&str>,
) -> (StatusCode, HeaderMap, String) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match form {
        Some(form) => builder
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, String::from_utf8_lossy(&body).into_owned())
}

fn location(headers: &HeaderMap) -> &str {
    headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

#[tokio::test]
async fn test_health_check() {
    let app = app_with(backend(), 20);
    let (status, _, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_index_links_every_entity() {
    let app = app_with(backend(), 20);
    let (status, _, body) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    for path in ["/expense", "/income", "/transaction"] {
        assert!(body.contains(&format!("href='{}'", path)));
    }
}

#[tokio::test]
async fn test_list_redirects_to_canonical_query() {
    let app = app_with(backend(), 20);

    let (status, headers, _) = send(&app, "GET", "/income", None).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/income?page=1&sort=id%2Casc");

    let (status, headers, _) = send(&app, "GET", "/income?sort=name,desc", None).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/income?page=1&sort=name%2Cdesc");

    let (_, headers, _) = send(&app, "GET", "/income?page=2&sort=amountCAD%2Casc", None).await;
    assert_eq!(location(&headers), "/income?page=2&sort=id%2Casc");
}

#[tokio::test]
async fn test_list_renders_in_server_order() {
    let backend = backend();
    backend.seed(vec![income("Zeta"), income("Alpha")]).unwrap();
    let app = app_with(backend, 20);

    let (status, _, body) = send(&app, "GET", "/income?page=1&sort=name%2Casc", None).await;
    assert_eq!(status, StatusCode::OK);
    let alpha = body.find("Alpha").unwrap();
    let zeta = body.find("Zeta").unwrap();
    assert!(alpha < zeta);
    assert!(body.contains("Showing 2 of 2"));
    assert!(body.contains("href='/income?page=1&sort=name%2Cdesc'"));
}

#[tokio::test]
async fn test_empty_list_message() {
    let app = app_with(backend(), 20);
    let (status, _, body) = send(&app, "GET", "/expense?page=1&sort=id%2Casc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No Expenses found"));
}

#[tokio::test]
async fn test_infinite_scroll_fragment() {
    let backend = backend();
    backend
        .seed(vec![income("A"), income("B"), income("C")])
        .unwrap();
    let app = app_with(backend, 2);

    let (_, _, body) = send(&app, "GET", "/income?page=1&sort=id%2Casc", None).await;
    assert!(body.contains("hx-get='/income/list?page=2&sort=id%2Casc'"));
    assert!(body.contains("income-row-2"));
    assert!(!body.contains("income-row-3"));

    let (status, headers, fragment) =
        send(&app, "GET", "/income/list?page=2&sort=id%2Casc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(fragment.contains("income-row-3"));
    assert!(!fragment.contains("income-load-more"));
    assert_eq!(
        headers.get("hx-push-url").and_then(|v| v.to_str().ok()),
        Some("/income?page=2&sort=id%2Casc")
    );

    let (_, _, body) = send(&app, "GET", "/income?page=2&sort=id%2Casc", None).await;
    assert!(body.contains("income-row-1"));
    assert!(body.contains("income-row-3"));
    assert!(body.contains("Showing 3 of 3"));
}

#[tokio::test]
async fn test_create_redirects_to_list() {
    let backend = backend();
    let app = app_with(backend.clone(), 20);

    let (status, headers, _) = send(&app, "POST", "/income", Some("name=Salary&searchString1=PAYROLL")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/income?page=1&sort=id%2Casc");
    assert_eq!(backend.count("incomes"), 1);

    let (status, _, body) = send(&app, "GET", "/income/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Salary"));
    assert!(body.contains("PAYROLL"));
}

#[tokio::test]
async fn test_rejected_create_shows_form_again() {
    let backend = backend();
    let app = app_with(backend.clone(), 20);

    let (status, _, body) = send(&app, "POST", "/expense", Some("name=Rent")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("category: must not be null"));
    assert!(body.contains("value='Rent'"));
    assert_eq!(backend.count("expenses"), 0);
}

#[tokio::test]
async fn test_update_and_delete() {
    let backend = backend();
    backend.seed(vec![income("Salary")]).unwrap();
    let app = app_with(backend.clone(), 20);

    let (status, _, body) = send(&app, "GET", "/income/1/edit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("action='/income/1'"));
    assert!(body.contains("value='Salary'"));

    let (status, _, _) = send(&app, "POST", "/income/1", Some("id=1&name=Bonus")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let (_, _, body) = send(&app, "GET", "/income/1", None).await;
    assert!(body.contains("Bonus"));

    let (status, _, body) = send(&app, "GET", "/income/1/delete", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("action='/income/1/delete'"));

    let (status, headers, _) = send(&app, "POST", "/income/1/delete", None).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/income?page=1&sort=id%2Casc");
    assert_eq!(backend.count("incomes"), 0);
}

#[tokio::test]
async fn test_missing_record_is_not_found() {
    let app = app_with(backend(), 20);
    let (status, _, body) = send(&app, "GET", "/income/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("NOT_FOUND"));

    let (status, _, _) = send(&app, "POST", "/income/99/delete", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transaction_form_joins_loaded_income() {
    let backend = backend();
    backend.seed(vec![income("Salary")]).unwrap();
    let app = app_with(backend.clone(), 20);

    let (status, _, body) = send(&app, "GET", "/transaction/new", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<option value='1'>1 - Salary</option>"));

    let (status, _, _) = send(
        &app,
        "POST",
        "/transaction",
        Some("description1=Payroll&amountCAD=100&incomeId=1&expenseId=&isTracked=true"),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (_, _, body) = send(&app, "GET", "/transaction?page=1&sort=id%2Casc", None).await;
    assert!(body.contains("Payroll"));
    assert!(body.contains("<a href='/income/1' class='text-indigo-600'>Salary</a>"));
}

#[tokio::test]
async fn test_page_past_the_end_redirects_to_last_page() {
    let backend = backend();
    backend.seed(vec![income("Salary")]).unwrap();
    let app = app_with(backend.clone(), 20);

    let (status, headers, _) = send(&app, "GET", "/income?page=4000000000&sort=id%2Casc", None).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/income?page=1&sort=id%2Casc");

    backend
        .seed(vec![income("A"), income("B")])
        .unwrap();
    let app = app_with(backend, 2);
    let (status, headers, _) = send(&app, "GET", "/income?page=9&sort=id%2Casc", None).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/income?page=2&sort=id%2Casc");
}

#[tokio::test]
async fn test_list_page_renders_its_own_rows() {
    let backend = backend();
    backend.seed(vec![income("Zeta"), income("Alpha")]).unwrap();
    let ctx = Arc::new(AppContext::new(backend));
    ctx.incomes
        .list(Some(ListQuery {
            page: 0,
            size: 20,
            sort: "id,asc".to_string(),
        }))
        .await
        .unwrap();
    let app = app_with_context(ctx.clone(), 20);

    let (status, _, body) = send(&app, "GET", "/income?page=1&sort=name%2Cdesc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.find("Zeta").unwrap() < body.find("Alpha").unwrap());

    let shared: Vec<_> = ctx.incomes.state().entities.into_iter().filter_map(|e| e.name).collect();
    assert_eq!(shared, vec!["Zeta", "Alpha"]);
}

#[tokio::test]
async fn test_transaction_reference_survives_income_list_visit() {
    let backend = backend();
    backend
        .seed(vec![income("Salary"), income("Bonus")])
        .unwrap();
    let app = app_with(backend, 1);

    let (_, _, body) = send(&app, "GET", "/transaction/new", None).await;
    assert!(body.contains("<option value='2'>2 - Bonus</option>"));

    let (status, _, _) = send(&app, "GET", "/income?page=1&sort=id%2Casc", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(&app, "GET", "/income/new", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(
        &app,
        "POST",
        "/transaction",
        Some("description1=Payroll&incomeId=2"),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (_, _, body) = send(&app, "GET", "/transaction?page=1&sort=id%2Casc", None).await;
    assert!(body.contains("Payroll"));
    assert!(body.contains("<a href='/income/2' class='text-indigo-600'>Bonus</a>"));
}

#[tokio::test]
async fn test_transaction_form_shows_choice_load_failure() {
    let backend = Arc::new(
        InMemoryBackend::new()
            .with_collection::<Income>()
            .with_collection::<Transaction>(),
    );
    let app = app_with(backend, 20);

    let (status, _, body) = send(&app, "GET", "/transaction/new", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("role='alert'"));
    assert!(body.contains("NOT_FOUND"));
    assert!(body.contains("id='save-entity'"));
}
