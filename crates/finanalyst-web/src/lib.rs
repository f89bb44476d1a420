//! HTTP server with HTMX support
//!
//! Routes are organized into modules:
//! - routes::entities: generic list, detail, form and delete screens
//! - routes::expense, routes::income, routes::transaction: per-entity views

pub mod error;
pub mod routes;

use axum::{routing::get, Router};
use finanalyst_config::Config;
use finanalyst_core::AppContext;
use std::sync::Arc;
use tokio::net::TcpListener;

use finanalyst_core::{Expense, Income, Transaction};

pub use error::WebError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<AppContext>,
    pub config: Config,
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::entities::entity_routes;

    Router::new()
        .route("/api/health", get(health_check))
        .route("/", get(index_page))
        .merge(entity_routes::<Expense>())
        .merge(entity_routes::<Income>())
        .merge(entity_routes::<Transaction>())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// ==================== Template Functions ====================

/// Base HTML template
pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Finanalyst</title>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/tailwindcss@2.2.19/dist/tailwind.min.css">
    <style>
        .htmx-indicator {{ opacity: 0; transition: opacity 0.3s; }}
        .htmx-request .htmx-indicator {{ opacity: 1; }}
    </style>
</head>
<body class="bg-gray-50 text-gray-900">
    {}
</body>
</html>"#,
        finanalyst_utils::escape_html(title),
        content
    )
}

/// Navigation sidebar
pub fn nav_sidebar(current_path: &str) -> String {
    let links = [
        ("/", "Home"),
        ("/expense", "Expenses"),
        ("/income", "Incomes"),
        ("/transaction", "Transactions"),
    ];

    let mut nav = String::from("<div class='bg-white border-r h-screen flex flex-col'><div class='p-4 border-b'><h1 class='text-xl font-bold text-indigo-600'>Finanalyst</h1></div><ul class='flex-1 py-2 space-y-1 px-2'>");

    for (path, label) in &links {
        let is_active = if *path == "/" {
            current_path == "/"
        } else {
            current_path.starts_with(path)
        };
        let active_class = if is_active {
            "bg-indigo-50 text-indigo-600"
        } else {
            "text-gray-600 hover:bg-gray-50"
        };
        nav.push_str(&format!(
            r#"<li><a href='{}' class='flex items-center gap-2 px-3 py-2 rounded-lg {}'><span>{}</span></a></li>"#,
            path, active_class, label
        ));
    }
    nav.push_str("</ul></div>");
    nav
}

/// Check if request is from HTMX (partial page update)
fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.get("hx-request").is_some()
}

/// Wrap content for full page or HTMX partial
pub fn page_response(
    headers: &axum::http::HeaderMap,
    title: &str,
    current_path: &str,
    inner_content: &str,
) -> String {
    if is_htmx_request(headers) {
        format!(
            r#"<main class='flex-1 overflow-auto bg-gray-50 p-6'>{}</main>"#,
            inner_content
        )
    } else {
        base_html(
            title,
            &format!(
                r#"<div class='flex flex-col h-screen'>
    <div class='flex flex-1 overflow-hidden'>
        <aside class='w-64 flex-shrink-0'>{}</aside>
        <main class='flex-1 overflow-auto bg-gray-50 p-6'>{}</main>
    </div>
</div>"#,
                nav_sidebar(current_path),
                inner_content
            ),
        )
    }
}

/// Index page with one card per entity
async fn index_page(headers: axum::http::HeaderMap) -> axum::response::Html<String> {
    let cards = [
        ("/expense", "Expenses", "Spending categories matched against transactions"),
        ("/income", "Incomes", "Income sources matched against transactions"),
        ("/transaction", "Transactions", "Bank transactions in CAD and USD"),
    ]
    .iter()
    .map(|(path, label, blurb)| {
        format!(
            r#"<a href='{}' class='block bg-white rounded-xl shadow-sm p-6 hover:bg-indigo-50'><h3 class='text-lg font-semibold mb-2'>{}</h3><p class='text-sm text-gray-600'>{}</p></a>"#,
            path, label, blurb
        )
    })
    .collect::<Vec<_>>()
    .join("");

    let inner_content = format!(
        r#"<div class='mb-6'><h2 class='text-2xl font-bold'>Finanalyst</h2></div>
        <div class='grid grid-cols-1 md:grid-cols-3 gap-4'>{}</div>"#,
        cards
    );

    axum::response::Html(page_response(&headers, "Home", "/", &inner_content))
}

/// Start the HTTP server
///
/// Binds to `server.host:server.port` and serves until the listener fails.
pub async fn start_server(config: Config, ctx: Arc<AppContext>) -> std::io::Result<()> {
    let addr = config.listen_addr();
    let state = AppState { ctx, config };

    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!(target: "finanalyst::web", "Starting Finanalyst server on http://{}", addr);
    log::info!(target: "finanalyst::web", "Available routes:");
    log::info!(target: "finanalyst::web", "  - / (Entity index)");
    for name in ["expense", "income", "transaction"] {
        log::info!(
            target: "finanalyst::web",
            "  - /{0}, /{0}/new, /{0}/:id, /{0}/:id/edit, /{0}/:id/delete",
            name
        );
    }
    log::info!(target: "finanalyst::web", "  - /api/health");

    axum::serve(listener, router).await?;
    log::info!(target: "finanalyst::web", "Server stopped gracefully");
    Ok(())
}
