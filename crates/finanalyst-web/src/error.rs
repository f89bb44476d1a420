//! Error types for finanalyst-web

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use finanalyst_core::{ClientError, ErrorCode};
use finanalyst_utils::escape_html;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WebError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Bad request: {message}")]
    BadRequest { message: String },
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::Client(e) => match e.code() {
                ErrorCode::NotFound => StatusCode::NOT_FOUND,
                ErrorCode::ValidationFailure => StatusCode::BAD_REQUEST,
                ErrorCode::NetworkFailure | ErrorCode::Unknown => StatusCode::BAD_GATEWAY,
            },
            WebError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

/// Error alert box shared by full pages and fragments
pub fn error_alert(error: &ClientError) -> String {
    let details = error.to_details();
    let suggestions: String = details
        .suggestions
        .iter()
        .map(|s| format!("<li>{}</li>", escape_html(s)))
        .collect();
    format!(
        r#"<div class='bg-red-50 border border-red-200 rounded-lg p-4 mb-4' role='alert'><div class='flex items-center gap-2'><span class='text-red-600'>✗</span><span class='font-medium text-red-800'>{}</span></div><p class='text-sm text-red-600 mt-1'>{}</p><ul class='text-sm text-red-600 mt-1 list-disc pl-5'>{}</ul></div>"#,
        details.code,
        escape_html(&details.message),
        suggestions
    )
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!(target: "finanalyst::web", "{}", self);
        }

        let body = match &self {
            WebError::Client(e) => error_alert(e),
            WebError::BadRequest { message } => format!(
                r#"<div class='bg-red-50 border border-red-200 rounded-lg p-4' role='alert'><p class='text-sm text-red-600'>{}</p></div>"#,
                escape_html(message)
            ),
        };
        let page = crate::base_html(
            status.canonical_reason().unwrap_or("Error"),
            &format!(
                r#"<main class='p-6'>{}<a href='/' class='text-indigo-600'>Back to home</a></main>"#,
                body
            ),
        );
        (status, Html(page)).into_response()
    }
}
