//! Entity form submissions and HTMX fragments
//!
//! Endpoints:
//! - htmx_list: next page of rows for infinite scroll
//! - htmx_create: create from the submitted form
//! - htmx_update: replace a record from the submitted form
//! - htmx_delete: delete a record

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use finanalyst_core::{ClientError, ClientResult, EntityId, PaginationState};
use std::collections::HashMap;

use super::page::{list_url, load_more_row, render_form, render_rows, sortable};
use super::{EntityView, FormData};
use crate::error::{error_alert, WebError};
use crate::{page_response, AppState};

/// HTMX: next page of list rows, swapped in place of the sentinel row
///
/// Rows come from the page fetched by this request. `HX-Push-Url` keeps
/// the address bar on the furthest loaded page.
pub async fn htmx_list<V: EntityView>(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let pagination = sortable::<V>(PaginationState::from_params(
        &params,
        state.config.pagination.items_per_page,
        V::DEFAULT_SORT,
    ));
    let client = V::client(&state.ctx).detached();

    let fragment = match client.list(Some(pagination.to_list_query())).await {
        Ok(page) => format!(
            "{}{}",
            render_rows(&page.records),
            load_more_row::<V>(&pagination, &page.links)
        ),
        Err(error) => format!(
            "<tr><td colspan='{}'>{}</td></tr>",
            V::columns().len() + 2,
            error_alert(&error)
        ),
    };

    let mut response = Html(fragment).into_response();
    if let Ok(url) = HeaderValue::from_str(&list_url::<V>(&pagination)) {
        response.headers_mut().insert("hx-push-url", url);
    }
    response
}

/// Create from the submitted form
///
/// The form's choices are loaded again so submitted references are joined
/// against current data.
pub async fn htmx_create<V: EntityView>(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, WebError> {
    let form = FormData::parse(&body);
    let choices = V::load_choices(&state.ctx).await?;
    let record = V::from_form(&form, &choices);
    let result = V::client(&state.ctx).create(&record).await;
    finish_write(&headers, result, &record, None, &choices, &state)
}

/// Replace the record at `:id` with the submitted form
pub async fn htmx_update<V: EntityView>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<EntityId>,
    body: String,
) -> Result<Response, WebError> {
    let form = FormData::parse(&body);
    let choices = V::load_choices(&state.ctx).await?;
    let mut record = V::from_form(&form, &choices);
    record.set_id(Some(id));
    let result = V::client(&state.ctx).update(&record).await;
    finish_write(&headers, result, &record, Some(id), &choices, &state)
}

pub async fn htmx_delete<V: EntityView>(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> Result<Response, WebError> {
    let client = V::client(&state.ctx);
    client.delete(id).await?;
    Ok(Redirect::to(&first_page_url::<V>(&state)).into_response())
}

fn first_page_url<V: EntityView>(state: &AppState) -> String {
    list_url::<V>(&PaginationState::new(
        state.config.pagination.items_per_page,
        V::DEFAULT_SORT,
    ))
}

/// Back to the list after a successful write; a rejected record is shown
/// again in its form with the server's complaint
fn finish_write<V: EntityView>(
    headers: &HeaderMap,
    result: ClientResult<V>,
    submitted: &V,
    id: Option<EntityId>,
    choices: &V::Choices,
    state: &AppState,
) -> Result<Response, WebError> {
    match result {
        Ok(_) => Ok(Redirect::to(&first_page_url::<V>(state)).into_response()),
        Err(error @ ClientError::ValidationFailure { .. }) => {
            let inner_content = render_form(submitted, id, choices, Some(&error));
            let page = page_response(headers, V::LABEL, &format!("/{}", V::NAME), &inner_content);
            Ok((StatusCode::BAD_REQUEST, Html(page)).into_response())
        }
        Err(error) => Err(error.into()),
    }
}
