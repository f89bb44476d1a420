//! Entity page rendering - Full page endpoints
//!
//! Endpoints:
//! - page_list: list with sortable columns and infinite scroll
//! - page_detail: read-only view of one record
//! - page_new / page_edit: create and edit forms
//! - page_delete: delete confirmation

use axum::extract::{Path, RawQuery, State};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect, Response};
use finanalyst_core::{ClientError, EntityId, EntityState, PageLinks, PaginationState};

use super::EntityView;
use crate::error::{error_alert, WebError};
use crate::{page_response, AppState};

/// List state from the query string
pub fn list_state<V: EntityView>(query: Option<&str>, items_per_page: u32) -> PaginationState {
    sortable::<V>(PaginationState::from_query(
        query.unwrap_or(""),
        items_per_page,
        V::DEFAULT_SORT,
    ))
}

/// Fall back to the default sort for fields the entity cannot be sorted by
pub fn sortable<V: EntityView>(pagination: PaginationState) -> PaginationState {
    if V::is_sortable(&pagination.sort) {
        return pagination;
    }
    PaginationState {
        active_page: pagination.active_page,
        ..PaginationState::new(pagination.items_per_page, V::DEFAULT_SORT)
    }
}

/// Canonical list URL for a pagination state
pub fn list_url<V: EntityView>(pagination: &PaginationState) -> String {
    format!("/{}?{}", V::NAME, pagination.to_query_string())
}

/// List page
///
/// Requests whose query string is not in canonical form are redirected so
/// the address bar always reflects the rendered page and sort. Pages up to
/// the active one are loaded in order, so a reload shows the same rows; a
/// page past the last one redirects to the last one.
///
/// Rows are collected in a store owned by this request, so concurrent list
/// requests never render each other's rows.
pub async fn page_list<V: EntityView>(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let pagination = list_state::<V>(query.as_deref(), state.config.pagination.items_per_page);
    let canonical = pagination.to_query_string();
    if query.as_deref() != Some(canonical.as_str()) {
        return Redirect::to(&list_url::<V>(&pagination)).into_response();
    }

    let client = V::client(&state.ctx).detached();
    let mut loaded = 0;
    while loaded < pagination.active_page {
        let mut list_query = pagination.to_list_query();
        list_query.page = loaded;
        let Ok(page) = client.list(Some(list_query)).await else {
            break;
        };
        loaded += 1;
        let cursor = PaginationState {
            active_page: loaded,
            ..pagination.clone()
        };
        if !cursor.has_more(&page.links) {
            break;
        }
    }

    let view = client.state();
    if view.error_message.is_none() && loaded < pagination.active_page {
        let last = PaginationState {
            active_page: loaded.max(1),
            ..pagination
        };
        return Redirect::to(&list_url::<V>(&last)).into_response();
    }

    let inner_content = render_list::<V>(&pagination, &view);
    Html(page_response(
        &headers,
        V::TITLE,
        &format!("/{}", V::NAME),
        &inner_content,
    ))
    .into_response()
}

pub fn render_list<V: EntityView>(pagination: &PaginationState, state: &EntityState<V>) -> String {
    let name = V::NAME;
    let error = state
        .error_message
        .as_ref()
        .map(error_alert)
        .unwrap_or_default();

    let body = if state.entities.is_empty() {
        if state.loading {
            "<p class='text-gray-500 text-center'>Loading...</p>".to_string()
        } else {
            format!(
                "<div class='bg-yellow-50 border border-yellow-200 rounded-lg p-4 text-yellow-800'>No {} found</div>",
                V::TITLE
            )
        }
    } else {
        let mut head = String::new();
        for (field, header) in std::iter::once(&("id", "ID")).chain(V::columns().iter()) {
            let marker = if *field == pagination.sort {
                match pagination.order {
                    finanalyst_core::SortOrder::Asc => " ▲",
                    finanalyst_core::SortOrder::Desc => " ▼",
                }
            } else {
                ""
            };
            if V::is_sortable(field) {
                head.push_str(&format!(
                    r#"<th class='px-3 py-2 text-left'><a href='{}' class='hover:text-indigo-600'>{}{}</a></th>"#,
                    list_url::<V>(&pagination.sort_by(field)),
                    header,
                    marker
                ));
            } else {
                head.push_str(&format!("<th class='px-3 py-2 text-left'>{}</th>", header));
            }
        }
        head.push_str("<th class='px-3 py-2'></th>");

        format!(
            r#"<table class='w-full text-sm'>
                <thead class='bg-gray-50 text-gray-600'><tr>{}</tr></thead>
                <tbody id='{}-rows'>{}{}</tbody>
            </table>
            <p class='text-xs text-gray-500 mt-3'>Showing {} of {}</p>"#,
            head,
            name,
            render_rows(&state.entities),
            load_more_row::<V>(pagination, &state.links),
            state.entities.len(),
            state.total_items
        )
    };

    format!(
        r#"<div class='flex items-center justify-between mb-4'>
            <h2 class='text-2xl font-bold' id='{0}-heading'>{1}</h2>
            <a href='/{0}/new' class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700'>Create a new {2}</a>
        </div>
        {3}
        <div class='bg-white rounded-xl shadow-sm p-6'>{4}</div>"#,
        name,
        V::TITLE,
        V::LABEL,
        error,
        body
    )
}

/// Table rows with view/edit/delete actions
pub fn render_rows<V: EntityView>(records: &[V]) -> String {
    let name = V::NAME;
    records
        .iter()
        .map(|record| {
            let id = record.id().map(|id| id.to_string()).unwrap_or_default();
            let cells: String = record
                .cells()
                .into_iter()
                .map(|cell| format!("<td class='px-3 py-2'>{}</td>", cell))
                .collect();
            format!(
                r#"<tr id='{0}-row-{1}' class='border-t'><td class='px-3 py-2'><a href='/{0}/{1}' class='text-indigo-600'>{1}</a></td>{2}<td class='px-3 py-2 text-right whitespace-nowrap'><a href='/{0}/{1}' class='text-gray-600 mr-2'>View</a><a href='/{0}/{1}/edit' class='text-indigo-600 mr-2'>Edit</a><a href='/{0}/{1}/delete' class='text-red-600'>Delete</a></td></tr>"#,
                name, id, cells
            )
        })
        .collect()
}

/// Sentinel row that fetches the next page once scrolled into view
pub fn load_more_row<V: EntityView>(pagination: &PaginationState, links: &PageLinks) -> String {
    let mut next = pagination.clone();
    if !next.load_more(links) {
        return String::new();
    }
    format!(
        r#"<tr id='{0}-load-more' hx-get='/{0}/list?{1}' hx-trigger='revealed' hx-swap='outerHTML'><td colspan='{2}' class='px-3 py-2 text-center text-gray-400'><span class='htmx-indicator'>Loading more...</span></td></tr>"#,
        V::NAME,
        next.to_query_string(),
        V::columns().len() + 2
    )
}

/// Detail page
pub async fn page_detail<V: EntityView>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<EntityId>,
) -> Result<Html<String>, WebError> {
    let record = V::client(&state.ctx).get(id).await?;

    let rows: String = record
        .detail_rows()
        .into_iter()
        .map(|(label, value)| {
            format!(
                "<dt class='text-sm text-gray-500'>{}</dt><dd class='mb-3 font-medium'>{}</dd>",
                label, value
            )
        })
        .collect();

    let inner_content = format!(
        r#"<h2 class='text-2xl font-bold mb-4'>{0} [<b>{1}</b>]</h2>
        <div class='bg-white rounded-xl shadow-sm p-6'>
            <dl><dt class='text-sm text-gray-500'>ID</dt><dd class='mb-3 font-medium'>{1}</dd>{2}</dl>
            <div class='flex gap-2 mt-4'>
                <a href='/{3}' class='px-4 py-2 bg-gray-100 rounded-lg'>Back</a>
                <a href='/{3}/{1}/edit' class='px-4 py-2 bg-indigo-600 text-white rounded-lg'>Edit</a>
            </div>
        </div>"#,
        V::LABEL,
        id,
        rows,
        V::NAME
    );

    Ok(Html(page_response(
        &headers,
        V::LABEL,
        &format!("/{}", V::NAME),
        &inner_content,
    )))
}

/// Create form
pub async fn page_new<V: EntityView>(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Html<String> {
    V::client(&state.ctx).reset();
    let (choices, error) = load_choices::<V>(&state).await;

    let inner_content = render_form(&V::default(), None, &choices, error.as_ref());
    Html(page_response(
        &headers,
        V::LABEL,
        &format!("/{}", V::NAME),
        &inner_content,
    ))
}

/// Edit form
pub async fn page_edit<V: EntityView>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<EntityId>,
) -> Result<Html<String>, WebError> {
    let record = V::client(&state.ctx).get(id).await?;
    let (choices, error) = load_choices::<V>(&state).await;

    let inner_content = render_form(&record, Some(id), &choices, error.as_ref());
    Ok(Html(page_response(
        &headers,
        V::LABEL,
        &format!("/{}", V::NAME),
        &inner_content,
    )))
}

/// Form choices, or empty ones and the error that prevented loading them
async fn load_choices<V: EntityView>(state: &AppState) -> (V::Choices, Option<ClientError>) {
    match V::load_choices(&state.ctx).await {
        Ok(choices) => (choices, None),
        Err(error) => (V::Choices::default(), Some(error)),
    }
}

/// Create/edit form; posts to `/<name>` or `/<name>/:id`
pub fn render_form<V: EntityView>(
    record: &V,
    id: Option<EntityId>,
    choices: &V::Choices,
    error: Option<&ClientError>,
) -> String {
    let action = match id {
        Some(id) => format!("/{}/{}", V::NAME, id),
        None => format!("/{}", V::NAME),
    };
    let id_field = id
        .map(|id| {
            format!(
                r#"<div class='mb-4'><label for='field-id' class='block text-sm font-medium text-gray-700 mb-1'>ID</label><input type='text' id='field-id' name='id' value='{}' readonly class='w-full px-3 py-2 border rounded-lg bg-gray-100'></div>"#,
                id
            )
        })
        .unwrap_or_default();

    format!(
        r#"<h2 class='text-2xl font-bold mb-4' id='{0}-form-heading'>Create or edit a {1}</h2>
        {2}
        <form method='post' action='{3}' class='bg-white rounded-xl shadow-sm p-6 max-w-2xl'>
            {4}{5}
            <div class='flex gap-2 mt-4'>
                <a href='/{0}' class='px-4 py-2 bg-gray-100 rounded-lg'>Back</a>
                <button type='submit' id='save-entity' class='px-4 py-2 bg-indigo-600 text-white rounded-lg'>Save</button>
            </div>
        </form>"#,
        V::NAME,
        V::LABEL,
        error.map(error_alert).unwrap_or_default(),
        action,
        id_field,
        record.form_fields(choices)
    )
}

/// Delete confirmation
pub async fn page_delete<V: EntityView>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<EntityId>,
) -> Result<Html<String>, WebError> {
    V::client(&state.ctx).get(id).await?;

    let inner_content = format!(
        r#"<div class='bg-white rounded-xl shadow-sm p-6 max-w-lg'>
            <h2 class='text-xl font-bold mb-4'>Confirm delete operation</h2>
            <p class='mb-6'>Are you sure you want to delete this {0} ({1})?</p>
            <form method='post' action='/{2}/{1}/delete' class='flex gap-2'>
                <a href='/{2}' class='px-4 py-2 bg-gray-100 rounded-lg'>Cancel</a>
                <button type='submit' id='confirm-delete-{2}' class='px-4 py-2 bg-red-600 text-white rounded-lg'>Delete</button>
            </form>
        </div>"#,
        V::LABEL,
        id,
        V::NAME
    );

    Ok(Html(page_response(
        &headers,
        V::LABEL,
        &format!("/{}", V::NAME),
        &inner_content,
    )))
}
