//! Generic entity screens - list, detail, create/edit form, delete confirmation
//!
//! Every entity type gets the same routes under `/<name>`:
//! - GET  /<name>              list page (query string carries `page` and `sort`)
//! - GET  /<name>/list         "load more" fragment for infinite scroll
//! - GET  /<name>/new          create form
//! - POST /<name>              create
//! - GET  /<name>/:id          detail
//! - POST /<name>/:id          update
//! - GET  /<name>/:id/edit     edit form
//! - GET  /<name>/:id/delete   delete confirmation
//! - POST /<name>/:id/delete   delete
//!
//! Structure:
//! - api.rs: form submissions and fragments
//! - page.rs: full page rendering

pub mod api;
pub mod page;

use async_trait::async_trait;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use finanalyst_core::pagination::parse_query;
use finanalyst_core::{AppContext, ClientResult, Entity, EntityClient};
use finanalyst_utils::escape_html;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

use crate::AppState;

/// Presentation of one entity type
#[async_trait]
pub trait EntityView: Entity {
    /// Plural heading of the list page
    const TITLE: &'static str;
    /// Singular label used in buttons and headings
    const LABEL: &'static str;

    fn client(ctx: &AppContext) -> &EntityClient<Self>;

    /// `(wire name, header)` per list column; the wire name is the sort key
    fn columns() -> &'static [(&'static str, &'static str)];

    /// Escaped HTML of each list cell, in column order
    fn cells(&self) -> Vec<String>;

    /// Label and escaped HTML value of each detail row
    fn detail_rows(&self) -> Vec<(&'static str, String)>;

    /// What the form offers besides the record itself, such as the
    /// records a reference can be chosen from
    type Choices: Default + Send + Sync;

    /// Load the form's choices; called for every render and every submit
    async fn load_choices(_ctx: &AppContext) -> ClientResult<Self::Choices> {
        Ok(Self::Choices::default())
    }

    /// Input elements for the record, pre-filled
    fn form_fields(&self, choices: &Self::Choices) -> String;

    /// Build a record from submitted form values
    fn from_form(form: &FormData, choices: &Self::Choices) -> Self;
}

/// Register the routes of one entity type
pub fn entity_routes<V: EntityView>() -> Router<AppState> {
    let base = format!("/{}", V::NAME);

    Router::new()
        .route(&base, get(page::page_list::<V>).post(api::htmx_create::<V>))
        .route(&format!("{}/list", base), get(api::htmx_list::<V>))
        .route(&format!("{}/new", base), get(page::page_new::<V>))
        .route(
            &format!("{}/:id", base),
            get(page::page_detail::<V>).post(api::htmx_update::<V>),
        )
        .route(&format!("{}/:id/edit", base), get(page::page_edit::<V>))
        .route(
            &format!("{}/:id/delete", base),
            get(page::page_delete::<V>).post(api::htmx_delete::<V>),
        )
}

// ==================== Form Data ====================

/// Decoded `application/x-www-form-urlencoded` body
#[derive(Debug, Clone, Default)]
pub struct FormData(HashMap<String, String>);

impl FormData {
    pub fn parse(body: &str) -> Self {
        Self(parse_query(body))
    }

    /// Trimmed value; blank values count as absent
    pub fn value(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.value(name).map(str::to_string)
    }

    pub fn decimal(&self, name: &str) -> Option<Decimal> {
        self.value(name).and_then(|v| Decimal::from_str(v).ok())
    }

    pub fn datetime(&self, name: &str) -> Option<DateTime<Utc>> {
        self.value(name)
            .and_then(finanalyst_core::time::from_form_value)
    }

    /// Checkbox state; browsers omit unchecked boxes entirely
    pub fn checked(&self, name: &str) -> bool {
        matches!(self.value(name), Some("on") | Some("true"))
    }
}

// ==================== Form Inputs ====================

const INPUT_CLASS: &str = "w-full px-3 py-2 border rounded-lg";

fn field_wrapper(name: &str, label: &str, input: &str) -> String {
    format!(
        r#"<div class='mb-4'><label for='field-{}' class='block text-sm font-medium text-gray-700 mb-1'>{}</label>{}</div>"#,
        name, label, input
    )
}

pub fn text_input(name: &str, label: &str, value: Option<&str>, required: bool) -> String {
    let input = format!(
        r#"<input type='text' id='field-{0}' name='{0}' value='{1}' class='{2}'{3}>"#,
        name,
        escape_html(value.unwrap_or("")),
        INPUT_CLASS,
        if required { " required" } else { "" }
    );
    field_wrapper(name, label, &input)
}

pub fn number_input(name: &str, label: &str, value: Option<&Decimal>) -> String {
    let input = format!(
        r#"<input type='number' step='any' id='field-{0}' name='{0}' value='{1}' class='{2}'>"#,
        name,
        value.map(|d| d.to_string()).unwrap_or_default(),
        INPUT_CLASS
    );
    field_wrapper(name, label, &input)
}

pub fn datetime_input(name: &str, label: &str, value: &str) -> String {
    let input = format!(
        r#"<input type='datetime-local' id='field-{0}' name='{0}' value='{1}' class='{2}'>"#,
        name,
        escape_html(value),
        INPUT_CLASS
    );
    field_wrapper(name, label, &input)
}

pub fn checkbox_input(name: &str, label: &str, checked: bool) -> String {
    format!(
        r#"<div class='mb-4 flex items-center gap-2'><input type='checkbox' id='field-{0}' name='{0}' value='true'{1}><label for='field-{0}' class='text-sm font-medium text-gray-700'>{2}</label></div>"#,
        name,
        if checked { " checked" } else { "" },
        label
    )
}

/// Select with an empty "no selection" option first
pub fn select_input(
    name: &str,
    label: &str,
    options: &[(String, String)],
    selected: Option<&str>,
) -> String {
    let mut input = format!(
        r#"<select id='field-{0}' name='{0}' class='{1}'><option value=''></option>"#,
        name, INPUT_CLASS
    );
    for (value, text) in options {
        input.push_str(&format!(
            r#"<option value='{}'{}>{}</option>"#,
            escape_html(value),
            if Some(value.as_str()) == selected { " selected" } else { "" },
            escape_html(text)
        ));
    }
    input.push_str("</select>");
    field_wrapper(name, label, &input)
}
