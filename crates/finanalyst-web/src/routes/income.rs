//! Income screens

use async_trait::async_trait;
use finanalyst_core::{AppContext, EntityClient, Income};
use finanalyst_utils::escape_opt;

use super::entities::{text_input, EntityView, FormData};

#[async_trait]
impl EntityView for Income {
    const TITLE: &'static str = "Incomes";
    const LABEL: &'static str = "Income";

    type Choices = ();

    fn client(ctx: &AppContext) -> &EntityClient<Self> {
        &ctx.incomes
    }

    fn columns() -> &'static [(&'static str, &'static str)] {
        &[
            ("name", "Name"),
            ("searchString1", "Search String 1"),
            ("searchString2", "Search String 2"),
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            escape_opt(self.name.as_deref()),
            escape_opt(self.search_string1.as_deref()),
            escape_opt(self.search_string2.as_deref()),
        ]
    }

    fn detail_rows(&self) -> Vec<(&'static str, String)> {
        Self::columns()
            .iter()
            .map(|(_, header)| *header)
            .zip(self.cells())
            .collect()
    }

    fn form_fields(&self, _choices: &()) -> String {
        [
            text_input("name", "Name", self.name.as_deref(), true),
            text_input("searchString1", "Search String 1", self.search_string1.as_deref(), false),
            text_input("searchString2", "Search String 2", self.search_string2.as_deref(), false),
        ]
        .concat()
    }

    fn from_form(form: &FormData, _choices: &()) -> Self {
        Income {
            id: None,
            name: form.text("name"),
            search_string1: form.text("searchString1"),
            search_string2: form.text("searchString2"),
        }
    }
}
