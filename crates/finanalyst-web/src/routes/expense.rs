//! Expense screens

use async_trait::async_trait;
use finanalyst_core::{AppContext, EntityClient, Expense};
use finanalyst_utils::escape_opt;

use super::entities::{text_input, EntityView, FormData};

#[async_trait]
impl EntityView for Expense {
    const TITLE: &'static str = "Expenses";
    const LABEL: &'static str = "Expense";

    type Choices = ();

    fn client(ctx: &AppContext) -> &EntityClient<Self> {
        &ctx.expenses
    }

    fn columns() -> &'static [(&'static str, &'static str)] {
        &[
            ("category", "Category"),
            ("name", "Name"),
            ("searchString1", "Search String 1"),
            ("searchString2", "Search String 2"),
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            escape_opt(self.category.as_deref()),
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
            text_input("category", "Category", self.category.as_deref(), true),
            text_input("name", "Name", self.name.as_deref(), true),
            text_input("searchString1", "Search String 1", self.search_string1.as_deref(), false),
            text_input("searchString2", "Search String 2", self.search_string2.as_deref(), false),
        ]
        .concat()
    }

    fn from_form(form: &FormData, _choices: &()) -> Self {
        Expense {
            id: None,
            category: form.text("category"),
            name: form.text("name"),
            search_string1: form.text("searchString1"),
            search_string2: form.text("searchString2"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finanalyst_core::Entity;

    #[test]
    fn test_from_form_blank_fields_are_absent() {
        let form = FormData::parse("category=Housing&name=Rent&searchString1=&searchString2=LANDLORD");
        let expense = Expense::from_form(&form, &());
        assert_eq!(expense.category.as_deref(), Some("Housing"));
        assert_eq!(expense.search_string1, None);
        assert_eq!(expense.search_string2.as_deref(), Some("LANDLORD"));
        assert!(expense.is_new());
    }

    #[test]
    fn test_cells_are_escaped() {
        let expense = Expense {
            name: Some("<b>Rent</b>".to_string()),
            ..Default::default()
        };
        assert_eq!(expense.cells()[1], "&lt;b&gt;Rent&lt;/b&gt;");
        assert_eq!(expense.detail_rows()[1].0, "Name");
    }
}
