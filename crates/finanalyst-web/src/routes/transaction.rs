//! Transaction screens
//!
//! The form offers the incomes and expenses as selects. Both lists are
//! loaded for every render and every submit, and a submitted selection is
//! joined by id against them; an id that is not loaded leaves the reference
//! unset.

use async_trait::async_trait;
use chrono::Utc;
use finanalyst_core::time::{default_form_value, display, to_form_value};
use finanalyst_core::{
    resolve_reference, AppContext, ClientResult, Entity, EntityClient, Expense, Income, Transaction,
};
use finanalyst_utils::{escape_html, escape_opt};

use super::entities::{
    checkbox_input, datetime_input, number_input, select_input, text_input, EntityView, FormData,
};

fn reference_link<T: Entity>(id: Option<i64>, label: Option<&str>) -> String {
    match id {
        Some(id) => format!(
            "<a href='/{}/{}' class='text-indigo-600'>{}</a>",
            T::NAME,
            id,
            label.map(escape_html).unwrap_or_else(|| id.to_string())
        ),
        None => String::new(),
    }
}

/// Records a transaction can reference
#[derive(Debug, Clone, Default)]
pub struct TransactionChoices {
    pub incomes: Vec<Income>,
    pub expenses: Vec<Expense>,
}

fn options<T: Entity>(records: &[T], label: impl Fn(&T) -> Option<String>) -> Vec<(String, String)> {
    records
        .iter()
        .filter_map(|record| {
            let id = record.id()?;
            let text = match label(record) {
                Some(name) => format!("{} - {}", id, name),
                None => id.to_string(),
            };
            Some((id.to_string(), text))
        })
        .collect()
}

#[async_trait]
impl EntityView for Transaction {
    const TITLE: &'static str = "Transactions";
    const LABEL: &'static str = "Transaction";

    type Choices = TransactionChoices;

    fn client(ctx: &AppContext) -> &EntityClient<Self> {
        &ctx.transactions
    }

    fn columns() -> &'static [(&'static str, &'static str)] {
        &[
            ("accountType", "Account Type"),
            ("transactionDate", "Transaction Date"),
            ("chequeNumber", "Cheque Number"),
            ("description1", "Description 1"),
            ("description2", "Description 2"),
            ("amountCAD", "Amount CAD"),
            ("amountUSD", "Amount USD"),
            ("isTracked", "Is Tracked"),
            ("income", "Income"),
            ("expense", "Expense"),
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            escape_opt(self.account_type.as_deref()),
            display(self.transaction_date.as_ref()),
            escape_opt(self.cheque_number.as_deref()),
            escape_opt(self.description1.as_deref()),
            escape_opt(self.description2.as_deref()),
            self.amount_cad.map(|d| d.to_string()).unwrap_or_default(),
            self.amount_usd.map(|d| d.to_string()).unwrap_or_default(),
            self.is_tracked.unwrap_or(false).to_string(),
            self.income
                .as_ref()
                .map(|i| reference_link::<Income>(i.id, i.name.as_deref()))
                .unwrap_or_default(),
            self.expense
                .as_ref()
                .map(|e| reference_link::<Expense>(e.id, e.name.as_deref()))
                .unwrap_or_default(),
        ]
    }

    fn detail_rows(&self) -> Vec<(&'static str, String)> {
        Self::columns()
            .iter()
            .map(|(_, header)| *header)
            .zip(self.cells())
            .collect()
    }

    async fn load_choices(ctx: &AppContext) -> ClientResult<TransactionChoices> {
        let (incomes, expenses) = tokio::try_join!(ctx.incomes.list(None), ctx.expenses.list(None))?;
        Ok(TransactionChoices {
            incomes: incomes.records,
            expenses: expenses.records,
        })
    }

    fn form_fields(&self, choices: &TransactionChoices) -> String {
        let date_value = match (&self.transaction_date, self.id) {
            (Some(date), _) => to_form_value(Some(date)),
            (None, None) => default_form_value(Utc::now()),
            (None, Some(_)) => String::new(),
        };
        let incomes = options(&choices.incomes, |i| i.name.clone());
        let expenses = options(&choices.expenses, |e| e.name.clone());
        let income_id = self.income.as_ref().and_then(|i| i.id).map(|id| id.to_string());
        let expense_id = self.expense.as_ref().and_then(|e| e.id).map(|id| id.to_string());

        [
            text_input("accountType", "Account Type", self.account_type.as_deref(), false),
            datetime_input("transactionDate", "Transaction Date", &date_value),
            text_input("chequeNumber", "Cheque Number", self.cheque_number.as_deref(), false),
            text_input("description1", "Description 1", self.description1.as_deref(), false),
            text_input("description2", "Description 2", self.description2.as_deref(), false),
            number_input("amountCAD", "Amount CAD", self.amount_cad.as_ref()),
            number_input("amountUSD", "Amount USD", self.amount_usd.as_ref()),
            checkbox_input("isTracked", "Is Tracked", self.is_tracked.unwrap_or(false)),
            select_input("incomeId", "Income", &incomes, income_id.as_deref()),
            select_input("expenseId", "Expense", &expenses, expense_id.as_deref()),
        ]
        .concat()
    }

    fn from_form(form: &FormData, choices: &TransactionChoices) -> Self {
        Transaction {
            id: None,
            account_type: form.text("accountType"),
            transaction_date: form.datetime("transactionDate"),
            cheque_number: form.text("chequeNumber"),
            description1: form.text("description1"),
            description2: form.text("description2"),
            amount_cad: form.decimal("amountCAD"),
            amount_usd: form.decimal("amountUSD"),
            is_tracked: Some(form.checked("isTracked")),
            income: resolve_reference(&choices.incomes, form.value("incomeId")),
            expense: resolve_reference(&choices.expenses, form.value("expenseId")),
        }
    }
}
