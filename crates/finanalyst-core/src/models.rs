//! Entity records exchanged with the REST backend

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Server-assigned record identifier
pub type EntityId = i64;

/// A persisted business record type served under `/api/<COLLECTION>`
///
/// `Default` is the empty record: no id, every optional field unset. A
/// record without an id has never been persisted; once the server assigns
/// one it never changes.
pub trait Entity:
    Clone + Default + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Singular name, also the route prefix of the view layer (`expense`)
    const NAME: &'static str;
    /// Collection name in REST paths (`expenses`)
    const COLLECTION: &'static str;
    /// Wire names of fields the server rejects when null
    const REQUIRED_FIELDS: &'static [&'static str] = &[];
    /// Wire names the list view may sort by
    const SORTABLE_FIELDS: &'static [&'static str];
    /// Sort field used when the query string names none
    const DEFAULT_SORT: &'static str = "id";

    fn id(&self) -> Option<EntityId>;

    fn set_id(&mut self, id: Option<EntityId>);

    fn is_new(&self) -> bool {
        self.id().is_none()
    }

    /// REST path of the collection
    fn api_path() -> String {
        format!("/api/{}", Self::COLLECTION)
    }

    /// REST path of one record
    fn api_item_path(id: EntityId) -> String {
        format!("/api/{}/{}", Self::COLLECTION, id)
    }

    fn is_sortable(field: &str) -> bool {
        Self::SORTABLE_FIELDS.contains(&field)
    }
}

/// Expense category record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Expense {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub category: Option<String>,
    pub name: Option<String>,
    pub search_string1: Option<String>,
    pub search_string2: Option<String>,
}

impl Entity for Expense {
    const NAME: &'static str = "expense";
    const COLLECTION: &'static str = "expenses";
    const REQUIRED_FIELDS: &'static [&'static str] = &["category", "name"];
    const SORTABLE_FIELDS: &'static [&'static str] =
        &["id", "category", "name", "searchString1", "searchString2"];

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: Option<EntityId>) {
        self.id = id;
    }
}

/// Income source record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Income {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: Option<String>,
    pub search_string1: Option<String>,
    pub search_string2: Option<String>,
}

impl Entity for Income {
    const NAME: &'static str = "income";
    const COLLECTION: &'static str = "incomes";
    const REQUIRED_FIELDS: &'static [&'static str] = &["name"];
    const SORTABLE_FIELDS: &'static [&'static str] =
        &["id", "name", "searchString1", "searchString2"];

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: Option<EntityId>) {
        self.id = id;
    }
}

/// Bank transaction, optionally matched to an income or an expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub account_type: Option<String>,
    pub transaction_date: Option<DateTime<Utc>>,
    pub cheque_number: Option<String>,
    pub description1: Option<String>,
    pub description2: Option<String>,
    #[serde(rename = "amountCAD")]
    pub amount_cad: Option<Decimal>,
    #[serde(rename = "amountUSD")]
    pub amount_usd: Option<Decimal>,
    pub is_tracked: Option<bool>,
    pub income: Option<Income>,
    pub expense: Option<Expense>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            id: None,
            account_type: None,
            transaction_date: None,
            cheque_number: None,
            description1: None,
            description2: None,
            amount_cad: None,
            amount_usd: None,
            is_tracked: Some(false),
            income: None,
            expense: None,
        }
    }
}

impl Entity for Transaction {
    const NAME: &'static str = "transaction";
    const COLLECTION: &'static str = "transactions";
    const SORTABLE_FIELDS: &'static [&'static str] = &[
        "id",
        "accountType",
        "transactionDate",
        "chequeNumber",
        "description1",
        "description2",
        "amountCAD",
        "amountUSD",
        "isTracked",
    ];

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: Option<EntityId>) {
        self.id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_new_record_serializes_without_id() {
        let expense = Expense {
            category: Some("Food".to_string()),
            name: Some("Groceries".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&expense).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["category"], "Food");
        assert_eq!(value["searchString1"], serde_json::Value::Null);
        assert!(expense.is_new());
    }

    #[test]
    fn test_transaction_wire_names() {
        let tx = Transaction {
            id: Some(7),
            transaction_date: Some(Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 0).unwrap()),
            amount_cad: Some(Decimal::new(1250, 2)),
            income: Some(Income {
                id: Some(2),
                ..Default::default()
            }),
            ..Default::default()
        };
        let text = serde_json::to_string(&tx).unwrap();
        assert!(text.contains(r#""amountCAD":12.50"#));
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["isTracked"], false);
        assert_eq!(value["income"]["id"], 2);
        assert_eq!(value["transactionDate"], "2021-03-04T05:06:00Z");
    }

    #[test]
    fn test_amounts_keep_full_precision() {
        let amount = Decimal::from_str_exact("12345678901234567.89").unwrap();
        let tx = Transaction {
            amount_usd: Some(amount),
            ..Default::default()
        };
        let bytes = serde_json::to_vec(&tx).unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("12345678901234567.89"));
        let back: Transaction = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back.amount_usd, Some(amount));
    }

    #[test]
    fn test_transaction_parses_partial_payload() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": 3,
            "amountUSD": 100,
            "transactionDate": "2021-01-01T00:00:00Z",
            "expense": {"id": 4, "name": "Rent", "category": "Housing"}
        }))
        .unwrap();
        assert_eq!(tx.id(), Some(3));
        assert_eq!(tx.amount_usd, Some(Decimal::new(100, 0)));
        assert_eq!(tx.expense.as_ref().and_then(|e| e.id), Some(4));
        assert_eq!(tx.is_tracked, Some(false));
    }

    #[test]
    fn test_paths() {
        assert_eq!(Income::api_path(), "/api/incomes");
        assert_eq!(Transaction::api_item_path(12), "/api/transactions/12");
        assert!(Expense::is_sortable("category"));
        assert!(!Expense::is_sortable("amountCAD"));
    }
}
