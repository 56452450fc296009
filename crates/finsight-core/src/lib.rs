#![warn(missing_docs)]
//! # finsight-core
//!
//! ## Purpose
//! Defines the pure data model used across the `finsight` workspace.
//!
//! ## Responsibilities
//! - Represent the authenticated user record with open-ended backend fields.
//! - Represent the feature resources (accounts, bills, budgets, transactions)
//!   and the insight summaries derived from them.
//! - Represent the paginated listing shape used by transaction queries.
//!
//! ## Data flow
//! JSON response bodies deserialize into these types inside the HTTP layer.
//! Loaders and session code pass owned model values upward; nothing in this
//! crate performs I/O.
//!
//! ## Ownership and lifetimes
//! All models own their string/collection fields so session state, caches and
//! loaders can hold them without borrow coupling across layers.
//!
//! ## Error model
//! Deserialization leniency is handled at the serde boundary (defaults,
//! number-or-string id normalization); this crate exposes no error type of
//! its own.
//!
//! ## Example
//! ```rust
//! use finsight_core::User;
//!
//! let user: User = serde_json::from_str(
//!     r#"{"id":"7","email":"u@x.com","firstName":"A","lastName":"B"}"#,
//! ).unwrap();
//! assert_eq!(user.id, Some(7));
//! assert!(user.is_complete());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Authenticated user record.
///
/// The backend is inconsistent about the `id` wire type (number or numeric
/// string), so it is normalized to `Option<u64>` on the way in. Fields the
/// front end does not model explicitly are retained in `extra` and written
/// back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend user id; `None` when the backend omitted it or sent a
    /// non-numeric value.
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<u64>,
    /// Login email address.
    #[serde(default)]
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Open-ended backend fields carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Returns `true` when the record carries a usable id.
    ///
    /// A user without an id cannot key any per-user endpoint and is treated
    /// as an incomplete profile by the session layer.
    pub fn is_complete(&self) -> bool {
        self.id.is_some()
    }
}

/// Linked financial account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account id.
    pub id: u64,
    /// Owning user id.
    #[serde(default)]
    pub user_id: u64,
    /// Aggregator-side account identifier.
    #[serde(default)]
    pub plaid_account_id: String,
    /// Display name.
    pub name: String,
    /// Account type (checking, savings, credit, ...).
    #[serde(rename = "type", default)]
    pub account_type: String,
    /// Account subtype reported by the aggregator.
    #[serde(default)]
    pub subtype: String,
    /// Current balance.
    pub balance: f64,
    /// ISO currency code.
    #[serde(default)]
    pub currency: String,
    /// Last sync timestamp as reported by the backend.
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// Recurring or one-off bill tracked on the bill dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    /// Bill id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Amount due per cycle.
    pub amount: f64,
    /// Day of month the bill is due (1-31).
    pub due_day: u32,
    /// Whether the bill is paid for the current cycle.
    #[serde(default)]
    pub is_paid: bool,
    /// Whether the bill recurs monthly.
    #[serde(default)]
    pub is_recurring: bool,
    /// Owning user id, when the backend includes it.
    #[serde(default)]
    pub user_id: Option<u64>,
    /// Spending category, when assigned.
    #[serde(default)]
    pub category_id: Option<u64>,
}

/// Spending budget over a category and period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// Budget id.
    pub id: u64,
    /// Owning user id.
    #[serde(default)]
    pub user_id: u64,
    /// Display name.
    pub name: String,
    /// Budgeted amount for the period.
    pub amount: f64,
    /// Budgeted category.
    #[serde(default)]
    pub category_id: Option<u64>,
    /// Period label (monthly, weekly, ...).
    #[serde(default)]
    pub period: String,
    /// Period start date (ISO date).
    #[serde(default)]
    pub start_date: String,
    /// Period end date, open-ended when absent.
    #[serde(default)]
    pub end_date: Option<String>,
    /// Fraction of the budget at which the UI warns.
    #[serde(default)]
    pub warning_threshold: f64,
    /// Spending accumulated so far, filled from the spending endpoint.
    #[serde(default)]
    pub current_spending: Option<f64>,
    /// Category display name, when the backend joins it in.
    #[serde(default)]
    pub category_name: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Single ledger transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Transaction id.
    pub id: u64,
    /// Source account id.
    #[serde(default)]
    pub account_id: u64,
    /// Aggregator-side transaction identifier.
    #[serde(default)]
    pub plaid_transaction_id: String,
    /// Posting date (ISO date).
    #[serde(default)]
    pub date: String,
    /// Signed amount.
    pub amount: f64,
    /// Transaction name as reported by the institution.
    #[serde(default)]
    pub name: String,
    /// Cleaned merchant name, when available.
    #[serde(default)]
    pub merchant_name: Option<String>,
    /// Whether the transaction is still pending.
    #[serde(default)]
    pub pending: bool,
    /// Assigned spending category.
    #[serde(default)]
    pub category_id: Option<u64>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Account display name, when the backend joins it in.
    #[serde(default)]
    pub account_name: Option<String>,
}

/// Paginated listing shape returned by the transaction endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub content: Vec<T>,
    /// Total matching items across all pages.
    #[serde(default)]
    pub total_elements: u64,
    /// Total page count.
    #[serde(default)]
    pub total_pages: u32,
}

/// Per-category spending total used by the insights dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpending {
    /// Category id, when the backend provides one.
    #[serde(default)]
    pub category_id: Option<u64>,
    /// Category display name.
    #[serde(default)]
    pub category_name: String,
    /// Spending total for the requested window.
    pub amount: f64,
}

/// Accumulated spending against one budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSpending {
    /// Spending accumulated in the budget period so far.
    pub current_spending: f64,
    /// Open-ended backend fields carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Income left over after accounting for bills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemainingIncome {
    /// Remaining income for the current month.
    pub remaining_income: f64,
}

/// One point on a month-over-month spending trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingTrendPoint {
    /// Month label (`YYYY-MM`).
    pub month: String,
    /// Spending total for the month.
    pub amount: f64,
}

/// Sums account balances for the dashboard total.
pub fn total_balance(accounts: &[Account]) -> f64 {
    accounts.iter().map(|account| account.balance).sum()
}

/// Sums bill amounts (dashboard totals for due/unpaid groupings).
pub fn total_bill_amount(bills: &[Bill]) -> f64 {
    bills.iter().map(|bill| bill.amount).sum()
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_u64(),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}
