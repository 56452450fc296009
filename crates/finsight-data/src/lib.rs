#![warn(missing_docs)]
//! # finsight-data
//!
//! ## Purpose
//! Implements the feature data loaders layered on the authorized API client:
//! accounts, bills, budgets, transactions and insights, plus the dashboard
//! fan-out aggregation.
//!
//! ## Responsibilities
//! - Wrap each feature area's endpoints behind a typed loader.
//! - Work around the unreliable bill-list endpoint with a fallback chain
//!   (primary list -> secondary list -> per-id reconstruction) and a
//!   speculative in-memory bill cache keyed by id.
//! - Aggregate the four dashboard branches with per-branch error isolation.
//! - Compute deterministic background-refresh schedules for host loops.
//!
//! ## Data flow
//! Views call loaders -> loaders go through [`finsight_http::ApiClient`]
//! (bearer injection, retry, 401/403 recovery) -> typed models return to the
//! view; bill results merge with the speculative cache on the way out.
//!
//! ## Ownership and lifetimes
//! Loaders share the client by `Arc` and own their caches; all returned
//! models are owned values.
//!
//! ## Error model
//! Loader failures surface as [`finsight_http::ApiError`] and are handled
//! locally by the calling view; only the dashboard aggregation absorbs
//! branch failures into per-branch error strings. Nothing here is fatal.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use finsight_core::{
    Account, Bill, Budget, BudgetSpending, CategorySpending, Page, RemainingIncome,
    SpendingTrendPoint, Transaction, total_balance,
};
use finsight_http::{ApiClient, ApiError, HttpMethod, to_body};
use serde_json::Value;
use thiserror::Error;

/// Loader over the account endpoints.
pub struct AccountsApi {
    client: Arc<ApiClient>,
}

impl AccountsApi {
    /// Creates the loader.
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Lists the user's accounts.
    ///
    /// # Errors
    /// Propagates API failures for the view to surface locally.
    pub fn list(&self) -> Result<Vec<Account>, ApiError> {
        self.client.get_json("/api/accounts", &[])
    }

    /// Fetches one account.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn get(&self, id: u64) -> Result<Account, ApiError> {
        self.client.get_json(&format!("/api/accounts/{id}"), &[])
    }

    /// Creates an account.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn create(&self, account: &Account) -> Result<Account, ApiError> {
        self.client.post_json("/api/accounts", account)
    }

    /// Updates an account.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn update(&self, id: u64, account: &Account) -> Result<Account, ApiError> {
        self.client.put_json(&format!("/api/accounts/{id}"), account)
    }

    /// Deletes an account.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.client
            .send_unit(HttpMethod::Delete, &format!("/api/accounts/{id}"), None)
    }

    /// Returns the total balance across accounts.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn balance(&self) -> Result<f64, ApiError> {
        self.client.get_json("/api/accounts/balance", &[])
    }

    /// Links an aggregator account from a public token.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn link(&self, public_token: &str) -> Result<Value, ApiError> {
        self.client.post_json(
            "/api/accounts/link",
            &serde_json::json!({ "publicToken": public_token }),
        )
    }

    /// Triggers a backend sync for one account.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn sync(&self, id: u64) -> Result<(), ApiError> {
        self.client.send_unit(
            HttpMethod::Post,
            &format!("/api/accounts/{id}/sync"),
            Some(serde_json::json!({})),
        )
    }

    /// Lists transactions for one account.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn transactions(&self, id: u64) -> Result<Vec<Transaction>, ApiError> {
        self.client
            .get_json(&format!("/api/accounts/{id}/transactions"), &[])
    }
}

/// Speculative in-memory bill cache keyed by bill id.
///
/// Populated when a create succeeds before the list endpoint reflects it, or
/// when a bill is reconstructed during list fallback. Process lifetime;
/// never persisted.
#[derive(Debug, Default)]
pub struct BillCache {
    entries: Mutex<HashMap<u64, Bill>>,
}

impl BillCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a bill.
    pub fn insert(&self, bill: Bill) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(bill.id, bill);
        }
    }

    /// Removes a bill by id.
    pub fn remove(&self, id: u64) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(&id);
        }
    }

    /// Returns cached bill ids in ascending order.
    pub fn ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = match self.entries.lock() {
            Ok(entries) => entries.keys().copied().collect(),
            Err(_) => Vec::new(),
        };
        ids.sort_unstable();
        ids
    }

    /// Returns all cached bills, ordered by id.
    pub fn snapshot(&self) -> Vec<Bill> {
        let mut bills: Vec<Bill> = match self.entries.lock() {
            Ok(entries) => entries.values().cloned().collect(),
            Err(_) => Vec::new(),
        };
        bills.sort_unstable_by_key(|bill| bill.id);
        bills
    }

    /// Clears the cache.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Merges a server list with cached bills: the server copy wins on id
    /// collisions, cached bills the server has not caught up with are
    /// appended. Result is ordered by id.
    pub fn merge_with_server(&self, server: Vec<Bill>) -> Vec<Bill> {
        let mut merged: HashMap<u64, Bill> = match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(_) => HashMap::new(),
        };
        for bill in server {
            merged.insert(bill.id, bill);
        }
        let mut bills: Vec<Bill> = merged.into_values().collect();
        bills.sort_unstable_by_key(|bill| bill.id);
        bills
    }
}

/// Loader over the bill endpoints, including the list fallback chain.
pub struct BillsApi {
    client: Arc<ApiClient>,
    cache: BillCache,
}

impl BillsApi {
    /// Creates the loader with an empty speculative cache.
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            cache: BillCache::new(),
        }
    }

    /// Returns the speculative bill cache.
    pub fn cache(&self) -> &BillCache {
        &self.cache
    }

    /// Lists a user's bills, falling back when the combined list response
    /// cannot be decoded: primary per-user endpoint -> secondary query-form
    /// endpoint -> per-id reconstruction from the speculative cache. Any
    /// successful stage is merged with the cache, deduplicated by id with
    /// the server copy winning.
    ///
    /// # Errors
    /// Propagates non-decoding failures from the primary endpoint; once the
    /// chain reaches per-id reconstruction it degrades to cached copies
    /// instead of failing.
    pub fn user_bills(&self, user_id: u64) -> Result<Vec<Bill>, ApiError> {
        match self
            .client
            .get_json::<Vec<Bill>>(&format!("/api/bills/user/{user_id}"), &[])
        {
            Ok(bills) => Ok(self.cache.merge_with_server(bills)),
            Err(ApiError::MalformedBody(reason)) => {
                log::warn!("primary bill list undecodable ({reason}), trying secondary endpoint");
                self.user_bills_secondary(user_id)
            }
            Err(error) => Err(error),
        }
    }

    fn user_bills_secondary(&self, user_id: u64) -> Result<Vec<Bill>, ApiError> {
        match self
            .client
            .get_json::<Vec<Bill>>("/api/bills", &[("userId", user_id.to_string())])
        {
            Ok(bills) => Ok(self.cache.merge_with_server(bills)),
            Err(ApiError::MalformedBody(reason)) => {
                log::warn!("secondary bill list undecodable ({reason}), reconstructing per id");
                Ok(self.reassemble_from_cache())
            }
            Err(error) => Err(error),
        }
    }

    /// Fetches every cached id individually, refreshing cache entries that
    /// still resolve and keeping the cached copy for those that do not.
    fn reassemble_from_cache(&self) -> Vec<Bill> {
        for id in self.cache.ids() {
            match self.client.get_json::<Bill>(&format!("/api/bills/{id}"), &[]) {
                Ok(bill) => self.cache.insert(bill),
                Err(error) => {
                    log::warn!("per-id bill fetch failed for {id}, keeping cached copy: {error}");
                }
            }
        }
        self.cache.snapshot()
    }

    /// Lists bills currently due.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn due_bills(&self, user_id: u64) -> Result<Vec<Bill>, ApiError> {
        self.client.get_json(&format!("/api/bills/due/{user_id}"), &[])
    }

    /// Creates a bill and speculatively caches the created record so the UI
    /// can display it before the list endpoint catches up.
    ///
    /// # Errors
    /// Propagates API failures; nothing is cached on failure.
    pub fn create(&self, bill: &Bill, user_id: u64) -> Result<Bill, ApiError> {
        let created: Bill = self.client.send_json(
            HttpMethod::Post,
            "/api/bills",
            &[("userId", user_id.to_string())],
            &[],
            Some(to_body(bill)?),
        )?;
        self.cache.insert(created.clone());
        Ok(created)
    }

    /// Updates a bill, refreshing any cached copy.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn update(&self, id: u64, bill: &Bill) -> Result<Bill, ApiError> {
        let updated: Bill = self.client.put_json(&format!("/api/bills/{id}"), bill)?;
        self.cache.insert(updated.clone());
        Ok(updated)
    }

    /// Deletes a bill, evicting any cached copy.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.client
            .send_unit(HttpMethod::Delete, &format!("/api/bills/{id}"), None)?;
        self.cache.remove(id);
        Ok(())
    }

    /// Marks a bill paid.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn mark_paid(&self, id: u64) -> Result<(), ApiError> {
        self.client.send_unit(
            HttpMethod::Patch,
            &format!("/api/bills/{id}/pay"),
            Some(serde_json::json!({})),
        )
    }

    /// Marks a bill unpaid.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn mark_unpaid(&self, id: u64) -> Result<(), ApiError> {
        self.client.send_unit(
            HttpMethod::Patch,
            &format!("/api/bills/{id}/unpay"),
            Some(serde_json::json!({})),
        )
    }

    /// Returns income remaining after bills.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn remaining_income(&self, user_id: u64) -> Result<RemainingIncome, ApiError> {
        self.client
            .get_json(&format!("/api/bills/remaining-income/{user_id}"), &[])
    }

    /// Resets recurring bills to unpaid for a new month.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn reset_monthly(&self, user_id: u64) -> Result<(), ApiError> {
        self.client.send_unit(
            HttpMethod::Post,
            &format!("/api/bills/reset-monthly/{user_id}"),
            Some(serde_json::json!({})),
        )
    }

    /// Lists a user's bills in one category.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn by_category(&self, user_id: u64, category_id: u64) -> Result<Vec<Bill>, ApiError> {
        self.client.get_json(
            &format!("/api/bills/user/{user_id}/category/{category_id}"),
            &[],
        )
    }
}

/// Loader over the budget endpoints.
pub struct BudgetsApi {
    client: Arc<ApiClient>,
}

impl BudgetsApi {
    /// Creates the loader.
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Lists all budgets.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn list(&self) -> Result<Vec<Budget>, ApiError> {
        self.client.get_json("/api/budgets", &[])
    }

    /// Lists currently active budgets.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn active(&self) -> Result<Vec<Budget>, ApiError> {
        self.client.get_json("/api/budgets/active", &[])
    }

    /// Fetches one budget.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn get(&self, id: u64) -> Result<Budget, ApiError> {
        self.client.get_json(&format!("/api/budgets/{id}"), &[])
    }

    /// Creates a budget.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn create(&self, budget: &Budget) -> Result<Budget, ApiError> {
        self.client.post_json("/api/budgets", budget)
    }

    /// Updates a budget.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn update(&self, id: u64, budget: &Budget) -> Result<Budget, ApiError> {
        self.client.put_json(&format!("/api/budgets/{id}"), budget)
    }

    /// Deletes a budget.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.client
            .send_unit(HttpMethod::Delete, &format!("/api/budgets/{id}"), None)
    }

    /// Returns accumulated spending against one budget.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn spending(&self, id: u64) -> Result<BudgetSpending, ApiError> {
        self.client
            .get_json(&format!("/api/budgets/{id}/spending"), &[])
    }

    /// Lists budgetable categories.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn categories(&self) -> Result<Vec<Value>, ApiError> {
        self.client.get_json("/api/budgets/categories", &[])
    }

    /// Lists transactions counted against one budget.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn transactions(&self, id: u64) -> Result<Vec<Transaction>, ApiError> {
        self.client
            .get_json(&format!("/api/budgets/{id}/transactions"), &[])
    }
}

/// Filter/pagination parameters for transaction listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionQuery {
    /// Restrict to one account.
    pub account_id: Option<u64>,
    /// Restrict to one category.
    pub category_id: Option<u64>,
    /// Inclusive start date (ISO date).
    pub start_date: Option<String>,
    /// Inclusive end date (ISO date).
    pub end_date: Option<String>,
    /// Minimum amount.
    pub min_amount: Option<f64>,
    /// Maximum amount.
    pub max_amount: Option<f64>,
    /// Free-text search.
    pub search: Option<String>,
    /// Zero-based page index.
    pub page: Option<u32>,
    /// Page size.
    pub size: Option<u32>,
}

impl TransactionQuery {
    /// Returns the non-empty parameters as query pairs.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(account_id) = self.account_id {
            pairs.push(("accountId", account_id.to_string()));
        }
        if let Some(category_id) = self.category_id {
            pairs.push(("categoryId", category_id.to_string()));
        }
        if let Some(start_date) = &self.start_date {
            pairs.push(("startDate", start_date.clone()));
        }
        if let Some(end_date) = &self.end_date {
            pairs.push(("endDate", end_date.clone()));
        }
        if let Some(min_amount) = self.min_amount {
            pairs.push(("minAmount", min_amount.to_string()));
        }
        if let Some(max_amount) = self.max_amount {
            pairs.push(("maxAmount", max_amount.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(size) = self.size {
            pairs.push(("size", size.to_string()));
        }
        pairs
    }
}

/// Loader over the transaction endpoints.
pub struct TransactionsApi {
    client: Arc<ApiClient>,
}

impl TransactionsApi {
    /// Creates the loader.
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Lists transactions matching the query, paginated.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn list(&self, query: &TransactionQuery) -> Result<Page<Transaction>, ApiError> {
        self.client
            .get_json("/api/transactions", &query.to_pairs())
    }

    /// Fetches one transaction.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn get(&self, id: u64) -> Result<Transaction, ApiError> {
        self.client.get_json(&format!("/api/transactions/{id}"), &[])
    }

    /// Creates a transaction.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn create(&self, transaction: &Transaction) -> Result<Transaction, ApiError> {
        self.client.post_json("/api/transactions", transaction)
    }

    /// Updates a transaction.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn update(&self, id: u64, transaction: &Transaction) -> Result<Transaction, ApiError> {
        self.client
            .put_json(&format!("/api/transactions/{id}"), transaction)
    }

    /// Deletes a transaction.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.client
            .send_unit(HttpMethod::Delete, &format!("/api/transactions/{id}"), None)
    }

    /// Assigns a category to a transaction.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn categorize(&self, id: u64, category_id: u64) -> Result<Transaction, ApiError> {
        self.client.post_json(
            &format!("/api/transactions/categorize/{id}"),
            &serde_json::json!({ "categoryId": category_id }),
        )
    }

    /// Triggers a backend transaction sync.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn sync(&self) -> Result<(), ApiError> {
        self.client
            .send_unit(HttpMethod::Get, "/api/transactions/sync", None)
    }
}

/// Loader over the AI-insight endpoints.
pub struct InsightsApi {
    client: Arc<ApiClient>,
}

impl InsightsApi {
    /// Creates the loader.
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Returns spending grouped by category over a date window.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn spending_by_category(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<CategorySpending>, ApiError> {
        self.client.get_json(
            "/api/insights/spending-by-category",
            &[
                ("startDate", start_date.to_string()),
                ("endDate", end_date.to_string()),
            ],
        )
    }

    /// Returns the month-over-month spending trend.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn spending_trend(&self, months: u32) -> Result<Vec<SpendingTrendPoint>, ApiError> {
        self.client.get_json(
            "/api/insights/spending-trend",
            &[("months", months.to_string())],
        )
    }

    /// Returns the trend for one category.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn category_trend(
        &self,
        category_id: u64,
        months: u32,
    ) -> Result<Vec<SpendingTrendPoint>, ApiError> {
        self.client.get_json(
            &format!("/api/insights/category-trend/{category_id}"),
            &[("months", months.to_string())],
        )
    }

    /// Returns budget performance metrics.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn budget_performance(&self) -> Result<Value, ApiError> {
        self.client.get_json("/api/insights/budget-performance", &[])
    }

    /// Returns the monthly summary.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn monthly_summary(&self, year: u32, month: u32) -> Result<Value, ApiError> {
        self.client.get_json(
            "/api/insights/monthly-summary",
            &[("year", year.to_string()), ("month", month.to_string())],
        )
    }

    /// Returns AI-suggested budgets.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn suggested_budgets(&self) -> Result<Vec<Budget>, ApiError> {
        self.client.get_json("/api/insights/suggested-budgets", &[])
    }

    /// Returns the top merchants by spending.
    ///
    /// # Errors
    /// Propagates API failures.
    pub fn top_merchants(&self, limit: u32) -> Result<Vec<Value>, ApiError> {
        self.client.get_json(
            "/api/insights/top-merchants",
            &[("limit", limit.to_string())],
        )
    }
}

/// Per-branch error strings for the dashboard fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardErrors {
    /// Accounts branch failure, if any.
    pub accounts: Option<String>,
    /// Recent-transactions branch failure, if any.
    pub transactions: Option<String>,
    /// Budgets branch failure, if any.
    pub budgets: Option<String>,
    /// Insights branch failure, if any.
    pub insights: Option<String>,
}

/// Joined result of the four dashboard branches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    /// Linked accounts.
    pub accounts: Vec<Account>,
    /// Sum of account balances.
    pub total_balance: f64,
    /// Five most recent transactions.
    pub recent_transactions: Vec<Transaction>,
    /// Active budgets, with per-budget spending filled in when available.
    pub active_budgets: Vec<Budget>,
    /// Current-month spending grouped by category.
    pub spending_by_category: Vec<CategorySpending>,
    /// Per-branch failures; successful branches leave `None`.
    pub errors: DashboardErrors,
    /// `false` once every branch has settled. Set exactly once per load.
    pub loading: bool,
}

/// Number of recent transactions shown on the dashboard.
pub const DASHBOARD_RECENT_TRANSACTIONS: u32 = 5;

/// Fans out the four dashboard loads and joins once all have settled.
///
/// Branch failures are isolated: a failing branch records its error string
/// and leaves defaults in place without cancelling the other branches. The
/// snapshot's `loading` flag flips to `false` exactly once, after the join.
pub fn load_dashboard(
    accounts: &AccountsApi,
    transactions: &TransactionsApi,
    budgets: &BudgetsApi,
    insights: &InsightsApi,
    month_start: &str,
    month_end: &str,
) -> DashboardSnapshot {
    let mut snapshot = DashboardSnapshot {
        loading: true,
        ..DashboardSnapshot::default()
    };

    match accounts.list() {
        Ok(listed) => {
            snapshot.total_balance = total_balance(&listed);
            snapshot.accounts = listed;
        }
        Err(error) => {
            log::warn!("dashboard accounts branch failed: {error}");
            snapshot.errors.accounts = Some("Failed to load accounts".to_string());
        }
    }

    let recent = TransactionQuery {
        page: Some(0),
        size: Some(DASHBOARD_RECENT_TRANSACTIONS),
        ..TransactionQuery::default()
    };
    match transactions.list(&recent) {
        Ok(page) => snapshot.recent_transactions = page.content,
        Err(error) => {
            log::warn!("dashboard transactions branch failed: {error}");
            snapshot.errors.transactions = Some("Failed to load recent transactions".to_string());
        }
    }

    match budgets.active() {
        Ok(mut active) => {
            // Per-budget spending failures are absorbed; the budget still
            // renders without a progress figure.
            for budget in &mut active {
                match budgets.spending(budget.id) {
                    Ok(spending) => budget.current_spending = Some(spending.current_spending),
                    Err(error) => {
                        log::warn!("spending lookup failed for budget {}: {error}", budget.id);
                    }
                }
            }
            snapshot.active_budgets = active;
        }
        Err(error) => {
            log::warn!("dashboard budgets branch failed: {error}");
            snapshot.errors.budgets = Some("Failed to load budgets".to_string());
        }
    }

    match insights.spending_by_category(month_start, month_end) {
        Ok(spending) => snapshot.spending_by_category = spending,
        Err(error) => {
            log::warn!("dashboard insights branch failed: {error}");
            snapshot.errors.insights = Some("Failed to load spending insights".to_string());
        }
    }

    snapshot.loading = false;
    snapshot
}

/// Loading cutoff the bill views apply so a stalled backend never leaves a
/// spinner up indefinitely.
pub const LOADING_CUTOFF_MS: u64 = 3_000;

/// Fixed-period background-refresh schedule for host loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    interval_ms: u64,
}

impl RefreshSchedule {
    /// Creates a validated schedule.
    ///
    /// # Errors
    /// Returns [`ScheduleError::InvalidInterval`] when `interval_ms == 0`.
    pub fn new(interval_ms: u64) -> Result<Self, ScheduleError> {
        if interval_ms == 0 {
            return Err(ScheduleError::InvalidInterval);
        }
        Ok(Self { interval_ms })
    }

    /// Returns the refresh interval in milliseconds.
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Computes `count` deterministic refresh timestamps starting at
    /// `start_ms`. Refreshes are best-effort and are not coalesced with
    /// foreground loads; the host applies last-write-wins on results.
    pub fn refresh_times(&self, start_ms: u64, count: usize) -> Vec<u64> {
        (0..count)
            .map(|index| start_ms.saturating_add(self.interval_ms.saturating_mul(index as u64)))
            .collect()
    }

    /// Returns the instant a load started at `start_ms` must surrender its
    /// loading indicator.
    pub fn loading_deadline(start_ms: u64) -> u64 {
        start_ms.saturating_add(LOADING_CUTOFF_MS)
    }
}

/// Scheduling error type.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Refresh interval must be positive.
    #[error("invalid refresh interval: must be greater than zero")]
    InvalidInterval,
}
