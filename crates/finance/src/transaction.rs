use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use bims_core::{DomainError, DomainResult, TransactionId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl core::str::FromStr for TransactionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(DomainError::validation(format!(
                "unknown transaction kind '{other}'"
            ))),
        }
    }
}

/// Treasury transaction (immutable once recorded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub category: String,
    /// Positive amount in centavos.
    pub amount: i64,
    pub description: String,
    pub transaction_date: NaiveDate,
    pub recorded_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub category: String,
    pub amount: i64,
    pub description: String,
    pub transaction_date: NaiveDate,
}

/// Income/expense totals over a set of transactions, in centavos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinanceSummary {
    pub total_income: i64,
    pub total_expense: i64,
    pub net: i64,
}

impl Transaction {
    pub fn create(
        id: TransactionId,
        new: NewTransaction,
        recorded_by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let category = new.category.trim().to_string();
        if category.is_empty() {
            return Err(DomainError::validation("category cannot be empty"));
        }
        if new.amount <= 0 {
            return Err(DomainError::validation("amount must be positive"));
        }

        Ok(Self {
            id,
            kind: new.kind,
            category,
            amount: new.amount,
            description: new.description.trim().to_string(),
            transaction_date: new.transaction_date,
            recorded_by,
            created_at: now,
        })
    }
}

/// Fold transactions into totals.
pub fn summarize<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> FinanceSummary {
    let mut summary = FinanceSummary::default();
    for tx in transactions {
        match tx.kind {
            TransactionKind::Income => summary.total_income += tx.amount,
            TransactionKind::Expense => summary.total_expense += tx.amount,
        }
    }
    summary.net = summary.total_income - summary.total_expense;
    summary
}
