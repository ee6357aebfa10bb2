// Expense record - the single entity of the tracker

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A stored expense.
///
/// `amount` is an exact decimal and serializes as a string (`"19.99"`) so
/// that no scale is lost on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: i64,
    pub description: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

/// Payload for creating an expense. The id is assigned by the store, so any
/// `id` a client sends is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub description: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

impl NewExpense {
    pub fn new(description: impl Into<String>, amount: Decimal, date: DateTime<Utc>) -> Self {
        Self {
            description: description.into(),
            amount,
            date,
        }
    }

    /// Attach the identifier the store assigned.
    pub fn with_id(self, id: i64) -> Expense {
        Expense {
            id,
            description: self.description,
            amount: self.amount,
            date: self.date,
        }
    }
}
