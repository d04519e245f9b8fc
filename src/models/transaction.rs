use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{not_blank, Resource, Validate};

/// Direction of a manual B2B entry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[default]
    Debit,
    Credit,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Debit => "debit",
            TransactionKind::Credit => "credit",
        }
    }

    pub fn parse(value: &str) -> Option<TransactionKind> {
        match value {
            "debit" => Some(TransactionKind::Debit),
            "credit" => Some(TransactionKind::Credit),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub company_name: String,
    #[serde(default)]
    pub items_description: String,
    pub quantity: i64,
    pub total: f64,
    pub kind: TransactionKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Validate)]
pub struct TransactionInput {
    pub date: NaiveDate,
    #[validate(custom(function = "not_blank", message = "Company name is required"))]
    pub company_name: String,
    #[serde(default)]
    pub items_description: String,
    #[validate(range(min = 0, message = "Quantity must not be negative"))]
    pub quantity: i64,
    #[validate(range(min = 0.0, message = "Total must not be negative"))]
    pub total: f64,
    pub kind: TransactionKind,
}

impl Default for TransactionInput {
    fn default() -> Self {
        Self {
            date: Utc::now().date_naive(),
            company_name: String::new(),
            items_description: String::new(),
            quantity: 1,
            total: 0.0,
            kind: TransactionKind::Debit,
        }
    }
}

impl Resource for Transaction {
    const ENDPOINT: &'static str = "transactions";
    const LABEL: &'static str = "transaction";
    type Input = TransactionInput;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_input(&self) -> TransactionInput {
        TransactionInput {
            date: self.date,
            company_name: self.company_name.clone(),
            items_description: self.items_description.clone(),
            quantity: self.quantity,
            total: self.total,
            kind: self.kind,
        }
    }
}

/// Running totals of the saved transactions ledger.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TransactionSummary {
    pub count: i64,
    pub debit: f64,
    pub credit: f64,
    /// `credit - debit`
    pub balance: f64,
}

impl TransactionSummary {
    pub fn of(transactions: &[Transaction]) -> Self {
        let mut summary = TransactionSummary::default();
        for tx in transactions {
            summary.count += 1;
            match tx.kind {
                TransactionKind::Debit => summary.debit += tx.total,
                TransactionKind::Credit => summary.credit += tx.total,
            }
        }
        summary.balance = summary.credit - summary.debit;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: TransactionKind, total: f64) -> Transaction {
        Transaction {
            id: "t".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            company_name: "Acme Wholesale".into(),
            items_description: "Pepper".into(),
            quantity: 10,
            total,
            kind,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn balance_is_credit_minus_debit() {
        let ledger = vec![
            entry(TransactionKind::Credit, 100.0),
            entry(TransactionKind::Debit, 30.0),
            entry(TransactionKind::Debit, 20.0),
        ];
        let summary = TransactionSummary::of(&ledger);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.debit, 50.0);
        assert_eq!(summary.credit, 100.0);
        assert_eq!(summary.balance, 50.0);
    }

    #[test]
    fn kind_uses_lowercase_wire_name() {
        let json = serde_json::to_string(&TransactionKind::Credit).unwrap();
        assert_eq!(json, "\"credit\"");
    }
}
