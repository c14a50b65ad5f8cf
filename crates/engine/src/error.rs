//! The module contains the errors the engine can return.
//!
//! Every fallible operation returns one of these as a typed result; nothing
//! is thrown across the ledger/catalog boundary as an unchecked failure.
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("\"{0}\" already present!")]
    DuplicateName(String),
    #[error("Invalid ingredients: {0}")]
    InvalidIngredients(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Formula \"{0}\" not found!")]
    FormulaNotFound(String),
    #[error("Missing consumption: {0}")]
    MissingConsumption(String),
    #[error("Ledger failure: {0}")]
    LedgerFailure(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::InvalidTransaction(a), Self::InvalidTransaction(b)) => a == b,
            (Self::DuplicateName(a), Self::DuplicateName(b)) => a == b,
            (Self::InvalidIngredients(a), Self::InvalidIngredients(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::FormulaNotFound(a), Self::FormulaNotFound(b)) => a == b,
            (Self::MissingConsumption(a), Self::MissingConsumption(b)) => a == b,
            (Self::LedgerFailure(a), Self::LedgerFailure(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
