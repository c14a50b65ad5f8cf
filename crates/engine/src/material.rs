//! The module contains the `Material` struct and its implementation.
//!
//! A material is one raw-material stock position (a rubber polymer, a
//! chemical, ...). Its balance is backed by an append-only transaction log;
//! the cached `balance_g` always equals the balance of the log tail and is
//! mutated only by posting entries.

use std::fmt;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, Grams, ResultEngine, ledger_entry::LedgerEntry};

/// Stock category of a material.
///
/// `rubber` and `chemical` are the well-known categories; anything else is
/// preserved verbatim as an open string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MaterialCategory {
    Rubber,
    Chemical,
    Other(String),
}

impl MaterialCategory {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Rubber => "rubber",
            Self::Chemical => "chemical",
            Self::Other(s) => s,
        }
    }

    /// Case-insensitive category comparison used by list filters.
    #[must_use]
    pub fn matches(&self, filter: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(filter.trim())
    }
}

impl From<&str> for MaterialCategory {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "rubber" => Self::Rubber,
            "chemical" => Self::Chemical,
            _ => Self::Other(trimmed.to_string()),
        }
    }
}

impl fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw material with its transaction history.
#[derive(Clone, Debug)]
pub struct Material {
    /// Stable identifier, generated once and persisted so the material can
    /// be referenced by orders and logs regardless of display name.
    pub id: Uuid,
    pub name: String,
    pub category: MaterialCategory,
    /// Cached balance; always equals the tail of `entries` (zero when the
    /// log is empty). See [`Material::is_reconciled`].
    pub balance_g: Grams,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<LedgerEntry>,
}

/// Lightweight listing row: a material without its history.
#[derive(Clone, Debug)]
pub struct MaterialSummary {
    pub id: Uuid,
    pub name: String,
    pub category: MaterialCategory,
    pub balance_g: Grams,
}

impl Material {
    pub fn new(name: String, category: MaterialCategory, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            category,
            balance_g: Grams::ZERO,
            created_at,
            entries: Vec::new(),
        }
    }

    /// Balance of the log tail, zero when the log is empty.
    #[must_use]
    pub fn last_balance(&self) -> Grams {
        self.entries
            .last()
            .map(|entry| entry.balance_g)
            .unwrap_or(Grams::ZERO)
    }

    /// Builds the next ledger entry without mutating the material.
    ///
    /// Validates the transaction (`inward >= 0`, `outward >= 0`, at least
    /// one nonzero) and chains the running balance off the log tail. The
    /// entry only becomes part of the log via [`Material::apply_entry`],
    /// after the database write committed.
    pub fn stage_entry(
        &self,
        recorded_at: DateTime<Utc>,
        particulars: String,
        inward_g: Grams,
        outward_g: Grams,
        remarks: Option<String>,
    ) -> ResultEngine<LedgerEntry> {
        if particulars.trim().is_empty() {
            return Err(EngineError::InvalidTransaction(
                "particulars are required".to_string(),
            ));
        }
        if inward_g.is_negative() || outward_g.is_negative() {
            return Err(EngineError::InvalidTransaction(
                "inward and outward must be non-negative".to_string(),
            ));
        }
        if inward_g.is_zero() && outward_g.is_zero() {
            return Err(EngineError::InvalidTransaction(
                "at least one of inward and outward must be nonzero".to_string(),
            ));
        }

        let balance = self.last_balance() + inward_g - outward_g;
        Ok(LedgerEntry::new(
            self.id,
            self.entries.len() as i32,
            recorded_at,
            particulars,
            inward_g,
            outward_g,
            balance,
            remarks,
        ))
    }

    /// Appends a staged entry and moves the cached balance to the new tail.
    pub fn apply_entry(&mut self, entry: LedgerEntry) {
        debug_assert_eq!(entry.seq as usize, self.entries.len());
        self.balance_g = entry.balance_g;
        self.entries.push(entry);
    }

    /// Reconciliation check: the cached balance must equal the log tail.
    #[must_use]
    pub fn is_reconciled(&self) -> bool {
        self.balance_g == self.last_balance()
    }

    #[must_use]
    pub fn summary(&self) -> MaterialSummary {
        MaterialSummary {
            id: self.id,
            name: self.name.clone(),
            category: self.category.clone(),
            balance_g: self.balance_g,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "materials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub category: String,
    pub balance_g: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger_entry::Entity")]
    LedgerEntries,
}

impl Related<super::ledger_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Material> for ActiveModel {
    fn from(material: &Material) -> Self {
        Self {
            id: ActiveValue::Set(material.id.to_string()),
            name: ActiveValue::Set(material.name.clone()),
            category: ActiveValue::Set(material.category.as_str().to_string()),
            balance_g: ActiveValue::Set(material.balance_g.grams()),
            created_at: ActiveValue::Set(material.created_at),
        }
    }
}
