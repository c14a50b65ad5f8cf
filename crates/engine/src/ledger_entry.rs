//! Ledger entries.
//!
//! A [`LedgerEntry`] is one immutable line in a material's transaction
//! history. Entries are append-only: once written they are never edited or
//! removed, and the running `balance_g` of each entry is computed from the
//! previous entry at posting time.
//!
//! `seq` is the position of the entry inside its material's log and fixes
//! the insertion order across restarts.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, Grams};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub material_id: Uuid,
    pub seq: i32,
    pub recorded_at: DateTime<Utc>,
    pub particulars: String,
    pub inward_g: Grams,
    pub outward_g: Grams,
    /// Running balance after this entry. Signed: the ledger enforces no
    /// floor, so stock may go negative.
    pub balance_g: Grams,
    pub remarks: Option<String>,
}

impl LedgerEntry {
    pub(crate) fn new(
        material_id: Uuid,
        seq: i32,
        recorded_at: DateTime<Utc>,
        particulars: String,
        inward_g: Grams,
        outward_g: Grams,
        balance_g: Grams,
        remarks: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            material_id,
            seq,
            recorded_at,
            particulars,
            inward_g,
            outward_g,
            balance_g,
            remarks,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub material_id: String,
    pub seq: i32,
    pub recorded_at: DateTimeUtc,
    pub particulars: String,
    pub inward_g: i64,
    pub outward_g: i64,
    pub balance_g: i64,
    pub remarks: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::material::Entity",
        from = "Column::MaterialId",
        to = "super::material::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Materials,
}

impl Related<super::material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Materials.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            material_id: ActiveValue::Set(entry.material_id.to_string()),
            seq: ActiveValue::Set(entry.seq),
            recorded_at: ActiveValue::Set(entry.recorded_at),
            particulars: ActiveValue::Set(entry.particulars.clone()),
            inward_g: ActiveValue::Set(entry.inward_g.grams()),
            outward_g: ActiveValue::Set(entry.outward_g.grams()),
            balance_g: ActiveValue::Set(entry.balance_g.grams()),
            remarks: ActiveValue::Set(entry.remarks.clone()),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("ledger entry".to_string()))?,
            material_id: Uuid::parse_str(&model.material_id)
                .map_err(|_| EngineError::NotFound("material".to_string()))?,
            seq: model.seq,
            recorded_at: model.recorded_at,
            particulars: model.particulars,
            inward_g: Grams::new(model.inward_g),
            outward_g: Grams::new(model.outward_g),
            balance_g: Grams::new(model.balance_g),
            remarks: model.remarks,
        })
    }
}
