//! Production orders.
//!
//! An order applies a formula at a given batch weight and batch count. Once
//! submitted it is immutable: corrections happen through new offsetting
//! ledger entries, never by editing the order. The per-ingredient draw
//! quantities computed at submit time are persisted with the order as an
//! audit snapshot, so later formula edits cannot rewrite history.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, Grams, ResultEngine, order_draw::OrderDraw};

/// Caller-supplied order fields, validated before anything is planned.
#[derive(Clone, Debug)]
pub struct OrderDraft {
    /// Production date as submitted (free-form, e.g. "11/02/2026").
    pub date: String,
    pub shift: String,
    pub order_no: String,
    pub machine_no: String,
    pub operator: String,
    pub batch_no: String,
    pub batch_weight_g: Grams,
    pub number_of_batches: i64,
    pub remarks: Option<String>,
    pub formula_id: Uuid,
}

impl OrderDraft {
    pub(crate) fn validate(&self) -> ResultEngine<()> {
        let required = [
            (&self.date, "date"),
            (&self.shift, "shift"),
            (&self.order_no, "order number"),
            (&self.machine_no, "machine number"),
            (&self.operator, "operator"),
            (&self.batch_no, "batch number"),
        ];
        for (value, field) in required {
            if value.trim().is_empty() {
                return Err(EngineError::Validation(format!("{field} is required")));
            }
        }
        if !self.batch_weight_g.is_positive() {
            return Err(EngineError::Validation(
                "batch weight must be positive".to_string(),
            ));
        }
        if self.number_of_batches < 1 {
            return Err(EngineError::Validation(
                "number of batches must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A submitted production order with its draw snapshot.
#[derive(Clone, Debug)]
pub struct Order {
    pub id: Uuid,
    pub date: String,
    pub shift: String,
    pub order_no: String,
    pub machine_no: String,
    pub operator: String,
    pub batch_no: String,
    pub batch_weight_g: Grams,
    pub number_of_batches: i64,
    pub remarks: Option<String>,
    pub formula_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub draws: Vec<OrderDraw>,
}

impl Order {
    pub(crate) fn from_draft(draft: OrderDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: draft.date,
            shift: draft.shift,
            order_no: draft.order_no,
            machine_no: draft.machine_no,
            operator: draft.operator,
            batch_no: draft.batch_no,
            batch_weight_g: draft.batch_weight_g,
            number_of_batches: draft.number_of_batches,
            remarks: draft.remarks,
            formula_id: draft.formula_id,
            created_at,
            draws: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub date: String,
    pub shift: String,
    pub order_no: String,
    pub machine_no: String,
    pub operator: String,
    pub batch_no: String,
    pub batch_weight_g: i64,
    pub number_of_batches: i64,
    pub remarks: Option<String>,
    /// Weak reference: the formula may be edited or deleted later; the draw
    /// snapshot keeps the order self-contained.
    pub formula_id: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_draw::Entity")]
    Draws,
}

impl Related<super::order_draw::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Draws.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Order> for ActiveModel {
    fn from(order: &Order) -> Self {
        Self {
            id: ActiveValue::Set(order.id.to_string()),
            date: ActiveValue::Set(order.date.clone()),
            shift: ActiveValue::Set(order.shift.clone()),
            order_no: ActiveValue::Set(order.order_no.clone()),
            machine_no: ActiveValue::Set(order.machine_no.clone()),
            operator: ActiveValue::Set(order.operator.clone()),
            batch_no: ActiveValue::Set(order.batch_no.clone()),
            batch_weight_g: ActiveValue::Set(order.batch_weight_g.grams()),
            number_of_batches: ActiveValue::Set(order.number_of_batches),
            remarks: ActiveValue::Set(order.remarks.clone()),
            formula_id: ActiveValue::Set(order.formula_id.to_string()),
            created_at: ActiveValue::Set(order.created_at),
        }
    }
}

impl TryFrom<Model> for Order {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("order".to_string()))?,
            date: model.date,
            shift: model.shift,
            order_no: model.order_no,
            machine_no: model.machine_no,
            operator: model.operator,
            batch_no: model.batch_no,
            batch_weight_g: Grams::new(model.batch_weight_g),
            number_of_batches: model.number_of_batches,
            remarks: model.remarks,
            formula_id: Uuid::parse_str(&model.formula_id)
                .map_err(|_| EngineError::FormulaNotFound(model.formula_id.clone()))?,
            created_at: model.created_at,
            draws: Vec::new(),
        })
    }
}
