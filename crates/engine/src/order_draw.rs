//! Order draw snapshot rows.
//!
//! One [`OrderDraw`] per formula ingredient is persisted with the order at
//! submit time. `material_id` is the material the quantity was drawn from,
//! or `None` when the ingredient matched nothing in the material catalog
//! (the skip is recorded here for audit instead of failing the order).

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, Grams};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderDraw {
    pub id: Uuid,
    pub order_id: Uuid,
    pub material_id: Option<Uuid>,
    pub ingredient: String,
    pub quantity_g: Grams,
}

impl OrderDraw {
    pub(crate) fn new(
        order_id: Uuid,
        material_id: Option<Uuid>,
        ingredient: String,
        quantity_g: Grams,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            material_id,
            ingredient,
            quantity_g,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "order_draws")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub order_id: String,
    pub position: i32,
    pub material_id: Option<String>,
    pub ingredient: String,
    pub quantity_g: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Orders,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn active_model(position: i32, draw: &OrderDraw) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(draw.id.to_string()),
        order_id: ActiveValue::Set(draw.order_id.to_string()),
        position: ActiveValue::Set(position),
        material_id: ActiveValue::Set(draw.material_id.map(|id| id.to_string())),
        ingredient: ActiveValue::Set(draw.ingredient.clone()),
        quantity_g: ActiveValue::Set(draw.quantity_g.grams()),
    }
}

impl TryFrom<Model> for OrderDraw {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("order draw".to_string()))?,
            order_id: Uuid::parse_str(&model.order_id)
                .map_err(|_| EngineError::NotFound("order".to_string()))?,
            material_id: model
                .material_id
                .as_deref()
                .map(Uuid::parse_str)
                .transpose()
                .map_err(|_| EngineError::NotFound("material".to_string()))?,
            ingredient: model.ingredient,
            quantity_g: Grams::new(model.quantity_g),
        })
    }
}
