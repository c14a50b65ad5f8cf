//! Persistence rows for formula ingredient lines.
//!
//! `position` fixes the ordering of the lines within one formula.

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Grams,
    formula::{Ingredient, IngredientKind},
};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "formula_ingredients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub formula_id: String,
    pub position: i32,
    pub kind: String,
    pub name: String,
    pub ratio_g: i64,
    #[sea_orm(column_type = "Double", nullable)]
    pub phr: Option<f64>,
    pub consumption_g: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::formula::Entity",
        from = "Column::FormulaId",
        to = "super::formula::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Formulas,
}

impl Related<super::formula::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Formulas.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn active_model(
    formula_id: Uuid,
    position: i32,
    ingredient: &Ingredient,
) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        formula_id: ActiveValue::Set(formula_id.to_string()),
        position: ActiveValue::Set(position),
        kind: ActiveValue::Set(ingredient.kind.as_str().to_string()),
        name: ActiveValue::Set(ingredient.name.clone()),
        ratio_g: ActiveValue::Set(ingredient.ratio_g.grams()),
        phr: ActiveValue::Set(ingredient.phr),
        consumption_g: ActiveValue::Set(ingredient.consumption_g.map(Grams::grams)),
    }
}

impl TryFrom<Model> for Ingredient {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            kind: IngredientKind::try_from(model.kind.as_str())?,
            name: model.name,
            ratio_g: Grams::new(model.ratio_g),
            phr: model.phr,
            consumption_g: model.consumption_g.map(Grams::new),
        })
    }
}
