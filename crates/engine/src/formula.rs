//! The module contains the representation of a compounding formula.
//!
//! A formula is a named recipe: an ordered list of ingredients with weight
//! ratios and a declared total weight. `lot_multiplier` sizes the base
//! recipe into a production lot; each ingredient's `consumption_g` is the
//! cached per-lot usage (`ratio × lot_multiplier`).
//!
//! The cache is recomputed whenever ratios or the lot multiplier change
//! (create and update both recompute), never trusted from the client. It is
//! still optional on the type because rows written by earlier versions of
//! the system may lack it; the consumption planner refuses such formulas.

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, Grams, ResultEngine, formula_ingredient};

/// Kind of an ingredient line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngredientKind {
    Rubber,
    Chemical,
}

impl IngredientKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rubber => "rubber",
            Self::Chemical => "chemical",
        }
    }
}

impl TryFrom<&str> for IngredientKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rubber" => Ok(Self::Rubber),
            "chemical" => Ok(Self::Chemical),
            other => Err(EngineError::InvalidIngredients(format!(
                "invalid ingredient kind: {other}"
            ))),
        }
    }
}

/// One line of a formula.
#[derive(Clone, Debug, PartialEq)]
pub struct Ingredient {
    pub kind: IngredientKind,
    /// Free-text ingredient name; matched loosely (by normalized name)
    /// against the material catalog at order time.
    pub name: String,
    /// Weight share of this ingredient, in the same unit as the formula's
    /// total weight (not a percentage).
    pub ratio_g: Grams,
    /// Parts-per-hundred-rubber dosing note for chemicals. Informational.
    pub phr: Option<f64>,
    /// Cached per-lot usage: `ratio_g × lot_multiplier`.
    pub consumption_g: Option<Grams>,
}

impl Ingredient {
    pub fn new(kind: IngredientKind, name: String, ratio_g: Grams, phr: Option<f64>) -> Self {
        Self {
            kind,
            name,
            ratio_g,
            phr,
            consumption_g: None,
        }
    }
}

/// A named recipe with a lot multiplier and a declared total weight.
#[derive(Clone, Debug, PartialEq)]
pub struct Formula {
    pub id: Uuid,
    pub name: String,
    pub lot_multiplier: i64,
    pub ingredients: Vec<Ingredient>,
    pub total_weight_g: Grams,
}

impl Formula {
    /// Builds a validated formula and fills the consumption cache.
    ///
    /// Fails with [`EngineError::InvalidIngredients`] when the ingredient
    /// list is empty, a ratio is not positive, the total weight is not
    /// positive, or the ratios do not sum to the declared total weight.
    pub fn new(
        name: String,
        lot_multiplier: i64,
        ingredients: Vec<Ingredient>,
        total_weight_g: Grams,
    ) -> ResultEngine<Self> {
        if name.trim().is_empty() {
            return Err(EngineError::Validation(
                "formula name is required".to_string(),
            ));
        }
        if lot_multiplier <= 0 {
            return Err(EngineError::Validation(
                "lot multiplier must be positive".to_string(),
            ));
        }
        Self::validate_ingredients(&ingredients)?;
        if !total_weight_g.is_positive() {
            return Err(EngineError::InvalidIngredients(
                "total weight must be positive".to_string(),
            ));
        }
        let sum: Grams = ingredients.iter().map(|ing| ing.ratio_g).sum();
        if sum != total_weight_g {
            return Err(EngineError::InvalidIngredients(format!(
                "ingredient ratios sum to {sum}, declared total weight is {total_weight_g}"
            )));
        }

        let mut formula = Self {
            id: Uuid::new_v4(),
            name,
            lot_multiplier,
            ingredients,
            total_weight_g,
        };
        formula.recompute_consumption()?;
        Ok(formula)
    }

    /// Replaces name and ingredient list, refreshing the consumption cache.
    ///
    /// The declared total weight stays frozen at its creation value and is
    /// *not* re-validated against the new ratios. Edits have always been
    /// allowed to drift from the declared weight; the drift is kept as a
    /// known inconsistency rather than silently corrected.
    pub(crate) fn replace_ingredients(
        &mut self,
        name: String,
        ingredients: Vec<Ingredient>,
    ) -> ResultEngine<()> {
        if name.trim().is_empty() {
            return Err(EngineError::Validation(
                "formula name is required".to_string(),
            ));
        }
        Self::validate_ingredients(&ingredients)?;

        self.name = name;
        self.ingredients = ingredients;
        self.recompute_consumption()
    }

    fn validate_ingredients(ingredients: &[Ingredient]) -> ResultEngine<()> {
        if ingredients.is_empty() {
            return Err(EngineError::InvalidIngredients(
                "at least one ingredient is required".to_string(),
            ));
        }
        if let Some(bad) = ingredients.iter().find(|ing| !ing.ratio_g.is_positive()) {
            return Err(EngineError::InvalidIngredients(format!(
                "ingredient \"{}\" has a non-positive ratio",
                bad.name
            )));
        }
        Ok(())
    }

    /// Invalidation rule for the consumption cache: any change to ratios or
    /// the lot multiplier recomputes every line.
    fn recompute_consumption(&mut self) -> ResultEngine<()> {
        for ingredient in &mut self.ingredients {
            let consumption = ingredient
                .ratio_g
                .checked_mul(self.lot_multiplier)
                .ok_or_else(|| {
                    EngineError::InvalidIngredients(format!(
                        "consumption overflows for ingredient \"{}\"",
                        ingredient.name
                    ))
                })?;
            ingredient.consumption_g = Some(consumption);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "formulas")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub lot_multiplier: i64,
    pub total_weight_g: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::formula_ingredient::Entity")]
    Ingredients,
}

impl Related<super::formula_ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ingredients.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Formula> for ActiveModel {
    fn from(formula: &Formula) -> Self {
        Self {
            id: ActiveValue::Set(formula.id.to_string()),
            name: ActiveValue::Set(formula.name.clone()),
            lot_multiplier: ActiveValue::Set(formula.lot_multiplier),
            total_weight_g: ActiveValue::Set(formula.total_weight_g.grams()),
        }
    }
}

impl Formula {
    /// Ingredient rows for persistence, in formula order.
    pub(crate) fn ingredient_models(&self) -> Vec<formula_ingredient::ActiveModel> {
        self.ingredients
            .iter()
            .enumerate()
            .map(|(position, ingredient)| {
                formula_ingredient::active_model(self.id, position as i32, ingredient)
            })
            .collect()
    }
}
