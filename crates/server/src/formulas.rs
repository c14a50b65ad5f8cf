//! Formula API endpoints

use api_types::formula::{FormulaNew, FormulaUpdate, FormulaView, IngredientBody};
use axum::{
    Json,
    extract::{Path, State},
};
use engine::{Formula, Grams, Ingredient, IngredientKind};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub(crate) fn formula_view(formula: &Formula) -> FormulaView {
    FormulaView {
        id: formula.id,
        name: formula.name.clone(),
        lot_multiplier: formula.lot_multiplier,
        ingredients: formula
            .ingredients
            .iter()
            .map(|ingredient| IngredientBody {
                kind: ingredient.kind.as_str().to_string(),
                name: ingredient.name.clone(),
                ratio: ingredient.ratio_g.to_kg(),
                phr: ingredient.phr,
                consumption: ingredient.consumption_g.map(Grams::to_kg),
            })
            .collect(),
        total_weight: formula.total_weight_g.to_kg(),
    }
}

/// Maps wire ingredient lines to the domain type.
///
/// Client-supplied `consumption` is dropped here: the engine recomputes the
/// cache from `ratio × lotMultiplier` on every save.
fn ingredients_from(bodies: Vec<IngredientBody>) -> Result<Vec<Ingredient>, ServerError> {
    bodies
        .into_iter()
        .map(|body| {
            let kind = IngredientKind::try_from(body.kind.as_str())?;
            let ratio = Grams::from_kg(body.ratio)?;
            Ok(Ingredient::new(kind, body.name, ratio, body.phr))
        })
        .collect()
}

pub async fn list(
    State(state): State<ServerState>,
) -> Result<Json<Vec<FormulaView>>, ServerError> {
    let formulas = state.engine.formulas().await;
    Ok(Json(formulas.iter().map(formula_view).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormulaView>, ServerError> {
    let formula = state.engine.formula(id).await?;
    Ok(Json(formula_view(&formula)))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<FormulaNew>,
) -> Result<Json<FormulaView>, ServerError> {
    let ingredients = ingredients_from(payload.ingredients)?;
    let total_weight = Grams::from_kg(payload.total_weight)?;
    let formula = state
        .engine
        .new_formula(
            &payload.name,
            payload.lot_multiplier,
            ingredients,
            total_weight,
        )
        .await?;

    Ok(Json(formula_view(&formula)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FormulaUpdate>,
) -> Result<Json<FormulaView>, ServerError> {
    let ingredients = ingredients_from(payload.ingredients)?;
    let formula = state
        .engine
        .update_formula(id, &payload.name, ingredients)
        .await?;

    Ok(Json(formula_view(&formula)))
}

pub async fn remove(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormulaView>, ServerError> {
    let formula = state.engine.delete_formula(id).await?;
    Ok(Json(formula_view(&formula)))
}
