//! Consumption planning.
//!
//! Translates a formula plus a batch count into the exact quantity of each
//! ingredient a production order draws from stock. Pure: no state, no side
//! effects, deterministic for the same inputs.

use crate::{EngineError, Grams, ResultEngine, formula::Formula};

/// One planned stock draw: an ingredient name and the total quantity the
/// order consumes of it.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedDraw {
    pub ingredient: String,
    pub quantity_g: Grams,
}

/// Computes the per-ingredient draws for one production order.
///
/// `quantity = consumption × number_of_batches`, where `consumption` is the
/// lot-sized cache stored on the formula (`ratio × lot_multiplier`). The
/// batch weight sizes the mix on the machine and is validated at order
/// level; it deliberately does not enter the per-ingredient computation —
/// lot sizing and per-order batch sizing are decoupled.
///
/// Fails with [`EngineError::MissingConsumption`] if any ingredient lacks
/// the consumption cache (possible on rows written before the cache was
/// recomputed server-side); such formulas must be re-saved before use.
pub fn plan(
    formula: &Formula,
    _batch_weight_g: Grams,
    number_of_batches: i64,
) -> ResultEngine<Vec<PlannedDraw>> {
    formula
        .ingredients
        .iter()
        .map(|ingredient| {
            let consumption = ingredient.consumption_g.ok_or_else(|| {
                EngineError::MissingConsumption(format!(
                    "ingredient \"{}\" of formula \"{}\" has no consumption value",
                    ingredient.name, formula.name
                ))
            })?;
            let quantity = consumption.checked_mul(number_of_batches).ok_or_else(|| {
                EngineError::Validation(format!(
                    "draw quantity overflows for ingredient \"{}\"",
                    ingredient.name
                ))
            })?;
            Ok(PlannedDraw {
                ingredient: ingredient.name.clone(),
                quantity_g: quantity,
            })
        })
        .collect()
}
