//! Order API endpoints

use api_types::{
    formula::FormulaView,
    order::{DrawView, OrderListQuery, OrderNew, OrderView},
};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use engine::{Grams, Order, OrderDraft};

use crate::{ServerError, formulas::formula_view, server::ServerState};

fn order_view(order: &Order, formula: Option<FormulaView>) -> OrderView {
    OrderView {
        id: order.id,
        date: order.date.clone(),
        shift: order.shift.clone(),
        order_no: order.order_no.clone(),
        machine_no: order.machine_no.clone(),
        operator: order.operator.clone(),
        batch_no: order.batch_no.clone(),
        batch_weight: order.batch_weight_g.to_kg(),
        number_of_batches: order.number_of_batches,
        remarks: order.remarks.clone(),
        selected_formula_id: order.formula_id,
        draws: order
            .draws
            .iter()
            .map(|draw| DrawView {
                material_id: draw.material_id,
                ingredient: draw.ingredient.clone(),
                quantity: draw.quantity_g.to_kg(),
            })
            .collect(),
        formula,
    }
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<OrderView>>, ServerError> {
    let orders = state.engine.orders().await?;
    let with_formula = query.with_formula.unwrap_or(false);

    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
        // A formula deleted after the order was cut simply stays unjoined;
        // the draw snapshot already carries the quantities.
        let formula = if with_formula {
            state
                .engine
                .formula(order.formula_id)
                .await
                .ok()
                .map(|formula| formula_view(&formula))
        } else {
            None
        };
        views.push(order_view(&order, formula));
    }
    Ok(Json(views))
}

pub async fn submit(
    State(state): State<ServerState>,
    Json(payload): Json<OrderNew>,
) -> Result<Json<OrderView>, ServerError> {
    let draft = OrderDraft {
        date: payload.date,
        shift: payload.shift,
        order_no: payload.order_no,
        machine_no: payload.machine_no,
        operator: payload.operator,
        batch_no: payload.batch_no,
        batch_weight_g: Grams::from_kg(payload.batch_weight)?,
        number_of_batches: payload.number_of_batches,
        remarks: payload.remarks,
        formula_id: payload.selected_formula_id,
    };

    let order = state.engine.submit_order(draft, Utc::now()).await?;
    Ok(Json(order_view(&order, None)))
}
