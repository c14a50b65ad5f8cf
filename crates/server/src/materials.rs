//! Material API endpoints

use api_types::material::{
    LedgerEntryView, MaterialDetail, MaterialListQuery, MaterialNew, MaterialView,
    TransactionLogged, TransactionNew,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use engine::{Grams, LedgerEntry, Material, MaterialCategory, MaterialSummary};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn entry_view(entry: &LedgerEntry) -> LedgerEntryView {
    LedgerEntryView {
        date: entry.recorded_at,
        particulars: entry.particulars.clone(),
        inward: entry.inward_g.to_kg(),
        outward: entry.outward_g.to_kg(),
        balance: entry.balance_g.to_kg(),
        remarks: entry.remarks.clone(),
    }
}

fn summary_view(summary: &MaterialSummary) -> MaterialView {
    MaterialView {
        id: summary.id,
        name: summary.name.clone(),
        category: summary.category.as_str().to_string(),
        balance: summary.balance_g.to_kg(),
    }
}

fn detail_view(material: &Material) -> MaterialDetail {
    MaterialDetail {
        id: material.id,
        name: material.name.clone(),
        category: material.category.as_str().to_string(),
        balance: material.balance_g.to_kg(),
        logs: material.entries.iter().map(entry_view).collect(),
    }
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<MaterialListQuery>,
) -> Result<Json<Vec<MaterialView>>, ServerError> {
    let materials = state.engine.materials(query.category.as_deref()).await?;
    Ok(Json(materials.iter().map(summary_view).collect()))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<MaterialNew>,
) -> Result<Json<MaterialDetail>, ServerError> {
    let opening = payload.opening_balance.map(Grams::from_kg).transpose()?;
    let material = state
        .engine
        .new_material(
            &payload.name,
            MaterialCategory::from(payload.category.as_str()),
            opening,
            Utc::now(),
        )
        .await?;

    Ok(Json(detail_view(&material)))
}

pub async fn get_detail(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MaterialDetail>, ServerError> {
    let material = state.engine.material(id).await?;
    Ok(Json(detail_view(&material)))
}

pub async fn record(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionNew>,
) -> Result<Json<TransactionLogged>, ServerError> {
    let inward = Grams::from_kg(payload.inward)?;
    let outward = Grams::from_kg(payload.outward)?;
    let entry = state
        .engine
        .record(
            id,
            inward,
            outward,
            &payload.particulars,
            payload.remarks,
            Utc::now(),
        )
        .await?;

    Ok(Json(TransactionLogged {
        balance: entry.balance_g.to_kg(),
        entry: entry_view(&entry),
    }))
}
