//! Export handlers: stream a cat or litter dossier back as a ZIP attachment.

use crate::error::AppError;
use crate::handlers::entity::parse_id;
use crate::export::ExportService;
use crate::response::zip_attachment;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

pub async fn export_cat(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let archive = ExportService::cat(&state.gateway, id).await?;
    Ok(zip_attachment(archive))
}

pub async fn export_litter(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let archive = ExportService::litter(&state.gateway, id).await?;
    Ok(zip_attachment(archive))
}
