//! Entity CRUD handlers: the collection is resolved from the path segment against the catalog.

use crate::error::AppError;
use crate::response::{created, no_content, ok};
use crate::schema::{ColumnType, EntityDef, NestedDef, Operation};
use crate::service::CrudService;
use crate::state::AppState;
use crate::transfer::{CreateInput, Patch};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

pub(crate) fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id: {}", id_str)))
}

/// Collection mounted at `segment` that exposes `op`.
fn collection(state: &AppState, segment: &str, op: Operation) -> Result<&'static EntityDef, AppError> {
    let entity = state
        .catalog
        .by_path(segment)
        .ok_or_else(|| AppError::NotFound(format!("collection {}", segment)))?;
    if !entity.allows(op) {
        return Err(AppError::BadRequest(format!("{} not allowed on {}", op.name(), segment)));
    }
    Ok(entity)
}

fn child_collection(state: &AppState, parent: &str, child: &str) -> Result<&'static NestedDef, AppError> {
    state
        .catalog
        .nested(parent, child)
        .ok_or_else(|| AppError::NotFound(format!("collection {}/{}", parent, child)))
}

/// Typed filter value for a query-string parameter.
fn query_value_for_column(entity: &EntityDef, col: &str, s: &str) -> Result<Value, AppError> {
    let Some(column) = entity.column(col) else {
        return Ok(Value::String(s.to_string()));
    };
    let invalid = || AppError::BadRequest(format!("{} must be a {}", col, column.ty.name()));
    Ok(match column.ty {
        ColumnType::Int => Value::from(s.parse::<i64>().map_err(|_| invalid())?),
        ColumnType::Real => Value::from(s.parse::<f64>().map_err(|_| invalid())?),
        ColumnType::Bool => match s.to_ascii_lowercase().as_str() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => return Err(invalid()),
        },
        ColumnType::Text | ColumnType::Date | ColumnType::DateTime => Value::String(s.to_string()),
    })
}

pub async fn list(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let entity = collection(&state, &path_segment, Operation::List)?;
    let mut filters: Vec<(String, Value)> = Vec::new();
    for (k, v) in params {
        if entity.filters.contains(&k.as_str()) {
            let val = query_value_for_column(entity, &k, &v)?;
            filters.push((k, val));
        }
    }
    // Deterministic parameter order regardless of query-string order.
    filters.sort_by(|a, b| a.0.cmp(&b.0));
    let rows = CrudService::list(&state.gateway, entity, &filters).await?;
    Ok(ok(Value::Array(rows)))
}

pub async fn create(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = collection(&state, &path_segment, Operation::Create)?;
    let input = CreateInput::parse(entity, body)?;
    let row = CrudService::create(&state.gateway, entity, &input).await?;
    Ok(created(row))
}

pub async fn read(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entity = collection(&state, &path_segment, Operation::Read)?;
    let id = parse_id(&id_str)?;
    let row = CrudService::read(&state.gateway, entity, id).await?;
    Ok(ok(row))
}

pub async fn update(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = collection(&state, &path_segment, Operation::Update)?;
    let id = parse_id(&id_str)?;
    let patch = Patch::parse(entity, body)?;
    let row = CrudService::update(&state.gateway, entity, id, &patch).await?;
    Ok(ok(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entity = collection(&state, &path_segment, Operation::Delete)?;
    let id = parse_id(&id_str)?;
    CrudService::delete(&state.gateway, entity, id).await?;
    Ok(no_content())
}

/// GET /:parent/:id/:child
pub async fn list_nested(
    State(state): State<AppState>,
    Path((parent, id_str, child)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let nested = child_collection(&state, &parent, &child)?;
    let parent_id = parse_id(&id_str)?;
    let rows = CrudService::list_children(&state.gateway, nested, parent_id).await?;
    Ok(ok(Value::Array(rows)))
}

/// POST /:parent/:id/:child
pub async fn create_nested(
    State(state): State<AppState>,
    Path((parent, id_str, child)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let nested = child_collection(&state, &parent, &child)?;
    let parent_id = parse_id(&id_str)?;
    let row = CrudService::create_child(&state.gateway, nested, parent_id, body).await?;
    Ok(created(row))
}
