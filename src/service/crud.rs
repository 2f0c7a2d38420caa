//! Generic CRUD execution: validate, resolve parents and references, run in one scope, project.

use crate::error::AppError;
use crate::gateway::{Gateway, Scope};
use crate::schema::{catalog, EntityDef, Link, NestedDef};
use crate::transfer::{CreateInput, Patch};
use serde_json::Value;
use std::collections::BTreeMap;

pub struct CrudService;

impl CrudService {
    /// List rows with optional exact-match filters, in the entity's fixed order.
    pub async fn list(gateway: &Gateway, entity: &EntityDef, filters: &[(String, Value)]) -> Result<Vec<Value>, AppError> {
        let mut scope = gateway.begin().await?;
        let rows = scope.find(entity, filters, entity.order).await?;
        scope.commit().await?;
        Ok(rows)
    }

    /// Fetch one row by primary key.
    pub async fn read(gateway: &Gateway, entity: &EntityDef, id: i64) -> Result<Value, AppError> {
        let mut scope = gateway.begin().await?;
        let row = scope
            .get_by_id(entity, id)
            .await?
            .ok_or_else(|| AppError::not_found(entity.label, id))?;
        scope.commit().await?;
        Ok(row)
    }

    pub async fn create(gateway: &Gateway, entity: &EntityDef, input: &CreateInput) -> Result<Value, AppError> {
        let mut scope = gateway.begin().await?;
        check_references(&mut scope, entity, input.values(), None).await?;
        let row = scope.insert(entity, input.values()).await?;
        scope.commit().await?;
        tracing::debug!(table = entity.table, id = ?row.get("id"), "created");
        Ok(row)
    }

    /// Apply only the supplied fields; an empty patch returns the row unchanged.
    pub async fn update(gateway: &Gateway, entity: &EntityDef, id: i64, patch: &Patch) -> Result<Value, AppError> {
        let mut scope = gateway.begin().await?;
        if !scope.exists(entity, id).await? {
            return Err(AppError::not_found(entity.label, id));
        }
        check_references(&mut scope, entity, patch.fields(), None).await?;
        let row = scope
            .update(entity, id, patch)
            .await?
            .ok_or_else(|| AppError::not_found(entity.label, id))?;
        scope.commit().await?;
        Ok(row)
    }

    /// Remove one row. Dependents follow their declared on-delete policy.
    pub async fn delete(gateway: &Gateway, entity: &EntityDef, id: i64) -> Result<(), AppError> {
        let mut scope = gateway.begin().await?;
        if !scope.delete(entity, id).await? {
            return Err(AppError::not_found(entity.label, id));
        }
        scope.commit().await?;
        tracing::info!(table = entity.table, id, "deleted");
        Ok(())
    }

    /// Rows of a child collection under an existing parent.
    pub async fn list_children(gateway: &Gateway, nested: &NestedDef, parent_id: i64) -> Result<Vec<Value>, AppError> {
        let parent = catalog().entity(nested.parent);
        let child = catalog().entity(nested.child);
        let mut scope = gateway.begin().await?;
        if !scope.exists(parent, parent_id).await? {
            return Err(AppError::not_found(parent.label, parent_id));
        }
        let rows = match nested.link {
            Link::Column(column) => {
                let filters = [(column.to_string(), Value::from(parent_id))];
                scope.find(child, &filters, child.order).await?
            }
            Link::AnyOf(columns) => scope.find_any(child, columns, parent_id).await?,
        };
        scope.commit().await?;
        Ok(rows)
    }

    /// Create a row in a child collection. A body restating a different parent id is a conflict
    /// and nothing is written.
    pub async fn create_child(gateway: &Gateway, nested: &NestedDef, parent_id: i64, body: Value) -> Result<Value, AppError> {
        let parent = catalog().entity(nested.parent);
        let child = catalog().entity(nested.child);
        let column = nested.parent_column().ok_or_else(|| {
            AppError::BadRequest(format!("{} cannot be created under a {}", nested.segment, parent.label))
        })?;
        let input = CreateInput::parse_nested(child, body, column, parent_id)?;
        let mut scope = gateway.begin().await?;
        if !scope.exists(parent, parent_id).await? {
            return Err(AppError::not_found(parent.label, parent_id));
        }
        check_references(&mut scope, child, input.values(), Some(column)).await?;
        let row = scope.insert(child, input.values()).await?;
        scope.commit().await?;
        Ok(row)
    }
}

/// Every non-null foreign key in `values` must name an existing row. `skip` names a column
/// already resolved by the caller.
async fn check_references(
    scope: &mut Scope,
    entity: &EntityDef,
    values: &BTreeMap<String, Value>,
    skip: Option<&str>,
) -> Result<(), AppError> {
    for col in entity.columns {
        let Some(fk) = col.references else { continue };
        if skip == Some(col.name) {
            continue;
        }
        let Some(id) = values.get(col.name).and_then(Value::as_i64) else { continue };
        let target = catalog().entity(fk.target);
        if !scope.exists(target, id).await? {
            return Err(AppError::not_found(target.label, id));
        }
    }
    Ok(())
}
