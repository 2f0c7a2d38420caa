//! Input shapes per entity: create bodies, partial updates with tri-state fields.
//! Read shapes are the rows projected by the gateway.

pub mod validation;

use crate::error::AppError;
use crate::schema::{Access, EntityDef};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use validation::normalize;

fn into_object(body: Value) -> Result<Map<String, Value>, AppError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::Validation("body must be a JSON object".into())),
    }
}

/// Reject `id` and fields the entity does not declare.
fn check_known(entity: &EntityDef, key: &str) -> Result<(), AppError> {
    match entity.column(key) {
        None => Err(AppError::Validation(format!("unknown field: {}", key))),
        Some(c) if c.is_identity() => Err(AppError::Validation(format!("{} is assigned by storage", key))),
        Some(_) => Ok(()),
    }
}

/// A validated create body: supplied columns only, normalized by type.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateInput {
    values: BTreeMap<String, Value>,
}

impl CreateInput {
    pub fn parse(entity: &EntityDef, body: Value) -> Result<Self, AppError> {
        Self::from_map(entity, into_object(body)?)
    }

    /// Create body for a child collection. A parent id restated in the body must match the path;
    /// a missing (or null) one is filled from the path.
    pub fn parse_nested(entity: &EntityDef, body: Value, parent_column: &str, parent_id: i64) -> Result<Self, AppError> {
        let mut map = into_object(body)?;
        match map.get(parent_column) {
            Some(Value::Null) | None => {
                map.insert(parent_column.to_string(), Value::from(parent_id));
            }
            Some(v) => {
                let col = entity
                    .column(parent_column)
                    .ok_or_else(|| AppError::Validation(format!("unknown field: {}", parent_column)))?;
                let given = normalize(col, v)?;
                if given.as_i64() != Some(parent_id) {
                    return Err(AppError::Conflict(format!(
                        "{} {} in body does not match {} in path",
                        parent_column, given, parent_id
                    )));
                }
            }
        }
        Self::from_map(entity, map)
    }

    fn from_map(entity: &EntityDef, map: Map<String, Value>) -> Result<Self, AppError> {
        let mut values = BTreeMap::new();
        for (key, v) in map {
            check_known(entity, &key)?;
            if let Some(col) = entity.column(&key) {
                if v.is_null() {
                    if !col.nullable {
                        return Err(AppError::Validation(format!("{} must not be null", key)));
                    }
                    values.insert(key, Value::Null);
                } else {
                    values.insert(key, normalize(col, &v)?);
                }
            }
        }
        for col in entity.columns.iter().filter(|c| c.required) {
            if !values.contains_key(col.name) {
                return Err(AppError::Validation(format!("{} is required", col.name)));
            }
        }
        Ok(CreateInput { values })
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }
}

/// Field state in a partial update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Presence<'a> {
    Absent,
    Null,
    Value(&'a Value),
}

/// A validated partial update: only the fields the caller supplied, explicit nulls kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    fields: BTreeMap<String, Value>,
}

impl Patch {
    pub fn parse(entity: &EntityDef, body: Value) -> Result<Self, AppError> {
        let mut fields = BTreeMap::new();
        for (key, v) in into_object(body)? {
            check_known(entity, &key)?;
            let Some(col) = entity.column(&key) else { continue };
            if col.access == Access::Immutable {
                return Err(AppError::Validation(format!("{} cannot be changed after creation", key)));
            }
            if v.is_null() {
                if !col.nullable {
                    return Err(AppError::Validation(format!("{} must not be null", key)));
                }
                fields.insert(key, Value::Null);
            } else {
                fields.insert(key, normalize(col, &v)?);
            }
        }
        Ok(Patch { fields })
    }

    pub fn presence(&self, name: &str) -> Presence<'_> {
        match self.fields.get(name) {
            None => Presence::Absent,
            Some(Value::Null) => Presence::Null,
            Some(v) => Presence::Value(v),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }
}
