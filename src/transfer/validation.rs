//! Per-column value checks driven by the catalog's column types.

use crate::error::AppError;
use crate::schema::{ColumnDef, ColumnType};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Check a non-null value against the column type and return its stored form.
/// Dates must be `YYYY-MM-DD`; datetimes with an offset are converted to naive UTC.
pub fn normalize(col: &ColumnDef, v: &Value) -> Result<Value, AppError> {
    let mismatch = || AppError::Validation(format!("{} must be a {}", col.name, col.ty.name()));
    match col.ty {
        ColumnType::Int => v.as_i64().map(Value::from).ok_or_else(mismatch),
        ColumnType::Real => v
            .as_f64()
            .filter(|f| f.is_finite())
            .map(Value::from)
            .ok_or_else(mismatch),
        ColumnType::Bool => v.as_bool().map(Value::from).ok_or_else(mismatch),
        ColumnType::Text => v.as_str().map(Value::from).ok_or_else(mismatch),
        ColumnType::Date => {
            let s = v.as_str().ok_or_else(mismatch)?;
            let d = NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| mismatch())?;
            Ok(Value::from(d.format(DATE_FORMAT).to_string()))
        }
        ColumnType::DateTime => {
            let s = v.as_str().ok_or_else(mismatch)?;
            let dt = parse_datetime(s).ok_or_else(mismatch)?;
            Ok(Value::from(dt.format(DATETIME_FORMAT).to_string()))
        }
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}
