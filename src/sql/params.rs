//! Convert serde_json::Value to types that sqlx can bind.

use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::error::BoxDynError;
use sqlx::sqlite::{Sqlite, SqliteArgumentValue, SqliteTypeInfo};
use std::borrow::Cow;

/// A value that can be bound to a SQLite query. Converts from serde_json::Value.
#[derive(Clone, Debug, PartialEq)]
pub enum SqliteBindValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
}

impl SqliteBindValue {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => SqliteBindValue::Null,
            Value::Bool(b) => SqliteBindValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqliteBindValue::I64(i),
                None => SqliteBindValue::F64(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => SqliteBindValue::String(s.clone()),
            // Composite values never reach a column; store their JSON text.
            Value::Array(_) | Value::Object(_) => SqliteBindValue::String(v.to_string()),
        }
    }
}

impl<'q> Encode<'q, Sqlite> for SqliteBindValue {
    fn encode_by_ref(&self, buf: &mut Vec<SqliteArgumentValue<'q>>) -> Result<IsNull, BoxDynError> {
        let arg = match self {
            SqliteBindValue::Null => return Ok(IsNull::Yes),
            SqliteBindValue::Bool(b) => SqliteArgumentValue::Int(i32::from(*b)),
            SqliteBindValue::I64(n) => SqliteArgumentValue::Int64(*n),
            SqliteBindValue::F64(n) => SqliteArgumentValue::Double(*n),
            SqliteBindValue::String(s) => SqliteArgumentValue::Text(Cow::Owned(s.clone())),
        };
        buf.push(arg);
        Ok(IsNull::No)
    }
}

impl sqlx::Type<Sqlite> for SqliteBindValue {
    fn type_info() -> SqliteTypeInfo {
        <str as sqlx::Type<Sqlite>>::type_info()
    }
}
