//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from an entity definition.

use crate::schema::{Direction, EntityDef, OrderTerm};
use crate::transfer::{Patch, Presence};
use serde_json::Value;
use std::collections::BTreeMap;

/// Quote identifier for SQLite (safe: only from the catalog).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> String {
        self.params.push(v);
        format!("?{}", self.params.len())
    }
}

/// Every column of the entity, in declaration order.
fn select_column_list(entity: &EntityDef) -> String {
    entity
        .columns
        .iter()
        .map(|c| quoted(c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// ORDER BY clause; NULLs-last terms sort on `col IS NULL` first. The identity breaks ties.
fn order_clause(entity: &EntityDef, order: &[OrderTerm]) -> String {
    let mut parts = Vec::new();
    for term in order {
        let col = quoted(term.column);
        if term.nulls_last {
            parts.push(format!("{} IS NULL", col));
        }
        let dir = match term.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        parts.push(format!("{} {}", col, dir));
    }
    if !order.iter().any(|t| t.column == entity.identity()) {
        parts.push(format!("{} ASC", quoted(entity.identity())));
    }
    format!(" ORDER BY {}", parts.join(", "))
}

/// SELECT by primary key. Caller binds the id as the sole param.
pub fn select_by_id(entity: &EntityDef) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ?1",
        select_column_list(entity),
        quoted(entity.table),
        quoted(entity.identity())
    );
    q
}

/// Existence lookup by primary key. Caller binds the id.
pub fn exists(entity: &EntityDef) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT 1 FROM {} WHERE {} = ?1",
        quoted(entity.table),
        quoted(entity.identity())
    );
    q
}

/// SELECT list with exact-match filters (NULL filters use IS NULL), ordered by `order`.
/// Filters naming columns the entity does not have are skipped.
pub fn select_list(entity: &EntityDef, filters: &[(String, Value)], order: &[OrderTerm]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut where_parts = Vec::new();
    for (col, val) in filters {
        if entity.column(col).is_none() {
            continue;
        }
        if val.is_null() {
            where_parts.push(format!("{} IS NULL", quoted(col)));
        } else {
            let ph = q.push_param(val.clone());
            where_parts.push(format!("{} = {}", quoted(col), ph));
        }
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    q.sql = format!(
        "SELECT {} FROM {}{}{}",
        select_column_list(entity),
        quoted(entity.table),
        where_clause,
        order_clause(entity, order)
    );
    q
}

/// SELECT rows where any of `columns` equals `value` (e.g. offspring by sire or dam).
pub fn select_where_any(entity: &EntityDef, columns: &[&str], value: Value, order: &[OrderTerm]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(value);
    let cond = columns
        .iter()
        .map(|c| format!("{} = {}", quoted(c), ph))
        .collect::<Vec<_>>()
        .join(" OR ");
    q.sql = format!(
        "SELECT {} FROM {} WHERE ({}){}",
        select_column_list(entity),
        quoted(entity.table),
        cond,
        order_clause(entity, order)
    );
    q
}

/// INSERT of the supplied columns; omitted columns take their SQL default (or NULL).
pub fn insert(entity: &EntityDef, body: &BTreeMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in entity.columns {
        if c.is_identity() {
            continue;
        }
        let Some(val) = body.get(c.name) else { continue };
        let ph = q.push_param(val.clone());
        cols.push(quoted(c.name));
        placeholders.push(ph);
    }
    let returning = select_column_list(entity);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", quoted(entity.table), returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quoted(entity.table),
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE by id: SET only the columns present in `patch`, in key order. Explicit nulls are
/// written as a `NULL` literal. An empty patch degrades to a SELECT so the caller still gets the current row.
pub fn update(entity: &EntityDef, id: i64, patch: &Patch) -> QueryBuf {
    if patch.is_empty() {
        let mut q = select_by_id(entity);
        q.params.push(Value::from(id));
        return q;
    }
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for k in patch.fields().keys() {
        let Some(c) = entity.column(k) else { continue };
        if c.is_identity() {
            continue;
        }
        match patch.presence(k) {
            Presence::Absent => continue,
            Presence::Null => sets.push(format!("{} = NULL", quoted(k))),
            Presence::Value(v) => {
                let ph = q.push_param(v.clone());
                sets.push(format!("{} = {}", quoted(k), ph));
            }
        }
    }
    let id_ph = q.push_param(Value::from(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        quoted(entity.table),
        sets.join(", "),
        quoted(entity.identity()),
        id_ph,
        select_column_list(entity)
    );
    q
}

/// DELETE by id, returning the removed identity. Caller binds the id.
pub fn delete(entity: &EntityDef) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "DELETE FROM {} WHERE {} = ?1 RETURNING {}",
        quoted(entity.table),
        quoted(entity.identity()),
        quoted(entity.identity())
    );
    q
}
