//! Apply the catalog to the database: tables with foreign keys, then indexes.
//! Tables are created in catalog order, which lists referenced tables first.

use crate::error::AppError;
use crate::schema::{validate, Catalog, ColumnDef, EntityDef};
use sqlx::SqlitePool;

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn column_sql(catalog: &Catalog, c: &ColumnDef) -> String {
    if c.is_identity() {
        return format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quote(c.name));
    }
    let mut def = format!("{} {}", quote(c.name), c.ty.sql_type());
    if !c.nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(expr) = c.default {
        def.push_str(" DEFAULT ");
        def.push_str(expr);
    }
    if let Some(fk) = c.references {
        let target = catalog.entity(fk.target);
        def.push_str(&format!(
            " REFERENCES {} ({}) ON DELETE {}",
            quote(target.table),
            quote(target.identity()),
            fk.on_delete.sql()
        ));
    }
    def
}

/// CREATE TABLE IF NOT EXISTS for one entity.
pub fn create_table_sql(catalog: &Catalog, entity: &EntityDef) -> String {
    let cols: Vec<String> = entity.columns.iter().map(|c| column_sql(catalog, c)).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote(entity.table),
        cols.join(",\n    ")
    )
}

/// Unique and lookup indexes for one entity (FK columns are always indexed).
pub fn index_sql(entity: &EntityDef) -> Vec<String> {
    entity
        .columns
        .iter()
        .filter(|c| c.indexed && !c.is_identity())
        .map(|c| {
            let (kind, prefix) = if c.unique { ("UNIQUE INDEX", "ux") } else { ("INDEX", "ix") };
            format!(
                "CREATE {} IF NOT EXISTS {} ON {} ({})",
                kind,
                quote(&format!("{}_{}_{}", prefix, entity.table, c.name)),
                quote(entity.table),
                quote(c.name)
            )
        })
        .collect()
}

/// Validate the catalog, then create every table and index. Idempotent.
pub async fn apply_migrations(pool: &SqlitePool, catalog: &Catalog) -> Result<(), AppError> {
    validate(catalog)?;
    let mut tx = pool.begin().await?;
    for entity in catalog.entities {
        let ddl = create_table_sql(catalog, entity);
        tracing::debug!(table = entity.table, "create table");
        sqlx::query(&ddl).execute(&mut *tx).await?;
        for sql in index_sql(entity) {
            sqlx::query(&sql).execute(&mut *tx).await?;
        }
    }
    tx.commit().await?;
    tracing::info!(tables = catalog.entities.len(), "schema applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{catalog, EntityKind};

    #[test]
    fn cat_table_has_self_references_and_defaults() {
        let c = catalog();
        let ddl = create_table_sql(c, c.entity(EntityKind::Cat));
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS \"cats\""));
        assert!(ddl.contains("\"id\" INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(ddl.contains("\"call_name\" TEXT NOT NULL"));
        assert!(ddl.contains("\"status\" TEXT NOT NULL DEFAULT 'chaton'"));
        assert!(ddl.contains("\"is_neutered\" BOOLEAN NOT NULL DEFAULT 0"));
        assert!(ddl.contains("\"sire_id\" INTEGER REFERENCES \"cats\" (\"id\") ON DELETE SET NULL"));
    }

    #[test]
    fn litter_parents_are_restricted() {
        let c = catalog();
        let ddl = create_table_sql(c, c.entity(EntityKind::Litter));
        assert!(ddl.contains("\"queen_id\" INTEGER NOT NULL REFERENCES \"cats\" (\"id\") ON DELETE RESTRICT"));
    }

    #[test]
    fn microchip_gets_a_unique_index() {
        let idx = index_sql(catalog().entity(EntityKind::Cat));
        assert!(idx.contains(
            &"CREATE UNIQUE INDEX IF NOT EXISTS \"ux_cats_microchip\" ON \"cats\" (\"microchip\")".to_string()
        ));
        assert!(idx.iter().any(|s| s.contains("\"ix_cats_call_name\"")));
        assert!(idx.iter().any(|s| s.contains("\"ix_cats_dam_id\"")));
    }
}
