//! Catalog validation: referential integrity and API consistency.

use crate::error::SchemaError;
use crate::schema::{Catalog, EntityDef, Link};
use std::collections::HashSet;

fn require_column(entity: &EntityDef, column: &str) -> Result<(), SchemaError> {
    if entity.column(column).is_none() {
        return Err(SchemaError::UnknownColumn {
            table: entity.table,
            column: column.to_string(),
        });
    }
    Ok(())
}

pub fn validate(catalog: &Catalog) -> Result<(), SchemaError> {
    let mut tables = HashSet::new();
    let mut path_segments = HashSet::new();

    for (idx, entity) in catalog.entities.iter().enumerate() {
        if entity.kind as usize != idx {
            return Err(SchemaError::Invalid(format!(
                "{} declared at position {} out of kind order",
                entity.table, idx
            )));
        }
        if !tables.insert(entity.table) {
            return Err(SchemaError::Invalid(format!("duplicate table {}", entity.table)));
        }
        if let Some(seg) = entity.path_segment {
            if !path_segments.insert(seg) {
                return Err(SchemaError::DuplicatePathSegment(seg.to_string()));
            }
        }

        let identities = entity.columns.iter().filter(|c| c.is_identity()).count();
        if identities != 1 || entity.column(entity.identity()).map(|c| c.is_identity()) != Some(true) {
            return Err(SchemaError::Invalid(format!("{} must have exactly one identity column 'id'", entity.table)));
        }

        let mut names = HashSet::new();
        for col in entity.columns {
            if !names.insert(col.name) {
                return Err(SchemaError::Invalid(format!("duplicate column {}.{}", entity.table, col.name)));
            }
            if col.required && col.nullable {
                return Err(SchemaError::Invalid(format!("{}.{} is required but nullable", entity.table, col.name)));
            }
            if let Some(fk) = col.references {
                // Targets must be declared earlier so tables can be created in order.
                let declared_before = catalog.entities[..=idx].iter().any(|e| e.kind == fk.target);
                if !declared_before {
                    return Err(SchemaError::MissingReference {
                        kind: "table",
                        id: format!("{:?} (from {}.{})", fk.target, entity.table, col.name),
                    });
                }
            }
        }

        for term in entity.order {
            require_column(entity, term.column)?;
        }
        for filter in entity.filters {
            require_column(entity, filter)?;
        }
    }

    for nested in catalog.nested {
        let parent = catalog
            .entities
            .iter()
            .find(|e| e.kind == nested.parent)
            .ok_or_else(|| SchemaError::MissingReference {
                kind: "entity",
                id: format!("{:?}", nested.parent),
            })?;
        if parent.path_segment.is_none() {
            return Err(SchemaError::Invalid(format!("parent of /{} has no collection path", nested.segment)));
        }
        let child = catalog
            .entities
            .iter()
            .find(|e| e.kind == nested.child)
            .ok_or_else(|| SchemaError::MissingReference {
                kind: "entity",
                id: format!("{:?}", nested.child),
            })?;
        let link_columns: &[&str] = match &nested.link {
            Link::Column(c) => std::slice::from_ref(c),
            Link::AnyOf(cols) => *cols,
        };
        for name in link_columns {
            let col = child.column(name).ok_or_else(|| SchemaError::UnknownColumn {
                table: child.table,
                column: name.to_string(),
            })?;
            if col.references.map(|fk| fk.target) != Some(nested.parent) {
                return Err(SchemaError::Invalid(format!(
                    "{}.{} does not reference {}",
                    child.table, name, parent.table
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::*;
    use crate::schema::catalog;

    #[test]
    fn application_catalog_is_consistent() {
        validate(catalog()).unwrap();
    }

    #[test]
    fn every_kind_resolves_to_its_definition() {
        let c = catalog();
        for entity in c.entities {
            assert_eq!(c.entity(entity.kind).table, entity.table);
        }
    }

    #[test]
    fn nested_lookup_uses_parent_collection() {
        let c = catalog();
        let kittens = c.nested("litters", "kittens").unwrap();
        assert_eq!(kittens.child, EntityKind::Kitten);
        assert_eq!(kittens.parent_column(), Some("litter_id"));
        assert!(c.nested("cats", "offspring").unwrap().parent_column().is_none());
        assert!(c.nested("leads", "weights").is_none());
        assert!(c.nested("nope", "kittens").is_none());
    }

    static BAD_COLUMNS: &[ColumnDef] = &[
        ColumnDef::id(),
        ColumnDef::required("name", ColumnType::Text),
    ];

    #[test]
    fn rejects_order_on_unknown_column() {
        static ENTITIES: &[EntityDef] = &[EntityDef {
            kind: EntityKind::Cat,
            table: "cats",
            label: "cat",
            path_segment: Some("cats"),
            columns: BAD_COLUMNS,
            order: &[OrderTerm::asc("call_name")],
            filters: &[],
            operations: &[Operation::List],
        }];
        let broken = Catalog { entities: ENTITIES, nested: &[] };
        assert!(matches!(validate(&broken), Err(SchemaError::UnknownColumn { .. })));
    }

    #[test]
    fn rejects_nested_link_without_foreign_key() {
        static ENTITIES: &[EntityDef] = &[EntityDef {
            kind: EntityKind::Cat,
            table: "cats",
            label: "cat",
            path_segment: Some("cats"),
            columns: BAD_COLUMNS,
            order: &[],
            filters: &[],
            operations: &[Operation::List],
        }];
        static NESTED: &[NestedDef] = &[NestedDef {
            parent: EntityKind::Cat,
            segment: "children",
            child: EntityKind::Cat,
            link: Link::Column("name"),
        }];
        let broken = Catalog { entities: ENTITIES, nested: NESTED };
        assert!(matches!(validate(&broken), Err(SchemaError::Invalid(_))));
    }
}
