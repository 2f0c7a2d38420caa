//! Static entity definitions: columns, relations, list order and allowed operations.

/// Storage type of a column. Dates and datetimes are stored as ISO-8601 text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Real,
    Bool,
    Text,
    Date,
    DateTime,
}

impl ColumnType {
    /// SQLite declared type. Date columns stay TEXT so no numeric affinity applies.
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Int => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Bool => "BOOLEAN",
            ColumnType::Text | ColumnType::Date | ColumnType::DateTime => "TEXT",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Int => "integer",
            ColumnType::Real => "number",
            ColumnType::Bool => "boolean",
            ColumnType::Text => "string",
            ColumnType::Date => "date (YYYY-MM-DD)",
            ColumnType::DateTime => "datetime (YYYY-MM-DDTHH:MM:SS)",
        }
    }
}

/// Who may write a column and when.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Assigned by storage on insert (the identity column).
    Generated,
    /// Set at creation, never changed afterwards.
    Immutable,
    Mutable,
}

/// Action taken on dependent rows when the referenced row is deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
    SetNull,
    Restrict,
}

impl OnDelete {
    pub fn sql(self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
            OnDelete::Restrict => "RESTRICT",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ForeignKey {
    pub target: EntityKind,
    pub on_delete: OnDelete,
}

#[derive(Clone, Copy, Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
    /// Must be present (and non-null) in a create body.
    pub required: bool,
    /// SQL default expression used when a create body omits the column.
    pub default: Option<&'static str>,
    pub access: Access,
    pub unique: bool,
    pub indexed: bool,
    pub references: Option<ForeignKey>,
}

impl ColumnDef {
    /// Nullable, optional, mutable column.
    pub const fn optional(name: &'static str, ty: ColumnType) -> Self {
        ColumnDef {
            name,
            ty,
            nullable: true,
            required: false,
            default: None,
            access: Access::Mutable,
            unique: false,
            indexed: false,
            references: None,
        }
    }

    /// Non-null column that every create body must carry.
    pub const fn required(name: &'static str, ty: ColumnType) -> Self {
        ColumnDef {
            nullable: false,
            required: true,
            ..ColumnDef::optional(name, ty)
        }
    }

    pub const fn id() -> Self {
        ColumnDef {
            nullable: false,
            access: Access::Generated,
            ..ColumnDef::optional("id", ColumnType::Int)
        }
    }

    pub const fn with_default(self, expr: &'static str) -> Self {
        ColumnDef {
            default: Some(expr),
            required: false,
            ..self
        }
    }

    pub const fn not_null(self) -> Self {
        ColumnDef {
            nullable: false,
            ..self
        }
    }

    pub const fn immutable(self) -> Self {
        ColumnDef {
            access: Access::Immutable,
            ..self
        }
    }

    pub const fn unique(self) -> Self {
        ColumnDef {
            unique: true,
            indexed: true,
            ..self
        }
    }

    pub const fn indexed(self) -> Self {
        ColumnDef {
            indexed: true,
            ..self
        }
    }

    pub const fn references(self, target: EntityKind, on_delete: OnDelete) -> Self {
        ColumnDef {
            references: Some(ForeignKey { target, on_delete }),
            indexed: true,
            ..self
        }
    }

    pub fn is_identity(&self) -> bool {
        self.access == Access::Generated
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// One ORDER BY term. `nulls_last` sorts NULLs after every value regardless of direction.
#[derive(Clone, Copy, Debug)]
pub struct OrderTerm {
    pub column: &'static str,
    pub direction: Direction,
    pub nulls_last: bool,
}

impl OrderTerm {
    pub const fn asc(column: &'static str) -> Self {
        OrderTerm {
            column,
            direction: Direction::Asc,
            nulls_last: false,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        OrderTerm {
            column,
            direction: Direction::Desc,
            nulls_last: false,
        }
    }

    pub const fn nulls_last(self) -> Self {
        OrderTerm {
            nulls_last: true,
            ..self
        }
    }
}

/// Operations exposed on a top-level collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    Read,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Cat,
    CatGeneticTest,
    CatHealthEvent,
    CatMeasurement,
    HeatCycle,
    MatingRecord,
    PregnancyTimeline,
    Litter,
    Kitten,
    KittenWeight,
    FamilyLead,
    LeadInteraction,
    Reservation,
    AdoptionFollowUp,
    ComplianceReminder,
    DocumentAttachment,
}

#[derive(Debug)]
pub struct EntityDef {
    pub kind: EntityKind,
    pub table: &'static str,
    /// Human label used in error messages ("cat 4 not found").
    pub label: &'static str,
    /// Top-level collection path; `None` for entities reachable only through a parent.
    pub path_segment: Option<&'static str>,
    pub columns: &'static [ColumnDef],
    pub order: &'static [OrderTerm],
    /// Columns accepted as exact-match list filters.
    pub filters: &'static [&'static str],
    pub operations: &'static [Operation],
}

impl EntityDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn allows(&self, op: Operation) -> bool {
        self.operations.contains(&op)
    }

    pub fn identity(&self) -> &'static str {
        "id"
    }
}

/// How child rows point back at their parent.
#[derive(Clone, Copy, Debug)]
pub enum Link {
    /// A single FK column; the child collection accepts creates.
    Column(&'static str),
    /// Rows matching the parent id on any of these columns; list only.
    AnyOf(&'static [&'static str]),
}

/// A child collection mounted under `/{parent}/{id}/{segment}`.
#[derive(Clone, Copy, Debug)]
pub struct NestedDef {
    pub parent: EntityKind,
    pub segment: &'static str,
    pub child: EntityKind,
    pub link: Link,
}

impl NestedDef {
    pub fn parent_column(&self) -> Option<&'static str> {
        match self.link {
            Link::Column(c) => Some(c),
            Link::AnyOf(_) => None,
        }
    }
}
