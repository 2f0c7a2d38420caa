//! The cattery catalog: every table, its columns, relations and API exposure.

use crate::schema::types::ColumnType::{Bool, Date, DateTime, Int, Real, Text};
use crate::schema::types::EntityKind as K;
use crate::schema::types::Operation::{Create, Delete, List, Read, Update};
use crate::schema::types::OnDelete::{Cascade, Restrict, SetNull};
use crate::schema::types::*;

const NOW: &str = "(strftime('%Y-%m-%dT%H:%M:%f', 'now'))";

const CAT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::id(),
    ColumnDef::required("call_name", Text).indexed(),
    ColumnDef::optional("pedigree_name", Text),
    ColumnDef::optional("birth_date", Date),
    ColumnDef::optional("sex", Text),
    ColumnDef::optional("color_ems", Text),
    ColumnDef::optional("status", Text).with_default("'chaton'").not_null(),
    ColumnDef::optional("microchip", Text).unique(),
    ColumnDef::optional("cat_id_number", Text),
    ColumnDef::optional("eu_passport", Text),
    ColumnDef::optional("is_neutered", Bool).with_default("0").not_null(),
    ColumnDef::optional("sire_id", Int).references(K::Cat, SetNull),
    ColumnDef::optional("dam_id", Int).references(K::Cat, SetNull),
    ColumnDef::optional("notes", Text),
];

const GENETIC_TEST_COLUMNS: &[ColumnDef] = &[
    ColumnDef::id(),
    ColumnDef::required("cat_id", Int).immutable().references(K::Cat, Cascade),
    ColumnDef::required("test_name", Text),
    ColumnDef::required("status", Text),
    ColumnDef::optional("laboratory", Text),
    ColumnDef::optional("result_date", Date),
    ColumnDef::optional("document_path", Text),
];

const HEALTH_EVENT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::id(),
    ColumnDef::required("cat_id", Int).immutable().references(K::Cat, Cascade),
    ColumnDef::required("category", Text),
    ColumnDef::required("label", Text),
    ColumnDef::required("event_date", Date),
    ColumnDef::optional("due_date", Date),
    ColumnDef::optional("notes", Text),
    ColumnDef::optional("document_path", Text),
];

const MEASUREMENT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::id(),
    ColumnDef::required("cat_id", Int).immutable().references(K::Cat, Cascade),
    ColumnDef::optional("recorded_at", DateTime).with_default(NOW).not_null(),
    ColumnDef::optional("weight_kg", Real),
    ColumnDef::optional("length_cm", Real),
    ColumnDef::optional("feeding_notes", Text),
];

const HEAT_CYCLE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::id(),
    ColumnDef::required("queen_id", Int).references(K::Cat, Cascade),
    ColumnDef::required("start_date", Date),
    ColumnDef::optional("end_date", Date),
    ColumnDef::optional("intensity", Text),
    ColumnDef::optional("notes", Text),
];

const MATING_COLUMNS: &[ColumnDef] = &[
    ColumnDef::id(),
    ColumnDef::required("queen_id", Int).references(K::Cat, Restrict),
    ColumnDef::required("sire_id", Int).references(K::Cat, Restrict),
    ColumnDef::required("date", Date),
    ColumnDef::required("type", Text),
    ColumnDef::optional("contract_path", Text),
    ColumnDef::optional("proof_path", Text),
    ColumnDef::optional("notes", Text),
];

const PREGNANCY_COLUMNS: &[ColumnDef] = &[
    ColumnDef::id(),
    ColumnDef::required("queen_id", Int).references(K::Cat, Restrict),
    ColumnDef::required("sire_id", Int).references(K::Cat, Restrict),
    ColumnDef::optional("mating_id", Int).references(K::MatingRecord, SetNull),
    ColumnDef::optional("due_date", Date),
    ColumnDef::optional("confirmation_date", Date),
    ColumnDef::optional("notes", Text),
];

const LITTER_COLUMNS: &[ColumnDef] = &[
    ColumnDef::id(),
    ColumnDef::required("name", Text),
    ColumnDef::required("queen_id", Int).references(K::Cat, Restrict),
    ColumnDef::required("sire_id", Int).references(K::Cat, Restrict),
    ColumnDef::optional("mating_date", Date),
    ColumnDef::optional("birth_date", Date),
    ColumnDef::optional("notes", Text),
];

const KITTEN_COLUMNS: &[ColumnDef] = &[
    ColumnDef::id(),
    ColumnDef::required("litter_id", Int).immutable().references(K::Litter, Restrict),
    ColumnDef::required("name", Text),
    ColumnDef::optional("sire_id", Int).references(K::Cat, SetNull),
    ColumnDef::optional("dam_id", Int).references(K::Cat, SetNull),
    ColumnDef::optional("sex", Text),
    ColumnDef::optional("color_estimate", Text),
    ColumnDef::optional("birth_time", DateTime),
    ColumnDef::optional("birth_weight_g", Int),
    ColumnDef::optional("collar_color", Text),
    ColumnDef::optional("status", Text).with_default("'disponible'").not_null(),
    ColumnDef::optional("notes", Text),
];

const KITTEN_WEIGHT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::id(),
    ColumnDef::required("kitten_id", Int).immutable().references(K::Kitten, Cascade),
    ColumnDef::optional("recorded_at", DateTime).with_default(NOW).not_null(),
    ColumnDef::optional("weight_g", Int),
];

const LEAD_COLUMNS: &[ColumnDef] = &[
    ColumnDef::id(),
    ColumnDef::required("first_name", Text),
    ColumnDef::required("last_name", Text),
    ColumnDef::optional("email", Text),
    ColumnDef::optional("phone", Text),
    ColumnDef::optional("has_children", Bool),
    ColumnDef::optional("has_other_pets", Text),
    ColumnDef::optional("allergy_notes", Text),
    ColumnDef::optional("budget_range", Text),
    ColumnDef::optional("preferred_color", Text),
    ColumnDef::optional("preferred_gender", Text),
    ColumnDef::optional("tags", Text),
    ColumnDef::optional("qualification_score", Int),
    ColumnDef::optional("status", Text).with_default("'prospect'").not_null(),
    ColumnDef::optional("notes", Text),
];

const INTERACTION_COLUMNS: &[ColumnDef] = &[
    ColumnDef::id(),
    ColumnDef::required("lead_id", Int).immutable().references(K::FamilyLead, Cascade),
    ColumnDef::optional("interaction_date", DateTime).with_default(NOW).not_null(),
    ColumnDef::optional("channel", Text),
    ColumnDef::required("summary", Text),
];

const RESERVATION_COLUMNS: &[ColumnDef] = &[
    ColumnDef::id(),
    ColumnDef::required("kitten_id", Int).references(K::Kitten, Restrict),
    ColumnDef::required("lead_id", Int).references(K::FamilyLead, Restrict),
    ColumnDef::required("reservation_date", Date),
    ColumnDef::optional("deposit_amount", Real),
    ColumnDef::optional("payment_schedule", Text),
    ColumnDef::optional("kyc_status", Text).with_default("'pending'"),
    ColumnDef::optional("contract_path", Text),
];

const FOLLOWUP_COLUMNS: &[ColumnDef] = &[
    ColumnDef::id(),
    ColumnDef::required("reservation_id", Int).references(K::Reservation, Cascade),
    ColumnDef::required("followup_date", Date),
    ColumnDef::required("reminder_type", Text),
    ColumnDef::optional("completed", Bool).with_default("0").not_null(),
    ColumnDef::optional("notes", Text),
];

const REMINDER_COLUMNS: &[ColumnDef] = &[
    ColumnDef::id(),
    ColumnDef::optional("cat_id", Int).references(K::Cat, Cascade),
    ColumnDef::optional("kitten_id", Int).references(K::Kitten, Cascade),
    ColumnDef::required("due_date", Date),
    ColumnDef::required("category", Text),
    ColumnDef::required("description", Text),
    ColumnDef::optional("completed", Bool).with_default("0").not_null(),
    ColumnDef::optional("completed_at", DateTime),
];

const ATTACHMENT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::id(),
    ColumnDef::optional("cat_id", Int).references(K::Cat, SetNull),
    ColumnDef::optional("kitten_id", Int).references(K::Kitten, SetNull),
    ColumnDef::optional("litter_id", Int).references(K::Litter, SetNull),
    ColumnDef::optional("lead_id", Int).references(K::FamilyLead, SetNull),
    ColumnDef::required("file_path", Text),
    ColumnDef::optional("label", Text),
    ColumnDef::optional("description", Text),
];

const CRUD: &[Operation] = &[List, Read, Create, Update, Delete];
const NO_DELETE: &[Operation] = &[List, Read, Create, Update];
const READ_UPDATE: &[Operation] = &[Read, Update];

/// Declared in FK dependency order: every table appears after the tables it references.
static ENTITIES: &[EntityDef] = &[
    EntityDef {
        kind: K::Cat,
        table: "cats",
        label: "cat",
        path_segment: Some("cats"),
        columns: CAT_COLUMNS,
        order: &[OrderTerm::asc("call_name")],
        filters: &["status", "sex", "sire_id", "dam_id", "microchip"],
        operations: CRUD,
    },
    EntityDef {
        kind: K::CatGeneticTest,
        table: "cat_genetic_tests",
        label: "genetic test",
        path_segment: Some("genetic-tests"),
        columns: GENETIC_TEST_COLUMNS,
        order: &[OrderTerm::desc("result_date").nulls_last()],
        filters: &["cat_id", "status"],
        operations: READ_UPDATE,
    },
    EntityDef {
        kind: K::CatHealthEvent,
        table: "cat_health_events",
        label: "health event",
        path_segment: Some("health-events"),
        columns: HEALTH_EVENT_COLUMNS,
        order: &[OrderTerm::desc("event_date")],
        filters: &["cat_id", "category"],
        operations: READ_UPDATE,
    },
    EntityDef {
        kind: K::CatMeasurement,
        table: "cat_measurements",
        label: "measurement",
        path_segment: None,
        columns: MEASUREMENT_COLUMNS,
        order: &[OrderTerm::asc("recorded_at")],
        filters: &[],
        operations: &[],
    },
    EntityDef {
        kind: K::HeatCycle,
        table: "heat_cycles",
        label: "heat cycle",
        path_segment: Some("heat-cycles"),
        columns: HEAT_CYCLE_COLUMNS,
        order: &[OrderTerm::desc("start_date")],
        filters: &["queen_id"],
        operations: NO_DELETE,
    },
    EntityDef {
        kind: K::MatingRecord,
        table: "mating_records",
        label: "mating record",
        path_segment: Some("matings"),
        columns: MATING_COLUMNS,
        order: &[OrderTerm::desc("date")],
        filters: &["queen_id", "sire_id", "type"],
        operations: NO_DELETE,
    },
    EntityDef {
        kind: K::PregnancyTimeline,
        table: "pregnancies",
        label: "pregnancy",
        path_segment: Some("pregnancies"),
        columns: PREGNANCY_COLUMNS,
        order: &[OrderTerm::asc("due_date").nulls_last()],
        filters: &["queen_id", "sire_id", "mating_id"],
        operations: NO_DELETE,
    },
    EntityDef {
        kind: K::Litter,
        table: "litters",
        label: "litter",
        path_segment: Some("litters"),
        columns: LITTER_COLUMNS,
        order: &[OrderTerm::desc("birth_date").nulls_last()],
        filters: &["queen_id", "sire_id"],
        operations: NO_DELETE,
    },
    EntityDef {
        kind: K::Kitten,
        table: "kittens",
        label: "kitten",
        path_segment: Some("kittens"),
        columns: KITTEN_COLUMNS,
        order: &[OrderTerm::asc("name")],
        filters: &["litter_id", "status", "sire_id", "dam_id"],
        operations: &[List, Read, Update],
    },
    EntityDef {
        kind: K::KittenWeight,
        table: "kitten_weights",
        label: "kitten weight",
        path_segment: None,
        columns: KITTEN_WEIGHT_COLUMNS,
        order: &[OrderTerm::asc("recorded_at")],
        filters: &[],
        operations: &[],
    },
    EntityDef {
        kind: K::FamilyLead,
        table: "family_leads",
        label: "family lead",
        path_segment: Some("leads"),
        columns: LEAD_COLUMNS,
        order: &[
            OrderTerm::desc("qualification_score").nulls_last(),
            OrderTerm::asc("last_name"),
        ],
        filters: &["status"],
        operations: NO_DELETE,
    },
    EntityDef {
        kind: K::LeadInteraction,
        table: "lead_interactions",
        label: "lead interaction",
        path_segment: None,
        columns: INTERACTION_COLUMNS,
        order: &[OrderTerm::desc("interaction_date")],
        filters: &[],
        operations: &[],
    },
    EntityDef {
        kind: K::Reservation,
        table: "reservations",
        label: "reservation",
        path_segment: Some("reservations"),
        columns: RESERVATION_COLUMNS,
        order: &[OrderTerm::desc("reservation_date")],
        filters: &["kitten_id", "lead_id", "kyc_status"],
        operations: NO_DELETE,
    },
    EntityDef {
        kind: K::AdoptionFollowUp,
        table: "adoption_followups",
        label: "adoption follow-up",
        path_segment: Some("followups"),
        columns: FOLLOWUP_COLUMNS,
        order: &[OrderTerm::asc("followup_date")],
        filters: &["completed", "reservation_id"],
        operations: NO_DELETE,
    },
    EntityDef {
        kind: K::ComplianceReminder,
        table: "compliance_reminders",
        label: "compliance reminder",
        path_segment: Some("reminders"),
        columns: REMINDER_COLUMNS,
        order: &[OrderTerm::asc("due_date")],
        filters: &["completed", "cat_id", "kitten_id", "category"],
        operations: CRUD,
    },
    EntityDef {
        kind: K::DocumentAttachment,
        table: "document_attachments",
        label: "document attachment",
        path_segment: Some("attachments"),
        columns: ATTACHMENT_COLUMNS,
        order: &[OrderTerm::desc("id")],
        filters: &["cat_id", "kitten_id", "litter_id", "lead_id"],
        operations: CRUD,
    },
];

const LINEAGE: &[&str] = &["sire_id", "dam_id"];

static NESTED: &[NestedDef] = &[
    NestedDef { parent: K::Cat, segment: "genetic-tests", child: K::CatGeneticTest, link: Link::Column("cat_id") },
    NestedDef { parent: K::Cat, segment: "health-events", child: K::CatHealthEvent, link: Link::Column("cat_id") },
    NestedDef { parent: K::Cat, segment: "measurements", child: K::CatMeasurement, link: Link::Column("cat_id") },
    NestedDef { parent: K::Cat, segment: "heat-cycles", child: K::HeatCycle, link: Link::Column("queen_id") },
    NestedDef { parent: K::Cat, segment: "reminders", child: K::ComplianceReminder, link: Link::Column("cat_id") },
    NestedDef { parent: K::Cat, segment: "attachments", child: K::DocumentAttachment, link: Link::Column("cat_id") },
    NestedDef { parent: K::Cat, segment: "offspring", child: K::Cat, link: Link::AnyOf(LINEAGE) },
    NestedDef { parent: K::Cat, segment: "kittens", child: K::Kitten, link: Link::AnyOf(LINEAGE) },
    NestedDef { parent: K::Litter, segment: "kittens", child: K::Kitten, link: Link::Column("litter_id") },
    NestedDef { parent: K::Litter, segment: "attachments", child: K::DocumentAttachment, link: Link::Column("litter_id") },
    NestedDef { parent: K::Kitten, segment: "weights", child: K::KittenWeight, link: Link::Column("kitten_id") },
    NestedDef { parent: K::Kitten, segment: "reminders", child: K::ComplianceReminder, link: Link::Column("kitten_id") },
    NestedDef { parent: K::FamilyLead, segment: "interactions", child: K::LeadInteraction, link: Link::Column("lead_id") },
    NestedDef { parent: K::FamilyLead, segment: "reservations", child: K::Reservation, link: Link::Column("lead_id") },
    NestedDef { parent: K::Reservation, segment: "followups", child: K::AdoptionFollowUp, link: Link::Column("reservation_id") },
];

/// Entity and child-collection registry.
#[derive(Debug)]
pub struct Catalog {
    pub entities: &'static [EntityDef],
    pub nested: &'static [NestedDef],
}

static CATALOG: Catalog = Catalog {
    entities: ENTITIES,
    nested: NESTED,
};

/// The application catalog.
pub fn catalog() -> &'static Catalog {
    &CATALOG
}

impl Catalog {
    /// Entities are declared in `EntityKind` order (checked by `validate`), so the kind is the index.
    pub fn entity(&self, kind: EntityKind) -> &'static EntityDef {
        let entities: &'static [EntityDef] = self.entities;
        &entities[kind as usize]
    }

    pub fn by_path(&self, segment: &str) -> Option<&'static EntityDef> {
        let entities: &'static [EntityDef] = self.entities;
        entities.iter().find(|e| e.path_segment == Some(segment))
    }

    /// Child collection `segment` under the entity mounted at `parent_segment`.
    pub fn nested(&self, parent_segment: &str, segment: &str) -> Option<&'static NestedDef> {
        let parent = self.by_path(parent_segment)?;
        let nested: &'static [NestedDef] = self.nested;
        nested
            .iter()
            .find(|n| n.parent == parent.kind && n.segment == segment)
    }
}
