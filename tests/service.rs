//! Service-level tests against a fresh in-memory SQLite database per test.

use chatterie_sync::error::AppError;
use chatterie_sync::schema::{catalog, EntityKind};
use chatterie_sync::{CreateInput, CrudService, Gateway, Patch};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn gateway() -> Gateway {
    Gateway::in_memory().await.expect("in-memory gateway")
}

async fn create(gw: &Gateway, kind: EntityKind, body: Value) -> Result<Value, AppError> {
    let entity = catalog().entity(kind);
    let input = CreateInput::parse(entity, body)?;
    CrudService::create(gw, entity, &input).await
}

async fn create_child(gw: &Gateway, parent: &str, child: &str, parent_id: i64, body: Value) -> Result<Value, AppError> {
    let nested = catalog().nested(parent, child).expect("nested collection");
    CrudService::create_child(gw, nested, parent_id, body).await
}

async fn count(gw: &Gateway, kind: EntityKind) -> usize {
    let entity = catalog().entity(kind);
    CrudService::list(gw, entity, &[]).await.unwrap().len()
}

fn id(row: &Value) -> i64 {
    row["id"].as_i64().expect("row id")
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_then_get_returns_equal_record() {
    let gw = gateway().await;
    let created = create(
        &gw,
        EntityKind::Cat,
        json!({"call_name": "Luna", "sex": "F", "birth_date": "2021-04-12", "microchip": "250269800000001"}),
    )
    .await
    .unwrap();
    assert_eq!(created["status"], "chaton");
    assert_eq!(created["is_neutered"], false);
    assert_eq!(created["sire_id"], Value::Null);

    let fetched = CrudService::read(&gw, catalog().entity(EntityKind::Cat), id(&created))
        .await
        .unwrap();
    assert_eq!(created, fetched);
}

#[tokio::test]
async fn update_applies_only_supplied_fields_and_explicit_null() {
    let gw = gateway().await;
    let cats = catalog().entity(EntityKind::Cat);
    let cat = create(&gw, EntityKind::Cat, json!({"call_name": "Luna", "color_ems": "n 22", "notes": "calme"}))
        .await
        .unwrap();

    let patch = Patch::parse(cats, json!({"notes": null, "is_neutered": true})).unwrap();
    let updated = CrudService::update(&gw, cats, id(&cat), &patch).await.unwrap();
    assert_eq!(updated["notes"], Value::Null);
    assert_eq!(updated["is_neutered"], true);
    assert_eq!(updated["color_ems"], "n 22");
    assert_eq!(updated["call_name"], "Luna");

    let unchanged = CrudService::update(&gw, cats, id(&cat), &Patch::default()).await.unwrap();
    assert_eq!(unchanged, updated);
}

#[tokio::test]
async fn update_missing_row_is_not_found() {
    let gw = gateway().await;
    let cats = catalog().entity(EntityKind::Cat);
    let patch = Patch::parse(cats, json!({"notes": "x"})).unwrap();
    let err = CrudService::update(&gw, cats, 77, &patch).await.unwrap_err();
    assert_eq!(err.to_string(), "not found: cat 77");
}

#[tokio::test]
async fn leads_are_ordered_by_score_with_unscored_last() {
    let gw = gateway().await;
    for (last, score) in [("Bernard", json!(50)), ("Durand", Value::Null), ("Martin", json!(90))] {
        create(
            &gw,
            EntityKind::FamilyLead,
            json!({"first_name": "Anne", "last_name": last, "qualification_score": score}),
        )
        .await
        .unwrap();
    }
    let leads = CrudService::list(&gw, catalog().entity(EntityKind::FamilyLead), &[])
        .await
        .unwrap();
    let scores: Vec<Value> = leads.iter().map(|l| l["qualification_score"].clone()).collect();
    assert_eq!(scores, vec![json!(90), json!(50), Value::Null]);
}

#[tokio::test]
async fn list_filters_on_declared_columns() {
    let gw = gateway().await;
    create(&gw, EntityKind::Cat, json!({"call_name": "Luna", "status": "reproductrice"})).await.unwrap();
    create(&gw, EntityKind::Cat, json!({"call_name": "Milo", "status": "reproducteur"})).await.unwrap();
    let rows = CrudService::list(
        &gw,
        catalog().entity(EntityKind::Cat),
        &[("status".to_string(), json!("reproducteur"))],
    )
    .await
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["call_name"], "Milo");
}

// ---------------------------------------------------------------------------
// Constraints and atomicity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_microchip_is_rejected_and_store_unchanged() {
    let gw = gateway().await;
    create(&gw, EntityKind::Cat, json!({"call_name": "Luna", "microchip": "250269800000001"}))
        .await
        .unwrap();
    let err = create(&gw, EntityKind::Cat, json!({"call_name": "Nala", "microchip": "250269800000001"}))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ConstraintViolation(_)), "got {err:?}");
    assert_eq!(count(&gw, EntityKind::Cat).await, 1);
}

#[tokio::test]
async fn kitten_with_mismatched_litter_is_a_conflict_and_writes_nothing() {
    let gw = gateway().await;
    let queen = create(&gw, EntityKind::Cat, json!({"call_name": "Luna", "sex": "F"})).await.unwrap();
    let sire = create(&gw, EntityKind::Cat, json!({"call_name": "Milo", "sex": "M"})).await.unwrap();
    let litter = create(
        &gw,
        EntityKind::Litter,
        json!({"name": "A", "queen_id": id(&queen), "sire_id": id(&sire)}),
    )
    .await
    .unwrap();

    let err = create_child(&gw, "litters", "kittens", id(&litter), json!({"name": "Pixel", "litter_id": id(&litter) + 1}))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");
    assert_eq!(count(&gw, EntityKind::Kitten).await, 0);
}

#[tokio::test]
async fn failed_update_leaves_the_row_unchanged() {
    let gw = gateway().await;
    let cats = catalog().entity(EntityKind::Cat);
    create(&gw, EntityKind::Cat, json!({"call_name": "Luna", "microchip": "250269800000001"}))
        .await
        .unwrap();
    let nala = create(&gw, EntityKind::Cat, json!({"call_name": "Nala", "notes": "timide"}))
        .await
        .unwrap();

    let patch = Patch::parse(cats, json!({"microchip": "250269800000001", "notes": "sociable"})).unwrap();
    let err = CrudService::update(&gw, cats, id(&nala), &patch).await.unwrap_err();
    assert!(matches!(err, AppError::ConstraintViolation(_)), "got {err:?}");
    let after = CrudService::read(&gw, cats, id(&nala)).await.unwrap();
    assert_eq!(after, nala);
}

#[tokio::test]
async fn dropped_scope_rolls_back_staged_writes() {
    let gw = gateway().await;
    let cats = catalog().entity(EntityKind::Cat);
    {
        let mut scope = gw.begin().await.unwrap();
        let input = CreateInput::parse(cats, json!({"call_name": "Fantôme"})).unwrap();
        let row = scope.insert(cats, input.values()).await.unwrap();
        let seen = scope.get_by_id(cats, id(&row)).await.unwrap();
        assert!(seen.is_some(), "scope sees its own writes");
    }
    assert_eq!(count(&gw, EntityKind::Cat).await, 0);
}

#[tokio::test]
async fn explicit_rollback_discards_the_scope() {
    let gw = gateway().await;
    let leads = catalog().entity(EntityKind::FamilyLead);
    let mut scope = gw.begin().await.unwrap();
    let input = CreateInput::parse(leads, json!({"first_name": "Anne", "last_name": "Martin"})).unwrap();
    scope.insert(leads, input.values()).await.unwrap();
    scope.rollback().await.unwrap();
    assert_eq!(count(&gw, EntityKind::FamilyLead).await, 0);
}

#[tokio::test]
async fn unknown_reference_is_not_found_and_nothing_is_written() {
    let gw = gateway().await;
    let err = create(&gw, EntityKind::Litter, json!({"name": "B", "queen_id": 999, "sire_id": 998}))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "not found: cat 999");
    assert_eq!(count(&gw, EntityKind::Litter).await, 0);
}

#[tokio::test]
async fn nested_create_under_missing_parent_is_not_found() {
    let gw = gateway().await;
    let err = create_child(&gw, "cats", "health-events", 5, json!({"category": "vaccin", "label": "Typhus", "event_date": "2024-01-10"}))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "not found: cat 5");
}

// ---------------------------------------------------------------------------
// Deletion policy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_missing_cat_is_not_found_and_deleted_cat_is_gone() {
    let gw = gateway().await;
    let cats = catalog().entity(EntityKind::Cat);
    assert!(matches!(CrudService::delete(&gw, cats, 1).await, Err(AppError::NotFound(_))));

    let cat = create(&gw, EntityKind::Cat, json!({"call_name": "Luna"})).await.unwrap();
    CrudService::delete(&gw, cats, id(&cat)).await.unwrap();
    assert!(matches!(CrudService::read(&gw, cats, id(&cat)).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn deleting_a_cat_cascades_to_its_records_and_unlinks_offspring() {
    let gw = gateway().await;
    let cats = catalog().entity(EntityKind::Cat);
    let sire = create(&gw, EntityKind::Cat, json!({"call_name": "Milo", "sex": "M"})).await.unwrap();
    let son = create(&gw, EntityKind::Cat, json!({"call_name": "Oscar", "sire_id": id(&sire)})).await.unwrap();
    create_child(&gw, "cats", "health-events", id(&sire), json!({"category": "vaccin", "label": "Typhus", "event_date": "2024-01-10"}))
        .await
        .unwrap();

    CrudService::delete(&gw, cats, id(&sire)).await.unwrap();
    assert_eq!(count(&gw, EntityKind::CatHealthEvent).await, 0);
    let son = CrudService::read(&gw, cats, id(&son)).await.unwrap();
    assert_eq!(son["sire_id"], Value::Null);
}

#[tokio::test]
async fn deleting_a_queen_with_litters_is_restricted() {
    let gw = gateway().await;
    let cats = catalog().entity(EntityKind::Cat);
    let queen = create(&gw, EntityKind::Cat, json!({"call_name": "Luna"})).await.unwrap();
    let sire = create(&gw, EntityKind::Cat, json!({"call_name": "Milo"})).await.unwrap();
    create(&gw, EntityKind::Litter, json!({"name": "A", "queen_id": id(&queen), "sire_id": id(&sire)}))
        .await
        .unwrap();

    let err = CrudService::delete(&gw, cats, id(&queen)).await.unwrap_err();
    assert!(matches!(err, AppError::ConstraintViolation(_)), "got {err:?}");
    assert!(CrudService::read(&gw, cats, id(&queen)).await.is_ok());
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

#[tokio::test]
async fn litter_with_kitten_links_back_to_both_parents() {
    let gw = gateway().await;
    let luna = create(&gw, EntityKind::Cat, json!({"call_name": "Luna", "sex": "F"})).await.unwrap();
    let milo = create(&gw, EntityKind::Cat, json!({"call_name": "Milo", "sex": "M"})).await.unwrap();
    let litter = create(
        &gw,
        EntityKind::Litter,
        json!({"name": "A", "queen_id": id(&luna), "sire_id": id(&milo), "birth_date": "2024-05-02"}),
    )
    .await
    .unwrap();
    let kitten = create_child(
        &gw,
        "litters",
        "kittens",
        id(&litter),
        json!({"name": "Pixel", "sire_id": id(&milo), "dam_id": id(&luna), "birth_weight_g": 98}),
    )
    .await
    .unwrap();
    assert_eq!(kitten["litter_id"], id(&litter));
    assert_eq!(kitten["status"], "disponible");

    let litter_kittens = catalog().nested("litters", "kittens").unwrap();
    let rows = CrudService::list_children(&gw, litter_kittens, id(&litter)).await.unwrap();
    assert_eq!(rows, vec![kitten.clone()]);

    let cat_kittens = catalog().nested("cats", "kittens").unwrap();
    for parent in [&luna, &milo] {
        let rows = CrudService::list_children(&gw, cat_kittens, id(parent)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Pixel");
    }

    let offspring = catalog().nested("cats", "offspring").unwrap();
    assert!(CrudService::list_children(&gw, offspring, id(&luna)).await.unwrap().is_empty());
}

#[tokio::test]
async fn measurements_default_their_timestamp_and_list_oldest_first() {
    let gw = gateway().await;
    let cat = create(&gw, EntityKind::Cat, json!({"call_name": "Luna"})).await.unwrap();
    create_child(&gw, "cats", "measurements", id(&cat), json!({"recorded_at": "2024-02-01T09:00:00", "weight_kg": 4}))
        .await
        .unwrap();
    let defaulted = create_child(&gw, "cats", "measurements", id(&cat), json!({"weight_kg": 4.2}))
        .await
        .unwrap();
    assert!(defaulted["recorded_at"].as_str().is_some_and(|s| s.len() >= 19));

    let measurements = catalog().nested("cats", "measurements").unwrap();
    let rows = CrudService::list_children(&gw, measurements, id(&cat)).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["weight_kg"], json!(4.0));
    assert_eq!(rows[1]["weight_kg"], json!(4.2));
}
