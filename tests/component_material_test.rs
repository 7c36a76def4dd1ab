mod common;

use common::{make_pir, make_question, seed_world, setup_test_db};
use pirdesk::models::component::{
    self, ComponentInput, MaterialInput, create_component, create_material, delete_component,
    find_components, find_materials,
};
use pirdesk::models::pir::queries as pir_queries;
use pirdesk::models::question::{QuestionOptions, QuestionType};
use pirdesk::models::response::queries as response_queries;
use rusqlite::Connection;

fn setup_response(conn: &Connection) -> i64 {
    let world = seed_world(conn);
    let qid = make_question(
        conn,
        "Bill of materials",
        QuestionType::ComponentMaterialList,
        QuestionOptions::None,
        world.tag_id,
    );
    let pir_id = make_pir(conn, &world);
    let pir = pir_queries::require_by_id(conn, pir_id).unwrap();
    response_queries::ensure_placeholder(conn, &pir, qid).unwrap().id
}

fn comp(name: &str) -> ComponentInput {
    ComponentInput { component_name: name.to_string(), position: None }
}

fn mat(name: &str, percentage: Option<f64>, recyclable: bool) -> MaterialInput {
    MaterialInput { material_name: name.to_string(), percentage, recyclable }
}

#[test]
fn components_append_in_stable_order() {
    let (_dir, conn) = setup_test_db();
    let response_id = setup_response(&conn);

    create_component(&conn, response_id, &comp("Housing")).unwrap();
    create_component(&conn, response_id, &comp("Gasket")).unwrap();
    create_component(&conn, response_id, &comp("Screws")).unwrap();

    let components = find_components(&conn, response_id).unwrap();
    let names: Vec<_> = components.iter().map(|c| c.component_name.as_str()).collect();
    assert_eq!(names, ["Housing", "Gasket", "Screws"]);
    let order: Vec<_> = components.iter().map(|c| c.order_index).collect();
    assert_eq!(order, [0, 1, 2]);
}

#[test]
fn deleting_a_middle_component_leaves_a_gap() {
    let (_dir, conn) = setup_test_db();
    let response_id = setup_response(&conn);

    create_component(&conn, response_id, &comp("Housing")).unwrap();
    let middle = create_component(&conn, response_id, &comp("Gasket")).unwrap();
    create_component(&conn, response_id, &comp("Screws")).unwrap();

    delete_component(&conn, middle).unwrap();
    let components = find_components(&conn, response_id).unwrap();
    let order: Vec<_> = components.iter().map(|c| c.order_index).collect();
    // No reindex: ordering needs to be stable, not contiguous.
    assert_eq!(order, [0, 2]);

    // The next append lands at the current count, which may collide with an
    // existing index; ties break by id, so ordering stays deterministic.
    create_component(&conn, response_id, &comp("Label")).unwrap();
    let components = find_components(&conn, response_id).unwrap();
    let names: Vec<_> = components.iter().map(|c| c.component_name.as_str()).collect();
    assert_eq!(names, ["Housing", "Screws", "Label"]);
}

#[test]
fn deleting_a_component_cascades_to_materials() {
    let (_dir, conn) = setup_test_db();
    let response_id = setup_response(&conn);
    let component_id = create_component(&conn, response_id, &comp("Housing")).unwrap();

    create_material(&conn, component_id, &mat("ABS", Some(80.0), true)).unwrap();
    create_material(&conn, component_id, &mat("Glass fibre", Some(20.0), false)).unwrap();

    delete_component(&conn, component_id).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM pir_response_component_materials", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn percentage_must_be_within_bounds() {
    let (_dir, conn) = setup_test_db();
    let response_id = setup_response(&conn);
    let component_id = create_component(&conn, response_id, &comp("Housing")).unwrap();

    assert!(create_material(&conn, component_id, &mat("ABS", Some(0.0), false)).is_ok());
    assert!(create_material(&conn, component_id, &mat("PC", Some(100.0), false)).is_ok());
    assert!(create_material(&conn, component_id, &mat("PVC", None, false)).is_ok());
    assert!(create_material(&conn, component_id, &mat("Bad", Some(-0.1), false)).is_err());
    assert!(create_material(&conn, component_id, &mat("Bad", Some(100.1), false)).is_err());
}

#[test]
fn recyclable_round_trips_as_a_real_boolean() {
    let (_dir, conn) = setup_test_db();
    let response_id = setup_response(&conn);
    let component_id = create_component(&conn, response_id, &comp("Housing")).unwrap();

    create_material(&conn, component_id, &mat("ABS", None, true)).unwrap();
    create_material(&conn, component_id, &mat("PVC", None, false)).unwrap();

    let materials = find_materials(&conn, component_id).unwrap();
    assert!(materials[0].recyclable);
    assert!(!materials[1].recyclable);
}

#[test]
fn recyclable_accepts_legacy_string_form_on_input() {
    let from_bool: MaterialInput =
        serde_json::from_value(serde_json::json!({ "material_name": "ABS", "recyclable": true }))
            .unwrap();
    assert!(from_bool.recyclable);

    let from_string: MaterialInput = serde_json::from_value(
        serde_json::json!({ "material_name": "ABS", "recyclable": "false" }),
    )
    .unwrap();
    assert!(!from_string.recyclable);

    let missing: MaterialInput =
        serde_json::from_value(serde_json::json!({ "material_name": "ABS" })).unwrap();
    assert!(!missing.recyclable);

    let junk: Result<MaterialInput, _> = serde_json::from_value(
        serde_json::json!({ "material_name": "ABS", "recyclable": "yes" }),
    );
    assert!(junk.is_err());
}

#[test]
fn empty_names_are_rejected() {
    let (_dir, conn) = setup_test_db();
    let response_id = setup_response(&conn);

    assert!(create_component(&conn, response_id, &comp("  ")).is_err());
    let component_id = create_component(&conn, response_id, &comp("Housing")).unwrap();
    assert!(create_material(&conn, component_id, &mat("", None, false)).is_err());
    assert!(component::update_component(&conn, component_id, &comp("")).is_err());
}
