#![allow(dead_code)]

use rusqlite::Connection;
use tempfile::TempDir;

use pirdesk::models::pir::{self, PirInput};
use pirdesk::models::question::{QuestionInput, QuestionOptions, QuestionType};
use pirdesk::models::tag::{self, TagInput};
use pirdesk::models::user::{self, NewUser};
use pirdesk::models::company;

/// Fresh SQLite database in a temp directory with the full schema applied.
/// The TempDir must stay alive for the duration of the test.
pub fn setup_test_db() -> (TempDir, Connection) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("test.db");
    let conn = Connection::open(&path).expect("Failed to open test db");
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .expect("Failed to enable foreign keys");
    conn.execute_batch(include_str!("../../src/schema.sql"))
        .expect("Failed to apply schema");
    (dir, conn)
}

/// Two companies in a customer/supplier relationship, one user on each side,
/// and one tag to hang questions on.
pub struct World {
    pub customer_id: i64,
    pub supplier_id: i64,
    pub customer_user: i64,
    pub supplier_user: i64,
    pub tag_id: i64,
}

pub fn seed_world(conn: &Connection) -> World {
    let customer_id = company::create(conn, "Acme Manufacturing").unwrap();
    let supplier_id = company::create(conn, "Globex Materials").unwrap();
    company::add_relationship(conn, customer_id, supplier_id).unwrap();

    let customer_user = user::create(
        conn,
        &NewUser {
            username: "alice".to_string(),
            password: "not-a-real-hash".to_string(),
            email: "alice@acme.test".to_string(),
            display_name: "Alice".to_string(),
        },
    )
    .unwrap();
    company::add_member(conn, customer_id, customer_user, "editor").unwrap();

    let supplier_user = user::create(
        conn,
        &NewUser {
            username: "bob".to_string(),
            password: "not-a-real-hash".to_string(),
            email: "bob@globex.test".to_string(),
            display_name: "Bob".to_string(),
        },
    )
    .unwrap();
    company::add_member(conn, supplier_id, supplier_user, "editor").unwrap();

    let tag_id = tag::create(
        conn,
        &TagInput { name: "chemical".to_string(), description: None },
    )
    .unwrap();

    World { customer_id, supplier_id, customer_user, supplier_user, tag_id }
}

pub fn make_question(
    conn: &Connection,
    text: &str,
    question_type: QuestionType,
    options: QuestionOptions,
    tag_id: i64,
) -> i64 {
    pirdesk::models::question::queries::create(
        conn,
        &QuestionInput {
            text: text.to_string(),
            description: None,
            question_type,
            required: false,
            options,
            section_id: None,
            sort_order: 0,
            tag_ids: vec![tag_id],
        },
    )
    .unwrap()
}

pub fn make_pir(conn: &Connection, world: &World) -> i64 {
    pir::queries::create(
        conn,
        world.customer_id,
        world.customer_user,
        &PirInput {
            supplier_company_id: world.supplier_id,
            product_id: None,
            suggested_product_name: Some("Widget base resin".to_string()),
            title: Some("Resin compliance data".to_string()),
            description: None,
            due_date: None,
            tag_ids: vec![world.tag_id],
        },
    )
    .unwrap()
}
