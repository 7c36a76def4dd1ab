mod common;

use common::{World, make_pir, make_question, seed_world, setup_test_db};
use pirdesk::models::pir::queries as pir_queries;
use pirdesk::models::question::{QuestionOptions, QuestionType};
use pirdesk::models::response::{comments, flags, queries as response_queries};
use rusqlite::Connection;
use serde_json::json;

fn answered_response(conn: &Connection, world: &World) -> i64 {
    let qid = make_question(conn, "Name", QuestionType::Text, QuestionOptions::None, world.tag_id);
    let pir_id = make_pir(conn, world);
    let pir = pir_queries::require_by_id(conn, pir_id).unwrap();
    response_queries::save_answer(conn, &pir, qid, &json!("resin")).unwrap().id
}

#[test]
fn flags_accumulate_newest_first() {
    let (_dir, conn) = setup_test_db();
    let world = seed_world(&conn);
    let response_id = answered_response(&conn, &world);

    flags::create(&conn, response_id, "first objection", world.customer_user).unwrap();
    flags::create(&conn, response_id, "second objection", world.customer_user).unwrap();

    let history = flags::find_for_response(&conn, response_id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].description, "second objection");

    // The latest flag is the canonical feedback shown to the supplier.
    let latest = flags::latest_for_response(&conn, response_id).unwrap().unwrap();
    assert_eq!(latest.description, "second objection");
    assert_eq!(latest.status, flags::FlagStatus::Open);
}

#[test]
fn empty_flag_description_is_rejected() {
    let (_dir, conn) = setup_test_db();
    let world = seed_world(&conn);
    let response_id = answered_response(&conn, &world);

    assert!(flags::create(&conn, response_id, "   ", world.customer_user).is_err());
    assert_eq!(flags::count_for_response(&conn, response_id).unwrap(), 0);
}

#[test]
fn resolving_a_flag_stamps_resolution() {
    let (_dir, conn) = setup_test_db();
    let world = seed_world(&conn);
    let response_id = answered_response(&conn, &world);
    let flag_id = flags::create(&conn, response_id, "missing data", world.customer_user).unwrap();

    flags::update_status(&conn, flag_id, flags::FlagStatus::InProgress, world.supplier_user)
        .unwrap();
    let flag = flags::find_by_id(&conn, flag_id).unwrap().unwrap();
    assert_eq!(flag.status, flags::FlagStatus::InProgress);
    assert!(flag.resolved_at.is_none());

    flags::update_status(&conn, flag_id, flags::FlagStatus::Resolved, world.customer_user)
        .unwrap();
    let flag = flags::find_by_id(&conn, flag_id).unwrap().unwrap();
    assert_eq!(flag.status, flags::FlagStatus::Resolved);
    assert!(flag.resolved_at.is_some());
    assert_eq!(flag.resolved_by, Some(world.customer_user));

    // Reopening clears the resolution stamp.
    flags::update_status(&conn, flag_id, flags::FlagStatus::Open, world.customer_user).unwrap();
    let flag = flags::find_by_id(&conn, flag_id).unwrap().unwrap();
    assert!(flag.resolved_at.is_none());
    assert!(flag.resolved_by.is_none());
}

#[test]
fn comment_thread_is_oldest_first_with_author_names() {
    let (_dir, conn) = setup_test_db();
    let world = seed_world(&conn);
    let response_id = answered_response(&conn, &world);

    comments::create(&conn, response_id, "Why is the CAS number missing?", world.customer_user)
        .unwrap();
    comments::create(&conn, response_id, "Chasing our lab for it.", world.supplier_user).unwrap();

    let thread = comments::find_for_response(&conn, response_id).unwrap();
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[0].body, "Why is the CAS number missing?");
    assert_eq!(thread[0].created_by_name, "Alice");
    assert_eq!(thread[1].created_by_name, "Bob");
}

#[test]
fn empty_comment_is_rejected() {
    let (_dir, conn) = setup_test_db();
    let world = seed_world(&conn);
    let response_id = answered_response(&conn, &world);

    assert!(comments::create(&conn, response_id, "", world.customer_user).is_err());
    assert!(comments::create(&conn, response_id, "  \n ", world.customer_user).is_err());
}
