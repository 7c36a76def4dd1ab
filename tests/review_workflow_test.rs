mod common;

use common::{World, make_pir, make_question, seed_world, setup_test_db};
use pirdesk::errors::AppError;
use pirdesk::models::pir::{PirStatus, queries as pir_queries};
use pirdesk::models::question::{QuestionOptions, QuestionType};
use pirdesk::models::response::{ResponseStatus, flags, queries as response_queries};
use pirdesk::models::review::{
    self, ReviewDecision, ReviewState, ReviewTab, filter_items, load_items, open_review,
    submit_review,
};
use rusqlite::Connection;
use serde_json::json;

/// Submitted PIR with three answered questions; returns response ids A, B, C.
fn submitted_pir(conn: &Connection, world: &World) -> (i64, [i64; 3]) {
    let pir_id = make_pir(conn, world);
    let pir = pir_queries::require_by_id(conn, pir_id).unwrap();

    let mut response_ids = [0i64; 3];
    for (i, text) in ["Product name", "CAS number", "Supplier note"].iter().enumerate() {
        let qid = make_question(conn, text, QuestionType::Text, QuestionOptions::None, world.tag_id);
        let row = response_queries::save_answer(conn, &pir, qid, &json!("answer")).unwrap();
        response_ids[i] = row.id;
    }
    pir_queries::submit(conn, &pir).unwrap();
    (pir_id, response_ids)
}

fn approve(response_id: i64) -> ReviewDecision {
    ReviewDecision { response_id, state: ReviewState::Approved, note: None }
}

fn flag(response_id: i64, note: &str) -> ReviewDecision {
    ReviewDecision { response_id, state: ReviewState::Flagged, note: Some(note.to_string()) }
}

#[test]
fn opening_review_moves_to_in_review() {
    let (_dir, conn) = setup_test_db();
    let world = seed_world(&conn);
    let (pir_id, _) = submitted_pir(&conn, &world);

    let pir = pir_queries::require_by_id(&conn, pir_id).unwrap();
    let updated = open_review(&conn, &pir).unwrap();
    assert_eq!(updated.status, PirStatus::InReview);

    // Opening again from in_review is not legal.
    match open_review(&conn, &updated) {
        Err(AppError::InvalidStatus { .. }) => {}
        other => panic!("expected InvalidStatus, got {other:?}"),
    }
}

#[test]
fn first_round_flag_then_second_round_approve() {
    let (_dir, conn) = setup_test_db();
    let world = seed_world(&conn);
    let (pir_id, [a, b, c]) = submitted_pir(&conn, &world);

    // Round one: approve A and B, flag C.
    let pir = pir_queries::require_by_id(&conn, pir_id).unwrap();
    let pir = open_review(&conn, &pir).unwrap();
    let outcome = submit_review(
        &conn,
        &pir,
        &[approve(a), approve(b), flag(c, "missing CAS number")],
        world.customer_user,
        None,
    )
    .unwrap();
    assert_eq!(outcome.pir_status, PirStatus::Flagged);
    assert_eq!(outcome.approved_count, 2);
    assert_eq!(outcome.flagged_count, 1);

    let pir = pir_queries::require_by_id(&conn, pir_id).unwrap();
    assert_eq!(pir.status, PirStatus::Flagged);
    assert_eq!(pir.prior_rounds, 1);

    let c_flags = flags::find_for_response(&conn, c).unwrap();
    assert_eq!(c_flags.len(), 1);
    assert_eq!(c_flags[0].description, "missing CAS number");
    assert_eq!(flags::count_for_response(&conn, a).unwrap(), 0);

    let a_row = response_queries::find_by_id(&conn, a).unwrap().unwrap();
    assert_eq!(a_row.status, ResponseStatus::Approved);
    let c_row = response_queries::find_by_id(&conn, c).unwrap().unwrap();
    assert_eq!(c_row.status, ResponseStatus::Flagged);

    // Supplier fixes C and resubmits; approved answers keep their status.
    let pir = pir_queries::require_by_id(&conn, pir_id).unwrap();
    let c_question: i64 = conn
        .query_row("SELECT question_id FROM pir_responses WHERE id = ?1", [c], |r| r.get(0))
        .unwrap();
    response_queries::save_answer(&conn, &pir, c_question, &json!("CAS 7439-92-1")).unwrap();
    pir_queries::submit(&conn, &pir).unwrap();
    let a_row = response_queries::find_by_id(&conn, a).unwrap().unwrap();
    assert_eq!(a_row.status, ResponseStatus::Approved);

    // Round two: approve C, link the catalog product.
    let pir = pir_queries::require_by_id(&conn, pir_id).unwrap();
    let pir = open_review(&conn, &pir).unwrap();
    let outcome =
        submit_review(&conn, &pir, &[approve(c)], world.customer_user, Some(4711)).unwrap();
    assert_eq!(outcome.pir_status, PirStatus::Approved);

    let pir = pir_queries::require_by_id(&conn, pir_id).unwrap();
    assert_eq!(pir.status, PirStatus::Approved);
    assert_eq!(pir.product_id, Some(4711));
    assert!(pir.is_locked());
}

#[test]
fn flag_requires_a_non_empty_note() {
    let (_dir, conn) = setup_test_db();
    let world = seed_world(&conn);
    let (pir_id, [a, b, c]) = submitted_pir(&conn, &world);

    let pir = pir_queries::require_by_id(&conn, pir_id).unwrap();
    let pir = open_review(&conn, &pir).unwrap();

    let result = submit_review(
        &conn,
        &pir,
        &[approve(a), approve(b), ReviewDecision { response_id: c, state: ReviewState::Flagged, note: Some("   ".to_string()) }],
        world.customer_user,
        None,
    );
    assert!(matches!(result, Err(AppError::Validation(_))));

    // Nothing was written: no flag rows, statuses untouched, PIR still in review.
    assert_eq!(flags::count_for_response(&conn, c).unwrap(), 0);
    let a_row = response_queries::find_by_id(&conn, a).unwrap().unwrap();
    assert_eq!(a_row.status, ResponseStatus::Submitted);
    let pir = pir_queries::require_by_id(&conn, pir_id).unwrap();
    assert_eq!(pir.status, PirStatus::InReview);
}

#[test]
fn pending_responses_block_submission_with_a_count() {
    let (_dir, conn) = setup_test_db();
    let world = seed_world(&conn);
    let (pir_id, [a, _, _]) = submitted_pir(&conn, &world);

    let pir = pir_queries::require_by_id(&conn, pir_id).unwrap();
    let pir = open_review(&conn, &pir).unwrap();

    match submit_review(&conn, &pir, &[approve(a)], world.customer_user, None) {
        Err(AppError::Validation(msg)) => assert!(msg.contains('2'), "message was: {msg}"),
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[test]
fn derived_state_seeds_note_from_latest_flag() {
    let (_dir, conn) = setup_test_db();
    let world = seed_world(&conn);
    let (pir_id, [a, b, c]) = submitted_pir(&conn, &world);

    let pir = pir_queries::require_by_id(&conn, pir_id).unwrap();
    let pir = open_review(&conn, &pir).unwrap();
    submit_review(
        &conn,
        &pir,
        &[approve(a), approve(b), flag(c, "first objection")],
        world.customer_user,
        None,
    )
    .unwrap();

    // Reopen the round; C must come back flagged with the note pre-seeded.
    let pir = pir_queries::require_by_id(&conn, pir_id).unwrap();
    let pir = open_review(&conn, &pir).unwrap();
    let items = load_items(&conn, &pir).unwrap();

    let item_a = items.iter().find(|i| i.response.id == a).unwrap();
    assert_eq!(item_a.review_state, ReviewState::Approved);
    let item_c = items.iter().find(|i| i.response.id == c).unwrap();
    assert_eq!(item_c.review_state, ReviewState::Flagged);
    assert_eq!(item_c.note.as_deref(), Some("first objection"));
}

#[test]
fn tab_filtering_applies_round_semantics() {
    let (_dir, conn) = setup_test_db();
    let world = seed_world(&conn);
    let (pir_id, [a, b, c]) = submitted_pir(&conn, &world);

    let pir = pir_queries::require_by_id(&conn, pir_id).unwrap();
    let pir = open_review(&conn, &pir).unwrap();

    // First round: everything shows in `all`.
    let items = load_items(&conn, &pir).unwrap();
    assert_eq!(filter_items(items, ReviewTab::All, pir.prior_rounds).len(), 3);

    submit_review(
        &conn,
        &pir,
        &[approve(a), approve(b), flag(c, "missing data")],
        world.customer_user,
        None,
    )
    .unwrap();

    // Second round: previously-approved answers are hidden from `all`.
    let pir = pir_queries::require_by_id(&conn, pir_id).unwrap();
    let pir = open_review(&conn, &pir).unwrap();
    let all = filter_items(load_items(&conn, &pir).unwrap(), ReviewTab::All, pir.prior_rounds);
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].response.id, c);

    // `pending` excludes flagged-with-history; `flagged` and `approved` match
    // the derived states.
    let pending =
        filter_items(load_items(&conn, &pir).unwrap(), ReviewTab::Pending, pir.prior_rounds);
    assert!(pending.is_empty());
    let flagged =
        filter_items(load_items(&conn, &pir).unwrap(), ReviewTab::Flagged, pir.prior_rounds);
    assert_eq!(flagged.len(), 1);
    let approved =
        filter_items(load_items(&conn, &pir).unwrap(), ReviewTab::Approved, pir.prior_rounds);
    assert_eq!(approved.len(), 2);
}

#[test]
fn review_of_a_locked_pir_is_refused() {
    let (_dir, conn) = setup_test_db();
    let world = seed_world(&conn);
    let (pir_id, [a, b, c]) = submitted_pir(&conn, &world);

    let pir = pir_queries::require_by_id(&conn, pir_id).unwrap();
    let pir = open_review(&conn, &pir).unwrap();
    submit_review(&conn, &pir, &[approve(a), approve(b), approve(c)], world.customer_user, None)
        .unwrap();

    let pir = pir_queries::require_by_id(&conn, pir_id).unwrap();
    assert_eq!(pir.status, PirStatus::Approved);

    match review::submit_review(&conn, &pir, &[approve(a)], world.customer_user, None) {
        Err(AppError::InvalidStatus { .. }) => {}
        other => panic!("expected InvalidStatus, got {other:?}"),
    }
    match open_review(&conn, &pir) {
        Err(AppError::InvalidStatus { .. }) => {}
        other => panic!("expected InvalidStatus, got {other:?}"),
    }
}
