mod common;

use common::{make_question, seed_world, setup_test_db};
use pirdesk::models::numbering::build_catalog;
use pirdesk::models::question::{QuestionOptions, QuestionType, queries as question_queries};
use pirdesk::models::section::{self, SectionInput};

fn section_input(name: &str, sort_order: i64, parent_id: Option<i64>) -> SectionInput {
    SectionInput { name: name.to_string(), description: None, sort_order, parent_id }
}

#[test]
fn tree_partitions_sections_by_parent() {
    let (_dir, conn) = setup_test_db();
    let general = section::create(&conn, &section_input("General", 0, None)).unwrap();
    let chem = section::create(&conn, &section_input("Chemistry", 1, None)).unwrap();
    let metals = section::create(&conn, &section_input("Heavy metals", 0, Some(chem))).unwrap();

    let tree = section::find_tree(&conn).unwrap();
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].section.id, general);
    assert!(tree[0].subsections.is_empty());
    assert_eq!(tree[1].section.id, chem);
    assert_eq!(tree[1].subsections.len(), 1);
    assert_eq!(tree[1].subsections[0].id, metals);
}

#[test]
fn sections_nest_at_most_one_level() {
    let (_dir, conn) = setup_test_db();
    let top = section::create(&conn, &section_input("Top", 0, None)).unwrap();
    let sub = section::create(&conn, &section_input("Sub", 0, Some(top))).unwrap();
    assert!(section::create(&conn, &section_input("Too deep", 0, Some(sub))).is_err());
}

#[test]
fn delete_refuses_non_empty_sections() {
    let (_dir, conn) = setup_test_db();
    let world = seed_world(&conn);
    let top = section::create(&conn, &section_input("Top", 0, None)).unwrap();
    let sub = section::create(&conn, &section_input("Sub", 0, Some(top))).unwrap();

    // Holds a subsection.
    assert!(section::delete(&conn, top).is_err());

    // Holds a question.
    let qid = make_question(&conn, "Q", QuestionType::Text, QuestionOptions::None, world.tag_id);
    conn.execute("UPDATE questions SET section_id = ?1 WHERE id = ?2", [sub, qid]).unwrap();
    assert!(section::delete(&conn, sub).is_err());

    conn.execute("UPDATE questions SET section_id = NULL WHERE id = ?1", [qid]).unwrap();
    section::delete(&conn, sub).unwrap();
    section::delete(&conn, top).unwrap();
}

#[test]
fn catalog_numbers_sections_questions_and_strays() {
    let (_dir, conn) = setup_test_db();
    let world = seed_world(&conn);

    let general = section::create(&conn, &section_input("General", 0, None)).unwrap();
    let chem = section::create(&conn, &section_input("Chemistry", 1, None)).unwrap();
    let metals = section::create(&conn, &section_input("Heavy metals", 0, Some(chem))).unwrap();

    let q_names = |conn: &rusqlite::Connection, text: &str, section: Option<i64>| {
        let id = make_question(conn, text, QuestionType::Text, QuestionOptions::None, world.tag_id);
        if let Some(section_id) = section {
            conn.execute("UPDATE questions SET section_id = ?1 WHERE id = ?2", [section_id, id])
                .unwrap();
        }
        id
    };
    q_names(&conn, "Product name", Some(general));
    q_names(&conn, "Intended use", Some(general));
    q_names(&conn, "Lead content", Some(metals));
    q_names(&conn, "Anything else", None);

    let tree = section::find_tree(&conn).unwrap();
    let questions = question_queries::find_all(&conn).unwrap();
    let catalog = build_catalog(tree, questions);

    assert_eq!(catalog.sections.len(), 2);
    let general = &catalog.sections[0];
    assert_eq!(general.number, "1");
    assert_eq!(general.questions[0].number, "1.1");
    assert_eq!(general.questions[1].number, "1.2");

    let chem = &catalog.sections[1];
    assert_eq!(chem.number, "2");
    assert!(chem.questions.is_empty());
    assert_eq!(chem.subsections[0].number, "2.1");
    assert_eq!(chem.subsections[0].questions[0].number, "2.1.1");

    // Unsectioned questions continue the top-level numbering.
    assert_eq!(catalog.unsectioned.len(), 1);
    assert_eq!(catalog.unsectioned[0].number, "3");
}

#[test]
fn numbering_is_stable_for_a_given_order() {
    let (_dir, conn) = setup_test_db();
    let world = seed_world(&conn);
    let top = section::create(&conn, &section_input("Only", 0, None)).unwrap();
    for text in ["a", "b", "c"] {
        let id = make_question(&conn, text, QuestionType::Text, QuestionOptions::None, world.tag_id);
        conn.execute("UPDATE questions SET section_id = ?1 WHERE id = ?2", [top, id]).unwrap();
    }

    let first = build_catalog(
        section::find_tree(&conn).unwrap(),
        question_queries::find_all(&conn).unwrap(),
    );
    let second = build_catalog(
        section::find_tree(&conn).unwrap(),
        question_queries::find_all(&conn).unwrap(),
    );
    let numbers = |c: &pirdesk::models::numbering::NumberedCatalog| {
        c.sections[0].questions.iter().map(|q| q.number.clone()).collect::<Vec<_>>()
    };
    assert_eq!(numbers(&first), numbers(&second));
    assert_eq!(numbers(&first), vec!["1.1", "1.2", "1.3"]);
}
