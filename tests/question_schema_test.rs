use serde_json::json;

use pirdesk::models::question::{
    HeaderCell, LeafKind, QuestionOptions, QuestionType, TableColumn, header_rows, max_depth,
};
use pirdesk::models::question::columns::{empty_row, validate_row, validate_rows};

fn sample_columns() -> Vec<TableColumn> {
    vec![
        TableColumn::Leaf { name: "substance".to_string(), kind: LeafKind::Text },
        TableColumn::Nested {
            name: "concentration".to_string(),
            columns: vec![
                TableColumn::Leaf { name: "value".to_string(), kind: LeafKind::Number },
                TableColumn::Leaf {
                    name: "unit".to_string(),
                    kind: LeafKind::Select(vec!["ppm".to_string(), "%".to_string()]),
                },
            ],
        },
    ]
}

#[test]
fn table_column_wire_round_trip() {
    let cols = sample_columns();
    let wire = serde_json::to_string(&cols).unwrap();
    let back: Vec<TableColumn> = serde_json::from_str(&wire).unwrap();
    assert_eq!(back, cols);
}

#[test]
fn nested_column_without_children_is_rejected() {
    let wire = json!([{ "name": "group", "nested": true, "nestedColumns": [] }]);
    let result: Result<Vec<TableColumn>, _> = serde_json::from_value(wire);
    assert!(result.is_err());

    let wire = json!([{ "name": "group", "nested": true }]);
    let result: Result<Vec<TableColumn>, _> = serde_json::from_value(wire);
    assert!(result.is_err());
}

#[test]
fn select_column_requires_options() {
    let wire = json!([{ "name": "unit", "type": "select", "options": [] }]);
    let result: Result<Vec<TableColumn>, _> = serde_json::from_value(wire);
    assert!(result.is_err());
}

#[test]
fn missing_type_defaults_to_text() {
    let wire = json!([{ "name": "note" }]);
    let cols: Vec<TableColumn> = serde_json::from_value(wire).unwrap();
    assert_eq!(cols, vec![TableColumn::Leaf { name: "note".to_string(), kind: LeafKind::Text }]);
}

#[test]
fn leaf_count_and_depth() {
    let cols = sample_columns();
    assert_eq!(cols[0].leaf_count(), 1);
    assert_eq!(cols[1].leaf_count(), 2);
    assert_eq!(max_depth(&cols), 2);
}

#[test]
fn header_grid_geometry() {
    let rows = header_rows(&sample_columns());
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0],
        vec![
            HeaderCell { name: "substance".to_string(), colspan: 1, rowspan: 2 },
            HeaderCell { name: "concentration".to_string(), colspan: 2, rowspan: 1 },
        ]
    );
    assert_eq!(
        rows[1],
        vec![
            HeaderCell { name: "value".to_string(), colspan: 1, rowspan: 1 },
            HeaderCell { name: "unit".to_string(), colspan: 1, rowspan: 1 },
        ]
    );
}

#[test]
fn empty_row_mirrors_column_tree() {
    let row = empty_row(&sample_columns());
    assert_eq!(
        row,
        json!({
            "substance": "",
            "concentration": { "value": null, "unit": null },
        })
    );
}

#[test]
fn row_validation_accepts_matching_shape() {
    let cols = sample_columns();
    let row = json!({
        "substance": "lead",
        "concentration": { "value": 12.5, "unit": "ppm" },
    });
    assert!(validate_row(&cols, &row).is_ok());
}

#[test]
fn row_validation_rejects_unknown_and_missing_columns() {
    let cols = sample_columns();
    let extra = json!({
        "substance": "lead",
        "concentration": { "value": 1, "unit": "ppm" },
        "bogus": 1,
    });
    assert!(validate_row(&cols, &extra).is_err());

    let missing = json!({ "substance": "lead" });
    assert!(validate_row(&cols, &missing).is_err());
}

#[test]
fn row_validation_rejects_bad_select_value() {
    let cols = sample_columns();
    let row = json!({
        "substance": "lead",
        "concentration": { "value": 1, "unit": "furlongs" },
    });
    assert!(validate_row(&cols, &row).is_err());
}

#[test]
fn list_table_answer_round_trip_preserves_rows() {
    let cols = sample_columns();
    let answer = json!([
        { "substance": "lead", "concentration": { "value": 12.5, "unit": "ppm" } },
        { "substance": "cadmium", "concentration": { "value": 0.3, "unit": "%" } },
        { "substance": "mercury", "concentration": { "value": null, "unit": null } },
    ]);
    assert!(validate_rows(&cols, &answer).is_ok());

    let wire = serde_json::to_string(&answer).unwrap();
    let back: serde_json::Value = serde_json::from_str(&wire).unwrap();
    assert_eq!(back, answer);
}

#[test]
fn options_payload_must_match_question_type() {
    let choices = QuestionOptions::Choices(vec!["yes".to_string(), "no".to_string()]);
    assert!(choices.validate_for(QuestionType::SingleSelect).is_ok());
    assert!(choices.validate_for(QuestionType::Text).is_err());
    assert!(choices.validate_for(QuestionType::ListTable).is_err());

    let empty_choices = QuestionOptions::Choices(vec![]);
    assert!(empty_choices.validate_for(QuestionType::SingleSelect).is_err());

    let columns = QuestionOptions::Columns(sample_columns());
    assert!(columns.validate_for(QuestionType::ListTable).is_ok());
    assert!(columns.validate_for(QuestionType::MultiSelect).is_err());

    assert!(QuestionOptions::None.validate_for(QuestionType::Boolean).is_ok());
    assert!(QuestionOptions::None.validate_for(QuestionType::ListTable).is_err());
}
