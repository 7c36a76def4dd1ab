use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde::de::Error as DeError;

use crate::errors::AppError;

/// Closed set of question types. Every consumer dispatches with an
/// exhaustive match so adding a type is a compile-time checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Text,
    Number,
    Boolean,
    SingleSelect,
    MultiSelect,
    Date,
    File,
    ListTable,
    ComponentMaterialList,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Text => "text",
            QuestionType::Number => "number",
            QuestionType::Boolean => "boolean",
            QuestionType::SingleSelect => "single_select",
            QuestionType::MultiSelect => "multi_select",
            QuestionType::Date => "date",
            QuestionType::File => "file",
            QuestionType::ListTable => "list_table",
            QuestionType::ComponentMaterialList => "component_material_list",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "text" => Ok(QuestionType::Text),
            "number" => Ok(QuestionType::Number),
            "boolean" => Ok(QuestionType::Boolean),
            "single_select" => Ok(QuestionType::SingleSelect),
            "multi_select" => Ok(QuestionType::MultiSelect),
            "date" => Ok(QuestionType::Date),
            "file" => Ok(QuestionType::File),
            "list_table" => Ok(QuestionType::ListTable),
            "component_material_list" => Ok(QuestionType::ComponentMaterialList),
            other => Err(AppError::Validation(format!("Unknown question type '{other}'"))),
        }
    }
}

/// Cell type of a leaf table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafKind {
    Text,
    Number,
    Boolean,
    /// Allowed values; never empty (checked at deserialization).
    Select(Vec<String>),
}

/// A list-table column. The sum shape makes "nested implies children"
/// structural: a `Nested` column cannot exist without its sub-columns.
#[derive(Debug, Clone, PartialEq)]
pub enum TableColumn {
    Leaf { name: String, kind: LeafKind },
    Nested { name: String, columns: Vec<TableColumn> },
}

impl TableColumn {
    pub fn name(&self) -> &str {
        match self {
            TableColumn::Leaf { name, .. } => name,
            TableColumn::Nested { name, .. } => name,
        }
    }
}

/// Wire shape of a column:
/// `{name, type, options?, nested?, nestedColumns?}`, recursive.
#[derive(Serialize, Deserialize)]
struct WireColumn {
    name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nested: Option<bool>,
    #[serde(rename = "nestedColumns", skip_serializing_if = "Option::is_none")]
    nested_columns: Option<Vec<WireColumn>>,
}

impl TryFrom<WireColumn> for TableColumn {
    type Error = String;

    fn try_from(wire: WireColumn) -> Result<Self, String> {
        if wire.name.trim().is_empty() {
            return Err("Column name is required".to_string());
        }
        if wire.nested.unwrap_or(false) {
            let children = wire.nested_columns.unwrap_or_default();
            if children.is_empty() {
                return Err(format!(
                    "Nested column '{}' requires at least one nested column",
                    wire.name
                ));
            }
            let columns = children
                .into_iter()
                .map(TableColumn::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(TableColumn::Nested { name: wire.name, columns });
        }

        let kind = match wire.kind.as_deref() {
            Some("text") | None => LeafKind::Text,
            Some("number") => LeafKind::Number,
            Some("boolean") => LeafKind::Boolean,
            Some("select") => {
                let options = wire.options.unwrap_or_default();
                if options.is_empty() {
                    return Err(format!(
                        "Select column '{}' requires a non-empty options list",
                        wire.name
                    ));
                }
                LeafKind::Select(options)
            }
            Some(other) => {
                return Err(format!("Unknown column type '{other}' on column '{}'", wire.name))
            }
        };
        Ok(TableColumn::Leaf { name: wire.name, kind })
    }
}

impl From<&TableColumn> for WireColumn {
    fn from(col: &TableColumn) -> Self {
        match col {
            TableColumn::Leaf { name, kind } => {
                let (kind, options) = match kind {
                    LeafKind::Text => ("text", None),
                    LeafKind::Number => ("number", None),
                    LeafKind::Boolean => ("boolean", None),
                    LeafKind::Select(options) => ("select", Some(options.clone())),
                };
                WireColumn {
                    name: name.clone(),
                    kind: Some(kind.to_string()),
                    options,
                    nested: None,
                    nested_columns: None,
                }
            }
            TableColumn::Nested { name, columns } => WireColumn {
                name: name.clone(),
                kind: None,
                options: None,
                nested: Some(true),
                nested_columns: Some(columns.iter().map(WireColumn::from).collect()),
            },
        }
    }
}

impl Serialize for TableColumn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireColumn::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TableColumn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireColumn::deserialize(deserializer)?;
        TableColumn::try_from(wire).map_err(D::Error::custom)
    }
}

/// Option payload of a question; the shape is tied to the question type and
/// checked at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionOptions {
    Choices(Vec<String>),
    Columns(Vec<TableColumn>),
    None,
}

impl QuestionOptions {
    pub fn is_none(&self) -> bool {
        matches!(self, QuestionOptions::None)
    }

    /// Reject option payloads whose shape does not match the question type.
    pub fn validate_for(&self, qtype: QuestionType) -> Result<(), AppError> {
        let ok = match qtype {
            QuestionType::SingleSelect | QuestionType::MultiSelect => {
                matches!(self, QuestionOptions::Choices(choices) if !choices.is_empty())
            }
            QuestionType::ListTable => {
                matches!(self, QuestionOptions::Columns(cols) if !cols.is_empty())
            }
            QuestionType::Text
            | QuestionType::Number
            | QuestionType::Boolean
            | QuestionType::Date
            | QuestionType::File
            | QuestionType::ComponentMaterialList => self.is_none(),
        };
        if ok {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Options payload does not match question type '{}'",
                qtype.as_str()
            )))
        }
    }

    pub fn choices(&self) -> Option<&[String]> {
        match self {
            QuestionOptions::Choices(c) => Some(c),
            _ => None,
        }
    }

    pub fn columns(&self) -> Option<&[TableColumn]> {
        match self {
            QuestionOptions::Columns(c) => Some(c),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: i64,
    pub text: String,
    pub description: Option<String>,
    pub question_type: QuestionType,
    pub required: bool,
    pub options: QuestionOptions,
    pub section_id: Option<i64>,
    pub sort_order: i64,
}

/// Input for creating or updating a question.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionInput {
    pub text: String,
    pub description: Option<String>,
    pub question_type: QuestionType,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_options")]
    pub options: QuestionOptions,
    pub section_id: Option<i64>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

fn default_options() -> QuestionOptions {
    QuestionOptions::None
}
