//! Answer payload validation: the shape of `answer` mirrors the owning
//! question's type, checked exhaustively per type before any write.

use serde_json::Value;

use crate::errors::AppError;
use crate::models::question::{columns, Question, QuestionType};

pub fn validate_answer(question: &Question, answer: &Value) -> Result<(), AppError> {
    let err = |msg: String| Err(AppError::Validation(msg));

    match question.question_type {
        QuestionType::Text => {
            if !(answer.is_null() || answer.is_string()) {
                return err("text answer must be a string".to_string());
            }
        }
        QuestionType::Number => {
            if !(answer.is_null() || answer.is_number()) {
                return err("number answer must be a JSON number".to_string());
            }
        }
        QuestionType::Boolean => {
            // Tri-state: null means unanswered.
            if !(answer.is_null() || answer.is_boolean()) {
                return err("boolean answer must be true, false or null".to_string());
            }
        }
        QuestionType::SingleSelect => {
            if answer.is_null() {
                return Ok(());
            }
            let Some(value) = answer.as_str() else {
                return err("single_select answer must be a string".to_string());
            };
            let choices = question.options.choices().unwrap_or(&[]);
            if !choices.iter().any(|c| c == value) {
                return err(format!("'{value}' is not one of the question's options"));
            }
        }
        QuestionType::MultiSelect => {
            if answer.is_null() {
                return Ok(());
            }
            let Some(values) = answer.as_array() else {
                return err("multi_select answer must be an array of strings".to_string());
            };
            let choices = question.options.choices().unwrap_or(&[]);
            for v in values {
                let Some(s) = v.as_str() else {
                    return err("multi_select answer must contain only strings".to_string());
                };
                if !choices.iter().any(|c| c == s) {
                    return err(format!("'{s}' is not one of the question's options"));
                }
            }
        }
        QuestionType::Date => {
            if answer.is_null() {
                return Ok(());
            }
            let Some(s) = answer.as_str() else {
                return err("date answer must be an ISO date string".to_string());
            };
            if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_err() {
                return err(format!("'{s}' is not a valid YYYY-MM-DD date"));
            }
        }
        QuestionType::File => {
            // A reference string; the upload flow lives outside the core.
            if !(answer.is_null() || answer.is_string()) {
                return err("file answer must be a reference string".to_string());
            }
        }
        QuestionType::ListTable => {
            if answer.is_null() {
                return Ok(());
            }
            let cols = question.options.columns().unwrap_or(&[]);
            columns::validate_rows(cols, answer).map_err(AppError::Validation)?;
        }
        QuestionType::ComponentMaterialList => {
            // The real payload lives in the component/material tables; the
            // answer column stays an empty placeholder object.
            let is_empty_obj = answer.as_object().map(|o| o.is_empty()).unwrap_or(false);
            if !(answer.is_null() || is_empty_obj) {
                return err(
                    "component_material_list answers are stored in component rows".to_string(),
                );
            }
        }
    }
    Ok(())
}
