//! Component/material sub-aggregate for component_material_list answers.
//! Components hang off one response; materials hang off one component.
//! Ordering uses `order_index`: append at the current count, deletions leave
//! gaps (ordering must be stable, not contiguous).

use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct Component {
    pub id: i64,
    pub pir_response_id: i64,
    pub component_name: String,
    pub position: Option<String>,
    pub order_index: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Material {
    pub id: i64,
    pub component_id: i64,
    pub material_name: String,
    pub percentage: Option<f64>,
    pub recyclable: bool,
    pub order_index: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComponentInput {
    pub component_name: String,
    pub position: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialInput {
    pub material_name: String,
    pub percentage: Option<f64>,
    #[serde(default, deserialize_with = "bool_or_legacy_string")]
    pub recyclable: bool,
}

/// Boundary adapter for the legacy wire form of `recyclable`: older clients
/// send the strings "true"/"false" instead of a boolean. Internally it is a
/// genuine bool.
fn bool_or_legacy_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Bool(bool),
        Legacy(String),
    }
    match Wire::deserialize(deserializer)? {
        Wire::Bool(b) => Ok(b),
        Wire::Legacy(s) => match s.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "recyclable must be a boolean, got '{other}'"
            ))),
        },
    }
}

fn validate_percentage(percentage: Option<f64>) -> Result<(), AppError> {
    if let Some(p) = percentage {
        if !(0.0..=100.0).contains(&p) {
            return Err(AppError::Validation(format!(
                "Material percentage must be between 0 and 100, got {p}"
            )));
        }
    }
    Ok(())
}

fn row_to_component(row: &rusqlite::Row) -> rusqlite::Result<Component> {
    Ok(Component {
        id: row.get("id")?,
        pir_response_id: row.get("pir_response_id")?,
        component_name: row.get("component_name")?,
        position: row.get("position")?,
        order_index: row.get("order_index")?,
    })
}

fn row_to_material(row: &rusqlite::Row) -> rusqlite::Result<Material> {
    Ok(Material {
        id: row.get("id")?,
        component_id: row.get("component_id")?,
        material_name: row.get("material_name")?,
        percentage: row.get("percentage")?,
        recyclable: row.get::<_, i64>("recyclable")? != 0,
        order_index: row.get("order_index")?,
    })
}

const SELECT_COMPONENT: &str = "SELECT id, pir_response_id, component_name, position, order_index \
     FROM pir_response_components";

const SELECT_MATERIAL: &str = "SELECT id, component_id, material_name, percentage, recyclable, \
     order_index FROM pir_response_component_materials";

pub fn find_component_by_id(conn: &Connection, id: i64) -> Result<Option<Component>, AppError> {
    let sql = format!("{SELECT_COMPONENT} WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], row_to_component).optional()?)
}

/// Components of a response, in stable order.
pub fn find_components(conn: &Connection, response_id: i64) -> Result<Vec<Component>, AppError> {
    let sql = format!("{SELECT_COMPONENT} WHERE pir_response_id = ?1 ORDER BY order_index ASC, id ASC");
    let mut stmt = conn.prepare(&sql)?;
    let components = stmt
        .query_map(params![response_id], row_to_component)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(components)
}

pub fn create_component(
    conn: &Connection,
    response_id: i64,
    input: &ComponentInput,
) -> Result<i64, AppError> {
    if input.component_name.trim().is_empty() {
        return Err(AppError::Validation("Component name is required".to_string()));
    }
    // Append at the current count; no reindex on delete.
    let order_index: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pir_response_components WHERE pir_response_id = ?1",
        params![response_id],
        |row| row.get(0),
    )?;
    conn.execute(
        "INSERT INTO pir_response_components (pir_response_id, component_name, position, order_index) \
         VALUES (?1, ?2, ?3, ?4)",
        params![response_id, input.component_name.trim(), input.position, order_index],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_component(
    conn: &Connection,
    component_id: i64,
    input: &ComponentInput,
) -> Result<(), AppError> {
    if input.component_name.trim().is_empty() {
        return Err(AppError::Validation("Component name is required".to_string()));
    }
    let changed = conn.execute(
        "UPDATE pir_response_components SET component_name = ?1, position = ?2 WHERE id = ?3",
        params![input.component_name.trim(), input.position, component_id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Delete a component; its materials go with it via the FK cascade.
pub fn delete_component(conn: &Connection, component_id: i64) -> Result<(), AppError> {
    let changed = conn.execute(
        "DELETE FROM pir_response_components WHERE id = ?1",
        params![component_id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub fn find_material_by_id(conn: &Connection, id: i64) -> Result<Option<Material>, AppError> {
    let sql = format!("{SELECT_MATERIAL} WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], row_to_material).optional()?)
}

/// Materials of a component, in stable order.
pub fn find_materials(conn: &Connection, component_id: i64) -> Result<Vec<Material>, AppError> {
    let sql = format!("{SELECT_MATERIAL} WHERE component_id = ?1 ORDER BY order_index ASC, id ASC");
    let mut stmt = conn.prepare(&sql)?;
    let materials = stmt
        .query_map(params![component_id], row_to_material)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(materials)
}

pub fn create_material(
    conn: &Connection,
    component_id: i64,
    input: &MaterialInput,
) -> Result<i64, AppError> {
    if input.material_name.trim().is_empty() {
        return Err(AppError::Validation("Material name is required".to_string()));
    }
    validate_percentage(input.percentage)?;
    let order_index: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pir_response_component_materials WHERE component_id = ?1",
        params![component_id],
        |row| row.get(0),
    )?;
    conn.execute(
        "INSERT INTO pir_response_component_materials \
             (component_id, material_name, percentage, recyclable, order_index) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            component_id,
            input.material_name.trim(),
            input.percentage,
            input.recyclable as i64,
            order_index,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_material(
    conn: &Connection,
    material_id: i64,
    input: &MaterialInput,
) -> Result<(), AppError> {
    if input.material_name.trim().is_empty() {
        return Err(AppError::Validation("Material name is required".to_string()));
    }
    validate_percentage(input.percentage)?;
    let changed = conn.execute(
        "UPDATE pir_response_component_materials \
         SET material_name = ?1, percentage = ?2, recyclable = ?3 WHERE id = ?4",
        params![
            input.material_name.trim(),
            input.percentage,
            input.recyclable as i64,
            material_id,
        ],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub fn delete_material(conn: &Connection, material_id: i64) -> Result<(), AppError> {
    let changed = conn.execute(
        "DELETE FROM pir_response_component_materials WHERE id = ?1",
        params![material_id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
