use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::AppError;
use crate::models::company;
use super::types::{PirInput, PirRequest, PirStatus, ensure_transition};

const SELECT_PIR: &str = "SELECT id, customer_company_id, supplier_company_id, product_id, \
     suggested_product_name, title, description, due_date, status, prior_rounds, \
     created_by, created_at, updated_at FROM pir_requests";

fn row_to_pir(row: &rusqlite::Row) -> rusqlite::Result<(PirRequest, String)> {
    let status_raw: String = row.get("status")?;
    Ok((
        PirRequest {
            id: row.get("id")?,
            customer_company_id: row.get("customer_company_id")?,
            supplier_company_id: row.get("supplier_company_id")?,
            product_id: row.get("product_id")?,
            suggested_product_name: row.get("suggested_product_name")?,
            title: row.get("title")?,
            description: row.get("description")?,
            due_date: row.get("due_date")?,
            status: PirStatus::Draft, // replaced after parse
            prior_rounds: row.get("prior_rounds")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        },
        status_raw,
    ))
}

fn cook((mut pir, status_raw): (PirRequest, String)) -> Result<PirRequest, AppError> {
    pir.status = PirStatus::parse(&status_raw)?;
    Ok(pir)
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<PirRequest>, AppError> {
    let sql = format!("{SELECT_PIR} WHERE id = ?1");
    let raw = conn.query_row(&sql, params![id], row_to_pir).optional()?;
    raw.map(cook).transpose()
}

pub fn require_by_id(conn: &Connection, id: i64) -> Result<PirRequest, AppError> {
    find_by_id(conn, id)?.ok_or(AppError::NotFound)
}

/// PIRs where the company is a party, either side, newest first.
pub fn find_for_company(conn: &Connection, company_id: i64) -> Result<Vec<PirRequest>, AppError> {
    let sql = format!(
        "{SELECT_PIR} WHERE customer_company_id = ?1 OR supplier_company_id = ?1 \
         ORDER BY created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let raws = stmt
        .query_map(params![company_id], row_to_pir)?
        .collect::<Result<Vec<_>, _>>()?;
    raws.into_iter().map(cook).collect()
}

/// Create a draft PIR for a supplier the customer has a relationship with,
/// and attach the tags that select its question set.
pub fn create(
    conn: &Connection,
    customer_company_id: i64,
    created_by: i64,
    input: &PirInput,
) -> Result<i64, AppError> {
    if input.supplier_company_id == customer_company_id {
        return Err(AppError::Validation(
            "A company cannot issue a request to itself".to_string(),
        ));
    }
    if !company::has_relationship(conn, customer_company_id, input.supplier_company_id)? {
        return Err(AppError::Validation(
            "No supplier relationship with that company".to_string(),
        ));
    }
    if input.tag_ids.is_empty() {
        return Err(AppError::Validation(
            "At least one tag is required to select questions".to_string(),
        ));
    }

    conn.execute(
        "INSERT INTO pir_requests (customer_company_id, supplier_company_id, product_id, \
                suggested_product_name, title, description, due_date, status, created_by) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'draft', ?8)",
        params![
            customer_company_id,
            input.supplier_company_id,
            input.product_id,
            input.suggested_product_name,
            input.title,
            input.description,
            input.due_date,
            created_by,
        ],
    )?;
    let pir_id = conn.last_insert_rowid();

    for tag_id in &input.tag_ids {
        conn.execute(
            "INSERT OR IGNORE INTO pir_tags (pir_id, tag_id) VALUES (?1, ?2)",
            params![pir_id, tag_id],
        )?;
    }

    Ok(pir_id)
}

/// Write a validated status change. Callers needing side effects in the same
/// transaction (review submission) go through `models::review` instead.
pub fn update_status(conn: &Connection, pir: &PirRequest, to: PirStatus) -> Result<(), AppError> {
    ensure_transition(pir.status, to)?;
    conn.execute(
        "UPDATE pir_requests SET status = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%S','now') \
         WHERE id = ?2",
        params![to.as_str(), pir.id],
    )?;
    Ok(())
}

/// Supplier submits the request: draft -> submitted (or flagged -> submitted
/// on a resubmission). Draft responses flip to submitted and are stamped;
/// already-approved responses keep their status.
pub fn submit(conn: &Connection, pir: &PirRequest) -> Result<(), AppError> {
    ensure_transition(pir.status, PirStatus::Submitted)?;
    let tx_active = !conn.is_autocommit();
    if !tx_active {
        conn.execute_batch("BEGIN IMMEDIATE")?;
    }
    let result = (|| -> Result<(), AppError> {
        conn.execute(
            "UPDATE pir_responses SET status = 'submitted', \
                    submitted_at = strftime('%Y-%m-%dT%H:%M:%S','now'), \
                    updated_at = strftime('%Y-%m-%dT%H:%M:%S','now') \
             WHERE pir_id = ?1 AND status IN ('draft', 'flagged')",
            params![pir.id],
        )?;
        conn.execute(
            "UPDATE pir_requests SET status = 'submitted', \
                    updated_at = strftime('%Y-%m-%dT%H:%M:%S','now') \
             WHERE id = ?1",
            params![pir.id],
        )?;
        Ok(())
    })();
    if !tx_active {
        match &result {
            Ok(()) => conn.execute_batch("COMMIT")?,
            Err(_) => conn.execute_batch("ROLLBACK")?,
        }
    }
    result
}

/// The acting company must be the supplier party of the PIR.
pub fn require_supplier_party(pir: &PirRequest, company_id: i64) -> Result<(), AppError> {
    if pir.supplier_company_id == company_id {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(
            "only the supplier party may do this".to_string(),
        ))
    }
}

/// The acting company must be the customer party of the PIR.
pub fn require_customer_party(pir: &PirRequest, company_id: i64) -> Result<(), AppError> {
    if pir.customer_company_id == company_id {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(
            "only the customer party may do this".to_string(),
        ))
    }
}

/// Either party may read the PIR.
pub fn require_party(pir: &PirRequest, company_id: i64) -> Result<(), AppError> {
    if pir.customer_company_id == company_id || pir.supplier_company_id == company_id {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}
