use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
}

/// A user's membership in a company, with its role.
#[derive(Debug, Clone)]
pub struct Membership {
    pub company_id: i64,
    pub company_name: String,
    pub role: String,
}

fn row_to_company(row: &rusqlite::Row) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row.get("id")?,
        name: row.get("name")?,
    })
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Company>, AppError> {
    Ok(conn
        .query_row(
            "SELECT id, name FROM companies WHERE id = ?1",
            params![id],
            row_to_company,
        )
        .optional()?)
}

pub fn create(conn: &Connection, name: &str) -> Result<i64, AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Company name is required".to_string()));
    }
    conn.execute("INSERT INTO companies (name) VALUES (?1)", params![name.trim()])?;
    Ok(conn.last_insert_rowid())
}

/// The company a user acts for. Users belong to exactly one company in the
/// base flow; the first membership wins if data says otherwise.
pub fn membership_of(conn: &Connection, user_id: i64) -> Result<Option<Membership>, AppError> {
    Ok(conn
        .query_row(
            "SELECT cu.company_id, c.name AS company_name, cu.role \
             FROM company_users cu \
             JOIN companies c ON c.id = cu.company_id \
             WHERE cu.user_id = ?1 ORDER BY cu.id LIMIT 1",
            params![user_id],
            |row| {
                Ok(Membership {
                    company_id: row.get("company_id")?,
                    company_name: row.get("company_name")?,
                    role: row.get("role")?,
                })
            },
        )
        .optional()?)
}

pub fn add_member(
    conn: &Connection,
    company_id: i64,
    user_id: i64,
    role: &str,
) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO company_users (company_id, user_id, role) VALUES (?1, ?2, ?3) \
         ON CONFLICT(company_id, user_id) DO UPDATE SET role = excluded.role",
        params![company_id, user_id, role],
    )?;
    Ok(())
}

/// Record a customer -> supplier relationship (idempotent).
pub fn add_relationship(
    conn: &Connection,
    customer_company_id: i64,
    supplier_company_id: i64,
) -> Result<(), AppError> {
    conn.execute(
        "INSERT OR IGNORE INTO company_relationships (customer_company_id, supplier_company_id) \
         VALUES (?1, ?2)",
        params![customer_company_id, supplier_company_id],
    )?;
    Ok(())
}

pub fn has_relationship(
    conn: &Connection,
    customer_company_id: i64,
    supplier_company_id: i64,
) -> Result<bool, AppError> {
    let found: i64 = conn.query_row(
        "SELECT COUNT(*) FROM company_relationships \
         WHERE customer_company_id = ?1 AND supplier_company_id = ?2",
        params![customer_company_id, supplier_company_id],
        |row| row.get(0),
    )?;
    Ok(found > 0)
}

/// Suppliers visible to a customer company.
pub fn suppliers_of(conn: &Connection, customer_company_id: i64) -> Result<Vec<Company>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name FROM companies c \
         JOIN company_relationships cr ON cr.supplier_company_id = c.id \
         WHERE cr.customer_company_id = ?1 ORDER BY c.name",
    )?;
    let companies = stmt
        .query_map(params![customer_company_id], row_to_company)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(companies)
}
