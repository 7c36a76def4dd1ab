use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::errors::AppError;

/// Internal user record including the password hash; never serialized.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub email: String,
    pub display_name: String,
}

/// User as exposed over the API.
#[derive(Debug, Clone, Serialize)]
pub struct UserDisplay {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub display_name: String,
}

/// Find user by username for authentication.
pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<User>, AppError> {
    Ok(conn
        .query_row(
            "SELECT id, username, password, email, display_name FROM users WHERE username = ?1",
            params![username],
            |row| {
                Ok(User {
                    id: row.get("id")?,
                    username: row.get("username")?,
                    password: row.get("password")?,
                    email: row.get("email")?,
                    display_name: row.get("display_name")?,
                })
            },
        )
        .optional()?)
}

pub fn find_display_by_id(conn: &Connection, id: i64) -> Result<Option<UserDisplay>, AppError> {
    Ok(conn
        .query_row(
            "SELECT id, username, email, display_name FROM users WHERE id = ?1",
            params![id],
            |row| {
                Ok(UserDisplay {
                    id: row.get("id")?,
                    username: row.get("username")?,
                    email: row.get("email")?,
                    display_name: row.get("display_name")?,
                })
            },
        )
        .optional()?)
}

pub fn create(conn: &Connection, new: &NewUser) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO users (username, password, email, display_name) VALUES (?1, ?2, ?3, ?4)",
        params![new.username, new.password, new.email, new.display_name],
    )?;
    Ok(conn.last_insert_rowid())
}
