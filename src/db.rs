use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub type DbPool = Pool<SqliteConnectionManager>;

pub const MIGRATIONS: &str = include_str!("schema.sql");

pub fn init_pool(database_url: &str) -> DbPool {
    let manager = SqliteConnectionManager::file(database_url).with_init(|conn| {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(())
    });
    Pool::builder()
        .max_size(8)
        .build(manager)
        .expect("Failed to create DB pool")
}

pub fn run_migrations(pool: &DbPool) {
    let conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.execute_batch(MIGRATIONS)
        .expect("Failed to run migrations");
    log::info!("Database migrations complete");
}

fn insert_user(
    conn: &rusqlite::Connection,
    username: &str,
    password_hash: &str,
    email: &str,
    display_name: &str,
) -> i64 {
    conn.execute(
        "INSERT INTO users (username, password, email, display_name) VALUES (?1, ?2, ?3, ?4)",
        params![username, password_hash, email, display_name],
    )
    .expect("Failed to insert seed user");
    conn.last_insert_rowid()
}

fn insert_company(conn: &rusqlite::Connection, name: &str) -> i64 {
    conn.execute("INSERT INTO companies (name) VALUES (?1)", params![name])
        .expect("Failed to insert seed company");
    conn.last_insert_rowid()
}

/// Seed a minimal working tenancy when the database is empty: one customer
/// company, one supplier company, a relationship between them, and an admin
/// account on each side.
pub fn seed_base(pool: &DbPool, admin_password_hash: &str) {
    let conn = pool.get().expect("Failed to get DB connection for seeding");

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .unwrap_or(0);
    if count > 0 {
        log::info!("Database already seeded ({count} users), skipping base seed");
        return;
    }

    let customer_co = insert_company(&conn, "Acme Manufacturing");
    let supplier_co = insert_company(&conn, "Globex Materials");

    conn.execute(
        "INSERT INTO company_relationships (customer_company_id, supplier_company_id) VALUES (?1, ?2)",
        params![customer_co, supplier_co],
    )
    .expect("Failed to insert seed relationship");

    let admin = insert_user(&conn, "admin", admin_password_hash, "admin@example.com", "Admin");
    let vendor = insert_user(&conn, "vendor", admin_password_hash, "vendor@example.com", "Vendor");

    conn.execute(
        "INSERT INTO company_users (company_id, user_id, role) VALUES (?1, ?2, 'admin')",
        params![customer_co, admin],
    )
    .expect("Failed to link admin user");
    conn.execute(
        "INSERT INTO company_users (company_id, user_id, role) VALUES (?1, ?2, 'admin')",
        params![supplier_co, vendor],
    )
    .expect("Failed to link vendor user");

    log::info!("Base seed complete (companies {customer_co}/{supplier_co})");
}
