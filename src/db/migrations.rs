//! Schema versioning and migrations for the CRM database.
//!
//! Forward-only migrations recorded in `schema_versions`.

use crate::error::{CrmError, Result};
use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Latest schema version this build knows how to create.
pub const CURRENT_VERSION: i32 = 2;

/// Advisory lock serializing concurrent migration runs.
const MIGRATION_LOCK_KEY: i64 = 0x0063_726d;

/// Runs all pending migrations on the database. Returns the number applied.
pub async fn run_migrations(pool: &PgPool) -> Result<u32> {
    let mut lock_conn = pool
        .acquire()
        .await
        .map_err(|e| CrmError::connection(format!("Failed to acquire connection: {e}")))?;
    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *lock_conn)
        .await
        .map_err(|e| CrmError::persistence(format!("Failed to lock migrations: {e}")))?;

    let result = migrate(pool).await;

    if let Err(e) = sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *lock_conn)
        .await
    {
        warn!("Failed to release migration lock: {e}");
    }
    result
}

async fn migrate(pool: &PgPool) -> Result<u32> {
    ensure_schema_versions_table(pool).await?;

    let current = get_current_version(pool).await?;

    if current > CURRENT_VERSION {
        return Err(CrmError::persistence(format!(
            "Database schema version ({}) is newer than supported version ({}). \
             Please upgrade crm-insight to the latest version.",
            current, CURRENT_VERSION
        )));
    }

    let mut applied = 0;
    for version in (current + 1)..=CURRENT_VERSION {
        info!("Migrating CRM database to version {}", version);
        run_migration(pool, version).await?;
        applied += 1;
    }

    Ok(applied)
}

async fn ensure_schema_versions_table(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_versions (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| CrmError::persistence(format!("Failed to create schema_versions table: {e}")))?;

    Ok(())
}

async fn get_current_version(pool: &PgPool) -> Result<i32> {
    let version: Option<i32> = sqlx::query_scalar("SELECT MAX(version) FROM schema_versions")
        .fetch_one(pool)
        .await
        .map_err(|e| CrmError::persistence(format!("Failed to get schema version: {e}")))?;

    Ok(version.unwrap_or(0))
}

/// Applies one migration and records it, atomically.
async fn run_migration(pool: &PgPool, version: i32) -> Result<()> {
    let statements = match version {
        1 => MIGRATION_V1,
        2 => MIGRATION_V2,
        _ => {
            return Err(CrmError::persistence(format!(
                "Unknown migration version: {version}"
            )))
        }
    };

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| CrmError::persistence(format!("Failed to start migration: {e}")))?;

    for statement in statements {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                CrmError::persistence(format!("Migration v{version} failed: {e}"))
            })?;
    }

    sqlx::query("INSERT INTO schema_versions (version) VALUES ($1)")
        .bind(version)
        .execute(&mut *tx)
        .await
        .map_err(|e| CrmError::persistence(format!("Failed to record migration: {e}")))?;

    tx.commit()
        .await
        .map_err(|e| CrmError::persistence(format!("Failed to commit migration: {e}")))?;

    Ok(())
}

/// Migration v1: customer, product and sale records.
const MIGRATION_V1: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR NOT NULL,
        email VARCHAR NOT NULL,
        phone VARCHAR,
        company VARCHAR,
        status VARCHAR NOT NULL DEFAULT 'active',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR NOT NULL,
        description TEXT,
        price NUMERIC(12, 2) NOT NULL,
        category VARCHAR,
        photo_url TEXT,
        stock_quantity INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sales (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        customer_id UUID NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
        product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
        quantity INTEGER NOT NULL,
        total_amount NUMERIC(12, 2) NOT NULL,
        status VARCHAR NOT NULL DEFAULT 'completed',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_sales_created_at ON sales(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_sales_customer_id ON sales(customer_id)",
    "CREATE INDEX IF NOT EXISTS idx_products_category ON products(category)",
];

/// Migration v2: dashboard users and their sessions.
const MIGRATION_V2: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS app_users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        email VARCHAR NOT NULL UNIQUE,
        first_name VARCHAR NOT NULL,
        last_name VARCHAR NOT NULL DEFAULT '',
        image_url TEXT,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        token_hash TEXT PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        expires_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id)",
];
