//! Database migrations for the issues table

use sqlx::PgPool;

/// Create tables if missing. Safe to run on every connect.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::debug!("Running migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS issues (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            category TEXT,
            location TEXT,
            status TEXT NOT NULL DEFAULT 'open',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_issues_created ON issues(created_at DESC)")
        .execute(pool)
        .await?;

    tracing::debug!("Migrations complete");
    Ok(())
}
