//! Ledger schema bootstrap
//!
//! Idempotent DDL executed at startup. There is no migration history; the
//! statements only ever create what is missing. Text columns are unbounded;
//! lengths are enforced by `FieldLimits`, which is configurable.

use anyhow::{Context, Result};
use sqlx::PgPool;

pub const CREATE_ACCOUNT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS account (
    account_id            BIGINT GENERATED BY DEFAULT AS IDENTITY (MINVALUE 0 START WITH 0) PRIMARY KEY,
    created               TIMESTAMPTZ NOT NULL,
    owner_name            TEXT NOT NULL,
    balance               NUMERIC NOT NULL DEFAULT 0,
    balance_last_modified TIMESTAMPTZ NOT NULL,
    comment               TEXT
)
"#;

pub const CREATE_PAYMENT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS payment (
    payment_id            BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    processed             TIMESTAMPTZ NOT NULL,
    amount                NUMERIC NOT NULL CHECK (amount > 0),
    withdrawal_account_id BIGINT NOT NULL,
    deposit_account_id    BIGINT NOT NULL,
    comment               TEXT,
    CHECK (withdrawal_account_id <> deposit_account_id)
)
"#;

pub const CREATE_PAYMENT_PROCESSED_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS payment_processed_idx ON payment (processed)";

/// Create ledger tables if missing
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    tracing::info!("Initializing ledger schema...");

    for (name, ddl) in [
        ("account", CREATE_ACCOUNT_TABLE),
        ("payment", CREATE_PAYMENT_TABLE),
        ("payment_processed_idx", CREATE_PAYMENT_PROCESSED_INDEX),
    ] {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create {}", name))?;
    }

    tracing::info!("Ledger schema ready");
    Ok(())
}
