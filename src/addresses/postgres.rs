use super::{repository::Repository, StreetAddressLine, StreetAddressLineId};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Connection, PgPool};
use std::time::Duration;
use tracing::{info_span, Instrument};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

/// `PostgreSQL` backed repository for [`StreetAddressLine`] rows.
#[derive(Debug, Clone)]
pub struct PgStreetAddressLineRepository {
    pool: PgPool,
}

impl PgStreetAddressLineRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool against `dsn`.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        Ok(Self::new(pool))
    }

    /// Create the `street_address_lines` table when missing.
    ///
    /// # Errors
    /// Returns an error if the DDL statement fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .context("Failed to apply street_address_lines schema")?;

        Ok(())
    }
}

#[async_trait]
impl Repository<StreetAddressLine, StreetAddressLineId> for PgStreetAddressLineRepository {
    async fn find(&self, key: StreetAddressLineId) -> Result<Option<StreetAddressLine>> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT"
        );

        sqlx::query_as::<_, StreetAddressLine>(
            "SELECT id, value FROM street_address_lines WHERE id = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .instrument(span)
        .await
        .context("Failed to fetch street address line")
    }

    async fn add(&self, entity: StreetAddressLine) -> Result<StreetAddressLine> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT"
        );

        // The identity column assigns the key; any id on the payload is ignored.
        sqlx::query_as::<_, StreetAddressLine>(
            "INSERT INTO street_address_lines (value) VALUES ($1) RETURNING id, value",
        )
        .bind(entity.value)
        .fetch_one(&self.pool)
        .instrument(span)
        .await
        .context("Failed to insert street address line")
    }

    async fn ping(&self) -> Result<()> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .context("Failed to acquire database connection")?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping()
            .instrument(ping_span)
            .await
            .context("Failed to ping database")
    }
}
