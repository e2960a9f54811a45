use async_trait::async_trait;
use burrow_core::storage::Result;
use burrow_core::{LinkRecord, LinkStatus, ShortToken, Storage, StorageError};
use burrow_generator::{Generator, RandomGenerator};
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// Default bound on every database operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_CONNECTIONS: u32 = 10;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// PostgreSQL implementation of the [`Storage`] trait.
///
/// Links live in the `urls` table. Deletion flips `status` to `'deleted'`;
/// rows are never removed. A partial unique index on `original_url` over
/// live rows backs the duplicate detection in [`Storage::add`].
///
/// Every operation is bounded by a timeout and fails with
/// [`StorageError::Timeout`] when it is exceeded. Nothing is retried.
#[derive(Debug)]
pub struct PostgresStore<G = RandomGenerator> {
    pool: PgPool,
    generator: G,
    timeout: Duration,
}

impl PostgresStore<RandomGenerator> {
    /// Creates a store from an existing pool. Does not run migrations.
    pub fn new(pool: PgPool) -> Self {
        Self::with_generator(pool, RandomGenerator::new(), DEFAULT_TIMEOUT)
    }

    /// Opens a pool to `database_dsn`, applies pending migrations and returns
    /// the ready store.
    pub async fn connect(database_dsn: &str, timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(timeout)
            .connect(database_dsn)
            .await
            .map_err(map_sqlx_error)?;

        let store = Self::with_generator(pool, RandomGenerator::new(), timeout);
        store.migrate().await?;
        Ok(store)
    }
}

impl<G: Generator> PostgresStore<G> {
    pub fn with_generator(pool: PgPool, generator: G, timeout: Duration) -> Self {
        Self {
            pool,
            generator,
            timeout,
        }
    }

    /// Applies the embedded schema migrations. Already applied migrations are
    /// skipped.
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.map_err(map_migrate_error)?;
        info!("database migrations applied");
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| {
                StorageError::Timeout(format!("{operation} exceeded {:?}", self.timeout))
            })?
    }
}

fn parse_status(raw: &str) -> Result<LinkStatus> {
    raw.parse()
        .map_err(|e| StorageError::InvalidData(format!("{e}")))
}

fn row_to_record(row: &PgRow) -> Result<LinkRecord> {
    let token: String = row.try_get("shorten_url").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let owner_id: String = row.try_get("user_id").map_err(map_sqlx_error)?;
    let status: String = row.try_get("status").map_err(map_sqlx_error)?;

    Ok(LinkRecord {
        token: ShortToken::new_unchecked(token),
        original_url,
        owner_id,
        status: parse_status(&status)?,
    })
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn map_migrate_error(err: MigrateError) -> StorageError {
    match err {
        MigrateError::Execute(inner) => map_sqlx_error(inner),
        other => StorageError::Query(format!("migration failed: {other}")),
    }
}

#[async_trait]
impl<G: Generator> Storage for PostgresStore<G> {
    async fn get(&self, token: &ShortToken) -> Result<String> {
        let row = self
            .bounded("get", async {
                sqlx::query(
                    r#"
                    SELECT original_url, status
                    FROM urls
                    WHERE shorten_url = $1
                    LIMIT 1
                    "#,
                )
                .bind(token.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)
            })
            .await?;

        let Some(row) = row else {
            return Err(StorageError::NotFound(token.clone()));
        };

        let status: String = row.try_get("status").map_err(map_sqlx_error)?;
        if parse_status(&status)? == LinkStatus::Deleted {
            return Err(StorageError::Gone(token.clone()));
        }

        row.try_get("original_url").map_err(map_sqlx_error)
    }

    async fn add(&self, original_url: &str, owner_id: &str) -> Result<ShortToken> {
        let token = self.generator.generate();

        self.bounded("add", async {
            let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

            let inserted = sqlx::query(
                r#"
                INSERT INTO urls (user_id, shorten_url, original_url, status)
                VALUES ($1, $2, $3, 'created')
                ON CONFLICT (original_url) WHERE status = 'created' DO NOTHING
                "#,
            )
            .bind(owner_id)
            .bind(token.as_str())
            .bind(original_url)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

            if inserted == 0 {
                let existing: String = sqlx::query_scalar(
                    r#"
                    SELECT shorten_url
                    FROM urls
                    WHERE original_url = $1
                      AND status = 'created'
                    LIMIT 1
                    "#,
                )
                .bind(original_url)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

                tx.commit().await.map_err(map_sqlx_error)?;
                return Err(StorageError::DuplicateUrl(ShortToken::new_unchecked(
                    existing,
                )));
            }

            tx.commit().await.map_err(map_sqlx_error)?;
            Ok(())
        })
        .await?;

        debug!(token = %token, owner_id, "link added");
        Ok(token)
    }

    async fn items_of_user(&self, owner_id: &str) -> Result<Vec<LinkRecord>> {
        let rows = self
            .bounded("items_of_user", async {
                sqlx::query(
                    r#"
                    SELECT shorten_url, original_url, user_id, status
                    FROM urls
                    WHERE user_id = $1
                    ORDER BY id
                    "#,
                )
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)
            })
            .await?;

        rows.iter().map(row_to_record).collect()
    }

    async fn delete(&self, tokens: &[ShortToken], owner_id: &str) -> Result<()> {
        if tokens.is_empty() {
            return Ok(());
        }

        let codes: Vec<String> = tokens.iter().map(|t| t.as_str().to_owned()).collect();

        let result = self
            .bounded("delete", async {
                sqlx::query(
                    r#"
                    UPDATE urls
                    SET status = 'deleted'
                    WHERE user_id = $1
                      AND shorten_url = ANY($2)
                      AND status = 'created'
                    "#,
                )
                .bind(owner_id)
                .bind(&codes)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)
            })
            .await?;

        debug!(owner_id, changed = result.rows_affected(), "links deleted");
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.bounded("ping", async {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)
        })
        .await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
