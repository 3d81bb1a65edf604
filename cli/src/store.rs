//! PostgreSQL persistence for extracted passages.

use std::time::Duration;

use chrono::Utc;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use unquote::Passage;

/// Maintenance database used to create the target database.
const MAINTENANCE_DB: &str = "postgres";

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS translation (
        translation_id SERIAL PRIMARY KEY,
        translation_book VARCHAR(255) NOT NULL,
        translation_page INTEGER,
        translation_text_word TEXT NOT NULL,
        translation_cite VARCHAR(500),
        translation_cite_hebrew VARCHAR(255),
        translation_cite_common VARCHAR(255),
        translation_cite_chapter INTEGER,
        translation_cite_verse INTEGER,
        translation_cite_verse_end SMALLINT,
        translation_cite_note VARCHAR(500),
        translation_cite_book_id INTEGER,
        translation_created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        yy_volume_id INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cite (
        id SERIAL PRIMARY KEY,
        label VARCHAR(500) NOT NULL UNIQUE,
        sort SMALLINT NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS yy_series (
        yy_series_id SERIAL PRIMARY KEY,
        yy_series_number SMALLINT,
        yy_series_label VARCHAR(250),
        yy_series_sort SMALLINT DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS yy_volume (
        yy_volume_id SERIAL PRIMARY KEY,
        yy_series_id INTEGER REFERENCES yy_series(yy_series_id),
        yy_volume_number SMALLINT,
        yy_volume_label VARCHAR(500),
        yy_volume_flip_code VARCHAR(8),
        yy_volume_pdf VARCHAR(500)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_book ON translation(translation_book)",
    "CREATE INDEX IF NOT EXISTS idx_page ON translation(translation_page)",
];

/// Connection settings.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl DbConfig {
    fn connect_options(&self, database: &str) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(database)
    }
}

/// Open a single-connection pool, retrying with backoff.
async fn create_pool(options: PgConnectOptions) -> Result<PgPool, sqlx::Error> {
    let mut retries = 5;
    let mut delay = Duration::from_millis(500);

    loop {
        match PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(e) if retries > 0 => {
                retries -= 1;
                log::warn!(
                    "PostgreSQL connection failed ({}), retrying in {}ms ({} left)",
                    e,
                    delay.as_millis(),
                    retries
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Quote an SQL identifier.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// The translation store.
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Create the database if needed, connect to it and make sure the
    /// tables exist.
    pub async fn open(config: &DbConfig) -> Result<Self, sqlx::Error> {
        let admin = create_pool(config.connect_options(MAINTENANCE_DB)).await?;
        log::info!("Connected to PostgreSQL at {}:{}", config.host, config.port);

        let exists = sqlx::query("SELECT 1 FROM pg_database WHERE datname = $1")
            .bind(&config.database)
            .fetch_optional(&admin)
            .await?
            .is_some();
        if exists {
            log::info!("Database '{}' already exists", config.database);
        } else {
            sqlx::query(&format!("CREATE DATABASE {}", quote_identifier(&config.database)))
                .execute(&admin)
                .await?;
            log::info!("Created database '{}'", config.database);
        }
        admin.close().await;

        let pool = create_pool(config.connect_options(&config.database)).await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        log::info!("Database tables and indexes created/verified");

        Ok(Self { pool })
    }

    /// Insert one passage. Each insert commits on its own.
    pub async fn save_passage(&self, passage: &Passage) -> Result<(), sqlx::Error> {
        let citation = &passage.citation;
        let as_int = |v: Option<u32>| v.and_then(|v| i32::try_from(v).ok());

        sqlx::query(
            r#"
            INSERT INTO translation (translation_book, translation_page, translation_text_word,
                                     translation_cite, translation_cite_hebrew, translation_cite_common,
                                     translation_cite_chapter, translation_cite_verse,
                                     translation_cite_verse_end, translation_cite_note,
                                     translation_created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&passage.book)
        .bind(as_int(passage.page))
        .bind(&passage.text)
        .bind(&citation.label)
        .bind(&citation.source_label)
        .bind(&citation.common_label)
        .bind(as_int(citation.chapter))
        .bind(as_int(citation.verse))
        .bind(citation.verse_end.and_then(|v| i16::try_from(v).ok()))
        .bind(&citation.note)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Add every distinct stored citation label to `cite`.
    pub async fn populate_cite_table(&self) -> u64 {
        let result = sqlx::query(
            r#"
            INSERT INTO cite (label)
            SELECT DISTINCT translation_cite FROM translation
            WHERE translation_cite IS NOT NULL
            ON CONFLICT (label) DO NOTHING
            "#,
        )
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                log::info!(
                    "Populated cite table with {} distinct cite values",
                    done.rows_affected()
                );
                done.rows_affected()
            }
            Err(e) => {
                log::error!("Failed to populate cite table: {}", e);
                0
            }
        }
    }

    /// Fill `translation_cite_book_id` from `cite_book_map` by source label.
    pub async fn update_cite_book_ids(&self) -> u64 {
        let result = sqlx::query(
            r#"
            UPDATE translation t
            SET translation_cite_book_id = cbm.cite_book_id
            FROM cite_book_map cbm
            WHERE t.translation_cite_hebrew = cbm.cite_book_map_hebrew
              AND t.translation_cite_book_id IS NULL
            "#,
        )
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                log::info!(
                    "Updated cite_book_id for {} translation rows",
                    done.rows_affected()
                );
                done.rows_affected()
            }
            Err(e) => {
                log::error!("Failed to update cite_book_id: {}", e);
                0
            }
        }
    }

    pub async fn close(self) {
        self.pool.close().await;
        log::info!("Database connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("yada"), "\"yada\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_schema_statements() {
        assert!(SCHEMA[0].contains("CREATE TABLE IF NOT EXISTS translation"));
        assert!(SCHEMA.iter().any(|s| s.contains("idx_page")));
    }
}
