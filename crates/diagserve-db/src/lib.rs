//! database layer for diagserve.
//!
//! this crate provides persistent storage for diagnosis keys behind the
//! narrow [`Repository`] port the publication service consumes: bulk
//! insert-or-ignore, full ordered scan and last-modified lookup. rows are
//! never updated or deleted here; purging old keys is an external
//! operational concern.

#![warn(missing_docs)]

mod entity;
mod error;
mod migration;

pub use error::Error;

use std::future::Future;

use chrono::{DateTime, Utc};
use diagserve_types::{DatabaseConfig, DiagnosisKey};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::NotSet, ConnectOptions, ConnectionTrait, Database as SeaOrmDatabase,
    DatabaseConnection, EntityTrait, QueryOrder, Set,
};
use sea_orm_migration::MigratorTrait;

/// result type for repository operations.
pub type Result<T> = std::result::Result<T, Error>;

/// repository port for diagnosis key storage.
///
/// this trait abstracts over database backends (sqlite, postgresql). the
/// store is append-only: keys are inserted once and only ever read back in
/// insertion order.
pub trait Repository: Send + Sync {
    /// ping the database to verify connectivity.
    ///
    /// returns `Ok(())` if the database is reachable, `Err` otherwise.
    /// used for health checks with a recommended timeout of 1 second.
    fn ping(&self) -> impl Future<Output = Result<()>> + Send;

    /// persist a batch of diagnosis keys, all sharing one `uploaded_at`
    /// timestamp. keys whose bytes are already present are silently kept
    /// as-is. returns the number of newly inserted rows.
    ///
    /// fails with [`Error::EmptyBatch`] when `keys` is empty.
    fn store_diagnosis_keys(
        &self,
        keys: &[DiagnosisKey],
        uploaded_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// return all stored keys in ascending insertion order. this ordering
    /// is the contract the listing cursor depends on.
    fn find_all_diagnosis_keys(&self) -> impl Future<Output = Result<Vec<DiagnosisKey>>> + Send;

    /// return the `uploaded_at` of the most recent insertion, or
    /// [`Error::EmptyBatch`] when the store is empty.
    fn last_modified(&self) -> impl Future<Output = Result<DateTime<Utc>>> + Send;
}

/// the main repository implementation using sea-orm.
#[derive(Clone)]
pub struct DiagDb {
    conn: DatabaseConnection,
}

impl DiagDb {
    /// open a connection pool from config. does not run migrations; call
    /// [`DiagDb::migrate`] before serving.
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let url = Self::connection_url(config)?;
        let mut options = ConnectOptions::new(url);
        options
            .max_connections(config.max_connections)
            .min_connections(config.min_connections);

        let conn: DatabaseConnection = SeaOrmDatabase::connect(options)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        Ok(Self { conn })
    }

    /// sea-orm connection url for the configured backend.
    ///
    /// sqlite connection strings are normalized to a bare path first, so
    /// config may carry either form; fresh deployments get create mode
    /// unless the path already carries its own options.
    fn connection_url(config: &DatabaseConfig) -> Result<String> {
        match config.db_type.as_str() {
            "sqlite" => {
                let path = config
                    .connection_string
                    .strip_prefix("sqlite:")
                    .unwrap_or(&config.connection_string);
                if path.contains('?') {
                    Ok(format!("sqlite:{path}"))
                } else {
                    Ok(format!("sqlite:{path}?mode=rwc"))
                }
            }
            "postgres" | "postgresql" => Ok(config.connection_string.clone()),
            other => Err(Error::InvalidData(format!(
                "database type {other:?} is not supported, expected sqlite or postgres"
            ))),
        }
    }

    /// create a migrated in-memory sqlite database for testing.
    pub async fn new_in_memory() -> Result<Self> {
        let conn: DatabaseConnection = SeaOrmDatabase::connect("sqlite::memory:")
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        let db = Self { conn };
        db.migrate().await?;
        Ok(db)
    }

    /// run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        migration::Migrator::up(&self.conn, None)
            .await
            .map_err(|e| Error::Migration(e.to_string()))?;
        Ok(())
    }
}

impl Repository for DiagDb {
    async fn ping(&self) -> Result<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(())
    }

    async fn store_diagnosis_keys(
        &self,
        keys: &[DiagnosisKey],
        uploaded_at: DateTime<Utc>,
    ) -> Result<u64> {
        if keys.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let models = keys.iter().map(|key| entity::diagnosis_key::ActiveModel {
            id: NotSet,
            temporary_exposure_key: Set(key.temporary_exposure_key.as_bytes().to_vec()),
            rolling_start_number: Set(i64::from(key.rolling_start_number)),
            transmission_risk_level: Set(i16::from(key.transmission_risk_level)),
            uploaded_at: Set(uploaded_at),
        });

        let inserted = entity::diagnosis_key::Entity::insert_many(models)
            .on_conflict(
                OnConflict::column(entity::diagnosis_key::Column::TemporaryExposureKey)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(inserted)
    }

    async fn find_all_diagnosis_keys(&self) -> Result<Vec<DiagnosisKey>> {
        let models = entity::diagnosis_key::Entity::find()
            .order_by_asc(entity::diagnosis_key::Column::Id)
            .all(&self.conn)
            .await?;

        models.into_iter().map(DiagnosisKey::try_from).collect()
    }

    async fn last_modified(&self) -> Result<DateTime<Utc>> {
        let newest = entity::diagnosis_key::Entity::find()
            .order_by_desc(entity::diagnosis_key::Column::Id)
            .one(&self.conn)
            .await?;

        match newest {
            Some(model) => Ok(model.uploaded_at),
            None => Err(Error::EmptyBatch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use diagserve_types::TemporaryExposureKey;

    fn key(fill: u8, rolling_start_number: u32) -> DiagnosisKey {
        DiagnosisKey::new(
            TemporaryExposureKey::from_bytes([fill; 16]),
            rolling_start_number,
            fill,
        )
    }

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 2, 23, 30, secs).unwrap()
    }

    #[tokio::test]
    async fn test_store_and_find_all_preserves_insertion_order() {
        let db = DiagDb::new_in_memory().await.unwrap();

        // insert out of byte order to prove ordering comes from insertion,
        // not from the key bytes
        let first = vec![key(9, 1), key(2, 2)];
        let second = vec![key(5, 3)];
        assert_eq!(db.store_diagnosis_keys(&first, ts(0)).await.unwrap(), 2);
        assert_eq!(db.store_diagnosis_keys(&second, ts(1)).await.unwrap(), 1);

        let all = db.find_all_diagnosis_keys().await.unwrap();
        let fills: Vec<u8> = all
            .iter()
            .map(|k| k.temporary_exposure_key.as_bytes()[0])
            .collect();
        assert_eq!(fills, vec![9, 2, 5]);
        assert_eq!(all[0].uploaded_at, Some(ts(0)));
        assert_eq!(all[2].uploaded_at, Some(ts(1)));
    }

    #[tokio::test]
    async fn test_store_is_idempotent() {
        let db = DiagDb::new_in_memory().await.unwrap();
        let batch = vec![key(1, 42), key(2, 42)];

        assert_eq!(db.store_diagnosis_keys(&batch, ts(0)).await.unwrap(), 2);
        assert_eq!(db.store_diagnosis_keys(&batch, ts(1)).await.unwrap(), 0);

        let all = db.find_all_diagnosis_keys().await.unwrap();
        assert_eq!(all.len(), 2);
        // the conflicting re-insert must not touch the original rows
        assert_eq!(all[0].uploaded_at, Some(ts(0)));
    }

    #[tokio::test]
    async fn test_duplicate_keys_within_one_batch_are_absorbed() {
        let db = DiagDb::new_in_memory().await.unwrap();
        let batch = vec![key(7, 42), key(7, 42)];

        assert_eq!(db.store_diagnosis_keys(&batch, ts(0)).await.unwrap(), 1);
        assert_eq!(db.find_all_diagnosis_keys().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_store_rejects_empty_batch() {
        let db = DiagDb::new_in_memory().await.unwrap();
        assert!(matches!(
            db.store_diagnosis_keys(&[], ts(0)).await,
            Err(Error::EmptyBatch)
        ));
    }

    #[tokio::test]
    async fn test_last_modified_tracks_newest_insertion() {
        let db = DiagDb::new_in_memory().await.unwrap();

        assert!(matches!(db.last_modified().await, Err(Error::EmptyBatch)));

        db.store_diagnosis_keys(&[key(1, 1)], ts(0)).await.unwrap();
        db.store_diagnosis_keys(&[key(2, 2)], ts(30)).await.unwrap();

        assert_eq!(db.last_modified().await.unwrap(), ts(30));
    }

    #[tokio::test]
    async fn test_ping_succeeds_on_live_database() {
        let db = DiagDb::new_in_memory().await.unwrap();
        db.ping().await.unwrap();
    }

    #[test]
    fn test_connection_url_for_sqlite_path() {
        let config = DatabaseConfig {
            db_type: "sqlite".to_string(),
            connection_string: "/tmp/diag.sqlite".to_string(),
            ..DatabaseConfig::default()
        };
        assert_eq!(
            DiagDb::connection_url(&config).unwrap(),
            "sqlite:/tmp/diag.sqlite?mode=rwc"
        );

        // already-prefixed connection strings normalize to the same url
        let prefixed = DatabaseConfig {
            connection_string: "sqlite:/tmp/diag.sqlite".to_string(),
            ..config
        };
        assert_eq!(
            DiagDb::connection_url(&prefixed).unwrap(),
            "sqlite:/tmp/diag.sqlite?mode=rwc"
        );
    }

    #[test]
    fn test_connection_url_rejects_unknown_type() {
        let config = DatabaseConfig {
            db_type: "mysql".to_string(),
            ..DatabaseConfig::default()
        };
        assert!(DiagDb::connection_url(&config).is_err());
    }
}
