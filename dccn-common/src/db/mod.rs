//! SQLite persistence
//!
//! Query functions take a `&mut SqliteConnection` so that the workflow can
//! run several of them inside one transaction; a pooled connection or a
//! transaction derefs to it.

pub mod conferences;
pub mod decisions;
pub mod init;
pub mod messages;
pub mod proceedings;
pub mod reviews;
pub mod snapshot;
pub mod submissions;
pub mod users;

pub use init::init_database;
pub use snapshot::load_snapshot;

#[cfg(test)]
pub(crate) mod testing {
    //! Temp-file databases for unit tests

    use sqlx::SqlitePool;
    use tempfile::TempDir;

    /// Keeps the directory alive as long as the pool is used
    pub struct TestDb {
        pub pool: SqlitePool,
        _dir: TempDir,
    }

    pub async fn test_db() -> TestDb {
        let dir = TempDir::new().unwrap();
        let pool = super::init_database(&dir.path().join("dccn.db")).await.unwrap();
        TestDb { pool, _dir: dir }
    }
}
