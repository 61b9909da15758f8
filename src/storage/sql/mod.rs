//! Unified SQL storage implementations.
//!
//! This module provides the shared ledger implementation for SQL-based
//! storage backends (PostgreSQL, SQLite). The implementation is parameterized
//! by database type using the `SqlDatabase` trait.

mod ledger_store;
mod query;
pub(crate) mod statements;

use std::ops::{Deref, DerefMut};

use sqlx::pool::PoolConnection;

pub use ledger_store::{SqlLedgerStore, SqlLedgerTx};
pub use query::SqlDatabase;

/// Pooled connection carrying an open write transaction.
///
/// Armed from acquisition until `COMMIT` succeeds. Dropping an armed
/// connection closes it instead of returning it to the pool, and closing
/// rolls the transaction back. This holds for a transaction abandoned midway
/// and for a future cancelled while `BEGIN` or `COMMIT` is in flight.
pub struct WriteConnection<DB: sqlx::Database> {
    conn: PoolConnection<DB>,
    committed: bool,
}

impl<DB: sqlx::Database> WriteConnection<DB> {
    pub(crate) fn new(conn: PoolConnection<DB>) -> Self {
        Self {
            conn,
            committed: false,
        }
    }

    /// Mark the transaction committed; the connection may be reused.
    pub(crate) fn release(mut self) {
        self.committed = true;
    }
}

impl<DB: sqlx::Database> Deref for WriteConnection<DB> {
    type Target = DB::Connection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl<DB: sqlx::Database> DerefMut for WriteConnection<DB> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

impl<DB: sqlx::Database> Drop for WriteConnection<DB> {
    fn drop(&mut self) {
        if !self.committed {
            self.conn.close_on_drop();
        }
    }
}

#[cfg(feature = "postgres")]
pub mod postgres {
    //! PostgreSQL database backend.
    //!
    //! Write transactions run at READ COMMITTED; concurrent writers are
    //! serialized by `SELECT ... FOR UPDATE` on the balance and streak rows.

    use sea_query::{LockType, PostgresQueryBuilder};
    use sqlx::PgPool;

    use super::WriteConnection;
    use crate::interfaces::Result;

    /// PostgreSQL database marker type.
    pub struct Postgres;

    impl super::SqlDatabase for Postgres {
        type Pool = PgPool;
        type WriteHandle = WriteConnection<sqlx::Postgres>;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_select_for_update(mut stmt: sea_query::SelectStatement) -> String {
            stmt.lock(LockType::Update).to_string(PostgresQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_update(stmt: sea_query::UpdateStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }
    }

    impl Postgres {
        pub(crate) async fn begin_write(pool: &PgPool) -> Result<WriteConnection<sqlx::Postgres>> {
            let mut conn = WriteConnection::new(pool.acquire().await?);
            sqlx::query("BEGIN").execute(&mut *conn).await?;
            Ok(conn)
        }

        pub(crate) async fn commit_write(mut handle: WriteConnection<sqlx::Postgres>) -> Result<()> {
            sqlx::query("COMMIT").execute(&mut *handle).await?;
            handle.release();
            Ok(())
        }
    }

    /// PostgreSQL ledger store.
    pub type PostgresLedgerStore = super::SqlLedgerStore<Postgres>;
}

#[cfg(feature = "sqlite")]
pub mod sqlite {
    //! SQLite database backend.
    //!
    //! Write transactions start with `BEGIN IMMEDIATE`, which takes the
    //! database write lock up front. Writers are therefore fully serialized
    //! and row locks are unnecessary.

    use sea_query::SqliteQueryBuilder;
    use sqlx::SqlitePool;

    use super::WriteConnection;
    use crate::interfaces::Result;

    /// SQLite database marker type.
    pub struct Sqlite;

    impl super::SqlDatabase for Sqlite {
        type Pool = SqlitePool;
        type WriteHandle = WriteConnection<sqlx::Sqlite>;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_select_for_update(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_update(stmt: sea_query::UpdateStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }
    }

    impl Sqlite {
        pub(crate) async fn begin_write(pool: &SqlitePool) -> Result<WriteConnection<sqlx::Sqlite>> {
            // BEGIN IMMEDIATE acquires the write lock upfront, preventing deadlocks
            // when concurrent DEFERRED transactions race to upgrade from shared to exclusive.
            let mut conn = WriteConnection::new(pool.acquire().await?);
            sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
            Ok(conn)
        }

        pub(crate) async fn commit_write(mut handle: WriteConnection<sqlx::Sqlite>) -> Result<()> {
            sqlx::query("COMMIT").execute(&mut *handle).await?;
            handle.release();
            Ok(())
        }
    }

    /// SQLite ledger store.
    pub type SqliteLedgerStore = super::SqlLedgerStore<Sqlite>;
}
