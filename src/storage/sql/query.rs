//! SQL database abstraction trait.

use sea_query::{InsertStatement, SelectStatement, UpdateStatement};

/// Trait for SQL database backends.
///
/// This trait abstracts over different SQL databases (PostgreSQL, SQLite)
/// by providing the pool type, the write-transaction handle and the query
/// building methods.
pub trait SqlDatabase: Send + Sync + 'static {
    /// The connection pool type for this database.
    type Pool: Clone + Send + Sync;

    /// Connection held for the lifetime of one ledger transaction.
    type WriteHandle: Send;

    /// Build a SQL query string from a sea-query SELECT statement.
    fn build_select(stmt: SelectStatement) -> String;

    /// Build a SELECT that locks the selected rows until commit.
    ///
    /// Backends whose write transactions already exclude other writers
    /// return the plain SELECT.
    fn build_select_for_update(stmt: SelectStatement) -> String;

    /// Build a SQL query string from a sea-query INSERT statement.
    fn build_insert(stmt: InsertStatement) -> String;

    /// Build a SQL query string from a sea-query UPDATE statement.
    fn build_update(stmt: UpdateStatement) -> String;
}
