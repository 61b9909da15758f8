//! Unified SQL LedgerStore implementation.
//!
//! Uses a macro to generate implementations for each SQL backend,
//! eliminating code duplication while maintaining type safety.

use std::marker::PhantomData;

use super::SqlDatabase;

/// SQL-based implementation of LedgerStore.
///
/// This generic implementation works with any SQL database that implements
/// the `SqlDatabase` trait (PostgreSQL, SQLite).
pub struct SqlLedgerStore<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlLedgerStore<DB> {
    /// Create a new SQL ledger store with the given pool.
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }
}

/// An open write transaction against a SQL ledger.
///
/// Rolled back on drop unless committed; see [`super::WriteConnection`].
pub struct SqlLedgerTx<DB: SqlDatabase> {
    handle: Option<DB::WriteHandle>,
}

impl<DB: SqlDatabase> SqlLedgerTx<DB> {
    fn new(handle: DB::WriteHandle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    fn handle(&mut self) -> crate::interfaces::Result<&mut DB::WriteHandle> {
        self.handle.as_mut().ok_or_else(|| {
            crate::interfaces::StorageError::Unavailable("transaction already finished".into())
        })
    }
}

/// Macro to implement LedgerStore and LedgerTx for a specific SQL backend.
///
/// This eliminates duplication between PostgreSQL and SQLite implementations
/// while maintaining full type safety.
macro_rules! impl_ledger_store {
    ($db_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::LedgerStore for SqlLedgerStore<$db_type> {
            async fn begin(
                &self,
            ) -> crate::interfaces::Result<Box<dyn crate::interfaces::LedgerTx>> {
                let handle = <$db_type>::begin_write(&self.pool).await?;
                Ok(Box::new(SqlLedgerTx::<$db_type>::new(handle)))
            }

            async fn has_grant_since(
                &self,
                user_id: &str,
                reason: &str,
                since: chrono::DateTime<chrono::Utc>,
            ) -> crate::interfaces::Result<bool> {
                let stmt = super::statements::grant_since(user_id, reason, since);
                let sql = <$db_type as SqlDatabase>::build_select(stmt);
                let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;
                Ok(row.is_some())
            }

            async fn balance(
                &self,
                user_id: &str,
                currency: &str,
            ) -> crate::interfaces::Result<Option<i64>> {
                use sqlx::Row;

                let stmt = super::statements::select_balance(user_id, currency);
                let sql = <$db_type as SqlDatabase>::build_select(stmt);
                let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;
                Ok(row.map(|row| row.get::<i64, _>("balance")))
            }

            async fn transaction_sum(
                &self,
                user_id: &str,
                currency: &str,
            ) -> crate::interfaces::Result<i64> {
                use sqlx::Row;

                let stmt = super::statements::transaction_sum(user_id, currency);
                let sql = <$db_type as SqlDatabase>::build_select(stmt);
                let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
                Ok(row.get::<i64, _>("total"))
            }

            async fn transactions(
                &self,
                user_id: &str,
                currency: &str,
                limit: u32,
            ) -> crate::interfaces::Result<Vec<crate::model::BalanceTransaction>> {
                use sqlx::Row;

                use crate::storage::helpers::decode_timestamp;

                let stmt = super::statements::select_transactions(user_id, currency, limit);
                let sql = <$db_type as SqlDatabase>::build_select(stmt);
                let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

                let mut transactions = Vec::with_capacity(rows.len());
                for row in rows {
                    let id: String = row.get("id");
                    let created_at: String = row.get("created_at");
                    transactions.push(crate::model::BalanceTransaction {
                        id: uuid::Uuid::parse_str(&id)?,
                        user_id: row.get("user_id"),
                        currency: row.get("currency"),
                        amount: row.get("amount"),
                        reason: row.get("reason"),
                        created_at: decode_timestamp(&created_at)?,
                    });
                }
                Ok(transactions)
            }

            async fn streak(
                &self,
                user_id: &str,
                category: &str,
            ) -> crate::interfaces::Result<Option<crate::model::Streak>> {
                use sqlx::Row;

                use crate::storage::helpers::{decode_count, decode_date};

                let stmt = super::statements::select_streak(user_id, category);
                let sql = <$db_type as SqlDatabase>::build_select(stmt);
                let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

                match row {
                    Some(row) => {
                        let last: Option<String> = row.get("last_activity_date");
                        Ok(Some(crate::model::Streak {
                            current_streak: decode_count("current_streak", row.get("current_streak"))?,
                            longest_streak: decode_count("longest_streak", row.get("longest_streak"))?,
                            last_activity_date: decode_date(last.as_deref())?,
                        }))
                    }
                    None => Ok(None),
                }
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::LedgerTx for SqlLedgerTx<$db_type> {
            async fn lock_balance(
                &mut self,
                user_id: &str,
                currency: &str,
            ) -> crate::interfaces::Result<i64> {
                use sqlx::Row;

                let now = chrono::Utc::now();
                let conn = self.handle()?;

                let ensure = <$db_type as SqlDatabase>::build_insert(
                    super::statements::ensure_balance(user_id, currency, now),
                );
                sqlx::query(&ensure).execute(&mut **conn).await?;

                let select = <$db_type as SqlDatabase>::build_select_for_update(
                    super::statements::select_balance(user_id, currency),
                );
                let row = sqlx::query(&select).fetch_one(&mut **conn).await?;
                Ok(row.get::<i64, _>("balance"))
            }

            async fn has_grant_since(
                &mut self,
                user_id: &str,
                reason: &str,
                since: chrono::DateTime<chrono::Utc>,
            ) -> crate::interfaces::Result<bool> {
                let conn = self.handle()?;
                let sql = <$db_type as SqlDatabase>::build_select(
                    super::statements::grant_since(user_id, reason, since),
                );
                let row = sqlx::query(&sql).fetch_optional(&mut **conn).await?;
                Ok(row.is_some())
            }

            async fn insert_transaction(
                &mut self,
                transaction: &crate::model::BalanceTransaction,
            ) -> crate::interfaces::Result<()> {
                let conn = self.handle()?;
                let sql = <$db_type as SqlDatabase>::build_insert(
                    super::statements::insert_transaction(transaction),
                );
                sqlx::query(&sql).execute(&mut **conn).await?;
                Ok(())
            }

            async fn add_to_balance(
                &mut self,
                user_id: &str,
                currency: &str,
                amount: i64,
            ) -> crate::interfaces::Result<i64> {
                use sqlx::Row;

                let now = chrono::Utc::now();
                let conn = self.handle()?;
                let sql = <$db_type as SqlDatabase>::build_update(
                    super::statements::increment_balance(user_id, currency, amount, now),
                );
                let row = sqlx::query(&sql).fetch_one(&mut **conn).await?;
                Ok(row.get::<i64, _>("balance"))
            }

            async fn lock_streak(
                &mut self,
                user_id: &str,
                category: &str,
            ) -> crate::interfaces::Result<crate::model::Streak> {
                use sqlx::Row;

                use crate::storage::helpers::{decode_count, decode_date};

                let now = chrono::Utc::now();
                let conn = self.handle()?;

                let ensure = <$db_type as SqlDatabase>::build_insert(
                    super::statements::ensure_streak(user_id, category, now),
                );
                sqlx::query(&ensure).execute(&mut **conn).await?;

                let select = <$db_type as SqlDatabase>::build_select_for_update(
                    super::statements::select_streak(user_id, category),
                );
                let row = sqlx::query(&select).fetch_one(&mut **conn).await?;
                let last: Option<String> = row.get("last_activity_date");
                Ok(crate::model::Streak {
                    current_streak: decode_count("current_streak", row.get("current_streak"))?,
                    longest_streak: decode_count("longest_streak", row.get("longest_streak"))?,
                    last_activity_date: decode_date(last.as_deref())?,
                })
            }

            async fn save_streak(
                &mut self,
                user_id: &str,
                category: &str,
                streak: &crate::model::Streak,
            ) -> crate::interfaces::Result<()> {
                let now = chrono::Utc::now();
                let conn = self.handle()?;
                let sql = <$db_type as SqlDatabase>::build_insert(
                    super::statements::upsert_streak(user_id, category, streak, now),
                );
                sqlx::query(&sql).execute(&mut **conn).await?;
                Ok(())
            }

            async fn commit(mut self: Box<Self>) -> crate::interfaces::Result<()> {
                let handle = self.handle.take().ok_or_else(|| {
                    crate::interfaces::StorageError::Unavailable(
                        "transaction already finished".into(),
                    )
                })?;
                <$db_type>::commit_write(handle).await
            }
        }
    };
}

#[cfg(feature = "postgres")]
impl_ledger_store!(super::postgres::Postgres, "postgres");

#[cfg(feature = "sqlite")]
impl_ledger_store!(super::sqlite::Sqlite, "sqlite");
