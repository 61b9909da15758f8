//! Backend-agnostic ledger statements.
//!
//! Each function returns a sea-query statement; the backend renders it with
//! its own query builder.

use chrono::{DateTime, Utc};
use sea_query::{
    Alias, Expr, InsertStatement, OnConflict, Order, Query, SelectStatement, UpdateStatement,
};

use crate::model::{BalanceTransaction, Streak};
use crate::storage::helpers::{encode_date, encode_timestamp};
use crate::storage::schema::{BalanceTransactions, Balances, Streaks};

/// `SELECT 1` if a transaction for the reason exists after `since`.
pub fn grant_since(user_id: &str, reason: &str, since: DateTime<Utc>) -> SelectStatement {
    Query::select()
        .expr(Expr::val(1))
        .from(BalanceTransactions::Table)
        .and_where(Expr::col(BalanceTransactions::UserId).eq(user_id))
        .and_where(Expr::col(BalanceTransactions::Reason).eq(reason))
        .and_where(Expr::col(BalanceTransactions::CreatedAt).gt(encode_timestamp(since)))
        .limit(1)
        .to_owned()
}

pub fn insert_transaction(transaction: &BalanceTransaction) -> InsertStatement {
    Query::insert()
        .into_table(BalanceTransactions::Table)
        .columns([
            BalanceTransactions::Id,
            BalanceTransactions::UserId,
            BalanceTransactions::Currency,
            BalanceTransactions::Amount,
            BalanceTransactions::Reason,
            BalanceTransactions::CreatedAt,
        ])
        .values_panic([
            transaction.id.to_string().into(),
            transaction.user_id.as_str().into(),
            transaction.currency.as_str().into(),
            transaction.amount.into(),
            transaction.reason.as_str().into(),
            encode_timestamp(transaction.created_at).into(),
        ])
        .to_owned()
}

pub fn select_transactions(user_id: &str, currency: &str, limit: u32) -> SelectStatement {
    Query::select()
        .columns([
            BalanceTransactions::Id,
            BalanceTransactions::UserId,
            BalanceTransactions::Currency,
            BalanceTransactions::Amount,
            BalanceTransactions::Reason,
            BalanceTransactions::CreatedAt,
        ])
        .from(BalanceTransactions::Table)
        .and_where(Expr::col(BalanceTransactions::UserId).eq(user_id))
        .and_where(Expr::col(BalanceTransactions::Currency).eq(currency))
        .order_by(BalanceTransactions::CreatedAt, Order::Desc)
        .order_by(BalanceTransactions::Id, Order::Desc)
        .limit(u64::from(limit))
        .to_owned()
}

/// Sum of amounts as a 64-bit integer, 0 when there are no rows.
///
/// PostgreSQL widens `SUM(BIGINT)` to NUMERIC, hence the cast.
pub fn transaction_sum(user_id: &str, currency: &str) -> SelectStatement {
    Query::select()
        .expr_as(
            Expr::cust(r#"CAST(COALESCE(SUM("amount"), 0) AS BIGINT)"#),
            Alias::new("total"),
        )
        .from(BalanceTransactions::Table)
        .and_where(Expr::col(BalanceTransactions::UserId).eq(user_id))
        .and_where(Expr::col(BalanceTransactions::Currency).eq(currency))
        .to_owned()
}

/// Create the balance row at 0 unless it exists.
pub fn ensure_balance(user_id: &str, currency: &str, now: DateTime<Utc>) -> InsertStatement {
    Query::insert()
        .into_table(Balances::Table)
        .columns([
            Balances::UserId,
            Balances::Currency,
            Balances::Balance,
            Balances::UpdatedAt,
        ])
        .values_panic([
            user_id.into(),
            currency.into(),
            0i64.into(),
            encode_timestamp(now).into(),
        ])
        .on_conflict(
            OnConflict::columns([Balances::UserId, Balances::Currency])
                .do_nothing()
                .to_owned(),
        )
        .to_owned()
}

pub fn select_balance(user_id: &str, currency: &str) -> SelectStatement {
    Query::select()
        .column(Balances::Balance)
        .from(Balances::Table)
        .and_where(Expr::col(Balances::UserId).eq(user_id))
        .and_where(Expr::col(Balances::Currency).eq(currency))
        .to_owned()
}

/// `balance = balance + amount`, returning the new balance.
pub fn increment_balance(
    user_id: &str,
    currency: &str,
    amount: i64,
    now: DateTime<Utc>,
) -> UpdateStatement {
    Query::update()
        .table(Balances::Table)
        .value(Balances::Balance, Expr::col(Balances::Balance).add(amount))
        .value(Balances::UpdatedAt, encode_timestamp(now))
        .and_where(Expr::col(Balances::UserId).eq(user_id))
        .and_where(Expr::col(Balances::Currency).eq(currency))
        .returning_col(Balances::Balance)
        .to_owned()
}

pub fn select_streak(user_id: &str, category: &str) -> SelectStatement {
    Query::select()
        .columns([
            Streaks::CurrentStreak,
            Streaks::LongestStreak,
            Streaks::LastActivityDate,
        ])
        .from(Streaks::Table)
        .and_where(Expr::col(Streaks::UserId).eq(user_id))
        .and_where(Expr::col(Streaks::Category).eq(category))
        .to_owned()
}

/// Create an empty streak row unless it exists, so it can be locked.
pub fn ensure_streak(user_id: &str, category: &str, now: DateTime<Utc>) -> InsertStatement {
    Query::insert()
        .into_table(Streaks::Table)
        .columns([
            Streaks::UserId,
            Streaks::Category,
            Streaks::CurrentStreak,
            Streaks::LongestStreak,
            Streaks::UpdatedAt,
        ])
        .values_panic([
            user_id.into(),
            category.into(),
            0i64.into(),
            0i64.into(),
            encode_timestamp(now).into(),
        ])
        .on_conflict(
            OnConflict::columns([Streaks::UserId, Streaks::Category])
                .do_nothing()
                .to_owned(),
        )
        .to_owned()
}

pub fn upsert_streak(
    user_id: &str,
    category: &str,
    streak: &Streak,
    now: DateTime<Utc>,
) -> InsertStatement {
    Query::insert()
        .into_table(Streaks::Table)
        .columns([
            Streaks::UserId,
            Streaks::Category,
            Streaks::CurrentStreak,
            Streaks::LongestStreak,
            Streaks::LastActivityDate,
            Streaks::UpdatedAt,
        ])
        .values_panic([
            user_id.into(),
            category.into(),
            i64::from(streak.current_streak).into(),
            i64::from(streak.longest_streak).into(),
            streak.last_activity_date.map(encode_date).into(),
            encode_timestamp(now).into(),
        ])
        .on_conflict(
            OnConflict::columns([Streaks::UserId, Streaks::Category])
                .update_columns([
                    Streaks::CurrentStreak,
                    Streaks::LongestStreak,
                    Streaks::LastActivityDate,
                    Streaks::UpdatedAt,
                ])
                .to_owned(),
        )
        .to_owned()
}
