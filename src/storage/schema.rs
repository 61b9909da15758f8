//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.
//! The tables themselves are created by the SQL migrations under `migrations/`.

use sea_query::Iden;

/// Append-only balance transactions table schema.
#[derive(Iden)]
pub enum BalanceTransactions {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "user_id"]
    UserId,
    #[iden = "currency"]
    Currency,
    #[iden = "amount"]
    Amount,
    #[iden = "reason"]
    Reason,
    #[iden = "created_at"]
    CreatedAt,
}

/// Balance projection table schema, one row per user and currency.
#[derive(Iden)]
pub enum Balances {
    Table,
    #[iden = "user_id"]
    UserId,
    #[iden = "currency"]
    Currency,
    #[iden = "balance"]
    Balance,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// Streaks table schema, one row per user and category.
#[derive(Iden)]
pub enum Streaks {
    Table,
    #[iden = "user_id"]
    UserId,
    #[iden = "category"]
    Category,
    #[iden = "current_streak"]
    CurrentStreak,
    #[iden = "longest_streak"]
    LongestStreak,
    #[iden = "last_activity_date"]
    LastActivityDate,
    #[iden = "updated_at"]
    UpdatedAt,
}
