//! LedgerStore interface tests.
//!
//! These tests verify the contract of the LedgerStore and LedgerTx traits.
//! Each storage implementation should run these tests. Every test works on
//! a fresh user id, so a shared database needs no cleanup between runs.

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use sprout::interfaces::LedgerStore;
use sprout::model::{BalanceTransaction, Streak};

/// A unique user id for one test.
pub fn test_user() -> String {
    format!("test_{}", Uuid::new_v4())
}

/// Fixed base instant with microsecond precision, matching storage encoding.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap() + Duration::microseconds(123_456)
}

/// Grant `amount` through a committed transaction, as the reward granter does.
pub async fn grant<S: LedgerStore>(
    store: &S,
    user_id: &str,
    currency: &str,
    amount: i64,
    reason: &str,
    at: DateTime<Utc>,
) -> BalanceTransaction {
    let txn = BalanceTransaction::new(user_id, currency, amount, reason, at);
    let mut tx = store.begin().await.expect("begin should succeed");
    tx.lock_balance(user_id, currency)
        .await
        .expect("lock_balance should succeed");
    tx.insert_transaction(&txn)
        .await
        .expect("insert should succeed");
    tx.add_to_balance(user_id, currency, amount)
        .await
        .expect("add should succeed");
    tx.commit().await.expect("commit should succeed");
    txn
}

// =============================================================================
// Balance tests
// =============================================================================

pub async fn test_balance_missing<S: LedgerStore>(store: &S) {
    let user = test_user();
    let balance = store
        .balance(&user, "stamps")
        .await
        .expect("balance should succeed");
    assert!(balance.is_none(), "no row before the first grant");
    assert_eq!(store.transaction_sum(&user, "stamps").await.unwrap(), 0);
}

pub async fn test_lock_balance_creates_zero_row<S: LedgerStore>(store: &S) {
    let user = test_user();

    let mut tx = store.begin().await.expect("begin should succeed");
    let locked = tx
        .lock_balance(&user, "stamps")
        .await
        .expect("lock_balance should succeed");
    assert_eq!(locked, 0);
    tx.commit().await.expect("commit should succeed");

    assert_eq!(store.balance(&user, "stamps").await.unwrap(), Some(0));
}

pub async fn test_grant_updates_balance_and_sum<S: LedgerStore>(store: &S) {
    let user = test_user();

    grant(store, &user, "stamps", 5, "daily_entry", base_time()).await;
    grant(store, &user, "stamps", 7, "bonus", base_time() + Duration::hours(1)).await;

    assert_eq!(store.balance(&user, "stamps").await.unwrap(), Some(12));
    assert_eq!(store.transaction_sum(&user, "stamps").await.unwrap(), 12);
}

pub async fn test_currencies_are_independent<S: LedgerStore>(store: &S) {
    let user = test_user();

    grant(store, &user, "stamps", 5, "daily_entry", base_time()).await;
    grant(store, &user, "droplets", 3, "daily_mood_entry", base_time()).await;

    assert_eq!(store.balance(&user, "stamps").await.unwrap(), Some(5));
    assert_eq!(store.balance(&user, "droplets").await.unwrap(), Some(3));
    assert_eq!(store.transaction_sum(&user, "droplets").await.unwrap(), 3);
}

pub async fn test_add_returns_running_balance<S: LedgerStore>(store: &S) {
    let user = test_user();

    let mut tx = store.begin().await.unwrap();
    tx.lock_balance(&user, "stamps").await.unwrap();
    assert_eq!(tx.add_to_balance(&user, "stamps", 5).await.unwrap(), 5);
    assert_eq!(tx.add_to_balance(&user, "stamps", 5).await.unwrap(), 10);
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.lock_balance(&user, "stamps").await.unwrap(), 10);
}

// =============================================================================
// Transaction boundary tests
// =============================================================================

pub async fn test_dropped_transaction_rolls_back<S: LedgerStore>(store: &S) {
    let user = test_user();

    {
        let txn = BalanceTransaction::new(&user, "stamps", 5, "daily_entry", base_time());
        let mut tx = store.begin().await.unwrap();
        tx.lock_balance(&user, "stamps").await.unwrap();
        tx.insert_transaction(&txn).await.unwrap();
        tx.add_to_balance(&user, "stamps", 5).await.unwrap();
        tx.save_streak(
            &user,
            "journal",
            &Streak {
                current_streak: 1,
                longest_streak: 1,
                last_activity_date: Some(base_time().date_naive()),
            },
        )
        .await
        .unwrap();
        // dropped without commit
    }

    assert!(store.balance(&user, "stamps").await.unwrap().is_none());
    assert_eq!(store.transaction_sum(&user, "stamps").await.unwrap(), 0);
    assert!(store.streak(&user, "journal").await.unwrap().is_none());
    assert!(!store
        .has_grant_since(&user, "daily_entry", base_time() - Duration::hours(24))
        .await
        .unwrap());

    // The store stays usable after an abandoned transaction.
    grant(store, &user, "stamps", 5, "daily_entry", base_time()).await;
    assert_eq!(store.balance(&user, "stamps").await.unwrap(), Some(5));
}

pub async fn test_staged_grant_visible_in_transaction<S: LedgerStore>(store: &S) {
    let user = test_user();
    let txn = BalanceTransaction::new(&user, "stamps", 5, "daily_entry", base_time());

    let mut tx = store.begin().await.unwrap();
    tx.lock_balance(&user, "stamps").await.unwrap();
    tx.insert_transaction(&txn).await.unwrap();
    let seen = tx
        .has_grant_since(&user, "daily_entry", base_time() - Duration::hours(24))
        .await
        .unwrap();
    assert!(seen, "a transaction sees its own uncommitted grant");
}

// =============================================================================
// Eligibility query tests
// =============================================================================

pub async fn test_has_grant_since_is_strict<S: LedgerStore>(store: &S) {
    let user = test_user();
    let t0 = base_time();

    grant(store, &user, "stamps", 5, "daily_entry", t0).await;

    let just_before = t0 - Duration::microseconds(1);
    assert!(store
        .has_grant_since(&user, "daily_entry", just_before)
        .await
        .unwrap());
    assert!(
        !store.has_grant_since(&user, "daily_entry", t0).await.unwrap(),
        "created_at must be after since"
    );
    assert!(!store
        .has_grant_since(&user, "daily_entry", t0 + Duration::hours(1))
        .await
        .unwrap());
}

pub async fn test_has_grant_since_filters_reason_and_user<S: LedgerStore>(store: &S) {
    let user = test_user();
    let other = test_user();
    let since = base_time() - Duration::hours(24);

    grant(store, &user, "stamps", 5, "daily_entry", base_time()).await;

    assert!(store.has_grant_since(&user, "daily_entry", since).await.unwrap());
    assert!(!store
        .has_grant_since(&user, "daily_mood_entry", since)
        .await
        .unwrap());
    assert!(!store.has_grant_since(&other, "daily_entry", since).await.unwrap());
}

// =============================================================================
// History tests
// =============================================================================

pub async fn test_transactions_newest_first<S: LedgerStore>(store: &S) {
    let user = test_user();
    let t0 = base_time();

    let first = grant(store, &user, "stamps", 1, "daily_entry", t0).await;
    let third = grant(store, &user, "stamps", 3, "daily_entry", t0 + Duration::days(2)).await;
    let second = grant(store, &user, "stamps", 2, "daily_entry", t0 + Duration::days(1)).await;
    grant(store, &user, "droplets", 9, "daily_mood_entry", t0).await;

    let all = store.transactions(&user, "stamps", 10).await.unwrap();
    assert_eq!(all, vec![third.clone(), second, first]);

    let limited = store.transactions(&user, "stamps", 1).await.unwrap();
    assert_eq!(limited, vec![third]);
}

pub async fn test_transactions_empty<S: LedgerStore>(store: &S) {
    let user = test_user();
    assert!(store.transactions(&user, "stamps", 10).await.unwrap().is_empty());
}

// =============================================================================
// Streak tests
// =============================================================================

pub async fn test_streak_missing<S: LedgerStore>(store: &S) {
    let user = test_user();
    assert!(store.streak(&user, "journal").await.unwrap().is_none());

    let mut tx = store.begin().await.unwrap();
    let locked = tx.lock_streak(&user, "journal").await.unwrap();
    assert_eq!(locked, Streak::default());
    tx.commit().await.unwrap();

    // Locking creates the row; committing without a save keeps it empty.
    assert_eq!(
        store.streak(&user, "journal").await.unwrap(),
        Some(Streak::default())
    );
}

pub async fn test_streak_save_and_reload<S: LedgerStore>(store: &S) {
    let user = test_user();
    let day = base_time().date_naive();
    let streak = Streak {
        current_streak: 3,
        longest_streak: 7,
        last_activity_date: Some(day),
    };

    let mut tx = store.begin().await.unwrap();
    tx.lock_streak(&user, "journal").await.unwrap();
    tx.save_streak(&user, "journal", &streak).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(store.streak(&user, "journal").await.unwrap(), Some(streak));
    assert!(store.streak(&user, "mood").await.unwrap().is_none());

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.lock_streak(&user, "journal").await.unwrap(), streak);
}

pub async fn test_streak_overwrite<S: LedgerStore>(store: &S) {
    let user = test_user();
    let day = base_time().date_naive();

    for (current, offset) in [(1u32, 0i64), (2, 1)] {
        let mut tx = store.begin().await.unwrap();
        tx.lock_streak(&user, "journal").await.unwrap();
        tx.save_streak(
            &user,
            "journal",
            &Streak {
                current_streak: current,
                longest_streak: current,
                last_activity_date: Some(day + Duration::days(offset)),
            },
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
    }

    let streak = store.streak(&user, "journal").await.unwrap().unwrap();
    assert_eq!(streak.current_streak, 2);
    assert_eq!(streak.last_activity_date, Some(day + Duration::days(1)));
}

// =============================================================================
// Concurrency tests
// =============================================================================

/// Concurrent check-then-insert under `lock_balance` grants exactly once.
pub async fn test_locked_recheck_grants_once<S: LedgerStore>(store: &S) {
    let user = test_user();
    let now = base_time();
    let since = now - Duration::hours(24);

    let attempts = (0..8).map(|_| {
        let user = user.clone();
        async move {
            let mut tx = store.begin().await.unwrap();
            tx.lock_balance(&user, "stamps").await.unwrap();
            if tx.has_grant_since(&user, "daily_entry", since).await.unwrap() {
                return false;
            }
            let txn = BalanceTransaction::new(&user, "stamps", 5, "daily_entry", now);
            tx.insert_transaction(&txn).await.unwrap();
            tx.add_to_balance(&user, "stamps", 5).await.unwrap();
            tx.commit().await.unwrap();
            true
        }
    });

    let granted = futures::future::join_all(attempts)
        .await
        .into_iter()
        .filter(|g| *g)
        .count();

    assert_eq!(granted, 1);
    assert_eq!(store.balance(&user, "stamps").await.unwrap(), Some(5));
    assert_eq!(store.transaction_sum(&user, "stamps").await.unwrap(), 5);
}

/// A writer cancelled while waiting for the lock leaves no transaction behind.
///
/// The blocked attempt is dropped mid-await. Afterwards the holder's grant
/// commits and fresh writers, which may reuse pooled connections, succeed.
pub async fn test_cancelled_waiting_writer_leaves_store_usable<S: LedgerStore>(store: &S) {
    let user = test_user();
    let now = base_time();

    let mut holder = store.begin().await.expect("begin should succeed");
    holder.lock_balance(&user, "stamps").await.unwrap();

    let blocked = tokio::time::timeout(std::time::Duration::from_millis(100), async {
        let mut tx = store.begin().await?;
        tx.lock_balance(&user, "stamps").await?;
        Ok::<_, sprout::interfaces::StorageError>(tx)
    })
    .await;
    assert!(blocked.is_err(), "second writer should wait for the lock");

    let txn = BalanceTransaction::new(&user, "stamps", 5, "daily_entry", now);
    holder.insert_transaction(&txn).await.unwrap();
    holder.add_to_balance(&user, "stamps", 5).await.unwrap();
    holder.commit().await.expect("holder commit should succeed");

    for _ in 0..6 {
        let other = test_user();
        grant(store, &other, "stamps", 5, "daily_entry", now).await;
        assert_eq!(store.balance(&other, "stamps").await.unwrap(), Some(5));
    }

    assert_eq!(store.balance(&user, "stamps").await.unwrap(), Some(5));
    assert_eq!(store.transaction_sum(&user, "stamps").await.unwrap(), 5);
}

/// Run all LedgerStore tests against a store implementation.
#[macro_export]
macro_rules! run_ledger_store_tests {
    ($store:expr) => {
        use $crate::storage::ledger_store_tests::*;

        // balance tests
        test_balance_missing($store).await;
        println!("  test_balance_missing: PASSED");

        test_lock_balance_creates_zero_row($store).await;
        println!("  test_lock_balance_creates_zero_row: PASSED");

        test_grant_updates_balance_and_sum($store).await;
        println!("  test_grant_updates_balance_and_sum: PASSED");

        test_currencies_are_independent($store).await;
        println!("  test_currencies_are_independent: PASSED");

        test_add_returns_running_balance($store).await;
        println!("  test_add_returns_running_balance: PASSED");

        // transaction boundary tests
        test_dropped_transaction_rolls_back($store).await;
        println!("  test_dropped_transaction_rolls_back: PASSED");

        test_staged_grant_visible_in_transaction($store).await;
        println!("  test_staged_grant_visible_in_transaction: PASSED");

        // eligibility tests
        test_has_grant_since_is_strict($store).await;
        println!("  test_has_grant_since_is_strict: PASSED");

        test_has_grant_since_filters_reason_and_user($store).await;
        println!("  test_has_grant_since_filters_reason_and_user: PASSED");

        // history tests
        test_transactions_newest_first($store).await;
        println!("  test_transactions_newest_first: PASSED");

        test_transactions_empty($store).await;
        println!("  test_transactions_empty: PASSED");

        // streak tests
        test_streak_missing($store).await;
        println!("  test_streak_missing: PASSED");

        test_streak_save_and_reload($store).await;
        println!("  test_streak_save_and_reload: PASSED");

        test_streak_overwrite($store).await;
        println!("  test_streak_overwrite: PASSED");

        // concurrency tests
        test_locked_recheck_grants_once($store).await;
        println!("  test_locked_recheck_grants_once: PASSED");

        test_cancelled_waiting_writer_leaves_store_usable($store).await;
        println!("  test_cancelled_waiting_writer_leaves_store_usable: PASSED");
    };
}
