//! In-memory storage integration tests.
//!
//! Run with: cargo test --test storage_memory

mod storage;

use sprout::storage::MemoryLedgerStore;

#[tokio::test]
async fn test_memory_ledger_store() {
    println!("=== Memory LedgerStore Tests ===");

    let store = MemoryLedgerStore::new();
    run_ledger_store_tests!(&store);

    println!("=== All Memory LedgerStore tests PASSED ===");
}
