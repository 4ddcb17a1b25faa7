use purse::application::engine::LedgerEngine;
use purse::domain::account::Amount;
use purse::domain::entry::signed_total;
use purse::error::WalletError;
use purse::infrastructure::in_memory::{InMemoryAccountStore, InMemoryTransactionLog};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn engine() -> Arc<LedgerEngine> {
    Arc::new(LedgerEngine::new(
        Box::new(InMemoryAccountStore::new()),
        Box::new(InMemoryTransactionLog::new()),
    ))
}

fn amount(value: Decimal) -> Amount {
    Amount::new(value).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deposits_all_land() {
    let engine = engine();
    let alice = engine.register("Alice", "a@x.com", "p").await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..100 {
        let engine = Arc::clone(&engine);
        let id = alice.id;
        handles.push(tokio::spawn(async move {
            engine.deposit(id, amount(dec!(1))).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(
        engine.balance_of(alice.id).await.unwrap().value(),
        dec!(100)
    );
    assert_eq!(engine.history(alice.id).await.unwrap().len(), 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_withdrawals_never_overdraw() {
    let engine = engine();
    let alice = engine.register("Alice", "a@x.com", "p").await.unwrap();
    engine.deposit(alice.id, amount(dec!(10))).await.unwrap();

    // 20 concurrent unit withdrawals against a balance of 10: exactly 10
    // succeed, the rest fail with InsufficientFunds.
    let mut handles = Vec::new();
    for _ in 0..20 {
        let engine = Arc::clone(&engine);
        let id = alice.id;
        handles.push(tokio::spawn(async move {
            engine.withdraw(id, amount(dec!(1))).await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(WalletError::InsufficientFunds { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 10);
    let balance = engine.balance_of(alice.id).await.unwrap();
    assert_eq!(balance.value(), Decimal::ZERO);
    // One deposit entry plus exactly one entry per successful withdrawal.
    assert_eq!(engine.history(alice.id).await.unwrap().len(), 11);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_opposite_transfers_do_not_deadlock() {
    let engine = engine();
    let alice = engine.register("Alice", "a@x.com", "p").await.unwrap();
    let bob = engine.register("Bob", "b@x.com", "p").await.unwrap();
    engine.deposit(alice.id, amount(dec!(100))).await.unwrap();
    engine.deposit(bob.id, amount(dec!(100))).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..25 {
        let forward = Arc::clone(&engine);
        let backward = Arc::clone(&engine);
        let (alice_id, bob_id) = (alice.id, bob.id);
        handles.push(tokio::spawn(async move {
            forward.transfer(alice_id, "b@x.com", amount(dec!(1))).await
        }));
        handles.push(tokio::spawn(async move {
            backward.transfer(bob_id, "a@x.com", amount(dec!(1))).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Equal flows in both directions cancel out; nothing was created or
    // destroyed along the way.
    assert_eq!(
        engine.balance_of(alice.id).await.unwrap().value(),
        dec!(100)
    );
    assert_eq!(engine.balance_of(bob.id).await.unwrap().value(), dec!(100));
    for id in [alice.id, bob.id] {
        let history = engine.history(id).await.unwrap();
        assert_eq!(
            engine.balance_of(id).await.unwrap().value(),
            signed_total(&history)
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_transfer_storm_conserves_total() {
    let engine = engine();
    let emails = ["a@x.com", "b@x.com", "c@x.com", "d@x.com"];
    let mut ids = Vec::new();
    for (i, email) in emails.iter().enumerate() {
        let account = engine
            .register(&format!("User{i}"), email, "p")
            .await
            .unwrap();
        engine.deposit(account.id, amount(dec!(50))).await.unwrap();
        ids.push(account.id);
    }

    let mut handles = Vec::new();
    for round in 0..60 {
        let engine = Arc::clone(&engine);
        let sender = ids[round % ids.len()];
        let recipient = emails[(round + 1) % emails.len()].to_string();
        handles.push(tokio::spawn(async move {
            engine.transfer(sender, &recipient, amount(dec!(2))).await
        }));
    }
    for handle in handles {
        // Ring transfers may transiently drain an account; that is a valid
        // InsufficientFunds outcome, not a consistency violation.
        match handle.await.unwrap() {
            Ok(_) | Err(WalletError::InsufficientFunds { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let mut total = Decimal::ZERO;
    for id in &ids {
        let balance = engine.balance_of(*id).await.unwrap();
        let history = engine.history(*id).await.unwrap();
        assert_eq!(balance.value(), signed_total(&history));
        total += balance.value();
    }
    assert_eq!(total, dec!(200));
}
