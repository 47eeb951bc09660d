//! Marketplace settlement through the public API.

use std::sync::Arc;

use entitlement_engine::adapters::memory::InMemoryOrderRepository;
use entitlement_engine::application::{EngineError, EscrowLedger};
use entitlement_engine::config::EscrowConfig;
use entitlement_engine::domain::escrow::{
    DeliveryStatus, EscrowStatus, Order, OrderPaymentStatus,
};
use entitlement_engine::domain::foundation::{Money, UserId};
use entitlement_engine::ports::OrderRepository;

fn paid_and_delivered(total: i64) -> Order {
    let mut order = Order::marketplace(
        UserId::new("buyer-1").unwrap(),
        Money::from_minor(total).unwrap(),
    );
    order.payment_status = OrderPaymentStatus::Paid;
    order.delivery_status = DeliveryStatus::Delivered;
    order
}

async fn ledger(orders: &[Order], commission_bps: u32) -> (EscrowLedger, Arc<InMemoryOrderRepository>) {
    let repo = Arc::new(InMemoryOrderRepository::new());
    for order in orders {
        repo.insert(order.clone()).await;
    }
    let rate = EscrowConfig { commission_bps }.commission_rate().unwrap();
    (EscrowLedger::new(repo.clone(), rate), repo)
}

#[tokio::test]
async fn release_settles_with_configured_commission() {
    let order = paid_and_delivered(12_345);
    let (ledger, repo) = ledger(&[order.clone()], 250).await;

    let settlement = ledger.release(&order.id).await.unwrap();
    assert_eq!(settlement.commission.minor_units(), 309);
    assert_eq!(settlement.payout.minor_units(), 12_036);
    assert_eq!(settlement.commission_rate_bps, 250);

    let stored = repo.find_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.escrow_status, Some(EscrowStatus::Released));
    assert_eq!(stored.settlement, Some(settlement));
}

#[tokio::test]
async fn dispute_then_refund_returns_funds() {
    let order = paid_and_delivered(50_000);
    let (ledger, repo) = ledger(&[order.clone()], 500).await;

    let disputed = ledger.dispute(&order.id).await.unwrap();
    assert_eq!(disputed.escrow_status, Some(EscrowStatus::Disputed));

    let err = ledger.release(&order.id).await.unwrap_err();
    assert!(matches!(err, EngineError::StateConflict { .. }));

    let refunded = ledger.refund(&order.id).await.unwrap();
    assert_eq!(refunded.escrow_status, Some(EscrowStatus::Refunded));
    assert_eq!(refunded.payment_status, OrderPaymentStatus::Refunded);

    let stored = repo.find_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.settlement, None);
    assert_eq!(stored.payment_status, OrderPaymentStatus::Refunded);
}

#[tokio::test]
async fn racing_release_and_refund_settle_exactly_one_way() {
    let order = paid_and_delivered(100_000);
    let (ledger, repo) = ledger(&[order.clone()], 500).await;

    let (released, refunded) = tokio::join!(ledger.release(&order.id), ledger.refund(&order.id));
    assert!(released.is_ok() != refunded.is_ok());

    let stored = repo.find_by_id(&order.id).await.unwrap().unwrap();
    match stored.escrow_status {
        Some(EscrowStatus::Released) => {
            assert!(released.is_ok());
            assert!(stored.settlement.is_some());
        }
        Some(EscrowStatus::Refunded) => {
            assert!(refunded.is_ok());
            assert!(stored.settlement.is_none());
        }
        other => panic!("unexpected escrow status {:?}", other),
    }
}

#[tokio::test]
async fn orders_settle_independently() {
    let first = paid_and_delivered(10_000);
    let second = paid_and_delivered(20_000);
    let (ledger, repo) = ledger(&[first.clone(), second.clone()], 500).await;

    ledger.release(&first.id).await.unwrap();
    ledger.dispute(&second.id).await.unwrap();

    let first = repo.find_by_id(&first.id).await.unwrap().unwrap();
    let second = repo.find_by_id(&second.id).await.unwrap().unwrap();
    assert_eq!(first.escrow_status, Some(EscrowStatus::Released));
    assert_eq!(second.escrow_status, Some(EscrowStatus::Disputed));
}
