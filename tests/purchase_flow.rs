//! End-to-end purchase flows against the in-memory adapters.
//!
//! Order creation, gateway callback, capture, grant, then a read that must
//! reflect the new entitlement.

use std::sync::Arc;

use entitlement_engine::adapters::memory::{
    InMemoryItemRepository, InMemoryOwnershipRepository, InMemoryPaymentRepository,
    InMemorySubscriptionCache, InMemorySubscriptionRepository,
};
use entitlement_engine::adapters::{InMemoryEventPublisher, InMemoryStorageProvider, MockPaymentGateway};
use entitlement_engine::application::{
    ContentAccessIssuer, ContentReader, CreateOrderCommand, DeliveryPolicy, EngineError,
    EntitlementResolver, OwnershipGrantor, PaymentLedger, SubscriptionLifecycle,
    VerifyPaymentCommand,
};
use entitlement_engine::domain::access::{AccessReason, AccessTier, Actor};
use entitlement_engine::domain::catalog::{ContentRef, Item, Visibility};
use entitlement_engine::domain::foundation::{Currency, ItemId, Money, UserId};
use entitlement_engine::domain::payment::{GrantStatus, PaymentStatus};
use entitlement_engine::domain::subscription::PlanCatalog;
use entitlement_engine::ports::PaymentRepository;

const GATEWAY_SECRET: &str = "test_gateway_secret";

struct Engine {
    gateway: Arc<MockPaymentGateway>,
    payments: Arc<InMemoryPaymentRepository>,
    events: Arc<InMemoryEventPublisher>,
    storage: Arc<InMemoryStorageProvider>,
    subscriptions: Arc<SubscriptionLifecycle>,
    ledger: PaymentLedger,
    reader: ContentReader,
    book: Item,
}

fn money(minor: i64) -> Money {
    Money::from_minor(minor).unwrap()
}

fn plans() -> PlanCatalog {
    PlanCatalog::standard(money(19_900), money(49_900), money(89_900), money(159_900))
}

async fn engine() -> Engine {
    let gateway = Arc::new(MockPaymentGateway::new(GATEWAY_SECRET));
    let payments = Arc::new(InMemoryPaymentRepository::new());
    let events = Arc::new(InMemoryEventPublisher::new());
    let items = Arc::new(InMemoryItemRepository::new());
    let storage = Arc::new(InMemoryStorageProvider::new("https://cdn.test/authenticated"));

    let book = Item::new(
        ItemId::new(),
        "Rust in Practice",
        Visibility::Premium,
        ContentRef::new("books/rust-in-practice.pdf").unwrap(),
    );
    items.insert(book.clone()).await;
    storage.put_asset(&book.content_ref, 240).await;

    let subscriptions = Arc::new(SubscriptionLifecycle::new(
        Arc::new(InMemorySubscriptionRepository::new()),
        Arc::new(InMemorySubscriptionCache::new()),
    ));
    let grantor = Arc::new(OwnershipGrantor::new(Arc::new(
        InMemoryOwnershipRepository::new(),
    )));

    let ledger = PaymentLedger::new(
        payments.clone(),
        gateway.clone(),
        items.clone(),
        subscriptions.clone(),
        grantor.clone(),
        events.clone(),
        plans(),
        Currency::new("INR").unwrap(),
    );
    let resolver = Arc::new(EntitlementResolver::new(grantor, subscriptions.clone()));
    let issuer = Arc::new(ContentAccessIssuer::new(
        storage.clone(),
        items.clone(),
        DeliveryPolicy::default(),
    ));
    let reader = ContentReader::new(items, resolver, issuer);

    Engine {
        gateway,
        payments,
        events,
        storage,
        subscriptions,
        ledger,
        reader,
        book,
    }
}

fn buy_item(user: &UserId, item_id: ItemId, amount: i64) -> CreateOrderCommand {
    CreateOrderCommand {
        user_id: user.clone(),
        amount: money(amount),
        purpose: "item_purchase".to_string(),
        plan: None,
        item_id: Some(item_id),
    }
}

fn subscribe(user: &UserId, plan: &str, amount: i64) -> CreateOrderCommand {
    CreateOrderCommand {
        user_id: user.clone(),
        amount: money(amount),
        purpose: "subscription".to_string(),
        plan: Some(plan.to_string()),
        item_id: None,
    }
}

fn callback(e: &Engine, external_order_id: &str, external_payment_id: &str) -> VerifyPaymentCommand {
    VerifyPaymentCommand {
        external_order_id: external_order_id.to_string(),
        external_payment_id: external_payment_id.to_string(),
        signature: e.gateway.sign(external_order_id, external_payment_id),
    }
}

#[tokio::test]
async fn item_purchase_unlocks_full_read() {
    let e = engine().await;
    let reader_id = UserId::new("reader-1").unwrap();
    let member = Actor::Member(reader_id.clone());

    let before = e.reader.read(&member, &e.book.id).await.unwrap();
    assert_eq!(before.decision.tier, AccessTier::Preview);
    assert!(before.artifact.is_preview);
    assert!(before.artifact.url.contains("pg_1-5"));

    let payment = e
        .ledger
        .create_order(buy_item(&reader_id, e.book.id, 29_900))
        .await
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Created);

    let captured = e
        .ledger
        .verify_and_capture(callback(&e, &payment.external_order_id, "pay_001"))
        .await
        .unwrap();
    assert_eq!(captured.status, PaymentStatus::Captured);
    assert_eq!(captured.grant_status, GrantStatus::Granted);

    let after = e.reader.read(&member, &e.book.id).await.unwrap();
    assert_eq!(after.decision.tier, AccessTier::Full);
    assert_eq!(after.decision.reason, AccessReason::Owned);
    assert!(!after.artifact.is_preview);
    assert_eq!(after.artifact.total_length, 240);
    assert!(!after.artifact.url.contains("pg_1-"));

    assert_eq!(
        e.events.published_types().await,
        vec!["entitlement.item_purchased.v1".to_string()]
    );
}

#[tokio::test]
async fn subscription_unlocks_every_premium_item() {
    let e = engine().await;
    let reader_id = UserId::new("reader-2").unwrap();

    let payment = e
        .ledger
        .create_order(subscribe(&reader_id, "quarterly", 49_900))
        .await
        .unwrap();
    e.ledger
        .verify_and_capture(callback(&e, &payment.external_order_id, "pay_002"))
        .await
        .unwrap();

    let current = e.subscriptions.current_for(&reader_id).await.unwrap().unwrap();
    assert_eq!(current.plan, "quarterly");

    let access = e
        .reader
        .read(&Actor::Member(reader_id), &e.book.id)
        .await
        .unwrap();
    assert_eq!(access.decision.reason, AccessReason::Subscribed);
    assert_eq!(
        e.events.published_types().await,
        vec!["entitlement.subscription_activated.v1".to_string()]
    );
}

#[tokio::test]
async fn duplicate_callback_grants_once() {
    let e = engine().await;
    let reader_id = UserId::new("reader-3").unwrap();
    let payment = e
        .ledger
        .create_order(buy_item(&reader_id, e.book.id, 29_900))
        .await
        .unwrap();

    let cmd = callback(&e, &payment.external_order_id, "pay_003");
    let (first, second) = tokio::join!(
        e.ledger.verify_and_capture(cmd.clone()),
        e.ledger.verify_and_capture(cmd.clone())
    );
    let third = e.ledger.verify_and_capture(cmd).await;

    for result in [first, second, third] {
        assert_eq!(result.unwrap().status, PaymentStatus::Captured);
    }
    assert_eq!(e.events.published().await.len(), 1);
}

#[tokio::test]
async fn forged_callback_is_rejected_and_grants_nothing() {
    let e = engine().await;
    let reader_id = UserId::new("reader-4").unwrap();
    let payment = e
        .ledger
        .create_order(buy_item(&reader_id, e.book.id, 29_900))
        .await
        .unwrap();

    let mut cmd = callback(&e, &payment.external_order_id, "pay_004");
    cmd.external_payment_id = "pay_other".to_string();
    let err = e.ledger.verify_and_capture(cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::SignatureInvalid { .. }));

    let stored = e
        .payments
        .find_by_external_order_id(&payment.external_order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, PaymentStatus::Created);

    let access = e
        .reader
        .read(&Actor::Member(reader_id), &e.book.id)
        .await
        .unwrap();
    assert_eq!(access.decision.tier, AccessTier::Preview);
    assert!(e.events.published().await.is_empty());
}

#[tokio::test]
async fn failed_payment_cannot_be_captured_later() {
    let e = engine().await;
    let reader_id = UserId::new("reader-5").unwrap();
    let payment = e
        .ledger
        .create_order(subscribe(&reader_id, "monthly", 19_900))
        .await
        .unwrap();

    let failed = e
        .ledger
        .mark_failed(&payment.external_order_id, "card declined")
        .await
        .unwrap();
    assert_eq!(failed.status, PaymentStatus::Failed);

    let err = e
        .ledger
        .verify_and_capture(callback(&e, &payment.external_order_id, "pay_005"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict { .. }));
    assert!(e.subscriptions.current_for(&reader_id).await.unwrap().is_none());
}

#[tokio::test]
async fn anonymous_reader_gets_preview_only() {
    let e = engine().await;
    let access = e.reader.read(&Actor::Anonymous, &e.book.id).await.unwrap();

    assert_eq!(access.decision.tier, AccessTier::Preview);
    assert!(access.artifact.is_preview);
    assert!(!access.artifact.is_degraded());
    assert!(e.storage.sign_calls().await >= 1);
}
