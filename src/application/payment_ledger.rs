//! PaymentLedger - reconciles gateway callbacks into captured payments
//! and triggers the purpose-specific grant.
//!
//! # Capture protocol
//!
//! 1. Look up the payment by external order id
//! 2. Verify the callback signature; on mismatch log a security event and
//!    stop without touching any state
//! 3. Conditionally move `created -> captured`; a row that is already
//!    captured is returned unchanged
//! 4. Only the call that performed the capture runs the grant, so duplicate
//!    callbacks produce exactly one grant
//!
//! Capture and grant are not atomic. If the grant fails after capture, the
//! payment stays captured, its grant status is set to `failed`, and the
//! caller receives `GrantFailedAfterCapture`. Nothing retries it. A row left
//! `captured` with a `pending` grant (crash between the two steps, or a lost
//! grant-status write) is listed for reconciliation once it is older than
//! the grant grace window.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::domain::access::EntitlementGranted;
use crate::domain::foundation::{Currency, ItemId, Money, PaymentId, Timestamp, UserId};
use crate::domain::payment::{GrantStatus, Payment, PaymentPurpose};
use crate::domain::subscription::PlanCatalog;
use crate::ports::{
    CaptureOutcome, EventPublisher, ExternalOrderRequest, ItemRepository, PaymentGateway,
    PaymentRepository,
};

use super::{EngineError, OwnershipGrantor, SubscriptionLifecycle};

/// Command to open a payment.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub user_id: UserId,
    pub amount: Money,
    /// "subscription" or "item_purchase".
    pub purpose: String,
    /// Required when purpose is "subscription".
    pub plan: Option<String>,
    /// Required when purpose is "item_purchase".
    pub item_id: Option<ItemId>,
}

/// Gateway callback to verify and capture.
#[derive(Debug, Clone)]
pub struct VerifyPaymentCommand {
    pub external_order_id: String,
    pub external_payment_id: String,
    pub signature: String,
}

pub struct PaymentLedger {
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    items: Arc<dyn ItemRepository>,
    subscriptions: Arc<SubscriptionLifecycle>,
    ownership: Arc<OwnershipGrantor>,
    events: Arc<dyn EventPublisher>,
    plans: PlanCatalog,
    currency: Currency,
    grant_grace: Duration,
}

/// How long a captured payment may sit with a pending grant before it is
/// treated as stalled.
pub const DEFAULT_GRANT_GRACE: Duration = Duration::from_secs(300);

impl PaymentLedger {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        items: Arc<dyn ItemRepository>,
        subscriptions: Arc<SubscriptionLifecycle>,
        ownership: Arc<OwnershipGrantor>,
        events: Arc<dyn EventPublisher>,
        plans: PlanCatalog,
        currency: Currency,
    ) -> Self {
        Self {
            payments,
            gateway,
            items,
            subscriptions,
            ownership,
            events,
            plans,
            currency,
            grant_grace: DEFAULT_GRANT_GRACE,
        }
    }

    pub fn with_grant_grace(mut self, grace: Duration) -> Self {
        self.grant_grace = grace;
        self
    }

    /// Opens a gateway order and records a `created` payment for it.
    pub async fn create_order(&self, cmd: CreateOrderCommand) -> Result<Payment, EngineError> {
        let purpose = PaymentPurpose::from_parts(&cmd.purpose, cmd.plan.as_deref(), cmd.item_id)?;

        if cmd.amount.is_zero() {
            return Err(EngineError::validation("amount", "amount must be positive"));
        }
        match &purpose {
            PaymentPurpose::Subscription { plan } => {
                let plan = self.plans.require(plan)?;
                if plan.price != cmd.amount {
                    return Err(EngineError::validation(
                        "amount",
                        format!(
                            "amount {} does not match {} plan price {}",
                            cmd.amount, plan.name, plan.price
                        ),
                    ));
                }
            }
            PaymentPurpose::ItemPurchase { item_id } => {
                if self.items.find_by_id(item_id).await?.is_none() {
                    return Err(EngineError::not_found("item", item_id));
                }
            }
        }

        let payment_id = PaymentId::new();
        let external = self
            .gateway
            .create_order(ExternalOrderRequest {
                amount: cmd.amount,
                currency: self.currency.clone(),
                receipt: payment_id,
            })
            .await?;

        let payment = Payment::open(
            payment_id,
            cmd.user_id,
            external.id,
            cmd.amount,
            self.currency.clone(),
            purpose,
            Timestamp::now(),
        );
        self.payments.save(&payment).await?;

        info!(
            payment_id = %payment.id,
            user_id = %payment.user_id,
            external_order_id = %payment.external_order_id,
            purpose = payment.purpose.kind(),
            amount = %payment.amount,
            "Payment order created"
        );
        Ok(payment)
    }

    /// Verifies a gateway callback, captures the payment and grants the
    /// entitlement. Safe against duplicate delivery.
    pub async fn verify_and_capture(&self, cmd: VerifyPaymentCommand) -> Result<Payment, EngineError> {
        let payment = self
            .payments
            .find_by_external_order_id(&cmd.external_order_id)
            .await?
            .ok_or_else(|| EngineError::not_found("payment", &cmd.external_order_id))?;

        if !self.gateway.verify_signature(
            &cmd.external_order_id,
            &cmd.external_payment_id,
            &cmd.signature,
        ) {
            warn!(
                security_event = true,
                payment_id = %payment.id,
                user_id = %payment.user_id,
                external_order_id = %cmd.external_order_id,
                external_payment_id = %cmd.external_payment_id,
                "Payment signature mismatch; callback rejected"
            );
            return Err(EngineError::SignatureInvalid {
                external_order_id: cmd.external_order_id,
            });
        }

        if payment.is_captured() {
            self.report_replay(&payment);
            return Ok(payment);
        }

        let outcome = self
            .payments
            .capture(
                &cmd.external_order_id,
                &cmd.external_payment_id,
                &cmd.signature,
                Timestamp::now(),
            )
            .await?;

        let mut payment = match outcome {
            CaptureOutcome::AlreadyCaptured(existing) => {
                info!(payment_id = %existing.id, "Concurrent capture won; returning existing");
                return Ok(existing);
            }
            CaptureOutcome::Captured(captured) => captured,
        };
        info!(
            payment_id = %payment.id,
            external_payment_id = %cmd.external_payment_id,
            "Payment captured"
        );

        match self.grant(&payment).await {
            Ok(event) => {
                self.record_grant(&mut payment, GrantStatus::Granted).await;
                self.publish(event).await;
                Ok(payment)
            }
            Err(grant_err) => {
                error!(
                    reconciliation_required = true,
                    payment_id = %payment.id,
                    user_id = %payment.user_id,
                    external_order_id = %payment.external_order_id,
                    purpose = payment.purpose.kind(),
                    error = %grant_err,
                    "Payment captured but entitlement grant failed"
                );
                self.record_grant(&mut payment, GrantStatus::Failed).await;
                Err(EngineError::GrantFailedAfterCapture {
                    payment_id: payment.id,
                    reason: grant_err.to_string(),
                })
            }
        }
    }

    /// Records a failed attempt. Only `created` payments can fail.
    pub async fn mark_failed(
        &self,
        external_order_id: &str,
        reason: &str,
    ) -> Result<Payment, EngineError> {
        let payment = self
            .payments
            .mark_failed(external_order_id, reason, Timestamp::now())
            .await?;
        info!(
            payment_id = %payment.id,
            external_order_id = %external_order_id,
            reason = %reason,
            "Payment marked failed"
        );
        Ok(payment)
    }

    /// Captured payments with no entitlement behind them: grant failed, or
    /// still pending past the grace window.
    pub async fn pending_reconciliation(&self) -> Result<Vec<Payment>, EngineError> {
        let stalled_before = Timestamp::now().minus(self.grant_grace);
        Ok(self.payments.list_pending_reconciliation(stalled_before).await?)
    }

    fn report_replay(&self, payment: &Payment) {
        let stalled_before = Timestamp::now().minus(self.grant_grace);
        if payment.needs_reconciliation(&stalled_before) {
            error!(
                reconciliation_required = true,
                payment_id = %payment.id,
                user_id = %payment.user_id,
                external_order_id = %payment.external_order_id,
                grant_status = payment.grant_status.as_str(),
                "Callback replayed for captured payment without entitlement"
            );
        } else {
            info!(payment_id = %payment.id, "Duplicate capture ignored");
        }
    }

    async fn grant(&self, payment: &Payment) -> Result<EntitlementGranted, EngineError> {
        match &payment.purpose {
            PaymentPurpose::Subscription { plan } => {
                let plan = self.plans.require(plan)?;
                let subscription = self.subscriptions.activate(&payment.user_id, plan).await?;
                Ok(EntitlementGranted::SubscriptionActivated {
                    user_id: subscription.user_id,
                    subscription_id: subscription.id,
                    plan: subscription.plan,
                    end_at: subscription.end_at,
                    payment_id: Some(payment.id),
                })
            }
            PaymentPurpose::ItemPurchase { item_id } => {
                let record = self
                    .ownership
                    .grant(&payment.user_id, item_id, Some(payment.id))
                    .await?;
                Ok(EntitlementGranted::ItemPurchased {
                    user_id: record.user_id,
                    item_id: record.item_id,
                    ownership_id: record.id,
                    payment_id: Some(payment.id),
                })
            }
        }
    }

    async fn record_grant(&self, payment: &mut Payment, status: GrantStatus) {
        let now = Timestamp::now();
        match self.payments.record_grant(&payment.id, status, now).await {
            Ok(()) => {
                payment.grant_status = status;
                payment.updated_at = now;
            }
            Err(e) => error!(
                reconciliation_required = status == GrantStatus::Failed,
                payment_id = %payment.id,
                grant_status = status.as_str(),
                error = %e,
                "Failed to record grant outcome"
            ),
        }
    }

    /// Publish failures never undo a grant.
    async fn publish(&self, event: EntitlementGranted) {
        let envelope = match event.to_envelope() {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Failed to serialize entitlement event");
                return;
            }
        };
        let event_type = envelope.event_type.clone();
        if let Err(e) = self.events.publish(envelope).await {
            warn!(event_type = %event_type, error = %e, "Failed to publish entitlement event");
        }
    }
}
