use std::fmt::Debug;

use dealer_common::Cents;
use log::*;

use crate::{
    db_types::{Order, OrderDetails, OrderId, PaymentMethod, PaymentSettlement},
    documents::DocumentGenerator,
    engine_api::{
        errors::{OrderApiError, SettlementError},
        settlement_objects::{NotificationStatus, PaymentSignal, ProviderPaymentStatus, SettlementOutcome},
    },
    events::{EventProducers, NotificationFailedEvent, OrderSettledEvent},
    notifications::{DeliveryStatus, Notifier},
    traits::{CheckoutSession, CheckoutSessions, CheckoutUrls, OrderStore},
};

/// `SettlementApi` is the settlement coordinator. It handles payment-completion signals from the redirect checkout
/// flow and from provider webhooks.
///
/// Every path funnels into [`OrderStore::try_mark_order_settled`]. That conditional write is the only serialisation
/// point; there are no in-process locks, so any number of instances may run side by side against the same store.
pub struct SettlementApi<B, S, D, N> {
    db: B,
    sessions: S,
    documents: D,
    notifier: N,
    producers: EventProducers,
    strict_mode: bool,
}

impl<B, S, D, N> Debug for SettlementApi<B, S, D, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi (strict_mode: {})", self.strict_mode)
    }
}

impl<B, S, D, N> SettlementApi<B, S, D, N> {
    pub fn new(db: B, sessions: S, documents: D, notifier: N, producers: EventProducers) -> Self {
        Self { db, sessions, documents, notifier, producers, strict_mode: true }
    }

    /// In strict mode (the default), a webhook must carry an explicit order id. With strict mode off, a webhook with
    /// no order id falls back to matching the payer's email address, but only when that address has exactly one unpaid
    /// order.
    pub fn with_strict_mode(mut self, strict_mode: bool) -> Self {
        self.strict_mode = strict_mode;
        self
    }

    pub fn strict_mode(&self) -> bool {
        self.strict_mode
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B, S, D, N> SettlementApi<B, S, D, N>
where
    B: OrderStore,
    S: CheckoutSessions,
    D: DocumentGenerator,
    N: Notifier,
{
    /// Handles the customer landing back on the storefront after a redirect checkout.
    ///
    /// The session is fetched from the provider, never trusted from the query string. It must belong to `order_id`
    /// and must report the payment as paid. Reloading the confirmation page is harmless; the second call returns
    /// [`SettlementOutcome::AlreadySettled`].
    pub async fn confirm_checkout_session(
        &self,
        session_id: &str,
        order_id: &OrderId,
    ) -> Result<SettlementOutcome, SettlementError> {
        trace!("🔄️💳️ Confirming checkout session {session_id} for order {order_id}");
        let session = self.sessions.retrieve_session(session_id).await?;
        if session.order_id.as_ref() != Some(order_id) {
            warn!(
                "🔄️💳️ Checkout session {session_id} is linked to order {:?}, but confirmation was requested for \
                 {order_id}",
                session.order_id
            );
            return Err(SettlementError::MetadataMismatch {
                session_id: session_id.to_string(),
                expected: order_id.clone(),
                found: session.order_id,
            });
        }
        if !session.payment_status.is_paid() {
            info!("🔄️💳️ Checkout session {session_id} is {:?}. Order {order_id} is not settled.", session.payment_status);
            return Err(SettlementError::PaymentNotConfirmed(session_id.to_string()));
        }
        let order = self.fetch_order(order_id).await?;
        check_amount(&order, &session)?;
        let settlement = PaymentSettlement::new(PaymentMethod::Stripe, session_id);
        self.settle_order(order, settlement).await
    }

    /// Handles a verified, normalised webhook notification from either provider.
    pub async fn process_payment_signal(&self, signal: PaymentSignal) -> Result<SettlementOutcome, SettlementError> {
        trace!("🔄️💳️ Processing {} payment signal {}", signal.method, signal.reference);
        if signal.status != ProviderPaymentStatus::Completed {
            info!("🔄️💳️ {} payment {} is {:?}. No order will be settled.", signal.method, signal.reference, signal.status);
            return Err(SettlementError::PaymentNotConfirmed(signal.reference));
        }
        let order = self.resolve_order(&signal).await?;
        if let (Some(amount), Some(currency)) = (signal.amount, signal.currency.as_deref()) {
            check_paid_amount(&order, amount, currency)?;
        }
        let settlement = PaymentSettlement::new(signal.method, signal.reference);
        self.settle_order(order, settlement).await
    }

    /// Finds the order a webhook refers to.
    ///
    /// An embedded order id always wins. Otherwise, outside of strict mode, the payer's email is used, provided it
    /// identifies exactly one unpaid order.
    pub async fn resolve_order(&self, signal: &PaymentSignal) -> Result<Order, SettlementError> {
        if let Some(order_id) = &signal.order_id {
            return self.fetch_order(order_id).await;
        }
        if self.strict_mode {
            debug!("🔄️💳️ Payment {} carries no order id, and strict mode is on", signal.reference);
            return Err(SettlementError::UnmatchedPayment(format!(
                "{} payment {} does not reference an order",
                signal.method, signal.reference
            )));
        }
        let Some(email) = signal.payer_email.as_deref().map(str::trim).filter(|e| !e.is_empty()) else {
            return Err(SettlementError::UnmatchedPayment(format!(
                "{} payment {} has neither an order id nor a payer email",
                signal.method, signal.reference
            )));
        };
        let mut candidates = self.db.fetch_unpaid_orders_for_email(email).await?;
        match candidates.len() {
            0 => Err(SettlementError::UnmatchedPayment(format!("No unpaid orders for {email}"))),
            1 => {
                let order = candidates.remove(0);
                info!("🔄️💳️ Payment {} matched to order {} by payer email", signal.reference, order.order_id);
                Ok(order)
            },
            count => {
                warn!("🔄️💳️ Payment {} matches {count} unpaid orders for {email}", signal.reference);
                Err(SettlementError::AmbiguousPayer { email: email.to_string(), count })
            },
        }
    }

    /// Performs the guarded transition and, if this call won it, notifies the customer.
    ///
    /// Invoice and email failures are reported in the outcome and published as a [`NotificationFailedEvent`]. They
    /// never undo the transition.
    pub async fn settle_order(
        &self,
        order: Order,
        settlement: PaymentSettlement,
    ) -> Result<SettlementOutcome, SettlementError> {
        let method = settlement.method;
        match self.db.try_mark_order_settled(&order.order_id, &settlement).await? {
            Some(settled) => {
                info!("🔄️✅️ Order {} settled via {method} ({})", settled.order_id, settlement.reference);
                self.producers.publish_order_settled(OrderSettledEvent::new(settled.clone(), method)).await;
                let notification = self.notify_customer(&settled).await;
                Ok(SettlementOutcome::Settled { order: settled, notification })
            },
            None => {
                let order = self.fetch_order(&order.order_id).await?;
                info!(
                    "🔄️✅️ Order {} was already settled via {}. Ignoring {}",
                    order.order_id,
                    order.payment_method.map(|m| m.to_string()).unwrap_or_else(|| "unknown".into()),
                    settlement.reference
                );
                Ok(SettlementOutcome::AlreadySettled { order })
            },
        }
    }

    /// Creates a redirect checkout session for an unpaid order, embedding the order id in the session.
    pub async fn begin_checkout(&self, order_id: &OrderId, urls: &CheckoutUrls) -> Result<CheckoutSession, OrderApiError> {
        let details = self
            .db
            .fetch_order_details(order_id)
            .await?
            .ok_or_else(|| OrderApiError::OrderNotFound(order_id.clone()))?;
        if details.order.is_paid {
            return Err(OrderApiError::OrderAlreadyPaid(order_id.clone()));
        }
        let session = self.sessions.create_session(&details, urls).await?;
        info!("🔄️💳️ Checkout session {} created for order {order_id}", session.session_id);
        Ok(session)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Order, SettlementError> {
        self.db.fetch_order(order_id).await?.ok_or_else(|| SettlementError::OrderNotFound(order_id.clone()))
    }

    async fn notify_customer(&self, order: &Order) -> NotificationStatus {
        let status = match self.send_invoice(order).await {
            Ok(DeliveryStatus::Sent) => NotificationStatus::Sent,
            Ok(DeliveryStatus::Skipped) => NotificationStatus::Skipped,
            Err(reason) => {
                error!("🔄️✉️ Order {} is paid, but the customer could not be notified. {reason}", order.order_id);
                let event = NotificationFailedEvent::new(order.clone(), reason.as_str());
                self.producers.publish_notification_failed(event).await;
                NotificationStatus::Failed { reason }
            },
        };
        debug!("🔄️✉️ Notification for order {}: {status:?}", order.order_id);
        status
    }

    async fn send_invoice(&self, order: &Order) -> Result<DeliveryStatus, String> {
        let mut details: OrderDetails = self
            .db
            .fetch_order_details(&order.order_id)
            .await
            .map_err(|e| format!("Could not load order details. {e}"))?
            .ok_or_else(|| format!("Order {} disappeared after settlement", order.order_id))?;
        // The invoice always describes the order as it was settled
        details.order = order.clone();
        let invoice = self
            .documents
            .generate_invoice(&details)
            .await
            .map_err(|e| format!("Could not generate the invoice. {e}"))?;
        self.notifier
            .send_order_confirmation(&details, vec![invoice.into()])
            .await
            .map_err(|e| format!("Could not send the confirmation email. {e}"))
    }
}

fn check_amount(order: &Order, session: &CheckoutSession) -> Result<(), SettlementError> {
    match (session.amount_total, session.currency.as_deref()) {
        (Some(amount), Some(currency)) => check_paid_amount(order, amount, currency),
        _ => Ok(()),
    }
}

/// Rejects payments that are lower than the order total. Amounts in another currency cannot be compared, so they
/// are accepted with a warning.
fn check_paid_amount(order: &Order, amount: Cents, currency: &str) -> Result<(), SettlementError> {
    if !currency.eq_ignore_ascii_case(&order.currency) {
        warn!(
            "🔄️💳️ Order {} is priced in {}, but was paid in {currency}. Skipping the amount check.",
            order.order_id, order.currency
        );
        return Ok(());
    }
    if amount < order.total_price {
        warn!("🔄️💳️ Order {} costs {}, but only {amount} was paid", order.order_id, order.total_price);
        return Err(SettlementError::Underpayment {
            order_id: order.order_id.clone(),
            expected: order.total_price,
            received: amount,
        });
    }
    Ok(())
}
