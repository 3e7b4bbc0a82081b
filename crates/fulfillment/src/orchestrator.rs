use datashop_routing::SupplierRouter;
use datashop_store::{OrderStore, PackageStore, StoreError};
use datashop_suppliers::PurchaseRequest;
use datashop_types::{FulfillmentStatus, PaymentStatus, SupplierId};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

// ═══════════════════════════════════════════════════════════════════════════
// ERROR TYPES
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum FulfillError {
    #[error("order not found: {order_id}")]
    OrderNotFound { order_id: String },

    #[error("package {package_id} not found for order {order_id}")]
    PackageNotFound {
        order_id: String,
        package_id: String,
    },

    #[error("store error: {source}")]
    Store {
        #[from]
        source: StoreError,
    },
}

/// What a fulfillment attempt did.
#[derive(Debug, Clone, PartialEq)]
pub enum FulfillmentOutcome {
    /// The supplier accepted the purchase.
    Fulfilled {
        supplier: SupplierId,
        supplier_reference: String,
    },
    /// The supplier rejected the purchase; the order is marked failed
    /// and can be retried.
    Failed {
        supplier: SupplierId,
        message: String,
    },
    /// Another attempt already owns this order, or it is already done.
    AlreadyHandled { status: FulfillmentStatus },
}

// ═══════════════════════════════════════════════════════════════════════════
// FULFILLMENT ORCHESTRATOR
// ═══════════════════════════════════════════════════════════════════════════

/// Drives a paid order through supplier delivery.
///
/// Every attempt starts by claiming the order with a conditional
/// `pending|failed -> processing` store write, so duplicate payment
/// webhooks and concurrent retries collapse to a single supplier call.
/// Whatever happens after the claim, the attempt ends with the order in
/// a terminal state for this round: `fulfilled` or `failed`, never
/// parked at `processing`.
pub struct FulfillmentOrchestrator {
    orders: Arc<dyn OrderStore>,
    packages: Arc<dyn PackageStore>,
    router: Arc<SupplierRouter>,
}

impl FulfillmentOrchestrator {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        packages: Arc<dyn PackageStore>,
        router: Arc<SupplierRouter>,
    ) -> Self {
        Self {
            orders,
            packages,
            router,
        }
    }

    /// Attempt delivery for one order.
    pub async fn fulfill(&self, order_id: &str) -> Result<FulfillmentOutcome, FulfillError> {
        let order = self
            .orders
            .order(order_id)
            .await?
            .ok_or_else(|| FulfillError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;

        // Cheap pre-check; the claim below is what actually closes the race.
        if !order.fulfillment_status.is_retriable() {
            info!(
                order_id = %order.id,
                status = %order.fulfillment_status,
                "skipping fulfillment, order already handled"
            );
            return Ok(FulfillmentOutcome::AlreadyHandled {
                status: order.fulfillment_status,
            });
        }

        // The package must exist before we claim: a missing package means
        // a data problem the admin has to fix, and the order keeps its
        // current fulfillment state until then.
        let package = self.packages.package(&order.package_id).await?.ok_or_else(|| {
            FulfillError::PackageNotFound {
                order_id: order.id.clone(),
                package_id: order.package_id.clone(),
            }
        })?;

        if !self.orders.claim_for_fulfillment(&order.id).await? {
            let current = self
                .orders
                .order(&order.id)
                .await?
                .map(|o| o.fulfillment_status)
                .unwrap_or(FulfillmentStatus::Processing);
            info!(
                order_id = %order.id,
                status = %current,
                "lost fulfillment claim to a concurrent attempt"
            );
            return Ok(FulfillmentOutcome::AlreadyHandled { status: current });
        }

        let request = PurchaseRequest {
            phone_number: order.phone_number.clone(),
            data_amount: package.data_amount,
            // Supplier gets the wholesale cost, never the customer price.
            price: package.supplier_cost,
            order_reference: order.payment_reference.clone(),
        };

        info!(
            order_id = %order.id,
            reference = %order.payment_reference,
            data_amount = %package.data_amount,
            "placing supplier purchase"
        );

        let routed = self.router.purchase(&request).await;

        if routed.result.success {
            // Fall back to our own reference when the supplier response
            // carries no transaction id of its own.
            let supplier_reference = routed
                .result
                .supplier_reference()
                .unwrap_or_else(|| order.payment_reference.clone());

            if let Err(e) = self
                .orders
                .record_fulfillment_success(&order.id, &supplier_reference)
                .await
            {
                // The bundle was delivered but we could not record it.
                // Park the order at failed so it surfaces for manual review
                // instead of sitting at processing forever.
                self.fail_quietly(&order.id, "delivered but status write failed")
                    .await;
                return Err(e.into());
            }

            info!(
                order_id = %order.id,
                supplier = %routed.supplier,
                supplier_reference = %supplier_reference,
                "order fulfilled"
            );
            Ok(FulfillmentOutcome::Fulfilled {
                supplier: routed.supplier,
                supplier_reference,
            })
        } else {
            warn!(
                order_id = %order.id,
                supplier = %routed.supplier,
                message = %routed.result.message,
                "supplier rejected purchase"
            );
            if let Err(e) = self
                .orders
                .record_fulfillment_failure(&order.id, &routed.result.message)
                .await
            {
                // A propagated error must not leave the order claimed:
                // nothing can reclaim a processing order, so retry the
                // write before giving up.
                self.fail_quietly(&order.id, &routed.result.message).await;
                return Err(e.into());
            }
            Ok(FulfillmentOutcome::Failed {
                supplier: routed.supplier,
                message: routed.result.message,
            })
        }
    }

    /// Best-effort failure write used when a fulfillment-state write has
    /// already gone wrong once; at that point there is nothing better to
    /// do with a second error than log it.
    async fn fail_quietly(&self, order_id: &str, reason: &str) {
        if let Err(e) = self.orders.record_fulfillment_failure(order_id, reason).await {
            error!(order_id = %order_id, error = %e, "failed to record fulfillment failure");
        }
    }

    /// Admin-triggered retry of a failed (or still pending) order. Same
    /// path as the initial attempt; the claim makes it safe to call at
    /// any time.
    pub async fn retry(&self, order_id: &str) -> Result<FulfillmentOutcome, FulfillError> {
        self.fulfill(order_id).await
    }

    /// Payment-confirmed entry point (webhook handler calls this).
    ///
    /// Marks the order's payment completed, then kicks off fulfillment in
    /// the background so the webhook response never waits on a supplier.
    pub async fn handle_payment_success(
        self: &Arc<Self>,
        payment_reference: &str,
    ) -> Result<(), FulfillError> {
        let order = self
            .orders
            .order_by_reference(payment_reference)
            .await?
            .ok_or_else(|| FulfillError::OrderNotFound {
                order_id: payment_reference.to_string(),
            })?;

        self.orders
            .update_payment_status(&order.id, PaymentStatus::Completed)
            .await?;

        info!(
            order_id = %order.id,
            reference = %payment_reference,
            "payment confirmed, starting fulfillment"
        );

        let orchestrator = Arc::clone(self);
        let order_id = order.id.clone();
        tokio::spawn(async move {
            match orchestrator.fulfill(&order_id).await {
                Ok(FulfillmentOutcome::Failed { supplier, message }) => {
                    warn!(
                        order_id = %order_id,
                        supplier = %supplier,
                        message = %message,
                        "background fulfillment failed"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    error!(order_id = %order_id, error = %e, "background fulfillment error");
                }
            }
        });

        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════
