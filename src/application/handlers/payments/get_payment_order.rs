//! GetPaymentOrderHandler - Query handler for order status polling.

use std::sync::Arc;

use crate::domain::foundation::CallerIdentity;
use crate::domain::payments::{PaymentError, PaymentOrder, PaymentTransaction};
use crate::ports::PaymentOrderStore;

/// Query for one payment order by its id.
#[derive(Debug, Clone)]
pub struct GetPaymentOrderQuery {
    pub caller: CallerIdentity,
    pub order_id: String,
}

/// The order with its ledger rows.
#[derive(Debug, Clone)]
pub struct GetPaymentOrderResult {
    pub order: PaymentOrder,
    pub transactions: Vec<PaymentTransaction>,
}

/// Handler for reading a payment order.
///
/// Customers may only read their own orders; a foreign order id answers
/// not-found rather than confirming it exists. Operators may read any order
/// for support triage.
pub struct GetPaymentOrderHandler {
    store: Arc<dyn PaymentOrderStore>,
}

impl GetPaymentOrderHandler {
    pub fn new(store: Arc<dyn PaymentOrderStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        query: GetPaymentOrderQuery,
    ) -> Result<GetPaymentOrderResult, PaymentError> {
        let order = self
            .store
            .find_by_order_id(&query.order_id)
            .await?
            .ok_or_else(|| PaymentError::order_not_found(query.order_id.clone()))?;

        if query.caller.is_customer() && query.caller.user_id != order.user_id {
            return Err(PaymentError::order_not_found(query.order_id));
        }

        let transactions = self.store.transactions_for(&order.order_id).await?;

        Ok(GetPaymentOrderResult {
            order,
            transactions,
        })
    }
}
