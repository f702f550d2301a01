//! Payment order status state machine.
//!
//! Defines all possible order states and valid transitions according to the
//! gateway payment lifecycle.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment order status.
///
/// Represents where an order sits between creation and settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order row exists; redirect payload not yet handed to the client.
    Created,

    /// Client holds the redirect payload; gateway outcome awaited.
    Pending,

    /// Gateway confirmed capture. Settled for the finalize path.
    Paid,

    /// Gateway reported failure, or the attempt was abandoned.
    /// Settled for the finalize path.
    Failed,

    /// Money returned after a successful payment. Managed by a separate
    /// refund flow; carried here so the state machine is complete.
    Refunded,
}

impl OrderStatus {
    /// Returns true once the finalize path considers this order settled.
    ///
    /// Settled orders ignore further webhook deliveries: a success webhook
    /// for a Paid order and a failure webhook for a Failed order are both
    /// no-ops, and a late failure webhook never demotes a Paid order.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            OrderStatus::Paid | OrderStatus::Failed | OrderStatus::Refunded
        )
    }

    /// Returns true while the order occupies the one-active-order slot
    /// for its (event, user) pair.
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Created | OrderStatus::Pending)
    }

    /// Stable lowercase string form, matching the persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Failed => "failed",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl StateMachine for OrderStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            // From CREATED (a webhook may settle an order whose redirect
            // payload was never handed out)
            (Created, Pending)
                | (Created, Paid)
                | (Created, Failed)
            // From PENDING
                | (Pending, Paid)
                | (Pending, Failed)
            // From PAID
                | (Paid, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OrderStatus::*;
        match self {
            Created => vec![Pending, Paid, Failed],
            Pending => vec![Paid, Failed],
            Paid => vec![Refunded],
            Failed => vec![],
            Refunded => vec![],
        }
    }
}
