use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Order status state machine
///
/// Valid state transitions:
/// - Pending -> Processing, Closed
/// - Processing -> Packaged, Closed
/// - Packaged -> Shipped
/// - Shipped -> Received
/// - Received -> Closed
/// - Closed is terminal
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created from a cart, nothing done yet
    Pending,
    /// Payment being processed
    Processing,
    /// Ready to be shipped
    Packaged,
    /// In the mail
    Shipped,
    /// Shipment received by the customer
    Received,
    /// Finalized (terminal)
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("order cannot move from {from} to {to}")]
pub struct OrderStatusError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl OrderStatus {
    /// Check if this status can transition to the target status
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, target) {
            (Pending, Processing) => true,
            (Pending, Closed) => true,
            (Processing, Packaged) => true,
            (Processing, Closed) => true,
            (Packaged, Shipped) => true,
            (Shipped, Received) => true,
            (Received, Closed) => true,
            (Closed, _) => false,
            _ => false,
        }
    }

    pub fn transition_to(&self, target: OrderStatus) -> Result<OrderStatus, OrderStatusError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(OrderStatusError {
                from: *self,
                to: target,
            })
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Closed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Packaged => "packaged",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Received => "received",
            OrderStatus::Closed => "closed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "packaged" => Ok(OrderStatus::Packaged),
            "shipped" => Ok(OrderStatus::Shipped),
            "received" => Ok(OrderStatus::Received),
            "closed" => Ok(OrderStatus::Closed),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }
}
