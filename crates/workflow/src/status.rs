//! Status enums and their transition graphs.
//!
//! Each enum lists its statuses in lifecycle order (main line first, the
//! cancellation branch last). `successors` is the complete one-step graph: a
//! transition `a -> b` is legal iff `b` is in `a.successors()`.

use serde::{Deserialize, Serialize};

/// A lifecycle status with a stable string key and a one-step transition graph.
pub trait StatusKey: Copy + Eq + core::fmt::Debug + Send + Sync + 'static {
    /// Every status of the kind, in registry order.
    const ALL: &'static [Self];

    /// Stable key (matches the serde representation).
    fn key(self) -> &'static str;

    /// Statuses reachable in exactly one step.
    fn successors(self) -> &'static [Self];

    /// Whether this status is the cancellation side-branch.
    fn is_cancellation(self) -> bool;

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.key() == key)
    }

    /// Terminal statuses have no way out.
    fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    fn can_transition_to(self, target: Self) -> bool {
        self.successors().contains(&target)
    }
}

/// Purchase order lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Created,
    AwaitingDelivery,
    Received,
    Cancelled,
}

impl StatusKey for PurchaseStatus {
    const ALL: &'static [Self] = &[
        PurchaseStatus::Created,
        PurchaseStatus::AwaitingDelivery,
        PurchaseStatus::Received,
        PurchaseStatus::Cancelled,
    ];

    fn key(self) -> &'static str {
        match self {
            PurchaseStatus::Created => "created",
            PurchaseStatus::AwaitingDelivery => "awaiting_delivery",
            PurchaseStatus::Received => "received",
            PurchaseStatus::Cancelled => "cancelled",
        }
    }

    fn successors(self) -> &'static [Self] {
        match self {
            PurchaseStatus::Created => &[PurchaseStatus::AwaitingDelivery, PurchaseStatus::Cancelled],
            PurchaseStatus::AwaitingDelivery => &[PurchaseStatus::Received],
            PurchaseStatus::Received | PurchaseStatus::Cancelled => &[],
        }
    }

    fn is_cancellation(self) -> bool {
        self == PurchaseStatus::Cancelled
    }
}

/// Sales order lifecycle.
///
/// `in_load -> pending` releases an order whose load was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InLoad,
    Delivered,
    Cancelled,
}

impl StatusKey for OrderStatus {
    const ALL: &'static [Self] = &[
        OrderStatus::Pending,
        OrderStatus::InLoad,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    fn key(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InLoad => "in_load",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    fn successors(self) -> &'static [Self] {
        match self {
            OrderStatus::Pending => &[OrderStatus::InLoad, OrderStatus::Cancelled],
            OrderStatus::InLoad => &[OrderStatus::Delivered, OrderStatus::Pending],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    fn is_cancellation(self) -> bool {
        self == OrderStatus::Cancelled
    }
}

/// Load (delivery run) lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Pending,
    Loading,
    InTransit,
    Delivered,
    Cancelled,
}

impl StatusKey for LoadStatus {
    const ALL: &'static [Self] = &[
        LoadStatus::Pending,
        LoadStatus::Loading,
        LoadStatus::InTransit,
        LoadStatus::Delivered,
        LoadStatus::Cancelled,
    ];

    fn key(self) -> &'static str {
        match self {
            LoadStatus::Pending => "pending",
            LoadStatus::Loading => "loading",
            LoadStatus::InTransit => "in_transit",
            LoadStatus::Delivered => "delivered",
            LoadStatus::Cancelled => "cancelled",
        }
    }

    fn successors(self) -> &'static [Self] {
        match self {
            LoadStatus::Pending => &[LoadStatus::Loading, LoadStatus::Cancelled],
            LoadStatus::Loading => &[LoadStatus::InTransit, LoadStatus::Cancelled],
            LoadStatus::InTransit => &[LoadStatus::Delivered],
            LoadStatus::Delivered | LoadStatus::Cancelled => &[],
        }
    }

    fn is_cancellation(self) -> bool {
        self == LoadStatus::Cancelled
    }
}

/// Receivable / payable lifecycle, driven by installment payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Pending,
    PartiallyPaid,
    Paid,
    Cancelled,
}

impl StatusKey for AccountStatus {
    const ALL: &'static [Self] = &[
        AccountStatus::Pending,
        AccountStatus::PartiallyPaid,
        AccountStatus::Paid,
        AccountStatus::Cancelled,
    ];

    fn key(self) -> &'static str {
        match self {
            AccountStatus::Pending => "pending",
            AccountStatus::PartiallyPaid => "partially_paid",
            AccountStatus::Paid => "paid",
            AccountStatus::Cancelled => "cancelled",
        }
    }

    fn successors(self) -> &'static [Self] {
        match self {
            AccountStatus::Pending => &[
                AccountStatus::PartiallyPaid,
                AccountStatus::Paid,
                AccountStatus::Cancelled,
            ],
            AccountStatus::PartiallyPaid => &[AccountStatus::Paid],
            AccountStatus::Paid | AccountStatus::Cancelled => &[],
        }
    }

    fn is_cancellation(self) -> bool {
        self == AccountStatus::Cancelled
    }
}

/// Sales commission lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    Pending,
    Approved,
    Paid,
    Cancelled,
}

impl StatusKey for CommissionStatus {
    const ALL: &'static [Self] = &[
        CommissionStatus::Pending,
        CommissionStatus::Approved,
        CommissionStatus::Paid,
        CommissionStatus::Cancelled,
    ];

    fn key(self) -> &'static str {
        match self {
            CommissionStatus::Pending => "pending",
            CommissionStatus::Approved => "approved",
            CommissionStatus::Paid => "paid",
            CommissionStatus::Cancelled => "cancelled",
        }
    }

    fn successors(self) -> &'static [Self] {
        match self {
            CommissionStatus::Pending => &[CommissionStatus::Approved, CommissionStatus::Cancelled],
            CommissionStatus::Approved => &[CommissionStatus::Paid, CommissionStatus::Cancelled],
            CommissionStatus::Paid | CommissionStatus::Cancelled => &[],
        }
    }

    fn is_cancellation(self) -> bool {
        self == CommissionStatus::Cancelled
    }
}

/// Card sale reconciliation lifecycle (acquirer settlement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardReconciliationStatus {
    PendingReconciliation,
    Reconciled,
    Receivable,
    Received,
    Cancelled,
}

impl StatusKey for CardReconciliationStatus {
    const ALL: &'static [Self] = &[
        CardReconciliationStatus::PendingReconciliation,
        CardReconciliationStatus::Reconciled,
        CardReconciliationStatus::Receivable,
        CardReconciliationStatus::Received,
        CardReconciliationStatus::Cancelled,
    ];

    fn key(self) -> &'static str {
        match self {
            CardReconciliationStatus::PendingReconciliation => "pending_reconciliation",
            CardReconciliationStatus::Reconciled => "reconciled",
            CardReconciliationStatus::Receivable => "receivable",
            CardReconciliationStatus::Received => "received",
            CardReconciliationStatus::Cancelled => "cancelled",
        }
    }

    fn successors(self) -> &'static [Self] {
        match self {
            CardReconciliationStatus::PendingReconciliation => &[
                CardReconciliationStatus::Reconciled,
                CardReconciliationStatus::Cancelled,
            ],
            CardReconciliationStatus::Reconciled => &[
                CardReconciliationStatus::Receivable,
                CardReconciliationStatus::Cancelled,
            ],
            CardReconciliationStatus::Receivable => &[CardReconciliationStatus::Received],
            CardReconciliationStatus::Received | CardReconciliationStatus::Cancelled => &[],
        }
    }

    fn is_cancellation(self) -> bool {
        self == CardReconciliationStatus::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_serde_matches_key<S>()
    where
        S: StatusKey + Serialize,
    {
        for status in S::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.key()));
            assert_eq!(S::from_key(status.key()), Some(*status));
        }
    }

    #[test]
    fn serde_representation_is_the_status_key() {
        assert_serde_matches_key::<PurchaseStatus>();
        assert_serde_matches_key::<OrderStatus>();
        assert_serde_matches_key::<LoadStatus>();
        assert_serde_matches_key::<AccountStatus>();
        assert_serde_matches_key::<CommissionStatus>();
        assert_serde_matches_key::<CardReconciliationStatus>();
    }

    fn assert_cancellation_is_terminal_and_unique<S: StatusKey>() {
        let cancellations: Vec<_> = S::ALL.iter().filter(|s| s.is_cancellation()).collect();
        assert_eq!(cancellations.len(), 1);
        assert!(cancellations[0].is_terminal());
        for status in S::ALL {
            assert!(!status.successors().contains(status), "{status:?} loops onto itself");
        }
    }

    #[test]
    fn every_graph_has_one_terminal_cancellation_and_no_self_loops() {
        assert_cancellation_is_terminal_and_unique::<PurchaseStatus>();
        assert_cancellation_is_terminal_and_unique::<OrderStatus>();
        assert_cancellation_is_terminal_and_unique::<LoadStatus>();
        assert_cancellation_is_terminal_and_unique::<AccountStatus>();
        assert_cancellation_is_terminal_and_unique::<CommissionStatus>();
        assert_cancellation_is_terminal_and_unique::<CardReconciliationStatus>();
    }

    #[test]
    fn load_can_only_be_cancelled_before_transit() {
        assert!(LoadStatus::Pending.can_transition_to(LoadStatus::Cancelled));
        assert!(LoadStatus::Loading.can_transition_to(LoadStatus::Cancelled));
        assert!(!LoadStatus::InTransit.can_transition_to(LoadStatus::Cancelled));
        assert!(!LoadStatus::Pending.can_transition_to(LoadStatus::InTransit));
    }
}
