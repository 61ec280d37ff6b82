use serde::{Deserialize, Serialize};

/// Every entity kind that has a status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Purchase,
    Order,
    Load,
    Receivable,
    Payable,
    Commission,
    CardReconciliation,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Purchase,
        EntityKind::Order,
        EntityKind::Load,
        EntityKind::Receivable,
        EntityKind::Payable,
        EntityKind::Commission,
        EntityKind::CardReconciliation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Purchase => "purchase",
            EntityKind::Order => "order",
            EntityKind::Load => "load",
            EntityKind::Receivable => "receivable",
            EntityKind::Payable => "payable",
            EntityKind::Commission => "commission",
            EntityKind::CardReconciliation => "card_reconciliation",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
