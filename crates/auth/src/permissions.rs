use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission string: `"module.action"`, `"module.*"` or `"*"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// `"module.action"`.
    pub fn of(module: ModuleId, action: Action) -> Self {
        Self(Cow::Owned(format!("{}.{}", module.as_str(), action.as_str())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }

    /// Whether this permission covers `action` on `module`.
    pub fn grants(&self, module: ModuleId, action: Action) -> bool {
        if self.is_wildcard() {
            return true;
        }
        match self.as_str().split_once('.') {
            Some((m, a)) => m == module.as_str() && (a == "*" || a == action.as_str()),
            None => false,
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Functional area a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleId {
    Purchases,
    Orders,
    Loads,
    Receivables,
    Payables,
    Commissions,
    CardReconciliation,
    CashFlow,
}

impl ModuleId {
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleId::Purchases => "purchases",
            ModuleId::Orders => "orders",
            ModuleId::Loads => "loads",
            ModuleId::Receivables => "receivables",
            ModuleId::Payables => "payables",
            ModuleId::Commissions => "commissions",
            ModuleId::CardReconciliation => "card_reconciliation",
            ModuleId::CashFlow => "cash_flow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    /// Move an entity through its status flow.
    Transition,
    Approve,
    Cancel,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Transition => "transition",
            Action::Approve => "approve",
            Action::Cancel => "cancel",
        }
    }
}
