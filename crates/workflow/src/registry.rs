//! Status Flow Registry.
//!
//! One ordered list of [`StatusStep`]s per [`EntityKind`], with the default UI
//! labels. This is the single source of truth for "where am I in the
//! sequence". It does not decide whether a transition is allowed; that is the
//! job of the graphs in [`crate::status`].

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use tradeflow_core::{DomainError, DomainResult};

use crate::kind::EntityKind;
use crate::status::StatusKey;

/// One position in an entity kind's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusStep {
    pub key: Cow<'static, str>,
    pub label: Cow<'static, str>,
    pub order: u8,
    pub is_terminal: bool,
    pub is_cancellation: bool,
}

const fn make_step(
    key: &'static str,
    label: &'static str,
    order: u8,
    is_terminal: bool,
    is_cancellation: bool,
) -> StatusStep {
    StatusStep {
        key: Cow::Borrowed(key),
        label: Cow::Borrowed(label),
        order,
        is_terminal,
        is_cancellation,
    }
}

static PURCHASE_STEPS: [StatusStep; 4] = [
    make_step("created", "Criado", 0, false, false),
    make_step("awaiting_delivery", "Aguardando Entrega", 1, false, false),
    make_step("received", "Recebido", 2, true, false),
    make_step("cancelled", "Cancelado", 3, true, true),
];

static ORDER_STEPS: [StatusStep; 4] = [
    make_step("pending", "Pendente", 0, false, false),
    make_step("in_load", "Em Carga", 1, false, false),
    make_step("delivered", "Entregue", 2, true, false),
    make_step("cancelled", "Cancelado", 3, true, true),
];

static LOAD_STEPS: [StatusStep; 5] = [
    make_step("pending", "Pendente", 0, false, false),
    make_step("loading", "Carregando", 1, false, false),
    make_step("in_transit", "Em Trânsito", 2, false, false),
    make_step("delivered", "Entregue", 3, true, false),
    make_step("cancelled", "Cancelada", 4, true, true),
];

static RECEIVABLE_STEPS: [StatusStep; 4] = [
    make_step("pending", "A Receber", 0, false, false),
    make_step("partially_paid", "Recebido Parcial", 1, false, false),
    make_step("paid", "Recebido", 2, true, false),
    make_step("cancelled", "Cancelado", 3, true, true),
];

static PAYABLE_STEPS: [StatusStep; 4] = [
    make_step("pending", "A Pagar", 0, false, false),
    make_step("partially_paid", "Pago Parcial", 1, false, false),
    make_step("paid", "Pago", 2, true, false),
    make_step("cancelled", "Cancelado", 3, true, true),
];

static COMMISSION_STEPS: [StatusStep; 4] = [
    make_step("pending", "Pendente", 0, false, false),
    make_step("approved", "Aprovada", 1, false, false),
    make_step("paid", "Paga", 2, true, false),
    make_step("cancelled", "Cancelada", 3, true, true),
];

static CARD_RECONCILIATION_STEPS: [StatusStep; 5] = [
    make_step("pending_reconciliation", "Aguardando Conciliação", 0, false, false),
    make_step("reconciled", "Conciliado", 1, false, false),
    make_step("receivable", "A Receber", 2, false, false),
    make_step("received", "Recebido", 3, true, false),
    make_step("cancelled", "Cancelado", 4, true, true),
];

/// Ordered steps of an entity kind (main line first, cancellation last).
pub fn steps_for(kind: EntityKind) -> &'static [StatusStep] {
    match kind {
        EntityKind::Purchase => &PURCHASE_STEPS,
        EntityKind::Order => &ORDER_STEPS,
        EntityKind::Load => &LOAD_STEPS,
        EntityKind::Receivable => &RECEIVABLE_STEPS,
        EntityKind::Payable => &PAYABLE_STEPS,
        EntityKind::Commission => &COMMISSION_STEPS,
        EntityKind::CardReconciliation => &CARD_RECONCILIATION_STEPS,
    }
}

/// Position of `status` in the kind's sequence.
pub fn index_of(kind: EntityKind, status: &str) -> DomainResult<usize> {
    steps_for(kind)
        .iter()
        .position(|s| s.key == status)
        .ok_or_else(|| DomainError::unknown_status(kind.as_str(), status))
}

pub fn step(kind: EntityKind, status: &str) -> DomainResult<&'static StatusStep> {
    index_of(kind, status).map(|idx| &steps_for(kind)[idx])
}

/// Typed lookup, for callers holding a status enum rather than a key.
pub fn step_of<S: StatusKey>(kind: EntityKind, status: S) -> DomainResult<&'static StatusStep> {
    step(kind, status.key())
}

/// `a` comes strictly before `b` on the main line.
///
/// The cancellation branch is off the main line, so any comparison involving
/// it is `false`.
pub fn is_before(kind: EntityKind, a: &str, b: &str) -> DomainResult<bool> {
    let (a, b) = (step(kind, a)?, step(kind, b)?);
    Ok(!a.is_cancellation && !b.is_cancellation && a.order < b.order)
}

/// `a` comes strictly after `b` on the main line.
pub fn is_after(kind: EntityKind, a: &str, b: &str) -> DomainResult<bool> {
    is_before(kind, b, a)
}

pub fn is_terminal(kind: EntityKind, status: &str) -> DomainResult<bool> {
    step(kind, status).map(|s| s.is_terminal)
}

pub fn is_cancellation(kind: EntityKind, status: &str) -> DomainResult<bool> {
    step(kind, status).map(|s| s.is_cancellation)
}

/// Rendering state of one step relative to the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Completed,
    Current,
    Pending,
    /// Main-line step bypassed by a cancellation.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepProgress {
    pub step: StatusStep,
    pub state: StepState,
}

/// "Where am I": every main-line step marked against `current`.
///
/// The cancellation step is only included while it is the current status.
pub fn progress(kind: EntityKind, current: &str) -> DomainResult<Vec<StepProgress>> {
    let current_step = step(kind, current)?;
    let steps = steps_for(kind);

    if current_step.is_cancellation {
        return Ok(steps
            .iter()
            .map(|s| StepProgress {
                step: s.clone(),
                state: if s.is_cancellation {
                    StepState::Current
                } else {
                    StepState::Skipped
                },
            })
            .collect());
    }

    Ok(steps
        .iter()
        .filter(|s| !s.is_cancellation)
        .map(|s| StepProgress {
            step: s.clone(),
            state: match s.order.cmp(&current_step.order) {
                core::cmp::Ordering::Less => StepState::Completed,
                core::cmp::Ordering::Equal => StepState::Current,
                core::cmp::Ordering::Greater => StepState::Pending,
            },
        })
        .collect())
}

/// Caller-supplied label for one status key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLabel {
    pub key: String,
    pub label: String,
}

/// Label overrides supplied by the UI layer.
///
/// Only labels can be overridden; ordering, terminal and cancellation flags
/// always come from the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFlowConfig {
    pub steps: Vec<StatusLabel>,
}

impl StatusFlowConfig {
    pub fn new(steps: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            steps: steps
                .into_iter()
                .map(|(key, label)| StatusLabel { key, label })
                .collect(),
        }
    }

    /// The kind's steps with labels overridden by this config.
    pub fn apply(&self, kind: EntityKind) -> DomainResult<Vec<StatusStep>> {
        let mut steps = steps_for(kind).to_vec();
        for entry in &self.steps {
            let idx = index_of(kind, &entry.key)?;
            steps[idx].label = Cow::Owned(entry.label.clone());
        }
        Ok(steps)
    }
}
