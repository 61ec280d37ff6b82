//! Transition validation shared by every entity kind.
//!
//! A transition goes through three gates, in order:
//!
//! 1. the target must be a one-step successor in the kind's graph
//!    (`IllegalTransition` otherwise);
//! 2. the kind's guards must hold (`GuardFailed` otherwise);
//! 3. the state change is applied to a *copy* of the entity, which stamps
//!    timestamps and re-derives totals.
//!
//! The input entity is only borrowed, so a rejected transition cannot leave
//! it half-updated.

use chrono::{DateTime, Utc};

use tradeflow_core::{DomainError, DomainResult, Entity};

use crate::kind::EntityKind;
use crate::status::StatusKey;

/// An entity kind with a validated status lifecycle.
pub trait Lifecycle: Entity + Clone {
    type Status: StatusKey;
    /// Extra input some guards need (e.g. the load an order joins).
    type Context;

    fn kind(&self) -> EntityKind;

    fn status(&self) -> Self::Status;

    /// Preconditions for entering `target`. Only called for graph edges.
    fn check_guards(&self, target: Self::Status, ctx: &Self::Context) -> DomainResult<()>;

    /// Apply the status change: set status, stamp timestamps, bump version and
    /// recompute derived totals. Called on a copy of the entity.
    fn enter(
        &mut self,
        target: Self::Status,
        ctx: &Self::Context,
        at: DateTime<Utc>,
    ) -> DomainResult<()>;
}

/// Keys of every status reachable from `from` in one step.
pub fn allowed_targets<S: StatusKey>(from: S) -> Vec<String> {
    from.successors().iter().map(|s| s.key().to_string()).collect()
}

/// Fail with `IllegalTransition` unless `from -> to` is an edge of the graph.
pub fn ensure_edge<S: StatusKey>(kind: EntityKind, from: S, to: S) -> DomainResult<()> {
    if from.can_transition_to(to) {
        return Ok(());
    }
    Err(DomainError::IllegalTransition {
        kind: kind.as_str().to_string(),
        from: from.key().to_string(),
        to: to.key().to_string(),
        allowed: allowed_targets(from),
    })
}

/// Validate and apply a status transition, returning the new entity version.
pub fn transition<E: Lifecycle>(
    entity: &E,
    target: E::Status,
    ctx: &E::Context,
    at: DateTime<Utc>,
) -> DomainResult<E> {
    ensure_edge(entity.kind(), entity.status(), target)?;
    entity.check_guards(target, ctx)?;

    let mut next = entity.clone();
    next.enter(target, ctx, at)?;
    Ok(next)
}

/// Guard helper: fail with `GuardFailed` naming `condition` unless `holds`.
pub fn require(kind: EntityKind, holds: bool, condition: &str) -> DomainResult<()> {
    if holds {
        Ok(())
    } else {
        Err(DomainError::guard_failed(kind.as_str(), condition))
    }
}

/// Mutation helper: fail with `GuardFailed` when the entity is in a terminal
/// status (terminal statuses freeze items and totals).
pub fn ensure_not_frozen<S: StatusKey>(kind: EntityKind, status: S) -> DomainResult<()> {
    require(
        kind,
        !status.is_terminal(),
        &format!("{kind} is {} and can no longer change", status.key()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{LoadStatus, PurchaseStatus};
    use tradeflow_core::{AggregateId, Timestamps};

    #[derive(Debug, Clone, PartialEq)]
    struct Probe {
        id: AggregateId,
        status: LoadStatus,
        ready: bool,
        version: u64,
        timestamps: Timestamps,
    }

    impl Entity for Probe {
        type Id = AggregateId;

        fn id(&self) -> AggregateId {
            self.id
        }

        fn version(&self) -> u64 {
            self.version
        }

        fn timestamps(&self) -> &Timestamps {
            &self.timestamps
        }
    }

    impl Lifecycle for Probe {
        type Status = LoadStatus;
        type Context = ();

        fn kind(&self) -> EntityKind {
            EntityKind::Load
        }

        fn status(&self) -> LoadStatus {
            self.status
        }

        fn check_guards(&self, target: LoadStatus, _ctx: &()) -> DomainResult<()> {
            if target == LoadStatus::InTransit {
                require(EntityKind::Load, self.ready, "probe is ready")?;
            }
            Ok(())
        }

        fn enter(&mut self, target: LoadStatus, _ctx: &(), at: DateTime<Utc>) -> DomainResult<()> {
            self.status = target;
            self.version += 1;
            self.timestamps.touch(at);
            Ok(())
        }
    }

    fn probe(status: LoadStatus, ready: bool) -> Probe {
        Probe {
            id: AggregateId::from_u128(1),
            status,
            ready,
            version: 3,
            timestamps: Timestamps::created(DateTime::from_timestamp(0, 0).unwrap()),
        }
    }

    #[test]
    fn illegal_edge_reports_allowed_set() {
        let err = ensure_edge(
            EntityKind::Purchase,
            PurchaseStatus::Created,
            PurchaseStatus::Received,
        )
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::IllegalTransition {
                kind: "purchase".to_string(),
                from: "created".to_string(),
                to: "received".to_string(),
                allowed: vec!["awaiting_delivery".to_string(), "cancelled".to_string()],
            }
        );
    }

    #[test]
    fn failed_guard_leaves_entity_untouched() {
        let before = probe(LoadStatus::Loading, false);
        let at = DateTime::from_timestamp(60, 0).unwrap();
        let err = transition(&before, LoadStatus::InTransit, &(), at).unwrap_err();
        assert!(matches!(err, DomainError::GuardFailed { .. }));
        assert_eq!(before, probe(LoadStatus::Loading, false));
    }

    #[test]
    fn successful_transition_returns_new_version() {
        let before = probe(LoadStatus::Loading, true);
        let at = DateTime::from_timestamp(60, 0).unwrap();
        let after = transition(&before, LoadStatus::InTransit, &(), at).unwrap();
        assert_eq!(after.status, LoadStatus::InTransit);
        assert_eq!(after.version, 4);
        assert_eq!(after.timestamps.updated_at, at);
        assert_eq!(before.status, LoadStatus::Loading);
    }

    #[test]
    fn frozen_statuses_reject_mutation() {
        assert!(ensure_not_frozen(EntityKind::Load, LoadStatus::Loading).is_ok());
        assert!(matches!(
            ensure_not_frozen(EntityKind::Load, LoadStatus::Delivered),
            Err(DomainError::GuardFailed { .. })
        ));
    }
}
