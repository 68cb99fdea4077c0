//! Single and bulk repositioning of fields against a remote position setter.
//!
//! Every move is one absolute `set_position` call followed, only on success, by the
//! matching local shift. A collection therefore never drifts from what the remote
//! system has confirmed, even when a batch stops halfway.

pub mod collection;
pub mod consistency;

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::types::{ApiError, FieldId, ParentType, Position};

pub use collection::{FieldCatalog, OrderedCollection, Selection};
pub use consistency::{ConsistencyReport, check_orders};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Remote update of one field's absolute display order.
pub trait PositionSetter {
    fn set_position(
        &self,
        id: FieldId,
        display_order: i64,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InvalidMove {
    UnknownItem(FieldId),
    UnknownTarget(FieldId),
    SameItem(FieldId),
}

impl InvalidMove {
    pub fn code(self) -> &'static str {
        match self {
            InvalidMove::UnknownItem(_) => "UNKNOWN_ITEM",
            InvalidMove::UnknownTarget(_) => "UNKNOWN_TARGET",
            InvalidMove::SameItem(_) => "SAME_ITEM",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum MoveOutcome {
    Moved { from: i64, to: i64 },
    /// Already in the requested place; nothing was sent upstream.
    Unchanged,
    Rejected(InvalidMove),
    Failed(ApiError),
    Cancelled,
}

impl MoveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, MoveOutcome::Moved { .. } | MoveOutcome::Unchanged)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MoveOutcome::Moved { .. } => "moved",
            MoveOutcome::Unchanged => "unchanged",
            MoveOutcome::Rejected(_) => "rejected",
            MoveOutcome::Failed(_) => "failed",
            MoveOutcome::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MoveReport {
    pub field_id: FieldId,
    pub target_id: FieldId,
    pub position: Position,
    pub outcome: MoveOutcome,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub parent_type: ParentType,
    pub target_id: FieldId,
    pub position: Position,
    pub moves: Vec<MoveReport>,
}

impl BatchReport {
    fn new(parent_type: ParentType, target_id: FieldId, position: Position) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            parent_type,
            target_id,
            position,
            moves: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &MoveReport> {
        self.moves.iter().filter(|report| report.outcome.is_success())
    }

    pub fn unsuccessful(&self) -> impl Iterator<Item = &MoveReport> {
        self.moves
            .iter()
            .filter(|report| !report.outcome.is_success())
    }

    /// True when every mover landed where it was asked to.
    pub fn is_complete(&self) -> bool {
        self.unsuccessful().next().is_none()
    }

    pub fn outcome_for(&self, id: FieldId) -> Option<&MoveOutcome> {
        self.moves
            .iter()
            .find(|report| report.field_id == id)
            .map(|report| &report.outcome)
    }
}

#[derive(Debug, Error)]
pub enum ReorderError {
    #[error("no fields selected to move")]
    EmptySelection,

    #[error("target field {0} not found")]
    UnknownTarget(FieldId),

    #[error("refusing to reorder until display orders are fixed ({0})")]
    Inconsistent(ConsistencyReport),
}

/// Order a mover must be given to sit `position` its target, or `None` when both
/// already share an order.
pub fn planned_order(moving_order: i64, target_order: i64, position: Position) -> Option<i64> {
    use std::cmp::Ordering as Cmp;

    match moving_order.cmp(&target_order) {
        Cmp::Equal => None,
        Cmp::Less => Some(match position {
            Position::After => target_order,
            Position::Before => target_order - 1,
        }),
        Cmp::Greater => Some(match position {
            Position::After => target_order + 1,
            Position::Before => target_order,
        }),
    }
}

pub struct Reorderer<S> {
    setter: S,
    request_timeout: Duration,
    stop: Arc<AtomicBool>,
}

impl<S: PositionSetter> Reorderer<S> {
    pub fn new(setter: S) -> Self {
        Self {
            setter,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Shares a flag that, once set, stops a running batch before its next mover.
    ///
    /// The flag is never cleared here: every later `move_many` reports all of its
    /// movers as cancelled until `resume` is called.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Clears a previous stop request so the next batch runs.
    pub fn resume(&self) {
        self.stop.store(false, Ordering::Relaxed);
    }

    pub fn setter(&self) -> &S {
        &self.setter
    }

    /// Moves one field next to `target_id`. Assumes the collection's orders are
    /// contiguous; `move_many` checks that before starting.
    pub async fn move_one(
        &self,
        collection: &mut OrderedCollection,
        moving_id: FieldId,
        target_id: FieldId,
        position: Position,
    ) -> MoveOutcome {
        if moving_id == target_id {
            return MoveOutcome::Rejected(InvalidMove::SameItem(moving_id));
        }
        let Some(moving_order) = collection.order_of(moving_id) else {
            return MoveOutcome::Rejected(InvalidMove::UnknownItem(moving_id));
        };
        let Some(target_order) = collection.order_of(target_id) else {
            return MoveOutcome::Rejected(InvalidMove::UnknownTarget(target_id));
        };

        let new_order = match planned_order(moving_order, target_order, position) {
            Some(order) if order != moving_order => order,
            _ => {
                debug!(
                    field_id = %moving_id,
                    target_id = %target_id,
                    position = position.as_str(),
                    display_order = moving_order,
                    "field already in place"
                );
                return MoveOutcome::Unchanged;
            }
        };

        match self.send(moving_id, new_order).await {
            Ok(()) => {
                collection.apply_move(moving_id, new_order);
                debug!(
                    field_id = %moving_id,
                    target_id = %target_id,
                    position = position.as_str(),
                    from = moving_order,
                    to = new_order,
                    "field moved"
                );
                MoveOutcome::Moved {
                    from: moving_order,
                    to: new_order,
                }
            }
            Err(err) => {
                warn!(
                    field_id = %moving_id,
                    display_order = new_order,
                    code = %err.code,
                    error = %err.message,
                    "remote position update failed; field left in place"
                );
                MoveOutcome::Failed(err)
            }
        }
    }

    /// Moves `moving_ids` into one block next to `target_id`, keeping their current
    /// relative order. The first mover is placed relative to the target; each later
    /// one goes after the last mover that succeeded. A failed mover is skipped and
    /// nothing is rolled back, so a failure can leave the block split.
    pub async fn move_many(
        &self,
        collection: &mut OrderedCollection,
        moving_ids: &[FieldId],
        target_id: FieldId,
        position: Position,
    ) -> Result<BatchReport, ReorderError> {
        if moving_ids.is_empty() {
            return Err(ReorderError::EmptySelection);
        }
        if collection.get(target_id).is_none() {
            return Err(ReorderError::UnknownTarget(target_id));
        }
        let consistency = collection.check_consistency();
        if !consistency.is_consistent() {
            return Err(ReorderError::Inconsistent(consistency));
        }

        let mut report = BatchReport::new(collection.parent_type(), target_id, position);
        let mut seen = HashSet::new();
        let mut movers = Vec::with_capacity(moving_ids.len());
        for &id in moving_ids {
            if !seen.insert(id) {
                continue;
            }
            let rejected = if id == target_id {
                Some(InvalidMove::SameItem(id))
            } else if collection.get(id).is_none() {
                Some(InvalidMove::UnknownItem(id))
            } else {
                None
            };
            match rejected {
                Some(reason) => report.moves.push(MoveReport {
                    field_id: id,
                    target_id,
                    position,
                    outcome: MoveOutcome::Rejected(reason),
                }),
                None => movers.push(id),
            }
        }
        movers.sort_by_key(|id| collection.order_of(*id));

        info!(
            batch_id = %report.batch_id,
            parent_type = %collection.parent_type(),
            target_id = %target_id,
            position = position.as_str(),
            movers = movers.len(),
            "bulk move started"
        );

        let mut anchor = target_id;
        let mut relation = position;
        for (index, &id) in movers.iter().enumerate() {
            if self.is_stopped() {
                warn!(
                    batch_id = %report.batch_id,
                    remaining = movers.len() - index,
                    "bulk move cancelled"
                );
                report
                    .moves
                    .extend(movers[index..].iter().map(|&rest| MoveReport {
                        field_id: rest,
                        target_id: anchor,
                        position: relation,
                        outcome: MoveOutcome::Cancelled,
                    }));
                break;
            }

            let outcome = self.move_one(collection, id, anchor, relation).await;
            let advance = outcome.is_success();
            report.moves.push(MoveReport {
                field_id: id,
                target_id: anchor,
                position: relation,
                outcome,
            });
            if advance {
                anchor = id;
                relation = Position::After;
            }
        }

        info!(
            batch_id = %report.batch_id,
            succeeded = report.succeeded().count(),
            unsuccessful = report.unsuccessful().count(),
            "bulk move finished"
        );
        Ok(report)
    }

    async fn send(&self, id: FieldId, display_order: i64) -> Result<(), ApiError> {
        match tokio::time::timeout(
            self.request_timeout,
            self.setter.set_position(id, display_order),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ApiError::new(
                "REQUEST_TIMEOUT",
                format!(
                    "position update for field {id} timed out after {} ms",
                    self.request_timeout.as_millis()
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::collection::tests::field;
    use super::*;

    #[derive(Default)]
    struct FakeSetter {
        calls: Mutex<Vec<(FieldId, i64)>>,
        failing: HashMap<FieldId, ApiError>,
        stall: Option<FieldId>,
        /// Sets the flag once this field's update has been accepted.
        stop_after: Option<(FieldId, Arc<AtomicBool>)>,
    }

    impl FakeSetter {
        fn failing(ids: &[u64]) -> Self {
            Self {
                failing: ids
                    .iter()
                    .map(|id| {
                        (
                            FieldId(*id),
                            ApiError::new("HTTP_ERROR", "server returned HTTP 500"),
                        )
                    })
                    .collect(),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(FieldId, i64)> {
            self.calls
                .lock()
                .expect("calls mutex should not be poisoned")
                .clone()
        }
    }

    impl PositionSetter for FakeSetter {
        async fn set_position(&self, id: FieldId, display_order: i64) -> Result<(), ApiError> {
            self.calls
                .lock()
                .expect("calls mutex should not be poisoned")
                .push((id, display_order));
            if self.stall == Some(id) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if let Some((trigger, stop)) = &self.stop_after
                && *trigger == id
            {
                stop.store(true, Ordering::Relaxed);
            }
            match self.failing.get(&id) {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }

    /// Ids 0..n, orders 0..n.
    fn collection(n: u64) -> OrderedCollection {
        OrderedCollection::new(
            ParentType::Matter,
            (0..n).map(|i| field(i, ParentType::Matter, i as i64)),
        )
    }

    fn id_order(collection: &OrderedCollection) -> Vec<u64> {
        collection.ordered().iter().map(|field| field.id.0).collect()
    }

    #[test]
    fn planned_order_covers_all_four_cases() {
        assert_eq!(planned_order(1, 4, Position::After), Some(4));
        assert_eq!(planned_order(1, 4, Position::Before), Some(3));
        assert_eq!(planned_order(5, 2, Position::After), Some(3));
        assert_eq!(planned_order(5, 2, Position::Before), Some(2));
        assert_eq!(planned_order(3, 3, Position::Before), None);
    }

    #[tokio::test]
    async fn move_one_forward_after_target() {
        let mut items = collection(6);
        let reorderer = Reorderer::new(FakeSetter::default());

        let outcome = reorderer
            .move_one(&mut items, FieldId(1), FieldId(4), Position::After)
            .await;

        assert_eq!(outcome, MoveOutcome::Moved { from: 1, to: 4 });
        assert_eq!(id_order(&items), vec![0, 2, 3, 4, 1, 5]);
        assert_eq!(reorderer.setter().calls(), vec![(FieldId(1), 4)]);
    }

    #[tokio::test]
    async fn move_one_forward_before_target() {
        let mut items = collection(6);
        let reorderer = Reorderer::new(FakeSetter::default());

        let outcome = reorderer
            .move_one(&mut items, FieldId(1), FieldId(4), Position::Before)
            .await;

        assert_eq!(outcome, MoveOutcome::Moved { from: 1, to: 3 });
        assert_eq!(id_order(&items), vec![0, 2, 3, 1, 4, 5]);
    }

    #[tokio::test]
    async fn move_one_backward_after_target() {
        let mut items = collection(6);
        let reorderer = Reorderer::new(FakeSetter::default());

        let outcome = reorderer
            .move_one(&mut items, FieldId(5), FieldId(1), Position::After)
            .await;

        assert_eq!(outcome, MoveOutcome::Moved { from: 5, to: 2 });
        assert_eq!(id_order(&items), vec![0, 1, 5, 2, 3, 4]);
    }

    #[tokio::test]
    async fn move_one_backward_before_target() {
        let mut items = collection(6);
        let reorderer = Reorderer::new(FakeSetter::default());

        let outcome = reorderer
            .move_one(&mut items, FieldId(5), FieldId(1), Position::Before)
            .await;

        assert_eq!(outcome, MoveOutcome::Moved { from: 5, to: 1 });
        assert_eq!(id_order(&items), vec![0, 5, 1, 2, 3, 4]);
        assert!(items.check_consistency().is_consistent());
    }

    #[tokio::test]
    async fn move_one_already_in_place_skips_remote_call() {
        let mut items = collection(4);
        let reorderer = Reorderer::new(FakeSetter::default());

        let before = reorderer
            .move_one(&mut items, FieldId(1), FieldId(2), Position::Before)
            .await;
        let after = reorderer
            .move_one(&mut items, FieldId(2), FieldId(1), Position::After)
            .await;

        assert_eq!(before, MoveOutcome::Unchanged);
        assert_eq!(after, MoveOutcome::Unchanged);
        assert!(reorderer.setter().calls().is_empty());
        assert_eq!(id_order(&items), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn move_one_rejects_invalid_requests_without_remote_call() {
        let mut items = collection(3);
        let reorderer = Reorderer::new(FakeSetter::default());

        assert_eq!(
            reorderer
                .move_one(&mut items, FieldId(1), FieldId(1), Position::After)
                .await,
            MoveOutcome::Rejected(InvalidMove::SameItem(FieldId(1)))
        );
        assert_eq!(
            reorderer
                .move_one(&mut items, FieldId(9), FieldId(1), Position::After)
                .await,
            MoveOutcome::Rejected(InvalidMove::UnknownItem(FieldId(9)))
        );
        assert_eq!(
            reorderer
                .move_one(&mut items, FieldId(1), FieldId(9), Position::After)
                .await,
            MoveOutcome::Rejected(InvalidMove::UnknownTarget(FieldId(9)))
        );
        assert!(reorderer.setter().calls().is_empty());
    }

    #[tokio::test]
    async fn move_one_failure_leaves_collection_untouched() {
        let mut items = collection(4);
        let snapshot = items.clone();
        let reorderer = Reorderer::new(FakeSetter::failing(&[0]));

        let outcome = reorderer
            .move_one(&mut items, FieldId(0), FieldId(3), Position::After)
            .await;

        assert!(matches!(outcome, MoveOutcome::Failed(ref err) if err.code == "HTTP_ERROR"));
        assert_eq!(items, snapshot);
    }

    #[tokio::test]
    async fn move_one_timeout_counts_as_failure() {
        let mut items = collection(3);
        let snapshot = items.clone();
        let setter = FakeSetter {
            stall: Some(FieldId(2)),
            ..FakeSetter::default()
        };
        let reorderer = Reorderer::new(setter).with_timeout(Duration::from_millis(20));

        let outcome = reorderer
            .move_one(&mut items, FieldId(2), FieldId(0), Position::Before)
            .await;

        assert!(matches!(outcome, MoveOutcome::Failed(ref err) if err.code == "REQUEST_TIMEOUT"));
        assert_eq!(items, snapshot);
    }

    #[tokio::test]
    async fn move_many_builds_contiguous_block() {
        // A..F as 0..5; move [B, D] before C.
        let mut items = collection(6);
        let reorderer = Reorderer::new(FakeSetter::default());

        let report = reorderer
            .move_many(&mut items, &[FieldId(3), FieldId(1)], FieldId(2), Position::Before)
            .await
            .expect("batch should run");

        assert_eq!(id_order(&items), vec![0, 1, 3, 2, 4, 5]);
        assert_eq!(report.outcome_for(FieldId(1)), Some(&MoveOutcome::Unchanged));
        assert_eq!(
            report.outcome_for(FieldId(3)),
            Some(&MoveOutcome::Moved { from: 3, to: 2 })
        );
        assert_eq!(reorderer.setter().calls(), vec![(FieldId(3), 2)]);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn move_many_pivots_onto_previous_mover() {
        let mut items = collection(8);
        let reorderer = Reorderer::new(FakeSetter::default());

        let report = reorderer
            .move_many(
                &mut items,
                &[FieldId(6), FieldId(0), FieldId(3)],
                FieldId(5),
                Position::After,
            )
            .await
            .expect("batch should run");

        assert_eq!(id_order(&items), vec![1, 2, 4, 5, 0, 3, 6, 7]);
        let anchors: Vec<_> = report
            .moves
            .iter()
            .map(|mv| (mv.field_id.0, mv.target_id.0, mv.position))
            .collect();
        assert_eq!(
            anchors,
            vec![
                (0, 5, Position::After),
                (3, 0, Position::After),
                (6, 3, Position::After),
            ]
        );
        assert!(items.check_consistency().is_consistent());
    }

    #[tokio::test]
    async fn move_many_failure_keeps_original_anchor() {
        let mut items = collection(6);
        let reorderer = Reorderer::new(FakeSetter::failing(&[0]));

        let report = reorderer
            .move_many(&mut items, &[FieldId(0), FieldId(1)], FieldId(4), Position::Before)
            .await
            .expect("batch should run");

        assert!(matches!(
            report.outcome_for(FieldId(0)),
            Some(MoveOutcome::Failed(_))
        ));
        assert_eq!(report.moves[1].target_id, FieldId(4));
        assert_eq!(report.moves[1].position, Position::Before);
        assert_eq!(id_order(&items), vec![0, 2, 3, 1, 4, 5]);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn move_many_rejects_target_and_unknown_movers() {
        let mut items = collection(5);
        let reorderer = Reorderer::new(FakeSetter::default());

        let report = reorderer
            .move_many(
                &mut items,
                &[FieldId(2), FieldId(42), FieldId(4), FieldId(4)],
                FieldId(2),
                Position::After,
            )
            .await
            .expect("batch should run");

        assert_eq!(
            report.outcome_for(FieldId(2)),
            Some(&MoveOutcome::Rejected(InvalidMove::SameItem(FieldId(2))))
        );
        assert_eq!(
            report.outcome_for(FieldId(42)),
            Some(&MoveOutcome::Rejected(InvalidMove::UnknownItem(FieldId(42))))
        );
        assert_eq!(report.moves.len(), 3);
        assert_eq!(id_order(&items), vec![0, 1, 2, 4, 3]);
    }

    #[tokio::test]
    async fn move_many_refuses_inconsistent_collection() {
        let mut items = OrderedCollection::new(
            ParentType::Matter,
            vec![
                field(1, ParentType::Matter, 1),
                field(2, ParentType::Matter, 2),
                field(3, ParentType::Matter, 4),
            ],
        );
        let reorderer = Reorderer::new(FakeSetter::default());

        let result = reorderer
            .move_many(&mut items, &[FieldId(3)], FieldId(1), Position::Before)
            .await;

        assert!(matches!(result, Err(ReorderError::Inconsistent(ref report)) if report.missing == vec![3]));
        assert!(reorderer.setter().calls().is_empty());
    }

    #[tokio::test]
    async fn move_many_requires_selection_and_known_target() {
        let mut items = collection(3);
        let reorderer = Reorderer::new(FakeSetter::default());

        assert!(matches!(
            reorderer
                .move_many(&mut items, &[], FieldId(1), Position::After)
                .await,
            Err(ReorderError::EmptySelection)
        ));
        assert!(matches!(
            reorderer
                .move_many(&mut items, &[FieldId(0)], FieldId(7), Position::After)
                .await,
            Err(ReorderError::UnknownTarget(FieldId(7)))
        ));
    }

    #[tokio::test]
    async fn move_many_honours_stop_flag_between_movers() {
        let mut items = collection(5);
        let stop = Arc::new(AtomicBool::new(true));
        let reorderer = Reorderer::new(FakeSetter::default()).with_stop_flag(Arc::clone(&stop));

        let report = reorderer
            .move_many(&mut items, &[FieldId(0), FieldId(1)], FieldId(4), Position::After)
            .await
            .expect("batch should run");

        assert!(
            report
                .moves
                .iter()
                .all(|mv| mv.outcome == MoveOutcome::Cancelled)
        );
        assert_eq!(report.moves.len(), 2);
        assert!(reorderer.setter().calls().is_empty());
        assert_eq!(id_order(&items), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn move_many_stops_mid_batch_after_current_mover() {
        let mut items = collection(5);
        let stop = Arc::new(AtomicBool::new(false));
        let setter = FakeSetter {
            stop_after: Some((FieldId(0), Arc::clone(&stop))),
            ..FakeSetter::default()
        };
        let reorderer = Reorderer::new(setter).with_stop_flag(stop);

        let report = reorderer
            .move_many(
                &mut items,
                &[FieldId(0), FieldId(1), FieldId(2)],
                FieldId(4),
                Position::After,
            )
            .await
            .expect("batch should run");

        let statuses: Vec<_> = report
            .moves
            .iter()
            .map(|mv| (mv.field_id.0, mv.outcome.as_str()))
            .collect();
        assert_eq!(
            statuses,
            vec![(0, "moved"), (1, "cancelled"), (2, "cancelled")]
        );
        // The cancelled movers would have pivoted on the one that landed.
        assert_eq!(report.moves[1].target_id, FieldId(0));
        assert_eq!(reorderer.setter().calls(), vec![(FieldId(0), 4)]);
        assert_eq!(id_order(&items), vec![1, 2, 3, 4, 0]);
        assert!(items.check_consistency().is_consistent());
    }

    #[tokio::test]
    async fn stop_flag_persists_until_resumed() {
        let mut items = collection(4);
        let reorderer = Reorderer::new(FakeSetter::default());
        reorderer.stop_flag().store(true, Ordering::Relaxed);

        let cancelled = reorderer
            .move_many(&mut items, &[FieldId(0)], FieldId(3), Position::After)
            .await
            .expect("batch should run");
        let still_cancelled = reorderer
            .move_many(&mut items, &[FieldId(0)], FieldId(3), Position::After)
            .await
            .expect("batch should run");
        assert_eq!(cancelled.outcome_for(FieldId(0)), Some(&MoveOutcome::Cancelled));
        assert_eq!(
            still_cancelled.outcome_for(FieldId(0)),
            Some(&MoveOutcome::Cancelled)
        );

        reorderer.resume();
        let resumed = reorderer
            .move_many(&mut items, &[FieldId(0)], FieldId(3), Position::After)
            .await
            .expect("batch should run");
        assert_eq!(
            resumed.outcome_for(FieldId(0)),
            Some(&MoveOutcome::Moved { from: 0, to: 3 })
        );
        assert!(!reorderer.is_stopped());
    }
}
