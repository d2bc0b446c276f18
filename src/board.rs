//! Kanban board move reconciliation.
//!
//! A drop on the board becomes a status/order mutation that is applied
//! locally first, then confirmed against the backend of record. Each
//! task's move passes through three states: settled, pending (optimistic
//! move applied, awaiting confirmation), and back to settled on success
//! or rolled-back on failure. The server's returned representation is
//! authoritative; local optimistic values are provisional.
//!
//! At most one move per task may be in flight. A second drop on a
//! pending task is rejected outright rather than queued, so a slow
//! confirmation can never interleave with a newer write and corrupt
//! column order.

use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::client::{ApiError, ApiResult};
use crate::models::{Task, TaskStatus};

/// The narrow slice of the resource client a move needs. Tests drive the
/// reconciler with stub implementations of this.
pub trait MoveBackend {
    fn move_task(&self, id: i64, status: TaskStatus, order: i64) -> ApiResult<Task>;
}

/// Where a dragged task was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Directly on a status column.
    Column(TaskStatus),
    /// On another task. This resolves to that task's column; the dragged
    /// task is appended, not inserted at the sibling's position.
    OnTask(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveState {
    /// Matches the last known server state.
    #[default]
    Settled,
    /// Optimistic move applied locally, awaiting confirmation.
    Pending,
    /// Last move failed and was reverted to its pre-move values.
    RolledBack,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("task #{0} is not on the board")]
    UnknownTask(i64),
    #[error("task #{0} already has a move in flight")]
    InFlight(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropError {
    #[error(transparent)]
    Move(#[from] MoveError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A resolved drop: what would change if the move goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    pub task_id: i64,
    pub from: TaskStatus,
    pub to: TaskStatus,
    /// Position in the target column: 0 for an empty column, otherwise
    /// one past the current maximum.
    pub order: i64,
}

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    id: i64,
    status: TaskStatus,
    order: i64,
}

#[derive(Debug, Clone)]
pub enum DropOutcome {
    /// Same column or self-drop; no request was issued.
    NoOp,
    /// Confirmed by the server; this is the authoritative record.
    Moved(Task),
}

/// Active (non-archived) tasks of one project, grouped by status column.
#[derive(Debug, Default)]
pub struct Board {
    tasks: Vec<Task>,
    states: HashMap<i64, MoveState>,
    pending: HashMap<i64, Vec<Snapshot>>,
}

impl Board {
    /// Builds a board from a project's task list. Archived tasks never
    /// appear on the board.
    pub fn new(tasks: impl IntoIterator<Item = Task>) -> Board {
        let mut tasks: Vec<Task> = tasks.into_iter().filter(|t| !t.archived).collect();
        tasks.sort_by_key(|t| (t.status.as_str(), t.order, t.id));
        Board {
            tasks,
            states: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    pub fn task(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks of one column, order ascending.
    pub fn column(&self, status: TaskStatus) -> Vec<&Task> {
        let mut col: Vec<&Task> = self.tasks.iter().filter(|t| t.status == status).collect();
        col.sort_by_key(|t| t.order);
        col
    }

    /// Order a newly created or newly moved task takes in `status`.
    pub fn next_order(&self, status: TaskStatus) -> i64 {
        self.tasks
            .iter()
            .filter(|t| t.status == status)
            .map(|t| t.order + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn state(&self, id: i64) -> MoveState {
        self.states.get(&id).copied().unwrap_or_default()
    }

    /// Resolves a drop to a move, or `None` when nothing would change
    /// (self-drop, or target column equals the current column) and no
    /// request should be issued.
    pub fn plan_drop(&self, task_id: i64, target: DropTarget) -> Result<Option<MovePlan>, MoveError> {
        let task = self.task(task_id).ok_or(MoveError::UnknownTask(task_id))?;
        if self.pending.contains_key(&task_id) {
            return Err(MoveError::InFlight(task_id));
        }

        let to = match target {
            DropTarget::Column(status) => status,
            DropTarget::OnTask(other) if other == task_id => return Ok(None),
            DropTarget::OnTask(other) => {
                self.task(other).ok_or(MoveError::UnknownTask(other))?.status
            }
        };

        if to == task.status {
            return Ok(None);
        }

        Ok(Some(MovePlan {
            task_id,
            from: task.status,
            to,
            order: self.next_order(to),
        }))
    }

    /// Applies the move optimistically. The dragged task takes its new
    /// column and order; the source column is renumbered so orders stay
    /// contiguous. Everything touched is snapshotted for rollback.
    pub fn begin(&mut self, plan: &MovePlan) -> Result<(), MoveError> {
        if self.pending.contains_key(&plan.task_id) {
            return Err(MoveError::InFlight(plan.task_id));
        }

        let moved_order = self
            .task(plan.task_id)
            .ok_or(MoveError::UnknownTask(plan.task_id))?
            .order;

        let mut snapshots = Vec::new();
        for task in &mut self.tasks {
            if task.id == plan.task_id {
                snapshots.push(Snapshot {
                    id: task.id,
                    status: task.status,
                    order: task.order,
                });
                task.status = plan.to;
                task.order = plan.order;
            } else if task.status == plan.from && task.order > moved_order {
                snapshots.push(Snapshot {
                    id: task.id,
                    status: task.status,
                    order: task.order,
                });
                task.order -= 1;
            }
        }

        debug!(task = plan.task_id, from = %plan.from, to = %plan.to, "optimistic move");
        self.pending.insert(plan.task_id, snapshots);
        self.states.insert(plan.task_id, MoveState::Pending);
        Ok(())
    }

    /// Adopts the server's representation after a confirmed move and
    /// renormalizes the affected columns.
    pub fn settle(&mut self, id: i64, server: Task) {
        let prior = self
            .pending
            .remove(&id)
            .and_then(|snaps| snaps.into_iter().find(|s| s.id == id));

        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            let landed = server.status;
            let archived = server.archived;
            *task = server;
            if archived {
                self.tasks.retain(|t| t.id != id);
            }
            self.normalize(landed);
            if let Some(snap) = prior {
                if snap.status != landed {
                    self.normalize(snap.status);
                }
            }
        }
        self.states.insert(id, MoveState::Settled);
    }

    /// Reverts every task touched by the optimistic move to its exact
    /// pre-move status and order. No partial state survives.
    pub fn roll_back(&mut self, id: i64) {
        let Some(snapshots) = self.pending.remove(&id) else {
            return;
        };
        for snap in snapshots {
            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == snap.id) {
                task.status = snap.status;
                task.order = snap.order;
            }
        }
        debug!(task = id, "move rolled back");
        self.states.insert(id, MoveState::RolledBack);
    }

    /// Renumbers one column to 0..n, keeping relative order (ties break
    /// by id, the insertion order the backend assigns).
    fn normalize(&mut self, status: TaskStatus) {
        let mut ids: Vec<(i64, i64)> = self
            .tasks
            .iter()
            .filter(|t| t.status == status)
            .map(|t| (t.order, t.id))
            .collect();
        ids.sort();
        for (rank, (_, id)) in ids.into_iter().enumerate() {
            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
                task.order = rank as i64;
            }
        }
    }
}

/// Runs one full drop cycle: plan, apply optimistically, confirm with
/// the backend, then settle or roll back. On failure the board is
/// exactly as it was before the drop and the failure reason propagates
/// to the caller.
pub fn apply_drop<B: MoveBackend>(
    board: &mut Board,
    backend: &B,
    task_id: i64,
    target: DropTarget,
) -> Result<DropOutcome, DropError> {
    let Some(plan) = board.plan_drop(task_id, target)? else {
        return Ok(DropOutcome::NoOp);
    };
    board.begin(&plan)?;

    match backend.move_task(task_id, plan.to, plan.order) {
        Ok(server) => {
            board.settle(task_id, server.clone());
            Ok(DropOutcome::Moved(server))
        }
        Err(reason) => {
            board.roll_back(task_id);
            Err(reason.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;

    fn task(id: i64, status: TaskStatus, order: i64) -> Task {
        Task {
            id,
            title: format!("task {}", id),
            description: String::new(),
            status,
            order,
            assignees: Vec::new(),
            label: None,
            project: 1,
            archived: false,
            created_at: None,
        }
    }

    /// Confirms every move, echoing the requested status/order back as
    /// the server representation, and counts calls.
    struct OkBackend {
        calls: RefCell<u32>,
    }

    impl OkBackend {
        fn new() -> OkBackend {
            OkBackend {
                calls: RefCell::new(0),
            }
        }
    }

    impl MoveBackend for OkBackend {
        fn move_task(&self, id: i64, status: TaskStatus, order: i64) -> ApiResult<Task> {
            *self.calls.borrow_mut() += 1;
            Ok(task(id, status, order))
        }
    }

    struct FailBackend {
        reason: ApiError,
    }

    impl MoveBackend for FailBackend {
        fn move_task(&self, _: i64, _: TaskStatus, _: i64) -> ApiResult<Task> {
            Err(self.reason.clone())
        }
    }

    fn column_ids(board: &Board, status: TaskStatus) -> Vec<i64> {
        board.column(status).iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_archived_tasks_never_join_the_board() {
        let mut archived = task(3, TaskStatus::Ongoing, 0);
        archived.archived = true;
        let board = Board::new(vec![task(1, TaskStatus::NotStarted, 0), archived]);
        assert!(board.task(3).is_none());
        assert!(column_ids(&board, TaskStatus::Ongoing).is_empty());
    }

    #[test]
    fn test_drop_on_own_column_issues_no_request() {
        let mut board = Board::new(vec![task(1, TaskStatus::NotStarted, 0)]);
        let backend = OkBackend::new();
        let outcome = apply_drop(
            &mut board,
            &backend,
            1,
            DropTarget::Column(TaskStatus::NotStarted),
        )
        .unwrap();
        assert!(matches!(outcome, DropOutcome::NoOp));
        assert_eq!(*backend.calls.borrow(), 0);
        assert_eq!(board.task(1).unwrap().order, 0);
    }

    #[test]
    fn test_drop_on_itself_is_noop() {
        let mut board = Board::new(vec![task(1, TaskStatus::NotStarted, 0)]);
        let backend = OkBackend::new();
        let outcome = apply_drop(&mut board, &backend, 1, DropTarget::OnTask(1)).unwrap();
        assert!(matches!(outcome, DropOutcome::NoOp));
        assert_eq!(*backend.calls.borrow(), 0);
    }

    #[test]
    fn test_drop_on_task_adopts_that_tasks_column() {
        let mut board = Board::new(vec![
            task(1, TaskStatus::NotStarted, 0),
            task(2, TaskStatus::InReview, 0),
        ]);
        let backend = OkBackend::new();
        apply_drop(&mut board, &backend, 1, DropTarget::OnTask(2)).unwrap();
        assert_eq!(board.task(1).unwrap().status, TaskStatus::InReview);
        // Appended after the existing occupant, not inserted before it.
        assert_eq!(column_ids(&board, TaskStatus::InReview), vec![2, 1]);
    }

    #[test]
    fn test_empty_column_gets_order_zero() {
        let board = Board::new(vec![task(1, TaskStatus::NotStarted, 0)]);
        let plan = board
            .plan_drop(1, DropTarget::Column(TaskStatus::Ongoing))
            .unwrap()
            .unwrap();
        assert_eq!(plan.order, 0);
    }

    #[test]
    fn test_occupied_column_appends_past_max() {
        let board = Board::new(vec![
            task(1, TaskStatus::NotStarted, 0),
            task(2, TaskStatus::Ongoing, 0),
            task(3, TaskStatus::Ongoing, 1),
        ]);
        let plan = board
            .plan_drop(1, DropTarget::Column(TaskStatus::Ongoing))
            .unwrap()
            .unwrap();
        assert_eq!(plan.order, 2);
    }

    #[test]
    fn test_successful_move_scenario() {
        // NOT_STARTED: [t1#0, t2#1] ; drop t1 on ONGOING.
        let mut board = Board::new(vec![
            task(1, TaskStatus::NotStarted, 0),
            task(2, TaskStatus::NotStarted, 1),
        ]);
        let backend = OkBackend::new();
        let outcome =
            apply_drop(&mut board, &backend, 1, DropTarget::Column(TaskStatus::Ongoing)).unwrap();

        assert!(matches!(outcome, DropOutcome::Moved(_)));
        assert_eq!(column_ids(&board, TaskStatus::NotStarted), vec![2]);
        assert_eq!(board.task(2).unwrap().order, 0);
        assert_eq!(column_ids(&board, TaskStatus::Ongoing), vec![1]);
        assert_eq!(board.task(1).unwrap().order, 0);
        assert_eq!(board.state(1), MoveState::Settled);
    }

    #[test]
    fn test_optimistic_move_is_visible_before_confirmation() {
        let mut board = Board::new(vec![
            task(1, TaskStatus::NotStarted, 0),
            task(2, TaskStatus::NotStarted, 1),
        ]);
        let plan = board
            .plan_drop(1, DropTarget::Column(TaskStatus::Ongoing))
            .unwrap()
            .unwrap();
        board.begin(&plan).unwrap();

        assert_eq!(board.task(1).unwrap().status, TaskStatus::Ongoing);
        assert_eq!(board.state(1), MoveState::Pending);
        // Source column already renumbered.
        assert_eq!(board.task(2).unwrap().order, 0);
    }

    #[test]
    fn test_failed_move_rolls_back_exactly() {
        let mut board = Board::new(vec![
            task(1, TaskStatus::NotStarted, 0),
            task(2, TaskStatus::NotStarted, 1),
            task(3, TaskStatus::Ongoing, 0),
        ]);
        let backend = FailBackend {
            reason: ApiError::Forbidden,
        };
        let err = apply_drop(&mut board, &backend, 1, DropTarget::Column(TaskStatus::Ongoing))
            .unwrap_err();

        assert_eq!(err, DropError::Api(ApiError::Forbidden));
        assert_eq!(board.task(1).unwrap().status, TaskStatus::NotStarted);
        assert_eq!(board.task(1).unwrap().order, 0);
        assert_eq!(board.task(2).unwrap().order, 1);
        assert_eq!(column_ids(&board, TaskStatus::Ongoing), vec![3]);
        assert_eq!(board.state(1), MoveState::RolledBack);
    }

    #[test]
    fn test_second_drag_while_pending_is_rejected() {
        let mut board = Board::new(vec![task(1, TaskStatus::NotStarted, 0)]);
        let plan = board
            .plan_drop(1, DropTarget::Column(TaskStatus::Ongoing))
            .unwrap()
            .unwrap();
        board.begin(&plan).unwrap();

        let err = board
            .plan_drop(1, DropTarget::Column(TaskStatus::InReview))
            .unwrap_err();
        assert_eq!(err, MoveError::InFlight(1));
    }

    #[test]
    fn test_unknown_task_is_an_error() {
        let board = Board::new(vec![]);
        assert_eq!(
            board.plan_drop(9, DropTarget::Column(TaskStatus::Ongoing)),
            Err(MoveError::UnknownTask(9))
        );
    }

    #[test]
    fn test_settling_an_archived_record_drops_it_from_the_board() {
        let mut board = Board::new(vec![
            task(1, TaskStatus::NotStarted, 0),
            task(2, TaskStatus::NotStarted, 1),
        ]);
        let plan = board
            .plan_drop(1, DropTarget::Column(TaskStatus::Ongoing))
            .unwrap()
            .unwrap();
        board.begin(&plan).unwrap();

        let mut server = task(1, TaskStatus::Ongoing, 0);
        server.archived = true;
        board.settle(1, server);

        assert!(board.task(1).is_none());
        assert_eq!(column_ids(&board, TaskStatus::Ongoing), Vec::<i64>::new());
        assert_eq!(column_ids(&board, TaskStatus::NotStarted), vec![2]);
        assert_eq!(board.task(2).unwrap().order, 0);
    }

    #[test]
    fn test_server_order_wins_over_optimistic_order() {
        let mut board = Board::new(vec![
            task(1, TaskStatus::NotStarted, 0),
            task(2, TaskStatus::Ongoing, 0),
        ]);
        let plan = board
            .plan_drop(1, DropTarget::Column(TaskStatus::Ongoing))
            .unwrap()
            .unwrap();
        board.begin(&plan).unwrap();

        // The server decided the moved task goes first.
        board.settle(1, task(1, TaskStatus::Ongoing, 0));

        assert_eq!(column_ids(&board, TaskStatus::Ongoing), vec![1, 2]);
        let orders: Vec<i64> = board
            .column(TaskStatus::Ongoing)
            .iter()
            .map(|t| t.order)
            .collect();
        assert_eq!(orders, vec![0, 1]);
    }

    proptest! {
        /// After any confirmed cross-column move, both affected columns
        /// hold contiguous orders starting at zero.
        #[test]
        fn prop_columns_stay_contiguous_after_moves(
            sizes in (0usize..6, 0usize..6),
            pick in 0usize..6,
        ) {
            let (n_src, n_dst) = sizes;
            prop_assume!(n_src > 0);
            let pick = pick % n_src;

            let mut tasks = Vec::new();
            let mut id = 1;
            for i in 0..n_src {
                tasks.push(task(id, TaskStatus::NotStarted, i as i64));
                id += 1;
            }
            for i in 0..n_dst {
                tasks.push(task(id, TaskStatus::Ongoing, i as i64));
                id += 1;
            }
            let dragged = (pick + 1) as i64;

            let mut board = Board::new(tasks);
            let backend = OkBackend::new();
            apply_drop(&mut board, &backend, dragged, DropTarget::Column(TaskStatus::Ongoing))
                .unwrap();

            for status in [TaskStatus::NotStarted, TaskStatus::Ongoing] {
                let orders: Vec<i64> = board.column(status).iter().map(|t| t.order).collect();
                let expected: Vec<i64> = (0..orders.len() as i64).collect();
                prop_assert_eq!(orders, expected);
            }
            prop_assert_eq!(board.column(TaskStatus::NotStarted).len(), n_src - 1);
            prop_assert_eq!(board.column(TaskStatus::Ongoing).len(), n_dst + 1);
        }
    }
}
