use crate::dom::Dom;
use crate::lookup::{CancellationToken, LookupOutcome, WidgetId};
use crate::{Error, Result};

/// Result of advancing an [`Animation`] by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Finished,
}

/// A frame-stepped visual effect driven by the page's timer queue.
///
/// `prepare` runs once when the effect is registered, `start` once when it is
/// triggered, then `step` runs on every interval tick. The interval is cleared
/// as soon as either `start` or `step` reports [`StepOutcome::Finished`].
pub trait Animation {
    fn prepare(&mut self, _dom: &mut Dom) -> Result<()> {
        Ok(())
    }

    fn start(&mut self, _dom: &mut Dom) -> Result<StepOutcome> {
        Ok(StepOutcome::Continue)
    }

    fn step(&mut self, dom: &mut Dom) -> Result<StepOutcome>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
pub(crate) enum TimerTask {
    Animation(usize),
    LookupResponse {
        widget: WidgetId,
        token: CancellationToken,
        outcome: LookupOutcome,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct ScheduledTask {
    pub(crate) id: i64,
    pub(crate) due_at: i64,
    pub(crate) order: i64,
    pub(crate) interval_ms: Option<i64>,
    pub(crate) task: TimerTask,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: i64,
    pub due_at: i64,
    pub order: i64,
    pub interval_ms: Option<i64>,
}

#[derive(Debug)]
pub(crate) struct Scheduler {
    task_queue: Vec<ScheduledTask>,
    pub(crate) now_ms: i64,
    pub(crate) timer_step_limit: usize,
    next_timer_id: i64,
    next_task_order: i64,
    running_timer_id: Option<i64>,
    running_timer_canceled: bool,
}

impl Scheduler {
    pub(crate) fn new(timer_step_limit: usize) -> Self {
        Self {
            task_queue: Vec::new(),
            now_ms: 0,
            timer_step_limit,
            next_timer_id: 1,
            next_task_order: 0,
            running_timer_id: None,
            running_timer_canceled: false,
        }
    }

    pub(crate) fn set_timeout(&mut self, delay_ms: i64, task: TimerTask) -> i64 {
        self.schedule(delay_ms, None, task)
    }

    pub(crate) fn set_interval(&mut self, interval_ms: i64, task: TimerTask) -> i64 {
        self.schedule(interval_ms, Some(interval_ms.max(0)), task)
    }

    fn schedule(&mut self, delay_ms: i64, interval_ms: Option<i64>, task: TimerTask) -> i64 {
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        let due_at = self.now_ms.saturating_add(delay_ms.max(0));
        let order = self.next_order();
        self.task_queue.push(ScheduledTask {
            id,
            due_at,
            order,
            interval_ms,
            task,
        });
        id
    }

    fn next_order(&mut self) -> i64 {
        let order = self.next_task_order;
        self.next_task_order += 1;
        order
    }

    /// Removes a queued timer; clearing the running timer stops its re-queue.
    pub(crate) fn clear(&mut self, timer_id: i64) -> bool {
        let before = self.task_queue.len();
        self.task_queue.retain(|task| task.id != timer_id);
        let running = self.running_timer_id == Some(timer_id);
        if running {
            self.running_timer_canceled = true;
        }
        running || self.task_queue.len() != before
    }

    pub(crate) fn clear_all(&mut self) -> usize {
        let cleared = self.task_queue.len();
        self.task_queue.clear();
        if self.running_timer_id.is_some() {
            self.running_timer_canceled = true;
        }
        cleared
    }

    /// Drops queued lookup deliveries carrying `token`.
    pub(crate) fn abort_lookup(&mut self, token: CancellationToken) -> usize {
        let before = self.task_queue.len();
        self.task_queue.retain(|task| {
            !matches!(
                &task.task,
                TimerTask::LookupResponse { token: queued, .. } if *queued == token
            )
        });
        before - self.task_queue.len()
    }

    pub(crate) fn pending(&self) -> Vec<PendingTimer> {
        let mut timers = self
            .task_queue
            .iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
                interval_ms: task.interval_ms,
            })
            .collect::<Vec<_>>();
        timers.sort_by_key(|timer| (timer.due_at, timer.order));
        timers
    }

    fn next_task_index(&self, due_limit: Option<i64>) -> Option<usize> {
        self.task_queue
            .iter()
            .enumerate()
            .filter(|(_, task)| due_limit.is_none_or(|limit| task.due_at <= limit))
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(idx, _)| idx)
    }

    pub(crate) fn has_next(&self, due_limit: Option<i64>) -> bool {
        self.next_task_index(due_limit).is_some()
    }

    pub(crate) fn pop_next(&mut self, due_limit: Option<i64>) -> Option<ScheduledTask> {
        let idx = self.next_task_index(due_limit)?;
        Some(self.task_queue.remove(idx))
    }

    pub(crate) fn begin_run(&mut self, timer_id: i64) {
        self.running_timer_id = Some(timer_id);
        self.running_timer_canceled = false;
    }

    /// Ends a timer run and re-queues intervals that were not cleared while
    /// running. Returns the next due time when re-queued.
    pub(crate) fn finish_run(&mut self, task: ScheduledTask) -> Option<i64> {
        let canceled = self.running_timer_canceled;
        self.running_timer_id = None;
        self.running_timer_canceled = false;

        let interval_ms = task.interval_ms?;
        if canceled {
            return None;
        }
        let due_at = task.due_at.saturating_add(interval_ms);
        let order = self.next_order();
        self.task_queue.push(ScheduledTask {
            due_at,
            order,
            ..task
        });
        Some(due_at)
    }

    pub(crate) fn step_limit_error(&self, steps: usize, due_limit: Option<i64>) -> Error {
        let due_limit_desc = due_limit
            .map(|value| value.to_string())
            .unwrap_or_else(|| "none".into());

        let next_task_desc = self
            .next_task_index(due_limit)
            .and_then(|idx| self.task_queue.get(idx))
            .map(|task| {
                let interval_desc = task
                    .interval_ms
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "none".into());
                format!(
                    "id={},due_at={},order={},interval_ms={}",
                    task.id, task.due_at, task.order, interval_desc
                )
            })
            .unwrap_or_else(|| "none".into());

        Error::Runtime(format!(
            "timer queue exceeded max steps (possible uncleared interval): limit={}, steps={steps}, now_ms={}, due_limit={due_limit_desc}, pending_tasks={}, next_task={next_task_desc}",
            self.timer_step_limit,
            self.now_ms,
            self.task_queue.len(),
        ))
    }
}
