use super::Page;
use crate::lookup::{
    CancellationToken, LookupDispatch, LookupOutcome, LookupTransport, WidgetId,
};
use crate::scheduler::{PendingTimer, ScheduledTask, StepOutcome, TimerTask};
use crate::{Error, Result};

impl Page {
    pub fn now_ms(&self) -> i64 {
        self.scheduler.now_ms
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        self.scheduler.pending()
    }

    pub fn clear_timer(&mut self, timer_id: i64) -> bool {
        let existed = self.scheduler.clear(timer_id);
        self.trace_timer_line(format!("[timer] clear id={timer_id} existed={existed}"));
        existed
    }

    pub fn clear_all_timers(&mut self) -> usize {
        let cleared = self.scheduler.clear_all();
        self.trace_timer_line(format!("[timer] clear_all cleared={cleared}"));
        cleared
    }

    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if delta_ms < 0 {
            return Err(Error::Runtime(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let from = self.scheduler.now_ms;
        let to = from.saturating_add(delta_ms);
        let ran = self.run_timer_queue(Some(to), true)?;
        self.scheduler.now_ms = to;
        self.trace_timer_line(format!(
            "[timer] advance delta_ms={delta_ms} from={from} to={to} ran_due={ran}"
        ));
        Ok(())
    }

    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        if target_ms < self.scheduler.now_ms {
            return Err(Error::Runtime(format!(
                "advance_time_to requires target >= now_ms (target={target_ms}, now_ms={})",
                self.scheduler.now_ms
            )));
        }
        let from = self.scheduler.now_ms;
        let ran = self.run_timer_queue(Some(target_ms), true)?;
        self.scheduler.now_ms = target_ms;
        self.trace_timer_line(format!(
            "[timer] advance_to from={from} to={target_ms} ran_due={ran}"
        ));
        Ok(())
    }

    /// Runs every queued task, jumping the clock to each due time, until the
    /// queue drains.
    pub fn flush(&mut self) -> Result<()> {
        let from = self.scheduler.now_ms;
        let ran = self.run_timer_queue(None, true)?;
        self.trace_timer_line(format!(
            "[timer] flush from={from} to={} ran={ran}",
            self.scheduler.now_ms
        ));
        Ok(())
    }

    pub fn run_due_timers(&mut self) -> Result<usize> {
        let now = self.scheduler.now_ms;
        let ran = self.run_timer_queue(Some(now), false)?;
        self.trace_timer_line(format!("[timer] run_due now_ms={now} ran={ran}"));
        Ok(ran)
    }

    pub fn run_next_timer(&mut self) -> Result<bool> {
        let Some(task) = self.scheduler.pop_next(None) else {
            self.trace_timer_line("[timer] run_next none".into());
            return Ok(false);
        };
        if task.due_at > self.scheduler.now_ms {
            self.scheduler.now_ms = task.due_at;
        }
        self.execute_timer_task(task)?;
        Ok(true)
    }

    fn run_timer_queue(&mut self, due_limit: Option<i64>, advance_clock: bool) -> Result<usize> {
        let mut steps = 0usize;
        while self.scheduler.has_next(due_limit) {
            steps += 1;
            if steps > self.scheduler.timer_step_limit {
                return Err(self.scheduler.step_limit_error(steps, due_limit));
            }
            let Some(task) = self.scheduler.pop_next(due_limit) else {
                break;
            };
            if advance_clock && task.due_at > self.scheduler.now_ms {
                self.scheduler.now_ms = task.due_at;
            }
            self.execute_timer_task(task)?;
        }
        Ok(steps)
    }

    fn execute_timer_task(&mut self, task: ScheduledTask) -> Result<()> {
        let interval_desc = task
            .interval_ms
            .map(|value| value.to_string())
            .unwrap_or_else(|| "none".into());
        self.trace_timer_line(format!(
            "[timer] run id={} due_at={} interval_ms={} now_ms={}",
            task.id, task.due_at, interval_desc, self.scheduler.now_ms
        ));

        self.scheduler.begin_run(task.id);
        let result = match &task.task {
            TimerTask::Animation(slot) => self.step_animation(*slot),
            TimerTask::LookupResponse {
                widget,
                token,
                outcome,
            } => self.deliver_lookup(*widget, *token, outcome.clone()),
        };
        let id = task.id;
        let requeued = self.scheduler.finish_run(task);
        result?;

        if let Some(due_at) = requeued {
            self.trace_timer_line(format!("[timer] requeue id={id} due_at={due_at}"));
        }
        Ok(())
    }

    /// Sends a widget's request and queues delivery of its outcome.
    pub(crate) fn send_lookup(&mut self, id: WidgetId, dispatch: LookupDispatch) -> Result<()> {
        if let Some(superseded) = dispatch.superseded {
            self.abort_delivery(id, superseded);
        }

        let request = dispatch.request;
        let outcome = match self.transport.as_mut() {
            Some(transport) => transport.send(&request),
            None => self.lookup_mocks.send(&request),
        };
        self.trace_lookup_line(format!(
            "[lookup] send widget={} token={} url={}",
            id.0,
            request.token.generation(),
            request.url
        ));
        self.scheduler.set_timeout(
            self.config.lookup.latency_ms,
            TimerTask::LookupResponse {
                widget: id,
                token: request.token,
                outcome,
            },
        );
        Ok(())
    }

    /// Removes the delivery of a request the widget cancelled itself.
    pub(crate) fn abort_cancelled_lookup(&mut self, id: WidgetId) -> Result<()> {
        let idx = self.widget_index(id)?;
        if let Some(token) = self.widgets[idx].take_cancelled() {
            self.abort_delivery(id, token);
        }
        Ok(())
    }

    fn abort_delivery(&mut self, id: WidgetId, token: CancellationToken) {
        let removed = self.scheduler.abort_lookup(token);
        self.trace_lookup_line(format!(
            "[lookup] abort widget={} token={} removed_delivery={removed}",
            id.0,
            token.generation()
        ));
    }

    fn deliver_lookup(
        &mut self,
        id: WidgetId,
        token: CancellationToken,
        outcome: LookupOutcome,
    ) -> Result<()> {
        let idx = self.widget_index(id)?;
        let rendered = self.widgets[idx].complete(&mut self.dom, token, outcome)?;
        let state = self.widgets[idx].state();
        self.trace_lookup_line(format!(
            "[lookup] deliver widget={} token={} rendered={rendered} state={state:?}",
            id.0,
            token.generation()
        ));
        Ok(())
    }

    /// Runs an animation's `start` and puts it on its interval unless it
    /// already finished.
    pub(crate) fn start_animation(&mut self, slot: usize) -> Result<()> {
        let Some(entry) = self.animations.get_mut(slot) else {
            return Ok(());
        };
        if entry.started {
            return Ok(());
        }
        entry.started = true;
        let outcome = entry.animation.start(&mut self.dom)?;
        let name = entry.animation.name();
        if outcome == StepOutcome::Finished {
            entry.finished = true;
            self.trace_timer_line(format!("[timer] animation {name} slot={slot} finished on start"));
            return Ok(());
        }
        let interval_ms = entry.interval_ms;
        let timer_id = self
            .scheduler
            .set_interval(interval_ms, TimerTask::Animation(slot));
        entry.timer_id = Some(timer_id);
        self.trace_timer_line(format!(
            "[timer] animation {name} slot={slot} started id={timer_id} interval_ms={interval_ms}"
        ));
        Ok(())
    }

    fn step_animation(&mut self, slot: usize) -> Result<()> {
        let Some(entry) = self.animations.get_mut(slot) else {
            return Ok(());
        };
        if entry.finished {
            if let Some(timer_id) = entry.timer_id {
                self.scheduler.clear(timer_id);
            }
            return Ok(());
        }
        if entry.animation.step(&mut self.dom)? == StepOutcome::Finished {
            entry.finished = true;
            let name = entry.animation.name();
            if let Some(timer_id) = entry.timer_id {
                self.scheduler.clear(timer_id);
            }
            self.trace_timer_line(format!("[timer] animation {name} slot={slot} finished"));
        }
        Ok(())
    }
}
