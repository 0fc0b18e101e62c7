//! Main execution engine - orchestrates an entire plan run

use crate::core::{
    Coordinate, InstanceId, JobState, JobStatus, PlanStatus, ResultStore, RunContext, StepOutcome,
    StepSpec, StepStatus, Workflow,
};
use crate::execution::runner::{RunnerError, StepRunner};
use crate::execution::scheduler;
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify, Semaphore};
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Events that occur during a run
#[derive(Debug, Clone)]
pub enum RunEvent {
    RunStarted {
        run_id: Uuid,
        workflow: String,
    },
    JobStarted {
        id: InstanceId,
    },
    JobSkipped {
        id: InstanceId,
        reason: String,
    },
    StepFinished {
        id: InstanceId,
        step: String,
        status: StepStatus,
    },
    JobFinished {
        id: InstanceId,
        status: JobStatus,
    },
    RunFinished {
        run_id: Uuid,
        status: PlanStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(RunEvent) + Send + Sync>;

/// Final report of a run: one row per instance plus the plan status
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub workflow: String,
    pub status: PlanStatus,
    pub instances: Vec<InstanceReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstanceReport {
    pub id: InstanceId,
    pub status: JobStatus,
    /// Why the instance was skipped, when it was
    pub reason: Option<String>,
    pub outcomes: Vec<StepOutcome>,
}

impl RunReport {
    pub fn instance(&self, job: &str) -> Option<&InstanceReport> {
        self.instances.iter().find(|r| r.id.job == job)
    }
}

/// Drives a plan to completion: dispatches ready instances onto a
/// bounded worker pool, waits on a condition signal between rounds, and
/// records every transition in the result store.
pub struct ExecutionEngine<R> {
    runner: Arc<R>,
    handlers: Arc<Mutex<Vec<EventHandler>>>,
}

impl<R: StepRunner + 'static> ExecutionEngine<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner: Arc::new(runner),
            handlers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add an event handler
    pub async fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(RunEvent) + Send + Sync + 'static,
    {
        self.handlers.lock().await.push(Arc::new(handler));
    }

    /// Execute the plan and return the per-instance report.
    ///
    /// Structural failures were ruled out at plan build; runner errors
    /// are recorded as step failures, so the run itself cannot error.
    pub async fn execute(&self, workflow: &Workflow, ctx: &RunContext) -> RunReport {
        let store = Arc::new(Mutex::new(ResultStore::new(workflow.instances.clone())));
        let notify = Arc::new(Notify::new());
        let semaphore = Arc::new(Semaphore::new(workflow.worker_count()));
        let ctx = Arc::new(ctx.clone());

        info!(
            "Starting run {} of workflow '{}' ({} instances)",
            ctx.run_id,
            workflow.name,
            workflow.instances.len()
        );
        emit(
            &self.handlers,
            RunEvent::RunStarted {
                run_id: ctx.run_id,
                workflow: workflow.name.clone(),
            },
        )
        .await;

        loop {
            // Register interest before inspecting state; transitions
            // store a permit, so a signal between the scan and the await
            // is not lost.
            let notified = notify.notified();

            let mut events = Vec::new();
            let mut dispatches = Vec::new();
            let done = {
                let mut guard = store.lock().await;

                if workflow.fail_fast && guard.any_failed() && !guard.cancelled() {
                    let pending: Vec<InstanceId> = guard
                        .instances()
                        .iter()
                        .filter(|i| matches!(i.state, JobState::Pending))
                        .map(|i| i.id.clone())
                        .collect();
                    guard.cancel_not_started("cancelled (fail-fast)");
                    for id in pending {
                        events.push(RunEvent::JobSkipped {
                            id,
                            reason: "cancelled (fail-fast)".to_string(),
                        });
                    }
                }

                for id in scheduler::ready_instances(&guard, workflow) {
                    let template = match workflow.template(&id.job) {
                        Some(t) => t,
                        None => continue,
                    };
                    guard.set_state(&id, JobState::Ready);

                    let upstream = scheduler::upstream_statuses(&guard, workflow, &id.job);
                    if template.gate().evaluate(&ctx, &upstream) {
                        dispatches.push((id, template.steps.clone(), upstream));
                    } else {
                        let reason = if template.condition.is_some() {
                            "condition evaluated to false"
                        } else {
                            "upstream dependencies did not succeed"
                        };
                        debug!("Skipping {}: {}", id, reason);
                        guard.set_state(
                            &id,
                            JobState::Skipped {
                                reason: reason.to_string(),
                            },
                        );
                        events.push(RunEvent::JobSkipped {
                            id,
                            reason: reason.to_string(),
                        });
                    }
                }

                guard.all_terminal()
            };

            let progressed = !events.is_empty() || !dispatches.is_empty();
            for event in events {
                emit(&self.handlers, event).await;
            }
            for (id, steps, upstream) in dispatches {
                self.spawn_instance(
                    id,
                    steps,
                    upstream,
                    store.clone(),
                    notify.clone(),
                    semaphore.clone(),
                    ctx.clone(),
                );
            }

            if done {
                break;
            }
            if progressed {
                // skips may have unblocked downstream jobs; re-scan
                continue;
            }
            notified.await;
        }

        let guard = store.lock().await;
        let status = scheduler::plan_status(&guard);
        let report = RunReport {
            run_id: ctx.run_id,
            workflow: workflow.name.clone(),
            status,
            instances: guard
                .instances()
                .iter()
                .map(|instance| InstanceReport {
                    id: instance.id.clone(),
                    status: instance.state.status(),
                    reason: match &instance.state {
                        JobState::Skipped { reason } => Some(reason.clone()),
                        _ => None,
                    },
                    outcomes: instance.outcomes.clone(),
                })
                .collect(),
        };
        drop(guard);

        info!("Run {} finished: {:?}", ctx.run_id, status);
        emit(
            &self.handlers,
            RunEvent::RunFinished {
                run_id: ctx.run_id,
                status,
            },
        )
        .await;

        report
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn_instance(
        &self,
        id: InstanceId,
        steps: Vec<StepSpec>,
        upstream: BTreeMap<String, JobStatus>,
        store: Arc<Mutex<ResultStore>>,
        notify: Arc<Notify>,
        semaphore: Arc<Semaphore>,
        ctx: Arc<RunContext>,
    ) {
        let runner = self.runner.clone();
        let handlers = self.handlers.clone();

        tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };

            let started_at = Utc::now();
            {
                let mut guard = store.lock().await;
                // ready but cancelled before a worker picked it up
                if guard.cancelled() {
                    guard.set_state(
                        &id,
                        JobState::Skipped {
                            reason: "cancelled (fail-fast)".to_string(),
                        },
                    );
                    drop(guard);
                    emit(
                        &handlers,
                        RunEvent::JobSkipped {
                            id,
                            reason: "cancelled (fail-fast)".to_string(),
                        },
                    )
                    .await;
                    notify.notify_one();
                    return;
                }
                guard.set_state(&id, JobState::Running { started_at });
            }
            emit(&handlers, RunEvent::JobStarted { id: id.clone() }).await;
            notify.notify_one();

            let mut job_failed = false;
            for step in &steps {
                if let Some(cond) = &step.condition {
                    if !cond.evaluate(&ctx, &upstream) {
                        debug!("Skipping step {} of {}: condition not met", step.name, id);
                        let outcome = StepOutcome::skipped(&step.name, "condition not met");
                        record_outcome(&store, &handlers, &id, outcome).await;
                        continue;
                    }
                }

                let outcome = run_step(runner.as_ref(), step, &id.coordinate, &ctx).await;
                let step_failed = outcome.status == StepStatus::Failed;
                record_outcome(&store, &handlers, &id, outcome).await;

                if step_failed {
                    if step.continue_on_error {
                        warn!(
                            "Step {} of {} failed, continuing (continue_on_error)",
                            step.name, id
                        );
                    } else {
                        // abort remaining steps of this instance
                        job_failed = true;
                        break;
                    }
                }
            }

            let finished_at = Utc::now();
            let state = if job_failed {
                JobState::Failed {
                    started_at,
                    finished_at,
                }
            } else {
                // includes vacuous success: a job whose steps were all
                // skipped (or that has none) succeeds
                JobState::Succeeded {
                    started_at,
                    finished_at,
                }
            };
            let status = state.status();
            store.lock().await.set_state(&id, state);
            emit(
                &handlers,
                RunEvent::JobFinished {
                    id: id.clone(),
                    status,
                },
            )
            .await;
            notify.notify_one();
        });
    }
}

async fn run_step<R: StepRunner + ?Sized>(
    runner: &R,
    step: &StepSpec,
    coordinate: &Coordinate,
    ctx: &RunContext,
) -> StepOutcome {
    debug!("Executing step: {}", step.name);

    let result = match step.timeout_secs {
        Some(secs) => {
            match timeout(
                Duration::from_secs(secs),
                runner.execute(&step.action, coordinate, ctx),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(RunnerError::Timeout(secs)),
            }
        }
        None => runner.execute(&step.action, coordinate, ctx).await,
    };

    match result {
        Ok(output) if output.success => StepOutcome {
            step: step.name.clone(),
            status: StepStatus::Succeeded,
            logs: output.logs,
            exports: output.exports,
        },
        Ok(output) => StepOutcome {
            step: step.name.clone(),
            status: StepStatus::Failed,
            logs: match output.exit_code {
                Some(code) => format!("exit code {}\n{}", code, output.logs),
                None => output.logs,
            },
            exports: output.exports,
        },
        Err(e) => StepOutcome {
            step: step.name.clone(),
            status: StepStatus::Failed,
            logs: e.to_string(),
            exports: Default::default(),
        },
    }
}

async fn record_outcome(
    store: &Arc<Mutex<ResultStore>>,
    handlers: &Arc<Mutex<Vec<EventHandler>>>,
    id: &InstanceId,
    outcome: StepOutcome,
) {
    let event = RunEvent::StepFinished {
        id: id.clone(),
        step: outcome.step.clone(),
        status: outcome.status,
    };
    store.lock().await.push_outcome(id, outcome);
    emit(handlers, event).await;
}

async fn emit(handlers: &Arc<Mutex<Vec<EventHandler>>>, event: RunEvent) {
    let handlers = handlers.lock().await;
    for handler in handlers.iter() {
        handler(event.clone());
    }
}
