use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{Result, SchedulerError},
    schedule::compute_next_run,
    types::{Job, JobAction, JobStatus, Schedule},
};

type JobTable = Arc<Mutex<Vec<Job>>>;

fn lock(jobs: &JobTable) -> MutexGuard<'_, Vec<Job>> {
    jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn insert_job(jobs: &JobTable, name: &str, schedule: Schedule, action: JobAction) -> Result<Job> {
    schedule.validate()?;
    let job = Job {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        next_run: compute_next_run(&schedule, Utc::now()),
        schedule,
        action,
        status: JobStatus::Pending,
        last_run: None,
        run_count: 0,
    };
    lock(jobs).push(job.clone());
    info!(job_id = %job.id, %name, next_run = ?job.next_run, "job added");
    Ok(job)
}

/// Shared handle for job management while the engine loop runs.
#[derive(Clone)]
pub struct SchedulerHandle {
    jobs: JobTable,
}

impl SchedulerHandle {
    pub fn add_job(&self, name: &str, schedule: Schedule, action: JobAction) -> Result<Job> {
        insert_job(&self.jobs, name, schedule, action)
    }

    pub fn remove_job(&self, id: &str) -> Result<()> {
        let mut jobs = lock(&self.jobs);
        let before = jobs.len();
        jobs.retain(|j| j.id != id);
        if jobs.len() == before {
            return Err(SchedulerError::JobNotFound { id: id.to_string() });
        }
        info!(job_id = %id, "job removed");
        Ok(())
    }

    /// All jobs in registration order.
    pub fn list_jobs(&self) -> Vec<Job> {
        lock(&self.jobs).clone()
    }
}

/// Core scheduler: drives job firing at ±1 s precision.
pub struct SchedulerEngine {
    jobs: JobTable,
    /// If set, fired jobs are sent here for execution.
    fired_tx: Option<mpsc::Sender<Job>>,
}

impl SchedulerEngine {
    /// Pass `Some(tx)` to receive a copy of every fired [`Job`] via mpsc.
    /// The sender is non-blocking (`try_send`) so the tick loop is never stalled.
    pub fn new(fired_tx: Option<mpsc::Sender<Job>>) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(Vec::new())),
            fired_tx,
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            jobs: Arc::clone(&self.jobs),
        }
    }

    pub fn add_job(&self, name: &str, schedule: Schedule, action: JobAction) -> Result<Job> {
        insert_job(&self.jobs, name, schedule, action)
    }

    /// Main event loop. Ticks every second until `shutdown` broadcasts `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("scheduler engine started");

        let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick(Utc::now());
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("scheduler engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Fire every pending job whose `next_run` is at or before `now`.
    /// Returns how many fired.
    fn tick(&self, now: DateTime<Utc>) -> usize {
        let fired: Vec<Job> = {
            let mut jobs = lock(&self.jobs);
            jobs.iter_mut()
                .filter(|j| j.status == JobStatus::Pending && j.next_run.is_some_and(|t| t <= now))
                .map(|job| {
                    job.run_count += 1;
                    job.last_run = Some(now);
                    job.next_run = compute_next_run(&job.schedule, now);
                    if job.next_run.is_none() {
                        job.status = JobStatus::Completed;
                    }
                    info!(job_id = %job.id, name = %job.name, run = job.run_count, "job fired");
                    job.clone()
                })
                .collect()
        };

        let count = fired.len();
        if let Some(ref tx) = self.fired_tx {
            for job in fired {
                let id = job.id.clone();
                if tx.try_send(job).is_err() {
                    warn!(job_id = %id, "fired-job channel full or closed, run dropped");
                }
            }
        }
        count
    }
}
