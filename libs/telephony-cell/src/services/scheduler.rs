// libs/telephony-cell/src/services/scheduler.rs
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

/// Named recurring jobs on independent timers, owned by the process
/// lifecycle: constructed at startup, handed around by reference, aborted
/// on shutdown. One name, one timer.
pub struct JobScheduler {
    jobs: Mutex<HashMap<String, JobHandle>>,
}

struct JobHandle {
    every: Duration,
    handle: JoinHandle<()>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub name: String,
    pub interval_secs: u64,
    pub running: bool,
}

impl JobScheduler {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Register a job that runs once immediately and then on every tick.
    /// Re-registering a name aborts and replaces the previous timer. The
    /// task's own errors are logged and swallowed; a failed run just waits
    /// for the next tick. A run that overlaps its tick causes the tick to
    /// be skipped, never a second concurrent run.
    pub fn schedule_job<F, Fut, E>(&self, name: &str, every: Duration, task: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display,
    {
        let mut jobs = self.jobs.lock().expect("scheduler lock poisoned");

        if let Some(previous) = jobs.remove(name) {
            info!("Replacing scheduled job '{}'", name);
            previous.handle.abort();
        }

        let job_name = name.to_string();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                // The first tick completes immediately.
                ticker.tick().await;
                debug!("Running job '{}'", job_name);
                if let Err(e) = task().await {
                    error!("Job '{}' failed: {}", job_name, e);
                }
            }
        });

        jobs.insert(name.to_string(), JobHandle { every, handle });
        info!(
            "Scheduled job '{}' to run every {} seconds",
            name,
            every.as_secs()
        );
    }

    /// Cancel one job. Returns false if no such job was registered.
    pub fn stop_job(&self, name: &str) -> bool {
        let mut jobs = self.jobs.lock().expect("scheduler lock poisoned");
        match jobs.remove(name) {
            Some(job) => {
                job.handle.abort();
                info!("Stopped job '{}'", name);
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&self) {
        let mut jobs = self.jobs.lock().expect("scheduler lock poisoned");
        for (name, job) in jobs.drain() {
            job.handle.abort();
            info!("Stopped job '{}'", name);
        }
    }

    pub fn status(&self) -> Vec<JobStatus> {
        let jobs = self.jobs.lock().expect("scheduler lock poisoned");
        let mut statuses: Vec<JobStatus> = jobs
            .iter()
            .map(|(name, job)| JobStatus {
                name: name.clone(),
                interval_secs: job.every.as_secs(),
                running: !job.handle.is_finished(),
            })
            .collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        if let Ok(mut jobs) = self.jobs.lock() {
            for (_, job) in jobs.drain() {
                job.handle.abort();
            }
        }
    }
}
