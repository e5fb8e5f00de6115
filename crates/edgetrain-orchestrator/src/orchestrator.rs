//! Job orchestrator: creates training jobs and drives them through their
//! lifecycle one step per `advance` call.
//!
//! Job creation is serialized per device; advancing is serialized per job
//! with a try-lock, and every storage write is a compare-and-swap on the
//! job's version. Remote calls are made with no device lock held.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use edgetrain_core::config::TrainingConfig;
use edgetrain_core::errors::{EdgeTrainError, EdgeTrainResult, RemoteError};
use edgetrain_core::models::{
    DeployOutcome, DeviceStatus, JobCommit, JobState, RemoteJobStatus, TrainingJob, TriggerReason,
};
use edgetrain_core::traits::{IEdgeStorage, IRemoteTrainingClient};
use edgetrain_observability::tracing_setup::events;
use edgetrain_observability::OrchestratorMetrics;

use crate::locks::LockTable;
use crate::threshold::{evaluate, DeviceSnapshot, TriggerDecision};
use crate::transitions;

/// Result of a threshold evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    Created(TrainingJob),
    Skipped(TriggerDecision),
}

/// Result of one `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// A commit landed without changing state (poll timestamp, retry counter).
    Unchanged,
    Transitioned { from: JobState, to: JobState },
    /// The job was already terminal; nothing was done.
    Terminal(JobState),
    /// Another caller is advancing this job right now.
    Busy,
    /// The job moved on between read and commit; the commit was discarded.
    Stale,
}

impl AdvanceOutcome {
    /// Whether the job is known to be terminal after this call.
    pub fn reached_terminal(&self) -> bool {
        match self {
            Self::Terminal(_) => true,
            Self::Transitioned { to, .. } => to.is_terminal(),
            _ => false,
        }
    }
}

pub struct JobOrchestrator {
    store: Arc<dyn IEdgeStorage>,
    remote: Arc<dyn IRemoteTrainingClient>,
    config: TrainingConfig,
    device_locks: LockTable,
    job_locks: LockTable,
    metrics: Arc<OrchestratorMetrics>,
}

impl JobOrchestrator {
    pub fn new(
        store: Arc<dyn IEdgeStorage>,
        remote: Arc<dyn IRemoteTrainingClient>,
        config: TrainingConfig,
        metrics: Arc<OrchestratorMetrics>,
    ) -> Self {
        Self {
            store,
            remote,
            config,
            device_locks: LockTable::new(),
            job_locks: LockTable::new(),
            metrics,
        }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Operator-initiated training. Skips the threshold check but still
    /// refuses to start a second job for a device.
    #[instrument(skip(self))]
    pub fn trigger_manual(&self, device_id: &str) -> EdgeTrainResult<TrainingJob> {
        let job = self.device_locks.with_lock(device_id, || {
            let device = self
                .store
                .get_device(device_id)?
                .ok_or_else(|| EdgeTrainError::DeviceNotFound {
                    id: device_id.to_string(),
                })?;
            if let Some(active) = self.store.active_job_for_device(device_id)? {
                self.metrics.record_conflict();
                return Err(EdgeTrainError::Conflict {
                    device_id: device_id.to_string(),
                    active_job_id: active.id,
                });
            }
            self.create_job(device_id, TriggerReason::Manual, device.sample_count)
        });
        self.device_locks.release(device_id);
        let job = job?;
        Ok(self.submit_new(job))
    }

    /// Run the threshold evaluator for a device and create a job if it fires.
    ///
    /// The active-job check, the evaluation and the insert happen under the
    /// device lock; submission to the platform happens after it is released.
    #[instrument(skip(self))]
    pub fn evaluate_and_trigger(&self, device_id: &str) -> EdgeTrainResult<TriggerOutcome> {
        let threshold = self.config.threshold;
        let created = self.device_locks.with_lock(device_id, || {
            let device = self
                .store
                .get_device(device_id)?
                .ok_or_else(|| EdgeTrainError::DeviceNotFound {
                    id: device_id.to_string(),
                })?;
            let active = self.store.active_job_for_device(device_id)?;
            let snapshot = DeviceSnapshot::from(&device);
            let decision = evaluate(&snapshot, threshold, active.as_ref().map(|j| j.id.as_str()));
            if !decision.fires() {
                self.metrics.record_trigger_skipped();
                events::trigger_skipped(device_id, decision.as_str(), device.sample_count, threshold);
                return Ok(TriggerOutcome::Skipped(decision));
            }
            match self.create_job(device_id, TriggerReason::Threshold, device.sample_count) {
                Ok(job) => Ok(TriggerOutcome::Created(job)),
                // Another process inserted between our read and our insert.
                Err(EdgeTrainError::Conflict { active_job_id, .. }) => {
                    self.metrics.record_conflict();
                    Ok(TriggerOutcome::Skipped(TriggerDecision::JobActive {
                        job_id: active_job_id,
                    }))
                }
                Err(err) => Err(err),
            }
        });
        self.device_locks.release(device_id);
        match created? {
            TriggerOutcome::Created(job) => Ok(TriggerOutcome::Created(self.submit_new(job))),
            skipped => Ok(skipped),
        }
    }

    fn create_job(
        &self,
        device_id: &str,
        reason: TriggerReason,
        sample_count: u64,
    ) -> EdgeTrainResult<TrainingJob> {
        let job = TrainingJob::new(device_id, reason, sample_count);
        self.store.insert_job(&job, DeviceStatus::Training)?;
        self.metrics.record_trigger_fired();
        events::job_created(&job.id, device_id, reason, sample_count);
        Ok(job)
    }

    /// Submit a freshly created job right away instead of waiting for the
    /// next poll cycle. Failures are left for the poller to retry.
    fn submit_new(&self, job: TrainingJob) -> TrainingJob {
        if let Err(err) = self.advance(&job.id) {
            tracing::warn!(job_id = %job.id, error = %err, "initial submission failed, poller will retry");
        }
        match self.store.get_job(&job.id) {
            Ok(Some(current)) => current,
            _ => job,
        }
    }

    /// Ids of every non-terminal job, read from the store.
    pub fn active_job_ids(&self) -> EdgeTrainResult<Vec<String>> {
        self.store.active_job_ids()
    }

    /// Move a job at most one lifecycle step forward.
    ///
    /// Returns [`AdvanceOutcome::Busy`] without waiting if another caller
    /// holds this job.
    #[instrument(skip(self))]
    pub fn advance(&self, job_id: &str) -> EdgeTrainResult<AdvanceOutcome> {
        let Some(result) = self
            .job_locks
            .try_with_lock(job_id, || self.advance_locked(job_id))
        else {
            self.metrics.record_busy_skip();
            tracing::debug!(job_id, "job busy, skipping advance");
            return Ok(AdvanceOutcome::Busy);
        };
        if matches!(&result, Ok(outcome) if outcome.reached_terminal()) {
            self.job_locks.release(job_id);
        }
        result
    }

    fn advance_locked(&self, job_id: &str) -> EdgeTrainResult<AdvanceOutcome> {
        let job = self
            .store
            .get_job(job_id)?
            .ok_or_else(|| EdgeTrainError::JobNotFound {
                id: job_id.to_string(),
            })?;
        match job.state {
            JobState::Deployed | JobState::Failed => Ok(AdvanceOutcome::Terminal(job.state)),
            JobState::Pending => self.submit(&job),
            JobState::Submitted | JobState::Training => self.poll(&job),
            JobState::Completed => self.deploy(&job),
            JobState::Deploying if job.deploy_started_at.is_some() => {
                tracing::warn!(job_id, "deploy found in flight, failing job for reconciliation");
                self.commit(&job, transitions::in_doubt_deploy(&job, Utc::now()))
            }
            JobState::Deploying => self.deploy(&job),
        }
    }

    fn submit(&self, job: &TrainingJob) -> EdgeTrainResult<AdvanceOutcome> {
        match self.remote.start_training(&job.device_id) {
            Ok(remote_ref) => self.commit(job, transitions::submitted(job, remote_ref)),
            Err(err) => self.remote_failure(job, "start_training", err),
        }
    }

    fn poll(&self, job: &TrainingJob) -> EdgeTrainResult<AdvanceOutcome> {
        let now = Utc::now();
        let Some(remote_ref) = job.remote_ref.as_ref() else {
            return self.commit(job, transitions::failed(job, "job has no remote reference", now));
        };
        match self.remote.get_status(remote_ref) {
            Ok(RemoteJobStatus::InProgress) => {
                self.commit(job, transitions::polled_in_progress(job, now))
            }
            Ok(RemoteJobStatus::Succeeded { accuracy }) => {
                // A run that finished before its first poll still passes
                // through `training` so the history has no gaps.
                let training = if job.state == JobState::Submitted {
                    let started = transitions::polled_in_progress(job, now);
                    if !self.apply(&started)? {
                        return Ok(AdvanceOutcome::Stale);
                    }
                    started.job
                } else {
                    job.clone()
                };
                let commit = transitions::training_succeeded(&training, accuracy, now);
                if !self.apply(&commit)? {
                    return Ok(AdvanceOutcome::Stale);
                }
                let completed = commit.job;
                Ok(match self.deploy(&completed)? {
                    AdvanceOutcome::Transitioned { to, .. } => AdvanceOutcome::Transitioned {
                        from: job.state,
                        to,
                    },
                    _ => AdvanceOutcome::Transitioned {
                        from: job.state,
                        to: JobState::Completed,
                    },
                })
            }
            Ok(RemoteJobStatus::Failed { reason }) => self.commit(
                job,
                transitions::failed(job, format!("remote training failed: {reason}"), now),
            ),
            Err(err) => self.remote_failure(job, "get_status", err),
        }
    }

    /// Arm the deploy marker, call deploy, then record the outcome.
    fn deploy(&self, job: &TrainingJob) -> EdgeTrainResult<AdvanceOutcome> {
        let now = Utc::now();
        let Some(remote_ref) = job.remote_ref.clone() else {
            return self.commit(job, transitions::failed(job, "job has no remote reference", now));
        };
        let started = transitions::deploy_started(job, now);
        if !self.apply(&started)? {
            return Ok(AdvanceOutcome::Stale);
        }
        let deploying = &started.job;
        let outcome = match self.remote.deploy(&remote_ref) {
            Ok(DeployOutcome::Deployed { deployment_id }) => self.commit(
                deploying,
                transitions::deployed(deploying, &deployment_id, Utc::now()),
            )?,
            Ok(DeployOutcome::Failed { reason }) => self.commit(
                deploying,
                transitions::failed(deploying, format!("deployment failed: {reason}"), Utc::now()),
            )?,
            Err(err) => self.remote_failure(deploying, "deploy", err)?,
        };
        Ok(match outcome {
            AdvanceOutcome::Transitioned { to, .. } => AdvanceOutcome::Transitioned {
                from: job.state,
                to,
            },
            AdvanceOutcome::Unchanged if job.state != JobState::Deploying => {
                AdvanceOutcome::Transitioned {
                    from: job.state,
                    to: JobState::Deploying,
                }
            }
            other => other,
        })
    }

    fn remote_failure(
        &self,
        job: &TrainingJob,
        operation: &str,
        err: RemoteError,
    ) -> EdgeTrainResult<AdvanceOutcome> {
        let now = Utc::now();
        self.metrics.record_remote_error(&err);
        events::remote_call_failed(
            operation,
            Some(job.id.as_str()),
            &err,
            job.consecutive_failures.saturating_add(1),
        );
        let commit = if job.state == JobState::Deploying
            && matches!(err, RemoteError::OutcomeUnknown { .. })
        {
            tracing::warn!(
                job_id = %job.id,
                error = %err,
                "deploy outcome unknown, failing job for reconciliation"
            );
            transitions::in_doubt_deploy(job, now)
        } else if err.is_transient() {
            transitions::transient_failure(
                job,
                operation,
                &err,
                self.config.max_consecutive_failures,
                now,
            )
        } else {
            transitions::failed(job, format!("{operation} failed: {err}"), now)
        };
        self.commit(job, commit)
    }

    fn commit(&self, job: &TrainingJob, commit: JobCommit) -> EdgeTrainResult<AdvanceOutcome> {
        if !self.apply(&commit)? {
            return Ok(AdvanceOutcome::Stale);
        }
        if commit.job.state == job.state {
            Ok(AdvanceOutcome::Unchanged)
        } else {
            Ok(AdvanceOutcome::Transitioned {
                from: job.state,
                to: commit.job.state,
            })
        }
    }

    /// Write a commit. `Ok(false)` means the stored row moved on first.
    fn apply(&self, commit: &JobCommit) -> EdgeTrainResult<bool> {
        if !self.store.commit_transition(commit)? {
            self.metrics.record_stale_commit();
            tracing::warn!(
                job_id = %commit.job.id,
                expected_version = commit.expected_version,
                "stale job commit discarded"
            );
            return Ok(false);
        }
        if commit.job.state != commit.from_state {
            self.metrics.record_transition(commit.job.state);
            events::job_transitioned(
                &commit.job.id,
                commit.from_state,
                commit.job.state,
                commit.detail.as_deref(),
            );
        }
        Ok(true)
    }
}
