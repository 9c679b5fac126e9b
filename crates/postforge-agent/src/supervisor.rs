// ABOUTME: Supervisor that walks the execution plan in rounds, dispatching ready agents concurrently.
// ABOUTME: Applies outcomes to the workflow state, skips dependents of failed stages, and emits status events.

use std::collections::BTreeMap;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use ulid::Ulid;

use postforge_core::{
    ContentRequest, ExecutionPlan, ImageData, ImageRef, RunState, StageError, StageName,
    StageStatus, StatusEvent, StatusPayload, ValidationError, WorkflowState,
};

use crate::agents::{Agent, AgentOutcome};
use crate::client::Services;
use crate::config::PipelineConfig;

/// Caller-side hooks for one run: a cancel signal and an optional live
/// event channel.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    pub cancel: CancellationToken,
    pub events: Option<UnboundedSender<StatusEvent>>,
}

impl RunControl {
    pub fn with_events(events: UnboundedSender<StatusEvent>) -> Self {
        Self {
            cancel: CancellationToken::new(),
            events: Some(events),
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: RunState,
    pub workflow: WorkflowState,
    pub events: Vec<StatusEvent>,
}

/// Presentation-ready view of a run's result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    pub run_id: Ulid,
    pub state: RunState,
    pub tone: Option<String>,
    pub research: Option<String>,
    pub text: Option<String>,
    pub hashtags: Vec<String>,
    pub calls_to_action: Vec<String>,
    pub image: Option<ImageRef>,
    pub image_summary: Option<String>,
    /// Kept copy of the image; the hosted reference may expire.
    pub image_data: Option<ImageData>,
    pub errors: Vec<StageError>,
}

impl RunReport {
    pub fn summary(&self) -> PostSummary {
        let workflow = &self.workflow;
        let post = workflow.post_content();
        PostSummary {
            run_id: workflow.run_id(),
            state: self.state,
            tone: workflow.tone_profile().map(|p| p.summary_line()),
            research: workflow.research_findings().map(|f| f.summary_line()),
            text: post.map(|p| p.text.clone()),
            hashtags: post.map(|p| p.hashtags.clone()).unwrap_or_default(),
            calls_to_action: post.map(|p| p.calls_to_action.clone()).unwrap_or_default(),
            image: workflow.post_image().map(|i| i.reference.clone()),
            image_summary: workflow.post_image().map(|i| i.summary_line()),
            image_data: workflow.post_image().and_then(|i| i.data.clone()),
            errors: workflow.errors().to_vec(),
        }
    }
}

/// Orchestrates one pipeline. Holds the plan and one agent per stage; each
/// call to `run` owns a fresh workflow state.
#[derive(Debug)]
pub struct Supervisor {
    plan: ExecutionPlan,
    agents: BTreeMap<StageName, Agent>,
}

impl Supervisor {
    pub fn new(plan: ExecutionPlan, agents: Vec<Agent>) -> Self {
        let agents = agents.into_iter().map(|a| (a.stage(), a)).collect();
        Self { plan, agents }
    }

    /// Standard plan with the standard agent set over the given services.
    pub fn from_services(services: &Services, config: &PipelineConfig) -> Self {
        Self::new(
            ExecutionPlan::standard(),
            Agent::standard_set(services, config),
        )
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    pub async fn run(&self, request: &ContentRequest) -> Result<RunReport, ValidationError> {
        self.run_with(request, RunControl::default()).await
    }

    /// Validate the request, then execute the plan round by round until every
    /// stage is resolved or the run is cancelled. Only invalid input returns
    /// `Err`; stage failures are recorded on the returned state.
    pub async fn run_with(
        &self,
        request: &ContentRequest,
        control: RunControl,
    ) -> Result<RunReport, ValidationError> {
        let request = request.validate()?;
        let mut state = WorkflowState::new(&request, &self.plan);
        let mut log = EventLog::new(state.run_id(), control.events);

        tracing::info!(run_id = %state.run_id(), topic = %state.topic(), "run started");
        log.emit(StatusPayload::RunStarted {
            topic: state.topic().to_string(),
        });

        let mut round = 0usize;
        let mut last_round = Vec::new();
        loop {
            if self.plan.is_resolved(state.stage_statuses()) {
                break;
            }
            if control.cancel.is_cancelled() {
                tracing::warn!(run_id = %state.run_id(), round, "run cancelled");
                self.cancel_remaining(&mut state, &mut log);
                break;
            }

            let ready = self.plan.ready_set(state.stage_statuses());
            if ready.is_empty() {
                tracing::error!(run_id = %state.run_id(), "no stage is ready but the plan is unresolved");
                self.skip_blocked(&mut state, &mut log);
                break;
            }

            round += 1;
            tracing::debug!(run_id = %state.run_id(), round, stages = ?ready, "dispatching round");
            for stage in &ready {
                transition(&mut state, &mut log, *stage, StageStatus::Running, None);
            }

            let outcomes = join_all(ready.iter().map(|stage| self.dispatch(*stage, &state))).await;

            for (stage, outcome) in ready.iter().copied().zip(outcomes) {
                self.apply_outcome(&mut state, &mut log, stage, outcome);
            }
            last_round = ready;
        }

        // A cancel that lands during the final round leaves nothing pending
        // to skip, so it is recorded against the stages that were in flight.
        if control.cancel.is_cancelled() && !state.was_cancelled() {
            tracing::warn!(run_id = %state.run_id(), round, "run cancelled during its final round");
            let in_flight: Vec<StageName> = if last_round.is_empty() {
                self.plan.stages().collect()
            } else {
                last_round
            };
            for stage in in_flight {
                state.record_error(StageError::cancelled_in_flight(stage));
            }
        }

        let run_state = state.run_state();
        let (completed, total) = state.progress();
        tracing::info!(
            run_id = %state.run_id(),
            state = %run_state,
            completed,
            total,
            errors = state.errors().len(),
            "run finished"
        );
        log.emit(StatusPayload::RunFinished { state: run_state });

        Ok(RunReport {
            state: run_state,
            workflow: state,
            events: log.into_events(),
        })
    }

    async fn dispatch(&self, stage: StageName, state: &WorkflowState) -> AgentOutcome {
        match self.agents.get(&stage) {
            Some(agent) => agent.execute(state).await,
            None => AgentOutcome::Failure(StageError::validation(
                stage,
                "no agent is registered for this stage",
            )),
        }
    }

    fn apply_outcome(
        &self,
        state: &mut WorkflowState,
        log: &mut EventLog,
        stage: StageName,
        outcome: AgentOutcome,
    ) {
        let failure = match outcome {
            AgentOutcome::Success(output) if output.stage() != stage => Some(StageError::validation(
                stage,
                format!("agent returned output for {}", output.stage()),
            )),
            AgentOutcome::Success(output) => match state.apply_output(output) {
                Ok(()) => None,
                Err(e) => Some(StageError::validation(stage, e.to_string())),
            },
            AgentOutcome::Failure(error) => Some(error),
        };

        let Some(error) = failure else {
            transition(state, log, stage, StageStatus::Completed, None);
            return;
        };

        transition(state, log, stage, StageStatus::Failed, Some(error));
        for dependent in self.plan.dependents_of(stage) {
            if state.status(dependent) == Some(StageStatus::Pending) {
                transition(
                    state,
                    log,
                    dependent,
                    StageStatus::Skipped,
                    Some(StageError::dependency_unmet(dependent, stage)),
                );
            }
        }
    }

    fn cancel_remaining(&self, state: &mut WorkflowState, log: &mut EventLog) {
        for stage in self.plan.stages() {
            if state.status(stage) == Some(StageStatus::Pending) {
                transition(
                    state,
                    log,
                    stage,
                    StageStatus::Skipped,
                    Some(StageError::cancelled(stage)),
                );
            }
        }
    }

    fn skip_blocked(&self, state: &mut WorkflowState, log: &mut EventLog) {
        for stage in self.plan.stages() {
            if state.status(stage) != Some(StageStatus::Pending) {
                continue;
            }
            let blocker = self
                .plan
                .dependencies(stage)
                .iter()
                .copied()
                .find(|dep| state.status(*dep) != Some(StageStatus::Completed))
                .unwrap_or(stage);
            transition(
                state,
                log,
                stage,
                StageStatus::Skipped,
                Some(StageError::dependency_unmet(stage, blocker)),
            );
        }
    }
}

/// Move a stage, record its error, and emit the change.
fn transition(
    state: &mut WorkflowState,
    log: &mut EventLog,
    stage: StageName,
    status: StageStatus,
    error: Option<StageError>,
) {
    if let Err(e) = state.set_status(stage, status) {
        tracing::error!(stage = %stage, error = %e, "rejected stage transition");
        return;
    }
    if let Some(error) = &error {
        state.record_error(error.clone());
    }
    tracing::info!(stage = %stage, status = %status, "stage changed");
    log.emit(StatusPayload::StageChanged {
        stage,
        status,
        error,
    });
}

/// Sequenced event stream for one run, mirrored to an optional channel.
struct EventLog {
    run_id: Ulid,
    next_id: u64,
    sender: Option<UnboundedSender<StatusEvent>>,
    events: Vec<StatusEvent>,
}

impl EventLog {
    fn new(run_id: Ulid, sender: Option<UnboundedSender<StatusEvent>>) -> Self {
        Self {
            run_id,
            next_id: 0,
            sender,
            events: Vec::new(),
        }
    }

    fn emit(&mut self, payload: StatusPayload) {
        let event = StatusEvent {
            event_id: self.next_id,
            run_id: self.run_id,
            timestamp: Utc::now(),
            payload,
        };
        self.next_id += 1;

        if let Some(sender) = &self.sender
            && sender.send(event.clone()).is_err()
        {
            tracing::debug!(run_id = %self.run_id, "event receiver dropped");
            self.sender = None;
        }
        self.events.push(event);
    }

    fn into_events(self) -> Vec<StatusEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_log_sequences_and_mirrors() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut log = EventLog::new(Ulid::new(), Some(tx));
        log.emit(StatusPayload::RunStarted {
            topic: "ai".to_string(),
        });
        log.emit(StatusPayload::RunFinished {
            state: RunState::Completed,
        });

        let events = log.into_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_id, 0);
        assert_eq!(events[1].event_id, 1);
        assert_eq!(rx.try_recv().unwrap(), events[0]);
        assert_eq!(rx.try_recv().unwrap(), events[1]);
    }

    #[test]
    fn event_log_survives_dropped_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        let mut log = EventLog::new(Ulid::new(), Some(tx));
        log.emit(StatusPayload::RunStarted {
            topic: "ai".to_string(),
        });
        assert_eq!(log.into_events().len(), 1);
    }

    #[tokio::test]
    async fn missing_agent_fails_its_stage() {
        let supervisor = Supervisor::new(ExecutionPlan::standard(), Vec::new());
        let request = ContentRequest::new("A perfectly fine writing sample.", "remote work");
        let report = supervisor.run(&request).await.unwrap();

        assert_eq!(report.state, RunState::Failed);
        assert_eq!(
            report.workflow.status(StageName::Tone),
            Some(StageStatus::Failed)
        );
        assert_eq!(
            report.workflow.status(StageName::Image),
            Some(StageStatus::Skipped)
        );
        assert!(report.events.last().unwrap().is_terminal());
    }
}
