use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use quorum_engine::Aggregator;
use quorum_models::{
    AgentFailure, AgentOutcome, AgentReport, AgentRole, AgentSubmission, CycleReport,
    FailureKind, MarketSnapshot, RawAgentOutput,
};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::agent::DecisionAgent;
use crate::error::AgentError;

/// Runs every registered agent for a cycle and hands the results to the
/// aggregator.
///
/// Agents run concurrently; results are reported in registration order no
/// matter which agent finishes first.
pub struct Collector {
    agents: Vec<Arc<dyn DecisionAgent>>,
    aggregator: Aggregator,
    mandatory_guardrails: BTreeSet<String>,
    agent_timeout: Duration,
}

impl Collector {
    /// Fails when two agents share an id, or a mandatory id does not name a
    /// registered guardrail.
    pub fn new(
        agents: Vec<Arc<dyn DecisionAgent>>,
        aggregator: Aggregator,
        mandatory_guardrails: BTreeSet<String>,
        agent_timeout: Duration,
    ) -> Result<Self, AgentError> {
        let mut ids = HashSet::new();
        for agent in &agents {
            if !ids.insert(agent.id()) {
                return Err(AgentError::Config(format!(
                    "Duplicate agent id: {}",
                    agent.id()
                )));
            }
        }

        for id in &mandatory_guardrails {
            match agents.iter().find(|a| a.id() == id) {
                Some(agent) if agent.role() == AgentRole::Guardrail => {}
                Some(_) => {
                    return Err(AgentError::Config(format!(
                        "Mandatory guardrail {id} is registered with a non-guardrail role"
                    )))
                }
                None => {
                    return Err(AgentError::Config(format!(
                        "Mandatory guardrail {id} is not a registered agent"
                    )))
                }
            }
        }

        Ok(Self {
            agents,
            aggregator,
            mandatory_guardrails,
            agent_timeout,
        })
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Fan out to every agent and wait for all of them. Errors, timeouts and
    /// panics become failure submissions. Dropping the returned future aborts
    /// the agents still running.
    pub async fn gather(
        &self,
        snapshot: &MarketSnapshot,
    ) -> (Vec<AgentSubmission>, Vec<AgentReport>) {
        let gather_start = Instant::now();
        let snapshot = Arc::new(snapshot.clone());
        let timeout = self.agent_timeout;

        let mut tasks = AgentTasks(Vec::with_capacity(self.agents.len()));
        for agent in &self.agents {
            let agent = Arc::clone(agent);
            let snapshot = Arc::clone(&snapshot);
            let id = agent.id().to_string();
            let role = agent.role();

            let handle = tokio::spawn(async move {
                let started = Instant::now();
                let result = match tokio::time::timeout(timeout, agent.evaluate(&snapshot)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(AgentError::Timeout(timeout.as_millis() as u64)),
                };
                (result, started.elapsed())
            });
            tasks.0.push((id, role, handle));
        }

        let mut submissions = Vec::with_capacity(tasks.0.len());
        let mut reports = Vec::with_capacity(tasks.0.len());

        for (id, role, handle) in tasks.0.iter_mut() {
            let (id, role) = (id.clone(), *role);
            let (submission, outcome, elapsed) = match handle.await {
                Ok((Ok(raw), elapsed)) => match check_identity(&id, role, raw) {
                    Ok(raw) => {
                        info!(agent = %id, elapsed_ms = elapsed.as_millis(), "Agent succeeded");
                        (raw.into(), AgentOutcome::Completed, elapsed)
                    }
                    Err(failure) => {
                        warn!(agent = %id, error = %failure, "Agent spoke outside its registration");
                        (failure.into(), AgentOutcome::Failed, elapsed)
                    }
                },
                Ok((Err(e), elapsed)) => {
                    warn!(agent = %id, error = %e, elapsed_ms = elapsed.as_millis(), "Agent failed");
                    let failure = failure_for(&id, &e);
                    let outcome = match failure.kind {
                        FailureKind::Timeout => AgentOutcome::TimedOut,
                        FailureKind::Execution => AgentOutcome::Failed,
                    };
                    (failure.into(), outcome, elapsed)
                }
                Err(e) => {
                    error!(agent = %id, error = %e, "Agent task panicked");
                    let failure = AgentFailure::execution(&id, format!("agent task panicked: {e}"));
                    (failure.into(), AgentOutcome::Failed, gather_start.elapsed())
                }
            };

            submissions.push(submission);
            reports.push(AgentReport {
                agent_id: id,
                role,
                outcome,
                elapsed_ms: elapsed.as_millis() as u64,
            });
        }

        (submissions, reports)
    }

    /// Gather and aggregate one cycle.
    pub async fn evaluate(&self, snapshot: &MarketSnapshot) -> Result<CycleReport, AgentError> {
        let start = Instant::now();
        let started_at = Utc::now();
        let cycle_id = Uuid::new_v4();
        info!(ticker = %snapshot.ticker, cycle = %cycle_id, agents = self.agents.len(), "Starting cycle");

        let (submissions, agent_reports) = self.gather(snapshot).await;
        let decision = self
            .aggregator
            .aggregate(&submissions, &self.mandatory_guardrails)?;

        info!(
            ticker = %snapshot.ticker,
            cycle = %cycle_id,
            action = ?decision.action,
            explanation = %decision.explanation(),
            elapsed_ms = start.elapsed().as_millis(),
            "Cycle complete"
        );

        Ok(CycleReport {
            cycle_id,
            ticker: snapshot.ticker.clone(),
            started_at,
            decision,
            agent_reports,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

type AgentTaskOutput = (Result<RawAgentOutput, AgentError>, Duration);

/// Spawned agent tasks for one cycle. Dropping the cycle part way through
/// aborts whatever is still running, which also kills command agents.
struct AgentTasks(Vec<(String, AgentRole, JoinHandle<AgentTaskOutput>)>);

impl Drop for AgentTasks {
    fn drop(&mut self) {
        for (_, _, handle) in &self.0 {
            handle.abort();
        }
    }
}

fn failure_for(agent_id: &str, error: &AgentError) -> AgentFailure {
    let message = match error {
        AgentError::Timeout(ms) => format!("no response after {ms} ms"),
        other => other.to_string(),
    };
    AgentFailure {
        agent_id: agent_id.to_string(),
        kind: error.failure_kind(),
        message,
    }
}

/// An agent may only speak for itself, in the role it was registered with.
/// A missing role is left for validation to reject.
fn check_identity(
    expected_id: &str,
    expected_role: AgentRole,
    raw: RawAgentOutput,
) -> Result<RawAgentOutput, AgentFailure> {
    if raw.agent_id != expected_id {
        return Err(AgentFailure::execution(
            expected_id,
            format!("agent reported id {:?}", raw.agent_id),
        ));
    }
    match raw.role.as_deref() {
        Some(role) if role != expected_role.as_str() => Err(AgentFailure::execution(
            expected_id,
            format!("agent registered as {expected_role} reported role {role:?}"),
        )),
        _ => Ok(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubAgent, StubResponse};
    use async_trait::async_trait;
    use quorum_models::{AgentAction, DecisionAction, Direction, TieBreak};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot {
            ticker: "KXFED-26DEC".to_string(),
            yes_ask: Some(dec!(0.42)),
            no_ask: Some(dec!(0.60)),
            ..MarketSnapshot::default()
        }
    }

    fn collector(agents: Vec<StubAgent>, mandatory: &[&str]) -> Result<Collector, AgentError> {
        Collector::new(
            agents
                .into_iter()
                .map(|a| Arc::new(a) as Arc<dyn DecisionAgent>)
                .collect(),
            Aggregator::new(TieBreak::NoSignal),
            mandatory.iter().map(|s| s.to_string()).collect(),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn all_agents_succeed() {
        let collector = collector(
            vec![
                StubAgent::clear("rules_agent"),
                StubAgent::clear("risk_agent"),
                StubAgent::buy("pricing_baseline_agent", Direction::Yes, dec!(0.6)),
            ],
            &["rules_agent"],
        )
        .unwrap();

        let report = collector.evaluate(&snapshot()).await.unwrap();
        assert_eq!(report.ticker, "KXFED-26DEC");
        assert_eq!(report.decision.action, DecisionAction::Buy);
        assert_eq!(report.decision.confidence, Some(dec!(0.6)));
        assert_eq!(report.agent_reports.len(), 3);
        assert!(report
            .agent_reports
            .iter()
            .all(|r| r.outcome == AgentOutcome::Completed));
    }

    #[tokio::test]
    async fn results_keep_registration_order() {
        let collector = collector(
            vec![
                StubAgent::buy("slow", Direction::Yes, dec!(0.5))
                    .with_delay(Duration::from_millis(50)),
                StubAgent::buy("fast", Direction::Yes, dec!(0.7)),
            ],
            &[],
        )
        .unwrap();

        let (submissions, reports) = collector.gather(&snapshot()).await;
        let ids: Vec<&str> = submissions.iter().map(|s| s.agent_id()).collect();
        assert_eq!(ids, vec!["slow", "fast"]);
        assert_eq!(reports[0].agent_id, "slow");
    }

    #[tokio::test]
    async fn slow_agent_times_out_and_is_excluded() {
        let collector = collector(
            vec![
                StubAgent::buy("news_agent", Direction::No, dec!(0.9))
                    .with_delay(Duration::from_secs(5)),
                StubAgent::buy("pricing_baseline_agent", Direction::Yes, dec!(0.6)),
            ],
            &[],
        )
        .unwrap();

        let report = collector.evaluate(&snapshot()).await.unwrap();
        assert_eq!(report.agent_reports[0].outcome, AgentOutcome::TimedOut);
        assert_eq!(report.decision.direction, Some(Direction::Yes));
        assert_eq!(report.decision.exclusions.len(), 1);
        assert_eq!(
            report.decision.exclusions[0].reason,
            "timed out: no response after 200 ms"
        );
    }

    #[tokio::test]
    async fn mandatory_guardrail_timeout_blocks_trade() {
        let collector = collector(
            vec![
                StubAgent::clear("rules_agent").with_delay(Duration::from_secs(5)),
                StubAgent::buy("pricing_baseline_agent", Direction::Yes, dec!(0.9)),
            ],
            &["rules_agent"],
        )
        .unwrap();

        let report = collector.evaluate(&snapshot()).await.unwrap();
        assert_eq!(report.decision.action, DecisionAction::NoTrade);
        assert_eq!(
            report.decision.veto_reasons,
            vec!["mandatory guardrail rules_agent unavailable"]
        );
    }

    #[tokio::test]
    async fn failing_and_panicking_agents_are_excluded() {
        let collector = collector(
            vec![
                StubAgent::failing("news_agent", AgentRole::Directional, "HTTP 503"),
                StubAgent::panicking("candles_agent", AgentRole::Directional),
                StubAgent::buy("pricing_baseline_agent", Direction::No, dec!(0.4)),
            ],
            &[],
        )
        .unwrap();

        let report = collector.evaluate(&snapshot()).await.unwrap();
        assert_eq!(report.decision.action, DecisionAction::Buy);
        assert_eq!(report.decision.direction, Some(Direction::No));
        assert_eq!(report.decision.exclusions.len(), 2);
        assert_eq!(
            report.decision.exclusions[0].reason,
            "execution failed: Agent command error: HTTP 503"
        );
        assert!(report.decision.exclusions[1]
            .reason
            .starts_with("execution failed: agent task panicked"));
        assert_eq!(report.agent_reports[1].outcome, AgentOutcome::Failed);
    }

    #[tokio::test]
    async fn snapshot_reaches_agents() {
        let collector = collector(vec![StubAgent::cheaper_side("pricing_baseline_agent")], &[])
            .unwrap();
        let report = collector.evaluate(&snapshot()).await.unwrap();
        assert_eq!(report.decision.direction, Some(Direction::Yes));
        assert_eq!(report.decision.confidence, Some(dec!(0.18)));
    }

    #[tokio::test]
    async fn foreign_agent_id_is_rejected() {
        let mut impostor = StubAgent::buy("rules_agent", Direction::Yes, dec!(0.9));
        impostor.id = "pricing_baseline_agent".to_string();
        let collector = collector(vec![impostor], &[]).unwrap();

        let report = collector.evaluate(&snapshot()).await.unwrap();
        assert_eq!(report.decision.action, DecisionAction::NoSignal);
        assert_eq!(
            report.decision.exclusions[0].agent_id,
            "pricing_baseline_agent"
        );
    }

    #[tokio::test]
    async fn guardrail_cannot_vote_as_directional() {
        let impostor = StubAgent::new(
            "risk_agent",
            AgentRole::Guardrail,
            StubResponse::Output(
                RawAgentOutput::new("risk_agent", AgentRole::Directional, AgentAction::Buy)
                    .with_direction(Direction::Yes)
                    .with_confidence(dec!(0.95)),
            ),
        );
        let collector = collector(vec![impostor], &[]).unwrap();

        let report = collector.evaluate(&snapshot()).await.unwrap();
        assert_eq!(report.decision.action, DecisionAction::NoSignal);
        assert_eq!(report.agent_reports[0].outcome, AgentOutcome::Failed);
        assert_eq!(
            report.decision.exclusions[0].reason,
            "execution failed: agent registered as GUARDRAIL reported role \"DIRECTIONAL\""
        );
    }

    #[tokio::test]
    async fn registered_guardrail_role_passes() {
        let collector = collector(
            vec![
                StubAgent::veto("risk_agent", "spread too wide"),
                StubAgent::buy("pricing_baseline_agent", Direction::Yes, dec!(0.6)),
            ],
            &["risk_agent"],
        )
        .unwrap();

        let report = collector.evaluate(&snapshot()).await.unwrap();
        assert_eq!(report.decision.action, DecisionAction::NoTrade);
        assert_eq!(report.decision.veto_reasons, vec!["spread too wide"]);
    }

    struct SetOnDrop(Arc<AtomicBool>);

    impl Drop for SetOnDrop {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    /// Never answers; records when its evaluation is torn down.
    struct Hanging {
        dropped: Arc<AtomicBool>,
    }

    #[async_trait]
    impl DecisionAgent for Hanging {
        fn id(&self) -> &str {
            "news_evidence_agent"
        }

        fn role(&self) -> AgentRole {
            AgentRole::Directional
        }

        async fn evaluate(&self, _: &MarketSnapshot) -> Result<RawAgentOutput, AgentError> {
            let _guard = SetOnDrop(Arc::clone(&self.dropped));
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(RawAgentOutput::default())
        }
    }

    #[tokio::test]
    async fn dropping_a_cycle_aborts_running_agents() {
        let dropped = Arc::new(AtomicBool::new(false));
        let collector = Collector::new(
            vec![Arc::new(Hanging {
                dropped: Arc::clone(&dropped),
            }) as Arc<dyn DecisionAgent>],
            Aggregator::default(),
            BTreeSet::new(),
            Duration::from_secs(60),
        )
        .unwrap();

        let snap = snapshot();
        let cycle = tokio::time::timeout(Duration::from_millis(50), collector.evaluate(&snap));
        assert!(cycle.await.is_err());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn rejects_unregistered_mandatory_guardrail() {
        let result = collector(vec![StubAgent::clear("risk_agent")], &["rules_agent"]);
        assert!(matches!(result, Err(AgentError::Config(_))));
    }

    #[test]
    fn rejects_directional_mandatory_guardrail() {
        let result = collector(
            vec![StubAgent::buy("rules_agent", Direction::Yes, dec!(0.5))],
            &["rules_agent"],
        );
        assert!(matches!(result, Err(AgentError::Config(_))));
    }

    #[test]
    fn rejects_duplicate_agent_ids() {
        let result = collector(
            vec![StubAgent::clear("rules_agent"), StubAgent::clear("rules_agent")],
            &[],
        );
        assert!(matches!(result, Err(AgentError::Config(_))));
    }

    #[tokio::test]
    async fn malformed_mandatory_id_surfaces_as_error() {
        let collector =
            collector(vec![StubAgent::clear(" rules_agent")], &[" rules_agent"]).unwrap();
        let result = collector.evaluate(&snapshot()).await;
        assert!(matches!(result, Err(AgentError::Aggregation(_))));
    }
}
