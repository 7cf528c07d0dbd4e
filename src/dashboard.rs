//! Dashboard shell
//!
//! Four fixed actions, each mapped to exactly one agent call. The shell
//! owns selection and the Idle/Running state; rendering lives in the
//! `slamon-dash` binary. Output from the agent and the final
//! completion/failure marker travel through the same sink, so every line
//! written during a run is delivered before the marker.

use crate::agent::{AgentFactory, ContextProbe, EscalationProbe, ReasoningProbe, SelfTest};
use crate::error::{Result, SlaError};
use crate::output::{OutputEvent, OutputSink};
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardAction {
    DailyAnalysis,
    EscalationTest,
    ContextTest,
    ReasoningTest,
}

impl DashboardAction {
    pub const ALL: [DashboardAction; 4] = [
        DashboardAction::DailyAnalysis,
        DashboardAction::EscalationTest,
        DashboardAction::ContextTest,
        DashboardAction::ReasoningTest,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DashboardAction::DailyAnalysis => "Daily Analysis",
            DashboardAction::EscalationTest => "Escalation Test",
            DashboardAction::ContextTest => "Context Test",
            DashboardAction::ReasoningTest => "Reasoning Test",
        }
    }

    /// Self test dispatched by this action; `None` for the daily analysis
    pub fn self_test(&self) -> Option<SelfTest> {
        match self {
            DashboardAction::DailyAnalysis => None,
            DashboardAction::EscalationTest => Some(SelfTest::Escalation(EscalationProbe::default())),
            DashboardAction::ContextTest => Some(SelfTest::Context(ContextProbe::default())),
            DashboardAction::ReasoningTest => Some(SelfTest::Reasoning(ReasoningProbe::default())),
        }
    }
}

/// How the last run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    Succeeded(DashboardAction),
    Failed(DashboardAction, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellState {
    Idle { last: Option<RunResult> },
    Running(DashboardAction),
}

/// Build a fresh agent and make the single call for `action`
///
/// A `Completed` or `Failed` event is emitted after the call returns.
/// The call runs on its own task, so a panicking agent still ends the
/// run with `Failed`.
pub async fn execute(
    factory: Arc<dyn AgentFactory>,
    action: DashboardAction,
    out: Arc<dyn OutputSink>,
) -> RunResult {
    let run_out = out.clone();
    let outcome = tokio::spawn(async move { dispatch(factory.as_ref(), action, run_out).await })
        .await
        .unwrap_or_else(|e| Err(SlaError::Agent(join_failure(e))));
    match outcome {
        Ok(()) => {
            info!("{} completed", action.label());
            out.emit(OutputEvent::Completed {
                action: action.label().to_string(),
            });
            RunResult::Succeeded(action)
        }
        Err(e) => {
            warn!("{} failed: {}", action.label(), e);
            out.emit(OutputEvent::Failed {
                action: action.label().to_string(),
                error: e.to_string(),
            });
            RunResult::Failed(action, e.to_string())
        }
    }
}

async fn dispatch(
    factory: &dyn AgentFactory,
    action: DashboardAction,
    out: Arc<dyn OutputSink>,
) -> Result<()> {
    let agent = factory.create(out).await?;
    match action.self_test() {
        None => agent.run_daily_analysis().await.map(|_| ()),
        Some(test) => agent.run_self_test(test).await.map(|_| ()),
    }
}

fn join_failure(err: JoinError) -> String {
    if !err.is_panic() {
        return "run was cancelled".to_string();
    }
    let payload = err.into_panic();
    let reason = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("run panicked: {}", reason)
}

pub struct DashboardShell {
    factory: Arc<dyn AgentFactory>,
    selected: usize,
    state: ShellState,
}

impl DashboardShell {
    pub fn new(factory: Arc<dyn AgentFactory>) -> Self {
        Self {
            factory,
            selected: 0,
            state: ShellState::Idle { last: None },
        }
    }

    pub fn selected(&self) -> DashboardAction {
        DashboardAction::ALL[self.selected]
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn select(&mut self, action: DashboardAction) {
        if let Some(idx) = DashboardAction::ALL.iter().position(|a| *a == action) {
            self.selected = idx;
        }
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % DashboardAction::ALL.len();
    }

    pub fn select_previous(&mut self) {
        let n = DashboardAction::ALL.len();
        self.selected = (self.selected + n - 1) % n;
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ShellState::Running(_))
    }

    /// Start the selected action on a tokio task
    ///
    /// Returns `None` without side effects while a run is in progress.
    pub fn trigger(&mut self, out: Arc<dyn OutputSink>) -> Option<JoinHandle<RunResult>> {
        if let ShellState::Running(current) = self.state {
            debug!("Ignoring trigger while {} is running", current.label());
            return None;
        }

        let action = self.selected();
        self.state = ShellState::Running(action);
        let factory = self.factory.clone();
        Some(tokio::spawn(execute(factory, action, out)))
    }

    /// Feed a delivered event back; the run ends on its completion marker
    pub fn observe(&mut self, event: &OutputEvent) {
        let ShellState::Running(action) = self.state else {
            return;
        };
        match event {
            OutputEvent::Completed { .. } => {
                self.state = ShellState::Idle {
                    last: Some(RunResult::Succeeded(action)),
                };
            }
            OutputEvent::Failed { error, .. } => {
                self.state = ShellState::Idle {
                    last: Some(RunResult::Failed(action, error.clone())),
                };
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{DailyOutcome, MonitoringAgent, SelfTestOutcome};
    use crate::output::BufferSink;
    use async_trait::async_trait;
    use mockall::mock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    mock! {
        pub Agent {}

        #[async_trait]
        impl MonitoringAgent for Agent {
            async fn run_daily_analysis(&self) -> Result<DailyOutcome>;
            async fn run_self_test(&self, test: SelfTest) -> Result<SelfTestOutcome>;
        }
    }

    /// Hands out one prepared mock and counts constructions
    struct OneShotFactory {
        agent: Mutex<Option<MockAgent>>,
        created: AtomicUsize,
    }

    impl OneShotFactory {
        fn new(agent: MockAgent) -> Arc<Self> {
            Arc::new(Self {
                agent: Mutex::new(Some(agent)),
                created: AtomicUsize::new(0),
            })
        }

        fn created(&self) -> usize {
            self.created.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AgentFactory for OneShotFactory {
        async fn create(&self, _out: Arc<dyn OutputSink>) -> Result<Box<dyn MonitoringAgent>> {
            self.created.fetch_add(1, Ordering::SeqCst);
            let agent = self
                .agent
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| SlaError::Agent("agent already handed out".to_string()))?;
            Ok(Box::new(agent))
        }
    }

    fn empty_context() -> SelfTestOutcome {
        SelfTestOutcome::Context {
            context: Default::default(),
        }
    }

    async fn run(action: DashboardAction, agent: MockAgent) -> (RunResult, BufferSink, usize) {
        let factory = OneShotFactory::new(agent);
        let mut shell = DashboardShell::new(factory.clone());
        let sink = BufferSink::new();

        shell.select(action);
        let handle = shell.trigger(Arc::new(sink.clone())).unwrap();
        let result = handle.await.unwrap();
        (result, sink, factory.created())
    }

    #[tokio::test]
    async fn test_daily_analysis_calls_agent_once() {
        let mut agent = MockAgent::new();
        agent
            .expect_run_daily_analysis()
            .times(1)
            .returning(|| Ok(DailyOutcome::default()));
        agent.expect_run_self_test().never();

        let (result, _, created) = run(DashboardAction::DailyAnalysis, agent).await;
        assert_eq!(result, RunResult::Succeeded(DashboardAction::DailyAnalysis));
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn test_escalation_test_dispatches_escalation() {
        let mut agent = MockAgent::new();
        agent.expect_run_daily_analysis().never();
        agent
            .expect_run_self_test()
            .withf(|test| matches!(test, SelfTest::Escalation(_)))
            .times(1)
            .returning(|_| Ok(SelfTestOutcome::Escalation { plans: Vec::new() }));

        let (result, _, _) = run(DashboardAction::EscalationTest, agent).await;
        assert_eq!(result, RunResult::Succeeded(DashboardAction::EscalationTest));
    }

    #[tokio::test]
    async fn test_context_test_dispatches_context_with_default_window() {
        let mut agent = MockAgent::new();
        agent.expect_run_daily_analysis().never();
        agent
            .expect_run_self_test()
            .withf(|test| *test == SelfTest::Context(ContextProbe { hours_back: 24 }))
            .times(1)
            .returning(|_| Ok(empty_context()));

        let (result, _, _) = run(DashboardAction::ContextTest, agent).await;
        assert_eq!(result, RunResult::Succeeded(DashboardAction::ContextTest));
    }

    #[tokio::test]
    async fn test_reasoning_test_dispatches_reasoning() {
        let mut agent = MockAgent::new();
        agent.expect_run_daily_analysis().never();
        agent
            .expect_run_self_test()
            .withf(|test| matches!(test, SelfTest::Reasoning(_)))
            .times(1)
            .returning(|_| Ok(SelfTestOutcome::Reasoning { decisions: Vec::new() }));

        let (result, _, _) = run(DashboardAction::ReasoningTest, agent).await;
        assert_eq!(result, RunResult::Succeeded(DashboardAction::ReasoningTest));
    }

    #[tokio::test]
    async fn test_lines_precede_success_marker() {
        let sink = BufferSink::new();
        let agent_sink = sink.clone();
        let mut agent = MockAgent::new();
        agent.expect_run_daily_analysis().times(1).returning(move || {
            agent_sink.line("first");
            agent_sink.line("second");
            Ok(DailyOutcome::default())
        });

        let factory = OneShotFactory::new(agent);
        let result = execute(
            factory.clone(),
            DashboardAction::DailyAnalysis,
            Arc::new(sink.clone()),
        )
        .await;

        assert_eq!(result, RunResult::Succeeded(DashboardAction::DailyAnalysis));
        assert_eq!(
            sink.lines(),
            vec!["first", "second", "✅ Daily Analysis completed"]
        );
    }

    #[tokio::test]
    async fn test_failure_shows_no_success_marker() {
        let sink = BufferSink::new();
        let mut agent = MockAgent::new();
        agent
            .expect_run_self_test()
            .times(1)
            .returning(|_| Err(SlaError::Database("connection refused".to_string())));

        let factory = OneShotFactory::new(agent);
        let result = execute(
            factory.clone(),
            DashboardAction::ContextTest,
            Arc::new(sink.clone()),
        )
        .await;

        assert!(matches!(result, RunResult::Failed(DashboardAction::ContextTest, _)));
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], OutputEvent::Failed { .. }));
        assert!(!events
            .iter()
            .any(|e| matches!(e, OutputEvent::Completed { .. })));
    }

    #[tokio::test]
    async fn test_no_trigger_means_no_calls() {
        let mut agent = MockAgent::new();
        agent.expect_run_daily_analysis().never();
        agent.expect_run_self_test().never();

        let factory = OneShotFactory::new(agent);
        let mut shell = DashboardShell::new(factory.clone());
        for _ in 0..5 {
            shell.select_next();
        }
        shell.select_previous();

        assert_eq!(factory.created(), 0);
        assert_eq!(shell.state(), &ShellState::Idle { last: None });
    }

    #[tokio::test]
    async fn test_trigger_ignored_while_running() {
        let mut agent = MockAgent::new();
        agent
            .expect_run_daily_analysis()
            .times(1)
            .returning(|| Ok(DailyOutcome::default()));

        let factory = OneShotFactory::new(agent);
        let mut shell = DashboardShell::new(factory.clone());
        let sink = BufferSink::new();

        let handle = shell.trigger(Arc::new(sink.clone())).unwrap();
        assert!(shell.is_running());
        assert!(shell.trigger(Arc::new(sink.clone())).is_none());

        handle.await.unwrap();
        for event in sink.events() {
            shell.observe(&event);
        }
        assert_eq!(
            shell.state(),
            &ShellState::Idle {
                last: Some(RunResult::Succeeded(DashboardAction::DailyAnalysis))
            }
        );
        assert_eq!(factory.created(), 1);
    }

    #[tokio::test]
    async fn test_panicking_agent_ends_run_as_failure() {
        let mut agent = MockAgent::new();
        agent
            .expect_run_daily_analysis()
            .returning(|| panic!("store handle poisoned"));

        let factory = OneShotFactory::new(agent);
        let mut shell = DashboardShell::new(factory.clone());
        let sink = BufferSink::new();

        let handle = shell.trigger(Arc::new(sink.clone())).unwrap();
        let result = handle.await.unwrap();
        let RunResult::Failed(DashboardAction::DailyAnalysis, error) = &result else {
            panic!("expected a failed daily analysis, got {:?}", result);
        };
        assert!(error.contains("store handle poisoned"));

        let events = sink.events();
        assert!(matches!(events.last(), Some(OutputEvent::Failed { .. })));
        for event in &events {
            shell.observe(event);
        }
        assert_eq!(shell.state(), &ShellState::Idle { last: Some(result) });

        // The shell accepts the next trigger
        let handle = shell.trigger(Arc::new(sink.clone()));
        assert!(handle.is_some());
        assert!(matches!(
            handle.unwrap().await.unwrap(),
            RunResult::Failed(DashboardAction::DailyAnalysis, _)
        ));
        assert_eq!(factory.created(), 2);
    }

    #[test]
    fn test_selection_wraps() {
        let factory = OneShotFactory::new(MockAgent::new());
        let mut shell = DashboardShell::new(factory);
        shell.select_previous();
        assert_eq!(shell.selected(), DashboardAction::ReasoningTest);
        shell.select_next();
        assert_eq!(shell.selected(), DashboardAction::DailyAnalysis);
    }
}
