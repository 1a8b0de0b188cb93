//! Caller-owned history of sealed runs, per project.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::inputs::InputSet;
use super::run::RunSnapshot;

/// How a registered run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunState {
    /// Ran to completion.
    #[default]
    Completed,
    /// Stopped by the user before finishing.
    Cancelled,
    /// The mutation tool exited abnormally.
    Failed,
}

impl RunState {
    /// True if the run's results can be trusted.
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Execution metadata published alongside a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunMeta {
    /// Start time in epoch milliseconds, if known.
    pub started_at_ms: Option<i64>,
    /// Wall-clock duration in milliseconds, if known.
    pub duration_ms: Option<i64>,
    /// Outcome of the execution.
    pub state: RunState,
}

impl RunMeta {
    /// Set the start time.
    pub fn with_started_at_ms(mut self, started_at_ms: i64) -> Self {
        self.started_at_ms = Some(started_at_ms);
        self
    }

    /// Set the duration.
    pub fn with_duration_ms(mut self, duration_ms: i64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Set the run state.
    pub fn with_state(mut self, state: RunState) -> Self {
        self.state = state;
        self
    }
}

/// One logical run (an input set) with its latest and preceding snapshots.
#[derive(Debug, Clone)]
pub struct RunEntry {
    /// Inputs identifying the run.
    pub inputs: InputSet,
    /// Latest snapshot.
    pub snapshot: Arc<RunSnapshot>,
    /// Snapshot it superseded, kept so diffs stay available.
    pub superseded: Option<Arc<RunSnapshot>>,
    /// Timing and state of the latest execution.
    pub meta: RunMeta,
}

impl RunEntry {
    /// Short display label for the run.
    pub fn report_name(&self) -> String {
        self.inputs.default_report_name()
    }
}

#[derive(Debug, Default)]
struct ProjectRuns {
    // Most recent first.
    history: Vec<RunEntry>,
    current: Option<InputSet>,
}

impl ProjectRuns {
    fn position(&self, inputs: &InputSet) -> Option<usize> {
        self.history.iter().position(|entry| &entry.inputs == inputs)
    }

    // Newest start first; untimed runs follow in registration order.
    fn sort_history(&mut self) {
        self.history
            .sort_by_key(|entry| Reverse(entry.meta.started_at_ms));
    }
}

/// Run history keyed by project identity.
///
/// Open it when a project opens and drop (or [`RunRegistry::close`]) it when
/// the project closes. Publishing a run swaps it in under a write lock, so
/// readers only ever see sealed snapshots.
#[derive(Debug, Default)]
pub struct RunRegistry {
    projects: RwLock<HashMap<String, ProjectRuns>>,
}

impl RunRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `project`. Existing history is kept.
    pub fn open(&self, project: &str) {
        self.projects
            .write()
            .entry(project.to_string())
            .or_default();
    }

    /// Stop tracking `project`, dropping its history. Returns false if unknown.
    pub fn close(&self, project: &str) -> bool {
        let removed = self.projects.write().remove(project).is_some();
        debug!(project, removed, "closed project run history");
        removed
    }

    /// True if `project` is tracked.
    pub fn is_open(&self, project: &str) -> bool {
        self.projects.read().contains_key(project)
    }

    /// Latest snapshot over the same inputs; the one a new run should diff against.
    pub fn previous_for(&self, project: &str, inputs: &InputSet) -> Option<Arc<RunSnapshot>> {
        let projects = self.projects.read();
        let runs = projects.get(project)?;
        runs.position(inputs)
            .map(|ix| Arc::clone(&runs.history[ix].snapshot))
    }

    /// Publish a sealed run, superseding any earlier run over the same inputs,
    /// and make it current.
    pub fn register(&self, project: &str, inputs: InputSet, snapshot: RunSnapshot) -> Arc<RunSnapshot> {
        self.register_with(project, inputs, snapshot, RunMeta::default())
    }

    /// [`RunRegistry::register`] with execution timing and state.
    pub fn register_with(
        &self,
        project: &str,
        inputs: InputSet,
        snapshot: RunSnapshot,
        meta: RunMeta,
    ) -> Arc<RunSnapshot> {
        let snapshot = Arc::new(snapshot);
        let mut projects = self.projects.write();
        let runs = projects.entry(project.to_string()).or_default();
        let superseded = runs
            .position(&inputs)
            .map(|ix| runs.history.remove(ix).snapshot);
        info!(
            project,
            run = %inputs.default_report_name(),
            replaced = superseded.is_some(),
            state = ?meta.state,
            files = snapshot.file_count(),
            "registered mutation run"
        );
        runs.current = Some(inputs.clone());
        runs.history.insert(
            0,
            RunEntry {
                inputs,
                snapshot: Arc::clone(&snapshot),
                superseded,
                meta,
            },
        );
        runs.sort_history();
        snapshot
    }

    /// Record how a registered run ended. Returns false if it is not registered.
    pub fn set_state(&self, project: &str, inputs: &InputSet, state: RunState) -> bool {
        let mut projects = self.projects.write();
        let Some(runs) = projects.get_mut(project) else {
            return false;
        };
        let Some(ix) = runs.position(inputs) else {
            return false;
        };
        let entry = &mut runs.history[ix];
        if entry.meta.state != state {
            debug!(project, from = ?entry.meta.state, to = ?state, "run state changed");
            entry.meta.state = state;
        }
        true
    }

    /// Currently selected run of `project`.
    pub fn current(&self, project: &str) -> Option<Arc<RunSnapshot>> {
        let projects = self.projects.read();
        let runs = projects.get(project)?;
        let inputs = runs.current.as_ref()?;
        runs.position(inputs)
            .map(|ix| Arc::clone(&runs.history[ix].snapshot))
    }

    /// Select a registered run. Returns false if it is not registered.
    pub fn set_current(&self, project: &str, inputs: &InputSet) -> bool {
        let mut projects = self.projects.write();
        let Some(runs) = projects.get_mut(project) else {
            return false;
        };
        if runs.position(inputs).is_none() {
            return false;
        }
        runs.current = Some(inputs.clone());
        true
    }

    /// True if `inputs` is the current run of `project`.
    pub fn is_current(&self, project: &str, inputs: &InputSet) -> bool {
        self.projects
            .read()
            .get(project)
            .and_then(|runs| runs.current.as_ref())
            .is_some_and(|current| current == inputs)
    }

    /// Registered runs, most recently started first. Runs without a start time
    /// follow, most recently registered first.
    pub fn history(&self, project: &str) -> Vec<RunEntry> {
        self.projects
            .read()
            .get(project)
            .map(|runs| runs.history.clone())
            .unwrap_or_default()
    }

    /// Forget one run. The next most recent run becomes current if it was current.
    pub fn remove(&self, project: &str, inputs: &InputSet) -> bool {
        let mut projects = self.projects.write();
        let Some(runs) = projects.get_mut(project) else {
            return false;
        };
        let Some(ix) = runs.position(inputs) else {
            return false;
        };
        runs.history.remove(ix);
        if runs.current.as_ref() == Some(inputs) {
            runs.current = runs.history.first().map(|entry| entry.inputs.clone());
        }
        true
    }

    /// Drop all runs of `project` but keep tracking it.
    pub fn clear(&self, project: &str) {
        if let Some(runs) = self.projects.write().get_mut(project) {
            runs.history.clear();
            runs.current = None;
        }
    }
}
