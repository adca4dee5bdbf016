//! Report and selection state machine for the dashboard.
//!
//! All UI-transient state lives in [`DashboardState`] and only changes through
//! [`DashboardState::transition`]. The async [`Dashboard`] driver wraps the
//! machine with the two suspending operations: the classifier round trip and
//! the simulated apply delay.
//!
//! # Stale responses
//! Every analysis request gets a monotonically increasing [`RequestToken`].
//! A result whose token is not the most recently issued one is discarded, so
//! when two analyses overlap the one issued last wins regardless of which
//! resolves last.
//!
//! # Completed actions
//! The completed set survives a fresh analysis and is only cleared by
//! signing out.

use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::contract::{AnalysisMode, Classifier};
use crate::distribution::{file_type_distribution, CategoryCount};
use crate::error::AnalysisError;
use crate::model::{Hierarchy, OptimizationReport, RecommendationType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

#[derive(Debug, Clone)]
pub enum Event {
    SignedIn(String),
    SignedOut,
    AnalysisRequested(AnalysisMode),
    AnalysisSucceeded {
        token: RequestToken,
        report: OptimizationReport,
    },
    AnalysisFailed {
        token: RequestToken,
        message: String,
    },
    Toggled(String),
    ApplyRequested,
    ApplyFinished,
    QuickApplied(String),
}

#[derive(Debug, Clone)]
struct InFlight {
    token: RequestToken,
    mode: AnalysisMode,
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    hierarchy: Hierarchy,
    user: Option<String>,
    report: Option<OptimizationReport>,
    report_mode: AnalysisMode,
    selected: BTreeSet<String>,
    completed: BTreeSet<String>,
    last_token: u64,
    in_flight: Option<InFlight>,
    applying: Option<BTreeSet<String>>,
    notice: Option<Notice>,
}

impl DashboardState {
    pub fn new(hierarchy: Hierarchy) -> Self {
        DashboardState {
            hierarchy,
            user: None,
            report: None,
            report_mode: AnalysisMode::Deep,
            selected: BTreeSet::new(),
            completed: BTreeSet::new(),
            last_token: 0,
            in_flight: None,
            applying: None,
            notice: None,
        }
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn report(&self) -> Option<&OptimizationReport> {
        self.report.as_ref()
    }

    /// Mode of the analysis that produced the current report.
    pub fn report_mode(&self) -> AnalysisMode {
        self.report_mode
    }

    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn completed(&self) -> &BTreeSet<String> {
        &self.completed
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.completed.contains(id)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some() || self.applying.is_some()
    }

    pub fn phase(&self) -> Phase {
        if self.is_loading() {
            Phase::Loading
        } else if self.report.is_some() {
            Phase::Ready
        } else {
            Phase::Idle
        }
    }

    /// Token of the latest analysis still awaited.
    pub fn pending_analysis(&self) -> Option<RequestToken> {
        self.in_flight.as_ref().map(|f| f.token)
    }

    /// Ids captured by an apply that has not finished yet.
    pub fn pending_apply(&self) -> Option<&BTreeSet<String>> {
        self.applying.as_ref()
    }

    /// Apply is offered only for a non-empty selection while nothing else runs.
    pub fn can_apply(&self) -> bool {
        self.report.is_some() && !self.selected.is_empty() && !self.is_loading()
    }

    pub fn file_type_distribution(&self) -> Vec<CategoryCount> {
        file_type_distribution(&self.hierarchy)
    }

    pub fn transition(mut self, event: Event) -> Self {
        match event {
            Event::SignedIn(user) => {
                info!(%user, "Signed in");
                self.user = Some(user);
            }
            Event::SignedOut => {
                info!("Signed out; clearing report, selection and completion");
                self.user = None;
                self.report = None;
                self.report_mode = AnalysisMode::Deep;
                self.selected.clear();
                self.completed.clear();
                // Tokens stay monotonic so late responses are still dropped.
                self.in_flight = None;
                self.applying = None;
                self.notice = None;
            }
            Event::AnalysisRequested(mode) => {
                self.last_token += 1;
                let token = RequestToken(self.last_token);
                debug!(?token, %mode, "Analysis requested");
                self.in_flight = Some(InFlight { token, mode });
                self.notice = None;
            }
            Event::AnalysisSucceeded { token, report } => match self.take_if_latest(token) {
                Some(mode) => {
                    info!(
                        ?token,
                        recommendations = report.recommendations.len(),
                        "Analysis result accepted"
                    );
                    self.selected = report.ids().map(str::to_string).collect();
                    self.report = Some(report);
                    self.report_mode = mode;
                }
                None => warn!(?token, "Discarding stale analysis result"),
            },
            Event::AnalysisFailed { token, message } => match self.take_if_latest(token) {
                Some(_) => {
                    warn!(?token, %message, "Analysis failed; keeping previous report");
                    self.notice = Some(Notice::Error(format!(
                        "Failed to analyze drive: {message}"
                    )));
                }
                None => warn!(?token, %message, "Discarding stale analysis failure"),
            },
            Event::Toggled(id) => {
                let known = self
                    .report
                    .as_ref()
                    .is_some_and(|r| r.recommendation(&id).is_some());
                if !known || self.completed.contains(&id) {
                    debug!(%id, known, "Toggle ignored");
                } else if !self.selected.remove(&id) {
                    self.selected.insert(id);
                }
            }
            Event::ApplyRequested => {
                if !self.can_apply() {
                    debug!(selected = self.selected.len(), "Apply ignored");
                } else {
                    info!(count = self.selected.len(), "Applying selected recommendations");
                    self.applying = Some(self.selected.clone());
                }
            }
            Event::ApplyFinished => match self.applying.take() {
                Some(ids) => {
                    info!(count = ids.len(), "Selected recommendations applied");
                    self.completed.extend(ids);
                    self.notice = Some(Notice::Info(
                        "Changes successfully applied to your drive!".to_string(),
                    ));
                }
                None => debug!("Apply finished with nothing pending"),
            },
            Event::QuickApplied(id) => {
                let is_rename = self
                    .report
                    .as_ref()
                    .and_then(|r| r.recommendation(&id))
                    .is_some_and(|r| r.kind == RecommendationType::Rename);
                if is_rename {
                    info!(%id, "Rename applied");
                    self.completed.insert(id);
                } else {
                    warn!(%id, "Quick apply is only available for RENAME recommendations");
                }
            }
        }
        self
    }

    fn take_if_latest(&mut self, token: RequestToken) -> Option<AnalysisMode> {
        if self.in_flight.as_ref().is_some_and(|f| f.token == token) {
            self.in_flight.take().map(|f| f.mode)
        } else {
            None
        }
    }
}

/// Async driver around [`DashboardState`].
pub struct Dashboard<C> {
    classifier: C,
    state: DashboardState,
    apply_delay: Duration,
}

impl<C: Classifier> Dashboard<C> {
    pub fn new(classifier: C, hierarchy: Hierarchy, apply_delay: Duration) -> Self {
        Dashboard {
            classifier,
            state: DashboardState::new(hierarchy),
            apply_delay,
        }
    }

    /// Resumes from an existing state, e.g. after swapping classifiers.
    pub fn with_state(classifier: C, state: DashboardState, apply_delay: Duration) -> Self {
        Dashboard {
            classifier,
            state,
            apply_delay,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn into_state(self) -> DashboardState {
        self.state
    }

    fn dispatch(&mut self, event: Event) {
        let state = std::mem::replace(&mut self.state, DashboardState::new(Hierarchy::default()));
        self.state = state.transition(event);
    }

    pub fn sign_in(&mut self, user: impl Into<String>) {
        self.dispatch(Event::SignedIn(user.into()));
    }

    pub fn sign_out(&mut self) {
        self.dispatch(Event::SignedOut);
    }

    pub fn toggle(&mut self, id: impl Into<String>) {
        self.dispatch(Event::Toggled(id.into()));
    }

    pub fn quick_apply(&mut self, id: impl Into<String>) {
        self.dispatch(Event::QuickApplied(id.into()));
    }

    /// Runs one analysis. On failure the previous report, selection and
    /// completion are kept and the error is returned for display.
    pub async fn run_analysis(&mut self, mode: AnalysisMode) -> Result<(), AnalysisError> {
        self.dispatch(Event::AnalysisRequested(mode));
        let Some(token) = self.state.pending_analysis() else {
            return Ok(());
        };

        match self.classifier.analyze(self.state.hierarchy(), mode).await {
            Ok(report) => {
                self.dispatch(Event::AnalysisSucceeded { token, report });
                Ok(())
            }
            Err(e) => {
                self.dispatch(Event::AnalysisFailed {
                    token,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Marks every selected recommendation completed after the simulated
    /// delay. Returns `false` when there was nothing to apply.
    pub async fn apply_selected(&mut self) -> bool {
        self.dispatch(Event::ApplyRequested);
        if self.state.pending_apply().is_none() {
            return false;
        }
        tokio::time::sleep(self.apply_delay).await;
        self.dispatch(Event::ApplyFinished);
        true
    }
}
