//! # contract: capability seams between the dashboard and the outside world
//!
//! This module defines the traits the presentation layer depends on, so that
//! each external concern can be swapped without touching the others:
//!
//! - [`HierarchyProvider`]: where the folder/file snapshot comes from (the
//!   mock drive today, a real storage listing later).
//! - [`Classifier`]: the external AI service turning a hierarchy into an
//!   [`OptimizationReport`].
//! - [`SessionStore`]: where the signed-in identity is persisted.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`; with the `test-export-mocks`
//!   feature (on by default) `MockClassifier`, `MockHierarchyProvider` and
//!   `MockSessionStore` are available to integration tests.
//! - The real classifier is non-deterministic, so tests substitute a mock or
//!   a fixture-backed implementation rather than calling the network.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AnalysisError, HierarchyError, SessionError};
use crate::model::{Hierarchy, OptimizationReport};

/// Scope hint for the classifier. Does not change the output schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Scan everything.
    #[default]
    Deep,
    /// Focus on recent items.
    Weekly,
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::Deep => f.write_str("deep"),
            AnalysisMode::Weekly => f.write_str("weekly"),
        }
    }
}

/// Source of hierarchy snapshots.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait HierarchyProvider: Send + Sync {
    async fn load(&self) -> Result<Hierarchy, HierarchyError>;
}

/// External classification service.
///
/// One call is one blocking round trip from the caller's point of view:
/// no streaming, no partial results, no retries.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn analyze(
        &self,
        hierarchy: &Hierarchy,
        mode: AnalysisMode,
    ) -> Result<OptimizationReport, AnalysisError>;
}

/// Durable storage for the signed-in identity, the only persisted state.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait SessionStore: Send + Sync {
    fn load_user(&self) -> Result<Option<String>, SessionError>;

    fn save_user(&self, user: &str) -> Result<(), SessionError>;

    fn clear_user(&self) -> Result<(), SessionError>;
}
