// src/trigger/mod.rs

//! Remote workflow trigger.
//!
//! Runs that use the real GitHub runner need a `workflow_dispatch` event
//! before the host server starts, so that a job is queued for the runner the
//! host brings up. The executor talks to a [`WorkflowDispatcher`]; production
//! uses [`GithubDispatcher`], tests can substitute their own.

pub mod github;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

pub use github::GithubDispatcher;

/// Repository and token used for dispatching workflows.
#[derive(Clone, PartialEq, Eq)]
pub struct GithubCredentials {
    /// `owner/repo`.
    pub repository: String,
    pub token: String,
}

impl fmt::Debug for GithubCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubCredentials")
            .field("repository", &self.repository)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Why a dispatch did not happen or did not succeed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TriggerError {
    #[error("no repository provided")]
    EmptyRepository,

    #[error("invalid repository '{0}': expected 'owner/repo'")]
    MalformedRepository(String),

    #[error("no branch provided")]
    EmptyBranch,

    #[error("no workflow id provided")]
    EmptyWorkflow,

    #[error("no GitHub token provided")]
    MissingCredential,

    #[error("dispatch request failed: {0}")]
    Transport(String),

    #[error("dispatch rejected with HTTP status {0}")]
    Status(u16),
}

/// One `workflow_dispatch` call.
#[derive(Clone)]
pub struct DispatchRequest {
    pub repository: String,
    /// Workflow file name without `.yml`; equals the run's subproject.
    pub workflow_id: String,
    pub branch: String,
    pub token: Option<String>,
}

impl fmt::Debug for DispatchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchRequest")
            .field("repository", &self.repository)
            .field("workflow_id", &self.workflow_id)
            .field("branch", &self.branch)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl DispatchRequest {
    /// Checks run in a fixed order and stop at the first failure.
    pub fn validate(&self) -> Result<(), TriggerError> {
        let repository = self.repository.trim();
        if repository.is_empty() {
            return Err(TriggerError::EmptyRepository);
        }
        match repository.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {}
            _ => return Err(TriggerError::MalformedRepository(self.repository.clone())),
        }
        if self.branch.trim().is_empty() {
            return Err(TriggerError::EmptyBranch);
        }
        if self.workflow_id.trim().is_empty() {
            return Err(TriggerError::EmptyWorkflow);
        }
        match self.token.as_deref() {
            Some(token) if !token.is_empty() => Ok(()),
            _ => Err(TriggerError::MissingCredential),
        }
    }
}

/// Sends workflow dispatch requests.
pub trait WorkflowDispatcher: Send + Sync {
    /// Validate and send one request. Implementations do not retry.
    fn dispatch<'a>(
        &'a self,
        request: &'a DispatchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<(), TriggerError>> + Send + 'a>>;
}
