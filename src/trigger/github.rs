// src/trigger/github.rs

use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Serialize;
use tracing::{error, info};

use super::{DispatchRequest, TriggerError, WorkflowDispatcher};

#[derive(Serialize)]
struct DispatchBody<'a> {
    #[serde(rename = "ref")]
    git_ref: &'a str,
}

/// `workflow_dispatch` over the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GithubDispatcher {
    client: reqwest::Client,
    api_base: String,
}

impl GithubDispatcher {
    pub fn new(api_base: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("evalrunner/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client for GitHub dispatch")?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn dispatch_url(&self, repository: &str, workflow_id: &str) -> String {
        format!(
            "{}/repos/{}/actions/workflows/{}.yml/dispatches",
            self.api_base,
            repository.trim(),
            workflow_id.trim()
        )
    }

    async fn send(&self, request: &DispatchRequest) -> Result<(), TriggerError> {
        request.validate().inspect_err(|e| {
            error!(error = %e, "refusing to dispatch workflow");
        })?;

        // validate() guarantees the token is present.
        let token = request.token.as_deref().unwrap_or_default();
        let url = self.dispatch_url(&request.repository, &request.workflow_id);

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/vnd.github+json")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .json(&DispatchBody {
                git_ref: request.branch.trim(),
            })
            .send()
            .await
            .map_err(|e| {
                error!(%url, error = %e, "failed to trigger workflow");
                TriggerError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(%url, status = status.as_u16(), "workflow dispatch rejected");
            return Err(TriggerError::Status(status.as_u16()));
        }

        info!(
            repository = %request.repository,
            workflow = %request.workflow_id,
            branch = %request.branch,
            "workflow dispatch accepted"
        );
        Ok(())
    }
}

impl WorkflowDispatcher for GithubDispatcher {
    fn dispatch<'a>(
        &'a self,
        request: &'a DispatchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<(), TriggerError>> + Send + 'a>> {
        Box::pin(self.send(request))
    }
}
