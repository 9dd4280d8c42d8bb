use async_trait::async_trait;
use serde::Serialize;

/// Branches that deploy to production
pub const PRODUCTION_BRANCHES: [&str; 3] = ["main", "master", "production"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    Production,
    Development,
}

impl Workflow {
    pub fn for_branch(branch: &str) -> Self {
        if PRODUCTION_BRANCHES.contains(&branch) {
            Self::Production
        } else {
            Self::Development
        }
    }

    /// Workflow file run by the dispatched job
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Production => "production-deploy.yml",
            Self::Development => "development-build.yml",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CiDispatchRequest {
    /// `owner/name`
    pub repository: String,
    pub branch: String,
    pub commit: String,
    pub author: String,
}

impl CiDispatchRequest {
    pub fn workflow(&self) -> Workflow {
        Workflow::for_branch(&self.branch)
    }
}

/// Starts CI for a pushed branch
#[async_trait]
pub trait CiDispatcher: Send + Sync {
    async fn dispatch(&self, request: &CiDispatchRequest) -> eyre::Result<Workflow>;
}
