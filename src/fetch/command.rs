//! Retrieval through an external command
//!
//! Runs `<program> <args...> <key>`, by default `go get -u -d <key>`, and
//! keeps stdout and stderr together so a failure can be shown in full.

use crate::config::schema::FetchConfig;
use crate::error::{ProxyError, ProxyResult};
use crate::fetch::fetcher::Fetcher;
use crate::package::PackageKey;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Fetcher that shells out to a retrieval program
#[derive(Debug, Clone)]
pub struct CommandFetcher {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandFetcher {
    /// Create a fetcher running `program args... <key>`
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
        }
    }

    /// Build from the `[fetch]` config section
    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone()).with_timeout(config.timeout())
    }

    /// Kill the command if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn command_line(&self, key: &PackageKey) -> String {
        let mut parts = vec![self.program.as_str()];
        parts.extend(self.args.iter().map(String::as_str));
        parts.push(key.as_str());
        parts.join(" ")
    }
}

/// Join stdout and stderr into one buffer for error reports
fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !combined.is_empty() && !stderr.is_empty() && !combined.ends_with('\n') {
        combined.push('\n');
    }
    combined.push_str(&stderr);
    combined
}

#[async_trait]
impl Fetcher for CommandFetcher {
    async fn fetch(&self, key: &PackageKey) -> ProxyResult<()> {
        info!("Getting package {:?}...", key.as_str());
        debug!("Executing: {}", self.command_line(key));

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(key.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Get of package {:?} timed out after {:?}", key.as_str(), limit);
                    return Err(ProxyError::FetchTimeout {
                        package: key.to_string(),
                        secs: limit.as_secs(),
                    });
                }
            },
            None => child.await,
        };

        let output = result.map_err(|e| {
            warn!("Could not start {:?}: {}", self.program, e);
            ProxyError::fetch_failed(key.as_str(), e.to_string(), "")
        })?;

        if !output.status.success() {
            let combined = combined_output(&output);
            warn!(
                "Get of package {:?} failed: {}; output: {}",
                key.as_str(),
                output.status,
                combined
            );
            return Err(ProxyError::fetch_failed(
                key.as_str(),
                output.status.to_string(),
                combined,
            ));
        }

        info!("Fetched package {:?}", key.as_str());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.program
    }
}
