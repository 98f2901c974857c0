//! az CLI wrapper
//!
//! Wraps the az CLI for Azure Resource Manager calls. Resource reads and
//! writes go through `az rest`, so the CLI's login session provides the
//! credentials and the raw ARM documents (including `nextLink` paging) come
//! back unchanged.

use crate::error::{AzError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::Stdio;
use tokio::process::Command;

/// Azure Resource Manager endpoint of the public cloud
pub const MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

/// az CLI wrapper
pub struct Az {
    subscription_id: String,
}

impl Az {
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
        }
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Check if az is installed and logged in to the configured subscription
    pub async fn check_auth(&self) -> Result<AzAccount> {
        // Check if az exists
        let which = Command::new("which").arg("az").output().await?;

        if !which.status.success() {
            return Err(AzError::AzNotFound);
        }

        let output = self
            .run_command(&[
                "account",
                "show",
                "--subscription",
                &self.subscription_id,
                "--output",
                "json",
            ])
            .await?;

        let account: AzAccount = serde_json::from_str(&output)?;
        Ok(account)
    }

    /// Run an az command and return stdout.
    ///
    /// The child is killed if the returned future is dropped, so an aborted
    /// call does not leave a stray process behind.
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("az");
        cmd.args(args);
        cmd.arg("--only-show-errors");
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        tracing::debug!("Running: az {}", args.join(" "));

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AzError::AzNotFound
            } else {
                AzError::IoError(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(&stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// GET an ARM URL
    pub async fn rest_get(&self, url: &str) -> Result<serde_json::Value> {
        let output = self
            .run_command(&["rest", "--method", "get", "--url", url, "--output", "json"])
            .await?;
        parse_body(&output)
    }

    /// PUT a JSON body to an ARM URL.
    ///
    /// The body is handed over through a temporary file so secrets in it
    /// (admin passwords) never show up in the process list.
    pub async fn rest_put(&self, url: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        let mut body_file = tempfile::NamedTempFile::new()?;
        serde_json::to_writer(&mut body_file, body)?;
        body_file.flush()?;
        let body_arg = format!("@{}", body_file.path().display());

        let output = self
            .run_command(&[
                "rest",
                "--method",
                "put",
                "--url",
                url,
                "--headers",
                "Content-Type=application/json",
                "--body",
                &body_arg,
                "--output",
                "json",
            ])
            .await?;
        parse_body(&output)
    }

    /// POST to an ARM action URL without a body
    pub async fn rest_post(&self, url: &str) -> Result<serde_json::Value> {
        let output = self
            .run_command(&["rest", "--method", "post", "--url", url, "--output", "json"])
            .await?;
        parse_body(&output)
    }
}

/// Build the ARM URL for `path` (`/subscriptions/...`) at `api_version`
pub fn management_url(path: &str, api_version: &str) -> String {
    format!(
        "{}{}?api-version={}",
        MANAGEMENT_ENDPOINT, path, api_version
    )
}

/// Accepted-but-empty responses (202 with no body) come back as `{}`
fn parse_body(output: &str) -> Result<serde_json::Value> {
    if output.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }
    Ok(serde_json::from_str(output)?)
}

/// Map az stderr onto an error kind.
///
/// `az rest` reports HTTP failures as `Not Found({...})`, `Forbidden({...})`
/// and so on; the typed commands report `(ErrorCode) message`.
pub fn classify_failure(stderr: &str) -> AzError {
    let message = stderr.trim().trim_start_matches("ERROR:").trim().to_string();

    let not_found = [
        "ResourceNotFound",
        "ResourceGroupNotFound",
        "NotFound(",
        "Not Found(",
        "could not be found",
    ];
    let unauthorized = ["AuthorizationFailed", "Forbidden(", "LinkedAuthorizationFailed"];
    let not_logged_in = ["az login", "Unauthorized(", "AADSTS", "InvalidAuthenticationToken"];

    if not_logged_in.iter().any(|p| message.contains(p)) {
        AzError::NotLoggedIn(message)
    } else if unauthorized.iter().any(|p| message.contains(p)) {
        AzError::AuthorizationFailed(message)
    } else if not_found.iter().any(|p| message.contains(p)) {
        AzError::ResourceNotFound(message)
    } else {
        AzError::CommandFailed(message)
    }
}

/// Account information from `az account show`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzAccount {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub user: Option<AzUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzUser {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_management_url() {
        assert_eq!(
            management_url("/subscriptions/s/resourcegroups", "2021-04-01"),
            "https://management.azure.com/subscriptions/s/resourcegroups?api-version=2021-04-01"
        );
    }

    #[test]
    fn test_classify_not_found() {
        let err = classify_failure(
            "ERROR: Not Found({\"error\":{\"code\":\"ResourceNotFound\",\"message\":\"The Resource 'Microsoft.Compute/virtualMachines/vm1' was not found.\"}})",
        );
        assert!(matches!(err, AzError::ResourceNotFound(_)));

        let err = classify_failure("ERROR: (ResourceGroupNotFound) Resource group 'rg' could not be found.");
        assert!(matches!(err, AzError::ResourceNotFound(_)));
    }

    #[test]
    fn test_classify_access_failures() {
        let err = classify_failure("ERROR: Forbidden({\"error\":{\"code\":\"AuthorizationFailed\"}})");
        assert!(matches!(err, AzError::AuthorizationFailed(_)));

        let err = classify_failure("ERROR: Please run 'az login' to setup account.");
        assert!(matches!(err, AzError::NotLoggedIn(_)));
    }

    #[test]
    fn test_classify_other_failures() {
        let err = classify_failure("ERROR: Bad Request({\"error\":{\"code\":\"InvalidParameter\"}})");
        match err {
            AzError::CommandFailed(msg) => assert!(msg.starts_with("Bad Request")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty_body() {
        assert_eq!(parse_body("  \n").unwrap(), serde_json::json!({}));
        assert_eq!(
            parse_body("{\"name\": \"x\"}").unwrap(),
            serde_json::json!({"name": "x"})
        );
        assert!(parse_body("not json").is_err());
    }

    #[test]
    fn test_account_parsing() {
        let account: AzAccount = serde_json::from_str(
            r#"{"id": "sub-1", "name": "Render Farm", "user": {"name": "ops@example.com", "type": "user"}}"#,
        )
        .unwrap();
        assert_eq!(account.name, "Render Farm");
        assert_eq!(account.user.unwrap().name, "ops@example.com");
    }
}
