//! プロバイダの認証確認

use crate::error::{ProvisionError, Result};
use crate::operation::cancellable;
use azpool_cloud::CloudProvider;
use tokio_util::sync::CancellationToken;

/// 認証済みであることを確認し、アカウント情報を返す
pub async fn authenticate(
    provider: &dyn CloudProvider,
    cancel: &CancellationToken,
) -> Result<String> {
    let unauthenticated = |reason: String| ProvisionError::Unauthenticated {
        provider: provider.display_name().to_string(),
        reason,
    };

    let status = cancellable(cancel, provider.check_auth())
        .await?
        .map_err(|e| unauthenticated(e.to_string()))?;
    if !status.authenticated {
        return Err(unauthenticated(status.error.unwrap_or_default()));
    }

    let account = status.account_info.unwrap_or_default();
    tracing::info!("Authenticated with {}: {}", provider.display_name(), account);
    Ok(account)
}
