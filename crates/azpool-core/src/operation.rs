//! キャンセル可能な呼び出し、長時間実行オペレーションのポーリング、ページング一覧

use crate::error::{ProvisionError, Result};
use azpool_cloud::{CloudProvider, PageRequest, ProvisioningState, ResourceId, ResourceKind};
use azpool_config::OperationsConfig;
use std::future::Future;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// `cancel` が先に発火しなければ `fut` を実行
///
/// 発火済みのトークンは完了済みのfutureより優先されるので、
/// キャンセル要求後に新しい処理は始まらない。
pub async fn cancellable<F>(cancel: &CancellationToken, fut: F) -> Result<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ProvisionError::Cancelled),
        out = fut => Ok(out),
    }
}

/// 作成したリソースのプロビジョニング状態が終端になるまでポーリング
///
/// `accepted` は作成呼び出しが返したドキュメント。空のボディや
/// ポーリング中のnot-foundは、まだリソースが実体化していないことを意味する。
pub(crate) async fn wait_for_completion(
    provider: &dyn CloudProvider,
    cancel: &CancellationToken,
    settings: &OperationsConfig,
    kind: ResourceKind,
    id: &ResourceId,
    name: &str,
    accepted: serde_json::Value,
) -> Result<serde_json::Value> {
    let deadline = Instant::now() + settings.timeout();
    let mut document = accepted;

    loop {
        if document.get("id").is_some() {
            match ProvisioningState::from_document(&document) {
                ProvisioningState::Succeeded => return Ok(document),
                state @ (ProvisioningState::Failed | ProvisioningState::Canceled) => {
                    return Err(ProvisionError::CreationFailed {
                        kind,
                        name: name.to_string(),
                        reason: format!("provisioning ended in state {}", state),
                    });
                }
                ProvisioningState::InProgress(state) => {
                    tracing::debug!("{} '{}' is {}", kind, name, state);
                }
            }
        } else {
            tracing::debug!("{} '{}' not materialized yet", kind, name);
        }

        if Instant::now() >= deadline {
            return Err(ProvisionError::CreationFailed {
                kind,
                name: name.to_string(),
                reason: format!(
                    "timed out after {}s waiting for completion",
                    settings.timeout_secs
                ),
            });
        }

        cancellable(cancel, tokio::time::sleep(settings.poll_interval())).await?;

        document = match cancellable(cancel, provider.get_resource(id, kind.api_version())).await? {
            Ok(doc) => doc,
            Err(e) if e.is_not_found() => serde_json::Value::Object(Default::default()),
            Err(source) => {
                return Err(ProvisionError::Creation {
                    kind,
                    name: name.to_string(),
                    source,
                });
            }
        };
    }
}

/// `path` のコレクションを全ページ取得
pub(crate) async fn list_all(
    provider: &dyn CloudProvider,
    cancel: &CancellationToken,
    kind: ResourceKind,
    path: String,
) -> Result<Vec<serde_json::Value>> {
    let mut documents = Vec::new();
    let mut request = Some(PageRequest::first(path, kind.api_version()));
    let mut pages = 0usize;

    while let Some(current) = request {
        let page = cancellable(cancel, provider.list_page(&current))
            .await?
            .map_err(|source| ProvisionError::Listing { kind, source })?;
        pages += 1;
        request = page.next_request();
        documents.extend(page.value);
    }

    tracing::debug!(
        "Listed {} {}(s) across {} page(s)",
        documents.len(),
        kind,
        pages
    );
    Ok(documents)
}
