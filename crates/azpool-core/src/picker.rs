//! リソース名の選択
//!
//! 設定済みの名前が常に優先。無ければ対象リージョンの既存リソースから選ぶか、
//! 新しい名前を入力する。

use crate::error::{ProvisionError, Result};
use async_trait::async_trait;
use azpool_cloud::ResourceKind;
use tokio_util::sync::CancellationToken;

/// 選択プロンプトへの回答
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// 提示した候補の1つ
    Existing(String),

    /// 自由入力
    New(String),
}

/// 対話的な回答の取得元
///
/// `cancel` が発火したら実装は [`ProvisionError::Cancelled`] を返す。
#[async_trait]
pub trait Prompter: Send + Sync {
    /// `candidates` を提示し、そのいずれかか新しい値を受け付ける
    async fn select(
        &self,
        cancel: &CancellationToken,
        label: &str,
        candidates: &[String],
    ) -> Result<Selection>;

    /// 1行の自由入力を求める
    async fn read_line(&self, cancel: &CancellationToken, label: &str) -> Result<String>;
}

#[async_trait]
impl<P: Prompter + ?Sized> Prompter for &P {
    async fn select(
        &self,
        cancel: &CancellationToken,
        label: &str,
        candidates: &[String],
    ) -> Result<Selection> {
        (**self).select(cancel, label, candidates).await
    }

    async fn read_line(&self, cancel: &CancellationToken, label: &str) -> Result<String> {
        (**self).read_line(cancel, label).await
    }
}

/// 選ばれた名前と、それが既存リソースを指すかどうか
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChosenName {
    pub name: String,
    pub is_existing: bool,
}

/// 再利用または作成するリソースの名前を選ぶ
pub struct ResourceNamePicker<P> {
    prompter: P,
}

impl<P: Prompter> ResourceNamePicker<P> {
    pub fn new(prompter: P) -> Self {
        Self { prompter }
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    /// `kind` のリソース名を選ぶ
    ///
    /// `candidates` は対象リージョンの既存リソース名。空でない `override_name` は
    /// 質問せずに使い、候補に含まれる場合だけ既存扱い。空白だけの指定は
    /// プロンプトに戻らずエラーにする。
    pub async fn choose(
        &self,
        cancel: &CancellationToken,
        kind: ResourceKind,
        candidates: &[String],
        override_name: &str,
    ) -> Result<ChosenName> {
        if !override_name.is_empty() {
            let override_name = override_name.trim();
            if override_name.is_empty() {
                return Err(ProvisionError::EmptyInput {
                    what: format!("{} name", kind),
                });
            }
            let is_existing = candidates.iter().any(|c| c == override_name);
            tracing::debug!(
                "Using configured {} name '{}' (existing: {})",
                kind,
                override_name,
                is_existing
            );
            return Ok(ChosenName {
                name: override_name.to_string(),
                is_existing,
            });
        }

        let input = if candidates.is_empty() {
            let label = format!("Desired name for new {}", kind);
            Selection::New(self.prompter.read_line(cancel, &label).await?)
        } else {
            let label = format!("Desired {} name, can be new or an existing name", kind);
            self.prompter.select(cancel, &label, candidates).await?
        };

        let name = match input {
            Selection::Existing(name) | Selection::New(name) => name.trim().to_string(),
        };
        if name.is_empty() {
            return Err(ProvisionError::EmptyInput {
                what: format!("{} name", kind),
            });
        }

        // 候補と一致する入力はそのリソースを指す
        let is_existing = candidates.contains(&name);
        Ok(ChosenName { name, is_existing })
    }
}
