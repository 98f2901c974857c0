//! プロビジョニングのエラー型

use crate::lifecycle::TransitionError;
use azpool_cloud::{CloudError, ResourceId, ResourceKind};
use std::path::PathBuf;
use thiserror::Error;

/// プロビジョニングパイプラインのエラー
///
/// どのバリアントも実行を終了させる。報告方法は呼び出し側が決め、
/// パイプライン内でプロセスを終了することはない。
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("no {what} given, aborting")]
    EmptyInput { what: String },

    #[error("invalid {what}: {reason}")]
    InvalidInput { what: String, reason: String },

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("failed to read SSH key data from {path}: {source}")]
    SshKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} '{name}' not found: {source}")]
    NotFound {
        kind: ResourceKind,
        name: String,
        #[source]
        source: CloudError,
    },

    #[error("unable to retrieve {kind} '{name}': {source}")]
    Access {
        kind: ResourceKind,
        name: String,
        #[source]
        source: CloudError,
    },

    #[error("{kind} '{name}' is in region {actual}, expected {expected}")]
    WrongRegion {
        kind: ResourceKind,
        name: String,
        actual: String,
        expected: String,
    },

    #[error("unable to fetch list of existing {kind}s: {source}")]
    Listing {
        kind: ResourceKind,
        #[source]
        source: CloudError,
    },

    #[error("error creating {kind} '{name}': {source}")]
    Creation {
        kind: ResourceKind,
        name: String,
        #[source]
        source: CloudError,
    },

    #[error("error creating {kind} '{name}': {reason}")]
    CreationFailed {
        kind: ResourceKind,
        name: String,
        reason: String,
    },

    #[error("not authenticated with {provider}: {reason}")]
    Unauthenticated { provider: String, reason: String },

    #[error("VM '{vm}' has no network interface")]
    NoNetworkInterface { vm: String },

    #[error("unable to find NIC {nic_id} for VM '{vm}': {source}")]
    NicFetch {
        vm: String,
        nic_id: ResourceId,
        #[source]
        source: CloudError,
    },

    #[error("unable to find public IP address on NIC '{nic}'")]
    NoPublicIp { nic: String },

    #[error("unable to retrieve public IP {public_ip_id}: {source}")]
    PublicIpFetch {
        public_ip_id: ResourceId,
        #[source]
        source: CloudError,
    },

    #[error(transparent)]
    Lifecycle(#[from] TransitionError),

    #[error("operation cancelled")]
    Cancelled,
}

/// オペレーターに報告するエラー分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    UserInput,
    NotFound,
    Access,
    Creation,
    ReferenceResolution,
    Cancellation,
}

impl ProvisionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProvisionError::EmptyInput { .. }
            | ProvisionError::InvalidInput { .. }
            | ProvisionError::Prompt(_)
            | ProvisionError::SshKey { .. } => ErrorCategory::UserInput,
            ProvisionError::NotFound { .. } | ProvisionError::WrongRegion { .. } => {
                ErrorCategory::NotFound
            }
            ProvisionError::Access { .. }
            | ProvisionError::Listing { .. }
            | ProvisionError::Unauthenticated { .. } => ErrorCategory::Access,
            ProvisionError::Creation { .. }
            | ProvisionError::CreationFailed { .. }
            | ProvisionError::Lifecycle(_) => ErrorCategory::Creation,
            ProvisionError::NoNetworkInterface { .. }
            | ProvisionError::NicFetch { .. }
            | ProvisionError::NoPublicIp { .. }
            | ProvisionError::PublicIpFetch { .. } => ErrorCategory::ReferenceResolution,
            ProvisionError::Cancelled => ErrorCategory::Cancellation,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProvisionError::Cancelled)
    }

    /// 既存リソースの読み取り失敗を分類
    pub(crate) fn lookup(kind: ResourceKind, name: &str, source: CloudError) -> Self {
        if source.is_not_found() {
            ProvisionError::NotFound {
                kind,
                name: name.to_string(),
                source,
            }
        } else {
            ProvisionError::Access {
                kind,
                name: name.to_string(),
                source,
            }
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::UserInput => write!(f, "user input"),
            ErrorCategory::NotFound => write!(f, "not found"),
            ErrorCategory::Access => write!(f, "access"),
            ErrorCategory::Creation => write!(f, "creation"),
            ErrorCategory::ReferenceResolution => write!(f, "reference resolution"),
            ErrorCategory::Cancellation => write!(f, "cancellation"),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
