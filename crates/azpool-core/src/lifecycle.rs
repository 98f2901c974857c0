//! VMプロビジョニングの状態遷移
//!
//! # 状態
//!
//! - Unresolved: 未決定
//! - Selecting: VM名を選択中
//! - Creating: ネットワークスタックとVMを作成中
//! - FetchingExisting: 既存VMを読み、パブリックIPを解決中
//! - Ready: VMとパブリックIPが確定（終端）
//! - Aborted: いずれかのステップが失敗（終端）
//!
//! # イベント
//!
//! - SelectionStarted: Unresolved → Selecting
//! - NameChosen { existing: false }: Selecting → Creating
//! - NameChosen { existing: true }: Selecting → FetchingExisting
//! - PublicIpObtained: Creating | FetchingExisting → Ready
//! - Failed: 終端以外の状態 → Aborted

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VmProvisioning {
    #[default]
    Unresolved,
    Selecting,
    Creating,
    FetchingExisting,
    Ready,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmEvent {
    SelectionStarted,
    NameChosen { existing: bool },
    PublicIpObtained,
    Failed,
}

/// 現在の状態では受け付けられないイベント
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid VM provisioning transition: {event:?} in state {from:?}")]
pub struct TransitionError {
    pub from: VmProvisioning,
    pub event: VmEvent,
}

impl VmProvisioning {
    pub fn transition(self, event: VmEvent) -> Result<Self, TransitionError> {
        use VmEvent::*;
        use VmProvisioning::*;

        match (self, event) {
            (Unresolved, SelectionStarted) => Ok(Selecting),
            (Selecting, NameChosen { existing: false }) => Ok(Creating),
            (Selecting, NameChosen { existing: true }) => Ok(FetchingExisting),
            (Creating | FetchingExisting, PublicIpObtained) => Ok(Ready),
            (state, Failed) if !state.is_terminal() => Ok(Aborted),
            (from, event) => Err(TransitionError { from, event }),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, VmProvisioning::Ready | VmProvisioning::Aborted)
    }
}

impl std::fmt::Display for VmProvisioning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VmProvisioning::Unresolved => write!(f, "unresolved"),
            VmProvisioning::Selecting => write!(f, "selecting"),
            VmProvisioning::Creating => write!(f, "creating"),
            VmProvisioning::FetchingExisting => write!(f, "fetching existing"),
            VmProvisioning::Ready => write!(f, "ready"),
            VmProvisioning::Aborted => write!(f, "aborted"),
        }
    }
}
