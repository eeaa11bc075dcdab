use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use endogrid_core::GridEffect;

/// Bridge error type
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Kernel rejected the request: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(#[from] anyhow::Error),

    #[error("Kernel did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Unknown grid instance: {0}")]
    UnknownInstance(Uuid),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Grid instance {0} is not draining its events")]
    ShellBacklog(Uuid),
}

impl BridgeError {
    /// Stable error code for the shell
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::Rejected(_) => "REJECTED",
            BridgeError::Transport(_) => "TRANSPORT",
            BridgeError::Timeout(_) => "TIMEOUT",
            BridgeError::UnknownInstance(_) => "UNKNOWN_INSTANCE",
            BridgeError::Config(_) => "CONFIG",
            BridgeError::ShellBacklog(_) => "SHELL_BACKLOG",
        }
    }
}

/// A failed effect, as shown to the user by the shell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub instance_id: Uuid,
    pub code: String,
    pub message: String,
    /// The effect that failed
    pub effect: GridEffect,
}

impl ErrorReport {
    pub fn new(instance_id: Uuid, effect: GridEffect, error: &BridgeError) -> Self {
        Self {
            instance_id,
            code: error.code().to_string(),
            message: error.to_string(),
            effect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_messages() {
        let err = BridgeError::Rejected("column is read only".to_string());
        assert_eq!(err.code(), "REJECTED");
        assert_eq!(err.to_string(), "Kernel rejected the request: column is read only");

        let err = BridgeError::from(anyhow::anyhow!("socket closed"));
        assert_eq!(err.code(), "TRANSPORT");
        assert_eq!(err.to_string(), "Transport error: socket closed");

        let err = BridgeError::ShellBacklog(Uuid::nil());
        assert_eq!(err.code(), "SHELL_BACKLOG");
        assert!(err.to_string().contains("not draining"));
    }

    #[test]
    fn test_error_report() {
        let id = Uuid::new_v4();
        let effect = GridEffect::CloseControlPanel;
        let report = ErrorReport::new(id, effect.clone(), &BridgeError::Timeout(Duration::from_secs(2)));
        assert_eq!(report.code, "TIMEOUT");
        assert_eq!(report.effect, effect);
        assert_eq!(report.message, "Kernel did not answer within 2s");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["instanceId"], id.to_string());
    }
}
