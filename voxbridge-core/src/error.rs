use thiserror::Error;

/// All errors produced by voxbridge-core.
#[derive(Debug, Error)]
pub enum VoxError {
    #[error("no frequency analyzer attached; cannot start monitoring")]
    AnalyzerNotReady,

    #[error("monitoring is already running")]
    AlreadyMonitoring,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("audio device error: {0}")]
    AudioDevice(String),

    #[error("audio stream error: {0}")]
    AudioStream(String),

    #[error("no default input device found")]
    NoDefaultInputDevice,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VoxError>;
