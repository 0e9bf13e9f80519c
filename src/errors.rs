use thiserror::Error;

/// Everything in here is fatal to the run. A failed dispatch or readback
/// leaves GPU buffer state unspecified, so there is no retry path anywhere.
#[derive(Debug, Error)]
pub enum PhysarumError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("{0}")]
    Config(#[from] config::ConfigError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("resource allocation failed: {0}")]
    ResourceAllocation(String),
    #[error("dispatch failed: {0}")]
    Dispatch(String),
    #[error("presentation failed: {0}")]
    Presentation(String),
    #[error("{0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("{0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("{0}")]
    Os(#[from] winit::error::OsError),
}
