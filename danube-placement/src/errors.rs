use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlacementError>;

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("Invalid load manager configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse load manager configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Failed to parse broker load data: {0}")]
    LoadDataParse(#[from] serde_json::Error),
}
