use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`{section}` must be a JSON object, found {found}")]
    InvalidSection { section: String, found: &'static str },
}
