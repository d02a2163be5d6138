use ehr_core::EhrError;

#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    #[error("secret or environment variable {0} was not set")]
    MissingSecret(String),
    #[error(transparent)]
    Ehr(#[from] EhrError),
}

pub type FunctionResult<T> = std::result::Result<T, FunctionError>;
