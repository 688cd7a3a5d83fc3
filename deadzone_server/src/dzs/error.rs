use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    /// Input failed the allow-list before any parsing happened.
    #[error("unsafe expression: {0}")]
    Unsafe(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("type error: {0}")]
    Type(String),
    #[error("step budget of {0} exhausted")]
    Budget(u64),
    #[error("{0}")]
    Runtime(String),
}

pub type ScriptResult<T> = Result<T, ScriptError>;
