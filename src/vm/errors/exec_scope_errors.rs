use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecScopeError {
    #[error("Cannot exit main scope.")]
    ExitMainScopeError,
    #[error("Every enter_scope() requires a corresponding exit_scope().")]
    NoScopeError,
}
