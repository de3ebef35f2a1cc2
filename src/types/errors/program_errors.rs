use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
    #[error("Entrypoint {0} not found")]
    EntrypointNotFound(String),
    #[error("The program's prime differs from the Cairo prime")]
    PrimeDiffersFromCairoPrime,
    #[error("Identifier {0} has no pc")]
    IdentifierHasNoPc(String),
}
