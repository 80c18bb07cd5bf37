use rts_mobile::MobileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("{what} length {got} does not match actor count {expected}")]
    ActorCountMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },

    #[error("movement error: {0}")]
    Mobile(#[from] MobileError),
}

pub type SimResult<T> = Result<T, SimError>;
