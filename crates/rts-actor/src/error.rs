use thiserror::Error;

use rts_core::{ActorId, PlayerId};

#[derive(Debug, Error)]
pub enum ActorError {
    #[error("{0} does not exist")]
    UnknownActor(ActorId),

    #[error("{0} does not exist")]
    UnknownPlayer(PlayerId),
}

pub type ActorResult<T> = Result<T, ActorError>;
