use crate::config::ConfigError;
use crate::failure::FailureError;
use crate::graph::GraphError;
use crate::id::{ConnectionId, PlayerId, StationId};
use crate::player::PlayerError;
use crate::state::{GameState, IntentKind};

/// Top-level engine error.
///
/// Intent rejections are recoverable: the game is unchanged and the host can
/// show the message. Everything else points at a malformed map or config, or
/// at a caller handing in ids from another game.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("cannot {intent} while {state}")]
    IllegalStateTransition { state: GameState, intent: IntentKind },
    #[error("cannot {intent}: the game is over")]
    GameOver { intent: IntentKind },
    #[error("it is {current}'s turn, not {player}'s")]
    NotCurrentPlayer { player: PlayerId, current: PlayerId },
    #[error("station {0:?} is broken")]
    StationBroken(StationId),
    #[error("stations {from:?} and {to:?} are not connected")]
    NotAdjacent { from: StationId, to: StationId },
    #[error("connection {0:?} is blocked")]
    ConnectionBlocked(ConnectionId),
    #[error("a route needs at least two stations")]
    RouteTooShort,
    #[error("{player}'s train {train} has not been placed")]
    TrainNotPlaced { player: PlayerId, train: usize },
    #[error("{player}'s train {train} is already placed")]
    TrainAlreadyPlaced { player: PlayerId, train: usize },
    #[error(transparent)]
    Player(#[from] PlayerError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Failure(#[from] FailureError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GameError {
    /// Whether the error rejects a single intent and leaves the game usable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::IllegalStateTransition { .. }
            | Self::GameOver { .. }
            | Self::NotCurrentPlayer { .. }
            | Self::StationBroken(_)
            | Self::NotAdjacent { .. }
            | Self::ConnectionBlocked(_)
            | Self::RouteTooShort
            | Self::TrainNotPlaced { .. }
            | Self::TrainAlreadyPlaced { .. } => true,
            Self::Player(PlayerError::UnknownTrain { .. }) => true,
            Self::Player(_) | Self::Graph(_) | Self::Failure(_) | Self::Config(_) => false,
        }
    }
}
