use crate::id::{PlayerId, StationId};
use crate::state::IntentKind;

/// A player request routed into the engine by the host UI.
///
/// `train` is the index of the train in the player's resource list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    BeginRoute { player: PlayerId, train: usize },
    EndRoute,
    CancelRoute,
    BeginPlacement { player: PlayerId, train: usize },
    CancelPlacement,
    EndTurn,
    StationClicked(StationId),
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::BeginRoute { .. } => IntentKind::BeginRoute,
            Intent::EndRoute => IntentKind::EndRoute,
            Intent::CancelRoute => IntentKind::CancelRoute,
            Intent::BeginPlacement { .. } => IntentKind::BeginPlacement,
            Intent::CancelPlacement => IntentKind::CancelPlacement,
            Intent::EndTurn => IntentKind::EndTurn,
            Intent::StationClicked(_) => IntentKind::StationClick,
        }
    }
}
