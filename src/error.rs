use crate::cave::action::Action;

/// Errors the [`crate::cave::world::World`] engine can surface from a single tick.
/// Both are recoverable from the planner's point of view: `InvalidMove` prunes a
/// branch, `GameOver` signals a caller bug (stepping a finished world).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid move: {0}")]
    InvalidMove(Action),
    #[error("game is already over")]
    GameOver,
}

/// Errors from parsing a map file. A malformed metadata line is not one of
/// these -- it is logged and skipped, per the reader's own contract.
/// `read_world` takes an already-read `&str`; file I/O happens at the CLI
/// boundary and is folded into `anyhow::Result` there, not through this type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    #[error("map has no robot")]
    MissingRobot,
    #[error("map has no lift")]
    MissingLift,
    #[error("map grid is empty")]
    EmptyGrid,
}
