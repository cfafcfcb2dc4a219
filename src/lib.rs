pub mod cave;
pub mod error;
pub mod heuristic;
pub mod search;

#[cfg(feature = "native")]
pub mod logging;
#[cfg(feature = "native")]
pub mod report;
