//! Record/replay of port interactions for deterministic testing.

pub mod format;
pub mod recorder;
pub mod replayer;
