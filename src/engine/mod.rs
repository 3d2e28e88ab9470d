// src/engine/mod.rs

//! The session progression and scoring engine.
//!
//! Everything here is a stateless request handler over the shared store:
//! "concurrency" means independent clients issuing overlapping requests
//! against the same session rows, not tasks inside one process. The only
//! mutation that needs a total order is the current-question-index
//! transition, guarded by a conditional update in [`progression`].

pub mod answers;
pub mod leaderboard;
pub mod progression;
pub mod sessions;
