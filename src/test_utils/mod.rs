//! In-memory engine fakes for engine-independent tests.

mod scripted;
pub mod test_helpers;

pub use scripted::{EngineEvent, EngineLog, Responder, ScriptedEngine};
