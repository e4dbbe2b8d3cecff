//! Conversational action routing core.
//!
//! Dialogue state only changes through `ContextDelta` reductions. The
//! dispatcher is pure; the session is the only place effects run.

pub mod dispatcher;
pub mod event;
pub mod gate;
pub mod session;
pub mod state;
pub mod turn;
