pub mod capture;
pub mod config;
pub mod error;
pub mod kernel;
pub mod outputs;
pub mod portal;
pub mod server;
pub mod services;

pub use kernel::session::{Session, TurnReport};
