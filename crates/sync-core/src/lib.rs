pub mod config;
pub mod coordinator;
pub mod model;
pub mod notify;
pub mod poller;
pub mod progress;
pub mod runner;
pub mod scheduler;
pub mod state;
pub mod tracker;

pub use coordinator::Coordinator;
