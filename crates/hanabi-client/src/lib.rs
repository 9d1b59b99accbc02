pub mod chooser;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod net_client;
pub mod session;
pub mod turn;
pub mod worker;

#[cfg(feature = "native")]
pub mod agent;
