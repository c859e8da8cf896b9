// Library exports for devlogs, a device log retrieval client

pub mod cli;
pub mod config;
pub mod delivery;
pub mod error;
pub mod logging;
pub mod logs;
pub mod session;
