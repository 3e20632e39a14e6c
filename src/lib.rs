pub mod authz;
pub mod config;
pub mod dirs;
pub mod gate;
pub mod logs;
pub mod now;
pub mod roles;
pub mod server;
pub mod session;
