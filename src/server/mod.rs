mod handlers;
mod response;

pub mod config;
pub mod context;
pub mod restful;

pub use response::{CommonResponse, ResourceResponse};
