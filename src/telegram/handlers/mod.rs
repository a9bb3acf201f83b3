//! Modular update handlers and dispatcher schema

mod callbacks;
mod commands;
mod join_requests;
mod messages;
mod schema;
mod types;

pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
