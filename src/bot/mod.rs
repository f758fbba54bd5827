//! Bot module - Core bot functionality.

pub mod dispatcher;
pub mod notify;
mod runtime;
mod webhook;

pub use dispatcher::AppState;
pub use runtime::run;
