//! Terminal presentation of the coordinator state

pub mod history;
pub mod quotes;
pub mod setup;
pub mod ui;
pub mod watch;
