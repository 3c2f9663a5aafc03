pub mod board;
pub mod counters;
pub mod endpoints;
pub mod error;
pub mod event;
pub mod formatter;
pub mod render;
pub mod snapshot;
pub mod source;
pub mod state;
pub mod widget;

