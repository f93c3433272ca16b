//! Progress event adapters

mod channel;
mod json_lines;

pub use channel::ChannelEmitter;
pub use json_lines::JsonLinesEmitter;
