//! Social post stream adapters

mod x_stream;

pub use x_stream::{parse_stream_line, reconnect_delay, XStreamClient, XStreamConfig, DEFAULT_API_BASE_URL};
