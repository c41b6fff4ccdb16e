/// Transport and stream handling for the agent endpoint.
///
/// - `client` - the `QueryBackend` seam and its reqwest implementation
/// - `stream` - incremental UTF-8 decoding and response accumulation
mod client;
mod stream;

pub use client::{ChunkStream, HttpBackend, QueryBackend, display_body};
pub use stream::{ResponseAccumulator, Utf8ChunkDecoder, accumulate};
