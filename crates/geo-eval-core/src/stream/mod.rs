//! Stream decoding for the analysis service's line-delimited responses

mod decoder;
mod event;

pub use decoder::{decode_events, LineDecoder};
pub use event::{CompletedPayload, RawCitationRecord, StreamEvent};
