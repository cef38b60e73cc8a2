//! Service layer
//!
//! Services contain the business logic of wusa. The lifecycle service drives
//! runner creation, start-up and removal against the container driver, the
//! remote API and the registry; output is reported through a sink.

mod lifecycle;
mod sink;

pub use lifecycle::{
    LISTENING_SENTINEL, LifecycleService, RECONNECTING_MARKER, UpOutcome, validate_request,
};
pub use sink::{BufferedSink, LogLine, OutputSink};
