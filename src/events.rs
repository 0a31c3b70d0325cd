//! Event types emitted by the engine. Both are immutable once constructed;
//! nothing downstream of a worker or reader ever mutates one.

use crate::error::EngineError;
use std::time::SystemTime;

/// One record per send attempt made by a `Worker`.
#[derive(Debug, Clone)]
pub struct LoadEvent {
    /// `-1` when no connection could be opened for this worker's slot.
    pub connection_id: i64,
    pub request_id: u64,
    pub payload_length_bytes: i64,
    pub sent_at: SystemTime,
    pub error: Option<EngineError>,
}

impl LoadEvent {
    pub fn success(connection_id: i64, request_id: u64, payload_length_bytes: i64) -> LoadEvent {
        LoadEvent {
            connection_id,
            request_id,
            payload_length_bytes,
            sent_at: SystemTime::now(),
            error: None,
        }
    }

    pub fn failure(connection_id: i64, request_id: u64, error: EngineError) -> LoadEvent {
        LoadEvent {
            connection_id,
            request_id,
            payload_length_bytes: 0,
            sent_at: SystemTime::now(),
            error: Some(error),
        }
    }
}

/// One record per response read by a `ResponseReader`.
#[derive(Debug, Clone)]
pub struct ResponseEvent {
    pub payload_length_bytes: i64,
    pub received_at: SystemTime,
    pub error: Option<EngineError>,
}

impl ResponseEvent {
    pub fn success(payload_length_bytes: i64) -> ResponseEvent {
        ResponseEvent {
            payload_length_bytes,
            received_at: SystemTime::now(),
            error: None,
        }
    }

    pub fn failure(error: EngineError) -> ResponseEvent {
        ResponseEvent {
            payload_length_bytes: 0,
            received_at: SystemTime::now(),
            error: Some(error),
        }
    }
}
