use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, the sole wall-clock representation on
/// the wire.
pub fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Offset to add to local time to approximate the authority's clock,
/// assuming symmetric network latency: the server's timestamp is compared
/// against the midpoint of the request round trip.
pub fn estimate_offset(request_sent: i64, reply_received: i64, server_time: i64) -> i64 {
    server_time - (request_sent + reply_received) / 2
}
