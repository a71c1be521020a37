use std::net::SocketAddr;

/// How many confirmed actions the hub keeps around for late undo requests.
pub const DEFAULT_RETENTION: usize = 200;

/// Per-participant outbound queue depth before the hub gives up on a slow
/// connection and drops it.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub retention: usize,
    pub queue_capacity: usize,
}

impl ServerConfig {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            retention: DEFAULT_RETENTION,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}
