//! Port selection for a spawned llama-server.

use std::net::TcpListener;

use tracing::debug;

use crate::error::RuntimeError;

/// Number of consecutive ports scanned from the base port.
pub const PORT_WINDOW: u16 = 100;

/// Check if a port is available by binding to it on loopback.
pub fn is_port_available(port: u16) -> bool {
    TcpListener::bind(("127.0.0.1", port)).is_ok_and(|listener| listener.local_addr().is_ok())
}

/// Reject privileged or occupied ports for an explicitly requested port.
pub fn validate_port(port: u16) -> Result<u16, RuntimeError> {
    if port < 1024 {
        return Err(RuntimeError::PrivilegedPort(port));
    }
    if !is_port_available(port) {
        return Err(RuntimeError::PortInUse(port));
    }
    Ok(port)
}

/// First free port in `base_port..base_port + PORT_WINDOW`.
pub fn allocate_port(base_port: u16) -> Result<u16, RuntimeError> {
    let end = base_port.saturating_add(PORT_WINDOW - 1);
    for port in base_port..=end {
        if port < 1024 {
            continue;
        }
        if is_port_available(port) {
            debug!(port, "Allocated engine port");
            return Ok(port);
        }
        debug!(port, "Port unavailable, skipping");
    }
    Err(RuntimeError::NoFreePort {
        start: base_port,
        end,
    })
}
