//! Client configuration.

use std::net::SocketAddr;
use std::time::Duration;

use quill_core::{QuillError, Result};

/// Validated configuration for a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    address: SocketAddr,
    connect_timeout: Duration,
    max_pool_size: usize,
}

impl ClientConfig {
    /// Starts building a configuration.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// The server address to connect to.
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// How long connection establishment may take before acquisition fails.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Upper bound on concurrently open connections.
    pub fn max_pool_size(&self) -> usize {
        self.max_pool_size
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    address: Option<SocketAddr>,
    connect_timeout: Duration,
    max_pool_size: usize,
}

impl ClientConfigBuilder {
    /// Creates a builder with default timeouts and pool sizing.
    pub fn new() -> Self {
        Self {
            address: None,
            connect_timeout: Duration::from_secs(10),
            max_pool_size: 16,
        }
    }

    /// Sets the server address. Required.
    pub fn address(mut self, address: SocketAddr) -> Self {
        self.address = Some(address);
        self
    }

    /// Sets the connection establishment timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the maximum pool size.
    pub fn max_pool_size(mut self, size: usize) -> Self {
        self.max_pool_size = size;
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<ClientConfig> {
        let address = self.address.ok_or_else(|| {
            QuillError::Configuration("a server address is required".to_string())
        })?;
        if self.max_pool_size == 0 {
            return Err(QuillError::Configuration(
                "max_pool_size must be at least 1".to_string(),
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(QuillError::Configuration(
                "connect_timeout must be non-zero".to_string(),
            ));
        }
        Ok(ClientConfig {
            address,
            connect_timeout: self.connect_timeout,
            max_pool_size: self.max_pool_size,
        })
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
