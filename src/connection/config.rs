use std::time::Duration;

/// Keyed connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum connections per endpoint (idle + handed out)
    pub max_per_endpoint: usize,

    /// Timeout for establishing a new connection
    pub connect_timeout: Duration,

    /// How long an acquire may wait for a connection to free up
    /// when the per-endpoint cap is reached
    pub acquire_timeout: Duration,
}

impl PoolConfig {
    pub fn new() -> Self {
        Self {
            max_per_endpoint: 4,
            connect_timeout: Duration::from_secs(2),
            acquire_timeout: Duration::from_secs(5),
        }
    }

    /// Set maximum connections per endpoint
    pub fn max_per_endpoint(mut self, max: usize) -> Self {
        self.max_per_endpoint = max;
        self
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set acquire timeout
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_per_endpoint == 0 {
            return Err("max_per_endpoint must be > 0".to_string());
        }
        if self.connect_timeout.is_zero() {
            return Err("connect_timeout must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}
