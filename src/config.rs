use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_DOMAIN: &str = "example.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);
const DEFAULT_QUERY_COUNT: u32 = 4;

const ENV_DOMAIN: &str = "WHICHDNS_DOMAIN";
const ENV_TIMEOUT_SECS: &str = "WHICHDNS_TIMEOUT_SECS";
const ENV_INTERFACE: &str = "WHICHDNS_INTERFACE";

/// Settings for one run, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Domain looked up to generate DNS traffic
    pub domain: String,
    /// How long to wait for a DNS response after capture starts
    pub timeout: Duration,
    /// Idle backoff of the capture loop
    pub poll_interval: Duration,
    /// Number of sequential lookups
    pub query_count: u32,
    /// Capture interface; auto-selected when `None`
    pub interface: Option<String>,
    /// Print only the responder address
    pub ip_only: bool,
    /// Verbose diagnostics
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            query_count: DEFAULT_QUERY_COUNT,
            interface: None,
            ip_only: false,
            debug: false,
        }
    }
}

impl Config {
    /// Defaults with environment variable overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var(ENV_DOMAIN) {
            config.domain = val;
        }
        if let Ok(val) = std::env::var(ENV_TIMEOUT_SECS) {
            let secs: u64 = val.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_TIMEOUT_SECS,
                value: val.clone(),
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Ok(val) = std::env::var(ENV_INTERFACE) {
            if !val.trim().is_empty() {
                config.interface = Some(val.trim().to_string());
            }
        }

        Ok(config)
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_query_count(mut self, count: u32) -> Self {
        self.query_count = count;
        self
    }

    pub fn with_interface(mut self, interface: Option<String>) -> Self {
        self.interface = interface;
        self
    }

    pub fn with_ip_only(mut self, ip_only: bool) -> Self {
        self.ip_only = ip_only;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Reject settings that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domain.trim().is_empty() {
            return Err(ConfigError::EmptyDomain);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.query_count == 0 {
            return Err(ConfigError::ZeroQueryCount);
        }
        Ok(())
    }

    /// Default `tracing` filter directive for these settings.
    ///
    /// Ip-only mode stays silent unless debug output was requested.
    pub fn tracing_filter(&self) -> &'static str {
        match (self.debug, self.ip_only) {
            (true, _) => "whichdns=debug",
            (false, true) => "off",
            (false, false) => "whichdns=warn",
        }
    }
}
