use std::time::Duration;

/// Runtime configuration for an [`Engine`](crate::Engine).
///
/// Options use a builder style:
///
/// ```
/// use std::time::Duration;
/// use regex_engines::Config;
///
/// let config = Config::new()
///     .max_backtracks(10_000)
///     .timeout(Duration::from_secs(5))
///     .cache_max_size(64);
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    max_pattern_length: usize,
    max_input_length: usize,
    max_backtracks: u64,
    timeout: Duration,
    cache_enabled: bool,
    cache_max_size: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            max_pattern_length: 10_000,
            max_input_length: 1_000_000,
            max_backtracks: 100_000,
            timeout: Duration::from_secs(30),
            cache_enabled: true,
            cache_max_size: 1_000,
        }
    }
}

impl Config {
    /// Return a new default configuration.
    pub fn new() -> Config {
        Config::default()
    }

    /// Patterns longer than this many code points are rejected with an
    /// invalid-argument error. Defaults to 10 000.
    pub fn max_pattern_length(mut self, limit: usize) -> Config {
        self.max_pattern_length = limit;
        self
    }

    /// Inputs longer than this many code points are rejected with an
    /// invalid-argument error. Defaults to 1 000 000.
    pub fn max_input_length(mut self, limit: usize) -> Config {
        self.max_input_length = limit;
        self
    }

    /// The backtracking engine aborts once it has performed this many
    /// backtracks. Defaults to 100 000.
    pub fn max_backtracks(mut self, limit: u64) -> Config {
        self.max_backtracks = limit;
        self
    }

    /// Wall-clock budget for a single match operation, checked throughout
    /// the run by every engine. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Config {
        self.timeout = timeout;
        self
    }

    /// Whether compiled patterns are cached. When disabled, every operation
    /// reparses its pattern. Enabled by default.
    pub fn cache_enabled(mut self, yes: bool) -> Config {
        self.cache_enabled = yes;
        self
    }

    /// The maximum number of cached compiled patterns; the oldest entry is
    /// evicted first. Defaults to 1 000.
    pub fn cache_max_size(mut self, size: usize) -> Config {
        self.cache_max_size = size;
        self
    }

    pub fn get_max_pattern_length(&self) -> usize {
        self.max_pattern_length
    }

    pub fn get_max_input_length(&self) -> usize {
        self.max_input_length
    }

    pub fn get_max_backtracks(&self) -> u64 {
        self.max_backtracks
    }

    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }

    pub fn get_cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    pub fn get_cache_max_size(&self) -> usize {
        self.cache_max_size
    }
}
