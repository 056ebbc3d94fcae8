//! Configuration and statistics for the fictitious-play solver.

use serde::{Deserialize, Serialize};

/// Configuration for the fictitious-play solver.
///
/// # Example
/// ```
/// use fp_solver::fp::FPConfig;
///
/// let config = FPConfig::default().with_iterations(50).with_parallel(false);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FPConfig {
    /// Number of fictitious-play iterations run by `solve`.
    ///
    /// Each iteration is one best-response pass and range update for
    /// each player.
    pub iterations: u64,

    /// Evaluate hands in parallel on the rayon pool.
    ///
    /// Results are identical to the sequential path.
    pub parallel: bool,

    /// Record a convergence point (and log it) every this many iterations.
    pub log_interval: u64,

    /// Draw a terminal progress bar while solving.
    pub show_progress: bool,
}

impl Default for FPConfig {
    fn default() -> Self {
        Self {
            iterations: 200,
            parallel: true,
            log_interval: 10,
            show_progress: false,
        }
    }
}

impl FPConfig {
    /// Create a new FPConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the iteration count.
    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    /// Builder method: enable or disable parallel hand evaluation.
    pub fn with_parallel(mut self, enable: bool) -> Self {
        self.parallel = enable;
        self
    }

    /// Builder method: set the convergence logging interval.
    pub fn with_log_interval(mut self, interval: u64) -> Self {
        self.log_interval = interval;
        self
    }

    /// Builder method: show or hide the progress bar.
    pub fn with_progress(mut self, enable: bool) -> Self {
        self.show_progress = enable;
        self
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if self.log_interval == 0 {
            return Err(ConfigError::ZeroLogInterval);
        }
        Ok(())
    }
}

/// Errors that can occur when validating or loading a configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// At least one iteration is required.
    ZeroIterations,
    /// The logging interval must be positive.
    ZeroLogInterval,
    /// The JSON could not be read or written.
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ZeroIterations => write!(f, "Iteration count must be at least 1"),
            ConfigError::ZeroLogInterval => write!(f, "Log interval must be at least 1"),
            ConfigError::Parse(msg) => write!(f, "Invalid configuration JSON: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Statistics tracked while solving.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FPStats {
    /// Total number of iterations completed.
    pub iterations: u64,

    /// Total time spent solving (in seconds).
    pub elapsed_seconds: f64,

    /// Iterations per second.
    pub iterations_per_second: f64,

    /// Convergence measurements, one per logging interval.
    pub history: Vec<ConvergencePoint>,
}

/// Root diagnostics at a specific iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergencePoint {
    /// Iteration number when this measurement was taken.
    pub iteration: u64,
    /// Player A's best-response average EV at the root.
    pub average_ev_a: Option<f64>,
    /// Player B's best-response average EV at the root.
    pub average_ev_b: Option<f64>,
    /// Sum of both best-response values minus the chips in play.
    ///
    /// Shrinks toward 0 as the running strategies approach equilibrium.
    pub exploitability: Option<f64>,
}

impl FPStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update iterations per second based on elapsed time.
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.iterations_per_second = self.iterations as f64 / self.elapsed_seconds;
        }
    }

    /// Record a convergence point.
    pub fn record(&mut self, point: ConvergencePoint) {
        self.history.push(point);
    }

    /// The most recent exploitability measurement, if any.
    pub fn latest_exploitability(&self) -> Option<f64> {
        self.history.last().and_then(|p| p.exploitability)
    }
}
