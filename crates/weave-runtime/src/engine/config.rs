//! Engine configuration.

/// Hard ceiling on iterations per run; the only infinite-loop guard.
const DEFAULT_MAX_ITERATIONS: u32 = 1000;

/// Truncation length for per-node output previews in traces.
const DEFAULT_OUTPUT_PREVIEW_LEN: usize = 500;

/// Tunables for the workflow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum iterations before a run is cut off.
    pub max_iterations: u32,
    /// Truncation length for recorded node output previews.
    pub output_preview_len: usize,
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            output_preview_len: DEFAULT_OUTPUT_PREVIEW_LEN,
        }
    }

    /// Overrides the iteration ceiling.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ceiling_is_one_thousand() {
        let config = EngineConfig::default();
        assert_eq!(config.max_iterations, 1000);
        assert_eq!(config.output_preview_len, 500);
    }

    #[test]
    fn ceiling_can_be_overridden() {
        let config = EngineConfig::new().with_max_iterations(10);
        assert_eq!(config.max_iterations, 10);
    }
}
