//! Tuning knobs of the simulation and FRAIG passes.
//!
//! Both limits are heuristics without a derivation behind them, hence configurable.

/// Random simulation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    /// Seed of the pattern generator, so that runs are reproducible.
    pub seed: u64,
    /// Number of consecutive words that may leave the FEC group count unchanged
    /// before random simulation gives up. `None` picks a value from the circuit size,
    /// see [`SimConfig::max_fail_for`].
    pub max_fail: Option<u32>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 9487,
            max_fail: None,
        }
    }
}

impl SimConfig {
    /// The failure budget for a circuit whose evaluation order has `dfs_len` nodes:
    /// 3 for small circuits, `log5(dfs_len)` otherwise.
    pub fn max_fail_for(&self, dfs_len: usize) -> u32 {
        match self.max_fail {
            Some(max_fail) => max_fail,
            None if dfs_len < 100 => 3,
            None => ((dfs_len as f64).ln() / 5f64.ln()) as u32,
        }
    }
}

/// FRAIG loop parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FraigConfig {
    /// Consecutive rounds without any change of the FEC group count before giving up.
    pub stagnation_limit: u32,
}

impl Default for FraigConfig {
    fn default() -> Self {
        Self {
            stagnation_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    pub sim: SimConfig,
    pub fraig: FraigConfig,
}
