//! Reduction configuration.
//!
//! `ReductionConfig` bundles the knobs every reduction receives: the worker
//! pool size, debug flags and the round limit for the bin merge.
//!
//! ## Environment
//!
//! [`ReductionConfig::from_env`] reads:
//! - `COLOR_POOL_SIZE`: worker count (default: available parallelism)
//! - `COLOR_DEBUG`: legacy bitmask, bit 0 = trace, bit 1 = visualize (default: 0)
//! - `COLOR_MAX_ROUNDS`: merge round limit (default: 64)

use serde::{Deserialize, Serialize};
use std::env::VarError;
use std::str::FromStr;

use crate::canonical::canonical_hash_hex;
use crate::reduction::ReductionError;

/// Default limit on bin merge rounds before falling back.
pub const DEFAULT_MAX_ROUNDS: usize = 64;

/// Debug switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugFlags {
    /// Emit progress events at `info` level.
    pub trace: bool,
    /// Hand before/after graphs to the renderer.
    pub visualize: bool,
}

impl DebugFlags {
    /// Decode the legacy integer debug level.
    pub fn from_level(level: u32) -> Self {
        Self {
            trace: level & 0b01 != 0,
            visualize: level & 0b10 != 0,
        }
    }

    /// Encode back into the legacy integer form.
    pub fn level(&self) -> u32 {
        (self.trace as u32) | ((self.visualize as u32) << 1)
    }
}

/// Configuration passed to every reduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReductionConfig {
    /// Number of merge workers a parallel reduction may run at once.
    pub pool_size: usize,
    /// Debug switches.
    pub debug: DebugFlags,
    /// Merge rounds allowed before the naive fallback takes over.
    pub max_rounds: usize,
}

impl ReductionConfig {
    /// Create a config with the given pool size and default everything else.
    pub fn with_pool_size(pool_size: usize) -> Self {
        Self {
            pool_size,
            ..Self::default()
        }
    }

    /// Builder-style debug flag setter.
    pub fn with_debug(mut self, debug: DebugFlags) -> Self {
        self.debug = debug;
        self
    }

    /// Read overrides from the environment on top of the defaults.
    pub fn from_env() -> Result<Self, ReductionError> {
        let mut config = Self::default();
        if let Some(v) = read_env::<usize>("COLOR_POOL_SIZE")? {
            config.pool_size = v;
        }
        if let Some(level) = read_env::<u32>("COLOR_DEBUG")? {
            config.debug = DebugFlags::from_level(level);
        }
        if let Some(v) = read_env::<usize>("COLOR_MAX_ROUNDS")? {
            config.max_rounds = v;
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no reduction can run with.
    pub fn validate(&self) -> Result<(), ReductionError> {
        if self.pool_size == 0 {
            return Err(ReductionError::InvalidConfig("pool_size must be at least 1".into()));
        }
        if self.max_rounds == 0 {
            return Err(ReductionError::InvalidConfig("max_rounds must be at least 1".into()));
        }
        Ok(())
    }

    /// Hash of the parameters, logged with each run.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(self)
    }
}

impl Default for ReductionConfig {
    fn default() -> Self {
        Self {
            pool_size: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            debug: DebugFlags::default(),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

fn read_env<T: FromStr>(key: &str) -> Result<Option<T>, ReductionError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ReductionError::InvalidConfig(format!("{key} is not a number: {raw}"))),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(raw)) => Err(ReductionError::InvalidConfig(format!(
            "{key} is not valid unicode: {raw:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_level_round_trip() {
        assert_eq!(DebugFlags::from_level(0), DebugFlags::default());
        let all = DebugFlags::from_level(3);
        assert!(all.trace && all.visualize);
        assert_eq!(all.level(), 3);
        assert!(!DebugFlags::from_level(2).trace);
    }

    #[test]
    fn test_default_is_valid() {
        let config = ReductionConfig::default();
        assert!(config.pool_size >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_pool_rejected() {
        let config = ReductionConfig::with_pool_size(0);
        assert!(matches!(config.validate(), Err(ReductionError::InvalidConfig(_))));
    }

    // The only test touching COLOR_* variables, so it cannot race the others.
    #[test]
    fn test_from_env() {
        const KEYS: [&str; 3] = ["COLOR_POOL_SIZE", "COLOR_DEBUG", "COLOR_MAX_ROUNDS"];
        let clear = || KEYS.iter().for_each(|k| std::env::remove_var(k));
        let invalid = |result: Result<ReductionConfig, ReductionError>| {
            matches!(result, Err(ReductionError::InvalidConfig(_)))
        };

        clear();
        assert_eq!(ReductionConfig::from_env().unwrap(), ReductionConfig::default());

        std::env::set_var("COLOR_POOL_SIZE", " 3 ");
        std::env::set_var("COLOR_DEBUG", "2");
        std::env::set_var("COLOR_MAX_ROUNDS", "5");
        let config = ReductionConfig::from_env().unwrap();
        assert_eq!(config.pool_size, 3);
        assert_eq!(config.debug, DebugFlags { trace: false, visualize: true });
        assert_eq!(config.max_rounds, 5);

        // Levels wider than u32 are rejected, not truncated.
        std::env::set_var("COLOR_DEBUG", "4294967297");
        assert!(invalid(ReductionConfig::from_env()));
        std::env::set_var("COLOR_DEBUG", "1");

        std::env::set_var("COLOR_MAX_ROUNDS", "many");
        assert!(invalid(ReductionConfig::from_env()));
        std::env::set_var("COLOR_MAX_ROUNDS", "5");

        std::env::set_var("COLOR_POOL_SIZE", "0");
        assert!(invalid(ReductionConfig::from_env()));

        #[cfg(unix)]
        {
            use std::ffi::OsStr;
            use std::os::unix::ffi::OsStrExt;
            std::env::set_var("COLOR_POOL_SIZE", OsStr::from_bytes(&[0x66, 0xff]));
            assert!(invalid(ReductionConfig::from_env()));
        }

        clear();
    }

    #[test]
    fn test_params_hash_changes() {
        let a = ReductionConfig::with_pool_size(2);
        let b = ReductionConfig::with_pool_size(4);
        assert_eq!(a.params_hash(), a.clone().params_hash());
        assert_ne!(a.params_hash(), b.params_hash());
    }
}
