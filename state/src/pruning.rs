//! Pruning policy for historical state versions

use std::fmt;
use std::str::FromStr;
use wolochain_core::{WolochainError, WolochainResult};

pub const PRUNING_DEFAULT: &str = "default";
pub const PRUNING_NOTHING: &str = "nothing";
pub const PRUNING_EVERYTHING: &str = "everything";
pub const PRUNING_CUSTOM: &str = "custom";

const DEFAULT_KEEP_RECENT: u64 = 362_880;
const EVERYTHING_KEEP_RECENT: u64 = 2;
const DEFAULT_INTERVAL: u64 = 10;

/// Named pruning strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruningStrategy {
    Default,
    Nothing,
    Everything,
    Custom,
}

impl FromStr for PruningStrategy {
    type Err = WolochainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | PRUNING_DEFAULT => Ok(Self::Default),
            PRUNING_NOTHING => Ok(Self::Nothing),
            PRUNING_EVERYTHING => Ok(Self::Everything),
            PRUNING_CUSTOM => Ok(Self::Custom),
            other => Err(WolochainError::InvalidPruning(format!(
                "unknown pruning strategy {other}"
            ))),
        }
    }
}

impl fmt::Display for PruningStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Default => PRUNING_DEFAULT,
            Self::Nothing => PRUNING_NOTHING,
            Self::Everything => PRUNING_EVERYTHING,
            Self::Custom => PRUNING_CUSTOM,
        };
        f.write_str(name)
    }
}

/// Resolved pruning policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruningOptions {
    pub strategy: PruningStrategy,
    /// Versions kept below the latest one
    pub keep_recent: u64,
    /// Prune every this many heights; 0 never prunes
    pub interval: u64,
}

impl PruningOptions {
    pub fn new(strategy: PruningStrategy) -> Self {
        match strategy {
            PruningStrategy::Default | PruningStrategy::Custom => Self {
                strategy,
                keep_recent: DEFAULT_KEEP_RECENT,
                interval: DEFAULT_INTERVAL,
            },
            PruningStrategy::Nothing => Self {
                strategy,
                keep_recent: 0,
                interval: 0,
            },
            PruningStrategy::Everything => Self {
                strategy,
                keep_recent: EVERYTHING_KEEP_RECENT,
                interval: DEFAULT_INTERVAL,
            },
        }
    }

    pub fn nothing() -> Self {
        Self::new(PruningStrategy::Nothing)
    }

    pub fn custom(keep_recent: u64, interval: u64) -> Self {
        Self {
            strategy: PruningStrategy::Custom,
            keep_recent,
            interval,
        }
    }

    /// Resolve a strategy name plus the custom keep-recent / interval pair.
    /// The pair is only consulted for `custom`.
    pub fn resolve(strategy: &str, keep_recent: u64, interval: u64) -> WolochainResult<Self> {
        let options = match strategy.parse::<PruningStrategy>()? {
            PruningStrategy::Custom => Self::custom(keep_recent, interval),
            other => Self::new(other),
        };
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> WolochainResult<()> {
        if self.strategy != PruningStrategy::Custom {
            return Ok(());
        }
        if self.interval == 0 {
            return Err(WolochainError::InvalidPruning(
                "pruning interval must not be 0 for the custom strategy".into(),
            ));
        }
        if self.interval < DEFAULT_INTERVAL {
            return Err(WolochainError::InvalidPruning(format!(
                "pruning interval must be at least {DEFAULT_INTERVAL}, got {}",
                self.interval
            )));
        }
        if self.keep_recent < EVERYTHING_KEEP_RECENT {
            return Err(WolochainError::InvalidPruning(format!(
                "pruning keep-recent must be at least {EVERYTHING_KEEP_RECENT}, got {}",
                self.keep_recent
            )));
        }
        Ok(())
    }

    /// Highest version (exclusive) to delete after committing `height`, if
    /// this height triggers pruning.
    pub fn prune_below(&self, height: u64) -> Option<u64> {
        if self.strategy == PruningStrategy::Nothing || self.interval == 0 {
            return None;
        }
        if height % self.interval != 0 || height <= self.keep_recent {
            return None;
        }
        Some(height - self.keep_recent)
    }
}

impl Default for PruningOptions {
    fn default() -> Self {
        Self::new(PruningStrategy::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_strategies() {
        let default = PruningOptions::resolve("default", 0, 0).unwrap();
        assert_eq!((default.keep_recent, default.interval), (362_880, 10));

        let everything = PruningOptions::resolve("everything", 0, 0).unwrap();
        assert_eq!((everything.keep_recent, everything.interval), (2, 10));

        let nothing = PruningOptions::resolve("nothing", 5, 5).unwrap();
        assert_eq!(nothing.prune_below(100), None);

        assert_eq!(PruningOptions::resolve("", 0, 0).unwrap(), default);
    }

    #[test]
    fn test_custom_strategy_validation() {
        let custom = PruningOptions::resolve("custom", 100, 10).unwrap();
        assert_eq!((custom.keep_recent, custom.interval), (100, 10));

        assert!(PruningOptions::resolve("custom", 100, 0).is_err());
        assert!(PruningOptions::resolve("custom", 100, 5).is_err());
        assert!(PruningOptions::resolve("custom", 1, 10).is_err());
        assert!(matches!(
            PruningOptions::resolve("sometimes", 0, 0),
            Err(WolochainError::InvalidPruning(_))
        ));
    }

    #[test]
    fn test_prune_below() {
        let everything = PruningOptions::new(PruningStrategy::Everything);
        assert_eq!(everything.prune_below(9), None);
        assert_eq!(everything.prune_below(10), Some(8));
        assert_eq!(everything.prune_below(20), Some(18));
    }
}
