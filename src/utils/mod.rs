//! Utilities for the demo binary: logging with a dynamic level.
//!
//! The library logs through the `log` facade; the binary installs
//! `env_logger`. `RUST_LOG` sets the filter (default `warn`) and `-v` / `-vv`
//! / `-q` override it.
//!
//! Key items:
//!   init_logging / derive_level

/// Logging helpers.
pub mod logging {
    use std::io::Write;

    use env_logger::{Builder, Env};
    use log::{LevelFilter, SetLoggerError};

    pub const DEFAULT_FILTER: &str = "warn";

    /// Install the logger. Fails if one is already installed.
    pub fn init_logging(level: Option<LevelFilter>) -> Result<(), SetLoggerError> {
        builder(Env::default().default_filter_or(DEFAULT_FILTER), level).try_init()
    }

    fn builder(env: Env<'_>, level: Option<LevelFilter>) -> Builder {
        let mut builder = Builder::from_env(env);
        if let Some(level) = level {
            builder.filter_level(level);
        }
        builder.format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));
        builder
    }

    /// `None` when neither flag was given, leaving the filter to `RUST_LOG`.
    pub fn derive_level(verbose: u8, quiet: bool) -> Option<LevelFilter> {
        if quiet {
            return Some(LevelFilter::Error);
        }
        match verbose {
            0 => None,
            1 => Some(LevelFilter::Debug),
            _ => Some(LevelFilter::Trace),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn quiet_env() -> Env<'static> {
            Env::new().filter("CMDROUTE_TEST_LOG_UNSET").default_filter_or(DEFAULT_FILTER)
        }

        #[test]
        fn levels_from_flags() {
            assert_eq!(derive_level(0, false), None);
            assert_eq!(derive_level(1, false), Some(LevelFilter::Debug));
            assert_eq!(derive_level(5, false), Some(LevelFilter::Trace));
            assert_eq!(derive_level(2, true), Some(LevelFilter::Error));
        }

        #[test]
        fn flags_override_default_filter() {
            assert_eq!(builder(quiet_env(), None).build().filter(), LevelFilter::Warn);
            assert_eq!(
                builder(quiet_env(), Some(LevelFilter::Debug)).build().filter(),
                LevelFilter::Debug
            );
            assert_eq!(
                builder(quiet_env(), Some(LevelFilter::Error)).build().filter(),
                LevelFilter::Error
            );
        }
    }
}

pub use logging::{derive_level, init_logging};
