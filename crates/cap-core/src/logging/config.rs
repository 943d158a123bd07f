//! Where capcalc's log level, filter directives and format come from.
//!
//! Precedence, highest first:
//! 1. `-q` / `-v` / `-vv` and `--log-format`
//! 2. `CAPCALC_LOG` (a bare level) and `CAPCALC_LOG_FORMAT`
//! 3. `RUST_LOG`, handed unchanged to the `EnvFilter`
//! 4. `info`, human-readable, with timestamps

use clap::ValueEnum;
use tracing_subscriber::filter::LevelFilter;

/// Log line encoding on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    #[value(alias = "console")]
    Human,
    /// One JSON object per event.
    #[value(alias = "json")]
    Jsonl,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Level applied to every workspace crate.
    pub level: LevelFilter,
    /// Raw `RUST_LOG` directives. Only consulted when no flag or
    /// `CAPCALC_LOG` picked a level.
    pub directives: Option<String>,
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LevelFilter::INFO,
            directives: None,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Level selected by `-q` / `-v` counts; `-q` wins.
    pub fn cli_level(verbose: u8, quiet: bool) -> Option<LevelFilter> {
        match (quiet, verbose) {
            (true, _) => Some(LevelFilter::ERROR),
            (false, 0) => None,
            (false, 1) => Some(LevelFilter::DEBUG),
            (false, _) => Some(LevelFilter::TRACE),
        }
    }

    pub fn from_env(cli_level: Option<LevelFilter>, cli_format: Option<LogFormat>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), cli_level, cli_format)
    }

    /// [`LogConfig::from_env`] with an explicit variable lookup.
    pub fn from_lookup<F>(
        lookup: F,
        cli_level: Option<LevelFilter>,
        cli_format: Option<LogFormat>,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Unparseable values fall through to the next source.
        let env_level = lookup("CAPCALC_LOG")
            .filter(|v| !v.trim().is_empty())
            .and_then(|v| v.trim().parse::<LevelFilter>().ok());
        let level = cli_level.or(env_level);
        let directives = match level {
            Some(_) => None,
            None => lookup("RUST_LOG").filter(|v| !v.trim().is_empty()),
        };
        let env_format = lookup("CAPCALC_LOG_FORMAT")
            .and_then(|v| LogFormat::from_str(v.trim(), true).ok());

        LogConfig {
            format: cli_format.or(env_format).unwrap_or_default(),
            level: level.unwrap_or(LevelFilter::INFO),
            directives,
            timestamps: true,
        }
    }
}
