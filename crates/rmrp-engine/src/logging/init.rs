use std::sync::Once;

use log::LevelFilter;

/// Environment variable read before `RUST_LOG`.
pub const LOG_ENV: &str = "RMRP_LOG";

/// Targets whose level follows [`LoggingConfig::verbosity`]. Everything else
/// stays at `warn` unless an explicit filter says otherwise.
const OWN_TARGETS: &[&str] = &["rmrp", "rmrp_cli", "rmrp_compiler", "rmrp_engine"];

/// Logger configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Explicit `env_logger` filter, e.g. `"rmrp_compiler=trace"`. Wins
    /// over both environment variables and `verbosity`.
    pub filter: Option<String>,
    /// 0 = info, 1 = debug, 2 and above = trace, for the rmrp crates only.
    pub verbosity: u8,
    pub write_style: env_logger::WriteStyle,
    /// Prefix records with a timestamp. Off for test runs.
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            verbosity: 0,
            write_style: env_logger::WriteStyle::Auto,
            timestamps: true,
        }
    }
}

impl LoggingConfig {
    /// Config with an explicit filter.
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self { filter: Some(filter.into()), ..Self::default() }
    }

    /// Config for `-v` style flags.
    pub fn with_verbosity(verbosity: u8) -> Self {
        Self { verbosity, ..Self::default() }
    }

    /// Filter string the logger will be built from.
    ///
    /// Precedence: explicit filter, `RMRP_LOG`, `RUST_LOG`, then the
    /// verbosity default. `env` looks up an environment variable.
    pub fn resolve_filter(&self, env: impl Fn(&str) -> Option<String>) -> String {
        self.filter
            .clone()
            .or_else(|| env(LOG_ENV))
            .or_else(|| env("RUST_LOG"))
            .unwrap_or_else(|| verbosity_filter(self.verbosity))
    }
}

/// `warn` globally, `verbosity` mapped onto the rmrp crates.
pub fn verbosity_filter(verbosity: u8) -> String {
    let level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let mut filter = LevelFilter::Warn.to_string().to_lowercase();
    for target in OWN_TARGETS {
        filter.push_str(&format!(",{target}={}", level.to_string().to_lowercase()));
    }
    filter
}

static INIT: Once = Once::new();

/// Installs `env_logger` as the global logger, once.
///
/// Later calls are no-ops, so every test may call it. A logger installed by
/// the embedding application is left in place.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.resolve_filter(|key| std::env::var(key).ok());

        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&filter);
        builder.write_style(config.write_style);
        if !config.timestamps {
            builder.format_timestamp(None);
        }
        builder.is_test(cfg!(test));

        match builder.try_init() {
            Ok(()) => log::debug!("logging initialized with filter {filter:?}"),
            Err(_) => log::debug!("global logger already set; keeping it"),
        }
    });
}
