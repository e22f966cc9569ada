// Logging setup for the watcher and the CLI

use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the verbosity flags.
pub const LOG_ENV_VAR: &str = "LCU_AUTOPILOT_LOG";

/// How log lines are rendered on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
  #[default]
  Human,
  Json,
}

/// 0 → warn, 1 → info, 2 → debug, 3+ → trace
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
  match verbosity {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  }
}

/// Installs the global subscriber. `LCU_AUTOPILOT_LOG` wins over `verbosity`
/// when set. Safe to call more than once; later calls are ignored.
pub fn init_logging(format: LogFormat, verbosity: u8) {
  let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
    .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));
  let show_target = verbosity >= 2;

  let result = match format {
    LogFormat::Human => tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_target(show_target)
      .with_writer(std::io::stderr)
      .try_init(),
    LogFormat::Json => tracing_subscriber::fmt()
      .with_env_filter(filter)
      .json()
      .with_target(show_target)
      .with_writer(std::io::stderr)
      .try_init(),
  };

  if result.is_ok() {
    tracing::debug!("[LCU Watcher] Logging initialized ({:?})", format);
  }
}
