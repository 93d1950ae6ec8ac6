use once_cell::sync::OnceCell;
use tracing_subscriber::{
    fmt, fmt::time::UtcTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::config::CrmConfig;
use crate::error::{AppError, AppResult};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();
static LOGGER_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

const LOG_FILE_PREFIX: &str = "courtier-crm.log";

/// Installs the global subscriber once. Later calls are no-ops.
pub fn init_logging(config: &CrmConfig) -> AppResult<()> {
    LOGGER_INIT
        .get_or_try_init(|| {
            let env_filter = EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.log_directives))
                .map_err(|err| AppError::config(format!("invalid log directives: {err}")))?;

            let file_writer = match config.log_dir.as_deref() {
                Some(log_dir) => {
                    std::fs::create_dir_all(log_dir)?;
                    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
                    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                    LOGGER_GUARD
                        .set(guard)
                        .map_err(|_| AppError::other("logging already initialized"))?;
                    Some(non_blocking)
                }
                None => None,
            };

            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_writer.map(|writer| {
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true)
                        .with_timer(UtcTime::rfc_3339())
                }))
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_timer(UtcTime::rfc_3339()),
                )
                .try_init()
                .map_err(|err| AppError::other(format!("global subscriber already set: {err}")))?;

            Ok(())
        })
        .map(|_| ())
}
