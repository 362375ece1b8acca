use std::str::FromStr;
use tracing::Level;

pub const LOG_ENV: &str = "TRUSTBITE_LOG";

/// `-v` flags win over `TRUSTBITE_LOG`; the default is warnings only so command output
/// stays readable.
pub fn resolve_level(verbosity: u8, env_level: Option<&str>) -> Level {
    match verbosity {
        0 => env_level
            .and_then(|raw| Level::from_str(raw.trim()).ok())
            .unwrap_or(Level::WARN),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

pub fn init(verbosity: u8) {
    let env_level = std::env::var(LOG_ENV).ok();
    let level = resolve_level(verbosity, env_level.as_deref());
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
