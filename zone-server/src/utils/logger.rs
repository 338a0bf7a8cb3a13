//! Logging Infrastructure
//!
//! - Console output, pretty in development and JSON in production
//! - Daily rotating application logs (deleted after 14 days)
//! - Permanent audit logs of operator edits (never deleted)

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, TimeZone};
use tracing::Subscriber;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Application logs older than this are removed by the cleanup task
pub const APP_LOG_RETENTION_DAYS: i64 = 14;

/// Date of a rolled file named `{prefix}.YYYY-MM-DD.log`
fn rolled_file_date(name: &str, prefix: &str) -> Option<NaiveDate> {
    let date = name
        .strip_prefix(prefix)?
        .strip_prefix('.')?
        .strip_suffix(".log")?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Clean up application log files older than the retention window
///
/// Audit logs are never touched.
pub fn cleanup_old_logs(log_dir: &Path) -> anyhow::Result<usize> {
    let cutoff = Local::now() - chrono::Duration::days(APP_LOG_RETENTION_DAYS);
    let app_log_dir = log_dir.join("app");
    if !app_log_dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(app_log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(day) = rolled_file_date(name, "app") else {
            continue;
        };
        let Some(midnight) = day
            .and_hms_opt(0, 0, 0)
            .and_then(|dt| Local.from_local_datetime(&dt).single())
        else {
            continue;
        };
        if midnight < cutoff {
            fs::remove_file(&path)?;
            removed += 1;
            tracing::info!(file = %name, "Deleted old log file");
        }
    }
    Ok(removed)
}

/// Periodic cleanup task - runs every hour
async fn periodic_cleanup(log_dir: PathBuf) {
    use tokio::time::{Duration, sleep};

    loop {
        sleep(Duration::from_secs(3600)).await;

        if let Err(e) = cleanup_old_logs(&log_dir) {
            tracing::error!(error = %e, "Failed to cleanup old logs");
        }
    }
}

fn rolling(dir: &Path, prefix: &str) -> anyhow::Result<RollingFileAppender> {
    fs::create_dir_all(dir)?;
    Ok(RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(dir)?)
}

/// Formatting layer writing to `writer`, JSON or plain text
fn file_layer<S, W>(writer: W, json: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(writer);
    if json {
        layer.json().with_current_span(true).boxed()
    } else {
        layer.boxed()
    }
}

/// Initialize the logging system
///
/// `RUST_LOG` wins over `level`. With `log_dir`, application and audit
/// records also go to `{log_dir}/app` and `{log_dir}/audit`, and an hourly
/// task prunes old application logs. Must be called inside the tokio runtime
/// when `log_dir` is set.
///
/// ```no_run
/// # use std::path::Path;
/// # use zone_server::init_logger;
/// # fn main() -> anyhow::Result<()> {
/// // Development setup (console only)
/// init_logger("debug", false, None)?;
///
/// // Production setup (console + file)
/// init_logger("info", true, Some(Path::new("./data/logs")))?;
/// # Ok(())
/// # }
/// ```
pub fn init_logger(level: &str, json_format: bool, log_dir: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let mut layers = vec![console_layer];

    if let Some(log_dir) = log_dir {
        let app_log = rolling(&log_dir.join("app"), "app")?;
        let audit_log = rolling(&log_dir.join("audit"), "audit")?;

        layers.push(
            file_layer(std::sync::Mutex::new(app_log), json_format)
                .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
                    meta.target() != "audit"
                }))
                .boxed(),
        );
        layers.push(
            file_layer(std::sync::Mutex::new(audit_log), json_format)
                .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
                    meta.target() == "audit"
                }))
                .boxed(),
        );

        tokio::spawn(periodic_cleanup(log_dir.to_path_buf()));
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()?;
    Ok(())
}

/// Audit log helper - records operator edits of zones and images
///
/// Audit records use the `audit` target and land in the permanent
/// `audit.YYYY-MM-DD.log` files.
///
/// ```no_run
/// # use zone_server::audit_log;
/// audit_log!("zone.create", "zone:42");
/// audit_log!("zone.delete", "zone:42", "project=7 type=floor_strip");
/// ```
#[macro_export]
macro_rules! audit_log {
    ($action:expr, $resource:expr) => {
        ::tracing::info!(
            target: "audit",
            action = %$action,
            resource = %$resource,
            timestamp = %::chrono::Local::now().to_rfc3339(),
            "AUDIT"
        );
    };
    ($action:expr, $resource:expr, $details:expr) => {
        ::tracing::info!(
            target: "audit",
            action = %$action,
            resource = %$resource,
            details = %$details,
            timestamp = %::chrono::Local::now().to_rfc3339(),
            "AUDIT"
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolled_file_date() {
        assert_eq!(
            rolled_file_date("app.2026-03-01.log", "app"),
            NaiveDate::from_ymd_opt(2026, 3, 1)
        );
        assert_eq!(rolled_file_date("audit.2026-03-01.log", "app"), None);
        assert_eq!(rolled_file_date("app.latest.log", "app"), None);
    }

    #[test]
    fn test_cleanup_keeps_recent_and_audit_logs() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        let audit = dir.path().join("audit");
        fs::create_dir_all(&app).unwrap();
        fs::create_dir_all(&audit).unwrap();

        let today = Local::now().format("%Y-%m-%d").to_string();
        fs::write(app.join("app.2001-01-01.log"), "old").unwrap();
        fs::write(app.join(format!("app.{today}.log")), "new").unwrap();
        fs::write(audit.join("audit.2001-01-01.log"), "kept").unwrap();

        assert_eq!(cleanup_old_logs(dir.path()).unwrap(), 1);
        assert!(!app.join("app.2001-01-01.log").exists());
        assert!(app.join(format!("app.{today}.log")).exists());
        assert!(audit.join("audit.2001-01-01.log").exists());
    }
}
