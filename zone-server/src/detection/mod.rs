//! Apartment outline detection
//!
//! Runs an external program over an uploaded floor plan and reads back
//! apartment polygons in percent of the image size.
//!
//! Invocation: `{program} {args…} --source <file> [--target <file>]`.
//! Stdout must hold exactly one JSON document:
//!
//! ```json
//! {"apartments": [{"id": 1, "polygon": [[12.5, 40.0], ...]}],
//!  "source_dimensions": {"width": 2480, "height": 3508}}
//! ```
//!
//! Input files are staged in scoped temp files and removed on every exit
//! path; the child is killed if the timeout elapses.

use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use shared::models::Point;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::process::Command;

use crate::core::Config;

/// Longest diagnostic text carried into an error response
const MAX_DIAGNOSTICS_LEN: usize = 4000;

const TARGET_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("failed to stage detection input: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to start detection program '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("detection timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("detection exited with {status}")]
    Exit { status: String, diagnostics: String },

    #[error("detection reported an error: {message}")]
    Reported { message: String },

    #[error("invalid detection output: {reason}")]
    InvalidOutput { reason: String, diagnostics: String },

    #[error("unsupported target image format '{0}'")]
    UnsupportedTarget(String),
}

impl DetectionError {
    /// Raw text from the process, if any
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            DetectionError::Exit { diagnostics, .. }
            | DetectionError::InvalidOutput { diagnostics, .. } => Some(diagnostics),
            DetectionError::Reported { message } => Some(message),
            _ => None,
        }
    }
}

impl From<DetectionError> for AppError {
    fn from(err: DetectionError) -> Self {
        let code = match &err {
            DetectionError::Timeout(_) => ErrorCode::DetectionTimeout,
            DetectionError::UnsupportedTarget(_) => ErrorCode::UnsupportedImageFormat,
            _ => ErrorCode::DetectionFailed,
        };
        let mut app = AppError::with_message(code, err.to_string());
        if let Some(diagnostics) = err.diagnostics() {
            app = app.with_detail("diagnostics", diagnostics);
        }
        app
    }
}

/// Files handed to the detection program
#[derive(Debug, Clone, Default)]
pub struct DetectionInput {
    pub source_pdf: Vec<u8>,
    pub target_image: Option<Vec<u8>>,
    /// Extension of the target image, e.g. `png`
    pub target_extension: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

/// One detected apartment outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedShape {
    /// Opaque id assigned by the program
    pub id: Value,
    pub polygon: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionOutput {
    pub apartments: Vec<DetectedShape>,
    #[serde(default)]
    pub source_dimensions: Option<Dimensions>,
    #[serde(default)]
    pub target_dimensions: Option<Dimensions>,
}

/// Percent coordinates to pixels: `x / 100 * width`, `y / 100 * height`
pub fn rescale(shapes: &[DetectedShape], width: f64, height: f64) -> Vec<DetectedShape> {
    shapes
        .iter()
        .map(|shape| DetectedShape {
            id: shape.id.clone(),
            polygon: shape
                .polygon
                .iter()
                .map(|[x, y]| [x / 100.0 * width, y / 100.0 * height])
                .collect(),
        })
        .collect()
}

fn truncate(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(MAX_DIAGNOSTICS_LEN) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

/// stderr if the program wrote any, stdout otherwise
fn diagnostics(stdout: &str, stderr: &str) -> String {
    if stderr.trim().is_empty() {
        truncate(stdout)
    } else {
        truncate(stderr)
    }
}

/// Strict parse: the whole of stdout must be one JSON document
pub fn parse_output(stdout: &str) -> Result<DetectionOutput, DetectionError> {
    let invalid = |reason: String| DetectionError::InvalidOutput {
        reason,
        diagnostics: truncate(stdout),
    };

    let document: Value =
        serde_json::from_str(stdout.trim()).map_err(|e| invalid(format!("not a JSON document: {e}")))?;
    if let Some(message) = document.get("error").and_then(Value::as_str) {
        return Err(DetectionError::Reported {
            message: truncate(message),
        });
    }
    let output: DetectionOutput =
        serde_json::from_value(document).map_err(|e| invalid(e.to_string()))?;

    for (index, shape) in output.apartments.iter().enumerate() {
        if shape.polygon.len() < 3 {
            return Err(invalid(format!(
                "apartment {index} has {} points, at least 3 required",
                shape.polygon.len()
            )));
        }
        let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        if let Some(point) = shape.polygon.iter().find(|[x, y]| !in_range(*x) || !in_range(*y)) {
            return Err(invalid(format!(
                "apartment {index} has point [{}, {}] outside 0-100",
                point[0], point[1]
            )));
        }
    }
    Ok(output)
}

#[derive(Debug, Clone)]
pub struct DetectionGateway {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    temp_dir: Option<PathBuf>,
}

impl DetectionGateway {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        timeout: Duration,
        temp_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
            temp_dir,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.detection_program.clone(),
            config.detection_args.clone(),
            config.detection_timeout(),
            config.detection_temp_dir.clone(),
        )
    }

    fn stage(&self, bytes: &[u8], suffix: &str) -> Result<NamedTempFile, DetectionError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("zone-detect-").suffix(suffix);
        let mut file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;
        Ok(file)
    }

    pub async fn detect(&self, input: DetectionInput) -> Result<DetectionOutput, DetectionError> {
        // Dropped (and deleted) when this function returns
        let source = self.stage(&input.source_pdf, ".pdf")?;
        let target = match &input.target_image {
            Some(bytes) => {
                let ext = input
                    .target_extension
                    .as_deref()
                    .map(str::to_lowercase)
                    .unwrap_or_else(|| "png".to_string());
                if !TARGET_FORMATS.contains(&ext.as_str()) {
                    return Err(DetectionError::UnsupportedTarget(ext));
                }
                Some(self.stage(bytes, &format!(".{ext}"))?)
            }
            None => None,
        };

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg("--source").arg(source.path());
        if let Some(target) = &target {
            cmd.arg("--target").arg(target.path());
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        let child = cmd.spawn().map_err(|source| DetectionError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    program = %self.program,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Detection timed out, process killed"
                );
                return Err(DetectionError::Timeout(self.timeout));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if !output.status.success() {
            let diagnostics = diagnostics(&stdout, &stderr);
            tracing::error!(
                program = %self.program,
                status = %output.status,
                elapsed_ms,
                diagnostics = %diagnostics,
                "Detection failed"
            );
            return Err(DetectionError::Exit {
                status: output.status.to_string(),
                diagnostics,
            });
        }

        let parsed = parse_output(&stdout).inspect_err(|e| {
            tracing::error!(program = %self.program, elapsed_ms, error = %e, "Detection output rejected");
        })?;
        tracing::info!(
            program = %self.program,
            elapsed_ms,
            apartments = parsed.apartments.len(),
            "Detection finished"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(points: &[[f64; 2]]) -> DetectedShape {
        DetectedShape {
            id: Value::from(1),
            polygon: points.to_vec(),
        }
    }

    #[test]
    fn test_rescale_to_pixels() {
        let shapes = vec![
            shape(&[[10.0, 10.0], [20.0, 10.0], [20.0, 20.0]]),
            shape(&[[50.0, 50.0], [60.0, 50.0], [60.0, 60.0]]),
        ];
        let px = rescale(&shapes, 1000.0, 1000.0);
        assert_eq!(px[0].polygon, vec![[100.0, 100.0], [200.0, 100.0], [200.0, 200.0]]);
        assert_eq!(px[1].polygon, vec![[500.0, 500.0], [600.0, 500.0], [600.0, 600.0]]);
    }

    #[test]
    fn test_parse_output_strict() {
        let ok = parse_output(
            r#"
            {"success": true, "apartment_count": 1,
             "source_dimensions": {"width": 800, "height": 600},
             "apartments": [{"id": 1, "polygon": [[10, 10], [20, 10], [20, 20]]}]}
            "#,
        )
        .unwrap();
        assert_eq!(ok.apartments.len(), 1);
        assert_eq!(
            ok.source_dimensions,
            Some(Dimensions {
                width: 800.0,
                height: 600.0
            })
        );

        // Leading log line is not skipped over
        assert!(matches!(
            parse_output("loading model...\n{\"apartments\": []}"),
            Err(DetectionError::InvalidOutput { .. })
        ));
        assert!(matches!(
            parse_output(r#"{"apartments": [{"id": 1, "polygon": [[0, 0], [120, 0], [0, 10]]}]}"#),
            Err(DetectionError::InvalidOutput { .. })
        ));
        assert!(matches!(
            parse_output(r#"{"apartments": [{"id": 1, "polygon": [[0, 0], [10, 0]]}]}"#),
            Err(DetectionError::InvalidOutput { .. })
        ));
        assert!(matches!(
            parse_output(r#"{"error": "Source file not found"}"#),
            Err(DetectionError::Reported { .. })
        ));
    }

    #[test]
    fn test_error_codes() {
        let app: AppError = DetectionError::Timeout(Duration::from_secs(1)).into();
        assert_eq!(app.code, ErrorCode::DetectionTimeout);

        let app: AppError = DetectionError::Exit {
            status: "exit status: 2".into(),
            diagnostics: "Traceback".into(),
        }
        .into();
        assert_eq!(app.code, ErrorCode::DetectionFailed);
        assert_eq!(app.details.unwrap().get("diagnostics").unwrap(), "Traceback");
    }

    #[cfg(unix)]
    mod process {
        use super::*;

        /// Gateway running `sh -c <script> detect --source <file> ...`
        fn gateway(script: &str, timeout: Duration, temp_dir: &std::path::Path) -> DetectionGateway {
            DetectionGateway::new(
                "sh",
                vec!["-c".into(), script.into(), "detect".into()],
                timeout,
                Some(temp_dir.to_path_buf()),
            )
        }

        fn input() -> DetectionInput {
            DetectionInput {
                source_pdf: b"%PDF-1.4 fake".to_vec(),
                ..Default::default()
            }
        }

        fn staged_files(dir: &std::path::Path) -> usize {
            std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
        }

        #[tokio::test]
        async fn test_success_sees_source_file() {
            let dir = tempfile::tempdir().unwrap();
            let script = r#"[ "$1" = "--source" ] && [ -s "$2" ] || exit 9
printf '{"apartments": [{"id": 1, "polygon": [[10,10],[20,10],[20,20],[10,20]]}]}'"#;
            let output = gateway(script, Duration::from_secs(10), dir.path())
                .detect(input())
                .await
                .unwrap();
            assert_eq!(output.apartments.len(), 1);
            assert_eq!(staged_files(dir.path()), 0);
        }

        #[tokio::test]
        async fn test_target_argument_passed() {
            let dir = tempfile::tempdir().unwrap();
            let script = r#"[ "$3" = "--target" ] && [ -s "$4" ] || exit 9
case "$4" in *.webp) ;; *) exit 8 ;; esac
printf '{"apartments": []}'"#;
            let output = gateway(script, Duration::from_secs(10), dir.path())
                .detect(DetectionInput {
                    source_pdf: b"%PDF".to_vec(),
                    target_image: Some(b"RIFF fake webp".to_vec()),
                    target_extension: Some("WEBP".into()),
                })
                .await
                .unwrap();
            assert!(output.apartments.is_empty());
        }

        #[tokio::test]
        async fn test_timeout_kills_and_cleans_up() {
            let dir = tempfile::tempdir().unwrap();
            let err = gateway("sleep 5", Duration::from_millis(200), dir.path())
                .detect(input())
                .await
                .unwrap_err();
            assert!(matches!(err, DetectionError::Timeout(_)));
            assert_eq!(staged_files(dir.path()), 0);
        }

        #[tokio::test]
        async fn test_non_zero_exit_carries_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let err = gateway("echo 'cv2 not installed' >&2; exit 3", Duration::from_secs(10), dir.path())
                .detect(input())
                .await
                .unwrap_err();
            assert!(matches!(err, DetectionError::Exit { .. }));
            assert_eq!(err.diagnostics(), Some("cv2 not installed"));
            assert_eq!(staged_files(dir.path()), 0);
        }

        #[tokio::test]
        async fn test_garbage_output_rejected() {
            let dir = tempfile::tempdir().unwrap();
            let err = gateway(
                r#"echo 'progress 50%'; printf '{"apartments": []}'"#,
                Duration::from_secs(10),
                dir.path(),
            )
            .detect(input())
            .await
            .unwrap_err();
            assert!(matches!(err, DetectionError::InvalidOutput { .. }));
            assert!(err.diagnostics().unwrap().contains("progress 50%"));
            assert_eq!(staged_files(dir.path()), 0);
        }

        #[tokio::test]
        async fn test_missing_program() {
            let dir = tempfile::tempdir().unwrap();
            let gateway = DetectionGateway::new(
                "/nonexistent/detect-apartments",
                Vec::new(),
                Duration::from_secs(1),
                Some(dir.path().to_path_buf()),
            );
            let err = gateway.detect(input()).await.unwrap_err();
            assert!(matches!(err, DetectionError::Spawn { .. }));
        }
    }
}
