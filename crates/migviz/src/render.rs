//! Rendering backends.
//!
//! A backend turns DOT source into an artifact file. The output format is an
//! opaque token handed to the backend unchanged; migviz only checks that it
//! is safe to use as a file extension and a command-line argument.

use crate::error::RenderError;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;
use tracing::debug;

/// Output format used when none is configured.
pub const DEFAULT_OUTPUT_FORMAT: &str = "gv";

/// A validated output format token such as `gv`, `svg` or `xdot1.4`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OutputFormat(String);

impl OutputFormat {
    /// Validate a format token.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::InvalidFormat` unless `token` is non-empty and
    /// made only of ASCII letters, digits, `.`, `_`, `:` and `-`.
    pub fn new(token: impl Into<String>) -> Result<Self, RenderError> {
        let token = token.into();
        let valid = !token.is_empty()
            && token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '-'));
        if valid {
            Ok(Self(token))
        } else {
            Err(RenderError::InvalidFormat(token))
        }
    }

    /// The token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self(DEFAULT_OUTPUT_FORMAT.to_string())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OutputFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = RenderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OutputFormat> for String {
    fn from(format: OutputFormat) -> Self {
        format.0
    }
}

/// `<stem>.<format>`, appending rather than replacing any existing
/// extension.
pub fn artifact_path(stem: &Path, format: &OutputFormat) -> PathBuf {
    let mut path = OsString::from(stem.as_os_str());
    path.push(".");
    path.push(format.as_str());
    PathBuf::from(path)
}

/// Turns DOT source into an artifact.
pub trait RenderBackend: Send + Sync {
    /// Short name for logs and messages.
    fn name(&self) -> &'static str;

    /// Render `source` to `<stem>.<format>` and return that path.
    ///
    /// # Errors
    ///
    /// Returns a `RenderError` if the artifact could not be produced. A
    /// failed render may leave a partial file at the returned path.
    fn render(
        &self,
        source: &str,
        format: &OutputFormat,
        stem: &Path,
    ) -> Result<PathBuf, RenderError>;
}

/// Which backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Run the Graphviz `dot` executable.
    #[default]
    Graphviz,
    /// Write the DOT source itself.
    Source,
}

impl RendererKind {
    /// Instantiate the backend.
    pub fn backend(self) -> Box<dyn RenderBackend> {
        match self {
            Self::Graphviz => Box::new(GraphvizBackend::default()),
            Self::Source => Box::new(SourceBackend),
        }
    }
}

/// Renders through the Graphviz `dot` executable.
#[derive(Debug, Clone)]
pub struct GraphvizBackend {
    command: String,
}

impl Default for GraphvizBackend {
    fn default() -> Self {
        Self {
            command: "dot".to_string(),
        }
    }
}

impl GraphvizBackend {
    /// Use a specific executable instead of `dot` from `PATH`.
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn install_hint(&self) -> &'static str {
        "Install Graphviz (https://graphviz.org/download/) and ensure 'dot' is in your PATH, \
         or set 'renderer: source' in .migviz/config.yaml."
    }
}

impl RenderBackend for GraphvizBackend {
    fn name(&self) -> &'static str {
        "graphviz"
    }

    fn render(
        &self,
        source: &str,
        format: &OutputFormat,
        stem: &Path,
    ) -> Result<PathBuf, RenderError> {
        let output_path = artifact_path(stem, format);
        debug!(
            command = %self.command,
            %format,
            output = %output_path.display(),
            "Running renderer"
        );

        let mut child = Command::new(&self.command)
            .arg(format!("-T{format}"))
            .arg("-o")
            .arg(&output_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RenderError::NotFound {
                        command: self.command.clone(),
                        install_hint: self.install_hint().to_string(),
                    }
                } else {
                    RenderError::SpawnFailed {
                        command: self.command.clone(),
                        source: e,
                    }
                }
            })?;

        // Dropping stdin closes the pipe so `dot` sees end of input. A broken
        // pipe means `dot` exited early; its status and stderr say why.
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(source.as_bytes()) {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(RenderError::Failed {
                command: self.command.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output_path)
    }
}

/// Writes the DOT source itself as the artifact.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceBackend;

impl RenderBackend for SourceBackend {
    fn name(&self) -> &'static str {
        "source"
    }

    fn render(
        &self,
        source: &str,
        format: &OutputFormat,
        stem: &Path,
    ) -> Result<PathBuf, RenderError> {
        let output_path = artifact_path(stem, format);
        std::fs::write(&output_path, source)?;
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("gv")]
    #[case("svg")]
    #[case("xdot1.4")]
    #[case("plain-ext")]
    #[case("png:cairo")]
    fn accepts_format_tokens(#[case] token: &str) {
        assert_eq!(OutputFormat::new(token).unwrap().as_str(), token);
    }

    #[rstest]
    #[case("")]
    #[case("svg png")]
    #[case("../evil")]
    #[case("pdf;rm")]
    fn rejects_unsafe_tokens(#[case] token: &str) {
        assert!(matches!(
            OutputFormat::new(token),
            Err(RenderError::InvalidFormat(_))
        ));
    }

    #[test]
    fn format_deserializes_with_validation() {
        let ok: OutputFormat = serde_yaml::from_str("svg").unwrap();
        assert_eq!(ok.as_str(), "svg");
        assert!(serde_yaml::from_str::<OutputFormat>("'a b'").is_err());
    }

    #[test]
    fn artifact_path_appends_extension() {
        let format = OutputFormat::new("gv").unwrap();
        assert_eq!(
            artifact_path(Path::new("out/snapshot.2024"), &format),
            PathBuf::from("out/snapshot.2024.gv")
        );
    }

    #[test]
    fn source_backend_writes_source() {
        let dir = TempDir::new().unwrap();
        let format = OutputFormat::default();

        let path = SourceBackend
            .render("digraph {\n}\n", &format, &dir.path().join("graph"))
            .unwrap();

        assert_eq!(path, dir.path().join("graph.gv"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "digraph {\n}\n");
    }

    #[test]
    fn missing_executable_reports_install_hint() {
        let dir = TempDir::new().unwrap();
        let backend = GraphvizBackend::with_command("migviz-no-such-renderer");

        let err = backend
            .render("digraph {}", &OutputFormat::default(), &dir.path().join("graph"))
            .unwrap_err();

        match err {
            RenderError::NotFound {
                command,
                install_hint,
            } => {
                assert_eq!(command, "migviz-no-such-renderer");
                assert!(install_hint.contains("Graphviz"));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
