//! Enabled region listing through the `ibmcloud` CLI.

use std::ffi::OsString;
use std::path::PathBuf;

use serde_json::Value;
use tokio::process::Command;

use crate::error::InspectError;
use crate::extract;

/// Default CLI program name, resolved through `PATH`.
pub const DEFAULT_PROGRAM: &str = "ibmcloud";

/// Arguments asking the CLI for the region list as JSON.
pub const REGIONS_ARGS: &[&str] = &["regions", "--output", "json"];

/// Path to the region names in the CLI output.
pub const REGION_NAMES_PATH: &str = "regions[].name";

/// Environment variable name used by [`format_export`].
pub const EXPORT_VAR: &str = "REGIONS";

/// A CLI invocation that prints the region list on stdout.
#[derive(Debug, Clone)]
pub struct RegionsCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl RegionsCommand {
    /// `<program> regions --output json`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: REGIONS_ARGS.iter().map(OsString::from).collect(),
        }
    }

    /// Replace the arguments passed to the program.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Run the command and return the enabled region names in CLI order.
    ///
    /// # Errors
    ///
    /// Returns `InspectError::Io` if the program cannot be started and
    /// `InspectError::CommandFailed` if it exits unsuccessfully.
    pub async fn list(&self) -> Result<Vec<String>, InspectError> {
        let program = self.program.display().to_string();
        tracing::debug!(%program, "listing regions");

        let output = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(InspectError::CommandFailed {
                program,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_regions(&output.stdout)
    }
}

impl Default for RegionsCommand {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

/// Extract region names from `{"regions": [{"name": ...}, ...]}`.
pub fn parse_regions(stdout: &[u8]) -> Result<Vec<String>, InspectError> {
    let body: Value = serde_json::from_slice(stdout)?;
    Ok(extract::extract_strings(&body, REGION_NAMES_PATH)?)
}

/// Render the region list for display: `['us-south', 'eu-de']`.
pub fn format_region_list(names: &[String]) -> String {
    format!("[{}]", quoted_names(names))
}

/// Render a shell line exporting the region list.
///
/// Names are single-quoted and comma-joined, and the whole list is one
/// double-quoted shell word: `export REGIONS="'us-south', 'eu-de'"`.
pub fn format_export(names: &[String]) -> String {
    format!(
        "export {}=\"{}\"",
        EXPORT_VAR,
        escape_double_quoted(&quoted_names(names))
    )
}

fn quoted_names(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("'{}'", name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape_double_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
