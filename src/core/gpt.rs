//! Invocation of the external processing tools.
//!
//! Every pipeline stage is one blocking run of SNAP's graph processing tool
//! (`gpt <Operator> -t <target> <params...> [source]`); band extraction and
//! DEM merging go through GDAL's command-line programs the same way. The
//! orchestration here only assembles argument vectors, launches the process,
//! and inspects the exit status; stdout and stderr are captured so a failing
//! tool's own diagnostics can be reported verbatim.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::types::{FloodError, FloodResult};

/// One `gpt` operator invocation with its target product and parameters.
#[derive(Debug, Clone)]
pub struct GptInvocation {
    operator: String,
    target: PathBuf,
    params: Vec<String>,
}

impl GptInvocation {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(operator: S, target: P) -> Self {
        GptInvocation {
            operator: operator.into(),
            target: target.into(),
            params: Vec::new(),
        }
    }

    /// Append one parameter (`-P...`, `-S...`, or a positional source path).
    pub fn param<S: Into<String>>(mut self, param: S) -> Self {
        self.params.push(param.into());
        self
    }

    /// The target product path without the `.dim` extension, as passed to
    /// `gpt -t`.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Full argument vector as handed to the `gpt` executable.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            self.operator.clone(),
            "-t".to_string(),
            self.target.to_string_lossy().into_owned(),
        ];
        args.extend(self.params.iter().cloned());
        args
    }

    /// Run the invocation to completion, failing fast on a non-zero exit.
    pub fn run(&self, gpt: &Path) -> FloodResult<()> {
        run_tool(gpt, &self.args())
    }
}

/// Run an external tool to completion, capturing its output.
///
/// A non-zero exit status is fatal for the caller: the error carries the
/// tool's combined stdout/stderr and its exit status so the process can
/// terminate with the same status.
pub fn run_tool(program: &Path, args: &[String]) -> FloodResult<()> {
    log::debug!("running: {} {}", program.display(), args.join(" "));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            FloodError::Config(format!("cannot launch {}: {}", program.display(), e))
        })?;

    if output.status.success() {
        return Ok(());
    }

    let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        if !captured.is_empty() && !captured.ends_with('\n') {
            captured.push('\n');
        }
        captured.push_str(&stderr);
    }

    Err(FloodError::Tool {
        tool: tool_name(program),
        status: output.status.code(),
        output: captured,
    })
}

fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_args_lead_with_operator_and_target() {
        let inv = GptInvocation::new("Apply-Orbit-File", "/work/G_OB")
            .param("-PcontinueOnFail=false")
            .param("/data/G.zip");
        assert_eq!(
            inv.args(),
            vec![
                "Apply-Orbit-File",
                "-t",
                "/work/G_OB",
                "-PcontinueOnFail=false",
                "/data/G.zip"
            ]
        );
    }

    #[test]
    fn missing_executable_is_a_config_error() {
        let err = run_tool(Path::new("/nonexistent/gpt"), &["Calibration".to_string()])
            .unwrap_err();
        assert!(matches!(err, FloodError::Config(_)));
    }
}
