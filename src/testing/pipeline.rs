//! External tool pipeline
//!
//! `kustomize build | yq 'select(...)' | argocd admin settings resource-overrides health`,
//! run as separate processes with explicit stdout → stdin piping. Arguments
//! are passed as argv, never through a shell.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use futures_util::future::try_join_all;
use tokio::process::Command;

use crate::common::{Error, Result, Settings};

/// One program invocation in a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Stage {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Program path as shown in errors
    pub fn label(&self) -> String {
        self.program.display().to_string()
    }
}

/// Ordered stages, each reading the previous stage's stdout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

/// Exit status and stderr of one finished stage
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub program: String,
    pub status: ExitStatus,
    pub stderr: String,
}

/// Everything captured from a finished pipeline
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Stdout of the last stage
    pub stdout: String,
    /// One entry per stage, in pipeline order
    pub stages: Vec<StageOutput>,
}

impl PipelineOutput {
    /// Fail on the first stage that exited unsuccessfully
    pub fn check(&self) -> Result<()> {
        match self.stages.iter().find(|s| !s.status.success()) {
            Some(stage) => Err(Error::stage_failed(
                &stage.program,
                &stage.status.to_string(),
                &stage.stderr,
            )),
            None => Ok(()),
        }
    }

    /// Stderr of all stages that wrote any, labelled by program
    pub fn stderr(&self) -> String {
        self.stages
            .iter()
            .filter(|s| !s.stderr.trim().is_empty())
            .map(|s| format!("[{}] {}", s.program, s.stderr.trim_end()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// Assess `input` with the health scripts from the rendered argocd-cm
    pub fn health_check(settings: &Settings, input: &Path) -> Self {
        Self::new(vec![
            Stage::new(&settings.kustomize)
                .arg("build")
                .arg(&settings.manifest_source),
            Stage::new(&settings.yq).arg(settings.config_map.yq_expression()),
            Stage::new(&settings.argocd)
                .args(["admin", "settings", "resource-overrides", "health"])
                .arg(input)
                .args(["--argocd-cm-path", "/dev/stdin"]),
        ])
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Spawn every stage and wait for all of them to exit
    ///
    /// Stages are awaited together so a stage blocked on a full stderr pipe
    /// cannot stall the ones after it. There is no timeout.
    pub async fn run(&self) -> Result<PipelineOutput> {
        if self.stages.is_empty() {
            return Err(Error::EmptyPipeline);
        }

        tracing::debug!(command = %self, "running pipeline");

        let last = self.stages.len() - 1;
        let mut children = Vec::with_capacity(self.stages.len());
        let mut stdin = Some(Stdio::null());

        for (i, stage) in self.stages.iter().enumerate() {
            let mut child = Command::new(&stage.program)
                .args(&stage.args)
                .stdin(stdin.take().unwrap_or_else(Stdio::null))
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| Error::stage_spawn(&stage.label(), &e))?;

            if i < last {
                if let Some(stdout) = child.stdout.take() {
                    let next: Stdio = stdout.try_into()?;
                    stdin = Some(next);
                }
            }
            children.push(child);
        }

        let outputs = try_join_all(children.into_iter().map(|c| c.wait_with_output())).await?;

        let mut stdout = String::new();
        let mut stages = Vec::with_capacity(outputs.len());
        for (i, (stage, output)) in self.stages.iter().zip(outputs).enumerate() {
            if i == last {
                stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            }
            tracing::trace!(program = %stage.label(), status = %output.status, "stage exited");
            stages.push(StageOutput {
                program: stage.label(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(PipelineOutput { stdout, stages })
    }
}

/// Renders the equivalent shell command, for logs and `list --commands`
impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(&shell_quote(stage.program.as_os_str()))?;
            for arg in &stage.args {
                write!(f, " {}", shell_quote(arg))?;
            }
        }
        Ok(())
    }
}

fn shell_quote(s: &OsStr) -> String {
    let s = s.to_string_lossy();
    let plain = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:,+@%".contains(c));
    if plain {
        s.into_owned()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
