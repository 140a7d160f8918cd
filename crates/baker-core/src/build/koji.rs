//! Koji command-line backend
//!
//! Invokes the `koji` client as a subprocess so that profile-specific
//! authentication (Kerberos, client certificates) is handled by the client
//! configuration rather than reimplemented here.

use std::path::PathBuf;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;

use crate::{Error, Result};

use super::{BuildRequest, BuildSystem};

static TASK_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Created task:\s*(\d+)").unwrap());

/// Output the client prints when credentials were not accepted.
const NOT_AUTHENTICATED: &str = "Not authenticated";

/// [`BuildSystem`] backed by the `koji` CLI.
#[derive(Debug, Clone)]
pub struct KojiCli {
    program: PathBuf,
}

impl Default for KojiCli {
    fn default() -> Self {
        Self {
            program: PathBuf::from("koji"),
        }
    }
}

impl KojiCli {
    /// Use a specific client binary instead of `koji` from `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run the client with `--profile <profile>` followed by `args`.
    ///
    /// Returns `(success, stdout, stderr)`, or a description of why the
    /// client could not be started.
    fn run(&self, profile: &str, args: &[&str]) -> std::result::Result<(bool, String, String), String> {
        tracing::debug!(program = %self.program.display(), profile, ?args, "Running build client");
        let output = Command::new(&self.program)
            .arg("--profile")
            .arg(profile)
            .args(args)
            .output()
            .map_err(|e| format!("cannot run {}: {}", self.program.display(), e))?;
        Ok((
            output.status.success(),
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
        ))
    }
}

/// Task id from `koji build` output.
pub fn parse_task_id(output: &str) -> Option<u64> {
    TASK_ID
        .captures(output)
        .and_then(|caps| caps[1].parse().ok())
}

impl BuildSystem for KojiCli {
    fn authenticate(&self, profile: &str) -> Result<()> {
        let (success, stdout, stderr) = self
            .run(profile, &["moshimoshi"])
            .map_err(|message| Error::Authentication {
                profile: profile.to_string(),
                message,
            })?;
        if !success || stdout.contains(NOT_AUTHENTICATED) || stderr.contains(NOT_AUTHENTICATED) {
            let detail = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(Error::Authentication {
                profile: profile.to_string(),
                message: detail.trim().to_string(),
            });
        }
        Ok(())
    }

    fn submit(&self, profile: &str, request: &BuildRequest) -> Result<u64> {
        let mut args = vec!["build", "--nowait"];
        if request.scratch {
            args.push("--scratch");
        }
        args.push(&request.target);
        args.push(&request.source);

        let (success, stdout, stderr) = self
            .run(profile, &args)
            .map_err(|message| Error::BuildSubmission { message })?;
        if !success {
            return Err(Error::BuildSubmission {
                message: stderr.trim().to_string(),
            });
        }
        parse_task_id(&stdout).ok_or_else(|| Error::BuildSubmission {
            message: format!("no task id in client output: {}", stdout.trim()),
        })
    }
}
