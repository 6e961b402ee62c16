//! Process runner -- the single seam through which taku spawns children.
//!
//! Editors, scripts, `git` and `systemctl` are all launched through
//! [`ProcessRunner`].  The system implementation inherits stdio and blocks
//! until the child exits; there is no timeout.

use std::process::Command;

use tracing::debug;

use crate::error::{Result, TakuError};

/// Runs an argv to completion and reports its exit code.
pub trait ProcessRunner {
    /// Run `argv[0]` with the remaining elements as arguments.
    fn run(&self, argv: &[String]) -> Result<i32>;
}

/// Spawns real child processes with inherited stdin/stdout/stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, argv: &[String]) -> Result<i32> {
        let (program, args) = argv.split_first().ok_or_else(|| {
            TakuError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty command line",
            ))
        })?;

        debug!(program = %program, args = ?args, "spawning process");

        let status = Command::new(program).args(args).status()?;
        let code = exit_code(status);

        debug!(program = %program, code, "process exited");
        Ok(code)
    }
}

/// Map an exit status to a shell-style exit code.
fn exit_code(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

/// Run `argv` and turn a non-zero exit into [`TakuError::CommandFailed`].
pub fn run_checked(runner: &dyn ProcessRunner, argv: &[String]) -> Result<()> {
    let code = runner.run(argv)?;
    if code != 0 {
        return Err(TakuError::CommandFailed {
            program: argv.first().cloned().unwrap_or_default(),
            code,
        });
    }
    Ok(())
}

/// Build an owned argv from string slices.
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_argv_is_rejected() {
        assert!(SystemRunner.run(&[]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn exit_code_is_forwarded() {
        let code = SystemRunner
            .run(&argv(["sh", "-c", "exit 3"]))
            .unwrap();
        assert_eq!(code, 3);
    }

    #[cfg(unix)]
    #[test]
    fn run_checked_reports_failure() {
        let err = run_checked(&SystemRunner, &argv(["sh", "-c", "exit 2"])).unwrap_err();
        match err {
            TakuError::CommandFailed { program, code } => {
                assert_eq!(program, "sh");
                assert_eq!(code, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn argv_builds_owned_strings() {
        assert_eq!(argv(["git", "pull"]), vec!["git".to_string(), "pull".to_string()]);
    }
}
