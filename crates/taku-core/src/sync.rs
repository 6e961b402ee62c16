//! Git-backed synchronization of the scripts root.

use std::path::Path;

use tracing::{debug, info};

use crate::error::Result;
use crate::process::{ProcessRunner, argv, run_checked};

/// Commit message used for every push.
pub const COMMIT_MESSAGE: &str = "taku: sync scripts";

fn git(root: &Path, args: &[&str]) -> Vec<String> {
    let mut cmd = argv(["git", "-C"]);
    cmd.push(root.to_string_lossy().into_owned());
    cmd.extend(args.iter().map(|a| (*a).to_owned()));
    cmd
}

/// Stage everything, commit and push.  An empty commit is not an error.
pub fn push(root: &Path, runner: &dyn ProcessRunner) -> Result<()> {
    run_checked(runner, &git(root, &["add", "-A"]))?;

    let code = runner.run(&git(root, &["commit", "-m", COMMIT_MESSAGE]))?;
    if code != 0 {
        debug!(code, "nothing to commit");
    }

    run_checked(runner, &git(root, &["push"]))?;
    info!(root = %root.display(), "scripts pushed");
    Ok(())
}

/// Pull remote changes into the scripts root.
pub fn pull(root: &Path, runner: &dyn ProcessRunner) -> Result<()> {
    run_checked(runner, &git(root, &["pull"]))?;
    info!(root = %root.display(), "scripts pulled");
    Ok(())
}
