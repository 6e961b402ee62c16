//! Subcommand implementations.
//!
//! Each command resolves the configuration, builds the registry and
//! collaborators it needs, calls into `taku_core` and prints the outcome.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use taku_core::config::{EDITOR_ENV_VAR, SCRIPTS_ENV_VAR};
use taku_core::{
    CreationSource, Environment, HostIdentity, InstallTarget, Installer, ProcessRunner,
    ScriptRegistry, SyncService, SystemHost, SystemRunner, TakuConfig, describe, render_list,
    sync,
};
use tracing::{debug, warn};

use crate::cli::{Cli, Commands};

/// Everything a command may need, resolved once per invocation.
struct Session {
    env: Environment,
    config: TakuConfig,
    registry: ScriptRegistry,
    host: SystemHost,
    runner: SystemRunner,
}

impl Session {
    fn installer(&self) -> Installer<'_> {
        let host: &dyn HostIdentity = &self.host;
        Installer::new(&self.registry, host, &self.config.target_dir)
            .with_launcher(&self.config.launcher)
    }
}

/// Snapshot the parts of the process environment taku reads.
fn capture_environment() -> Result<Environment> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    let config_dir = dirs::config_dir().unwrap_or_else(|| home.join(".config"));

    let mut env = Environment {
        home,
        config_dir,
        ..Default::default()
    };
    for key in [SCRIPTS_ENV_VAR, EDITOR_ENV_VAR] {
        if let Ok(value) = std::env::var(key) {
            env.vars.insert(key.to_owned(), value);
        }
    }
    Ok(env)
}

fn open_session(scripts: Option<PathBuf>) -> Result<Session> {
    let env = capture_environment()?;
    let config =
        TakuConfig::resolve(&env, scripts.as_deref()).context("failed to load configuration")?;
    debug!(scripts = %config.scripts_dir.display(), "configuration resolved");

    Ok(Session {
        registry: ScriptRegistry::new(&config.scripts_dir),
        env,
        config,
        host: SystemHost,
        runner: SystemRunner,
    })
}

/// Run the parsed command line.
pub fn dispatch(cli: Cli) -> Result<ExitCode> {
    let session = open_session(cli.scripts)?;

    match cli.command {
        Commands::New {
            name,
            template,
            content,
        } => cmd_new(&session, &name, template, content)?,
        Commands::Get { name, json } => cmd_get(&session, &name, json)?,
        Commands::Rm { name } => cmd_rm(&session, &name)?,
        Commands::Ls { json } => cmd_ls(&session, json)?,
        Commands::Edit { name } => {
            session
                .registry
                .edit(&name, &session.config.editor_argv(), &session.runner)
                .with_context(|| format!("failed to edit {name}"))?;
        }
        Commands::Run { name, args } => return cmd_run(&session, &name, &args),
        Commands::Install {
            name,
            install_as,
            target_dir,
        } => cmd_install(&session, &name, install_as.as_deref(), target_dir)?,
        Commands::Uninstall { name } => cmd_uninstall(&session, &name)?,
        Commands::Sync { push, pull } => cmd_sync(&session, push, pull)?,
        Commands::Service { install, remove: _ } => cmd_service(&session, install)?,
    }

    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// Registry commands
// ---------------------------------------------------------------------------

fn cmd_new(
    session: &Session,
    name: &str,
    template: Option<String>,
    content: Option<String>,
) -> Result<()> {
    let source = CreationSource::from_options(template, content);
    let path = session.registry.create(name, &source)?;
    println!("Script {name} created at {}", path.display());
    Ok(())
}

fn cmd_get(session: &Session, name: &str, json: bool) -> Result<()> {
    let details = describe(&session.registry, name)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&details.to_json()?)?);
    } else {
        println!("{details}");
    }
    Ok(())
}

fn cmd_rm(session: &Session, name: &str) -> Result<()> {
    let installer = session.installer();
    if let Some(outcome) = session.registry.delete(name, &installer)? {
        println!("{outcome}");
    }
    println!("Script {name} removed");

    if session.config.push_on_remove {
        if let Err(e) = sync::push(session.registry.root(), &session.runner) {
            warn!(error = %e, "push after remove failed");
        }
    }
    Ok(())
}

fn cmd_ls(session: &Session, json: bool) -> Result<()> {
    let names = session.registry.list()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else {
        println!("{}", render_list(&names));
    }
    Ok(())
}

fn cmd_run(session: &Session, name: &str, args: &[String]) -> Result<ExitCode> {
    let runner: &dyn ProcessRunner = &session.runner;
    let code = session.registry.run(name, args, runner)?;
    debug!(script = %name, code, "script finished");
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}

// ---------------------------------------------------------------------------
// Installer commands
// ---------------------------------------------------------------------------

fn cmd_install(
    session: &Session,
    name: &str,
    install_as: Option<&str>,
    target_dir: Option<PathBuf>,
) -> Result<()> {
    let target_dir = target_dir.map(|d| session.env.expand(&d));
    let outcomes = session
        .installer()
        .install(&InstallTarget::parse(name), install_as, target_dir.as_deref())
        .with_context(|| format!("failed to install {name}"))?;

    for outcome in outcomes {
        println!("{outcome}");
    }
    Ok(())
}

fn cmd_uninstall(session: &Session, name: &str) -> Result<()> {
    let installer = session.installer();
    let names = match InstallTarget::parse(name) {
        InstallTarget::All => session.registry.list()?,
        InstallTarget::Script(name) => vec![name],
    };

    for name in names {
        let outcome = installer
            .uninstall(&name)
            .with_context(|| format!("failed to uninstall {name}"))?;
        println!("{outcome}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Sync and service
// ---------------------------------------------------------------------------

fn cmd_sync(session: &Session, push: bool, pull: bool) -> Result<()> {
    let (push, pull) = if push || pull { (push, pull) } else { (true, true) };
    let root = session.registry.root();

    if pull {
        sync::pull(root, &session.runner).context("pull failed")?;
        println!("Pulled scripts into {}", root.display());
    }
    if push {
        sync::push(root, &session.runner).context("push failed")?;
        println!("Pushed scripts from {}", root.display());
    }
    Ok(())
}

fn cmd_service(session: &Session, install: bool) -> Result<()> {
    let service = SyncService::new(
        &session.env.config_dir,
        &session.config.scripts_dir,
        &session.config.launcher,
    );

    if install {
        service
            .install(&session.runner)
            .context("failed to install sync service")?;
        println!("Installed {}", service.timer_path().display());
    } else {
        service
            .remove(&session.runner)
            .context("failed to remove sync service")?;
        println!("Removed {}", service.timer_path().display());
    }
    Ok(())
}
