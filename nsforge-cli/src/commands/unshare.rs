//! Unshare command implementation

use anyhow::{Context, Result};
use nix::sys::signal::{Signal, kill};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::Pid;
use nsforge_namespace::{IdMapSpec, UnshareOptions, Unshared, unshare};
use std::process;
use tracing::{debug, warn};

use crate::cli::UnshareArgs;
use crate::commands::{exec_command, parse_kind_paths};

pub fn execute(args: &UnshareArgs) -> Result<()> {
    let mut options = UnshareOptions::new().with_fork(args.fork);
    options.persist = parse_kind_paths(&args.persist)?;

    if !args.map_uid.is_empty() {
        options.map_uid = Some(IdMapSpec::Lines(args.map_uid.clone()));
    }
    if !args.map_gid.is_empty() {
        options.map_gid = Some(IdMapSpec::Lines(args.map_gid.clone()));
    }
    if let Some(offset) = &args.monotonic {
        options.monotonic = Some(offset.parse().context("invalid --monotonic offset")?);
    }
    if let Some(offset) = &args.boottime {
        options.boottime = Some(offset.parse().context("invalid --boottime offset")?);
    }

    match unshare(args.namespaces.as_str(), &options)? {
        Unshared::Done => {
            debug!("namespaces detached");
            if args.command.is_empty() {
                Ok(())
            } else {
                exec_command(&args.command)
            }
        }
        Unshared::Child => {
            if args.command.is_empty() {
                process::exit(0);
            }
            exec_command(&args.command)
        }
        Unshared::Parent(child) => supervise(child),
    }
}

/// Waits for the forked child and mirrors its exit status.
fn supervise(child: Pid) -> Result<()> {
    // Forward Ctrl+C to the child instead of dying around it.
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = kill(child, Signal::SIGTERM);
    }) {
        warn!("could not set signal handler: {e}");
    }

    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, code)) => process::exit(code),
            Ok(WaitStatus::Signaled(_, signal, _)) => process::exit(128 + signal as i32),
            Ok(status) => {
                debug!(?status, "child status");
            }
            Err(nix::errno::Errno::EINTR) => {}
            Err(nix::errno::Errno::ECHILD) => process::exit(0),
            Err(e) => anyhow::bail!("wait failed: {e}"),
        }
    }
}
