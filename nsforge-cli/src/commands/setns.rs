//! Setns command implementation

use anyhow::Result;
use nix::unistd::Pid;
use nsforge_namespace::{SetnsOptions, setns};
use tracing::debug;

use crate::cli::SetnsArgs;
use crate::commands::{exec_command, parse_kind_paths};

pub fn execute(args: &SetnsArgs) -> Result<()> {
    let mut options = SetnsOptions::new();
    options.files = parse_kind_paths(&args.files)?;

    let pid = args.pid.map(Pid::from_raw);
    setns(args.namespaces.as_str(), pid, &options)?;
    debug!("namespaces associated");

    if args.command.is_empty() {
        Ok(())
    } else {
        exec_command(&args.command)
    }
}
