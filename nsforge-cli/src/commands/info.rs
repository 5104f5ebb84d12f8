//! Info command implementation

use anyhow::{Context, Result};
use nix::unistd::Pid;
use nsforge_namespace::NsFiles;

use crate::cli::InfoArgs;

pub fn execute(args: &InfoArgs) -> Result<()> {
    let files = match args.pid {
        Some(pid) => NsFiles::of_pid(Pid::from_raw(pid)),
        None => NsFiles::current(),
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&files).context("failed to encode namespace files")?
        );
        return Ok(());
    }

    let target = args.pid.map_or_else(|| "self".to_string(), |pid| pid.to_string());
    println!("🔒 Namespace files for PID {target}");
    println!("{:-<40}", "");
    print!("{files}");

    Ok(())
}
