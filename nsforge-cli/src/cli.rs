//! CLI argument definitions

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nsforge")]
#[command(about = "Linux namespace orchestration tool", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detach from namespaces and optionally run a command inside
    Unshare(UnshareArgs),

    /// Associate with the namespaces of another process
    Setns(SetnsArgs),

    /// Show the namespace files of a process
    Info(InfoArgs),
}

#[derive(Args)]
pub struct UnshareArgs {
    /// Namespaces to detach from, in character notation
    /// (m=mount u=uts i=ipc n=net p=pid U=user C=cgroup T=time)
    #[arg(short, long)]
    pub namespaces: String,

    /// Persist a namespace as KIND=PATH, e.g. network=/run/netns/x (repeatable)
    #[arg(long = "persist", value_name = "KIND=PATH")]
    pub persist: Vec<String>,

    /// UID map row "inside outside count" (repeatable)
    #[arg(long = "map-uid", value_name = "ROW")]
    pub map_uid: Vec<String>,

    /// GID map row "inside outside count" (repeatable)
    #[arg(long = "map-gid", value_name = "ROW")]
    pub map_gid: Vec<String>,

    /// Monotonic clock offset in seconds (fractions allowed)
    #[arg(long)]
    pub monotonic: Option<String>,

    /// Boottime clock offset in seconds (fractions allowed)
    #[arg(long)]
    pub boottime: Option<String>,

    /// Fork before running the command, so it starts inside a new pid namespace
    #[arg(long)]
    pub fork: bool,

    /// Command to run inside the new namespaces
    #[arg(last = true)]
    pub command: Vec<String>,
}

#[derive(Args)]
pub struct SetnsArgs {
    /// Namespaces to associate with, in character notation
    #[arg(short, long)]
    pub namespaces: String,

    /// Process whose namespaces to associate with
    #[arg(short, long)]
    pub pid: Option<i32>,

    /// Explicit namespace file as KIND=PATH (repeatable)
    #[arg(long = "file", value_name = "KIND=PATH")]
    pub files: Vec<String>,

    /// Command to run after associating
    #[arg(last = true)]
    pub command: Vec<String>,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Process ID (default: current process)
    #[arg(short, long)]
    pub pid: Option<i32>,

    /// Emit JSON instead of the table
    #[arg(long)]
    pub json: bool,
}
