//! Command implementations

pub mod info;
pub mod setns;
pub mod unshare;

use anyhow::{Context, Result};
use nsforge_namespace::{NsPathMap, Registry};

/// Parses repeatable `KIND=PATH` arguments into a path map.
pub(crate) fn parse_kind_paths(pairs: &[String]) -> Result<NsPathMap> {
    let mut map = NsPathMap::default();
    for pair in pairs {
        let (key, path) = pair
            .split_once('=')
            .with_context(|| format!("expected KIND=PATH, got {pair:?}"))?;
        let spec = Registry::global()
            .by_option_key(key)
            .with_context(|| format!("unknown namespace kind {key:?}"))?;
        map.set(spec.kind, path);
    }
    Ok(map)
}

/// Replaces this process with the given command.
pub(crate) fn exec_command(command: &[String]) -> Result<()> {
    use std::os::unix::process::CommandExt;

    let err = std::process::Command::new(&command[0])
        .args(&command[1..])
        .exec();
    // exec only returns on failure.
    Err(err).with_context(|| format!("failed to execute {:?}", command[0]))
}
