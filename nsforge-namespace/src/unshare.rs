//! The unshare orchestrator
//!
//! Wraps `unshare(2)` with the bookkeeping a bare syscall cannot do:
//! persistent namespace files (bind-mounted by a helper that keeps the
//! pre-unshare mount view), uid/gid maps (written by a helper outside the
//! new user namespace), time offsets, and an optional trailing fork.
//!
//! Forking and the raw syscall require `unsafe`.

#![allow(unsafe_code)]

use std::fs::OpenOptions;
use std::path::PathBuf;

use libc::c_int;
use nix::errno::Errno;
use nix::mount::{MsFlags, mount};
use nix::unistd::{ForkResult, Pid, fork, getpid};
use tracing::debug;

use nsforge_core::{Error, Result};

use crate::delegate;
use crate::flags::{self, FlagSpec};
use crate::idmap::{self, IdMapKind};
use crate::options::UnshareOptions;
use crate::registry::{NamespaceSpec, Registry};
use crate::timens;

/// Outcome of [`unshare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unshared {
    /// No fork was requested; the caller now lives in the new namespaces.
    Done,
    /// Fork was requested; this is the parent and it owns the child.
    Parent(Pid),
    /// Fork was requested; this is the child, inside the new namespaces.
    Child,
}

impl Unshared {
    /// The child pid, when this is the forking parent.
    #[must_use]
    pub const fn child(&self) -> Option<Pid> {
        match self {
            Self::Parent(pid) => Some(*pid),
            _ => None,
        }
    }

    /// Whether this is the forked child.
    #[must_use]
    pub const fn is_child(&self) -> bool {
        matches!(self, Self::Child)
    }
}

/// Disassociates the caller from the selected namespaces.
///
/// Flags are either kernel bits or character notation (`"mun"`). All
/// validation happens before any process is created or any file touched.
/// See [`UnshareOptions`] for persistence, id-map, time-offset and fork
/// behavior.
///
/// A persistence bind mount that succeeded before a later failure is left
/// in place: the namespace file was valid when it was created, and
/// persistent namespace files are meant to outlive their creator.
///
/// # Errors
///
/// Fails on invalid flags or map shapes, on a syscall failure, or with
/// the relayed error of a helper process.
pub fn unshare<'a>(flags: impl Into<FlagSpec<'a>>, options: &UnshareOptions) -> Result<Unshared> {
    let registry = Registry::global();
    let bits = flags::interpret(flags.into(), registry)?;

    let user_requested = bits & libc::CLONE_NEWUSER != 0;
    let time_requested = bits & libc::CLONE_NEWTIME != 0;
    let want_maps =
        user_requested && (options.map_uid.is_some() || options.map_gid.is_some());
    let want_offsets =
        time_requested && (options.monotonic.is_some() || options.boottime.is_some());

    // Surface malformed map shapes before any fork or syscall.
    if want_maps {
        if let Some(map) = &options.map_uid {
            let _ = map.render(IdMapKind::Uid)?;
        }
        if let Some(map) = &options.map_gid {
            let _ = map.render(IdMapKind::Gid)?;
        }
    }

    let persist = persist_targets(bits, options, registry);
    let caller = getpid();

    let main = || -> Result<()> {
        if want_maps {
            debug!(%caller, "delegating id-map writes to a helper");
            let map_uid = options.map_uid.clone();
            let map_gid = options.map_gid.clone();
            delegate::run(
                move || idmap::apply_id_maps(map_uid.as_ref(), map_gid.as_ref(), caller),
                || unshare_syscall(bits),
            )?;
        } else {
            unshare_syscall(bits)?;
        }

        if want_offsets {
            timens::write_time_offsets(options.monotonic, options.boottime, None)?;
        }
        Ok(())
    };

    if persist.is_empty() {
        main()?;
    } else {
        debug!(
            %caller,
            targets = persist.len(),
            "delegating namespace file binds to a helper"
        );
        let targets = persist;
        delegate::run(move || bind_namespace_files(&targets, caller), main)?;
    }

    if options.fork {
        match unsafe { fork() }.map_err(|e| Error::syscall("fork", e))? {
            ForkResult::Parent { child } => {
                debug!(%child, "forked into the new namespaces");
                Ok(Unshared::Parent(child))
            }
            ForkResult::Child => Ok(Unshared::Child),
        }
    } else {
        Ok(Unshared::Done)
    }
}

fn unshare_syscall(bits: c_int) -> Result<()> {
    debug!(flags = bits, "unshare");
    Errno::result(unsafe { libc::unshare(bits) })
        .map(drop)
        .map_err(|e| Error::syscall("unshare", e))
}

/// Requested kinds that also carry a persistence path.
fn persist_targets(
    bits: c_int,
    options: &UnshareOptions,
    registry: &Registry,
) -> Vec<(&'static NamespaceSpec, PathBuf)> {
    registry
        .iter()
        .filter(|spec| bits & spec.flag != 0)
        .filter_map(|spec| {
            options
                .persist
                .get(spec.kind)
                .map(|path| (spec, path.to_path_buf()))
        })
        .collect()
}

/// Bind-mounts the caller's namespace files onto their persistence
/// targets.
///
/// Runs in a helper forked before the caller unshared, so the helper
/// still holds the old mount namespace and the targets stay visible to
/// the rest of the system. The handshake guarantees the caller has
/// already unshared, so `/proc/<caller>/ns/<bind_name>` names the new
/// namespaces.
fn bind_namespace_files(
    targets: &[(&'static NamespaceSpec, PathBuf)],
    source_pid: Pid,
) -> Result<()> {
    for (spec, target) in targets {
        let source = PathBuf::from(format!("/proc/{source_pid}/ns/{}", spec.bind_name));

        // The bind target must exist as a regular file.
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(target)
            .map_err(|e| Error::Io {
                path: target.clone(),
                source: e,
            })?;

        mount(
            Some(source.as_path()),
            target.as_path(),
            None::<&str>,
            MsFlags::MS_BIND,
            None::<&str>,
        )
        .map_err(|e| Error::syscall("mount", e))?;
    }
    Ok(())
}
