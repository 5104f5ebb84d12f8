//! The setns orchestrator
//!
//! Associating with several namespaces at once is order-sensitive:
//! associating with a user namespace changes the caller's privileges, so
//! a kind that fails beforehand can succeed afterwards - and the other
//! way around. Every requested kind therefore gets one attempt before
//! the user namespace and, if needed, one retry after it.
//!
//! The raw syscall requires `unsafe`.

#![allow(unsafe_code)]

use std::fs::File;
use std::os::fd::AsRawFd;
use std::path::PathBuf;

use libc::c_int;
use nix::errno::Errno;
use nix::unistd::Pid;
use tracing::debug;

use nsforge_core::{Error, Result};

use crate::flags::{self, FlagSpec};
use crate::options::SetnsOptions;
use crate::registry::{NamespaceKind, NamespaceSpec, Registry};

/// Per-kind progress through the two-pass association algorithm.
#[derive(Debug)]
enum Attempt {
    Pending,
    Failed(Error),
    Done(c_int),
}

struct NsEntry {
    spec: &'static NamespaceSpec,
    file: File,
    state: Attempt,
}

/// Associates the caller with the selected namespaces of another process.
///
/// Each requested kind resolves to a namespace file: the explicit path in
/// `options`, else `/proc/<pid>/ns/<name>`; a kind with neither is an
/// invalid-argument error raised before anything is opened. All files
/// are opened up front, then associated in dependency order (see the
/// module docs). Returns the highest per-kind syscall return value, zero
/// when nothing was requested.
///
/// # Errors
///
/// Fails on invalid flags, on an unresolvable or unopenable namespace
/// file, or when a kind cannot be associated in either pass.
pub fn setns<'a>(
    flags: impl Into<FlagSpec<'a>>,
    pid: Option<Pid>,
    options: &SetnsOptions,
) -> Result<c_int> {
    let registry = Registry::global();
    let bits = flags::interpret(flags.into(), registry)?;

    // Resolve every target path before opening anything.
    let mut refs: Vec<(&'static NamespaceSpec, PathBuf)> = Vec::new();
    for spec in registry.iter().filter(|spec| bits & spec.flag != 0) {
        let path = match options.files.get(spec.kind) {
            Some(path) => path.to_path_buf(),
            None => match pid {
                Some(pid) => PathBuf::from(format!("/proc/{pid}/ns/{}", spec.proc_name)),
                None => {
                    return Err(Error::invalid_argument(format!(
                        "{} namespace requested but neither a pid nor a {:?} file was given",
                        spec.proc_name, spec.option_key
                    )));
                }
            },
        };
        refs.push((spec, path));
    }

    // Open everything before the first association: once namespaces start
    // changing, relative path resolution is no longer trustworthy.
    let mut entries = Vec::with_capacity(refs.len());
    for (spec, path) in refs {
        let file = File::open(&path).map_err(|e| Error::Io {
            path: path.clone(),
            source: e,
        })?;
        debug!(kind = spec.proc_name, path = %path.display(), "opened namespace file");
        entries.push(NsEntry {
            spec,
            file,
            state: Attempt::Pending,
        });
    }

    // Descriptors close when `entries` drops, on every exit path.
    associate_all(&mut entries, |entry| {
        Errno::result(unsafe { libc::setns(entry.file.as_raw_fd(), entry.spec.flag) })
            .map_err(|e| Error::syscall("setns", e))
    })
}

/// Runs the two-pass association sequence over `entries`.
///
/// Order: every non-user kind in registry order, then the user kind, then
/// a retry of the non-user kinds that failed the first pass. A second
/// failure of the same kind is fatal immediately; a kind still failed
/// when the sequence ends (the user kind has no retry) surfaces its
/// recorded error.
fn associate_all(
    entries: &mut [NsEntry],
    mut attempt: impl FnMut(&NsEntry) -> Result<c_int>,
) -> Result<c_int> {
    let non_user: Vec<usize> = (0..entries.len())
        .filter(|&i| entries[i].spec.kind != NamespaceKind::User)
        .collect();
    let user: Option<usize> = (0..entries.len())
        .find(|&i| entries[i].spec.kind == NamespaceKind::User);

    let sequence = non_user
        .iter()
        .chain(user.iter())
        .chain(non_user.iter())
        .copied();

    for index in sequence {
        let entry = &mut entries[index];
        if matches!(entry.state, Attempt::Done(_)) {
            continue;
        }

        match attempt(entry) {
            Ok(ret) => {
                debug!(kind = entry.spec.proc_name, "associated");
                entry.state = Attempt::Done(ret);
            }
            Err(err) => {
                if matches!(entry.state, Attempt::Failed(_)) {
                    // Failed in both passes.
                    return Err(err);
                }
                debug!(kind = entry.spec.proc_name, error = %err, "association deferred");
                entry.state = Attempt::Failed(err);
            }
        }
    }

    let mut highest = 0;
    for entry in entries {
        match std::mem::replace(&mut entry.state, Attempt::Pending) {
            Attempt::Done(ret) => highest = highest.max(ret),
            Attempt::Failed(err) => return Err(err),
            Attempt::Pending => unreachable!("every requested kind was attempted"),
        }
    }
    Ok(highest)
}
