//! Caller-facing option structs for the orchestrators

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::idmap::IdMapSpec;
use crate::registry::NamespaceKind;
use crate::timens::TimeOffset;

/// One optional file path per namespace kind.
///
/// For [`unshare`](crate::unshare::unshare) these are persistence
/// targets: the new namespace of each kind is bind-mounted onto the given
/// path. For [`setns`](crate::setns::setns) they are explicit namespace
/// files to associate with, overriding the pid-derived paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NsPathMap {
    /// Mount namespace file
    pub mount: Option<PathBuf>,
    /// UTS namespace file
    pub uts: Option<PathBuf>,
    /// IPC namespace file
    pub ipc: Option<PathBuf>,
    /// Network namespace file
    pub network: Option<PathBuf>,
    /// PID namespace file
    pub pid: Option<PathBuf>,
    /// User namespace file
    pub user: Option<PathBuf>,
    /// Cgroup namespace file
    pub cgroup: Option<PathBuf>,
    /// Time namespace file
    pub time: Option<PathBuf>,
}

impl NsPathMap {
    /// The path registered for a kind, if any.
    #[must_use]
    pub fn get(&self, kind: NamespaceKind) -> Option<&Path> {
        self.slot(kind).as_deref()
    }

    /// Registers a path for a kind.
    pub fn set(&mut self, kind: NamespaceKind, path: impl Into<PathBuf>) {
        *self.slot_mut(kind) = Some(path.into());
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, kind: NamespaceKind, path: impl Into<PathBuf>) -> Self {
        self.set(kind, path);
        self
    }

    /// Whether no path is registered at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [
            NamespaceKind::Mount,
            NamespaceKind::Uts,
            NamespaceKind::Ipc,
            NamespaceKind::Net,
            NamespaceKind::Pid,
            NamespaceKind::User,
            NamespaceKind::Cgroup,
            NamespaceKind::Time,
        ]
        .iter()
        .all(|kind| self.get(*kind).is_none())
    }

    const fn slot(&self, kind: NamespaceKind) -> &Option<PathBuf> {
        match kind {
            NamespaceKind::Mount => &self.mount,
            NamespaceKind::Uts => &self.uts,
            NamespaceKind::Ipc => &self.ipc,
            NamespaceKind::Net => &self.network,
            NamespaceKind::Pid => &self.pid,
            NamespaceKind::User => &self.user,
            NamespaceKind::Cgroup => &self.cgroup,
            NamespaceKind::Time => &self.time,
        }
    }

    const fn slot_mut(&mut self, kind: NamespaceKind) -> &mut Option<PathBuf> {
        match kind {
            NamespaceKind::Mount => &mut self.mount,
            NamespaceKind::Uts => &mut self.uts,
            NamespaceKind::Ipc => &mut self.ipc,
            NamespaceKind::Net => &mut self.network,
            NamespaceKind::Pid => &mut self.pid,
            NamespaceKind::User => &mut self.user,
            NamespaceKind::Cgroup => &mut self.cgroup,
            NamespaceKind::Time => &mut self.time,
        }
    }
}

/// Options for [`unshare`](crate::unshare::unshare).
///
/// Options that do not apply to the requested namespaces are ignored
/// without error: a uid map means nothing without the user namespace, an
/// offset means nothing without the time namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnshareOptions {
    /// Persistence targets, one per kind to keep alive past the process.
    pub persist: NsPathMap,

    /// Fork after unsharing; the parent gets the child pid, the child
    /// continues inside the new namespaces.
    pub fork: bool,

    /// UID mapping for a new user namespace.
    pub map_uid: Option<IdMapSpec>,

    /// GID mapping for a new user namespace.
    pub map_gid: Option<IdMapSpec>,

    /// Monotonic clock offset for a new time namespace.
    pub monotonic: Option<TimeOffset>,

    /// Boottime clock offset for a new time namespace.
    pub boottime: Option<TimeOffset>,
}

impl UnshareOptions {
    /// Create empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist the namespace of `kind` at `path`.
    #[must_use]
    pub fn with_persist(mut self, kind: NamespaceKind, path: impl Into<PathBuf>) -> Self {
        self.persist.set(kind, path);
        self
    }

    /// Fork after unsharing.
    #[must_use]
    pub const fn with_fork(mut self, fork: bool) -> Self {
        self.fork = fork;
        self
    }

    /// Set the uid mapping.
    #[must_use]
    pub fn with_map_uid(mut self, map: impl Into<IdMapSpec>) -> Self {
        self.map_uid = Some(map.into());
        self
    }

    /// Set the gid mapping.
    #[must_use]
    pub fn with_map_gid(mut self, map: impl Into<IdMapSpec>) -> Self {
        self.map_gid = Some(map.into());
        self
    }

    /// Set the monotonic clock offset.
    #[must_use]
    pub fn with_monotonic(mut self, offset: impl Into<TimeOffset>) -> Self {
        self.monotonic = Some(offset.into());
        self
    }

    /// Set the boottime clock offset.
    #[must_use]
    pub fn with_boottime(mut self, offset: impl Into<TimeOffset>) -> Self {
        self.boottime = Some(offset.into());
        self
    }
}

/// Options for [`setns`](crate::setns::setns).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetnsOptions {
    /// Explicit namespace files, overriding the pid-derived paths.
    pub files: NsPathMap,
}

impl SetnsOptions {
    /// Create empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate the namespace of `kind` through the file at `path`.
    #[must_use]
    pub fn with_file(mut self, kind: NamespaceKind, path: impl Into<PathBuf>) -> Self {
        self.files.set(kind, path);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_map_roundtrip() {
        let mut map = NsPathMap::default();
        assert!(map.is_empty());
        assert!(map.get(NamespaceKind::Net).is_none());

        map.set(NamespaceKind::Net, "/run/netns/test");
        assert!(!map.is_empty());
        assert_eq!(
            map.get(NamespaceKind::Net),
            Some(Path::new("/run/netns/test"))
        );
        assert!(map.get(NamespaceKind::Mount).is_none());
    }

    #[test]
    fn test_unshare_options_builder() {
        let options = UnshareOptions::new()
            .with_fork(true)
            .with_persist(NamespaceKind::Uts, "/tmp/uts")
            .with_map_uid([0, 1000, 1])
            .with_map_gid("0 1000 1")
            .with_monotonic(10i64)
            .with_boottime("2.5".parse::<TimeOffset>().unwrap());

        assert!(options.fork);
        assert_eq!(options.persist.get(NamespaceKind::Uts), Some(Path::new("/tmp/uts")));
        assert_eq!(options.map_uid, Some(IdMapSpec::Triple([0, 1000, 1])));
        assert_eq!(options.map_gid, Some(IdMapSpec::Text("0 1000 1".into())));
        assert_eq!(options.monotonic, Some(TimeOffset::from(10i64)));
        assert_eq!(options.boottime, Some(TimeOffset::new(2, 500_000_000)));
    }

    #[test]
    fn test_setns_options_builder() {
        let options = SetnsOptions::new().with_file(NamespaceKind::Ipc, "/proc/1/ns/ipc");
        assert_eq!(
            options.files.get(NamespaceKind::Ipc),
            Some(Path::new("/proc/1/ns/ipc"))
        );
    }
}
