//! Namespace file introspection
//!
//! Read-only view of a process's `/proc/PID/ns/` directory. The inode of
//! a namespace file identifies the namespace: two processes share a
//! namespace exactly when the inodes match.

use std::fmt;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use nix::unistd::Pid;
use serde::Serialize;

/// One `/proc/PID/ns/` entry: its path and, when present, its inode.
///
/// The inode is `None` when the kernel does not expose the namespace
/// (or the process is gone).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NsFile {
    path: PathBuf,
    ino: Option<u64>,
}

impl NsFile {
    fn collect(path: PathBuf) -> Self {
        let ino = fs::metadata(&path).ok().map(|meta| meta.ino());
        Self { path, ino }
    }

    /// Path of the namespace file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inode of the namespace file, the namespace's identity.
    #[must_use]
    pub const fn ino(&self) -> Option<u64> {
        self.ino
    }
}

/// The namespace files of one process.
#[derive(Debug, Clone, Serialize)]
pub struct NsFiles {
    /// Mount namespace
    pub mnt: NsFile,
    /// UTS namespace
    pub uts: NsFile,
    /// IPC namespace
    pub ipc: NsFile,
    /// Network namespace
    pub net: NsFile,
    /// PID namespace
    pub pid: NsFile,
    /// PID namespace of future children
    pub pid_for_children: NsFile,
    /// User namespace
    pub user: NsFile,
    /// Cgroup namespace
    pub cgroup: NsFile,
    /// Time namespace
    pub time: NsFile,
    /// Time namespace of future children
    pub time_for_children: NsFile,
}

impl NsFiles {
    /// Collects the namespace files of the calling process.
    #[must_use]
    pub fn current() -> Self {
        Self::at("/proc/self/ns")
    }

    /// Collects the namespace files of another process.
    #[must_use]
    pub fn of_pid(pid: Pid) -> Self {
        Self::at(&format!("/proc/{pid}/ns"))
    }

    fn at(base: &str) -> Self {
        let entry = |name: &str| NsFile::collect(PathBuf::from(format!("{base}/{name}")));
        Self {
            mnt: entry("mnt"),
            uts: entry("uts"),
            ipc: entry("ipc"),
            net: entry("net"),
            pid: entry("pid"),
            pid_for_children: entry("pid_for_children"),
            user: entry("user"),
            cgroup: entry("cgroup"),
            time: entry("time"),
            time_for_children: entry("time_for_children"),
        }
    }

    /// The entry with the given name, if it is one of the ten.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&NsFile> {
        match name {
            "mnt" => Some(&self.mnt),
            "uts" => Some(&self.uts),
            "ipc" => Some(&self.ipc),
            "net" => Some(&self.net),
            "pid" => Some(&self.pid),
            "pid_for_children" => Some(&self.pid_for_children),
            "user" => Some(&self.user),
            "cgroup" => Some(&self.cgroup),
            "time" => Some(&self.time),
            "time_for_children" => Some(&self.time_for_children),
            _ => None,
        }
    }

    /// Iterates the entries in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &NsFile)> {
        [
            ("mnt", &self.mnt),
            ("uts", &self.uts),
            ("ipc", &self.ipc),
            ("net", &self.net),
            ("pid", &self.pid),
            ("pid_for_children", &self.pid_for_children),
            ("user", &self.user),
            ("cgroup", &self.cgroup),
            ("time", &self.time),
            ("time_for_children", &self.time_for_children),
        ]
        .into_iter()
    }
}

impl fmt::Display for NsFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, file) in self.iter() {
            match file.ino() {
                Some(ino) => writeln!(f, "  {name:<18} {ino}")?,
                None => writeln!(f, "  {name:<18} -")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::getpid;

    const ENTRY_NAMES: [&str; 10] = [
        "mnt",
        "uts",
        "ipc",
        "net",
        "pid",
        "pid_for_children",
        "user",
        "cgroup",
        "time",
        "time_for_children",
    ];

    #[test]
    fn test_current_process_has_core_namespaces() {
        let files = NsFiles::current();
        assert_eq!(files.mnt.path(), Path::new("/proc/self/ns/mnt"));
        assert!(files.mnt.ino().is_some());
        assert!(files.uts.ino().is_some());
        assert!(files.pid.ino().is_some());
    }

    #[test]
    fn test_self_and_own_pid_agree() {
        let by_self = NsFiles::current();
        let by_pid = NsFiles::of_pid(getpid());
        assert_eq!(by_self.mnt.ino(), by_pid.mnt.ino());
        assert_eq!(by_self.net.ino(), by_pid.net.ino());
    }

    #[test]
    fn test_missing_process_yields_no_inodes() {
        let files = NsFiles::of_pid(Pid::from_raw(-2));
        assert!(files.iter().all(|(_, file)| file.ino().is_none()));
    }

    #[test]
    fn test_iteration_order_is_fixed() {
        let files = NsFiles::current();
        let names: Vec<&str> = files.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ENTRY_NAMES);
    }

    #[test]
    fn test_get_by_name() {
        let files = NsFiles::current();
        assert!(files.get("uts").is_some());
        assert!(files.get("pid_for_children").is_some());
        assert!(files.get("bogus").is_none());
    }

    #[test]
    fn test_display_lists_every_entry() {
        let rendered = NsFiles::current().to_string();
        for name in ENTRY_NAMES {
            assert!(rendered.contains(name), "{name}");
        }
    }
}
