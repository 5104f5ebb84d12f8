//! Registry of supported namespace kinds
//!
//! One static row per namespace kind the kernel can expose, carrying the
//! flag character, the clone-flag bit, the caller-facing option key and
//! the `/proc/PID/ns/` entry names. Which rows are actually usable is
//! probed once at process start by listing `/proc/self/ns`.

use std::path::Path;
use std::sync::OnceLock;

use libc::c_int;

/// The eight Linux namespace kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamespaceKind {
    /// Mount namespace
    Mount,
    /// UTS (hostname) namespace
    Uts,
    /// IPC namespace
    Ipc,
    /// Network namespace
    Net,
    /// PID namespace
    Pid,
    /// User namespace
    User,
    /// Cgroup namespace
    Cgroup,
    /// Time namespace
    Time,
}

/// Static description of one namespace kind.
#[derive(Debug, Clone, Copy)]
pub struct NamespaceSpec {
    /// The kind this row describes.
    pub kind: NamespaceKind,
    /// Single-character code used in string flag notation.
    pub code: char,
    /// Kernel clone-flag bit.
    pub flag: c_int,
    /// Option key callers use for per-kind file paths.
    pub option_key: &'static str,
    /// Entry name under `/proc/PID/ns/` for the live namespace.
    pub proc_name: &'static str,
    /// Entry name under `/proc/PID/ns/` used as a bind-mount source.
    ///
    /// Differs from `proc_name` for pid and time: a process that unshares
    /// those kinds stays in its old namespace and the new one is exposed
    /// through the `*_for_children` files.
    pub bind_name: &'static str,
}

const TABLE: [NamespaceSpec; 8] = [
    NamespaceSpec {
        kind: NamespaceKind::Mount,
        code: 'm',
        flag: libc::CLONE_NEWNS,
        option_key: "mount",
        proc_name: "mnt",
        bind_name: "mnt",
    },
    NamespaceSpec {
        kind: NamespaceKind::Uts,
        code: 'u',
        flag: libc::CLONE_NEWUTS,
        option_key: "uts",
        proc_name: "uts",
        bind_name: "uts",
    },
    NamespaceSpec {
        kind: NamespaceKind::Ipc,
        code: 'i',
        flag: libc::CLONE_NEWIPC,
        option_key: "ipc",
        proc_name: "ipc",
        bind_name: "ipc",
    },
    NamespaceSpec {
        kind: NamespaceKind::Net,
        code: 'n',
        flag: libc::CLONE_NEWNET,
        option_key: "network",
        proc_name: "net",
        bind_name: "net",
    },
    NamespaceSpec {
        kind: NamespaceKind::Pid,
        code: 'p',
        flag: libc::CLONE_NEWPID,
        option_key: "pid",
        proc_name: "pid",
        bind_name: "pid_for_children",
    },
    NamespaceSpec {
        kind: NamespaceKind::User,
        code: 'U',
        flag: libc::CLONE_NEWUSER,
        option_key: "user",
        proc_name: "user",
        bind_name: "user",
    },
    NamespaceSpec {
        kind: NamespaceKind::Cgroup,
        code: 'C',
        flag: libc::CLONE_NEWCGROUP,
        option_key: "cgroup",
        proc_name: "cgroup",
        bind_name: "cgroup",
    },
    NamespaceSpec {
        kind: NamespaceKind::Time,
        code: 'T',
        flag: libc::CLONE_NEWTIME,
        option_key: "time",
        proc_name: "time",
        bind_name: "time_for_children",
    },
];

/// The set of namespace kinds the running kernel exposes.
///
/// Built once per process; reads are lock-free afterwards.
#[derive(Debug)]
pub struct Registry {
    specs: Vec<&'static NamespaceSpec>,
}

impl Registry {
    /// Process-wide registry, probed on first use.
    pub fn global() -> &'static Self {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Self::probe)
    }

    /// Probes `/proc/self/ns` for the kinds this kernel exposes.
    fn probe() -> Self {
        let specs = TABLE
            .iter()
            .filter(|spec| {
                Path::new(&format!("/proc/self/ns/{}", spec.proc_name)).exists()
            })
            .collect();
        Self { specs }
    }

    /// Registry containing every kind, regardless of kernel support.
    #[cfg(test)]
    pub(crate) fn with_all() -> Self {
        Self {
            specs: TABLE.iter().collect(),
        }
    }

    /// Looks up a kind by its flag character.
    #[must_use]
    pub fn by_code(&self, code: char) -> Option<&'static NamespaceSpec> {
        self.specs.iter().find(|spec| spec.code == code).copied()
    }

    /// Looks up a kind by its clone-flag bit.
    #[must_use]
    pub fn by_flag(&self, flag: c_int) -> Option<&'static NamespaceSpec> {
        self.specs.iter().find(|spec| spec.flag == flag).copied()
    }

    /// Looks up a kind by its caller-facing option key.
    #[must_use]
    pub fn by_option_key(&self, key: &str) -> Option<&'static NamespaceSpec> {
        self.specs
            .iter()
            .find(|spec| spec.option_key == key)
            .copied()
    }

    /// Iterates the supported kinds in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &'static NamespaceSpec> + '_ {
        self.specs.iter().copied()
    }

    /// OR of every supported clone-flag bit.
    #[must_use]
    pub fn union_flags(&self) -> c_int {
        self.specs.iter().fold(0, |acc, spec| acc | spec.flag)
    }
}
