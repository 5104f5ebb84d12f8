//! Linux namespace orchestration
//!
//! This crate wraps the `unshare(2)` and `setns(2)` system calls and the
//! privileged, order-dependent bookkeeping around them:
//! - Flag interpretation - namespaces selected by kernel bits or by
//!   character notation (`"mun"` for mount + uts + net)
//! - Unshare orchestration - persistent namespace files bind-mounted by a
//!   helper process, uid/gid maps written by a helper process, time
//!   namespace offsets, optional forking
//! - Setns orchestration - dependency-ordered association with the
//!   namespaces of another process
//! - Namespace file introspection via `/proc/PID/ns/`

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod delegate;
pub mod files;
pub mod flags;
pub mod idmap;
pub mod options;
pub mod registry;
pub mod setns;
pub mod timens;
pub mod unshare;

pub use files::{NsFile, NsFiles};
pub use flags::FlagSpec;
pub use idmap::{IdMapKind, IdMapSpec};
pub use options::{NsPathMap, SetnsOptions, UnshareOptions};
pub use registry::{NamespaceKind, NamespaceSpec, Registry};
pub use setns::setns;
pub use timens::TimeOffset;
pub use unshare::{Unshared, unshare};
