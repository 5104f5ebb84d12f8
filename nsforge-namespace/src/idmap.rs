//! UID/GID map formatting and writing
//!
//! A user namespace only becomes useful once `/proc/PID/uid_map` and
//! `/proc/PID/gid_map` are populated. The kernel is strict about both the
//! row format (`"inside outside count"`) and the write order: an
//! unprivileged writer must deny `setgroups` before a gid map is
//! accepted.

use std::fs;
use std::path::PathBuf;

use nix::unistd::Pid;
use serde::{Deserialize, Serialize};

use nsforge_core::{Error, Result};

/// Which kernel map file a mapping applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdMapKind {
    /// `/proc/PID/uid_map`
    Uid,
    /// `/proc/PID/gid_map`
    Gid,
}

impl IdMapKind {
    const fn file_name(self) -> &'static str {
        match self {
            Self::Uid => "uid_map",
            Self::Gid => "gid_map",
        }
    }

    /// The option key a mapping of this kind is given under.
    #[must_use]
    pub const fn option_key(self) -> &'static str {
        match self {
            Self::Uid => "map_uid",
            Self::Gid => "map_gid",
        }
    }
}

/// A uid/gid mapping in any of the accepted caller shapes.
///
/// Every shape reduces to rows of `inside outside count`: `count` ids
/// starting at `inside` in the namespace map to `count` ids starting at
/// `outside` in the parent namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdMapSpec {
    /// Pre-formatted `"inside outside count"` text, possibly multi-line.
    Text(String),
    /// One pre-formatted row per element.
    Lines(Vec<String>),
    /// A single `[inside, outside, count]` row.
    Triple([u32; 3]),
    /// Multiple `[inside, outside, count]` rows.
    Triples(Vec<[u32; 3]>),
}

impl IdMapSpec {
    /// Renders the kernel map-file text: one `"inside outside count"` row
    /// per line, newline-terminated, rows in input order.
    pub fn render(&self, kind: IdMapKind) -> Result<String> {
        let rows: Vec<[u32; 3]> = match self {
            Self::Text(text) => text
                .lines()
                .map(|line| parse_row(line, kind))
                .collect::<Result<_>>()?,
            Self::Lines(lines) => lines
                .iter()
                .flat_map(|entry| entry.lines())
                .map(|line| parse_row(line, kind))
                .collect::<Result<_>>()?,
            Self::Triple(row) => vec![*row],
            Self::Triples(rows) => rows.clone(),
        };

        if rows.is_empty() {
            return Err(Error::IdMap {
                key: kind.option_key(),
                message: "empty mapping".into(),
            });
        }

        Ok(rows
            .iter()
            .map(|[inside, outside, count]| format!("{inside} {outside} {count}\n"))
            .collect())
    }
}

fn parse_row(line: &str, kind: IdMapKind) -> Result<[u32; 3]> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 3 {
        return Err(Error::IdMap {
            key: kind.option_key(),
            message: format!("expected \"inside outside count\", got {line:?}"),
        });
    }

    let mut row = [0u32; 3];
    for (slot, field) in row.iter_mut().zip(&fields) {
        *slot = field.parse().map_err(|_| Error::IdMap {
            key: kind.option_key(),
            message: format!("non-numeric field {field:?} in {line:?}"),
        })?;
    }
    Ok(row)
}

impl From<&str> for IdMapSpec {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for IdMapSpec {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<[u32; 3]> for IdMapSpec {
    fn from(row: [u32; 3]) -> Self {
        Self::Triple(row)
    }
}

impl From<Vec<[u32; 3]>> for IdMapSpec {
    fn from(rows: Vec<[u32; 3]>) -> Self {
        Self::Triples(rows)
    }
}

impl From<Vec<String>> for IdMapSpec {
    fn from(lines: Vec<String>) -> Self {
        Self::Lines(lines)
    }
}

/// Writes a rendered mapping to `/proc/<pid>/{uid,gid}_map`.
pub fn write_id_map(spec: &IdMapSpec, pid: Pid, kind: IdMapKind) -> Result<()> {
    let text = spec.render(kind)?;
    let path = PathBuf::from(format!("/proc/{pid}/{}", kind.file_name()));
    fs::write(&path, &text).map_err(|e| Error::Io { path, source: e })
}

/// Writes `deny` to `/proc/<pid>/setgroups`.
pub fn deny_setgroups(pid: Pid) -> Result<()> {
    let path = PathBuf::from(format!("/proc/{pid}/setgroups"));
    fs::write(&path, "deny").map_err(|e| Error::Io { path, source: e })
}

/// One step of the map-write sequence.
#[derive(Debug, PartialEq, Eq)]
enum MapWrite<'a> {
    Map(IdMapKind, &'a IdMapSpec),
    DenySetgroups,
}

/// The write sequence for the requested maps, in the order the kernel
/// mandates: uid map first, then the `setgroups` denial, then the gid
/// map.
fn write_plan<'a>(
    map_uid: Option<&'a IdMapSpec>,
    map_gid: Option<&'a IdMapSpec>,
) -> Vec<MapWrite<'a>> {
    let mut plan = Vec::new();
    if let Some(uid) = map_uid {
        plan.push(MapWrite::Map(IdMapKind::Uid, uid));
    }
    if let Some(gid) = map_gid {
        plan.push(MapWrite::DenySetgroups);
        plan.push(MapWrite::Map(IdMapKind::Gid, gid));
    }
    plan
}

/// Applies the requested maps to `pid`, see [`write_plan`] for the order.
pub fn apply_id_maps(
    map_uid: Option<&IdMapSpec>,
    map_gid: Option<&IdMapSpec>,
    pid: Pid,
) -> Result<()> {
    for step in write_plan(map_uid, map_gid) {
        match step {
            MapWrite::Map(kind, spec) => write_id_map(spec, pid, kind)?,
            MapWrite::DenySetgroups => deny_setgroups(pid)?,
        }
    }
    Ok(())
}
