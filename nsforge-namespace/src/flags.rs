//! Flag interpretation
//!
//! Callers select namespaces either with raw kernel bits or with the
//! character notation (`"mun"` = mount + uts + net). Both forms are
//! validated against the registry before any side effect happens.

use libc::c_int;
use nsforge_core::{Error, Result};

use crate::registry::Registry;

/// A namespace selection, as accepted by the public entry points.
#[derive(Debug, Clone, Copy)]
pub enum FlagSpec<'a> {
    /// Raw kernel clone-flag bits.
    Bits(c_int),
    /// Character notation, one registered code per namespace.
    Chars(&'a str),
}

impl From<c_int> for FlagSpec<'static> {
    fn from(bits: c_int) -> Self {
        Self::Bits(bits)
    }
}

impl<'a> From<&'a str> for FlagSpec<'a> {
    fn from(chars: &'a str) -> Self {
        Self::Chars(chars)
    }
}

impl<'a> From<&'a String> for FlagSpec<'a> {
    fn from(chars: &'a String) -> Self {
        Self::Chars(chars)
    }
}

/// Validates a flag specification and reduces it to kernel bits.
///
/// Integer input may only carry bits the registry knows; character input
/// may only use registered codes. Duplicated characters are harmless, an
/// empty string selects nothing.
pub(crate) fn interpret(spec: FlagSpec<'_>, registry: &Registry) -> Result<c_int> {
    match spec {
        FlagSpec::Bits(bits) => {
            let stray = bits & !registry.union_flags();
            if stray == 0 {
                Ok(bits)
            } else {
                Err(Error::invalid_argument(format!(
                    "unsupported namespace flag bits: {stray:#x}"
                )))
            }
        }
        FlagSpec::Chars(chars) => chars.chars().try_fold(0, |acc, code| {
            registry.by_code(code).map_or_else(
                || {
                    Err(Error::invalid_argument(format!(
                        "unsupported namespace flag character: {code:?}"
                    )))
                },
                |spec| Ok(acc | spec.flag),
            )
        }),
    }
}
