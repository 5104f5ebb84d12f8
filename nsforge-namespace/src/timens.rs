//! Time-namespace clock offsets
//!
//! A fresh time namespace accepts per-clock offsets through
//! `/proc/PID/timens_offsets` until the first process enters it. Offsets
//! arrive from callers as whole seconds, floats, or decimal strings;
//! strings are parsed digit-by-digit so fractional seconds survive
//! without float drift.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use nix::unistd::Pid;
use serde::{Deserialize, Serialize};
use tracing::debug;

use nsforge_core::{Error, Result};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A clock offset, split the way `timens_offsets` wants it.
///
/// `nanos` is always in `0..1_000_000_000`; negative offsets carry the
/// sign in `secs` (floor semantics, so `-1.5` is `-2` seconds plus
/// `500_000_000` nanoseconds).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOffset {
    secs: i64,
    nanos: u32,
}

impl TimeOffset {
    /// The zero offset.
    pub const ZERO: Self = Self { secs: 0, nanos: 0 };

    /// Builds an offset from whole seconds and a sub-second remainder.
    ///
    /// `nanos` of a full second or more carry over into `secs`.
    #[must_use]
    pub const fn new(secs: i64, nanos: u32) -> Self {
        let carry = nanos as u64 / NANOS_PER_SEC;
        Self {
            secs: secs + carry as i64,
            nanos: (nanos as u64 % NANOS_PER_SEC) as u32,
        }
    }

    /// Whole-second part.
    #[must_use]
    pub const fn secs(&self) -> i64 {
        self.secs
    }

    /// Sub-second part in nanoseconds.
    #[must_use]
    pub const fn nanos(&self) -> u32 {
        self.nanos
    }
}

impl From<i64> for TimeOffset {
    fn from(secs: i64) -> Self {
        Self { secs, nanos: 0 }
    }
}

impl From<f64> for TimeOffset {
    #[allow(clippy::cast_possible_truncation)]
    fn from(value: f64) -> Self {
        let floor = value.floor();
        let mut secs = floor as i64;
        let mut nanos = ((value - floor) * NANOS_PER_SEC as f64).round() as u64;
        if nanos >= NANOS_PER_SEC {
            secs += 1;
            nanos -= NANOS_PER_SEC;
        }
        Self {
            secs,
            nanos: nanos as u32,
        }
    }
}

impl FromStr for TimeOffset {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let malformed = || Error::invalid_argument(format!("malformed time offset {input:?}"));

        let trimmed = input.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (digits, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(malformed());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(malformed());
        }

        let mut secs: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| malformed())?
        };

        // First nine fractional digits are the nanoseconds, the tenth
        // rounds half-up.
        let mut nanos: u64 = 0;
        for digit in frac_part.bytes().take(9) {
            nanos = nanos * 10 + u64::from(digit - b'0');
        }
        for _ in frac_part.len()..9 {
            nanos *= 10;
        }
        if let Some(tenth) = frac_part.as_bytes().get(9)
            && *tenth >= b'5'
        {
            nanos += 1;
        }
        if nanos >= NANOS_PER_SEC {
            secs += 1;
            nanos -= NANOS_PER_SEC;
        }

        #[allow(clippy::cast_possible_truncation)]
        let nanos = nanos as u32;
        if negative {
            if nanos == 0 {
                Ok(Self { secs: -secs, nanos })
            } else {
                Ok(Self {
                    secs: -secs - 1,
                    nanos: (NANOS_PER_SEC as u32) - nanos,
                })
            }
        } else {
            Ok(Self { secs, nanos })
        }
    }
}

impl fmt::Display for TimeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.secs, self.nanos)
    }
}

/// The `timens_offsets` file content: one line per clock, zero-filling
/// whichever was not given.
fn render_offsets(monotonic: Option<TimeOffset>, boottime: Option<TimeOffset>) -> String {
    let mono = monotonic.unwrap_or(TimeOffset::ZERO);
    let boot = boottime.unwrap_or(TimeOffset::ZERO);
    format!("monotonic {mono}\nboottime {boot}\n")
}

/// Writes `monotonic` and `boottime` offsets for the target process
/// (`None` targets the caller).
pub fn write_time_offsets(
    monotonic: Option<TimeOffset>,
    boottime: Option<TimeOffset>,
    pid: Option<Pid>,
) -> Result<()> {
    let text = render_offsets(monotonic, boottime);

    let target = pid.map_or_else(|| "self".to_string(), |p| p.to_string());
    let path = PathBuf::from(format!("/proc/{target}/timens_offsets"));
    debug!(path = %path.display(), "writing time offsets");
    fs::write(&path, &text).map_err(|e| Error::Io { path, source: e })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(s: &str) -> TimeOffset {
        s.parse().unwrap()
    }

    #[test]
    fn test_whole_seconds() {
        assert_eq!(parsed("123"), TimeOffset::new(123, 0));
        assert_eq!(TimeOffset::from(123), TimeOffset::new(123, 0));
        assert_eq!(parsed("123").to_string(), "123 0");
    }

    #[test]
    fn test_fractional_string_is_exact() {
        assert_eq!(parsed("123.456"), TimeOffset::new(123, 456_000_000));
        assert_eq!(parsed("123.456").to_string(), "123 456000000");
        assert_eq!(parsed("0.000000001"), TimeOffset::new(0, 1));
        assert_eq!(parsed("0.123456789"), TimeOffset::new(0, 123_456_789));
    }

    #[test]
    fn test_tenth_digit_rounds_half_up() {
        assert_eq!(parsed("0.0000000014"), TimeOffset::new(0, 1));
        assert_eq!(parsed("0.0000000015"), TimeOffset::new(0, 2));
        // Rounding can carry all the way into the seconds.
        assert_eq!(parsed("1.9999999999"), TimeOffset::new(2, 0));
    }

    #[test]
    fn test_negative_offsets_use_floor_semantics() {
        assert_eq!(parsed("-1"), TimeOffset::new(-1, 0));
        assert_eq!(parsed("-1.5"), TimeOffset::new(-2, 500_000_000));
        assert_eq!(parsed("-1.5").to_string(), "-2 500000000");
        assert_eq!(parsed("-0.25"), TimeOffset::new(-1, 750_000_000));
    }

    #[test]
    fn test_float_and_string_agree() {
        assert_eq!(TimeOffset::from(1.5), parsed("1.5"));
        assert_eq!(TimeOffset::from(-1.25), parsed("-1.25"));
        assert_eq!(TimeOffset::from(0.0), TimeOffset::ZERO);
    }

    #[test]
    fn test_new_carries_excess_nanos() {
        assert_eq!(TimeOffset::new(1, 1_500_000_000), TimeOffset::new(2, 500_000_000));
    }

    #[test]
    fn test_offsets_file_content() {
        assert_eq!(
            render_offsets(Some(parsed("123.456")), None),
            "monotonic 123 456000000\nboottime 0 0\n"
        );
        assert_eq!(
            render_offsets(None, Some(TimeOffset::from(5i64))),
            "monotonic 0 0\nboottime 5 0\n"
        );
        assert_eq!(render_offsets(None, None), "monotonic 0 0\nboottime 0 0\n");
    }

    #[test]
    fn test_malformed_inputs_fail() {
        for input in ["", ".", "abc", "1.2.3", "1e9", "12a", "--5"] {
            assert!(input.parse::<TimeOffset>().is_err(), "{input:?}");
        }
    }

    #[test]
    fn test_leading_plus_and_whitespace_are_tolerated() {
        assert_eq!(parsed(" +2.5 "), TimeOffset::new(2, 500_000_000));
        assert_eq!(parsed(".5"), TimeOffset::new(0, 500_000_000));
    }
}
