//! Fork-and-handshake helper protocol
//!
//! Some privileged writes must happen in a process other than the one
//! changing namespaces: a bind mount has to be made from the old mount
//! namespace, a uid map has to be written from outside the new user
//! namespace. This module runs such a write in a short-lived helper that
//! blocks on a one-byte handshake until the caller has finished its own
//! path, then performs the write and reports back over a pipe.
//!
//! Forking requires `unsafe`; the helper only ever calls `_exit`, never
//! returns into the caller's stack.

#![allow(unsafe_code)]

use std::os::fd::OwnedFd;

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, fork, pipe, read, write};
use serde::{Deserialize, Serialize};
use tracing::debug;

use nsforge_core::{Error, Result};

/// Error relayed from a helper process over its pipe.
#[derive(Debug, Serialize, Deserialize)]
struct WireError {
    kind: String,
    message: String,
}

/// Runs `privileged` in a forked helper while `main` runs in the caller.
///
/// The helper blocks until the caller has finished `main` and signals the
/// handshake byte, so the helper observes whatever state `main`
/// established. If `main` fails, the helper is killed and reaped before
/// the error propagates. If the helper fails, its error crosses the pipe
/// and surfaces as [`Error::Delegated`] with the original kind and
/// message.
pub fn run<T, P, M>(privileged: P, main: M) -> Result<T>
where
    P: FnOnce() -> Result<()>,
    M: FnOnce() -> Result<T>,
{
    let (handshake_r, handshake_w) = pipe().map_err(|e| Error::syscall("pipe", e))?;
    let (error_r, error_w) = pipe().map_err(|e| Error::syscall("pipe", e))?;

    match unsafe { fork() }.map_err(|e| Error::syscall("fork", e))? {
        ForkResult::Child => {
            drop(handshake_w);
            drop(error_r);
            helper_child(&handshake_r, &error_w, privileged)
        }
        ForkResult::Parent { child } => {
            drop(handshake_r);
            drop(error_w);

            let value = match main() {
                Ok(value) => value,
                Err(err) => {
                    // The helper is still parked on the handshake; do not
                    // leave it behind.
                    debug!(%child, error = %err, "main path failed, killing helper");
                    let _ = kill(child, Signal::SIGKILL);
                    let _ = waitpid(child, None);
                    return Err(err);
                }
            };

            // Release the helper. EPIPE here means it already died; the
            // wait below surfaces whatever it reported.
            let _ = write(&handshake_w, &[1u8]);
            drop(handshake_w);

            match waitpid(child, None).map_err(|e| Error::syscall("waitpid", e))? {
                WaitStatus::Exited(_, 0) => Ok(value),
                WaitStatus::Exited(_, code) => Err(read_wire_error(&error_r, code)),
                other => Err(Error::Delegated {
                    kind: "unknown".into(),
                    message: format!("helper terminated abnormally: {other:?}"),
                }),
            }
        }
    }
}

/// Helper side: wait for the handshake, run the privileged write, report.
///
/// Never returns; a forked copy of the caller must not unwind back into
/// the caller's stack.
fn helper_child(handshake: &OwnedFd, errors: &OwnedFd, privileged: impl FnOnce() -> Result<()>) -> ! {
    let mut byte = [0u8; 1];
    if !matches!(read(handshake, &mut byte), Ok(1)) {
        // Caller died or aborted before signaling; nothing to do.
        unsafe { libc::_exit(2) }
    }

    match privileged() {
        Ok(()) => unsafe { libc::_exit(0) },
        Err(err) => {
            let wire = WireError {
                kind: err.kind().to_string(),
                message: err.to_string(),
            };
            if let Ok(encoded) = serde_json::to_vec(&wire) {
                write_all(errors, &encoded);
            }
            unsafe { libc::_exit(1) }
        }
    }
}

fn write_all(fd: &OwnedFd, mut buf: &[u8]) {
    while !buf.is_empty() {
        match write(fd, buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => buf = &buf[n..],
        }
    }
}

/// Drains and decodes the helper's error pipe after a non-zero exit.
fn read_wire_error(fd: &OwnedFd, exit_code: i32) -> Error {
    let mut encoded = Vec::new();
    let mut chunk = [0u8; 256];
    loop {
        match read(fd, &mut chunk) {
            Ok(0) => break,
            Ok(n) => encoded.extend_from_slice(&chunk[..n]),
            Err(Errno::EINTR) => {}
            Err(_) => break,
        }
    }

    serde_json::from_slice::<WireError>(&encoded).map_or_else(
        |_| Error::Delegated {
            kind: "unknown".into(),
            message: format!("helper exited with status {exit_code}"),
        },
        |wire| Error::Delegated {
            kind: wire.kind,
            message: wire.message,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_main_result_propagates() {
        let result = run(|| Ok(()), || Ok(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_helper_runs_after_main() {
        // The helper only sees the marker if the handshake really orders
        // it after the main path.
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");

        let marker_for_helper = marker.clone();
        let result = run(
            move || {
                if marker_for_helper.exists() {
                    Ok(())
                } else {
                    Err(Error::invalid_argument("marker not written yet"))
                }
            },
            || {
                fs::write(&marker, b"ready").unwrap();
                Ok("done")
            },
        );
        assert_eq!(result.unwrap(), "done");
    }

    #[test]
    fn test_helper_error_crosses_the_pipe() {
        let result: Result<()> = run(
            || Err(Error::invalid_argument("boom")),
            || Ok(()),
        );

        match result.unwrap_err() {
            Error::Delegated { kind, message } => {
                assert_eq!(kind, "invalid-argument");
                assert!(message.contains("boom"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_main_error_takes_precedence() {
        let result: Result<()> = run(
            || Ok(()),
            || Err(Error::invalid_argument("main failed")),
        );

        match result.unwrap_err() {
            Error::InvalidArgument { message } => assert_eq!(message, "main failed"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
