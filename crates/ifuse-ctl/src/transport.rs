// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Issuing control ioctls against a mount root
//!
//! Every invocation opens the mount root as a directory, makes exactly one
//! device-control call and closes the directory again. The handle is an owned
//! value, so dropping it is the close; no exit path can leak or double-close it.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use ifuse_ioctl::{Operation, RequestCode};
use tracing::{debug, warn};

use crate::error::{CtlError, Result};

/// An open descriptor on a mount root. Dropping it closes the descriptor.
pub trait MountHandle: Send {
    /// Issue the device-control call.
    ///
    /// `buf` is `None` for requests without a payload and otherwise spans
    /// exactly the code's size field. Returns the driver's status; an OS-level
    /// refusal is an `Err`.
    fn device_control(&mut self, code: RequestCode, buf: Option<&mut [u8]>) -> io::Result<i32>;
}

/// Opens mount roots
#[cfg_attr(test, mockall::automock)]
pub trait MountOpener {
    fn open(&self, path: &Path) -> io::Result<Box<dyn MountHandle>>;
}

/// Opens the mount root with `O_RDONLY | O_DIRECTORY | O_CLOEXEC`
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectoryOpener;

impl MountOpener for DirectoryOpener {
    fn open(&self, path: &Path) -> io::Result<Box<dyn MountHandle>> {
        // std adds O_CLOEXEC on its own
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_DIRECTORY)
            .open(path)?;
        debug!(path = %path.display(), fd = file.as_raw_fd(), "opened mount root");
        Ok(Box::new(DirectoryHandle { file }))
    }
}

#[derive(Debug)]
pub struct DirectoryHandle {
    file: File,
}

impl MountHandle for DirectoryHandle {
    #[cfg(target_os = "linux")]
    fn device_control(&mut self, code: RequestCode, buf: Option<&mut [u8]>) -> io::Result<i32> {
        use nix::errno::Errno;
        use nix::sys::ioctl::ioctl_num_type;

        let arg = match buf {
            Some(buf) => buf.as_mut_ptr().cast::<libc::c_void>(),
            None => std::ptr::null_mut(),
        };

        // SAFETY: the descriptor stays open for the lifetime of `self`, and a
        // non-null `arg` points at a live buffer of `code.size()` bytes, which
        // is all the kernel copies for this request code.
        let status = unsafe {
            libc::ioctl(self.file.as_raw_fd(), code.raw() as ioctl_num_type, arg)
        };
        Errno::result(status).map_err(io::Error::from)
    }

    #[cfg(not(target_os = "linux"))]
    fn device_control(&mut self, code: RequestCode, _buf: Option<&mut [u8]>) -> io::Result<i32> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("ioctl {code} uses the Linux request layout"),
        ))
    }
}

/// Raw outcome of one device-control call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Driver status, passed through verbatim. The driver defines 0 as success.
    pub status: i32,
    /// Buffer contents after the call; empty unless the request reads data back
    pub data: Vec<u8>,
}

impl Reply {
    /// Turn a non-zero driver status into `OperationFailed`
    pub fn check(self, operation: Operation) -> Result<Vec<u8>> {
        if self.status != 0 {
            return Err(CtlError::OperationFailed {
                operation,
                status: self.status,
            });
        }
        Ok(self.data)
    }
}

/// Resolve a mount path to an absolute path without touching the filesystem
pub fn resolve_mount_path(mount_path: &Path) -> Result<PathBuf> {
    std::path::absolute(mount_path).map_err(|source| CtlError::MountUnavailable {
        path: mount_path.to_path_buf(),
        source,
    })
}

/// Opens the mount and issues a single request, optionally bounded by a timeout
pub struct Transport<O> {
    opener: O,
    timeout: Option<Duration>,
}

impl<O: MountOpener> Transport<O> {
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            timeout: None,
        }
    }

    /// Bound the device-control call. `None` blocks until the driver answers.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Open `mount_path`, issue `code` and close the handle again.
    ///
    /// `input` is copied into the transfer buffer for requests that send
    /// data; the rest of the buffer is zero-filled.
    pub fn invoke(
        &self,
        mount_path: &Path,
        code: RequestCode,
        input: Option<&[u8]>,
    ) -> Result<Reply> {
        let buffer = transfer_buffer(code, input)?;
        let path = resolve_mount_path(mount_path)?;

        let handle = self
            .opener
            .open(&path)
            .map_err(|source| CtlError::MountUnavailable {
                path: path.clone(),
                source,
            })?;

        debug!(
            path = %path.display(),
            %code,
            direction = %code.direction(),
            size = code.size(),
            "issuing device-control call"
        );

        let (result, data) = match self.timeout {
            None => call(handle, code, buffer),
            Some(timeout) => call_with_timeout(handle, code, buffer, timeout)?,
        };
        let status = result.map_err(|source| CtlError::ProtocolRejected { code, source })?;

        debug!(%code, status, "device-control call returned");
        let data = if code.direction().returns_output() {
            data
        } else {
            Vec::new()
        };
        Ok(Reply { status, data })
    }
}

fn transfer_buffer(code: RequestCode, input: Option<&[u8]>) -> Result<Vec<u8>> {
    let size = code.size() as usize;
    let mut buffer = vec![0u8; size];

    if let Some(input) = input.filter(|_| code.direction().sends_input()) {
        if input.len() > size {
            return Err(CtlError::PayloadTooLarge {
                code,
                size,
                actual: input.len(),
            });
        }
        buffer[..input.len()].copy_from_slice(input);
    }
    Ok(buffer)
}

/// Run the call on the current thread. The handle is dropped before returning.
fn call(
    mut handle: Box<dyn MountHandle>,
    code: RequestCode,
    mut buffer: Vec<u8>,
) -> (io::Result<i32>, Vec<u8>) {
    let arg = if code.direction().has_payload() {
        Some(buffer.as_mut_slice())
    } else {
        None
    };
    let result = handle.device_control(code, arg);
    drop(handle);
    (result, buffer)
}

/// Run the call on a worker thread that owns the handle.
///
/// If the driver does not answer in time the caller gets `TimedOut`; the
/// worker keeps waiting and closes the handle once the driver returns (or the
/// process exits).
fn call_with_timeout(
    handle: Box<dyn MountHandle>,
    code: RequestCode,
    buffer: Vec<u8>,
    timeout: Duration,
) -> Result<(io::Result<i32>, Vec<u8>)> {
    let (tx, rx) = mpsc::sync_channel(1);

    thread::Builder::new()
        .name("ifuse-ioctl".into())
        .spawn(move || {
            // The receiver is gone after a timeout; nothing left to report to.
            let _ = tx.send(call(handle, code, buffer));
        })
        .map_err(|source| CtlError::WorkerFailed { code, source })?;

    match rx.recv_timeout(timeout) {
        Ok(outcome) => Ok(outcome),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!(%code, timeout_ms = timeout.as_millis() as u64, "device-control call timed out");
            Err(CtlError::TimedOut { code, timeout })
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(CtlError::WorkerFailed {
            code,
            source: io::Error::other("device-control worker exited without a reply"),
        }),
    }
}
