// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! In-process stand-in for the driver, used by unit tests

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};

use ifuse_ioctl::RequestCode;

use crate::transport::{MountHandle, MountOpener};

/// What the simulated driver does when called
pub(crate) enum Behavior {
    /// Copy `data` into the buffer and return `status`
    Reply { status: i32, data: Vec<u8> },
    /// Fail the call at the OS level with this errno
    Errno(i32),
    /// Refuse to open the mount with this errno
    OpenFails(i32),
    /// Block until the paired sender is dropped, then return 0
    Block(mpsc::Receiver<()>),
}

impl Behavior {
    pub(crate) fn reply(status: i32, data: Vec<u8>) -> Self {
        Behavior::Reply { status, data }
    }

    pub(crate) fn blocking() -> (mpsc::Sender<()>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Behavior::Block(rx))
    }
}

#[derive(Clone, Default)]
pub(crate) struct Probe {
    opens: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    codes: Arc<Mutex<Vec<RequestCode>>>,
    buffers: Arc<Mutex<Vec<Option<Vec<u8>>>>>,
}

impl Probe {
    pub(crate) fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub(crate) fn codes(&self) -> Vec<RequestCode> {
        self.codes.lock().unwrap().clone()
    }

    /// Buffer contents as the driver saw them on entry
    pub(crate) fn buffers(&self) -> Vec<Option<Vec<u8>>> {
        self.buffers.lock().unwrap().clone()
    }
}

/// Hands out one [`FakeHandle`] per open, all sharing the same behavior
#[derive(Clone)]
pub(crate) struct FakeOpener {
    behavior: Arc<Mutex<Option<Behavior>>>,
    probe: Probe,
}

impl FakeOpener {
    pub(crate) fn new(behavior: Behavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(Some(behavior))),
            probe: Probe::default(),
        }
    }

    pub(crate) fn probe(&self) -> &Probe {
        &self.probe
    }
}

impl MountOpener for FakeOpener {
    fn open(&self, _path: &Path) -> io::Result<Box<dyn MountHandle>> {
        let mut slot = self.behavior.lock().unwrap();
        if let Some(Behavior::OpenFails(errno)) = slot.as_ref() {
            return Err(io::Error::from_raw_os_error(*errno));
        }
        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        let behavior = slot.take().expect("fake mount opened twice");
        Ok(Box::new(FakeHandle {
            behavior,
            probe: self.probe.clone(),
        }))
    }
}

pub(crate) struct FakeHandle {
    behavior: Behavior,
    probe: Probe,
}

impl MountHandle for FakeHandle {
    fn device_control(&mut self, code: RequestCode, buf: Option<&mut [u8]>) -> io::Result<i32> {
        self.probe.calls.fetch_add(1, Ordering::SeqCst);
        self.probe.codes.lock().unwrap().push(code);
        self.probe
            .buffers
            .lock()
            .unwrap()
            .push(buf.as_deref().map(<[u8]>::to_vec));

        match &self.behavior {
            Behavior::Reply { status, data } => {
                if let Some(buf) = buf {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                }
                Ok(*status)
            }
            Behavior::Errno(errno) => Err(io::Error::from_raw_os_error(*errno)),
            Behavior::OpenFails(_) => unreachable!("handle created for a failing open"),
            Behavior::Block(release) => {
                let _ = release.recv();
                Ok(0)
            }
        }
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        let previous = self.probe.closes.fetch_add(1, Ordering::SeqCst);
        assert_eq!(previous, 0, "mount handle closed more than once");
    }
}
