// evlayer Input Layer - evdev Device Source
// Grabbed evdev keyboard polled with libc::poll

use std::io;
use std::os::unix::io::AsRawFd;
use std::path::Path;

use evdev::Device;

use super::{key_event_from_raw, KeySource, PollOutcome, SourceError};

/// Key source backed by one grabbed evdev device.
///
/// The device is grabbed on open so the original key events do not reach
/// the rest of the system, and ungrabbed on `release` or drop.
pub struct DeviceSource {
    device: Device,
    name: String,
    grabbed: bool,
}

impl DeviceSource {
    /// Open and grab the device at `path` (e.g. `/dev/input/event3`).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let device = Device::open(path).map_err(|e| {
            SourceError::Device(format!("cannot open {}: {}", path.display(), e))
        })?;
        Self::from_device(device)
    }

    /// Grab an already opened device.
    pub fn from_device(mut device: Device) -> Result<Self, SourceError> {
        let name = device.name().unwrap_or("Unknown").to_string();

        // A previous instance may have crashed while holding the grab.
        let _ = device.ungrab();
        device.grab()?;
        log::info!("Grabbed input device '{}'", name);

        Ok(Self {
            device,
            name,
            grabbed: true,
        })
    }

    /// Device name as reported by the kernel
    pub fn name(&self) -> &str {
        &self.name
    }

    fn ungrab(&mut self) {
        if self.grabbed {
            if let Err(e) = self.device.ungrab() {
                log::warn!("Failed to ungrab '{}': {}", self.name, e);
            }
            self.grabbed = false;
        }
    }
}

impl KeySource for DeviceSource {
    fn poll(&mut self, timeout_ms: i32) -> Result<PollOutcome, SourceError> {
        let mut fds = [libc::pollfd {
            fd: self.device.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        }];

        let poll_result = unsafe { libc::poll(fds.as_mut_ptr(), 1, timeout_ms) };

        if poll_result < 0 {
            let err = io::Error::last_os_error();
            // A signal (e.g. SIGINT) interrupted the wait; the runner
            // re-checks its running flag.
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(PollOutcome::Events(Vec::new()));
            }
            return Err(SourceError::Io(err));
        }

        if poll_result == 0 {
            return Ok(PollOutcome::Events(Vec::new()));
        }

        let revents = fds[0].revents;
        if revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
            return Err(SourceError::Device(format!(
                "input device '{}' disconnected",
                self.name
            )));
        }

        let mut events = Vec::new();
        if revents & libc::POLLIN != 0 {
            match self.device.fetch_events() {
                Ok(raw_events) => {
                    events.extend(raw_events.filter_map(|e| {
                        key_event_from_raw(e.event_type().0, e.code(), e.value())
                    }));
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(SourceError::Io(e)),
            }
        }

        Ok(PollOutcome::Events(events))
    }

    fn release(&mut self) {
        self.ungrab();
        log::info!("Released input device '{}'", self.name);
    }
}

/// Ungrab on drop so the keyboard is never left captured, even when the
/// runner unwinds from a panic.
impl Drop for DeviceSource {
    fn drop(&mut self) {
        self.ungrab();
    }
}
