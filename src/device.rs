//! The evdev device handle.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::caps::{CapabilityMap, probe_capabilities};
use crate::error::{GrabError, OpenError, ReadError};
use crate::event::{EVENT_BATCH, EVENT_SIZE, InputEvent, decode_events};
use crate::sys;

/// Capacity of the fixed string ioctl buffers (name, phys, uniq).
const NAME_CAPACITY: usize = 256;

/// Hardware identity reported by the kernel (`struct input_id`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceId {
    /// Bus the device hangs off (USB, Bluetooth, ...).
    pub bus_type: u16,
    /// Vendor identifier.
    pub vendor: u16,
    /// Product identifier.
    pub product: u16,
    /// Hardware revision.
    pub version: u16,
}

/// Absolute axis calibration (`struct input_absinfo`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AbsInfo {
    /// Current axis value.
    pub value: i32,
    /// Lower bound of the axis range.
    pub minimum: i32,
    /// Upper bound of the axis range.
    pub maximum: i32,
    /// Noise the kernel filters off the value.
    pub fuzz: i32,
    /// Dead-zone size around the center position.
    pub flat: i32,
    /// Units per millimeter, or per radian for rotational axes.
    pub resolution: i32,
}

/// An open evdev device node.
///
/// Identity and capabilities are discovered once when the device is
/// opened and are immutable afterwards. The handle exclusively owns
/// the underlying file. It performs no internal locking: sharing one
/// handle across threads needs external synchronization, while
/// separate handles are fully independent. All I/O blocks the calling
/// thread until the kernel responds.
#[derive(Debug)]
pub struct Device {
    path: PathBuf,
    file: Option<File>,
    name: String,
    phys: String,
    uniq: String,
    id: DeviceId,
    driver_version: i32,
    capabilities: CapabilityMap,
}

impl Device {
    /// Opens the device node read-only and discovers its identity and
    /// capabilities.
    ///
    /// The protocol-version, hardware-id and name queries are
    /// mandatory; a failure in any of them fails the open, and no
    /// partially-initialized handle is returned. The physical-topology
    /// and unique-id queries are allowed to fail, since not every
    /// device exposes them; the field is left empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Device, OpenError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => OpenError::NotFound(path.display().to_string()),
            io::ErrorKind::PermissionDenied => {
                OpenError::PermissionDenied(path.display().to_string())
            }
            _ => OpenError::Io(e),
        })?;
        let fd = file.as_raw_fd();

        let mut driver_version: libc::c_int = 0;
        sys::ioctl(
            fd,
            sys::EVIOCGVERSION,
            (&mut driver_version as *mut libc::c_int).cast(),
        )
        .map_err(OpenError::Identity)?;

        let mut id = DeviceId::default();
        sys::ioctl(fd, sys::EVIOCGID, (&mut id as *mut DeviceId).cast())
            .map_err(OpenError::Identity)?;

        let mut name_buf = [0u8; NAME_CAPACITY];
        sys::ioctl(
            fd,
            sys::eviocgname(name_buf.len()),
            name_buf.as_mut_ptr().cast(),
        )
        .map_err(OpenError::Identity)?;
        let name = fixed_buf_to_string(&name_buf);

        // Not every device has a physical topology or a serial string.
        let mut phys_buf = [0u8; NAME_CAPACITY];
        let phys = match sys::ioctl(
            fd,
            sys::eviocgphys(phys_buf.len()),
            phys_buf.as_mut_ptr().cast(),
        ) {
            Ok(()) => fixed_buf_to_string(&phys_buf),
            Err(_) => String::new(),
        };

        let mut uniq_buf = [0u8; NAME_CAPACITY];
        let uniq = match sys::ioctl(
            fd,
            sys::eviocguniq(uniq_buf.len()),
            uniq_buf.as_mut_ptr().cast(),
        ) {
            Ok(()) => fixed_buf_to_string(&uniq_buf),
            Err(_) => String::new(),
        };

        let capabilities = probe_capabilities(fd).map_err(OpenError::Capability)?;

        log::debug!("opened {} ({name})", path.display());

        Ok(Device {
            path,
            file: Some(file),
            name,
            phys,
            uniq,
            id,
            driver_version,
            capabilities,
        })
    }

    /// Filesystem path this handle was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Device name reported by the kernel.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical topology string; empty when the device has none.
    pub fn phys(&self) -> &str {
        &self.phys
    }

    /// Unique identifier (serial); empty when the device has none.
    pub fn uniq(&self) -> &str {
        &self.uniq
    }

    /// Hardware identity: bus, vendor, product, version.
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// evdev protocol version the driver speaks.
    pub fn driver_version(&self) -> i32 {
        self.driver_version
    }

    /// Supported event types and codes, discovered at open time.
    pub fn capabilities(&self) -> &CapabilityMap {
        &self.capabilities
    }

    fn fd(&self) -> Option<RawFd> {
        self.file.as_ref().map(|f| f.as_raw_fd())
    }

    /// Key repeat settings as `(rate, delay_ms)`.
    ///
    /// Devices without key repeat fail the query; that reads as
    /// `(0, 0)` rather than an error.
    pub fn repeat_rate(&self) -> (u32, u32) {
        let mut rep = [0u32; 2];
        if let Some(fd) = self.fd() {
            let _ = sys::ioctl(fd, sys::EVIOCGREP, rep.as_mut_ptr().cast());
        }
        (rep[0], rep[1])
    }

    /// Requests new key repeat settings.
    ///
    /// Best-effort: a device without key repeat ignores the request.
    pub fn set_repeat_rate(&self, rate: u32, delay_ms: u32) {
        let mut rep = [rate, delay_ms];
        if let Some(fd) = self.fd() {
            let _ = sys::ioctl(fd, sys::EVIOCSREP, rep.as_mut_ptr().cast());
        }
    }

    /// Absolute axis calibration for `axis` (an `ABS_*` code).
    pub fn abs_info(&self, axis: u16) -> Result<AbsInfo, ReadError> {
        let fd = self.fd().ok_or(ReadError::Closed)?;
        let mut info = AbsInfo::default();
        sys::ioctl(fd, sys::eviocgabs(axis), (&mut info as *mut AbsInfo).cast())?;
        Ok(info)
    }

    /// Requests exclusive access: while the grab is held, no other
    /// client receives this device's events.
    pub fn grab(&self) -> Result<(), GrabError> {
        self.grab_flag(1)
    }

    /// Releases a previously acquired grab.
    ///
    /// Releasing a grab this handle does not hold is left to the
    /// kernel to judge; the result is surfaced, not masked.
    pub fn release(&self) -> Result<(), GrabError> {
        self.grab_flag(0)
    }

    fn grab_flag(&self, flag: usize) -> Result<(), GrabError> {
        let fd = self.fd().ok_or(GrabError::Closed)?;
        // EVIOCGRAB carries the flag in the argument word itself.
        match sys::ioctl(fd, sys::EVIOCGRAB, flag as *mut libc::c_void) {
            Ok(()) => Ok(()),
            Err(e) if e.raw_os_error() == Some(libc::EBUSY) => Err(GrabError::AlreadyGrabbed),
            Err(e) if e.raw_os_error() == Some(libc::EINVAL) => Err(GrabError::Unsupported),
            Err(e) => Err(GrabError::Io(e)),
        }
    }

    /// Reads one batch of events, blocking until the device produces
    /// data.
    ///
    /// The zero-initialized tail of the batch buffer is trimmed by the
    /// zero-seconds rule described at [`decode_events`]; an event
    /// genuinely timestamped at second zero is dropped with it.
    pub fn read(&self) -> Result<Vec<InputEvent>, ReadError> {
        let mut file = self.file.as_ref().ok_or(ReadError::Closed)?;
        let mut buf = [0u8; EVENT_SIZE * EVENT_BATCH];
        let n = file.read(&mut buf)?;
        if n == 0 {
            return Err(ReadError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "event stream ended",
            )));
        }
        if n % EVENT_SIZE != 0 {
            return Err(ReadError::Decode { len: n });
        }
        decode_events(&buf)
    }

    /// Reads exactly one event, without the batch truncation rule.
    pub fn read_one(&self) -> Result<InputEvent, ReadError> {
        let mut file = self.file.as_ref().ok_or(ReadError::Closed)?;
        let mut buf = [0u8; EVENT_SIZE];
        let n = file.read(&mut buf)?;
        if n == 0 {
            return Err(ReadError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "event stream ended",
            )));
        }
        if n != EVENT_SIZE {
            return Err(ReadError::Decode { len: n });
        }
        Ok(InputEvent::from_bytes(&buf))
    }

    /// Releases the underlying file.
    ///
    /// Further reads and grabs on this handle report `Closed`.
    /// Dropping the handle closes it as well; calling `close` twice is
    /// a no-op.
    pub fn close(&mut self) {
        self.file.take();
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fd = self.fd().unwrap_or(-1);
        let types: Vec<String> = self
            .capabilities
            .keys()
            .map(|t| format!("{} {}", t.name, t.kind))
            .collect();
        write!(
            f,
            "InputDevice {} (fd {})\n  name {}\n  phys {}\n  uniq {}\n  \
             bus 0x{:04x}, vendor 0x{:04x}, product 0x{:04x}, version 0x{:04x}\n  \
             events {}",
            self.path.display(),
            fd,
            self.name,
            self.phys,
            self.uniq,
            self.id.bus_type,
            self.id.vendor,
            self.id.product,
            self.id.version,
            types.join(", ")
        )
    }
}

/// Decodes a fixed-capacity ioctl string buffer: everything up to the
/// first NUL, or the whole buffer when no terminator is present.
fn fixed_buf_to_string(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn open_missing_node_reports_not_found() {
        let err = Device::open("/definitely/not/a/device/node").unwrap_err();
        assert!(matches!(err, OpenError::NotFound(_)));
    }

    #[test]
    fn open_non_evdev_file_fails_the_identity_query() {
        let path = std::env::temp_dir().join(format!("evmon-plain-{}", std::process::id()));
        fs::write(&path, b"not a device").unwrap();

        let err = Device::open(&path).unwrap_err();
        assert!(matches!(err, OpenError::Identity(_)));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn string_buffers_stop_at_the_first_nul() {
        assert_eq!(fixed_buf_to_string(b"gamepad\0\0\0junk"), "gamepad");
        assert_eq!(fixed_buf_to_string(b"\0"), "");
    }

    #[test]
    fn string_buffer_without_terminator_is_taken_whole() {
        assert_eq!(fixed_buf_to_string(b"abc"), "abc");
    }
}
