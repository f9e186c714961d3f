//! # evmon
//!
//! Linux evdev device access: enumerate input device nodes, inspect
//! the event types and codes they support, and decode their raw event
//! stream into typed records.
//!
//! ## Quick Start
//!
//! ### Opening a device and streaming events
//!
//! ```no_run
//! use evmon::Device;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let device = Device::open("/dev/input/event0")?;
//!     println!("{device}");
//!     loop {
//!         for event in device.read()? {
//!             println!(
//!                 "type {} code {} value {}",
//!                 event.event_type, event.code, event.value
//!             );
//!         }
//!     }
//! }
//! ```
//!
//! ### Enumerating devices
//!
//! ```no_run
//! for device in evmon::list_devices(evmon::DEFAULT_DEVICE_GLOB)? {
//!     println!("{} ({})", device.path().display(), device.name());
//! }
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! ## Model
//!
//! All I/O is blocking: `open`, the ioctl queries and `read` hold the
//! calling thread until the kernel responds; there is no background
//! polling and no cancellation primitive. A [`Device`] owns its file
//! descriptor exclusively and performs no internal locking or retries.
//! Linux only: the crate talks straight to the evdev character-device
//! ABI.

pub mod caps;
pub mod codes;
pub mod device;
pub mod enumerate;
pub mod error;
pub mod event;

mod sys;

// Re-exports
pub use caps::{CapabilityCode, CapabilityMap, CapabilityType};
pub use device::{AbsInfo, Device, DeviceId};
pub use enumerate::{DEFAULT_DEVICE_GLOB, is_event_device, list_device_paths, list_devices};
pub use error::{GrabError, OpenError, ReadError};
pub use event::{EVENT_SIZE, InputEvent, decode_events};
