//! # ShadowSync Core
//!
//! Embedded device-state synchronization: mirrors a small set of local
//! variables into a compact CBOR representation for a remote
//! counterpart, and applies permissioned inbound updates back to those
//! variables.
//!
//! The run-loop surface is two calls on [`DeviceShadow`]:
//! - [`DeviceShadow::poll`] — which local values changed enough to
//!   report? Encodes them and returns outbound bytes.
//! - [`DeviceShadow::decode`] — how does an incoming update reach the
//!   right local variable? Resolves, permission-checks, and applies.
//!
//! Each synchronized [`Property`] keeps a *shadow value*: the last
//! value known to be in sync with the remote side, used as the diff
//! baseline. Per-property policy decides when a difference is worth
//! reporting — on-change with an optional delta threshold, or on a
//! fixed period regardless of change.
//!
//! ```
//! use shadowsync_core::{DeviceShadow, Var};
//!
//! let temperature = Var::new(20i64);
//! let mut shadow = DeviceShadow::new();
//! shadow.add_property(&temperature, "temperature")?;
//!
//! let mut buf = [0u8; 128];
//! assert_eq!(shadow.poll(&mut buf)?, 0); // in sync at registration
//!
//! temperature.set(21);
//! let n = shadow.poll(&mut buf)?;
//! assert!(n > 0); // [{"n": "temperature", "v": 21}]
//! # Ok::<(), shadowsync_core::ShadowError>(())
//! ```
//!
//! Single-threaded and allocation-light by design; see the crate's
//! type docs for the caller obligations around concurrent mutation.

mod bind;
mod clock;
mod error;
mod property;
mod registry;
mod shadow;

pub use bind::{Binding, Var};
pub use clock::{Clock, SystemClock};
pub use error::{ShadowError, ShadowResult};
pub use property::{Permission, Property, UpdatePolicy};
pub use registry::{PropertySlot, Registry, TagAllocator};
pub use shadow::{DeviceShadow, DeviceShadowBuilder};

pub use shadowsync_codec::{Kind, Value};
