//! The device shadow: registration façade, encode path, decode path.

use std::fmt;

use shadowsync_codec::{CborReader, CborWriter};
use tracing::debug;

use crate::bind::Binding;
use crate::clock::{Clock, SystemClock};
use crate::error::{ShadowError, ShadowResult};
use crate::property::{Property, KEY_NAME, KEY_TAG, KEY_VALUE};
use crate::registry::{PropertySlot, Registry, TagAllocator};

/// The device-state synchronization layer.
///
/// A `DeviceShadow` mirrors a set of application variables into a
/// compact CBOR sequence for a remote counterpart. The application
/// registers properties once at startup, then drives the run loop:
/// [`poll`] answers "which values changed enough to report" and
/// produces outbound bytes; [`decode`] applies inbound bytes as
/// permissioned writes to the bound variables.
///
/// Single-threaded and non-reentrant: both calls run to completion,
/// perform no I/O, and allocate only for the scratch encode buffer.
///
/// [`poll`]: DeviceShadow::poll
/// [`decode`]: DeviceShadow::decode
pub struct DeviceShadow {
    registry: Registry,
    clock: Box<dyn Clock>,
}

impl DeviceShadow {
    /// Create a shadow with the system clock and name-keyed wire
    /// identifiers.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring a shadow.
    pub fn builder() -> DeviceShadowBuilder {
        DeviceShadowBuilder::default()
    }

    /// Register a variable as a synchronized property.
    ///
    /// Defaults: READWRITE permission, on-change policy, zero delta
    /// threshold, no callback. The returned [`PropertySlot`] refines
    /// those fluently:
    ///
    /// ```
    /// use std::time::Duration;
    /// use shadowsync_core::{DeviceShadow, Permission, Var};
    ///
    /// let temperature = Var::new(21.5f64);
    /// let mut shadow = DeviceShadow::new();
    /// shadow
    ///     .add_property(&temperature, "temperature")?
    ///     .permission(Permission::Read)
    ///     .min_delta(0.5)
    ///     .publish_every(Duration::from_secs(60));
    /// # Ok::<(), shadowsync_core::ShadowError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// [`ShadowError::EmptyName`], [`ShadowError::DuplicateName`].
    pub fn add_property(
        &mut self,
        binding: impl Into<Binding>,
        name: impl Into<String>,
    ) -> ShadowResult<PropertySlot<'_>> {
        let index = self.registry.add(binding.into(), name.into())?;
        Ok(PropertySlot::new(&mut self.registry, index))
    }

    /// Encode all dirty, readable properties into `buf`.
    ///
    /// Returns the number of bytes written, or `Ok(0)` when nothing is
    /// due — the caller should skip transmission and `buf` is left
    /// untouched. Each encoded property's shadow and report timestamp
    /// are committed, so an unchanged value is reported at most once
    /// per change (or once per period for periodic properties).
    ///
    /// # Errors
    ///
    /// [`ShadowError::BufferTooSmall`] when the encoded sequence does
    /// not fit. Nothing is written and nothing is committed: the same
    /// set stays dirty and a retry with a larger buffer succeeds.
    pub fn poll(&mut self, buf: &mut [u8]) -> ShadowResult<usize> {
        let now = self.clock.now_ms();
        let due: Vec<usize> = (0..self.registry.len())
            .filter(|&i| {
                let p = self.registry.get(i);
                p.can_read() && p.should_be_updated(now)
            })
            .collect();

        if due.is_empty() {
            return Ok(0);
        }

        let mut writer = CborWriter::with_capacity(buf.len().min(1024));
        writer.array(due.len() as u64);
        for &i in &due {
            self.registry.get(i).encode_into(&mut writer);
        }

        let bytes = writer.into_bytes();
        if bytes.len() > buf.len() {
            return Err(ShadowError::BufferTooSmall {
                needed: bytes.len(),
                capacity: buf.len(),
            });
        }
        buf[..bytes.len()].copy_from_slice(&bytes);

        for &i in &due {
            let p = self.registry.get_mut(i);
            p.update_shadow();
            p.mark_reported(now);
        }

        debug!(properties = due.len(), bytes = bytes.len(), "poll encoded");
        Ok(bytes.len())
    }

    /// Apply an inbound wire sequence to the registered properties.
    ///
    /// Each entry resolves tag-first, then by name. Unresolved
    /// identifiers, writes to non-writable properties, and kind
    /// mismatches skip that entry (with a debug event) and continue —
    /// routine sync noise must not stop the control loop. An accepted
    /// write moves the property's shadow too, so it does not echo
    /// straight back out of the next [`poll`], and fires its callback
    /// once.
    ///
    /// Returns the number of writes applied.
    ///
    /// # Errors
    ///
    /// [`ShadowError::Codec`] on a structurally malformed payload.
    /// Entries applied before the failure point remain applied.
    ///
    /// [`poll`]: DeviceShadow::poll
    pub fn decode(&mut self, payload: &[u8]) -> ShadowResult<usize> {
        let mut reader = CborReader::new(payload);
        let entries = reader.array_header()?;
        let mut applied = 0usize;

        for _ in 0..entries {
            let pairs = reader.map_header()?;
            if pairs != 2 {
                return Err(ShadowError::Codec(
                    shadowsync_codec::CodecError::invalid_structure(format!(
                        "property entry must be a 2-entry map, got {pairs}"
                    )),
                ));
            }

            let key = reader.text()?;
            let ident = match key.as_str() {
                KEY_TAG => Ident::Tag(reader.int()?),
                KEY_NAME => Ident::Name(reader.text()?),
                other => {
                    return Err(ShadowError::Codec(
                        shadowsync_codec::CodecError::invalid_structure(format!(
                            "unknown identifier key {other:?}"
                        )),
                    ))
                }
            };

            let value_key = reader.text()?;
            if value_key != KEY_VALUE {
                return Err(ShadowError::Codec(
                    shadowsync_codec::CodecError::invalid_structure(format!(
                        "expected value key, got {value_key:?}"
                    )),
                ));
            }
            let value = reader.value()?;

            let Some(index) = self.resolve(&ident) else {
                debug!(ident = %ident, "no matching property, entry skipped");
                continue;
            };

            let property = self.registry.get_mut(index);
            if !property.can_write() {
                debug!(name = property.name(), "property not writable, entry skipped");
                continue;
            }
            match property.apply_remote(&value) {
                Ok(()) => applied += 1,
                Err(ShadowError::KindMismatch { name, expected, got }) => {
                    debug!(%name, %expected, %got, "kind mismatch, entry skipped");
                }
                Err(e) => return Err(e),
            }
        }

        debug!(entries, applied, "decode finished");
        Ok(applied)
    }

    /// Write one diagnostic line per property (name, value, shadow,
    /// permission) to a text sink. Not part of the wire protocol.
    pub fn dump(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        for property in self.registry.iter() {
            writeln!(out, "{property}")?;
        }
        Ok(())
    }

    /// Find a property by name.
    pub fn find_by_name(&self, name: &str) -> Option<&Property> {
        self.registry.find_by_name(name)
    }

    /// Find a property by wire tag.
    pub fn find_by_tag(&self, tag: u32) -> Option<&Property> {
        self.registry.find_by_tag(tag)
    }

    /// Number of registered properties.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// True if no property is registered.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    fn resolve(&self, ident: &Ident) -> Option<usize> {
        match ident {
            Ident::Tag(tag) => u32::try_from(*tag)
                .ok()
                .and_then(|t| self.registry.position_by_tag(t)),
            Ident::Name(name) => self.registry.position_by_name(name),
        }
    }
}

impl Default for DeviceShadow {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DeviceShadow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceShadow")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Configures a [`DeviceShadow`] before first use.
#[derive(Default)]
pub struct DeviceShadowBuilder {
    clock: Option<Box<dyn Clock>>,
    tags: Option<TagAllocator>,
}

impl DeviceShadowBuilder {
    /// Use a custom time source (tests inject a manual clock here).
    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Assign wire tags to every registered property, drawn from
    /// `allocator` in registration order. Without this, properties are
    /// name-keyed on the wire.
    #[must_use]
    pub fn tag_allocator(mut self, allocator: TagAllocator) -> Self {
        self.tags = Some(allocator);
        self
    }

    /// Build the shadow.
    pub fn build(self) -> DeviceShadow {
        DeviceShadow {
            registry: match self.tags {
                Some(allocator) => Registry::with_tags(allocator),
                None => Registry::new(),
            },
            clock: self
                .clock
                .unwrap_or_else(|| Box::new(SystemClock::new())),
        }
    }
}

impl fmt::Debug for DeviceShadowBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceShadowBuilder")
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// Wire identifier of one decoded entry.
enum Ident {
    Tag(i64),
    Name(String),
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ident::Tag(tag) => write!(f, "tag {tag}"),
            Ident::Name(name) => write!(f, "name {name:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::Var;
    use crate::property::Permission;

    #[test]
    fn poll_with_nothing_dirty_returns_zero() {
        let var = Var::new(3i64);
        let mut shadow = DeviceShadow::new();
        shadow.add_property(&var, "x").unwrap();

        let mut buf = [0u8; 64];
        // Registration seeds the shadow from the current value
        assert_eq!(shadow.poll(&mut buf).unwrap(), 0);
    }

    #[test]
    fn buffer_too_small_commits_nothing() {
        let var = Var::new(0i64);
        let mut shadow = DeviceShadow::new();
        shadow.add_property(&var, "a_rather_long_property_name").unwrap();
        var.set(1);

        let mut tiny = [0u8; 4];
        assert!(matches!(
            shadow.poll(&mut tiny),
            Err(ShadowError::BufferTooSmall { .. })
        ));

        // Still dirty: the retry with enough room encodes it
        let mut buf = [0u8; 64];
        assert!(shadow.poll(&mut buf).unwrap() > 0);
    }

    #[test]
    fn dump_lists_every_property() {
        let a = Var::new(1i64);
        let b = Var::new(true);
        let mut shadow = DeviceShadow::new();
        shadow.add_property(&a, "a").unwrap();
        shadow
            .add_property(&b, "b")
            .unwrap()
            .permission(Permission::Read);

        let mut out = String::new();
        shadow.dump(&mut out).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("name: a"));
        assert!(lines[1].contains("permission: r"));
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let mut shadow = DeviceShadow::new();
        let var = Var::new(0i64);
        shadow.add_property(&var, "x").unwrap();
        assert!(shadow.decode(&[0xff, 0x00]).is_err());
    }
}
