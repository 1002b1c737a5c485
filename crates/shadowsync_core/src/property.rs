//! The synchronized property type and its change-detection policy.

use std::fmt;
use std::time::Duration;

use shadowsync_codec::{CborWriter, Value};

use crate::bind::Binding;
use crate::error::{ShadowError, ShadowResult};

/// Wire key for a tag identifier.
pub(crate) const KEY_TAG: &str = "t";
/// Wire key for a name identifier.
pub(crate) const KEY_NAME: &str = "n";
/// Wire key for the value entry.
pub(crate) const KEY_VALUE: &str = "v";

/// Access permission for a property, from the cloud's perspective.
///
/// READ means the device may report the value outward; WRITE means
/// the device accepts inbound updates to it. Set once at registration
/// and immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Cloud may read; the device reports, never accepts writes.
    Read,
    /// Cloud may write; the device accepts writes, never reports.
    Write,
    /// Both directions.
    ReadWrite,
}

impl Permission {
    /// Whether this property may be reported outward.
    pub fn can_read(self) -> bool {
        matches!(self, Permission::Read | Permission::ReadWrite)
    }

    /// Whether this property accepts inbound writes.
    pub fn can_write(self) -> bool {
        matches!(self, Permission::Write | Permission::ReadWrite)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Permission::Read => "r",
            Permission::Write => "w",
            Permission::ReadWrite => "rw",
        };
        f.write_str(s)
    }
}

/// When a property should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// Report when the value crosses the delta threshold.
    OnChange,
    /// Report on a fixed interval regardless of value change.
    Every(Duration),
}

/// One synchronized value: a bound local variable, its shadow copy,
/// and the policy deciding when the difference is worth reporting.
///
/// The shadow is the last value known to be in sync with the remote
/// side. It moves only on a committed outbound report or an accepted
/// inbound write, never by the application.
pub struct Property {
    name: String,
    tag: Option<u32>,
    binding: Binding,
    shadow: Value,
    permission: Permission,
    policy: UpdatePolicy,
    min_delta: f64,
    last_updated: u64,
    callback: Option<Box<dyn FnMut(&Value)>>,
}

impl Property {
    pub(crate) fn new(binding: Binding, name: String, tag: Option<u32>) -> Self {
        let shadow = binding.load();
        Self {
            name,
            tag,
            binding,
            shadow,
            permission: Permission::ReadWrite,
            policy: UpdatePolicy::OnChange,
            min_delta: 0.0,
            last_updated: 0,
            callback: None,
        }
    }

    /// The property's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wire tag, if one was assigned at registration.
    pub fn tag(&self) -> Option<u32> {
        self.tag
    }

    /// The access permission.
    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// The update policy.
    pub fn policy(&self) -> UpdatePolicy {
        self.policy
    }

    /// Whether this property may be reported outward.
    pub fn can_read(&self) -> bool {
        self.permission.can_read()
    }

    /// Whether this property accepts inbound writes.
    pub fn can_write(&self) -> bool {
        self.permission.can_write()
    }

    /// Read the current value of the bound variable.
    ///
    /// # Errors
    ///
    /// [`ShadowError::ReadDenied`] when the permission excludes READ.
    /// There is no silent default value.
    pub fn read(&self) -> ShadowResult<Value> {
        if !self.can_read() {
            return Err(ShadowError::ReadDenied {
                name: self.name.clone(),
            });
        }
        Ok(self.binding.load())
    }

    /// Write a value to the bound variable.
    ///
    /// The variable is left unmodified on any error.
    ///
    /// # Errors
    ///
    /// [`ShadowError::WriteDenied`] when the permission excludes
    /// WRITE; [`ShadowError::KindMismatch`] when the value's kind does
    /// not fit the binding.
    pub fn write(&mut self, value: &Value) -> ShadowResult<()> {
        if !self.can_write() {
            return Err(ShadowError::WriteDenied {
                name: self.name.clone(),
            });
        }
        if !self.binding.store(value) {
            return Err(ShadowError::KindMismatch {
                name: self.name.clone(),
                expected: self.binding.kind(),
                got: value.kind(),
            });
        }
        Ok(())
    }

    /// True when the value differs from the shadow significantly.
    ///
    /// Numeric kinds must differ by at least the configured delta
    /// threshold; other kinds by any difference.
    pub fn new_data(&self) -> bool {
        let value = self.binding.load();
        match (&value, &self.shadow) {
            (Value::Int(a), Value::Int(b)) => {
                #[allow(clippy::cast_precision_loss)]
                let delta = (i128::from(*a) - i128::from(*b)).unsigned_abs() as f64;
                a != b && delta >= self.min_delta
            }
            (Value::Float(a), Value::Float(b)) => a != b && (a - b).abs() >= self.min_delta,
            _ => value != self.shadow,
        }
    }

    /// The scheduling decision: is this property due for a report?
    ///
    /// ON_CHANGE properties are due exactly when [`new_data`] holds.
    /// Periodic properties are due once the period has elapsed since
    /// the last committed report, whether or not the value changed.
    ///
    /// [`new_data`]: Property::new_data
    pub fn should_be_updated(&self, now_ms: u64) -> bool {
        match self.policy {
            UpdatePolicy::OnChange => self.new_data(),
            UpdatePolicy::Every(period) => {
                now_ms.saturating_sub(self.last_updated) > period.as_millis() as u64
            }
        }
    }

    /// Set the shadow to the current value of the bound variable.
    ///
    /// Called by the encoder after a committed report and by the
    /// decoder after an accepted write; not part of the application's
    /// surface.
    pub(crate) fn update_shadow(&mut self) {
        self.shadow = self.binding.load();
    }

    pub(crate) fn mark_reported(&mut self, now_ms: u64) {
        self.last_updated = now_ms;
    }

    /// Serialize this property as its 2-entry wire map.
    ///
    /// The identifier entry is the tag when one was assigned, else the
    /// name. Writes nothing when the permission excludes READ.
    pub(crate) fn encode_into(&self, writer: &mut CborWriter) {
        if !self.can_read() {
            return;
        }
        writer.map(2);
        match self.tag {
            Some(tag) => {
                writer.text(KEY_TAG);
                writer.int(i64::from(tag));
            }
            None => {
                writer.text(KEY_NAME);
                writer.text(&self.name);
            }
        }
        writer.text(KEY_VALUE);
        writer.value(&self.binding.load());
    }

    /// Apply an accepted inbound value: store it, move the shadow so
    /// the write does not echo back outward, and fire the callback.
    pub(crate) fn apply_remote(&mut self, value: &Value) -> ShadowResult<()> {
        self.write(value)?;
        self.update_shadow();
        if let Some(callback) = self.callback.as_mut() {
            callback(&self.shadow);
        }
        Ok(())
    }

    pub(crate) fn set_permission(&mut self, permission: Permission) {
        self.permission = permission;
    }

    pub(crate) fn set_policy(&mut self, policy: UpdatePolicy) {
        self.policy = policy;
    }

    pub(crate) fn set_min_delta(&mut self, min_delta: f64) {
        self.min_delta = min_delta;
    }

    pub(crate) fn set_callback(&mut self, callback: Box<dyn FnMut(&Value)>) {
        self.callback = Some(callback);
    }

    #[cfg(test)]
    pub(crate) fn shadow(&self) -> &Value {
        &self.shadow
    }
}

/// Properties compare by name alone.
impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("shadow", &self.shadow)
            .field("permission", &self.permission)
            .field("policy", &self.policy)
            .field("min_delta", &self.min_delta)
            .field("last_updated", &self.last_updated)
            .field("callback", &self.callback.is_some())
            .finish_non_exhaustive()
    }
}

/// The diagnostic line consumed by [`DeviceShadow::dump`]; not part of
/// the wire protocol.
///
/// [`DeviceShadow::dump`]: crate::DeviceShadow::dump
impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "name: {} value: {} shadow: {} permission: {}",
            self.name,
            self.binding.load(),
            self.shadow,
            self.permission
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::Var;

    fn int_property(initial: i64) -> (Var<i64>, Property) {
        let var = Var::new(initial);
        let prop = Property::new(Binding::from(&var), "p".to_string(), None);
        (var, prop)
    }

    #[test]
    fn shadow_starts_in_sync() {
        let (_, prop) = int_property(42);
        assert!(!prop.new_data());
    }

    #[test]
    fn any_change_is_new_data_at_zero_delta() {
        let (var, prop) = int_property(10);
        var.set(11);
        assert!(prop.new_data());
    }

    #[test]
    fn min_delta_gates_small_changes() {
        let (var, mut prop) = int_property(20);
        prop.set_min_delta(2.0);
        var.set(21);
        assert!(!prop.new_data());
        var.set(22);
        assert!(prop.new_data());
    }

    #[test]
    fn float_min_delta() {
        let var = Var::new(20.0f64);
        let mut prop = Property::new(Binding::from(&var), "t".to_string(), None);
        prop.set_min_delta(0.5);
        var.set(20.4);
        assert!(!prop.new_data());
        var.set(20.5);
        assert!(prop.new_data());
    }

    #[test]
    fn text_uses_exact_inequality() {
        let var = Var::new(String::from("a"));
        let prop = Property::new(Binding::from(&var), "s".to_string(), None);
        assert!(!prop.new_data());
        var.set(String::from("b"));
        assert!(prop.new_data());
    }

    #[test]
    fn read_denied_is_explicit() {
        let (_, mut prop) = int_property(1);
        prop.set_permission(Permission::Write);
        assert!(matches!(prop.read(), Err(ShadowError::ReadDenied { .. })));
    }

    #[test]
    fn write_denied_leaves_value() {
        let (var, mut prop) = int_property(1);
        prop.set_permission(Permission::Read);
        assert!(matches!(
            prop.write(&Value::Int(9)),
            Err(ShadowError::WriteDenied { .. })
        ));
        assert_eq!(var.get(), 1);
    }

    #[test]
    fn kind_mismatch_leaves_value() {
        let (var, mut prop) = int_property(1);
        assert!(matches!(
            prop.write(&Value::Bool(true)),
            Err(ShadowError::KindMismatch { .. })
        ));
        assert_eq!(var.get(), 1);
    }

    #[test]
    fn periodic_policy_ignores_value() {
        let (_, mut prop) = int_property(5);
        prop.set_policy(UpdatePolicy::Every(Duration::from_secs(10)));
        assert!(!prop.should_be_updated(10_000));
        assert!(prop.should_be_updated(10_001));
        prop.mark_reported(10_001);
        assert!(!prop.should_be_updated(15_000));
        assert!(prop.should_be_updated(20_002));
    }

    #[test]
    fn write_only_property_encodes_nothing() {
        let (_, mut prop) = int_property(5);
        prop.set_permission(Permission::Write);
        let mut writer = CborWriter::new();
        prop.encode_into(&mut writer);
        assert!(writer.is_empty());
    }

    #[test]
    fn apply_remote_moves_shadow_and_fires_callback() {
        use std::cell::Cell;
        use std::rc::Rc;

        let (var, mut prop) = int_property(0);
        let fired = Rc::new(Cell::new(0u32));
        let fired_in_cb = Rc::clone(&fired);
        prop.set_callback(Box::new(move |_| fired_in_cb.set(fired_in_cb.get() + 1)));

        prop.apply_remote(&Value::Int(7)).unwrap();
        assert_eq!(var.get(), 7);
        assert_eq!(prop.shadow(), &Value::Int(7));
        assert_eq!(fired.get(), 1);
        // Accepted write is already in sync, no echo report
        assert!(!prop.new_data());
    }

    #[test]
    fn equality_is_by_name() {
        let (_, a) = int_property(1);
        let (_, b) = int_property(2);
        assert_eq!(a, b);
    }
}
