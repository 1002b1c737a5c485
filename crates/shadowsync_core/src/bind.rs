//! Bindings between properties and application-owned variables.

use std::cell::RefCell;
use std::rc::Rc;

use shadowsync_codec::{Kind, Value};

/// A shared handle to an application-owned variable.
///
/// The application creates the `Var`, keeps a clone, and hands the
/// other clone to [`DeviceShadow::add_property`]. Both sides then see
/// the same storage: the control loop mutates through its handle, the
/// sync layer observes and (for writable properties) updates through
/// its own.
///
/// Handles are `Rc`-based and single-threaded; the sync layer is
/// cooperative and non-reentrant, so a variable must not be mutated
/// from an interrupt or another thread concurrently with `poll()`.
///
/// [`DeviceShadow::add_property`]: crate::DeviceShadow::add_property
#[derive(Debug, Default)]
pub struct Var<T> {
    inner: Rc<RefCell<T>>,
}

impl<T> Var<T> {
    /// Create a new variable with the given initial value.
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(initial)),
        }
    }

    /// Replace the stored value.
    pub fn set(&self, value: T) {
        *self.inner.borrow_mut() = value;
    }
}

impl<T: Clone> Var<T> {
    /// Copy the stored value out.
    pub fn get(&self) -> T {
        self.inner.borrow().clone()
    }
}

impl<T> Clone for Var<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// A property's connection to its local variable, closed over the
/// supported value kinds.
#[derive(Debug, Clone)]
pub enum Binding {
    /// Integer variable.
    Int(Var<i64>),
    /// Boolean variable.
    Bool(Var<bool>),
    /// Floating-point variable.
    Float(Var<f64>),
    /// Text variable.
    Text(Var<String>),
}

impl Binding {
    /// The kind of value this binding carries.
    pub fn kind(&self) -> Kind {
        match self {
            Binding::Int(_) => Kind::Int,
            Binding::Bool(_) => Kind::Bool,
            Binding::Float(_) => Kind::Float,
            Binding::Text(_) => Kind::Text,
        }
    }

    /// Read the current value of the bound variable.
    pub fn load(&self) -> Value {
        match self {
            Binding::Int(v) => Value::Int(v.get()),
            Binding::Bool(v) => Value::Bool(v.get()),
            Binding::Float(v) => Value::Float(v.get()),
            Binding::Text(v) => Value::Text(v.get()),
        }
    }

    /// Write a value into the bound variable.
    ///
    /// Returns `false` without storing anything when the value's kind
    /// does not match. One coercion is accepted: an integer stores
    /// into a float binding, since remote encoders commonly send a
    /// whole float as an integer.
    pub fn store(&self, value: &Value) -> bool {
        match (self, value) {
            (Binding::Int(v), Value::Int(n)) => v.set(*n),
            (Binding::Bool(v), Value::Bool(b)) => v.set(*b),
            (Binding::Float(v), Value::Float(x)) => v.set(*x),
            #[allow(clippy::cast_precision_loss)]
            (Binding::Float(v), Value::Int(n)) => v.set(*n as f64),
            (Binding::Text(v), Value::Text(s)) => v.set(s.clone()),
            _ => return false,
        }
        true
    }
}

impl From<&Var<i64>> for Binding {
    fn from(var: &Var<i64>) -> Self {
        Binding::Int(var.clone())
    }
}

impl From<&Var<bool>> for Binding {
    fn from(var: &Var<bool>) -> Self {
        Binding::Bool(var.clone())
    }
}

impl From<&Var<f64>> for Binding {
    fn from(var: &Var<f64>) -> Self {
        Binding::Float(var.clone())
    }
}

impl From<&Var<String>> for Binding {
    fn from(var: &Var<String>) -> Self {
        Binding::Text(var.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_share_storage() {
        let a = Var::new(1i64);
        let b = a.clone();
        b.set(5);
        assert_eq!(a.get(), 5);
    }

    #[test]
    fn store_checks_kind() {
        let var = Var::new(false);
        let binding = Binding::Bool(var.clone());
        assert!(binding.store(&Value::Bool(true)));
        assert!(var.get());
        assert!(!binding.store(&Value::Int(1)));
        assert!(var.get());
    }

    #[test]
    fn int_coerces_into_float_binding() {
        let var = Var::new(0.0f64);
        let binding = Binding::Float(var.clone());
        assert!(binding.store(&Value::Int(21)));
        assert_eq!(var.get(), 21.0);
    }

    #[test]
    fn load_reflects_application_writes() {
        let var = Var::new(String::from("idle"));
        let binding = Binding::from(&var);
        var.set(String::from("heating"));
        assert_eq!(binding.load(), Value::Text("heating".to_string()));
    }
}
