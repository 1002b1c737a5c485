//! Proptest strategies for wire scalars and property names.

use proptest::prelude::*;
use shadowsync_codec::Value;

/// Any wire scalar. Floats are drawn finite so equality assertions in
/// round-trip tests stay meaningful.
pub fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        finite_float().prop_map(Value::Float),
        "[a-zA-Z0-9 _-]{0,32}".prop_map(Value::Text),
    ]
}

/// A finite f64.
pub fn finite_float() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("finite floats only", |x| x.is_finite())
}

/// A plausible property name: short, non-empty, identifier-like.
pub fn property_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}"
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn names_are_never_empty(name in property_name()) {
            prop_assert!(!name.is_empty());
        }

        #[test]
        fn floats_are_finite(x in finite_float()) {
            prop_assert!(x.is_finite());
        }
    }
}
