//! Resolved argument values.
//!
//! Resolvers produce `Value`s (type-erased, cheap to clone). The pipeline
//! collects them into `Arguments`, which handlers read with typed getters.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A resolved, type-erased parameter value.
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Rust type name of the wrapped value (diagnostics only).
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// True when both handles point at the same allocation.
    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.downcast_ref::<String>() {
            write!(f, "Value({s:?})")
        } else if let Some(n) = self.downcast_ref::<i64>() {
            write!(f, "Value({n})")
        } else if let Some(n) = self.downcast_ref::<f64>() {
            write!(f, "Value({n})")
        } else if let Some(b) = self.downcast_ref::<bool>() {
            write!(f, "Value({b})")
        } else {
            write!(f, "Value(<{}>)", self.type_name)
        }
    }
}

/// How a parameter ended up bound.
#[derive(Debug, Clone)]
pub enum BoundValue {
    Single(Value),
    /// Variadic parameters, in token order.
    Many(Vec<Value>),
    /// Optional parameter with no input and no default.
    Absent,
}

impl BoundValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, BoundValue::Absent)
    }

    /// Iterate the values in this binding (zero, one or many).
    pub fn values(&self) -> &[Value] {
        match self {
            BoundValue::Single(v) => std::slice::from_ref(v),
            BoundValue::Many(vs) => vs,
            BoundValue::Absent => &[],
        }
    }
}

/// Ordered parameter bindings for one invocation. Order is declaration order.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    entries: Vec<(String, BoundValue)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bind(&mut self, name: &str, value: BoundValue) {
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name.to_string(), value));
        }
    }

    pub fn bound(&self, name: &str) -> Option<&BoundValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// The single value bound to `name` (not variadic bindings).
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.bound(name)? {
            BoundValue::Single(v) => Some(v),
            _ => None,
        }
    }

    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.value(name)?.downcast_ref::<T>()
    }

    /// Every value bound to `name` that has type `T`, in order.
    pub fn get_many<T: Any>(&self, name: &str) -> Vec<&T> {
        self.bound(name)
            .map(|b| b.values().iter().filter_map(|v| v.downcast_ref::<T>()).collect())
            .unwrap_or_default()
    }

    /// Convenience for switch flags; absent or non-bool reads as `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.get::<bool>(name).copied().unwrap_or(false)
    }

    /// True when `name` is bound to something other than `Absent`.
    pub fn is_present(&self, name: &str) -> bool {
        self.bound(name).is_some_and(|b| !b.is_absent())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters() {
        let mut args = Arguments::new();
        args.bind("count", BoundValue::Single(Value::new(3i64)));
        args.bind(
            "words",
            BoundValue::Many(vec![Value::new("a".to_string()), Value::new("b".to_string())]),
        );
        args.bind("reason", BoundValue::Absent);

        assert_eq!(args.get::<i64>("count"), Some(&3));
        assert_eq!(args.get::<String>("count"), None);
        assert_eq!(args.get_many::<String>("words"), vec!["a", "b"]);
        assert!(!args.is_present("reason"));
        assert!(!args.flag("missing"));
        assert_eq!(args.names().collect::<Vec<_>>(), vec!["count", "words", "reason"]);
    }

    #[test]
    fn clones_share_allocation() {
        let v = Value::new(String::from("x"));
        let w = v.clone();
        assert!(Value::ptr_eq(&v, &w));
        assert!(!Value::ptr_eq(&v, &Value::new(String::from("x"))));
    }
}
