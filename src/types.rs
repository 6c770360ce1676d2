//! Core types - handles, keys, values and callbacks.
//!
//! These are the value types shared by every layer of the engine:
//! - [`NodeId`] - opaque handle of a live document node
//! - [`Key`] - author-supplied sibling identity
//! - [`Value`] / [`ValueMap`] - attribute, prop and state values
//! - [`Handler`] / [`RefCallback`] - callbacks compared by identity, never by behavior

use std::any::Any;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::rc::Rc;

// =============================================================================
// NodeId - Document handle
// =============================================================================

/// Handle of a node living in a [`Document`](crate::document::Document).
///
/// Handles are minted by the document backend. The engine stores them in its
/// snapshot and hands them to ref callbacks, but never interprets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a handle from a raw index.
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Raw index backing this handle.
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Key - Sibling identity
// =============================================================================

/// Identity token used to match list children across renders.
///
/// Keys only need to be unique among siblings. Duplicates are not rejected;
/// the first occurrence wins and later ones are mounted fresh.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Int(i64),
    Str(Rc<str>),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{n}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(i64::from(value))
    }
}

/// Indices past `i64::MAX` fall back to their decimal string.
impl From<usize> for Key {
    fn from(value: usize) -> Self {
        match i64::try_from(value) {
            Ok(n) => Key::Int(n),
            Err(_) => Key::Str(value.to_string().into()),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.into())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value.into())
    }
}

// =============================================================================
// Callbacks
// =============================================================================

/// Event delivered to a [`Handler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event name without the `on` prefix (e.g. `"click"`).
    pub name: String,
    /// Node the event was dispatched on.
    pub target: NodeId,
    /// Node whose handler is currently running (differs from `target` while bubbling).
    pub current_target: NodeId,
}

/// Event handler stored as an attribute value.
///
/// Two handlers are equal only if they are the same allocation. Re-creating a
/// closure on every render therefore always produces a `SetAttribute`.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Event)>);

impl Handler {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the handler.
    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0))
    }
}

/// Callback receiving the live document handle of a node.
///
/// Called with `Some(handle)` once the node is attached and with `None`
/// before the handle becomes invalid. Compared by identity like [`Handler`].
#[derive(Clone)]
pub struct RefCallback(Rc<dyn Fn(Option<NodeId>)>);

impl RefCallback {
    pub fn new(f: impl Fn(Option<NodeId>) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self, handle: Option<NodeId>) {
        (self.0)(handle)
    }
}

impl PartialEq for RefCallback {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl fmt::Debug for RefCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefCallback({:p})", Rc::as_ptr(&self.0))
    }
}

// =============================================================================
// Value - Attribute / prop / state cell
// =============================================================================

/// A single attribute, prop or state value.
///
/// Primitives compare by value; [`Value::Handler`] and [`Value::Opaque`]
/// compare by pointer identity.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Handler(Handler),
    /// Arbitrary shared data, typically used to pass domain objects as props.
    Opaque(Rc<dyn Any>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Value::Handler(h) => Some(h),
            _ => None,
        }
    }

    /// Downcast an opaque value.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(any) => any.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Wrap arbitrary data as an opaque value.
    pub fn opaque<T: Any>(value: T) -> Self {
        Value::Opaque(Rc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Handler(a), Value::Handler(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(n) => write!(f, "Float({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Handler(h) => h.fmt(f),
            Value::Opaque(any) => write!(f, "Opaque({:p})", Rc::as_ptr(any)),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value.into())
    }
}

impl From<Rc<str>> for Value {
    fn from(value: Rc<str>) -> Self {
        Value::Str(value)
    }
}

impl From<Handler> for Value {
    fn from(value: Handler) -> Self {
        Value::Handler(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

// =============================================================================
// ValueMap - Props, state and attributes
// =============================================================================

/// Ordered name → [`Value`] mapping.
///
/// Ordering is by name so attribute diffs and serialization are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap(BTreeMap<Rc<str>, Value>);

/// Props passed to a component.
pub type Props = ValueMap;

/// Component state. Patches are shallow-merged into it.
pub type State = ValueMap;

/// Attributes of an element.
pub type Attributes = ValueMap;

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Boolean field; missing or non-boolean fields read as `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Shallow merge: every field of `patch` overwrites the same-named field.
    pub fn merge(&mut self, patch: ValueMap) {
        self.0.extend(patch.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Rc<str>, Value> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|name| &**name)
    }
}

impl<'a> IntoIterator for &'a ValueMap {
    type Item = (&'a Rc<str>, &'a Value);
    type IntoIter = btree_map::Iter<'a, Rc<str>, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (name, value) in iter {
            map.insert(name.as_ref(), value);
        }
        map
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::from("a"), Value::from("a"));
        assert_ne!(Value::from(1), Value::from(1.0));
        assert_eq!(Value::from(None::<i64>), Value::Null);

        let handler = Handler::new(|_| {});
        assert_eq!(Value::from(handler.clone()), Value::from(handler));
        // Same behavior, different allocation
        assert_ne!(
            Value::from(Handler::new(|_| {})),
            Value::from(Handler::new(|_| {}))
        );
    }

    #[test]
    fn test_opaque_identity() {
        let shared = Value::opaque(vec![1, 2, 3]);
        assert_eq!(shared, shared.clone());
        assert_ne!(shared, Value::opaque(vec![1, 2, 3]));
        assert_eq!(shared.downcast_ref::<Vec<i32>>(), Some(&vec![1, 2, 3]));
    }

    #[test]
    fn test_shallow_merge() {
        let mut state = ValueMap::new().with("a", 1).with("b", "x");
        state.merge(ValueMap::new().with("b", "y").with("c", true));

        assert_eq!(state.int("a"), Some(1));
        assert_eq!(state.str("b"), Some("y"));
        assert!(state.flag("c"));
        assert_eq!(state.len(), 3);
    }

    #[test]
    fn test_ref_callback_identity() {
        let cb = RefCallback::new(|_| {});
        assert_eq!(cb, cb.clone());
        assert_ne!(cb, RefCallback::new(|_| {}));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(Key::from(7).to_string(), "7");
        assert_eq!(Key::from("row").to_string(), "row");
    }

    #[test]
    fn test_key_from_index() {
        assert_eq!(Key::from(3usize), Key::Int(3));
        let huge = usize::MAX;
        if i64::try_from(huge).is_err() {
            assert_eq!(Key::from(huge), Key::Str(huge.to_string().into()));
        }
    }
}
