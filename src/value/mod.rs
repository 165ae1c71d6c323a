//! Type-erased, reference-counted value container.
//!
//! A [`TypedValue`] carries one value of any `'static + Send + Sync` type
//! across module and thread boundaries without compile-time type knowledge.
//! Properties, messages and conversion results all travel as `TypedValue`.
//!
//! # Ownership
//!
//! - **Clone** shares the payload and increments the reference count.
//! - **Take** ([`TypedValue::take`]) moves the payload out, leaving an empty value.
//! - **Drop** decrements the count; the payload is freed by whichever handle
//!   observes the count reaching zero.
//!
//! # Comparison
//!
//! [`TypedValue::equals`] and [`TypedValue::fallback_cmp`] first try a typed
//! comparison from the [`registry`]. When none exists for the pair of stored
//! types they compare [`TypedValue::hash_code`] instead, so two values of
//! incomparable types are equal only if their hash codes coincide. That
//! fallback is not transitive across types.
//!
//! The `Eq`/`Ord` impls (and so `==`, `<`, sorting and ordered containers)
//! use a total order instead: empty values first, then values grouped by
//! type, each type ordered by its registered comparison or by hash code.
//!
//! # Example
//!
//! ```
//! use portflow::value::TypedValue;
//!
//! let value = TypedValue::new(42i32);
//! let copy = value.clone();
//! assert_eq!(*copy.extract::<i32>().unwrap(), 42);
//! assert!(copy.extract::<String>().is_err());
//! assert_eq!(value.convert::<f64>().unwrap(), 42.0);
//! ```

pub mod registry;

use crate::error::{FlowError, Result};
use std::any::{type_name, Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

pub use registry::{
    is_comparable, register_comparison, register_conversion, register_hash, register_type,
    CompareUnsupported,
};

/// Type reported by an empty [`TypedValue`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NullValue;

/// Shared allocation: type identity plus the payload itself.
struct Container<T: ?Sized> {
    type_id: TypeId,
    type_name: &'static str,
    value: T,
}

type Payload = Container<dyn Any + Send + Sync>;

/// Type-erased, reference-counted holder for one value of any type.
#[derive(Clone, Default)]
pub struct TypedValue {
    inner: Option<Arc<Payload>>,
}

impl TypedValue {
    /// Create an empty value.
    pub const fn null() -> Self {
        Self { inner: None }
    }

    /// Wrap a value. The reference count starts at 1.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        let container: Arc<Payload> = Arc::new(Container::<T> {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            value,
        });
        Self {
            inner: Some(container),
        }
    }

    /// Construct a `T` in place from constructor arguments.
    pub fn emplace<T, A>(args: A) -> Self
    where
        T: From<A> + Any + Send + Sync,
    {
        Self::new(T::from(args))
    }

    /// Wrap `value`, unless it already is a `TypedValue`, in which case it is
    /// passed through unchanged.
    pub fn from_any<T: Any + Send + Sync>(value: T) -> Self {
        let mut slot = Some(value);
        match (&mut slot as &mut dyn Any).downcast_mut::<Option<TypedValue>>() {
            Some(already) => already.take().unwrap_or_default(),
            None => slot.map(Self::new).unwrap_or_default(),
        }
    }

    /// Move the payload out, leaving this value empty.
    pub fn take(&mut self) -> Self {
        Self {
            inner: self.inner.take(),
        }
    }

    /// True when no payload is held (the "false" state).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /// Runtime type of the payload; `NullValue` when empty.
    pub fn type_id(&self) -> TypeId {
        match &self.inner {
            Some(c) => c.type_id,
            None => TypeId::of::<NullValue>(),
        }
    }

    /// Full type name of the payload.
    pub fn type_name(&self) -> &'static str {
        match &self.inner {
            Some(c) => c.type_name,
            None => type_name::<NullValue>(),
        }
    }

    /// Short, human-readable type name (module paths stripped).
    pub fn type_string(&self) -> String {
        short_type_name(self.type_name())
    }

    /// Whether the payload is of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.type_id() == TypeId::of::<T>()
    }

    /// True iff exactly one handle references the payload.
    ///
    /// Advisory only: another thread may clone a sibling handle right after
    /// this returns.
    pub fn unique(&self) -> bool {
        self.inner
            .as_ref()
            .map(|c| Arc::strong_count(c) == 1)
            .unwrap_or(false)
    }

    /// Number of handles sharing the payload (0 when empty).
    pub fn ref_count(&self) -> usize {
        self.inner.as_ref().map(Arc::strong_count).unwrap_or(0)
    }

    /// Whether two handles share the same payload allocation.
    pub fn ptr_eq(&self, other: &TypedValue) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Borrow the payload as `T`.
    pub fn extract<T: Any>(&self) -> Result<&T> {
        self.inner
            .as_ref()
            .and_then(|c| c.value.downcast_ref::<T>())
            .ok_or_else(|| self.conversion_error::<T>())
    }

    /// Clone the payload out as `T`.
    pub fn extract_owned<T: Any + Clone>(&self) -> Result<T> {
        self.extract::<T>().cloned()
    }

    /// Convert the payload to `T`.
    ///
    /// A payload already of type `T` is cloned; otherwise a converter
    /// registered for the (stored, `T`) pair is applied.
    pub fn convert<T: Any + Clone>(&self) -> Result<T> {
        if let Ok(v) = self.extract::<T>() {
            return Ok(v.clone());
        }
        let c = self
            .inner
            .as_ref()
            .ok_or_else(|| self.conversion_error::<T>())?;
        registry::convert(c.type_id, TypeId::of::<T>(), &c.value)
            .and_then(|out| out.downcast::<T>().ok())
            .map(|out| *out)
            .ok_or_else(|| self.conversion_error::<T>())
    }

    /// Typed three-way comparison; fails when no comparison is registered.
    pub fn compare_to(
        &self,
        other: &TypedValue,
    ) -> std::result::Result<Ordering, CompareUnsupported> {
        match (&self.inner, &other.inner) {
            (None, None) => Ok(Ordering::Equal),
            (Some(a), Some(b)) => registry::compare((a.type_id, &a.value), (b.type_id, &b.value))
                .ok_or(CompareUnsupported {
                    left: a.type_name,
                    right: b.type_name,
                }),
            _ => Err(CompareUnsupported {
                left: self.type_name(),
                right: other.type_name(),
            }),
        }
    }

    /// Type-specific hash code; the payload address when no hasher is
    /// registered, 0 when empty.
    pub fn hash_code(&self) -> u64 {
        match &self.inner {
            None => 0,
            Some(c) => registry::hash(c.type_id, &c.value)
                .unwrap_or_else(|| Arc::as_ptr(c) as *const () as usize as u64),
        }
    }

    /// Typed comparison, or the hash codes of both sides when the pair of
    /// types is not comparable.
    pub fn fallback_cmp(&self, other: &TypedValue) -> Ordering {
        self.compare_to(other)
            .unwrap_or_else(|_| self.hash_code().cmp(&other.hash_code()))
    }

    /// Equality with the hash-code fallback for incomparable types.
    pub fn equals(&self, other: &TypedValue) -> bool {
        self.fallback_cmp(other) == Ordering::Equal
    }

    fn conversion_error<T: Any>(&self) -> FlowError {
        FlowError::conversion(self.type_string(), short_type_name(type_name::<T>()))
    }
}

/// Strip module paths from a type name: `alloc::vec::Vec<alloc::string::String>`
/// becomes `Vec<String>`.
fn short_type_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut segment = String::new();
    for ch in name.chars() {
        match ch {
            ':' => segment.clear(),
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';' => {
                out.push_str(&segment);
                segment.clear();
                out.push(ch);
            }
            _ => segment.push(ch),
        }
    }
    out.push_str(&segment);
    out
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TypedValue {}

impl PartialOrd for TypedValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypedValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.inner, &other.inner) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) if a.type_id == b.type_id => {
                registry::compare((a.type_id, &a.value), (b.type_id, &b.value))
                    .unwrap_or_else(|| self.hash_code().cmp(&other.hash_code()))
            }
            // Cross-type comparisons are left out to keep the order transitive.
            (Some(a), Some(b)) => a.type_id.cmp(&b.type_id),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            None => write!(f, "NullValue"),
            Some(c) => match registry::display(c.type_id, &c.value, f) {
                Some(result) => result,
                None => write!(f, "TypedValue<{}>", self.type_string()),
            },
        }
    }
}

impl fmt::Debug for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypedValue({}: {})", self.type_string(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::thread;

    /// Payload that counts how many times it has been dropped.
    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, AtomicOrdering::SeqCst);
        }
    }

    #[test]
    fn test_empty_value() {
        let v = TypedValue::default();
        assert!(v.is_empty());
        assert!(v.is::<NullValue>());
        assert!(!v.unique());
        assert_eq!(v.ref_count(), 0);
        assert_eq!(v.type_string(), "NullValue");
        assert_eq!(v, TypedValue::null());
        assert!(v.extract::<i32>().is_err());
    }

    #[test]
    fn test_extract_matching_type() {
        let v = TypedValue::new(String::from("hello"));
        assert!(!v.is_empty());
        assert_eq!(v.extract::<String>().unwrap(), "hello");
        assert_eq!(v.extract_owned::<String>().unwrap(), "hello");
    }

    #[test]
    fn test_extract_mismatch_names_both_types() {
        let v = TypedValue::new(7u16);
        match v.extract::<String>() {
            Err(FlowError::Conversion { stored, requested }) => {
                assert_eq!(stored, "u16");
                assert_eq!(requested, "String");
            }
            other => panic!("expected conversion error, got {:?}", other),
        }
    }

    #[test]
    fn test_clone_shares_payload() {
        let a = TypedValue::new(vec![1u8, 2, 3]);
        assert!(a.unique());
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(a.ref_count(), 2);
        assert!(!a.unique());
        drop(b);
        assert!(a.unique());
    }

    #[test]
    fn test_from_any_does_not_double_wrap() {
        let inner = TypedValue::new(9u8);
        let passed = TypedValue::from_any(inner.clone());
        assert!(passed.ptr_eq(&inner));
        assert!(passed.is::<u8>());

        let wrapped = TypedValue::from_any(9u8);
        assert!(wrapped.is::<u8>());
        assert!(!wrapped.ptr_eq(&inner));
    }

    #[test]
    fn test_take_leaves_source_empty() {
        let mut a = TypedValue::new(5i64);
        let b = a.take();
        assert!(a.is_empty());
        assert_eq!(*b.extract::<i64>().unwrap(), 5);
        assert!(b.unique());
    }

    #[test]
    fn test_payload_freed_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let a = TypedValue::new(DropCounter(Arc::clone(&drops)));
        let b = a.clone();
        drop(a);
        assert_eq!(drops.load(AtomicOrdering::SeqCst), 0);
        assert!(b.extract::<DropCounter>().is_ok());
        drop(b);
        assert_eq!(drops.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn test_reassignment_releases_old_payload() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut a = TypedValue::new(DropCounter(Arc::clone(&drops)));
        let same = a.clone();
        a = same;
        assert!(a.unique());
        assert_eq!(drops.load(AtomicOrdering::SeqCst), 0);
        a = TypedValue::null();
        assert!(a.is_empty());
        assert_eq!(drops.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_clone_and_drop() {
        let drops = Arc::new(AtomicUsize::new(0));
        let original = TypedValue::new(DropCounter(Arc::clone(&drops)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let copy = original.clone();
                thread::spawn(move || {
                    let copies: Vec<_> = (0..100).map(|_| copy.clone()).collect();
                    drop(copies);
                    drop(copy);
                })
            })
            .collect();
        drop(original);

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(drops.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn test_equals_is_reflexive() {
        struct Opaque;
        for v in [
            TypedValue::null(),
            TypedValue::new(1.5f32),
            TypedValue::new("text"),
            TypedValue::new(Opaque),
        ] {
            assert!(v.equals(&v));
            assert!(v.equals(&v.clone()));
        }
    }

    #[test]
    fn test_typed_ordering() {
        let a = TypedValue::new(1i32);
        let b = TypedValue::new(2i32);
        assert!(a < b);
        assert!(b > a);
        assert_eq!(a.compare_to(&b), Ok(Ordering::Less));
        assert_eq!(a, TypedValue::new(1i32));
    }

    #[test]
    fn test_incomparable_types_fall_back_to_hash() {
        let a = TypedValue::new(1i32);
        let b = TypedValue::new(String::from("1"));
        assert!(a.compare_to(&b).is_err());
        assert_eq!(a.equals(&b), a.hash_code() == b.hash_code());
        assert_eq!(a.fallback_cmp(&b), a.hash_code().cmp(&b.hash_code()));
    }

    #[test]
    fn test_mixed_types_sort_and_collect() {
        use std::collections::BTreeSet;

        struct Opaque;

        let mut values = vec![TypedValue::null()];
        for i in 0..40 {
            values.push(TypedValue::new(i as i32));
            values.push(TypedValue::new(format!("s{}", i)));
        }
        for _ in 0..5 {
            values.push(TypedValue::new(Opaque));
        }

        for shift in 0..values.len() {
            let mut rotated = values.clone();
            rotated.rotate_left(shift);
            rotated.sort();
            assert!(rotated.windows(2).all(|w| w[0] <= w[1]));
            assert!(rotated[0].is_empty());
        }

        for a in &values[..20] {
            for b in &values[..20] {
                for c in &values[..20] {
                    if a < b && b < c {
                        assert!(a < c);
                    }
                }
            }
        }

        let set: BTreeSet<TypedValue> = values.iter().cloned().collect();
        assert_eq!(set.len(), values.len());
        assert!(set.contains(&TypedValue::new(7i32)));
        assert!(set.contains(&TypedValue::new("s7".to_string())));
    }

    #[test]
    fn test_total_order_groups_by_type() {
        let ints: Vec<_> = (0..5).map(|i| TypedValue::new(i as i32)).collect();
        let text = TypedValue::new(String::from("0"));
        let first_int = ints[0].cmp(&text);
        assert!(ints.iter().all(|v| v.cmp(&text) == first_int));
        assert_ne!(first_int, Ordering::Equal);
    }

    #[test]
    fn test_equal_hash_codes_compare_equal() {
        #[derive(Hash)]
        struct Left(u32);
        #[derive(Hash)]
        struct Right(u32);

        register_hash::<Left>();
        register_hash::<Right>();

        let a = TypedValue::new(Left(7));
        let b = TypedValue::new(Right(7));
        assert!(a.compare_to(&b).is_err());
        assert_eq!(a.hash_code(), b.hash_code());
        assert!(a.equals(&b));
        // The total order still tells the two types apart.
        assert_ne!(a, b);
    }

    #[test]
    fn test_convert_numeric_and_string() {
        let v = TypedValue::new(42u32);
        assert_eq!(v.convert::<u32>().unwrap(), 42);
        assert_eq!(v.convert::<f64>().unwrap(), 42.0);
        assert_eq!(v.convert::<String>().unwrap(), "42");
        assert!(v.convert::<Vec<u8>>().is_err());
        assert!(TypedValue::null().convert::<u32>().is_err());
    }

    #[test]
    fn test_registered_conversion() {
        #[derive(Clone, Debug, PartialEq)]
        struct Celsius(f64);
        #[derive(Clone, Debug, PartialEq)]
        struct Fahrenheit(f64);

        register_conversion::<Celsius, Fahrenheit, _>(|c| Fahrenheit(c.0 * 9.0 / 5.0 + 32.0));

        let v = TypedValue::new(Celsius(100.0));
        assert_eq!(v.convert::<Fahrenheit>().unwrap(), Fahrenheit(212.0));
    }

    #[test]
    fn test_emplace() {
        let v = TypedValue::emplace::<String, _>("abc");
        assert_eq!(v.extract::<String>().unwrap(), "abc");
    }

    #[test]
    fn test_display_and_type_string() {
        assert_eq!(TypedValue::new(3u8).to_string(), "3");
        assert_eq!(TypedValue::null().to_string(), "NullValue");
        assert_eq!(TypedValue::new(vec![String::new()]).type_string(), "Vec<String>");

        struct Unregistered;
        let v = TypedValue::new(Unregistered);
        assert!(v.to_string().starts_with("TypedValue<"));
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(
            short_type_name("std::collections::hash::map::HashMap<alloc::string::String, i32>"),
            "HashMap<String, i32>"
        );
        assert_eq!(short_type_name("&str"), "&str");
    }
}
