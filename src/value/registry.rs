//! Runtime dispatch table for type-erased values.
//!
//! Comparison, hashing, formatting and conversion of a [`TypedValue`] are
//! looked up here by `TypeId` (or by a pair of them). Primitive types are
//! registered on first use; user types opt in through [`register_type`],
//! [`register_hash`], [`register_comparison`] and [`register_conversion`].
//!
//! Entries are cloned out of the table before being called, so a comparator
//! or converter may itself use `TypedValue` without re-entering the lock.

use super::{NullValue, TypedValue};
use std::any::{type_name, Any, TypeId};
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use thiserror::Error;

type CompareFn = Arc<dyn Fn(&dyn Any, &dyn Any) -> Option<Ordering> + Send + Sync>;
type ConvertFn = Arc<dyn Fn(&dyn Any) -> Option<Box<dyn Any + Send>> + Send + Sync>;
type HashFn = fn(&dyn Any) -> u64;
type DisplayFn = fn(&dyn Any, &mut fmt::Formatter<'_>) -> fmt::Result;

/// No comparison is registered for this pair of types.
///
/// Never surfaced through `equals` or the ordering operators; those fall back
/// to comparing hash codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("comparison of {left} with {right} is not supported")]
pub struct CompareUnsupported {
    pub left: &'static str,
    pub right: &'static str,
}

#[derive(Default)]
struct Registry {
    compare: HashMap<(TypeId, TypeId), CompareFn>,
    convert: HashMap<(TypeId, TypeId), ConvertFn>,
    hash: HashMap<TypeId, HashFn>,
    display: HashMap<TypeId, DisplayFn>,
}

fn registry() -> &'static RwLock<Registry> {
    static REGISTRY: OnceLock<RwLock<Registry>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(Registry::with_builtins()))
}

fn compare_same<T: Ord + 'static>(a: &dyn Any, b: &dyn Any) -> Option<Ordering> {
    Some(a.downcast_ref::<T>()?.cmp(b.downcast_ref::<T>()?))
}

fn hash_of<T: Hash + 'static>(v: &dyn Any) -> u64 {
    let mut hasher = DefaultHasher::new();
    if let Some(v) = v.downcast_ref::<T>() {
        v.hash(&mut hasher);
    }
    hasher.finish()
}

fn display_of<T: fmt::Display + 'static>(v: &dyn Any, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match v.downcast_ref::<T>() {
        Some(v) => fmt::Display::fmt(v, f),
        None => Ok(()),
    }
}

fn debug_of<T: fmt::Debug + 'static>(v: &dyn Any, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match v.downcast_ref::<T>() {
        Some(v) => fmt::Debug::fmt(v, f),
        None => Ok(()),
    }
}

macro_rules! float_ops {
    ($($t:ty),*) => {
        $(
            impl FloatOps for $t {
                fn compare(a: &dyn Any, b: &dyn Any) -> Option<Ordering> {
                    Some(a.downcast_ref::<$t>()?.total_cmp(b.downcast_ref::<$t>()?))
                }

                fn hash(v: &dyn Any) -> u64 {
                    let mut hasher = DefaultHasher::new();
                    if let Some(v) = v.downcast_ref::<$t>() {
                        v.to_bits().hash(&mut hasher);
                    }
                    hasher.finish()
                }
            }
        )*
    };
}

trait FloatOps {
    fn compare(a: &dyn Any, b: &dyn Any) -> Option<Ordering>;
    fn hash(v: &dyn Any) -> u64;
}

float_ops!(f32, f64);

macro_rules! ordered {
    ($reg:ident; $($t:ty),*) => {
        $(
            $reg.insert_ordered::<$t>();
            $reg.display.insert(TypeId::of::<$t>(), display_of::<$t>);
            $reg.insert_conversion::<$t, String, _>(|v: &$t| v.to_string());
        )*
    };
}

macro_rules! numeric_casts {
    ($reg:ident; $($from:ty),*) => {
        $(
            numeric_casts!(@to $reg; $from;
                u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);
        )*
    };
    (@to $reg:ident; $from:ty; $($to:ty),*) => {
        $(
            $reg.insert_conversion::<$from, $to, _>(|v: &$from| *v as $to);
        )*
    };
}

impl Registry {
    fn with_builtins() -> Self {
        let mut reg = Registry::default();

        ordered!(reg; u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, char);
        ordered!(reg; String, &'static str);

        reg.insert_ordered::<()>();
        reg.display.insert(TypeId::of::<()>(), debug_of::<()>);
        reg.insert_ordered::<NullValue>();
        reg.display.insert(TypeId::of::<NullValue>(), debug_of::<NullValue>);

        reg.insert_compare::<f32, f32>(Arc::new(<f32 as FloatOps>::compare));
        reg.insert_compare::<f64, f64>(Arc::new(<f64 as FloatOps>::compare));
        reg.hash.insert(TypeId::of::<f32>(), <f32 as FloatOps>::hash);
        reg.hash.insert(TypeId::of::<f64>(), <f64 as FloatOps>::hash);
        reg.display.insert(TypeId::of::<f32>(), display_of::<f32>);
        reg.display.insert(TypeId::of::<f64>(), display_of::<f64>);
        reg.insert_conversion::<f32, String, _>(|v: &f32| v.to_string());
        reg.insert_conversion::<f64, String, _>(|v: &f64| v.to_string());

        numeric_casts!(reg; u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);

        reg
    }

    fn insert_ordered<T: Ord + Hash + Send + Sync + 'static>(&mut self) {
        self.insert_compare::<T, T>(Arc::new(compare_same::<T>));
        self.hash.insert(TypeId::of::<T>(), hash_of::<T>);
    }

    fn insert_compare<A: 'static, B: 'static>(&mut self, f: CompareFn) {
        self.compare.insert((TypeId::of::<A>(), TypeId::of::<B>()), f);
    }

    fn insert_conversion<A, B, F>(&mut self, f: F)
    where
        A: Any,
        B: Any + Send,
        F: Fn(&A) -> B + Send + Sync + 'static,
    {
        let convert: ConvertFn = Arc::new(move |v: &dyn Any| {
            v.downcast_ref::<A>()
                .map(|a| Box::new(f(a)) as Box<dyn Any + Send>)
        });
        self.convert
            .insert((TypeId::of::<A>(), TypeId::of::<B>()), convert);
    }
}

/// Register comparison, hashing and `Debug` formatting for a user type.
pub fn register_type<T>()
where
    T: Ord + Hash + fmt::Debug + Send + Sync + 'static,
{
    let mut reg = registry().write().unwrap_or_else(PoisonError::into_inner);
    reg.insert_ordered::<T>();
    reg.display.insert(TypeId::of::<T>(), debug_of::<T>);
    tracing::debug!("Registered value type {}", type_name::<T>());
}

/// Register only a hash function for a type that has no ordering.
pub fn register_hash<T: Hash + Send + Sync + 'static>() {
    let mut reg = registry().write().unwrap_or_else(PoisonError::into_inner);
    reg.hash.insert(TypeId::of::<T>(), hash_of::<T>);
}

/// Register a comparison between two distinct types.
///
/// The mirrored `(B, A)` comparison is registered as well, with the ordering
/// reversed.
pub fn register_comparison<A, B, F>(f: F)
where
    A: Any + Send + Sync,
    B: Any + Send + Sync,
    F: Fn(&A, &B) -> Ordering + Send + Sync + 'static,
{
    let f = Arc::new(f);
    let forward = Arc::clone(&f);
    let mut reg = registry().write().unwrap_or_else(PoisonError::into_inner);
    reg.insert_compare::<A, B>(Arc::new(move |a: &dyn Any, b: &dyn Any| {
        Some(forward(a.downcast_ref::<A>()?, b.downcast_ref::<B>()?))
    }));
    reg.insert_compare::<B, A>(Arc::new(move |b: &dyn Any, a: &dyn Any| {
        Some(f(a.downcast_ref::<A>()?, b.downcast_ref::<B>()?).reverse())
    }));
}

/// Register a conversion from `A` to `B` used by [`TypedValue::convert`].
pub fn register_conversion<A, B, F>(f: F)
where
    A: Any,
    B: Any + Send,
    F: Fn(&A) -> B + Send + Sync + 'static,
{
    let mut reg = registry().write().unwrap_or_else(PoisonError::into_inner);
    reg.insert_conversion::<A, B, F>(f);
    tracing::debug!(
        "Registered conversion {} -> {}",
        type_name::<A>(),
        type_name::<B>()
    );
}

pub(crate) fn compare(
    left: (TypeId, &dyn Any),
    right: (TypeId, &dyn Any),
) -> Option<Ordering> {
    let f = {
        let reg = registry().read().unwrap_or_else(PoisonError::into_inner);
        reg.compare.get(&(left.0, right.0)).cloned()
    }?;
    f(left.1, right.1)
}

pub(crate) fn hash(type_id: TypeId, value: &dyn Any) -> Option<u64> {
    let f = {
        let reg = registry().read().unwrap_or_else(PoisonError::into_inner);
        reg.hash.get(&type_id).copied()
    }?;
    Some(f(value))
}

pub(crate) fn display(
    type_id: TypeId,
    value: &dyn Any,
    f: &mut fmt::Formatter<'_>,
) -> Option<fmt::Result> {
    let display = {
        let reg = registry().read().unwrap_or_else(PoisonError::into_inner);
        reg.display.get(&type_id).copied()
    }?;
    Some(display(value, f))
}

pub(crate) fn convert(
    from: TypeId,
    to: TypeId,
    value: &dyn Any,
) -> Option<Box<dyn Any + Send>> {
    let f = {
        let reg = registry().read().unwrap_or_else(PoisonError::into_inner);
        reg.convert.get(&(from, to)).cloned()
    }?;
    f(value)
}

/// Whether a comparison is registered between the stored types of two values.
pub fn is_comparable(a: &TypedValue, b: &TypedValue) -> bool {
    let reg = registry().read().unwrap_or_else(PoisonError::into_inner);
    reg.compare.contains_key(&(a.type_id(), b.type_id()))
}
