//! Canonical value representation for values crossing chain stage boundaries.
//!
//! Every argument and return value that travels through a compiled
//! interception chain is carried as a [`ChainValue`]: a cheaply cloneable cell
//! that holds a boxed value of any type, an explicit null, or the
//! distinguished "no value" marker used for void returns. Declared parameter
//! and return types are identified by [`TypeKey`] tokens, which also serve as
//! the explicit generic type arguments supplied at a generic member's call
//! site.
//!
//! # Key Types
//!
//! - [`TypeKey`] - Identity token for a Rust type, usable as a generic type argument
//! - [`ChainValue`] - The boxed value cell passed between chain stages
//! - [`ValueKind`] - Discriminant of the three cell shapes
//!
//! # Examples
//!
//! ```rust
//! use proxyforge::model::{ChainValue, TypeKey};
//!
//! let value = ChainValue::boxed(42i32);
//! assert_eq!(value.unbox_ref::<i32>()?, &42);
//! assert_eq!(value.type_key(), Some(TypeKey::of::<i32>()));
//!
//! let void = ChainValue::void();
//! assert!(void.is_void());
//! # Ok::<(), proxyforge::Error>(())
//! ```

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use strum::{EnumCount, EnumIter};

use crate::{Error, Result};

/// Identity token for a Rust type.
///
/// Pairs the [`TypeId`] used for identity with the type's name for
/// diagnostics. Equality and hashing consider only the id; the name is
/// carried so marshalling errors can report the declared and found types.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Creates the key for type `T`
    #[must_use]
    pub fn of<T: Any>() -> Self {
        TypeKey {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Returns the underlying [`TypeId`]
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the type name captured for diagnostics
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Discriminant of the three shapes a [`ChainValue`] can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumCount)]
pub enum ValueKind {
    /// The "no value" marker used for void returns
    Void,
    /// An explicit null
    Null,
    /// A boxed value of some concrete type
    Boxed,
}

/// The canonical cross-stage value cell.
///
/// Values are shared, not moved: the boxed payload sits behind an [`Arc`] so
/// an interceptor can forward the same argument vector to its continuation
/// more than once (retry decoration) without re-marshalling. A `void`
/// returning member has no boxed result and is represented by
/// [`ChainValue::Void`].
#[derive(Clone)]
pub enum ChainValue {
    /// The distinguished "no value" marker for void returns
    Void,
    /// An explicit null value
    Null,
    /// A boxed value together with the key of the type it was boxed from
    Boxed {
        /// Key of the type the value was boxed from
        key: TypeKey,
        /// The shared boxed payload
        value: Arc<dyn Any + Send + Sync>,
    },
}

impl ChainValue {
    /// Boxes a value of type `T` into a cell
    #[must_use]
    pub fn boxed<T: Any + Send + Sync>(value: T) -> Self {
        ChainValue::Boxed {
            key: TypeKey::of::<T>(),
            value: Arc::new(value),
        }
    }

    /// Returns the explicit null cell
    #[must_use]
    pub fn null() -> Self {
        ChainValue::Null
    }

    /// Returns the "no value" marker
    #[must_use]
    pub fn void() -> Self {
        ChainValue::Void
    }

    /// Returns the discriminant of this cell
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            ChainValue::Void => ValueKind::Void,
            ChainValue::Null => ValueKind::Null,
            ChainValue::Boxed { .. } => ValueKind::Boxed,
        }
    }

    /// True if this cell is the "no value" marker
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, ChainValue::Void)
    }

    /// True if this cell is an explicit null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, ChainValue::Null)
    }

    /// Returns the key of the boxed type, if the cell holds a boxed value
    #[must_use]
    pub fn type_key(&self) -> Option<TypeKey> {
        match self {
            ChainValue::Boxed { key, .. } => Some(*key),
            _ => None,
        }
    }

    /// Name of the contained shape, used when reporting marshalling failures
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            ChainValue::Void => "void",
            ChainValue::Null => "null",
            ChainValue::Boxed { key, .. } => key.name(),
        }
    }

    /// Unboxes a reference to the contained value as type `T`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCastInChain`] if the cell is void, null, or
    /// holds a value of a different type.
    pub fn unbox_ref<T: Any>(&self) -> Result<&T> {
        match self {
            ChainValue::Boxed { value, .. } => {
                value
                    .downcast_ref::<T>()
                    .ok_or_else(|| Error::InvalidCastInChain {
                        expected: type_name::<T>().to_string(),
                        found: self.describe().to_string(),
                    })
            }
            _ => Err(Error::InvalidCastInChain {
                expected: type_name::<T>().to_string(),
                found: self.describe().to_string(),
            }),
        }
    }

    /// Unboxes a clone of the contained value as type `T`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCastInChain`] if the cell is void, null, or
    /// holds a value of a different type.
    pub fn unbox<T: Any + Clone>(&self) -> Result<T> {
        self.unbox_ref::<T>().cloned()
    }
}

impl fmt::Debug for ChainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainValue::Void => f.write_str("ChainValue::Void"),
            ChainValue::Null => f.write_str("ChainValue::Null"),
            ChainValue::Boxed { key, .. } => write!(f, "ChainValue::Boxed({})", key.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_boxed_roundtrip() {
        let value = ChainValue::boxed(5i32);
        assert_eq!(value.unbox_ref::<i32>().unwrap(), &5);
        assert_eq!(value.unbox::<i32>().unwrap(), 5);
        assert_eq!(value.type_key(), Some(TypeKey::of::<i32>()));
    }

    #[test]
    fn test_boxed_reference_type() {
        let value = ChainValue::boxed(String::from("hello"));
        assert_eq!(value.unbox_ref::<String>().unwrap(), "hello");
    }

    #[test]
    fn test_unbox_wrong_type() {
        let value = ChainValue::boxed(5i32);
        let err = value.unbox_ref::<String>().unwrap_err();
        assert!(matches!(err, Error::InvalidCastInChain { .. }));
    }

    #[test]
    fn test_unbox_null_and_void() {
        assert!(ChainValue::null().unbox_ref::<i32>().is_err());
        assert!(ChainValue::void().unbox_ref::<i32>().is_err());
        assert_eq!(ChainValue::null().describe(), "null");
        assert_eq!(ChainValue::void().describe(), "void");
    }

    #[test]
    fn test_clone_shares_payload() {
        let value = ChainValue::boxed(vec![1u8, 2, 3]);
        let cloned = value.clone();
        assert_eq!(
            value.unbox_ref::<Vec<u8>>().unwrap().as_ptr(),
            cloned.unbox_ref::<Vec<u8>>().unwrap().as_ptr()
        );
    }

    #[test]
    fn test_type_key_identity() {
        assert_eq!(TypeKey::of::<i32>(), TypeKey::of::<i32>());
        assert_ne!(TypeKey::of::<i32>(), TypeKey::of::<i64>());
        assert!(TypeKey::of::<String>().name().contains("String"));
    }

    #[test]
    fn test_value_kinds_are_exhaustive() {
        for kind in ValueKind::iter() {
            let value = match kind {
                ValueKind::Void => ChainValue::void(),
                ValueKind::Null => ChainValue::null(),
                ValueKind::Boxed => ChainValue::boxed(0u8),
            };
            assert_eq!(value.kind(), kind);
        }
        assert_eq!(ValueKind::COUNT, 3);
    }
}
