//! Values that remember whether they were written explicitly
//!
//! Column styles, cell formats and table captions all need to tell "not
//! specified" apart from "specified as the default". `MaybeSet` carries
//! that distinction instead of a sentinel value.

/// A value that is either absent or explicitly set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "state", content = "value"))]
pub enum MaybeSet<T> {
    /// Nothing was written; consumers fall back to their default
    #[default]
    Unset,
    /// Explicitly written, possibly with the default value itself
    Set(T),
}

impl<T> MaybeSet<T> {
    /// Whether a value was written
    pub fn is_set(&self) -> bool {
        matches!(self, MaybeSet::Set(_))
    }

    /// Borrow the value if one was written
    pub fn as_ref(&self) -> MaybeSet<&T> {
        match self {
            MaybeSet::Set(v) => MaybeSet::Set(v),
            MaybeSet::Unset => MaybeSet::Unset,
        }
    }

    /// Convert into an `Option`
    pub fn into_option(self) -> Option<T> {
        match self {
            MaybeSet::Set(v) => Some(v),
            MaybeSet::Unset => None,
        }
    }

    /// Borrow as an `Option`
    pub fn get(&self) -> Option<&T> {
        match self {
            MaybeSet::Set(v) => Some(v),
            MaybeSet::Unset => None,
        }
    }

    /// The written value, or `default` when absent
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            MaybeSet::Set(v) => v,
            MaybeSet::Unset => default,
        }
    }

    /// The written value, or the type's default when absent
    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        self.unwrap_or(T::default())
    }

    /// Keep `self` when set, otherwise fall back to `other`
    pub fn or(self, other: MaybeSet<T>) -> MaybeSet<T> {
        match self {
            MaybeSet::Set(_) => self,
            MaybeSet::Unset => other,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> MaybeSet<U> {
        match self {
            MaybeSet::Set(v) => MaybeSet::Set(f(v)),
            MaybeSet::Unset => MaybeSet::Unset,
        }
    }
}

impl<T> From<Option<T>> for MaybeSet<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => MaybeSet::Set(v),
            None => MaybeSet::Unset,
        }
    }
}
