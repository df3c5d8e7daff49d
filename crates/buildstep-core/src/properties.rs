//! Build-scoped, typed property store.
//!
//! Steps hand values to later steps of the same build through
//! [`BuildProperties`]. Keys carry the value type, so a producer and its
//! consumer agree on what is stored at compile time rather than at lookup.

use std::{any::Any, borrow::Cow, collections::HashMap, fmt, marker::PhantomData};

/// Name of a build property together with the type stored under it.
pub struct PropertyKey<T> {
    name: Cow<'static, str>,
    _value: PhantomData<fn() -> T>,
}

impl<T> PropertyKey<T> {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            _value: PhantomData,
        }
    }

    /// Key with a name only known at runtime (e.g. from configuration).
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            _value: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Clone for PropertyKey<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for PropertyKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PropertyKey").field(&self.name).finish()
    }
}

impl<T> PartialEq for PropertyKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for PropertyKey<T> {}

struct Entry {
    value: Box<dyn Any + Send>,
    source: String,
}

#[derive(Default)]
pub struct BuildProperties {
    entries: HashMap<String, Entry>,
}

impl BuildProperties {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any value is stored under `name`, whatever its type.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Whether a value of the key's type is stored under the key.
    pub fn has<T: Any + Send>(&self, key: &PropertyKey<T>) -> bool {
        self.get(key).is_some()
    }

    pub fn get<T: Any + Send>(&self, key: &PropertyKey<T>) -> Option<&T> {
        self.entries
            .get(key.name())
            .and_then(|entry| entry.value.downcast_ref::<T>())
    }

    /// Store `value` under `key`, tagged with the step that produced it.
    /// A previous value under the same name is dropped.
    pub fn set<T: Any + Send>(&mut self, key: &PropertyKey<T>, value: T, source: impl Into<String>) {
        let source = source.into();
        tracing::debug!(key = key.name(), %source, "Setting build property");
        let previous = self.entries.insert(
            key.name().to_string(),
            Entry {
                value: Box::new(value),
                source,
            },
        );
        if let Some(previous) = previous {
            tracing::debug!(
                key = key.name(),
                previous_source = %previous.source,
                "Replaced build property"
            );
        }
    }

    /// Remove and return the value under `key`. A value of a different type
    /// is left in place and `None` is returned.
    pub fn take<T: Any + Send>(&mut self, key: &PropertyKey<T>) -> Option<T> {
        let entry = self.entries.remove(key.name())?;
        match entry.value.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(value) => {
                self.entries.insert(
                    key.name().to_string(),
                    Entry {
                        value,
                        source: entry.source,
                    },
                );
                None
            }
        }
    }

    /// Step that last set the property called `name`.
    pub fn source_of(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|entry| entry.source.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for BuildProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(name, entry)| (name, &entry.source)),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOT_REVISION: PropertyKey<String> = PropertyKey::new("got_revision");

    #[test]
    fn test_set_get_roundtrip_with_source() {
        let mut props = BuildProperties::new();
        props.set(&GOT_REVISION, "abc123".to_string(), "Checkout");

        assert!(props.has(&GOT_REVISION));
        assert_eq!(props.get(&GOT_REVISION).map(String::as_str), Some("abc123"));
        assert_eq!(props.source_of("got_revision"), Some("Checkout"));
    }

    #[test]
    fn test_take_removes_value() {
        let mut props = BuildProperties::new();
        props.set(&GOT_REVISION, "abc123".to_string(), "Checkout");

        assert_eq!(props.take(&GOT_REVISION).as_deref(), Some("abc123"));
        assert!(!props.contains("got_revision"));
        assert_eq!(props.take(&GOT_REVISION), None);
    }

    #[test]
    fn test_take_with_wrong_type_keeps_value() {
        let mut props = BuildProperties::new();
        props.set(&GOT_REVISION, "abc123".to_string(), "Checkout");

        let as_number: PropertyKey<u32> = PropertyKey::named("got_revision");
        assert_eq!(props.take(&as_number), None);
        assert!(!props.has(&as_number));
        assert!(props.contains("got_revision"));
        assert!(props.has(&GOT_REVISION));
    }

    #[test]
    fn test_empty_properties() {
        let props = BuildProperties::new();
        assert!(props.is_empty());
        assert!(!props.has(&GOT_REVISION));
        assert_eq!(props.source_of("got_revision"), None);
    }
}
