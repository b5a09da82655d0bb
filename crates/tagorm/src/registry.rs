//! Per-type cache of record descriptors.

use crate::error::{OrmError, OrmResult};
use crate::record::{FieldInfo, Record};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

type Entry = Arc<dyn Any + Send + Sync>;

/// Caches one [`FieldInfo`] per record type.
///
/// Entries are added on first use and never replaced or evicted. Two threads
/// describing the same type at once both build a descriptor; the first one
/// stored wins and the other is dropped.
#[derive(Default)]
pub struct TypeRegistry {
    entries: RwLock<HashMap<TypeId, Entry>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the descriptor for `T`, describing the type on first use.
    ///
    /// A failed description is returned to the caller and not cached.
    pub fn field_info<T: Record>(&self) -> OrmResult<Arc<FieldInfo<T>>> {
        let key = TypeId::of::<T>();
        let cached = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(entry) = cached {
            return downcast::<T>(entry);
        }

        let info: Entry = Arc::new(T::describe()?);
        tracing::debug!(
            target: "tagorm.registry",
            record = std::any::type_name::<T>(),
            "described record type"
        );

        let entry = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(info)
            .clone();
        downcast::<T>(entry)
    }

    /// Whether `T` has already been described.
    pub fn contains<T: Record>(&self) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<T>())
    }

    /// Number of cached record types.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.len())
            .finish()
    }
}

fn downcast<T: Record>(entry: Entry) -> OrmResult<Arc<FieldInfo<T>>> {
    entry.downcast::<FieldInfo<T>>().map_err(|_| {
        OrmError::Other(format!(
            "registry entry for {} holds a different descriptor type",
            std::any::type_name::<T>()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{FromValue, ToValue};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DESCRIBE_CALLS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct Counted {
        id: i64,
    }

    impl Record for Counted {
        const TABLE: &'static str = "counted";

        fn describe() -> OrmResult<FieldInfo<Self>> {
            DESCRIBE_CALLS.fetch_add(1, Ordering::SeqCst);
            Self::fields()
                .field(
                    "id",
                    |r| r.id.to_value(),
                    |r, v| {
                        r.id = FromValue::from_value(v)?;
                        Ok(())
                    },
                )
                .build()
        }
    }

    #[derive(Default)]
    struct Shared {
        name: String,
    }

    impl Record for Shared {
        const TABLE: &'static str = "shared";

        fn describe() -> OrmResult<FieldInfo<Self>> {
            FieldInfo::<Self>::builder()
                .field(
                    "name",
                    |r| r.name.to_value(),
                    |r, v| {
                        r.name = FromValue::from_value(v)?;
                        Ok(())
                    },
                )
                .build()
        }
    }

    struct Broken;

    impl Record for Broken {
        const TABLE: &'static str = "broken";

        fn describe() -> OrmResult<FieldInfo<Self>> {
            Self::fields().build()
        }
    }

    #[test]
    fn describes_each_type_once() {
        let registry = TypeRegistry::new();
        let before = DESCRIBE_CALLS.load(Ordering::SeqCst);

        let a = registry.field_info::<Counted>().unwrap();
        let b = registry.field_info::<Counted>().unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.columns(), b.columns());
        assert_eq!(DESCRIBE_CALLS.load(Ordering::SeqCst) - before, 1);
        assert!(registry.contains::<Counted>());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn failed_description_is_not_cached() {
        let registry = TypeRegistry::new();
        assert!(registry.field_info::<Broken>().unwrap_err().is_invalid_argument());
        assert!(!registry.contains::<Broken>());
        assert!(registry.is_empty());
    }

    #[test]
    fn concurrent_lookups_share_one_entry() {
        let registry = Arc::new(TypeRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.field_info::<Shared>().unwrap())
            })
            .collect();
        let infos: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for info in &infos {
            assert!(Arc::ptr_eq(info, &infos[0]));
        }
        assert_eq!(registry.len(), 1);
    }
}
