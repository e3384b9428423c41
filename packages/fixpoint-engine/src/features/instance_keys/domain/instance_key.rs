//! Instance Keys
//!
//! Abstract-domain elements standing for equivalence classes of runtime
//! allocations. The class-based policy puts every allocation of a concrete
//! type in the same equivalence class: one key per concrete type.
//! Constants map to the key of their concrete type unless
//! constant-specific keys are enabled, in which case each (type, literal)
//! pair gets its own key.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for instance keys
pub type KeyId = u32;

/// Interned type identifier
pub type TypeId = u32;

/// What a key abstracts over
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyKind {
    /// All allocations of one concrete type
    ConcreteType,

    /// One constant literal of a concrete type
    Constant { literal: String },
}

/// An instance key: one lattice element per equivalence class of
/// allocations
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceKey {
    pub id: KeyId,
    pub type_id: TypeId,
    pub type_name: String,
    pub kind: KeyKind,
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            KeyKind::ConcreteType => write!(f, "[{}]", self.type_name),
            KeyKind::Constant { literal } => write!(f, "[{}:{}]", self.type_name, literal),
        }
    }
}

/// Factory interning types and minting keys with unique ids.
///
/// Asking twice for the same equivalence class returns the same key, so
/// key ids are stable set elements.
#[derive(Debug, Default)]
pub struct InstanceKeyFactory {
    /// Give each constant its own key instead of merging into its type
    use_constant_specific_keys: bool,

    type_ids: FxHashMap<String, TypeId>,
    type_keys: FxHashMap<TypeId, KeyId>,
    constant_keys: FxHashMap<(TypeId, String), KeyId>,
    keys: Vec<InstanceKey>,
}

impl InstanceKeyFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constant_specific_keys(mut self) -> Self {
        self.use_constant_specific_keys = true;
        self
    }

    fn intern_type(&mut self, type_name: &str) -> TypeId {
        if let Some(&id) = self.type_ids.get(type_name) {
            return id;
        }
        let id = self.type_ids.len() as TypeId;
        self.type_ids.insert(type_name.to_string(), id);
        id
    }

    /// The key for an allocation of `type_name`: all allocations of the
    /// same concrete type share one key
    pub fn key_for_allocation(&mut self, type_name: &str) -> KeyId {
        let type_id = self.intern_type(type_name);
        if let Some(&key) = self.type_keys.get(&type_id) {
            return key;
        }
        let id = self.keys.len() as KeyId;
        self.keys.push(InstanceKey {
            id,
            type_id,
            type_name: type_name.to_string(),
            kind: KeyKind::ConcreteType,
        });
        self.type_keys.insert(type_id, id);
        id
    }

    /// The key for a constant of `type_name`: the concrete type's key, or
    /// a per-literal key when constant-specific keys are enabled
    pub fn key_for_constant(&mut self, type_name: &str, literal: &str) -> KeyId {
        if !self.use_constant_specific_keys {
            return self.key_for_allocation(type_name);
        }
        let type_id = self.intern_type(type_name);
        if let Some(&key) = self.constant_keys.get(&(type_id, literal.to_string())) {
            return key;
        }
        let id = self.keys.len() as KeyId;
        self.keys.push(InstanceKey {
            id,
            type_id,
            type_name: type_name.to_string(),
            kind: KeyKind::Constant {
                literal: literal.to_string(),
            },
        });
        self.constant_keys.insert((type_id, literal.to_string()), id);
        id
    }

    #[inline]
    pub fn key(&self, id: KeyId) -> Option<&InstanceKey> {
        self.keys.get(id as usize)
    }

    #[inline]
    pub fn num_keys(&self) -> usize {
        self.keys.len()
    }

    /// Ids of every key whose concrete type is `type_name`
    pub fn keys_of_type(&self, type_name: &str) -> Vec<KeyId> {
        let Some(&type_id) = self.type_ids.get(type_name) else {
            return Vec::new();
        };
        self.keys
            .iter()
            .filter(|k| k.type_id == type_id)
            .map(|k| k.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocations_of_same_type_share_key() {
        let mut factory = InstanceKeyFactory::new();
        let k1 = factory.key_for_allocation("java.lang.String");
        let k2 = factory.key_for_allocation("java.lang.String");
        let k3 = factory.key_for_allocation("java.util.ArrayList");
        assert_eq!(k1, k2);
        assert_ne!(k1, k3);
        assert_eq!(factory.num_keys(), 2);
    }

    #[test]
    fn test_constants_merge_into_type_by_default() {
        let mut factory = InstanceKeyFactory::new();
        let alloc = factory.key_for_allocation("java.lang.String");
        let c1 = factory.key_for_constant("java.lang.String", "hello");
        let c2 = factory.key_for_constant("java.lang.String", "world");
        assert_eq!(alloc, c1);
        assert_eq!(c1, c2);
    }

    #[test]
    fn test_constant_specific_keys() {
        let mut factory = InstanceKeyFactory::new().with_constant_specific_keys();
        let alloc = factory.key_for_allocation("java.lang.String");
        let c1 = factory.key_for_constant("java.lang.String", "hello");
        let c2 = factory.key_for_constant("java.lang.String", "hello");
        let c3 = factory.key_for_constant("java.lang.String", "world");
        assert_ne!(alloc, c1);
        assert_eq!(c1, c2);
        assert_ne!(c1, c3);

        let keys = factory.keys_of_type("java.lang.String");
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_display() {
        let mut factory = InstanceKeyFactory::new().with_constant_specific_keys();
        let alloc = factory.key_for_allocation("A");
        let constant = factory.key_for_constant("B", "1");
        assert_eq!(factory.key(alloc).unwrap().to_string(), "[A]");
        assert_eq!(factory.key(constant).unwrap().to_string(), "[B:1]");
    }
}
