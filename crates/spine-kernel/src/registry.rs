//! Name-keyed stores, one per (value kind, object type) pair.
//!
//! A registry is written during the startup phase and read afterwards.
//! Names are unique within a registry; the same base name may appear in
//! several registries under different canonical prefixes.

use std::collections::BTreeMap;

use crate::error::RegistryError;

#[derive(Debug, Clone)]
pub struct Registry<V> {
    label: String,
    entries: BTreeMap<String, V>,
}

impl<V> Registry<V> {
    /// `label` names the registry in error messages and listings,
    /// e.g. `cut<reco_interaction>`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn register(&mut self, name: impl Into<String>, value: V) -> Result<(), RegistryError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(RegistryError::DuplicateName {
                registry: self.label.clone(),
                name,
            });
        }
        self.entries.insert(name, value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&V, RegistryError> {
        self.entries
            .get(name)
            .ok_or_else(|| RegistryError::NameNotFound {
                registry: self.label.clone(),
                name: name.to_string(),
            })
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
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
    fn duplicate_registration_is_rejected() {
        let mut registry = Registry::new("cut<spill>");
        registry.register("beam_quality_cut", 1).expect("first registration");
        let err = registry
            .register("beam_quality_cut", 2)
            .expect_err("second registration must fail");
        assert_eq!(
            err,
            RegistryError::DuplicateName {
                registry: "cut<spill>".to_string(),
                name: "beam_quality_cut".to_string(),
            }
        );
        assert_eq!(registry.get("beam_quality_cut"), Ok(&1));
    }

    #[test]
    fn lookup_of_missing_name_fails_without_panicking() {
        let registry: Registry<u8> = Registry::new("variable<event>");
        assert!(!registry.is_registered("nreco"));
        let err = registry.get("nreco").expect_err("lookup must fail");
        assert!(err.to_string().contains("`nreco` is not registered"));
    }

    #[test]
    fn names_are_listed_in_lexical_order() {
        let mut registry = Registry::new("variable<true_interaction>");
        for name in ["true_vertex_z", "true_vertex_x", "true_iou"] {
            registry.register(name, ()).expect("register");
        }
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["true_iou", "true_vertex_x", "true_vertex_z"]);
        assert_eq!(registry.len(), 3);
    }
}
