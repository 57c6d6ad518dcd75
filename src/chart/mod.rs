//! Statechart Data Structures
//! Nested statechart definitions produced by the translator

use serde::{Deserialize, Serialize};


/// Name of the synthetic state wrapping a machine's top-level regions.
pub const ROOT_STATE_NAME: &str = "root";

/// A complete statechart definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatechartDefinition {
    /// Name of the statechart (the source state machine's name)
    pub name: String,
    /// Synthetic root wrapping every top-level region
    pub root: RootState,
}

impl StatechartDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: RootState::default(),
        }
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.root.parallel_regions.push(region);
        self
    }

    /// Every region, depth first, top-level regions in order.
    pub fn regions(&self) -> Vec<&Region> {
        let mut out = Vec::new();
        for region in &self.root.parallel_regions {
            region.walk(&mut out);
        }
        out
    }

    /// Validate the statechart definition
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.root.parallel_regions.is_empty() {
            errors.push(format!("Statechart '{}' has no regions", self.name));
        }

        for region in self.regions() {
            match region.initial_state {
                None if !region.states.is_empty() => {
                    errors.push(format!("Region '{}' has no initial state", region.name));
                }
                Some(ref initial) if !region.states.contains_key(initial) => {
                    // Legacy output may drop a terminal initial state.
                    log::debug!(
                        "initial state '{}' of region '{}' is not emitted",
                        initial,
                        region.name
                    );
                }
                _ => {}
            }

            for target in region.referenced_targets() {
                if !region.states.contains_key(target) {
                    errors.push(format!(
                        "Transition target '{}' in region '{}' has no state",
                        target, region.name
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// The synthetic root state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootState {
    pub name: String,
    pub parallel_regions: Vec<Region>,
}

impl Default for RootState {
    fn default() -> Self {
        Self {
            name: ROOT_STATE_NAME.to_string(),
            parallel_regions: Vec::new(),
        }
    }
}

/// A region: an orthogonal container of states
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    /// Initial state name
    pub initial_state: Option<String>,
    /// States in traversal order
    pub states: OrderedMap<String, StateDef>,
}

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initial_state: None,
            states: OrderedMap::new(),
        }
    }

    /// Named transition targets referenced by this region's own states.
    pub fn referenced_targets(&self) -> Vec<&String> {
        self.states
            .values()
            .flat_map(|state| state.transitions.keys())
            .filter_map(|target| target.as_ref())
            .collect()
    }

    fn walk<'a>(&'a self, out: &mut Vec<&'a Region>) {
        out.push(self);
        for state in self.states.values() {
            for nested in state.parallel_regions.iter().flatten() {
                nested.walk(out);
            }
        }
    }
}

/// A state inside a region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDef {
    /// Transitions keyed by target; `None` is an unresolved target
    pub transitions: OrderedMap<Option<String>, TransitionDef>,
    /// Nested orthogonal regions of a composite state
    pub parallel_regions: Option<Vec<Region>>,
}

impl StateDef {
    /// An empty state, as used for backfilled placeholders
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty() && self.parallel_regions.is_none()
    }

    pub fn is_composite(&self) -> bool {
        self.parallel_regions.is_some()
    }
}

/// Payload of a transition entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDef {
    /// Trigger names carried from the source model
    pub triggers: Vec<String>,
}

/// Insertion-ordered map with linear lookup.
///
/// Regions hold a handful of states, and the emitted order must follow
/// traversal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedMap<K, V> {
    entries: Vec<(K, V)>,
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: PartialEq, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.get(key).is_some()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: std::borrow::Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.entries
            .iter()
            .find(|(k, _)| <K as std::borrow::Borrow<Q>>::borrow(k) == key)
            .map(|(_, v)| v)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: std::borrow::Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.entries
            .iter_mut()
            .find(|(k, _)| <K as std::borrow::Borrow<Q>>::borrow(k) == key)
            .map(|(_, v)| v)
    }

    /// Insert or replace; a replaced entry keeps its original position.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.entries.iter().position(|(k, _)| *k == key) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get_or_insert_with(&mut self, key: K, make: impl FnOnce() -> V) -> &mut V {
        let index = match self.entries.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                self.entries.push((key, make()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<K: PartialEq, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
