//! Planar locations and the keyed location tables used for warehouses and agents.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 2D point. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Location {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Location {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Location> for (f64, f64) {
    fn from(location: Location) -> Self {
        (location.x, location.y)
    }
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: Location, b: Location) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Keyed locations that remember the order keys were first inserted in.
///
/// Iteration order is insertion order, which is what makes nearest-agent
/// tie-breaking reproducible. Re-inserting an existing key overwrites its
/// location but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationTable {
    entries: Vec<(String, Location)>,
    index: HashMap<String, usize>,
}

impl LocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, location: Location) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 = location,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, location));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Location> {
        self.index.get(key).map(|&slot| self.entries[slot].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Location)> + '_ {
        self.entries
            .iter()
            .map(|(key, location)| (key.as_str(), *location))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

impl<K: Into<String>> FromIterator<(K, Location)> for LocationTable {
    fn from_iter<I: IntoIterator<Item = (K, Location)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (key, location) in iter {
            table.insert(key, location);
        }
        table
    }
}

impl Serialize for LocationTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, location) in &self.entries {
            map.serialize_entry(key, location)?;
        }
        map.end()
    }
}

struct LocationTableVisitor(PhantomData<fn() -> LocationTable>);

impl<'de> Visitor<'de> for LocationTableVisitor {
    type Value = LocationTable;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of keys to [x, y] locations")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut table = LocationTable::new();
        while let Some((key, location)) = access.next_entry::<String, Location>()? {
            table.insert(key, location);
        }
        Ok(table)
    }
}

// Visiting the map directly keeps document order, which a HashMap/BTreeMap round-trip would lose.
impl<'de> Deserialize<'de> for LocationTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(LocationTableVisitor(PhantomData))
    }
}
