use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use serde::Serialize;

/// Relations a client asked to have inlined, parsed from `expand=a,b.c`.
///
/// Each dotted segment opens a nested level, so `genes.organism` expands
/// `genes` and, inside every gene, its `organism`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expand {
    fields: BTreeMap<String, Expand>,
}

static NOTHING: Expand = Expand {
    fields: BTreeMap::new(),
};

impl Expand {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn parse(raw: Option<&str>) -> Self {
        let mut root = Expand::none();
        let Some(raw) = raw else {
            return root;
        };

        for path in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let mut node = &mut root;
            for segment in path.split('.').map(str::trim) {
                if segment.is_empty() {
                    break;
                }
                node = node.fields.entry(segment.to_string()).or_default();
            }
        }
        root
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Expansion requested beneath `field`; empty when `field` itself is not expanded
    pub fn nested(&self, field: &str) -> &Expand {
        self.fields.get(field).unwrap_or(&NOTHING)
    }
}

/// A relation rendered either as its key or as the full related object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Related<K, T> {
    Id(K),
    Expanded(T),
}

impl<K, T> Related<K, T> {
    pub fn is_expanded(&self) -> bool {
        matches!(self, Related::Expanded(_))
    }
}

/// Render one key, inlining the object when `lookup` holds it
pub fn relate<K, T>(key: &K, lookup: Option<&HashMap<K, T>>) -> Related<K, T>
where
    K: Clone + Eq + Hash,
    T: Clone,
{
    match lookup.and_then(|m| m.get(key)) {
        Some(object) => Related::Expanded(object.clone()),
        None => Related::Id(key.clone()),
    }
}

pub fn relate_all<K, T>(
    keys: &[K],
    lookup: Option<&HashMap<K, T>>,
) -> Vec<Related<K, T>>
where
    K: Clone + Eq + Hash,
    T: Clone,
{
    keys.iter().map(|key| relate(key, lookup)).collect()
}
