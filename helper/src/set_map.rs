// SPDX-FileCopyrightText: 2024 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
};

/// KeyType -> { CellType } data structure
#[derive(Clone, Default)]
pub struct SetMap<KeyType, CellType>
where
    KeyType: Ord,
{
    map: BTreeMap<KeyType, BTreeSet<CellType>>,
}

impl<KeyType, CellType> Display for SetMap<KeyType, CellType>
where
    KeyType: Ord,
    KeyType: Display,
    CellType: Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (k, set) in self.map.iter() {
            writeln!(f, "{}", k)?;
            for v in set.iter() {
                writeln!(f, "\t->{}", v)?;
            }
        }
        writeln!(f)
    }
}

impl<KeyType, CellType> SetMap<KeyType, CellType>
where
    KeyType: Ord,
    CellType: Ord,
{
    pub fn new() -> SetMap<KeyType, CellType> {
        SetMap {
            map: BTreeMap::new(),
        }
    }

    pub fn get<'a>(&'a self, id: &KeyType) -> Option<&'a BTreeSet<CellType>> {
        self.map.get(id)
    }

    pub fn insert(&mut self, id: KeyType, val: CellType) {
        if let Some(id_set) = self.map.get_mut(&id) {
            id_set.insert(val);
            return;
        }
        let mut new_set = BTreeSet::<CellType>::new();
        new_set.insert(val);
        self.map.insert(id, new_set);
    }

    pub fn contains(&self, id: &KeyType, val: &CellType) -> bool {
        if let Some(id_set) = self.map.get(id) {
            return id_set.contains(val);
        }
        false
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len_of(&self, id: &KeyType) -> usize {
        if let Some(set) = self.map.get(id) {
            return set.len();
        }
        0
    }

    pub fn keys(&self) -> std::collections::btree_map::Keys<'_, KeyType, BTreeSet<CellType>> {
        self.map.keys()
    }

    /// Iterates the cell set of [id]. Yields nothing for unknown keys.
    pub fn set_iter<'a>(&'a self, id: &KeyType) -> impl Iterator<Item = &'a CellType> {
        self.map.get(id).into_iter().flat_map(|set| set.iter())
    }
}

impl<KeyType, CellType> PartialEq for SetMap<KeyType, CellType>
where
    KeyType: Ord,
    CellType: Ord,
{
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}
