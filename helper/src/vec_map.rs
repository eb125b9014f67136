// SPDX-FileCopyrightText: 2024 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

use std::collections::BTreeMap;

/// KeyType -> [ CellType ] data structure
#[derive(Clone, Default)]
pub struct VecMap<KeyType, CellType>
where
    KeyType: Ord,
{
    map: BTreeMap<KeyType, Vec<CellType>>,
}

impl<KeyType, CellType> VecMap<KeyType, CellType>
where
    KeyType: Ord,
{
    pub fn new() -> VecMap<KeyType, CellType> {
        VecMap {
            map: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, id: KeyType, cell_val: CellType) {
        if let Some(id_vec) = self.map.get_mut(&id) {
            id_vec.push(cell_val);
            return;
        }
        self.map.insert(id, vec![cell_val]);
    }

    pub fn extend(&mut self, id: KeyType, vec: Vec<CellType>) {
        if let Some(id_vec) = self.map.get_mut(&id) {
            id_vec.extend(vec);
            return;
        }
        self.map.insert(id, vec);
    }

    pub fn len_of(&self, id: &KeyType) -> usize {
        if let Some(vec) = self.map.get(id) {
            return vec.len();
        }
        0
    }

    pub fn get(&self, id: &KeyType) -> &[CellType] {
        if let Some(vec) = self.map.get(id) {
            return vec.as_slice();
        }
        &[]
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Iterates over every cell of every key, in key order.
    pub fn cell_iter(&self) -> impl Iterator<Item = &CellType> {
        self.map.values().flat_map(|vec| vec.iter())
    }

    pub fn vec_iter<'a>(&'a self, id: &KeyType) -> std::slice::Iter<'a, CellType> {
        self.get(id).iter()
    }
}

impl<KeyType, CellType> PartialEq for VecMap<KeyType, CellType>
where
    KeyType: Ord,
    CellType: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}
