use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Symbol;

/// A fixed-capacity bitset over one grammar's symbols.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SymbolSet {
    bits: Box<[u64]>,
}

impl SymbolSet {
    const BITS_PER_SLOT: u16 = u64::BITS as u16;

    /// Returns an empty set with room for `symbol_count` symbols.
    pub fn new(symbol_count: usize) -> Self {
        let slots = symbol_count.div_ceil(u64::BITS as usize).max(1);
        Self { bits: vec![0; slots].into_boxed_slice() }
    }

    pub fn insert(&mut self, symbol: Symbol) {
        let raw = symbol.raw();
        let slot = (raw / Self::BITS_PER_SLOT) as usize;
        debug_assert!(slot < self.bits.len(), "symbol out of range for this set");
        self.bits[slot] |= 1 << (raw % Self::BITS_PER_SLOT);
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        let raw = symbol.raw();
        let slot = (raw / Self::BITS_PER_SLOT) as usize;
        match self.bits.get(slot) {
            Some(bits) => bits & (1 << (raw % Self::BITS_PER_SLOT)) != 0,
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&bits| bits == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.bits.iter().enumerate().flat_map(|(slot, &bits)| {
            (0..u64::BITS as u16)
                .filter(move |bit| bits & (1 << bit) != 0)
                .map(move |bit| Symbol::new(slot as u16 * Self::BITS_PER_SLOT + bit))
        })
    }
}

impl fmt::Debug for SymbolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(Symbol::raw)).finish()
    }
}
