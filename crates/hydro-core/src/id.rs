//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a block within the mesh's block list.
///
/// `BlockId(n)` is the n-th block in x1 order. Ids are assigned by the
/// mesh at construction and never change while the block list lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl BlockId {
    /// Index into a block list.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BlockId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_index() {
        let id = BlockId::from(7);
        assert_eq!(id.to_string(), "7");
        assert_eq!(id.index(), 7);
    }

    #[test]
    fn ordering_follows_x1_order() {
        let mut ids = vec![BlockId(3), BlockId(0), BlockId(2)];
        ids.sort();
        assert_eq!(ids, vec![BlockId(0), BlockId(2), BlockId(3)]);
    }
}
