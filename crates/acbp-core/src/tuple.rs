//! Category tuples and their canonical enumeration order.

use smallvec::SmallVec;

/// One value per category dimension, stored as domain positions.
///
/// Position `i` holds the index of the chosen value inside dimension `i`'s
/// declared domain. The derived `Ord` is lexicographic over those
/// positions, which is exactly the declared domain order with the first
/// dimension most significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryTuple(SmallVec<[u32; 8]>);

impl CategoryTuple {
    pub fn new(positions: impl IntoIterator<Item = u32>) -> Self {
        Self(positions.into_iter().collect())
    }

    /// The tuple of a model with no category dimensions.
    pub fn empty() -> Self {
        Self(SmallVec::new())
    }

    /// Domain position chosen for dimension `dim`.
    #[inline]
    pub fn get(&self, dim: usize) -> Option<u32> {
        self.0.get(dim).copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u32>> for CategoryTuple {
    fn from(positions: Vec<u32>) -> Self {
        Self(SmallVec::from_vec(positions))
    }
}

/// Iterates every tuple of a category space in canonical order.
///
/// The last dimension varies fastest. A space with no dimensions yields a
/// single empty tuple; a space with an empty dimension yields nothing.
#[derive(Debug, Clone)]
pub struct TupleOdometer {
    sizes: SmallVec<[u32; 8]>,
    next: Option<SmallVec<[u32; 8]>>,
}

impl TupleOdometer {
    pub fn new(sizes: impl IntoIterator<Item = u32>) -> Self {
        let sizes: SmallVec<[u32; 8]> = sizes.into_iter().collect();
        let next = if sizes.iter().any(|&n| n == 0) {
            None
        } else {
            Some(SmallVec::from_elem(0, sizes.len()))
        };
        Self { sizes, next }
    }
}

impl Iterator for TupleOdometer {
    type Item = CategoryTuple;

    fn next(&mut self) -> Option<CategoryTuple> {
        let current = self.next.take()?;
        let mut advanced = current.clone();
        let mut dim = advanced.len();
        loop {
            if dim == 0 {
                // wrapped past the first dimension
                break;
            }
            dim -= 1;
            advanced[dim] += 1;
            if advanced[dim] < self.sizes[dim] {
                self.next = Some(advanced);
                break;
            }
            advanced[dim] = 0;
        }
        Some(CategoryTuple(current))
    }
}
