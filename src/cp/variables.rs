//! Finite integer domains.

/// Index of a decision variable within a [`CpModel`](super::CpModel).
pub type VarId = usize;

const WORD_BITS: usize = 64;

/// A finite set of non-negative integer values in `0..universe`.
///
/// Stored as a bitset. Domains only shrink during search; backtracking
/// restores earlier snapshots instead of re-inserting values.
///
/// # Examples
///
/// ```
/// use u_placement::cp::Domain;
///
/// let mut d = Domain::full(5);
/// assert_eq!(d.len(), 5);
/// d.remove(0);
/// d.remove_from(3);
/// assert_eq!(d.iter().collect::<Vec<_>>(), vec![1, 2]);
/// assert_eq!(d.min(), Some(1));
/// assert!(!d.is_bound());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    words: Vec<u64>,
    len: usize,
}

impl Domain {
    /// Creates the domain `{0, 1, ..., universe - 1}`.
    pub fn full(universe: usize) -> Self {
        let mut words = vec![u64::MAX; universe.div_ceil(WORD_BITS)];
        let tail = universe % WORD_BITS;
        if tail != 0 {
            if let Some(last) = words.last_mut() {
                *last = (1u64 << tail) - 1;
            }
        }
        Self {
            words,
            len: universe,
        }
    }

    /// Number of values still in the domain.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether exactly one value is left.
    pub fn is_bound(&self) -> bool {
        self.len == 1
    }

    /// The single remaining value, if bound.
    pub fn value(&self) -> Option<usize> {
        if self.is_bound() {
            self.min()
        } else {
            None
        }
    }

    pub fn contains(&self, value: usize) -> bool {
        self.words
            .get(value / WORD_BITS)
            .is_some_and(|w| (w >> (value % WORD_BITS)) & 1 == 1)
    }

    pub fn min(&self) -> Option<usize> {
        self.words
            .iter()
            .enumerate()
            .find(|(_, &w)| w != 0)
            .map(|(i, &w)| i * WORD_BITS + w.trailing_zeros() as usize)
    }

    pub fn max(&self) -> Option<usize> {
        self.words
            .iter()
            .enumerate()
            .rev()
            .find(|(_, &w)| w != 0)
            .map(|(i, &w)| i * WORD_BITS + (WORD_BITS - 1 - w.leading_zeros() as usize))
    }

    /// Iterates remaining values in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &w)| {
            SetBits(w).map(move |bit| i * WORD_BITS + bit)
        })
    }

    /// Removes `value`. Returns whether the domain changed.
    pub fn remove(&mut self, value: usize) -> bool {
        if !self.contains(value) {
            return false;
        }
        self.words[value / WORD_BITS] &= !(1u64 << (value % WORD_BITS));
        self.len -= 1;
        true
    }

    /// Reduces the domain to `{value}`, or empties it when `value` is absent.
    pub fn assign(&mut self, value: usize) -> bool {
        let present = self.contains(value);
        let before = self.len;
        self.words.iter_mut().for_each(|w| *w = 0);
        if present {
            self.words[value / WORD_BITS] = 1u64 << (value % WORD_BITS);
            self.len = 1;
        } else {
            self.len = 0;
        }
        before != self.len
    }

    /// Removes every value `>= bound`.
    pub fn remove_from(&mut self, bound: usize) -> bool {
        let word = bound / WORD_BITS;
        if word >= self.words.len() {
            return false;
        }
        self.words[word] &= (1u64 << (bound % WORD_BITS)).wrapping_sub(1);
        self.words[word + 1..].iter_mut().for_each(|w| *w = 0);
        self.recount()
    }

    /// Removes every value `< bound`.
    pub fn remove_below(&mut self, bound: usize) -> bool {
        let word = (bound / WORD_BITS).min(self.words.len());
        self.words[..word].iter_mut().for_each(|w| *w = 0);
        if let Some(w) = self.words.get_mut(word) {
            *w &= !((1u64 << (bound % WORD_BITS)) - 1);
        }
        self.recount()
    }

    /// Size of the union of several domains.
    pub fn union_len<'a>(domains: impl IntoIterator<Item = &'a Domain>) -> usize {
        let mut union: Vec<u64> = Vec::new();
        for d in domains {
            if union.len() < d.words.len() {
                union.resize(d.words.len(), 0);
            }
            for (u, w) in union.iter_mut().zip(&d.words) {
                *u |= w;
            }
        }
        union.iter().map(|w| w.count_ones() as usize).sum()
    }

    fn recount(&mut self) -> bool {
        let len = self.words.iter().map(|w| w.count_ones() as usize).sum();
        let changed = len != self.len;
        self.len = len;
        changed
    }
}

struct SetBits(u64);

impl Iterator for SetBits {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let bit = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(bit)
    }
}
