use std::{fmt::Debug, hash::Hash};

use itertools::Itertools;

/// A symbol of an alphabet, which is also the type of the letters of a word.
pub trait Symbol: PartialEq + Eq + Debug + Copy + Ord + PartialOrd + Hash {}
impl<S: PartialEq + Eq + Debug + Copy + Ord + PartialOrd + Hash> Symbol for S {}

/// An alphabet abstracts a finite, ordered collection of [`Symbol`]s. The order is fixed,
/// so a symbol can be identified with its position in [`Alphabet::universe`].
pub trait Alphabet: Clone + Debug + PartialEq {
    /// The type of symbols in this alphabet.
    type Symbol: Symbol;

    /// Type of iterator over all symbols in the alphabet.
    type Universe<'this>: Iterator<Item = Self::Symbol>
    where
        Self: 'this;

    /// Returns an iterator over all symbols of the alphabet, in their fixed order.
    fn universe(&self) -> Self::Universe<'_>;

    /// Returns the number of symbols in the alphabet.
    fn size(&self) -> usize;

    /// Returns true if the alphabet has no symbols.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns the position of `symbol` in the universe, or `None` if it is not part of the alphabet.
    fn position(&self, symbol: Self::Symbol) -> Option<usize>;

    /// Returns true if `symbol` belongs to the alphabet.
    fn contains(&self, symbol: Self::Symbol) -> bool {
        self.position(symbol).is_some()
    }
}

/// Represents an alphabet where a [`Symbol`] is just a single `char`. Symbols are kept sorted
/// and free of duplicates.
///
/// # Example
/// ```
/// use wofa::prelude::*;
///
/// let alphabet = CharAlphabet::from_iter(['b', 'a', 'b']);
/// assert_eq!(alphabet.size(), 2);
/// assert_eq!(alphabet.position('b'), Some(1));
/// ```
#[derive(Clone, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct CharAlphabet(Vec<char>);

impl CharAlphabet {
    /// Creates a new [`CharAlphabet`] alphabet of the given size. The symbols are just the first `size` letters
    /// of the alphabet, i.e. 'a' to 'z'.
    pub fn of_size(size: usize) -> Self {
        assert!(size <= 26, "Alphabet is too large");
        Self((0..size).map(|i| (b'a' + i as u8) as char).collect())
    }

    /// Returns the symbols of the alphabet as a slice.
    pub fn symbols(&self) -> &[char] {
        &self.0
    }
}

impl std::ops::Index<usize> for CharAlphabet {
    type Output = char;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl FromIterator<char> for CharAlphabet {
    fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
        Self(iter.into_iter().unique().sorted().collect())
    }
}

impl std::fmt::Display for CharAlphabet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.0.iter().join(", "))
    }
}

impl Alphabet for CharAlphabet {
    type Symbol = char;

    type Universe<'this> = std::iter::Copied<std::slice::Iter<'this, char>>
        where
            Self: 'this;

    fn universe(&self) -> Self::Universe<'_> {
        self.0.iter().copied()
    }

    fn size(&self) -> usize {
        self.0.len()
    }

    fn position(&self, symbol: char) -> Option<usize> {
        self.0.binary_search(&symbol).ok()
    }
}
