//! Random selection of response content.

use rand::prelude::IndexedRandom;

/// Pick one element uniformly at random, or `None` for an empty slice.
#[must_use]
pub fn pick<T>(items: &[T]) -> Option<&T> {
    items.choose(&mut rand::rng())
}
