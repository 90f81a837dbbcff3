//! Wishlist Aggregate

use serde::Serialize;
use std::collections::BTreeSet;
use crate::domain::value_objects::ProductId;

/// Saved-for-later product ids. Independent of the cart.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Wishlist {
    ids: BTreeSet<ProductId>,
}

impl Wishlist {
    pub fn new() -> Self { Self::default() }

    pub fn contains(&self, id: ProductId) -> bool { self.ids.contains(&id) }
    pub fn len(&self) -> usize { self.ids.len() }
    pub fn is_empty(&self) -> bool { self.ids.is_empty() }
    pub fn ids(&self) -> impl Iterator<Item = ProductId> + '_ { self.ids.iter().copied() }

    pub fn add(&mut self, id: ProductId) -> bool { self.ids.insert(id) }
    pub fn remove(&mut self, id: ProductId) -> bool { self.ids.remove(&id) }

    /// Flips membership and returns whether `id` is now saved.
    pub fn toggle(&mut self, id: ProductId) -> bool {
        if self.ids.remove(&id) { false } else { self.ids.insert(id) }
    }
}
