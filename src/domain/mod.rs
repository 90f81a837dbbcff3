//! Marketplace domain: catalog, aggregates, events and the aggregate root.
pub mod aggregates;
pub mod catalog;
pub mod events;
pub mod marketplace;
pub mod value_objects;

pub use catalog::{Catalog, CategoryFilter, ProductFilter, SortOrder};
pub use marketplace::{Marketplace, View};
