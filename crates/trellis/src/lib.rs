//! Trellis: a hierarchical standard item model.
//!
//! Trellis provides the classic Model/View "standard item" pair for Rust
//! applications: [`model::StandardItem`] nodes carrying role-keyed data and
//! a dense two-dimensional child table, and [`model::StandardItemModel`]
//! presenting the item tree as an indexable table with header items,
//! recursive stable sorting, persistent indexes, and a drag-and-drop
//! serialization format.
//!
//! Change notification is synchronous, via the signal system in
//! [`trellis_core`]; the model is designed to be driven from a single
//! thread.
//!
//! # Quick start
//!
//! ```
//! use trellis::model::{ItemModel, ModelIndex, SortOrder, StandardItem, StandardItemModel};
//!
//! let model = StandardItemModel::new();
//! for name in ["cherry", "apple", "banana"] {
//!     model.append_row(vec![StandardItem::with_text(name)]);
//! }
//!
//! model.sort(0, SortOrder::Ascending);
//!
//! let first = model.index(0, 0, &ModelIndex::invalid());
//! assert_eq!(model.display_text(&first).as_deref(), Some("apple"));
//! ```

pub mod model;

pub use model::{
    ItemModel, ItemRole, ItemValue, ModelIndex, PersistentModelIndex, SortOrder, StandardItem,
    StandardItemModel,
};
