//! The standard item model.
//!
//! This module provides a mutable, observable, hierarchical table of items
//! in the Model/View tradition: data lives in [`StandardItem`] nodes, a
//! [`StandardItemModel`] presents the tree as an indexable table, and views
//! stay synchronized through the model's change signals.
//!
//! # Core Types
//!
//! - [`StandardItem`]: a node holding role-keyed data and a 2-D child table
//! - [`StandardItemModel`]: the model owning the invisible root and headers
//! - [`ModelIndex`]: a transient `(row, column, parent)` locator
//! - [`PersistentModelIndex`]: a locator kept valid across mutations
//! - [`ItemRole`] / [`ItemValue`]: what facet of an item is addressed, and
//!   the type-erased value stored there
//! - [`ItemModel`]: the trait views program against
//! - [`ModelSignals`]: change notifications
//! - [`ItemDragData`] / [`DropAction`]: drag-and-drop payloads
//!
//! # Example
//!
//! ```
//! use trellis::model::{ItemModel, ModelIndex, StandardItem, StandardItemModel};
//!
//! // Build a small table
//! let model = StandardItemModel::new();
//! model.append_row(vec![
//!     StandardItem::with_text("Alice"),
//!     StandardItem::with_text("Engineering"),
//! ]);
//! model.append_row(vec![
//!     StandardItem::with_text("Bob"),
//!     StandardItem::with_text("Sales"),
//! ]);
//! model.set_horizontal_header_labels(&["Name", "Department"]);
//!
//! // Query it through the view-facing interface
//! let index = model.index(1, 0, &ModelIndex::invalid());
//! assert_eq!(model.display_text(&index).as_deref(), Some("Bob"));
//!
//! // Observe changes
//! model.signals().item_changed.connect(|item| {
//!     println!("changed: {:?}", item.text());
//! });
//! model.item(0, 0).unwrap().set_text("Alicia");
//! ```

mod index;
mod item;
mod mime;
mod role;
mod standard_model;
mod traits;

pub use index::{ModelIndex, PersistentModelIndex};
pub use item::{SortOrder, StandardItem};
pub use mime::{DropAction, ITEM_LIST_MIME, ItemDragData, PayloadDecodeError};
pub use role::{
    Alignment, CheckState, HorizontalAlignment, ItemRole, ItemValue, VerticalAlignment,
    value_ordering,
};
pub use standard_model::StandardItemModel;
pub use traits::{ItemFlags, ItemModel, ModelSignals, Orientation};
