//! Model indexes for addressing items in a standard item model.
//!
//! A [`ModelIndex`] is a transient locator: the row and column of a cell
//! within its parent item's child table, plus a non-owning reference to that
//! parent item. Indexes are cheap to create and compare, and should be used
//! immediately rather than stored — structural mutations (insertions,
//! removals, sorting) can leave a stored index pointing at the wrong cell.
//!
//! For long-lived references, use [`PersistentModelIndex`]: the model keeps
//! every registered persistent index up to date across sorting and
//! row/column insertion, and explicitly invalidates it when the referenced
//! item is removed.

use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::item::{ItemRef, StandardItem, WeakItemRef};

/// Represents a position within a standard item model.
///
/// Each index contains a row and column within a parent item, and a
/// non-owning reference to that parent. The invisible root is never itself
/// addressed by an index; top-level cells have the root as their parent
/// reference.
///
/// # Index Validity
///
/// An index is invalid when it has no parent reference (the "root index"
/// used as a parent argument for top-level queries) or when the parent item
/// it referenced no longer exists.
#[derive(Clone, Default)]
pub struct ModelIndex {
    /// The row within the parent.
    row: usize,
    /// The column within the parent.
    column: usize,
    /// The item owning the addressed child slot. `None` marks the invalid
    /// (root) index.
    parent: Option<WeakItemRef>,
}

impl ModelIndex {
    /// Creates an invalid (null) model index.
    ///
    /// An invalid index is used to represent:
    /// - The root of the model (as a parent argument)
    /// - A non-existent or out-of-bounds item
    /// - An uninitialized index
    ///
    /// # Example
    ///
    /// ```
    /// use trellis::model::ModelIndex;
    ///
    /// let root = ModelIndex::invalid();
    /// assert!(!root.is_valid());
    /// ```
    #[inline]
    pub const fn invalid() -> Self {
        Self {
            row: 0,
            column: 0,
            parent: None,
        }
    }

    /// Creates a valid index addressing `(row, column)` under `parent`.
    #[inline]
    pub(crate) fn new(row: usize, column: usize, parent: WeakItemRef) -> Self {
        Self {
            row,
            column,
            parent: Some(parent),
        }
    }

    /// Returns `true` if this index addresses an existing parent item.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.parent
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Returns the row of this index within its parent.
    ///
    /// Returns 0 for invalid indices.
    #[inline]
    pub fn row(&self) -> usize {
        self.row
    }

    /// Returns the column of this index within its parent.
    ///
    /// Returns 0 for invalid indices.
    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    /// Returns the item that owns the addressed child slot, or `None` for an
    /// invalid index.
    pub fn parent_item(&self) -> Option<StandardItem> {
        let inner = self.parent.as_ref()?.upgrade()?;
        Some(StandardItem::from_ref(inner))
    }

    /// Returns the index of the parent item itself, or an invalid index when
    /// the parent is the invisible root (or the index is invalid).
    pub fn parent(&self) -> ModelIndex {
        let Some(parent) = self.parent_item() else {
            return ModelIndex::invalid();
        };
        let Some((row, column)) = parent.position() else {
            return ModelIndex::invalid();
        };
        match parent.parent_ref() {
            Some(grandparent) => ModelIndex::new(row, column, Arc::downgrade(&grandparent)),
            None => ModelIndex::invalid(),
        }
    }

    /// Creates a sibling index at the given row and column.
    ///
    /// This is equivalent to an index at `(row, column)` with the same
    /// parent as this index. Returns an invalid index if this index is
    /// invalid.
    ///
    /// Note: this creates the index structure but doesn't validate bounds
    /// against a model. Use with model methods for validation.
    #[inline]
    pub fn sibling(&self, row: usize, column: usize) -> ModelIndex {
        match &self.parent {
            Some(parent) if self.is_valid() => ModelIndex::new(row, column, parent.clone()),
            _ => ModelIndex::invalid(),
        }
    }

    /// Creates a sibling at the same column but a different row.
    #[inline]
    pub fn sibling_at_row(&self, row: usize) -> ModelIndex {
        self.sibling(row, self.column)
    }

    /// Creates a sibling at the same row but a different column.
    #[inline]
    pub fn sibling_at_column(&self, column: usize) -> ModelIndex {
        self.sibling(self.row, column)
    }

    /// Upgrades the parent reference, if the index is valid.
    pub(crate) fn parent_ref(&self) -> Option<ItemRef> {
        self.parent.as_ref()?.upgrade()
    }

    /// The parent item's address, for identity comparisons without
    /// upgrading.
    pub(crate) fn parent_ptr_usize(&self) -> Option<usize> {
        self.parent.as_ref().map(|weak| weak.as_ptr() as usize)
    }

    /// Returns `true` if this index and `other` address a slot under the
    /// same parent item.
    pub(crate) fn same_parent(&self, other: &ModelIndex) -> bool {
        match (&self.parent, &other.parent) {
            (Some(a), Some(b)) => Weak::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Replaces the addressed position, keeping the parent reference.
    pub(crate) fn set_position(&mut self, row: usize, column: usize) {
        self.row = row;
        self.column = column;
    }

    /// Turns this index into the invalid index.
    pub(crate) fn clear(&mut self) {
        *self = ModelIndex::invalid();
    }
}

impl std::fmt::Debug for ModelIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            f.debug_struct("ModelIndex")
                .field("row", &self.row)
                .field("column", &self.column)
                .finish()
        } else {
            write!(f, "ModelIndex(invalid)")
        }
    }
}

impl PartialEq for ModelIndex {
    fn eq(&self, other: &Self) -> bool {
        // Two invalid indices are equal
        if !self.is_valid() && !other.is_valid() {
            return true;
        }
        // One valid, one invalid are not equal
        if self.is_valid() != other.is_valid() {
            return false;
        }
        // Both valid: compare position and parent identity
        self.row == other.row && self.column == other.column && self.same_parent(other)
    }
}

impl Eq for ModelIndex {}

impl Hash for ModelIndex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let valid = self.is_valid();
        valid.hash(state);
        if valid {
            self.row.hash(state);
            self.column.hash(state);
            if let Some(parent) = &self.parent {
                (parent.as_ptr() as usize).hash(state);
            }
        }
    }
}

/// The shared cell behind a [`PersistentModelIndex`].
pub(crate) type PersistentCell = Arc<RwLock<ModelIndex>>;

/// A long-lived model index that survives structural mutations.
///
/// Created via `StandardItemModel::persistent_index`. The model updates the
/// referenced position when rows or columns are inserted before it or when
/// sorting moves the referenced item, and invalidates it when the item is
/// removed or the model is cleared.
///
/// Clones share the same underlying cell: remapping is visible through every
/// clone. Dropping the last handle unregisters the cell from the model.
///
/// # Example
///
/// ```ignore
/// let persistent = model.persistent_index(&model.index(2, 0, &ModelIndex::invalid()));
/// model.sort(0, SortOrder::Descending);
/// // `persistent` now reports the item's post-sort row.
/// let current = persistent.index();
/// ```
#[derive(Clone)]
pub struct PersistentModelIndex {
    cell: PersistentCell,
}

impl PersistentModelIndex {
    pub(crate) fn from_cell(cell: PersistentCell) -> Self {
        Self { cell }
    }

    /// Returns the current position as a transient index.
    pub fn index(&self) -> ModelIndex {
        self.cell.read().clone()
    }

    /// Returns `true` if the referenced item still exists in the model.
    pub fn is_valid(&self) -> bool {
        self.cell.read().is_valid()
    }

    /// Returns the current row, or 0 if invalidated.
    pub fn row(&self) -> usize {
        self.cell.read().row()
    }

    /// Returns the current column, or 0 if invalidated.
    pub fn column(&self) -> usize {
        self.cell.read().column()
    }
}

impl std::fmt::Debug for PersistentModelIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PersistentModelIndex")
            .field(&self.index())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemModel, StandardItemModel};

    #[test]
    fn test_invalid_index() {
        let index = ModelIndex::invalid();
        assert!(!index.is_valid());
        assert_eq!(index.row(), 0);
        assert_eq!(index.column(), 0);
        assert!(index.parent_item().is_none());
        assert!(!index.parent().is_valid());
    }

    #[test]
    fn test_equality() {
        // Two invalid indices are equal
        assert_eq!(ModelIndex::invalid(), ModelIndex::invalid());

        let model = StandardItemModel::with_dimensions(2, 2);
        let a = model.index(1, 0, &ModelIndex::invalid());
        let b = model.index(1, 0, &ModelIndex::invalid());
        let c = model.index(0, 1, &ModelIndex::invalid());

        assert!(a.is_valid());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, ModelIndex::invalid());
    }

    #[test]
    fn test_sibling() {
        let model = StandardItemModel::with_dimensions(3, 2);
        let index = model.index(1, 0, &ModelIndex::invalid());

        let sibling = index.sibling(2, 1);
        assert!(sibling.is_valid());
        assert_eq!(sibling.row(), 2);
        assert_eq!(sibling.column(), 1);
        assert_eq!(sibling, model.index(2, 1, &ModelIndex::invalid()));

        assert_eq!(index.sibling_at_row(0), model.index(0, 0, &ModelIndex::invalid()));
        assert_eq!(index.sibling_at_column(1), model.index(1, 1, &ModelIndex::invalid()));
    }

    #[test]
    fn test_index_outlives_model() {
        let index;
        {
            let model = StandardItemModel::with_dimensions(1, 1);
            index = model.index(0, 0, &ModelIndex::invalid());
            assert!(index.is_valid());
        }
        // The parent item is gone with the model; the index reports invalid.
        assert!(!index.is_valid());
        assert_eq!(index, ModelIndex::invalid());
    }
}
