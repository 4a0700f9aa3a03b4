//! The standard item model: a table/tree view over a tree of
//! [`StandardItem`]s.
//!
//! `StandardItemModel` owns an invisible root item whose child table forms
//! the model's top level, plus separate row and column header item arrays
//! kept in lockstep with the root's dimensions. It translates the item tree
//! into the [`ItemModel`] abstraction (index ↔ item mapping), keeps
//! registered persistent indexes valid across sorting and row/column
//! insertion, and serializes selections for drag and drop.
//!
//! # Example
//!
//! ```
//! use trellis::model::{ItemModel, ModelIndex, StandardItem, StandardItemModel};
//!
//! let model = StandardItemModel::new();
//! model.append_row(vec![
//!     StandardItem::with_text("alpha"),
//!     StandardItem::with_text("beta"),
//! ]);
//!
//! let index = model.index(0, 1, &ModelIndex::invalid());
//! assert_eq!(model.display_text(&index).as_deref(), Some("beta"));
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use trellis_core::logging::targets;

use super::index::{ModelIndex, PersistentCell, PersistentModelIndex};
use super::item::{SortOrder, StandardItem};
use super::mime::{self, DropAction, ItemDragData};
use super::role::{ItemRole, ItemValue};
use super::traits::{ItemFlags, ItemModel, ModelSignals, Orientation};

/// Factory used to manufacture items on demand (lazy cell materialization,
/// header items, drop decoding).
type ItemFactory = Arc<dyn Fn() -> StandardItem + Send + Sync>;

/// State shared between the model handle, its items, and registered
/// persistent indexes.
pub(crate) struct ModelShared {
    /// The invisible root; replaced wholesale by `clear()`.
    root: RwLock<StandardItem>,
    /// Column header items; length tracks the root's column count.
    column_headers: RwLock<Vec<Option<StandardItem>>>,
    /// Row header items; length tracks the root's row count.
    row_headers: RwLock<Vec<Option<StandardItem>>>,
    /// Role used to fetch comparison values when sorting.
    sort_role: RwLock<ItemRole>,
    /// Optional item factory (prototype clone).
    factory: RwLock<Option<ItemFactory>>,
    signals: ModelSignals,
    /// Registered persistent index cells, weakly held so dropping the last
    /// user handle unregisters the cell.
    persistent: Mutex<Vec<Weak<RwLock<ModelIndex>>>>,
}

impl ModelShared {
    fn new() -> Self {
        Self {
            root: RwLock::new(StandardItem::new()),
            column_headers: RwLock::new(Vec::new()),
            row_headers: RwLock::new(Vec::new()),
            sort_role: RwLock::new(ItemRole::Display),
            factory: RwLock::new(None),
            signals: ModelSignals::new(),
            persistent: Mutex::new(Vec::new()),
        }
    }

    fn root_item(&self) -> StandardItem {
        self.root.read().clone()
    }

    pub(crate) fn is_root(&self, item: &StandardItem) -> bool {
        self.root.read().ptr_eq(item)
    }

    pub(crate) fn sort_role(&self) -> ItemRole {
        *self.sort_role.read()
    }

    // -------------------------------------------------------------------------
    // Structural hooks, called by item operations while attached
    // -------------------------------------------------------------------------

    pub(crate) fn rows_about_to_be_inserted(&self, parent: &StandardItem, first: usize, last: usize) {
        self.signals
            .rows_about_to_be_inserted
            .emit((parent.index(), first, last));
    }

    pub(crate) fn rows_inserted(&self, parent: &StandardItem, row: usize, count: usize) {
        if self.is_root(parent) {
            let mut headers = self.row_headers.write();
            headers.splice(row..row, std::iter::repeat_with(|| None).take(count));
        }
        self.persistent_sections_inserted(parent, Orientation::Vertical, row, count);
        self.signals
            .rows_inserted
            .emit((parent.index(), row, row + count - 1));
    }

    pub(crate) fn rows_about_to_be_removed(&self, parent: &StandardItem, first: usize, last: usize) {
        self.signals
            .rows_about_to_be_removed
            .emit((parent.index(), first, last));
    }

    pub(crate) fn rows_removed(&self, parent: &StandardItem, row: usize, count: usize) {
        if self.is_root(parent) {
            let removed: Vec<Option<StandardItem>> = {
                let mut headers = self.row_headers.write();
                headers.drain(row..row + count).collect()
            };
            for header in removed.into_iter().flatten() {
                header.set_model_recursive(None);
            }
        }
        self.persistent_sections_removed(parent, Orientation::Vertical, row, count);
        self.signals
            .rows_removed
            .emit((parent.index(), row, row + count - 1));
    }

    pub(crate) fn columns_about_to_be_inserted(
        &self,
        parent: &StandardItem,
        first: usize,
        last: usize,
    ) {
        self.signals
            .columns_about_to_be_inserted
            .emit((parent.index(), first, last));
    }

    pub(crate) fn columns_inserted(&self, parent: &StandardItem, column: usize, count: usize) {
        if self.is_root(parent) {
            let mut headers = self.column_headers.write();
            headers.splice(column..column, std::iter::repeat_with(|| None).take(count));
        }
        self.persistent_sections_inserted(parent, Orientation::Horizontal, column, count);
        self.signals
            .columns_inserted
            .emit((parent.index(), column, column + count - 1));
    }

    pub(crate) fn columns_about_to_be_removed(
        &self,
        parent: &StandardItem,
        first: usize,
        last: usize,
    ) {
        self.signals
            .columns_about_to_be_removed
            .emit((parent.index(), first, last));
    }

    pub(crate) fn columns_removed(&self, parent: &StandardItem, column: usize, count: usize) {
        if self.is_root(parent) {
            let removed: Vec<Option<StandardItem>> = {
                let mut headers = self.column_headers.write();
                headers.drain(column..column + count).collect()
            };
            for header in removed.into_iter().flatten() {
                header.set_model_recursive(None);
            }
        }
        self.persistent_sections_removed(parent, Orientation::Horizontal, column, count);
        self.signals
            .columns_removed
            .emit((parent.index(), column, column + count - 1));
    }

    /// Routes a data change to the right notification: header items raise
    /// `header_data_changed`, tree items raise `data_changed` and
    /// `item_changed`.
    pub(crate) fn item_changed(&self, item: &StandardItem) {
        if item.parent_ref().is_none() {
            if let Some(section) = section_of(&self.column_headers.read(), item) {
                self.signals
                    .header_data_changed
                    .emit((Orientation::Horizontal, section, section));
            } else if let Some(section) = section_of(&self.row_headers.read(), item) {
                self.signals
                    .header_data_changed
                    .emit((Orientation::Vertical, section, section));
            }
        } else {
            let index = item.index();
            if index.is_valid() {
                self.signals.data_changed.emit((index.clone(), index));
                self.signals.item_changed.emit(item.clone());
            }
        }
    }

    /// A cell was cleared; there is no item handle to report, so only the
    /// positional signal fires.
    pub(crate) fn cell_changed(&self, parent: &StandardItem, row: usize, column: usize) {
        let index = ModelIndex::new(row, column, parent.downgrade());
        self.signals.data_changed.emit((index.clone(), index));
    }

    pub(crate) fn layout_about_to_change(&self) {
        self.signals.layout_about_to_change.emit(());
    }

    pub(crate) fn layout_changed(&self) {
        self.signals.layout_changed.emit(());
    }

    // -------------------------------------------------------------------------
    // Persistent index registry
    // -------------------------------------------------------------------------

    fn for_each_cell(&self, mut f: impl FnMut(&PersistentCell)) {
        let mut cells = self.persistent.lock();
        cells.retain(|weak| weak.strong_count() > 0);
        for weak in cells.iter() {
            if let Some(cell) = weak.upgrade() {
                f(&cell);
            }
        }
    }

    pub(crate) fn register_persistent(&self, index: ModelIndex) -> PersistentModelIndex {
        let cell: PersistentCell = Arc::new(RwLock::new(index));
        self.persistent.lock().push(Arc::downgrade(&cell));
        PersistentModelIndex::from_cell(cell)
    }

    /// Invalidates every registered cell equal to `index`. Called while the
    /// referenced item is being detached, before its position changes.
    pub(crate) fn invalidate_persistent_index(&self, index: &ModelIndex) {
        self.for_each_cell(|cell| {
            let mut guard = cell.write();
            if *guard == *index {
                guard.clear();
            }
        });
    }

    /// Applies `(from, to)` position moves produced by sorting.
    pub(crate) fn change_persistent_indices(&self, changes: Vec<(ModelIndex, ModelIndex)>) {
        self.for_each_cell(|cell| {
            let mut guard = cell.write();
            if let Some((_, to)) = changes.iter().find(|(from, _)| *guard == *from) {
                *guard = to.clone();
            }
        });
    }

    fn invalidate_all_persistent(&self) {
        self.for_each_cell(|cell| cell.write().clear());
    }

    /// Shifts registered cells under `parent` after a section insertion.
    fn persistent_sections_inserted(
        &self,
        parent: &StandardItem,
        orientation: Orientation,
        first: usize,
        count: usize,
    ) {
        let parent_ptr = parent.as_ptr_usize();
        self.for_each_cell(|cell| {
            let mut guard = cell.write();
            if !guard.is_valid() || guard.parent_ptr_usize() != Some(parent_ptr) {
                return;
            }
            match orientation {
                Orientation::Vertical if guard.row() >= first => {
                    let (row, column) = (guard.row(), guard.column());
                    guard.set_position(row + count, column);
                }
                Orientation::Horizontal if guard.column() >= first => {
                    let (row, column) = (guard.row(), guard.column());
                    guard.set_position(row, column + count);
                }
                _ => {}
            }
        });
    }

    /// Shifts registered cells under `parent` after a section removal, and
    /// invalidates cells that pointed into the removed range (empty slots
    /// have no item whose detachment would have caught them).
    fn persistent_sections_removed(
        &self,
        parent: &StandardItem,
        orientation: Orientation,
        first: usize,
        count: usize,
    ) {
        let parent_ptr = parent.as_ptr_usize();
        self.for_each_cell(|cell| {
            let mut guard = cell.write();
            if !guard.is_valid() || guard.parent_ptr_usize() != Some(parent_ptr) {
                return;
            }
            let section = match orientation {
                Orientation::Vertical => guard.row(),
                Orientation::Horizontal => guard.column(),
            };
            if section >= first + count {
                match orientation {
                    Orientation::Vertical => {
                        let (row, column) = (guard.row(), guard.column());
                        guard.set_position(row - count, column)
                    }
                    Orientation::Horizontal => {
                        let (row, column) = (guard.row(), guard.column());
                        guard.set_position(row, column - count)
                    }
                }
            } else if section >= first {
                guard.clear();
            }
        });
    }
}

fn section_of(headers: &[Option<StandardItem>], item: &StandardItem) -> Option<usize> {
    headers
        .iter()
        .position(|slot| slot.as_ref().is_some_and(|header| header.ptr_eq(item)))
}

/// A generic model for storing custom data in a hierarchical table of
/// [`StandardItem`]s.
///
/// For lists and trees, create an empty model and use
/// [`append_row`](Self::append_row) to add items and
/// [`item`](Self::item) to access them. For tables, construct with
/// [`with_dimensions`](Self::with_dimensions) and position items with
/// [`set_item`](Self::set_item). Header labels are managed with
/// [`set_horizontal_header_labels`](Self::set_horizontal_header_labels) and
/// friends. [`clear`](Self::clear) removes everything, including headers.
///
/// Cloning the model clones the *handle*: both handles drive the same
/// shared model state.
///
/// # Example
///
/// ```
/// use trellis::model::{StandardItem, StandardItemModel};
///
/// // A 2-level tree: one top-level item with two children.
/// let model = StandardItemModel::new();
/// let parent = StandardItem::with_text("parent");
/// parent.append_row(vec![StandardItem::with_text("first child")]);
/// parent.append_row(vec![StandardItem::with_text("second child")]);
/// model.append_row(vec![parent.clone()]);
///
/// assert_eq!(model.item(0, 0), Some(parent));
/// ```
#[derive(Clone)]
pub struct StandardItemModel {
    shared: Arc<ModelShared>,
}

impl Default for StandardItemModel {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardItemModel {
    /// Constructs a new, empty item model.
    pub fn new() -> Self {
        let model = Self {
            shared: Arc::new(ModelShared::new()),
        };
        let root = model.shared.root_item();
        root.set_flags(ItemFlags::default().with_drop(true));
        root.attach_to_model(Arc::downgrade(&model.shared));
        model
    }

    /// Constructs a model that initially has `rows` rows and `columns`
    /// columns.
    pub fn with_dimensions(rows: usize, columns: usize) -> Self {
        let model = Self::new();
        model.set_column_count(columns);
        model.set_row_count(rows);
        model
    }

    pub(crate) fn from_shared(shared: Arc<ModelShared>) -> Self {
        Self { shared }
    }

    fn root(&self) -> StandardItem {
        self.shared.root_item()
    }

    /// Returns the model's invisible root item.
    ///
    /// The invisible root provides access to the model's top-level items
    /// through the [`StandardItem`] API, making it possible to treat
    /// top-level items and deeper items uniformly in recursive code. The
    /// root itself is never addressable through a [`ModelIndex`].
    pub fn invisible_root_item(&self) -> StandardItem {
        self.root()
    }

    /// Returns `true` if both handles drive the same model.
    pub fn ptr_eq(&self, other: &StandardItemModel) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    // -------------------------------------------------------------------------
    // Index ↔ item mapping
    // -------------------------------------------------------------------------

    /// Resolves an index without materializing anything: the invalid index
    /// maps to the root, a valid index to the occupant of its slot (if
    /// any). Foreign indexes resolve to `None`.
    pub(crate) fn item_for_index(&self, index: &ModelIndex) -> Option<StandardItem> {
        if !index.is_valid() {
            return Some(self.root());
        }
        let parent = index.parent_item()?;
        if !self.owns(&parent) {
            return None;
        }
        parent.child(index.row(), index.column())
    }

    fn owns(&self, item: &StandardItem) -> bool {
        item.model_shared()
            .is_some_and(|shared| Arc::ptr_eq(&shared, &self.shared))
    }

    /// Returns the item associated with the given index.
    ///
    /// If the addressed slot exists but holds no item yet, one is created
    /// on demand through the model's item factory (see
    /// [`set_item_prototype`](Self::set_item_prototype)) and installed in
    /// the slot, so that views can ask for any cell without the caller
    /// having pre-populated the whole table.
    ///
    /// Returns `None` for invalid indexes, indexes of other models, and
    /// positions outside the parent's current dimensions.
    pub fn item_from_index(&self, index: &ModelIndex) -> Option<StandardItem> {
        if !index.is_valid() {
            return None;
        }
        let parent = index.parent_item()?;
        if !self.owns(&parent) {
            return None;
        }
        let (row, column) = (index.row(), index.column());
        if row >= parent.row_count() || column >= parent.column_count() {
            return None;
        }
        if let Some(item) = parent.child(row, column) {
            return Some(item);
        }
        let item = self.create_item();
        parent.set_child_impl(row, column, Some(item.clone()), false);
        Some(item)
    }

    /// Returns the index associated with the given item, or the invalid
    /// index when the item is not part of this model.
    pub fn index_from_item(&self, item: &StandardItem) -> ModelIndex {
        if self.owns(item) {
            item.index()
        } else {
            ModelIndex::invalid()
        }
    }

    // -------------------------------------------------------------------------
    // Item factory
    // -------------------------------------------------------------------------

    pub(crate) fn create_item(&self) -> StandardItem {
        let factory = self.shared.factory.read().clone();
        match factory {
            Some(factory) => factory(),
            None => StandardItem::new(),
        }
    }

    /// Installs a factory the model invokes whenever it needs to
    /// manufacture an item on demand (lazy cell materialization, header
    /// creation, drop decoding).
    pub fn set_item_factory<F>(&self, factory: F)
    where
        F: Fn() -> StandardItem + Send + Sync + 'static,
    {
        *self.shared.factory.write() = Some(Arc::new(factory));
    }

    /// Sets the item prototype: on-demand items become
    /// [`clone_item`](StandardItem::clone_item) copies of `prototype`.
    /// Convenience over [`set_item_factory`](Self::set_item_factory).
    pub fn set_item_prototype(&self, prototype: StandardItem) {
        *self.shared.factory.write() = Some(Arc::new(move || prototype.clone_item()));
    }

    // -------------------------------------------------------------------------
    // Dimensions and top-level items
    // -------------------------------------------------------------------------

    /// Sets the number of top-level rows. Shrinking discards the data in
    /// the unwanted rows.
    pub fn set_row_count(&self, rows: usize) {
        self.root().set_row_count(rows);
    }

    /// Sets the number of top-level columns. Shrinking discards the data in
    /// the unwanted columns.
    pub fn set_column_count(&self, columns: usize) {
        self.root().set_column_count(columns);
    }

    /// Sets the item at `(row, column)`, growing the dimensions if needed.
    /// The model takes ownership; a previous occupant is destroyed.
    pub fn set_item(&self, row: usize, column: usize, item: StandardItem) -> bool {
        self.root().set_child(row, column, item)
    }

    /// Returns the item at `(row, column)` if one has been set.
    pub fn item(&self, row: usize, column: usize) -> Option<StandardItem> {
        self.root().child(row, column)
    }

    /// Removes the item at `(row, column)` without destroying it, releasing
    /// ownership to the caller. Dimensions are unchanged.
    pub fn take_item(&self, row: usize, column: usize) -> Option<StandardItem> {
        self.root().take_child(row, column)
    }

    /// Appends a top-level row containing `items`, growing the column count
    /// to fit.
    pub fn append_row(&self, items: Vec<StandardItem>) -> bool {
        self.root().append_row(items)
    }

    /// Appends one top-level row per item, each placed in column 0.
    pub fn append_rows(&self, items: Vec<StandardItem>) -> bool {
        self.root().append_rows(items)
    }

    /// Appends a top-level column containing `items`, growing the row count
    /// to fit.
    pub fn append_column(&self, items: Vec<StandardItem>) -> bool {
        self.root().append_column(items)
    }

    /// Inserts a top-level row at `row` containing `items`.
    pub fn insert_row(&self, row: usize, items: Vec<StandardItem>) -> bool {
        self.root().insert_row(row, items)
    }

    /// Inserts a top-level column at `column` containing `items`.
    pub fn insert_column(&self, column: usize, items: Vec<StandardItem>) -> bool {
        self.root().insert_column(column, items)
    }

    /// Removes `row` without destroying its items and returns them,
    /// detached. Unset slots yield `None`.
    pub fn take_row(&self, row: usize) -> Vec<Option<StandardItem>> {
        self.root().take_row(row)
    }

    /// Removes `column` without destroying its items and returns them,
    /// detached. Unset slots yield `None`.
    pub fn take_column(&self, column: usize) -> Vec<Option<StandardItem>> {
        self.root().take_column(column)
    }

    /// Inserts `count` empty rows before `row` under `parent` (the root for
    /// an invalid parent index).
    pub fn insert_rows(&self, row: usize, count: usize, parent: &ModelIndex) -> bool {
        match self.edit_target(parent) {
            Some(item) => item.insert_rows_impl(row, count, &[]),
            None => false,
        }
    }

    /// Inserts `count` empty columns before `column` under `parent`.
    pub fn insert_columns(&self, column: usize, count: usize, parent: &ModelIndex) -> bool {
        match self.edit_target(parent) {
            Some(item) => item.insert_columns_impl(column, count, &[]),
            None => false,
        }
    }

    /// Removes `count` rows starting at `row` under `parent`, destroying
    /// their items.
    pub fn remove_rows(&self, row: usize, count: usize, parent: &ModelIndex) -> bool {
        match self.item_for_index(parent) {
            Some(item) => item.remove_rows(row, count),
            None => false,
        }
    }

    /// Removes `count` columns starting at `column` under `parent`,
    /// destroying their items.
    pub fn remove_columns(&self, column: usize, count: usize, parent: &ModelIndex) -> bool {
        match self.item_for_index(parent) {
            Some(item) => item.remove_columns(column, count),
            None => false,
        }
    }

    /// The item structural edits apply to: the root for an invalid parent
    /// index, otherwise the (lazily materialized) item at `parent`.
    fn edit_target(&self, parent: &ModelIndex) -> Option<StandardItem> {
        if parent.is_valid() {
            self.item_from_index(parent)
        } else {
            Some(self.root())
        }
    }

    /// Removes all items (including header items) from the model and sets
    /// the row and column counts to zero. All registered persistent indexes
    /// are invalidated.
    pub fn clear(&self) {
        self.shared.signals.model_about_to_reset.emit(());
        self.shared.invalidate_all_persistent();

        let old_root = self.root();
        old_root.set_model_recursive(None);
        for header in self.shared.column_headers.write().drain(..).flatten() {
            header.set_model_recursive(None);
        }
        for header in self.shared.row_headers.write().drain(..).flatten() {
            header.set_model_recursive(None);
        }

        let new_root = StandardItem::new();
        new_root.set_flags(ItemFlags::default().with_drop(true));
        new_root.attach_to_model(Arc::downgrade(&self.shared));
        *self.shared.root.write() = new_root;

        self.shared.signals.model_reset.emit(());
    }

    // -------------------------------------------------------------------------
    // Header items
    // -------------------------------------------------------------------------

    /// Sets the horizontal (column) header item for `column`, growing the
    /// column count if needed. The previous header item is destroyed. An
    /// item that already belongs to a model or a parent is rejected with a
    /// logged warning.
    pub fn set_horizontal_header_item(&self, column: usize, item: StandardItem) -> bool {
        self.set_header_item(Orientation::Horizontal, column, item)
    }

    /// Sets the vertical (row) header item for `row`. See
    /// [`set_horizontal_header_item`](Self::set_horizontal_header_item).
    pub fn set_vertical_header_item(&self, row: usize, item: StandardItem) -> bool {
        self.set_header_item(Orientation::Vertical, row, item)
    }

    fn set_header_item(&self, orientation: Orientation, section: usize, item: StandardItem) -> bool {
        match orientation {
            Orientation::Horizontal => {
                if self.root().column_count() <= section {
                    self.set_column_count(section + 1);
                }
            }
            Orientation::Vertical => {
                if self.root().row_count() <= section {
                    self.set_row_count(section + 1);
                }
            }
        }
        let headers = match orientation {
            Orientation::Horizontal => &self.shared.column_headers,
            Orientation::Vertical => &self.shared.row_headers,
        };
        let old = headers.read()[section].clone();
        if old.as_ref().is_some_and(|old_item| old_item.ptr_eq(&item)) {
            return true;
        }
        if item.model_shared().is_some() || item.parent_ref().is_some() {
            tracing::warn!(
                target: targets::MODEL,
                "set_header_item: ignoring duplicate insertion of an attached item"
            );
            return false;
        }
        item.attach_to_model(Arc::downgrade(&self.shared));
        if let Some(old_item) = &old {
            old_item.set_model_recursive(None);
        }
        headers.write()[section] = Some(item);
        self.shared
            .signals
            .header_data_changed
            .emit((orientation, section, section));
        true
    }

    /// Returns the horizontal header item for `column` if one has been set.
    pub fn horizontal_header_item(&self, column: usize) -> Option<StandardItem> {
        self.shared.column_headers.read().get(column).cloned().flatten()
    }

    /// Returns the vertical header item for `row` if one has been set.
    pub fn vertical_header_item(&self, row: usize) -> Option<StandardItem> {
        self.shared.row_headers.read().get(row).cloned().flatten()
    }

    /// Removes the horizontal header item at `column` without destroying
    /// it, releasing ownership to the caller.
    pub fn take_horizontal_header_item(&self, column: usize) -> Option<StandardItem> {
        let item = {
            let mut headers = self.shared.column_headers.write();
            headers.get_mut(column)?.take()
        };
        if let Some(header) = &item {
            header.set_model_recursive(None);
        }
        item
    }

    /// Removes the vertical header item at `row` without destroying it,
    /// releasing ownership to the caller.
    pub fn take_vertical_header_item(&self, row: usize) -> Option<StandardItem> {
        let item = {
            let mut headers = self.shared.row_headers.write();
            headers.get_mut(row)?.take()
        };
        if let Some(header) = &item {
            header.set_model_recursive(None);
        }
        item
    }

    /// Sets the horizontal header labels, growing the column count to fit
    /// and lazily materializing header items.
    pub fn set_horizontal_header_labels<S: AsRef<str>>(&self, labels: &[S]) {
        if self.root().column_count() < labels.len() {
            self.set_column_count(labels.len());
        }
        for (section, label) in labels.iter().enumerate() {
            let item = match self.horizontal_header_item(section) {
                Some(item) => item,
                None => {
                    let item = self.create_item();
                    self.set_horizontal_header_item(section, item.clone());
                    item
                }
            };
            item.set_text(label.as_ref());
        }
    }

    /// Sets the vertical header labels, growing the row count to fit and
    /// lazily materializing header items.
    pub fn set_vertical_header_labels<S: AsRef<str>>(&self, labels: &[S]) {
        if self.root().row_count() < labels.len() {
            self.set_row_count(labels.len());
        }
        for (section, label) in labels.iter().enumerate() {
            let item = match self.vertical_header_item(section) {
                Some(item) => item,
                None => {
                    let item = self.create_item();
                    self.set_vertical_header_item(section, item.clone());
                    item
                }
            };
            item.set_text(label.as_ref());
        }
    }

    // -------------------------------------------------------------------------
    // Sorting
    // -------------------------------------------------------------------------

    /// The role used to fetch comparison values when sorting. Defaults to
    /// [`ItemRole::Display`].
    pub fn sort_role(&self) -> ItemRole {
        self.shared.sort_role()
    }

    /// Sets the role used to fetch comparison values when sorting.
    pub fn set_sort_role(&self, role: ItemRole) {
        *self.shared.sort_role.write() = role;
    }

    /// Sorts the whole model recursively by `column`, bracketed by
    /// layout-change signals. Persistent indexes of moved rows are
    /// remapped.
    pub fn sort(&self, column: usize, order: SortOrder) {
        self.root().sort_children(column, order);
    }

    // -------------------------------------------------------------------------
    // Searching
    // -------------------------------------------------------------------------

    /// Returns the top-level items in `column` whose display text equals
    /// `text`.
    pub fn find_items(&self, text: &str, column: usize) -> Vec<StandardItem> {
        let root = self.root();
        (0..root.row_count())
            .filter_map(|row| root.child(row, column))
            .filter(|item| item.text().as_deref() == Some(text))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Bulk role data
    // -------------------------------------------------------------------------

    /// Returns all role data of the item at `index` (excluding the reserved
    /// flags role), keyed by numeric role value.
    pub fn item_data(&self, index: &ModelIndex) -> BTreeMap<u32, ItemValue> {
        if !index.is_valid() {
            return BTreeMap::new();
        }
        self.item_for_index(index)
            .map(|item| item.item_data())
            .unwrap_or_default()
    }

    /// Replaces the role data of the item at `index` (lazily materializing
    /// it) with `values`.
    pub fn set_item_data(&self, index: &ModelIndex, values: BTreeMap<u32, ItemValue>) -> bool {
        match self.item_from_index(index) {
            Some(item) => {
                item.set_item_data(values);
                true
            }
            None => false,
        }
    }

    // -------------------------------------------------------------------------
    // Persistent indexes
    // -------------------------------------------------------------------------

    /// Registers `index` as a persistent index: the returned handle is kept
    /// pointing at the same item across sorting and row/column insertion,
    /// and is invalidated when the item is removed or the model cleared.
    pub fn persistent_index(&self, index: &ModelIndex) -> PersistentModelIndex {
        let registered = if index.is_valid()
            && index
                .parent_item()
                .is_some_and(|parent| self.owns(&parent))
        {
            index.clone()
        } else {
            ModelIndex::invalid()
        };
        self.shared.register_persistent(registered)
    }

    // -------------------------------------------------------------------------
    // Drag and drop
    // -------------------------------------------------------------------------

    /// The drop actions this model supports: copy and move.
    pub fn supported_drop_actions(&self) -> DropAction {
        DropAction::COPY | DropAction::MOVE
    }

    /// The MIME types the model can serialize to and decode from.
    pub fn mime_types(&self) -> Vec<String> {
        vec![mime::ITEM_LIST_MIME.to_string()]
    }

    /// Serializes the items at `indexes` (deduplicated to the selection's
    /// true roots, then each with its full subtree) into a drag payload.
    pub fn mime_data(&self, indexes: &[ModelIndex]) -> ItemDragData {
        mime::encode_items(self, indexes)
    }

    /// Decodes a drag payload and inserts the reconstructed items under
    /// `parent` at `row` (append when `None`), auto-expanding the
    /// destination and spilling colliding cells into extra rows.
    ///
    /// Returns `false` when the action or payload format is unsupported or
    /// the payload is malformed.
    pub fn drop_mime_data(
        &self,
        data: &ItemDragData,
        action: DropAction,
        row: Option<usize>,
        column: Option<usize>,
        parent: &ModelIndex,
    ) -> bool {
        mime::drop_item_data(self, data, action, row, column, parent)
    }
}

impl ItemModel for StandardItemModel {
    fn row_count(&self, parent: &ModelIndex) -> usize {
        self.item_for_index(parent)
            .map(|item| item.row_count())
            .unwrap_or(0)
    }

    fn column_count(&self, parent: &ModelIndex) -> usize {
        self.item_for_index(parent)
            .map(|item| item.column_count())
            .unwrap_or(0)
    }

    fn data(&self, index: &ModelIndex, role: ItemRole) -> ItemValue {
        if !index.is_valid() {
            return ItemValue::None;
        }
        self.item_for_index(index)
            .map(|item| item.data(role))
            .unwrap_or(ItemValue::None)
    }

    fn index(&self, row: usize, column: usize, parent: &ModelIndex) -> ModelIndex {
        let Some(parent_item) = self.item_for_index(parent) else {
            return ModelIndex::invalid();
        };
        if row >= parent_item.row_count() || column >= parent_item.column_count() {
            return ModelIndex::invalid();
        }
        ModelIndex::new(row, column, parent_item.downgrade())
    }

    fn parent(&self, index: &ModelIndex) -> ModelIndex {
        index.parent()
    }

    fn signals(&self) -> &ModelSignals {
        &self.shared.signals
    }

    fn set_data(&self, index: &ModelIndex, value: ItemValue, role: ItemRole) -> bool {
        match self.item_from_index(index) {
            Some(item) => {
                item.set_data(value, role);
                true
            }
            None => false,
        }
    }

    fn flags(&self, index: &ModelIndex) -> ItemFlags {
        if !index.is_valid() {
            return self.root().flags();
        }
        self.item_for_index(index)
            .map(|item| item.flags())
            .unwrap_or_else(ItemFlags::standard)
    }

    fn has_children(&self, parent: &ModelIndex) -> bool {
        self.item_for_index(parent)
            .map(|item| item.has_children())
            .unwrap_or(false)
    }

    fn header_data(&self, section: usize, orientation: Orientation, role: ItemRole) -> ItemValue {
        let in_bounds = match orientation {
            Orientation::Horizontal => section < self.root().column_count(),
            Orientation::Vertical => section < self.root().row_count(),
        };
        if !in_bounds {
            return ItemValue::None;
        }
        let header = match orientation {
            Orientation::Horizontal => self.horizontal_header_item(section),
            Orientation::Vertical => self.vertical_header_item(section),
        };
        match header {
            Some(item) => item.data(role),
            // Default header labels are 1-based section numbers.
            None if role == ItemRole::Display => ItemValue::Int(section as i64 + 1),
            None => ItemValue::None,
        }
    }

    fn set_header_data(
        &self,
        section: usize,
        orientation: Orientation,
        value: ItemValue,
        role: ItemRole,
    ) -> bool {
        let in_bounds = match orientation {
            Orientation::Horizontal => section < self.root().column_count(),
            Orientation::Vertical => section < self.root().row_count(),
        };
        if !in_bounds {
            return false;
        }
        let existing = match orientation {
            Orientation::Horizontal => self.horizontal_header_item(section),
            Orientation::Vertical => self.vertical_header_item(section),
        };
        let item = match existing {
            Some(item) => item,
            None => {
                let item = self.create_item();
                let installed = match orientation {
                    Orientation::Horizontal => self.set_horizontal_header_item(section, item.clone()),
                    Orientation::Vertical => self.set_vertical_header_item(section, item.clone()),
                };
                if !installed {
                    return false;
                }
                item
            }
        };
        item.set_data(value, role);
        true
    }
}

impl std::fmt::Debug for StandardItemModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let root = self.root();
        f.debug_struct("StandardItemModel")
            .field("rows", &root.row_count())
            .field("columns", &root.column_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_impl_all;

    assert_impl_all!(StandardItemModel: Send, Sync, Clone);
    assert_impl_all!(StandardItem: Send, Sync, Clone);

    fn model_3x1(texts: [&str; 3]) -> StandardItemModel {
        let model = StandardItemModel::new();
        for text in texts {
            model.append_row(vec![StandardItem::with_text(text)]);
        }
        model
    }

    #[test]
    fn test_set_item_grows_dimensions() {
        let model = StandardItemModel::new();
        let item = StandardItem::with_text("corner");
        assert!(model.set_item(2, 3, item.clone()));

        assert_eq!(model.row_count(&ModelIndex::invalid()), 3);
        assert_eq!(model.column_count(&ModelIndex::invalid()), 4);
        assert_eq!(model.item(2, 3), Some(item));
    }

    #[test]
    fn test_header_arrays_track_dimensions() {
        let model = StandardItemModel::with_dimensions(2, 2);
        model.set_horizontal_header_labels(&["A", "B"]);
        model.set_vertical_header_labels(&["1", "2"]);

        model.insert_columns(1, 1, &ModelIndex::invalid());
        assert_eq!(
            model
                .header_data(0, Orientation::Horizontal, ItemRole::Display)
                .as_str(),
            Some("A")
        );
        // The new column has no header item yet; default label applies
        assert_eq!(
            model
                .header_data(1, Orientation::Horizontal, ItemRole::Display)
                .as_int(),
            Some(2)
        );
        assert_eq!(
            model
                .header_data(2, Orientation::Horizontal, ItemRole::Display)
                .as_str(),
            Some("B")
        );

        model.remove_rows(0, 1, &ModelIndex::invalid());
        assert_eq!(
            model
                .header_data(0, Orientation::Vertical, ItemRole::Display)
                .as_str(),
            Some("2")
        );
    }

    #[test]
    fn test_header_item_rejects_attached() {
        let model = StandardItemModel::with_dimensions(1, 1);
        let item = StandardItem::with_text("used");
        model.append_row(vec![item.clone()]);

        assert!(!model.set_horizontal_header_item(0, item));
        assert!(model.horizontal_header_item(0).is_none());
    }

    #[test]
    fn test_take_horizontal_header_item_detaches() {
        let model = StandardItemModel::with_dimensions(1, 1);
        let header = StandardItem::with_text("H");
        assert!(model.set_horizontal_header_item(0, header.clone()));
        assert!(header.model().is_some());

        let taken = model.take_horizontal_header_item(0);
        assert_eq!(taken, Some(header.clone()));
        assert!(header.model().is_none());
        assert!(model.horizontal_header_item(0).is_none());
    }

    #[test]
    fn test_lazy_materialization_via_prototype() {
        let model = StandardItemModel::with_dimensions(2, 2);
        let prototype = StandardItem::new();
        prototype.set_tool_tip("from prototype");
        model.set_item_prototype(prototype);

        assert!(model.item(1, 1).is_none());
        let index = model.index(1, 1, &ModelIndex::invalid());
        let item = model.item_from_index(&index).unwrap();
        assert_eq!(item.tool_tip().as_deref(), Some("from prototype"));
        // The lazily made item is installed in the slot
        assert_eq!(model.item(1, 1), Some(item));
    }

    #[test]
    fn test_data_read_does_not_materialize() {
        let model = StandardItemModel::with_dimensions(1, 1);
        let index = model.index(0, 0, &ModelIndex::invalid());
        assert!(model.data(&index, ItemRole::Display).is_none());
        assert!(model.item(0, 0).is_none());
    }

    #[test]
    fn test_set_data_role_aliasing() {
        let model = StandardItemModel::with_dimensions(1, 1);
        let index = model.index(0, 0, &ModelIndex::invalid());
        assert!(model.set_data(&index, ItemValue::from("Editable"), ItemRole::Edit));
        assert_eq!(
            model.data(&index, ItemRole::Display).as_str(),
            Some("Editable")
        );
    }

    #[test]
    fn test_item_changed_signal_for_cell_and_header() {
        use parking_lot::Mutex;

        let model = StandardItemModel::with_dimensions(1, 1);
        let events = Arc::new(Mutex::new(Vec::new()));

        let sink = events.clone();
        model.signals().data_changed.connect(move |(top_left, _)| {
            sink.lock().push(format!("data {},{}", top_left.row(), top_left.column()));
        });
        let sink = events.clone();
        model
            .signals()
            .header_data_changed
            .connect(move |(orientation, first, _)| {
                sink.lock().push(format!("header {orientation:?} {first}"));
            });

        let index = model.index(0, 0, &ModelIndex::invalid());
        model.set_data(&index, ItemValue::from("x"), ItemRole::Display);
        model.set_header_data(0, Orientation::Horizontal, ItemValue::from("H"), ItemRole::Display);

        let events = events.lock();
        assert!(events.contains(&"data 0,0".to_string()));
        assert!(events.iter().any(|e| e.starts_with("header Horizontal 0")));
    }

    #[test]
    fn test_insert_signal_bracketing_order() {
        use parking_lot::Mutex;

        let model = StandardItemModel::new();
        let events = Arc::new(Mutex::new(Vec::new()));

        let observed = model.clone();
        let sink = events.clone();
        model
            .signals()
            .rows_about_to_be_inserted
            .connect(move |(_, first, last)| {
                sink.lock().push((
                    "about",
                    *first,
                    *last,
                    observed.row_count(&ModelIndex::invalid()),
                ));
            });
        let observed = model.clone();
        let sink = events.clone();
        model.signals().rows_inserted.connect(move |(_, first, last)| {
            sink.lock().push((
                "done",
                *first,
                *last,
                observed.row_count(&ModelIndex::invalid()),
            ));
        });

        model.set_column_count(1);
        model.insert_rows(0, 2, &ModelIndex::invalid());

        let events = events.lock();
        // Before the mutation the row count was still 0; after, 2.
        assert_eq!(events[0], ("about", 0, 1, 0));
        assert_eq!(events[1], ("done", 0, 1, 2));
    }

    #[test]
    fn test_sort_remaps_persistent_index() {
        let model = model_3x1(["cherry", "apple", "banana"]);
        let last = model.index(2, 0, &ModelIndex::invalid());
        let persistent = model.persistent_index(&last);

        model.sort(0, SortOrder::Descending);

        // Descending: cherry, banana, apple. "banana" moved from row 2 to 1.
        assert_eq!(
            model
                .display_text(&model.index(0, 0, &ModelIndex::invalid()))
                .as_deref(),
            Some("cherry")
        );
        assert_eq!(persistent.row(), 1);
        assert_eq!(
            model.display_text(&persistent.index()).as_deref(),
            Some("banana")
        );
    }

    #[test]
    fn test_sort_ascending_persistent_to_row_zero() {
        let model = model_3x1(["b", "c", "a"]);
        let persistent = model.persistent_index(&model.index(2, 0, &ModelIndex::invalid()));

        model.sort(0, SortOrder::Ascending);

        assert_eq!(persistent.row(), 0);
        assert_eq!(model.display_text(&persistent.index()).as_deref(), Some("a"));
    }

    #[test]
    fn test_persistent_index_shifts_on_insert_and_remove() {
        let model = model_3x1(["a", "b", "c"]);
        let persistent = model.persistent_index(&model.index(1, 0, &ModelIndex::invalid()));

        model.insert_rows(0, 2, &ModelIndex::invalid());
        assert_eq!(persistent.row(), 3);

        model.remove_rows(0, 2, &ModelIndex::invalid());
        assert_eq!(persistent.row(), 1);
        assert_eq!(model.display_text(&persistent.index()).as_deref(), Some("b"));
    }

    #[test]
    fn test_persistent_index_invalidated_on_removal() {
        let model = model_3x1(["a", "b", "c"]);
        let persistent = model.persistent_index(&model.index(1, 0, &ModelIndex::invalid()));
        assert!(persistent.is_valid());

        model.remove_rows(1, 1, &ModelIndex::invalid());
        assert!(!persistent.is_valid());
    }

    #[test]
    fn test_clear_resets_everything() {
        let model = model_3x1(["a", "b", "c"]);
        model.set_horizontal_header_labels(&["H"]);
        let persistent = model.persistent_index(&model.index(0, 0, &ModelIndex::invalid()));
        let detached_view = model.item(0, 0).unwrap();

        model.clear();

        assert_eq!(model.row_count(&ModelIndex::invalid()), 0);
        assert_eq!(model.column_count(&ModelIndex::invalid()), 0);
        assert!(model.horizontal_header_item(0).is_none());
        assert!(!persistent.is_valid());
        // Items from before the clear are no longer attached
        assert!(detached_view.model().is_none());
    }

    #[test]
    fn test_find_items() {
        let model = model_3x1(["x", "y", "x"]);
        let found = model.find_items("x", 0);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], model.item(0, 0).unwrap());
        assert_eq!(found[1], model.item(2, 0).unwrap());
        assert!(model.find_items("z", 0).is_empty());
    }

    #[test]
    fn test_take_item_releases_ownership() {
        let model = model_3x1(["a", "b", "c"]);
        let item = model.take_item(1, 0).unwrap();
        assert_eq!(item.text().as_deref(), Some("b"));
        assert!(item.model().is_none());
        assert!(model.item(1, 0).is_none());
        // Dimensions unchanged
        assert_eq!(model.row_count(&ModelIndex::invalid()), 3);
    }

    #[test]
    fn test_tree_indexing() {
        let model = StandardItemModel::new();
        let parent = StandardItem::with_text("parent");
        parent.append_row(vec![StandardItem::with_text("child")]);
        model.append_row(vec![parent.clone()]);

        let root_index = model.index(0, 0, &ModelIndex::invalid());
        assert_eq!(model.row_count(&root_index), 1);

        let child_index = model.index(0, 0, &root_index);
        assert!(child_index.is_valid());
        assert_eq!(model.display_text(&child_index).as_deref(), Some("child"));
        assert_eq!(model.parent(&child_index), root_index);
        assert_eq!(model.parent(&root_index), ModelIndex::invalid());
    }

    #[test]
    fn test_index_from_item() {
        let model = model_3x1(["a", "b", "c"]);
        let item = model.item(1, 0).unwrap();
        let index = model.index_from_item(&item);
        assert_eq!(index, model.index(1, 0, &ModelIndex::invalid()));

        let foreign = StandardItem::new();
        assert!(!model.index_from_item(&foreign).is_valid());
    }

    #[test]
    fn test_sort_role() {
        let model = StandardItemModel::new();
        for (text, weight) in [("a", 3), ("b", 1), ("c", 2)] {
            let item = StandardItem::with_text(text);
            item.set_data(ItemValue::Int(weight), ItemRole::User(0));
            model.append_row(vec![item]);
        }
        model.set_sort_role(ItemRole::User(0));
        model.sort(0, SortOrder::Ascending);

        let texts: Vec<_> = (0..3)
            .map(|row| model.item(row, 0).unwrap().text().unwrap())
            .collect();
        assert_eq!(texts, ["b", "c", "a"]);
    }
}
