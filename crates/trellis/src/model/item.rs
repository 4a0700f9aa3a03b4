//! Standard items: the nodes of the hierarchical item table.
//!
//! A [`StandardItem`] owns a role→value data map and a two-dimensional table
//! of child items, stored row-major as a dense `Vec<Option<StandardItem>>`
//! of length `rows * columns`. A slot may be empty without affecting the
//! dimensions. Each item carries non-owning back-references to its parent
//! item and to the model it is attached to; the owning reference is always
//! the parent's child slot (or the model's root/header slot).
//!
//! `StandardItem` is a cheap cloneable handle: clones alias the same node.
//! Dropping the last handle to a node drops its entire subtree.
//!
//! # Column insertion cost
//!
//! Because storage is row-major, inserting or removing a column splices
//! every existing row individually — an O(rows) sequence of array splices,
//! unlike row insertion which is a single contiguous splice.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use trellis_core::logging::targets;

use super::index::ModelIndex;
use super::role::{CheckState, ItemRole, ItemValue, value_ordering};
use super::standard_model::{ModelShared, StandardItemModel};
use super::traits::ItemFlags;

pub(crate) type ItemRef = Arc<RwLock<ItemInner>>;
pub(crate) type WeakItemRef = Weak<RwLock<ItemInner>>;
pub(crate) type WeakModelRef = Weak<ModelShared>;

/// Sort direction for [`StandardItem::sort_children`] and
/// `StandardItemModel::sort`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Smallest values first.
    #[default]
    Ascending,
    /// Largest values first.
    Descending,
}

pub(crate) struct ItemInner {
    /// Role → value storage. The reserved flags role (0) lives here too.
    values: BTreeMap<u32, ItemValue>,
    rows: usize,
    columns: usize,
    /// Row-major child slots; always `rows * columns` long.
    children: Vec<Option<StandardItem>>,
    /// Non-owning reference to the parent item.
    parent: Option<WeakItemRef>,
    /// Non-owning reference to the owning model.
    model: Option<WeakModelRef>,
}

impl ItemInner {
    fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            rows: 0,
            columns: 0,
            children: Vec::new(),
            parent: None,
            model: None,
        }
    }
}

/// A node in a hierarchical item table.
///
/// Items usually carry text, check states, or application data, addressed by
/// [`ItemRole`]. Each item can also hold a two-dimensional table of child
/// items, which makes it possible to build trees (child tables with a single
/// column) and nested tables alike.
///
/// The dimensions of the child table are controlled with
/// [`set_row_count`](Self::set_row_count) and
/// [`set_column_count`](Self::set_column_count); children are positioned
/// with [`set_child`](Self::set_child) and read back with
/// [`child`](Self::child). Whole rows and columns are inserted with the
/// `insert_*`/`append_*` family, deleted with `remove_*`, or detached
/// without deletion with `take_*`.
///
/// # Example
///
/// ```
/// use trellis::model::StandardItem;
///
/// let parent = StandardItem::with_text("root");
/// parent.set_child(0, 0, StandardItem::with_text("leaf"));
///
/// assert_eq!(parent.row_count(), 1);
/// assert_eq!(parent.child(0, 0).unwrap().text().as_deref(), Some("leaf"));
/// ```
#[derive(Clone)]
pub struct StandardItem {
    inner: ItemRef,
}

impl Default for StandardItem {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardItem {
    /// Creates an empty, detached item.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(ItemInner::new())),
        }
    }

    /// Creates a detached item with the given display text.
    pub fn with_text(text: impl Into<String>) -> Self {
        let item = Self::new();
        item.set_text(text);
        item
    }

    pub(crate) fn from_ref(inner: ItemRef) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> WeakItemRef {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn as_ptr_usize(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    /// Returns `true` if both handles alias the same item.
    #[inline]
    pub fn ptr_eq(&self, other: &StandardItem) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // -------------------------------------------------------------------------
    // Relationships
    // -------------------------------------------------------------------------

    pub(crate) fn model_shared(&self) -> Option<Arc<ModelShared>> {
        self.inner.read().model.as_ref()?.upgrade()
    }

    pub(crate) fn model_weak(&self) -> Option<WeakModelRef> {
        self.inner.read().model.clone()
    }

    /// Returns the model this item is attached to, if any.
    pub fn model(&self) -> Option<StandardItemModel> {
        self.model_shared().map(StandardItemModel::from_shared)
    }

    pub(crate) fn parent_ref(&self) -> Option<ItemRef> {
        self.inner.read().parent.as_ref()?.upgrade()
    }

    /// Returns the item's parent item.
    ///
    /// Returns `None` for detached items, header items, and top-level items
    /// (whose parent is the model's invisible root).
    pub fn parent(&self) -> Option<StandardItem> {
        let parent = StandardItem::from_ref(self.parent_ref()?);
        if let Some(shared) = self.model_shared() {
            if shared.is_root(&parent) {
                return None;
            }
        }
        Some(parent)
    }

    /// The `(row, column)` of this item within its parent's child table, or
    /// `None` when the item has no parent.
    pub(crate) fn position(&self) -> Option<(usize, usize)> {
        let parent = self.parent_ref()?;
        let pinner = parent.read();
        if pinner.columns == 0 {
            return None;
        }
        let flat = pinner.children.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|child| Arc::ptr_eq(&child.inner, &self.inner))
        })?;
        Some((flat / pinner.columns, flat % pinner.columns))
    }

    /// Returns the row of this item in its parent's child table, or `None`
    /// if the item has no parent.
    pub fn row(&self) -> Option<usize> {
        self.position().map(|(row, _)| row)
    }

    /// Returns the column of this item in its parent's child table, or
    /// `None` if the item has no parent.
    pub fn column(&self) -> Option<usize> {
        self.position().map(|(_, column)| column)
    }

    /// Returns the model index of this item.
    ///
    /// Returns the invalid index when the item is not attached to a model
    /// (the invisible root and header items included).
    pub fn index(&self) -> ModelIndex {
        if self.model_shared().is_none() {
            return ModelIndex::invalid();
        }
        let Some(parent) = self.parent_ref() else {
            return ModelIndex::invalid();
        };
        match self.position() {
            Some((row, column)) => ModelIndex::new(row, column, Arc::downgrade(&parent)),
            None => ModelIndex::invalid(),
        }
    }

    // -------------------------------------------------------------------------
    // Role data
    // -------------------------------------------------------------------------

    /// Returns the item's data for the given role, or `ItemValue::None` if
    /// there is no data for it.
    ///
    /// `ItemRole::Edit` and `ItemRole::Display` read the same stored value.
    pub fn data(&self, role: ItemRole) -> ItemValue {
        let key = role.storage_value();
        self.inner
            .read()
            .values
            .get(&key)
            .cloned()
            .unwrap_or(ItemValue::None)
    }

    /// Sets the item's data for the given role.
    ///
    /// Setting `ItemValue::None` removes the stored entry. `ItemRole::Edit`
    /// writes through to the `Display` slot. If the item is attached to a
    /// model and the value changed, an item-changed notification is emitted.
    pub fn set_data(&self, value: ItemValue, role: ItemRole) {
        let key = role.storage_value();
        let changed = {
            let mut inner = self.inner.write();
            if value.is_none() {
                inner.values.remove(&key).is_some()
            } else {
                match inner.values.get(&key) {
                    Some(existing) if *existing == value => false,
                    _ => {
                        inner.values.insert(key, value);
                        true
                    }
                }
            }
        };
        if changed {
            self.notify_changed();
        }
    }

    /// Removes and returns the data stored for the given role.
    pub fn take_data(&self, role: ItemRole) -> ItemValue {
        let key = role.storage_value();
        let taken = self.inner.write().values.remove(&key);
        match taken {
            Some(value) => {
                self.notify_changed();
                value
            }
            None => ItemValue::None,
        }
    }

    /// Returns all role data except the reserved flags role, keyed by the
    /// numeric role value.
    pub fn item_data(&self) -> BTreeMap<u32, ItemValue> {
        self.inner
            .read()
            .values
            .iter()
            .filter(|(role, _)| **role != ItemRole::Flags.value())
            .map(|(role, value)| (*role, value.clone()))
            .collect()
    }

    /// Replaces all role data (except the flags, which are preserved) with
    /// the entries of `values`. Keys equal to the reserved flags role and
    /// `ItemValue::None` entries are ignored; `Edit` keys write through to
    /// `Display`.
    pub fn set_item_data(&self, values: BTreeMap<u32, ItemValue>) {
        let changed = {
            let mut inner = self.inner.write();
            let flags_key = ItemRole::Flags.value();
            let mut new_values: BTreeMap<u32, ItemValue> = values
                .into_iter()
                .filter(|(role, value)| *role != flags_key && value.is_some())
                .map(|(role, value)| {
                    let role = ItemRole::from_value(role)
                        .map(|r| r.storage_value())
                        .unwrap_or(role);
                    (role, value)
                })
                .collect();
            if let Some(flags) = inner.values.get(&flags_key) {
                new_values.insert(flags_key, flags.clone());
            }
            if inner.values == new_values {
                false
            } else {
                inner.values = new_values;
                true
            }
        };
        if changed {
            self.notify_changed();
        }
    }

    /// Causes the owning model to emit its item-changed notification for
    /// this item. Only needed when mutating item state through means the
    /// item cannot observe itself.
    pub fn emit_data_changed(&self) {
        self.notify_changed();
    }

    fn notify_changed(&self) {
        if let Some(shared) = self.model_shared() {
            shared.item_changed(self);
        }
    }

    // -------------------------------------------------------------------------
    // Data conveniences
    // -------------------------------------------------------------------------

    /// Returns the item's display text.
    pub fn text(&self) -> Option<String> {
        self.data(ItemRole::Display).into_string()
    }

    /// Sets the item's display text.
    pub fn set_text(&self, text: impl Into<String>) {
        self.set_data(ItemValue::String(text.into()), ItemRole::Display);
    }

    /// Returns the item's tooltip text.
    pub fn tool_tip(&self) -> Option<String> {
        self.data(ItemRole::ToolTip).into_string()
    }

    /// Sets the item's tooltip text.
    pub fn set_tool_tip(&self, text: impl Into<String>) {
        self.set_data(ItemValue::String(text.into()), ItemRole::ToolTip);
    }

    /// Returns the item's status tip.
    pub fn status_tip(&self) -> Option<String> {
        self.data(ItemRole::StatusTip).into_string()
    }

    /// Sets the item's status tip.
    pub fn set_status_tip(&self, text: impl Into<String>) {
        self.set_data(ItemValue::String(text.into()), ItemRole::StatusTip);
    }

    /// Returns the item's "What's This?" help text.
    pub fn whats_this(&self) -> Option<String> {
        self.data(ItemRole::WhatsThis).into_string()
    }

    /// Sets the item's "What's This?" help text.
    pub fn set_whats_this(&self, text: impl Into<String>) {
        self.set_data(ItemValue::String(text.into()), ItemRole::WhatsThis);
    }

    /// Returns the item's accessible text.
    pub fn accessible_text(&self) -> Option<String> {
        self.data(ItemRole::AccessibleText).into_string()
    }

    /// Sets the item's accessible text.
    pub fn set_accessible_text(&self, text: impl Into<String>) {
        self.set_data(ItemValue::String(text.into()), ItemRole::AccessibleText);
    }

    /// Returns the item's accessible description.
    pub fn accessible_description(&self) -> Option<String> {
        self.data(ItemRole::AccessibleDescription).into_string()
    }

    /// Sets the item's accessible description.
    pub fn set_accessible_description(&self, text: impl Into<String>) {
        self.set_data(ItemValue::String(text.into()), ItemRole::AccessibleDescription);
    }

    /// Returns the item's check state.
    pub fn check_state(&self) -> Option<CheckState> {
        self.data(ItemRole::CheckState).as_check_state()
    }

    /// Sets the item's check state.
    pub fn set_check_state(&self, state: CheckState) {
        self.set_data(ItemValue::CheckState(state), ItemRole::CheckState);
    }

    // -------------------------------------------------------------------------
    // Flags
    // -------------------------------------------------------------------------

    /// Returns the item's interaction flags.
    ///
    /// Defaults to [`ItemFlags::standard`] when no flags have been stored.
    pub fn flags(&self) -> ItemFlags {
        match self.data(ItemRole::Flags) {
            ItemValue::Int(bits) => ItemFlags::from_bits(bits as u32),
            _ => ItemFlags::standard(),
        }
    }

    /// Sets the item's interaction flags.
    pub fn set_flags(&self, flags: ItemFlags) {
        self.set_data(ItemValue::Int(flags.to_bits() as i64), ItemRole::Flags);
    }

    /// Sets whether the user can interact with the item.
    pub fn set_enabled(&self, enabled: bool) {
        self.set_flags(self.flags().with_enabled(enabled));
    }

    /// Returns whether the item is enabled.
    pub fn is_enabled(&self) -> bool {
        self.flags().enabled
    }

    /// Sets whether the item can be edited by the user.
    pub fn set_editable(&self, editable: bool) {
        self.set_flags(self.flags().with_editable(editable));
    }

    /// Returns whether the item can be edited by the user.
    pub fn is_editable(&self) -> bool {
        self.flags().editable
    }

    /// Sets whether the item can be selected.
    pub fn set_selectable(&self, selectable: bool) {
        self.set_flags(self.flags().with_selectable(selectable));
    }

    /// Returns whether the item can be selected.
    pub fn is_selectable(&self) -> bool {
        self.flags().selectable
    }

    /// Sets whether the item is user-checkable.
    ///
    /// Making an item checkable seeds an `Unchecked` state if the item has
    /// no check state yet, so views have something to render.
    pub fn set_checkable(&self, checkable: bool) {
        if checkable && !self.is_checkable() && self.check_state().is_none() {
            self.set_check_state(CheckState::Unchecked);
        }
        self.set_flags(self.flags().with_checkable(checkable));
    }

    /// Returns whether the item is user-checkable.
    pub fn is_checkable(&self) -> bool {
        self.flags().checkable
    }

    /// Sets whether the item's checkbox has three states.
    pub fn set_tristate(&self, tristate: bool) {
        let mut flags = self.flags();
        flags.tristate = tristate;
        self.set_flags(flags);
    }

    /// Returns whether the item's checkbox has three states.
    pub fn is_tristate(&self) -> bool {
        self.flags().tristate
    }

    /// Sets whether the item can be dragged.
    pub fn set_drag_enabled(&self, enabled: bool) {
        self.set_flags(self.flags().with_drag(enabled));
    }

    /// Returns whether the item can be dragged.
    pub fn is_drag_enabled(&self) -> bool {
        self.flags().drag_enabled
    }

    /// Sets whether the item can receive drops.
    pub fn set_drop_enabled(&self, enabled: bool) {
        self.set_flags(self.flags().with_drop(enabled));
    }

    /// Returns whether the item can receive drops.
    pub fn is_drop_enabled(&self) -> bool {
        self.flags().drop_enabled
    }

    // -------------------------------------------------------------------------
    // Dimensions
    // -------------------------------------------------------------------------

    /// Returns the number of child rows.
    pub fn row_count(&self) -> usize {
        self.inner.read().rows
    }

    /// Returns the number of child columns.
    pub fn column_count(&self) -> usize {
        self.inner.read().columns
    }

    /// Sets the number of child rows. Shrinking deletes the items in the
    /// removed rows.
    pub fn set_row_count(&self, rows: usize) {
        let current = self.row_count();
        if current == rows {
            return;
        }
        if current < rows {
            self.insert_rows_impl(current, rows - current, &[]);
        } else {
            self.remove_rows(rows, current - rows);
        }
    }

    /// Sets the number of child columns. Shrinking deletes the items in the
    /// removed columns.
    pub fn set_column_count(&self, columns: usize) {
        let current = self.column_count();
        if current == columns {
            return;
        }
        if current < columns {
            self.insert_columns_impl(current, columns - current, &[]);
        } else {
            self.remove_columns(columns, current - columns);
        }
    }

    /// Returns `true` if this item has any child slots.
    pub fn has_children(&self) -> bool {
        let inner = self.inner.read();
        inner.rows > 0 && inner.columns > 0
    }

    // -------------------------------------------------------------------------
    // Child access
    // -------------------------------------------------------------------------

    /// The flat storage index of `(row, column)`, or `None` when the
    /// position is outside the current dimensions. A `Some` result does not
    /// mean the slot is occupied.
    pub(crate) fn child_slot(&self, row: usize, column: usize) -> Option<usize> {
        let inner = self.inner.read();
        if row < inner.rows && column < inner.columns {
            Some(row * inner.columns + column)
        } else {
            None
        }
    }

    /// Returns the child item at `(row, column)`, or `None` when the slot is
    /// empty or out of range.
    pub fn child(&self, row: usize, column: usize) -> Option<StandardItem> {
        let inner = self.inner.read();
        if row < inner.rows && column < inner.columns {
            inner.children[row * inner.columns + column].clone()
        } else {
            None
        }
    }

    /// Sets the child at `(row, column)`, growing the dimensions if needed.
    ///
    /// This item takes ownership of `item`; a previous occupant of the slot
    /// is destroyed. The call is rejected (with a logged warning) when
    /// `item` is this item itself, an ancestor of it, or already attached
    /// to a parent.
    pub fn set_child(&self, row: usize, column: usize, item: StandardItem) -> bool {
        self.set_child_impl(row, column, Some(item), true)
    }

    pub(crate) fn set_child_impl(
        &self,
        row: usize,
        column: usize,
        item: Option<StandardItem>,
        notify: bool,
    ) -> bool {
        if let Some(new_item) = &item {
            if Arc::ptr_eq(&new_item.inner, &self.inner) {
                tracing::warn!(
                    target: targets::MODEL,
                    "set_child: cannot make an item a child of itself"
                );
                return false;
            }
            if new_item.is_ancestor_of(self) {
                tracing::warn!(
                    target: targets::MODEL,
                    "set_child: attaching an ancestor would create an ownership cycle"
                );
                return false;
            }
        }
        if self.row_count() <= row {
            self.set_row_count(row + 1);
        }
        if self.column_count() <= column {
            self.set_column_count(column + 1);
        }
        let Some(slot) = self.child_slot(row, column) else {
            return false;
        };
        let old = self.inner.read().children[slot].clone();
        match (&old, &item) {
            (Some(o), Some(n)) if Arc::ptr_eq(&o.inner, &n.inner) => return true,
            (None, None) => return true,
            _ => {}
        }
        if let Some(new_item) = &item {
            if new_item.parent_ref().is_some() {
                tracing::warn!(
                    target: targets::MODEL,
                    "set_child: ignoring duplicate insertion of an attached item"
                );
                return false;
            }
            let model = self.model_weak();
            new_item.attach(self, model);
        }
        if let Some(old_item) = &old {
            old_item.detach();
        }
        self.inner.write().children[slot] = item.clone();
        if notify {
            if let Some(shared) = self.model_shared() {
                match &item {
                    Some(new_item) => shared.item_changed(new_item),
                    None => shared.cell_changed(self, row, column),
                }
            }
        }
        true
    }

    /// Removes the child at `(row, column)` without destroying it and
    /// returns it, detached. Unlike [`take_row`](Self::take_row) and
    /// [`take_column`](Self::take_column) this does not change the
    /// dimensions of the child table.
    pub fn take_child(&self, row: usize, column: usize) -> Option<StandardItem> {
        let slot = self.child_slot(row, column)?;
        let item = self.inner.read().children[slot].clone();
        if let Some(taken) = &item {
            taken.detach();
        }
        self.inner.write().children[slot] = None;
        item
    }

    // -------------------------------------------------------------------------
    // Row and column editing
    // -------------------------------------------------------------------------

    /// Inserts `count` empty rows at `row`. A position past the current row
    /// count pads with additional rows up to it.
    pub fn insert_rows(&self, row: usize, count: usize) -> bool {
        let current = self.row_count();
        let (row, count) = if current < row {
            (current, count + (row - current))
        } else {
            (row, count)
        };
        self.insert_rows_impl(row, count, &[])
    }

    /// Inserts `count` empty columns at `column`. A position past the
    /// current column count pads with additional columns up to it.
    pub fn insert_columns(&self, column: usize, count: usize) -> bool {
        let current = self.column_count();
        let (column, count) = if current < column {
            (current, count + (column - current))
        } else {
            (column, count)
        };
        self.insert_columns_impl(column, count, &[])
    }

    /// Inserts a single row at `row` containing `items`, growing the column
    /// count to fit them.
    pub fn insert_row(&self, row: usize, items: Vec<StandardItem>) -> bool {
        if self.column_count() < items.len() {
            self.set_column_count(items.len());
        }
        self.insert_rows_impl(row, 1, &items)
    }

    /// Inserts a single column at `column` containing `items`, growing the
    /// row count to fit them.
    pub fn insert_column(&self, column: usize, items: Vec<StandardItem>) -> bool {
        if self.row_count() < items.len() {
            self.set_row_count(items.len());
        }
        self.insert_columns_impl(column, 1, &items)
    }

    /// Appends a row containing `items`, growing the column count to fit.
    pub fn append_row(&self, items: Vec<StandardItem>) -> bool {
        self.insert_row(self.row_count(), items)
    }

    /// Appends one row per item, each placed in column 0. The column count
    /// is not changed (an empty table gets a single column).
    pub fn append_rows(&self, items: Vec<StandardItem>) -> bool {
        self.insert_list_rows_impl(self.row_count(), &items)
    }

    /// Appends a column containing `items`, growing the row count to fit.
    pub fn append_column(&self, items: Vec<StandardItem>) -> bool {
        self.insert_column(self.column_count(), items)
    }

    /// Core row insertion: `count` rows at `row`, with `items` assigned
    /// row-major into the fresh slots.
    pub(crate) fn insert_rows_impl(&self, row: usize, count: usize, items: &[StandardItem]) -> bool {
        if count == 0 || row > self.row_count() {
            return false;
        }
        let shared = self.model_shared();
        if let Some(s) = &shared {
            s.rows_about_to_be_inserted(self, row, row + count - 1);
        }
        {
            let mut inner = self.inner.write();
            let columns = inner.columns;
            if inner.rows == 0 {
                inner.children.resize(columns * count, None);
                inner.rows = count;
            } else {
                inner.rows += count;
                let offset = row * columns;
                inner.children.splice(
                    offset..offset,
                    std::iter::repeat_with(|| None).take(count * columns),
                );
            }
        }
        if !items.is_empty() {
            let columns = self.column_count();
            let limit = items.len().min(columns * count);
            for (i, item) in items.iter().take(limit).enumerate() {
                if item.parent_ref().is_some() {
                    tracing::warn!(
                        target: targets::MODEL,
                        "insert_rows: ignoring duplicate insertion of an attached item"
                    );
                    continue;
                }
                item.attach(self, self.model_weak());
                self.inner.write().children[row * columns + i] = Some(item.clone());
            }
        }
        if let Some(s) = &shared {
            s.rows_inserted(self, row, count);
        }
        true
    }

    /// List-style row insertion: one row per item, each item placed in
    /// column 0. The first insertion into a table with no columns creates
    /// column 0.
    pub(crate) fn insert_list_rows_impl(&self, row: usize, items: &[StandardItem]) -> bool {
        if items.is_empty() || row > self.row_count() {
            return false;
        }
        if self.column_count() == 0 {
            self.set_column_count(1);
        }
        let count = items.len();
        let shared = self.model_shared();
        if let Some(s) = &shared {
            s.rows_about_to_be_inserted(self, row, row + count - 1);
        }
        {
            let mut inner = self.inner.write();
            let columns = inner.columns;
            if inner.rows == 0 {
                inner.children.resize(columns * count, None);
                inner.rows = count;
            } else {
                inner.rows += count;
                let offset = row * columns;
                inner.children.splice(
                    offset..offset,
                    std::iter::repeat_with(|| None).take(count * columns),
                );
            }
        }
        let columns = self.column_count();
        for (i, item) in items.iter().enumerate() {
            if item.parent_ref().is_some() {
                tracing::warn!(
                    target: targets::MODEL,
                    "append_rows: ignoring duplicate insertion of an attached item"
                );
                continue;
            }
            item.attach(self, self.model_weak());
            self.inner.write().children[(row + i) * columns] = Some(item.clone());
        }
        if let Some(s) = &shared {
            s.rows_inserted(self, row, count);
        }
        true
    }

    /// Core column insertion: `count` columns at `column`, with `items`
    /// assigned down the new strip. Splices every existing row — O(rows).
    pub(crate) fn insert_columns_impl(
        &self,
        column: usize,
        count: usize,
        items: &[StandardItem],
    ) -> bool {
        if count == 0 || column > self.column_count() {
            return false;
        }
        let shared = self.model_shared();
        if let Some(s) = &shared {
            s.columns_about_to_be_inserted(self, column, column + count - 1);
        }
        {
            let mut inner = self.inner.write();
            if inner.columns == 0 {
                let rows = inner.rows;
                inner.children.resize(rows * count, None);
                inner.columns = count;
            } else {
                inner.columns += count;
                let stride = inner.columns;
                let rows = inner.rows;
                let mut offset = column;
                for _ in 0..rows {
                    inner
                        .children
                        .splice(offset..offset, std::iter::repeat_with(|| None).take(count));
                    offset += stride;
                }
            }
        }
        if !items.is_empty() {
            let rows = self.row_count();
            let limit = items.len().min(rows * count);
            for (i, item) in items.iter().take(limit).enumerate() {
                if item.parent_ref().is_some() {
                    tracing::warn!(
                        target: targets::MODEL,
                        "insert_columns: ignoring duplicate insertion of an attached item"
                    );
                    continue;
                }
                item.attach(self, self.model_weak());
                let row = i / count;
                let col = column + (i % count);
                let slot = {
                    let inner = self.inner.read();
                    row * inner.columns + col
                };
                self.inner.write().children[slot] = Some(item.clone());
            }
        }
        if let Some(s) = &shared {
            s.columns_inserted(self, column, count);
        }
        true
    }

    /// Removes `count` rows at `row`, destroying the items (and their
    /// subtrees) that were in them.
    pub fn remove_rows(&self, row: usize, count: usize) -> bool {
        if count == 0 || row + count > self.row_count() {
            return false;
        }
        let shared = self.model_shared();
        if let Some(s) = &shared {
            s.rows_about_to_be_removed(self, row, row + count - 1);
        }
        let removed: Vec<StandardItem> = {
            let inner = self.inner.read();
            let start = row * inner.columns;
            let end = start + count * inner.columns;
            inner.children[start..end].iter().flatten().cloned().collect()
        };
        for item in &removed {
            item.detach();
        }
        {
            let mut inner = self.inner.write();
            let start = row * inner.columns;
            let len = count * inner.columns;
            inner.children.drain(start..start + len);
            inner.rows -= count;
        }
        drop(removed);
        if let Some(s) = &shared {
            s.rows_removed(self, row, count);
        }
        true
    }

    /// Removes `count` columns at `column`, destroying the items (and their
    /// subtrees) that were in them. Splices every remaining row — O(rows).
    pub fn remove_columns(&self, column: usize, count: usize) -> bool {
        if count == 0 || column + count > self.column_count() {
            return false;
        }
        let shared = self.model_shared();
        if let Some(s) = &shared {
            s.columns_about_to_be_removed(self, column, column + count - 1);
        }
        let removed: Vec<StandardItem> = {
            let inner = self.inner.read();
            let mut taken = Vec::new();
            for row in 0..inner.rows {
                let start = row * inner.columns + column;
                taken.extend(inner.children[start..start + count].iter().flatten().cloned());
            }
            taken
        };
        for item in &removed {
            item.detach();
        }
        {
            let mut inner = self.inner.write();
            let stride = inner.columns;
            for row in (0..inner.rows).rev() {
                let start = row * stride + column;
                inner.children.drain(start..start + count);
            }
            inner.columns -= count;
        }
        drop(removed);
        if let Some(s) = &shared {
            s.columns_removed(self, column, count);
        }
        true
    }

    /// Removes the given row, destroying its items.
    pub fn remove_row(&self, row: usize) -> bool {
        self.remove_rows(row, 1)
    }

    /// Removes the given column, destroying its items.
    pub fn remove_column(&self, column: usize) -> bool {
        self.remove_columns(column, 1)
    }

    /// Removes `row` without destroying its items and returns them in
    /// column order, detached. Unset slots yield `None`. Decrements the row
    /// count.
    pub fn take_row(&self, row: usize) -> Vec<Option<StandardItem>> {
        if row >= self.row_count() {
            return Vec::new();
        }
        let shared = self.model_shared();
        if let Some(s) = &shared {
            s.rows_about_to_be_removed(self, row, row);
        }
        let items: Vec<Option<StandardItem>> = {
            let inner = self.inner.read();
            let start = row * inner.columns;
            inner.children[start..start + inner.columns].to_vec()
        };
        for item in items.iter().flatten() {
            item.detach();
        }
        {
            let mut inner = self.inner.write();
            let start = row * inner.columns;
            let len = inner.columns;
            inner.children.drain(start..start + len);
            inner.rows -= 1;
        }
        if let Some(s) = &shared {
            s.rows_removed(self, row, 1);
        }
        items
    }

    /// Removes `column` without destroying its items and returns them in
    /// row order, detached. Unset slots yield `None`. Decrements the column
    /// count.
    pub fn take_column(&self, column: usize) -> Vec<Option<StandardItem>> {
        if column >= self.column_count() {
            return Vec::new();
        }
        let shared = self.model_shared();
        if let Some(s) = &shared {
            s.columns_about_to_be_removed(self, column, column);
        }
        let items: Vec<Option<StandardItem>> = {
            let inner = self.inner.read();
            (0..inner.rows)
                .map(|row| inner.children[row * inner.columns + column].clone())
                .collect()
        };
        for item in items.iter().flatten() {
            item.detach();
        }
        {
            let mut inner = self.inner.write();
            let stride = inner.columns;
            for row in (0..inner.rows).rev() {
                inner.children.remove(row * stride + column);
            }
            inner.columns -= 1;
        }
        if let Some(s) = &shared {
            s.columns_removed(self, column, 1);
        }
        items
    }

    // -------------------------------------------------------------------------
    // Sorting
    // -------------------------------------------------------------------------

    /// Returns `true` if this item orders before `other`.
    ///
    /// The comparison uses the data stored under the owning model's sort
    /// role (the display role when the item is detached). This relation
    /// drives [`sort_children`](Self::sort_children) and
    /// `StandardItemModel::sort`.
    pub fn is_less_than(&self, other: &StandardItem) -> bool {
        self.compare(other) == Ordering::Less
    }

    fn compare(&self, other: &StandardItem) -> Ordering {
        let role = self
            .model_shared()
            .map(|shared| shared.sort_role())
            .unwrap_or(ItemRole::Display);
        value_ordering(&self.data(role), &other.data(role))
    }

    /// Stable-sorts the child rows by the items in `column`, then descends
    /// into every child and sorts its children the same way.
    ///
    /// Rows whose cell in the sort column is unset keep their relative
    /// order and are placed after all sortable rows. If the item is
    /// attached to a model, persistent indexes pointing at moved rows are
    /// remapped and the operation is bracketed by layout-change signals.
    pub fn sort_children(&self, column: usize, order: SortOrder) {
        if self.row_count() == 0 || column >= self.column_count() {
            return;
        }
        let shared = self.model_shared();
        if let Some(s) = &shared {
            s.layout_about_to_change();
        }
        self.sort_children_impl(column, order);
        if let Some(s) = &shared {
            s.layout_changed();
        }
    }

    fn sort_children_impl(&self, column: usize, order: SortOrder) {
        let (rows, columns, children) = {
            let inner = self.inner.read();
            (inner.rows, inner.columns, inner.children.clone())
        };
        if column >= columns || rows == 0 {
            return;
        }

        let mut sortable: Vec<(StandardItem, usize)> = Vec::with_capacity(rows);
        let mut unsortable: Vec<usize> = Vec::new();
        for row in 0..rows {
            match &children[row * columns + column] {
                Some(item) => sortable.push((item.clone(), row)),
                None => unsortable.push(row),
            }
        }

        match order {
            SortOrder::Ascending => sortable.sort_by(|a, b| a.0.compare(&b.0)),
            SortOrder::Descending => sortable.sort_by(|a, b| b.0.compare(&a.0)),
        }

        let shared = self.model_shared();
        let mut remapped: Vec<(ModelIndex, ModelIndex)> = Vec::new();
        let mut sorted_children: Vec<Option<StandardItem>> = vec![None; rows * columns];
        for new_row in 0..rows {
            let old_row = if new_row < sortable.len() {
                sortable[new_row].1
            } else {
                unsortable[new_row - sortable.len()]
            };
            for col in 0..columns {
                sorted_children[new_row * columns + col] =
                    children[old_row * columns + col].clone();
                if shared.is_some() && old_row != new_row {
                    remapped.push((
                        ModelIndex::new(old_row, col, self.downgrade()),
                        ModelIndex::new(new_row, col, self.downgrade()),
                    ));
                }
            }
        }

        self.inner.write().children = sorted_children;

        if let Some(s) = &shared {
            if !remapped.is_empty() {
                s.change_persistent_indices(remapped);
            }
        }

        let child_items: Vec<StandardItem> = {
            self.inner.read().children.iter().flatten().cloned().collect()
        };
        for child in child_items {
            child.sort_children_impl(column, order);
        }
    }

    // -------------------------------------------------------------------------
    // Cloning
    // -------------------------------------------------------------------------

    /// Returns a detached copy of this item carrying its role data and
    /// flags. Children and the model attachment are not copied.
    ///
    /// This is the operation the model's item prototype relies on to
    /// manufacture cells on demand.
    pub fn clone_item(&self) -> StandardItem {
        let inner = self.inner.read();
        StandardItem {
            inner: Arc::new(RwLock::new(ItemInner {
                values: inner.values.clone(),
                rows: 0,
                columns: 0,
                children: Vec::new(),
                parent: None,
                model: None,
            })),
        }
    }

    // -------------------------------------------------------------------------
    // Attachment bookkeeping
    // -------------------------------------------------------------------------

    /// Returns `true` if this item appears on `other`'s parent chain.
    fn is_ancestor_of(&self, other: &StandardItem) -> bool {
        let mut current = other.parent_ref();
        while let Some(ancestor) = current {
            if Arc::ptr_eq(&ancestor, &self.inner) {
                return true;
            }
            current = {
                let inner = ancestor.read();
                inner.parent.as_ref().and_then(|weak| weak.upgrade())
            };
        }
        false
    }

    /// Sets the model reference on this item and every descendant.
    ///
    /// When an item leaves a model, any persistent index that pointed at it
    /// (or a descendant) is invalidated. The parent chain must still be
    /// intact when this is called, since invalidation needs each item's
    /// current position.
    pub(crate) fn set_model_recursive(&self, model: Option<WeakModelRef>) {
        let mut stack = vec![self.clone()];
        while let Some(item) = stack.pop() {
            if let Some(old_shared) = item.model_shared() {
                let index = item.index();
                if index.is_valid() {
                    old_shared.invalidate_persistent_index(&index);
                }
            }
            let children: Vec<StandardItem> = {
                let mut inner = item.inner.write();
                inner.model = model.clone();
                inner.children.iter().flatten().cloned().collect()
            };
            stack.extend(children);
        }
    }

    /// Attaches a detached item below `parent`.
    pub(crate) fn attach(&self, parent: &StandardItem, model: Option<WeakModelRef>) {
        self.inner.write().parent = Some(parent.downgrade());
        self.set_model_recursive(model);
    }

    /// Attaches a detached item directly to a model (root and header
    /// items).
    pub(crate) fn attach_to_model(&self, model: WeakModelRef) {
        self.set_model_recursive(Some(model));
    }

    /// Detaches this item from its parent and model, invalidating any
    /// persistent indexes into its subtree.
    pub(crate) fn detach(&self) {
        self.set_model_recursive(None);
        self.inner.write().parent = None;
    }

    /// Child handles in slot order, skipping empty slots.
    pub(crate) fn occupied_children(&self) -> Vec<StandardItem> {
        self.inner.read().children.iter().flatten().cloned().collect()
    }

    /// Raw child slots in slot order, including empty ones.
    pub(crate) fn child_slots(&self) -> Vec<Option<StandardItem>> {
        self.inner.read().children.clone()
    }

    /// Role storage snapshot, including the flags entry.
    pub(crate) fn values_snapshot(&self) -> BTreeMap<u32, ItemValue> {
        self.inner.read().values.clone()
    }

    /// Replaces the role storage wholesale, without notification. Used by
    /// the drag payload decoder on freshly made items.
    pub(crate) fn replace_values(&self, values: BTreeMap<u32, ItemValue>) {
        self.inner.write().values = values;
    }
}

impl PartialEq for StandardItem {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for StandardItem {}

impl Hash for StandardItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_ptr_usize().hash(state);
    }
}

impl std::fmt::Debug for StandardItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_read() {
            Some(inner) => {
                let text = inner
                    .values
                    .get(&ItemRole::Display.value())
                    .and_then(|v| v.as_str().map(str::to_owned));
                f.debug_struct("StandardItem")
                    .field("text", &text)
                    .field("rows", &inner.rows)
                    .field("columns", &inner.columns)
                    .finish()
            }
            None => write!(f, "StandardItem(<locked>)"),
        }
    }
}
