//! Drag-and-drop payloads for the standard item model.
//!
//! This module provides:
//!
//! - [`ItemDragData`] — a MIME-type keyed byte map carrying drag payloads
//! - [`DropAction`] — the action flags negotiated between drag source and
//!   drop target
//! - the binary item-stream codec behind
//!   `StandardItemModel::mime_data`/`drop_mime_data`
//!
//! # Wire format
//!
//! The item stream under [`ITEM_LIST_MIME`] is a versionless internal
//! format, produced and consumed only by this module; it is not an
//! interchange format and carries no compatibility guarantees. All integers
//! are little-endian.
//!
//! - The stream is a sequence of top-level entries: `u32 row`, `u32 column`
//!   (the dragged item's position in its source parent), then an item
//!   record.
//! - An item record is: `u32` role-entry count, that many `(u32 role,
//!   tagged value)` pairs, `u32` flag bits, `u32` column count, `u32` child
//!   slot count, then one item record per child slot in *reverse* slot
//!   order. An empty slot is written as an empty record (no roles, default
//!   flags, zero columns and children).
//! - The decoder attaches child record `i` at slot
//!   `(i / column_count, i % column_count)`, counting `i` down from
//!   `child_count - 1`.
//!
//! The decoder is strict: every read is bounds-checked, counts are checked
//! against the remaining input, and a non-zero child count with a zero
//! column count is rejected. A malformed stream fails the whole drop.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use trellis_core::logging::targets;

use super::index::ModelIndex;
use super::item::StandardItem;
use super::role::{
    Alignment, CheckState, HorizontalAlignment, ItemRole, ItemValue, VerticalAlignment,
};
use super::standard_model::StandardItemModel;
use super::traits::{ItemFlags, ItemModel};

/// MIME type of the serialized item stream.
pub const ITEM_LIST_MIME: &str = "application/x-trellis-itemmodel-datalist";

/// Actions that can be performed during a drop operation.
///
/// These flags indicate what actions are supported by the drag source and
/// what action was performed by the drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DropAction(u8);

impl DropAction {
    /// No action (drop not allowed).
    pub const NONE: Self = Self(0);
    /// Copy the data.
    pub const COPY: Self = Self(1 << 0);
    /// Move the data (source should delete the original).
    pub const MOVE: Self = Self(1 << 1);
    /// Create a link/reference to the data.
    pub const LINK: Self = Self(1 << 2);
    /// All standard actions (copy, move, and link).
    pub const ALL: Self = Self(Self::COPY.0 | Self::MOVE.0 | Self::LINK.0);

    /// Returns true if this action set contains the Copy action.
    pub fn can_copy(self) -> bool {
        self.contains(Self::COPY)
    }

    /// Returns true if this action set contains the Move action.
    pub fn can_move(self) -> bool {
        self.contains(Self::MOVE)
    }

    /// Returns true if this action set contains the Link action.
    pub fn can_link(self) -> bool {
        self.contains(Self::LINK)
    }

    /// Returns true if this action set contains another action.
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Returns the preferred action from this set.
    ///
    /// Priority: Copy > Move > Link > None
    pub fn preferred(self) -> Self {
        if self.can_copy() {
            Self::COPY
        } else if self.can_move() {
            Self::MOVE
        } else if self.can_link() {
            Self::LINK
        } else {
            Self::NONE
        }
    }
}

impl std::ops::BitOr for DropAction {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for DropAction {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl std::ops::BitOrAssign for DropAction {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAndAssign for DropAction {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

/// Data being transferred in a drag and drop operation.
///
/// `ItemDragData` can hold multiple representations of the same data, each
/// identified by a MIME type, so drop targets can pick the most appropriate
/// format.
#[derive(Debug, Clone, Default)]
pub struct ItemDragData {
    /// Data stored by MIME type.
    data: HashMap<String, Vec<u8>>,
}

impl ItemDragData {
    /// Creates empty drag data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if this drag data is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the available MIME formats.
    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(|s| s.as_str())
    }

    /// Checks if data is available for the given MIME type.
    pub fn has_format(&self, mime_type: &str) -> bool {
        self.data.contains_key(mime_type)
    }

    /// Gets raw data for a MIME type.
    pub fn data(&self, mime_type: &str) -> Option<&[u8]> {
        self.data.get(mime_type).map(|v| v.as_slice())
    }

    /// Sets raw data for a MIME type.
    pub fn set_data(&mut self, mime_type: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.data.insert(mime_type.into(), data.into());
    }
}

/// Errors raised by the item-stream decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadDecodeError {
    /// The stream ended in the middle of a field.
    UnexpectedEof {
        /// Byte offset at which the read was attempted.
        offset: usize,
    },
    /// An unknown value tag was encountered.
    BadValueTag(u8),
    /// A length or count field exceeds what the remaining input could hold.
    CountOutOfRange {
        /// Which field was implausible.
        field: &'static str,
        /// The value read from the stream.
        value: u64,
    },
    /// An item record declares child slots but zero columns.
    ZeroColumns,
    /// A string field held invalid UTF-8.
    InvalidUtf8,
}

impl fmt::Display for PayloadDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof { offset } => {
                write!(f, "item stream ended unexpectedly at byte {offset}")
            }
            Self::BadValueTag(tag) => write!(f, "unknown value tag {tag} in item stream"),
            Self::CountOutOfRange { field, value } => {
                write!(f, "implausible {field} count {value} in item stream")
            }
            Self::ZeroColumns => {
                write!(f, "item record declares children but zero columns")
            }
            Self::InvalidUtf8 => write!(f, "invalid UTF-8 in item stream string"),
        }
    }
}

impl std::error::Error for PayloadDecodeError {}

// -----------------------------------------------------------------------------
// Byte-level plumbing
// -----------------------------------------------------------------------------

/// The smallest possible item record: role count, flags, column count, and
/// child count, one `u32` each. Used to sanity-check child counts.
const MIN_ITEM_RECORD_LEN: usize = 16;

/// The smallest possible role entry: a `u32` role plus a one-byte tag.
const MIN_ROLE_ENTRY_LEN: usize = 5;

struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn put_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn put_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn put_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn put_str(&mut self, value: &str) {
        self.put_u32(value.len() as u32);
        self.buf.extend_from_slice(value.as_bytes());
    }

    fn put_value(&mut self, value: &ItemValue) {
        match value {
            ItemValue::None | ItemValue::Custom(_) => self.put_u8(0),
            ItemValue::String(s) => {
                self.put_u8(1);
                self.put_str(s);
            }
            ItemValue::Int(n) => {
                self.put_u8(2);
                self.put_i64(*n);
            }
            ItemValue::Float(n) => {
                self.put_u8(3);
                self.put_f64(*n);
            }
            ItemValue::Bool(b) => {
                self.put_u8(4);
                self.put_u8(*b as u8);
            }
            ItemValue::CheckState(state) => {
                self.put_u8(5);
                self.put_u8(match state {
                    CheckState::Unchecked => 0,
                    CheckState::PartiallyChecked => 1,
                    CheckState::Checked => 2,
                });
            }
            ItemValue::Alignment(alignment) => {
                self.put_u8(6);
                self.put_u8(match alignment.horizontal {
                    HorizontalAlignment::Left => 0,
                    HorizontalAlignment::Center => 1,
                    HorizontalAlignment::Right => 2,
                    HorizontalAlignment::Justify => 3,
                });
                self.put_u8(match alignment.vertical {
                    VerticalAlignment::Top => 0,
                    VerticalAlignment::Center => 1,
                    VerticalAlignment::Bottom => 2,
                });
            }
            ItemValue::Size(w, h) => {
                self.put_u8(7);
                self.put_f32(*w);
                self.put_f32(*h);
            }
        }
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn has_remaining(&self) -> bool {
        self.pos < self.buf.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], PayloadDecodeError> {
        if self.remaining() < len {
            return Err(PayloadDecodeError::UnexpectedEof { offset: self.pos });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, PayloadDecodeError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, PayloadDecodeError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn i64(&mut self) -> Result<i64, PayloadDecodeError> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn f64(&mut self) -> Result<f64, PayloadDecodeError> {
        Ok(f64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn f32(&mut self) -> Result<f32, PayloadDecodeError> {
        Ok(f32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn string(&mut self) -> Result<String, PayloadDecodeError> {
        let len = self.u32()? as usize;
        if len > self.remaining() {
            return Err(PayloadDecodeError::CountOutOfRange {
                field: "string length",
                value: len as u64,
            });
        }
        std::str::from_utf8(self.take(len)?)
            .map(str::to_owned)
            .map_err(|_| PayloadDecodeError::InvalidUtf8)
    }

    fn value(&mut self) -> Result<ItemValue, PayloadDecodeError> {
        match self.u8()? {
            0 => Ok(ItemValue::None),
            1 => Ok(ItemValue::String(self.string()?)),
            2 => Ok(ItemValue::Int(self.i64()?)),
            3 => Ok(ItemValue::Float(self.f64()?)),
            4 => Ok(ItemValue::Bool(self.u8()? != 0)),
            5 => Ok(ItemValue::CheckState(match self.u8()? {
                0 => CheckState::Unchecked,
                1 => CheckState::PartiallyChecked,
                _ => CheckState::Checked,
            })),
            6 => {
                let horizontal = match self.u8()? {
                    0 => HorizontalAlignment::Left,
                    1 => HorizontalAlignment::Center,
                    2 => HorizontalAlignment::Right,
                    _ => HorizontalAlignment::Justify,
                };
                let vertical = match self.u8()? {
                    0 => VerticalAlignment::Top,
                    2 => VerticalAlignment::Bottom,
                    _ => VerticalAlignment::Center,
                };
                Ok(ItemValue::Alignment(Alignment::new(horizontal, vertical)))
            }
            7 => Ok(ItemValue::Size(self.f32()?, self.f32()?)),
            tag => Err(PayloadDecodeError::BadValueTag(tag)),
        }
    }
}

// -----------------------------------------------------------------------------
// Item stream encode
// -----------------------------------------------------------------------------

fn encode_item(writer: &mut Writer, item: &StandardItem) {
    let values = item.values_snapshot();
    let entries: Vec<(u32, ItemValue)> = values
        .into_iter()
        .filter(|(role, value)| {
            *role != ItemRole::Flags.value() && !matches!(value, ItemValue::Custom(_))
        })
        .collect();
    writer.put_u32(entries.len() as u32);
    for (role, value) in &entries {
        writer.put_u32(*role);
        writer.put_value(value);
    }
    writer.put_u32(item.flags().to_bits());
    writer.put_u32(item.column_count() as u32);
    let slots = item.child_slots();
    writer.put_u32(slots.len() as u32);
    for slot in slots.iter().rev() {
        match slot {
            Some(child) => encode_item(writer, child),
            None => encode_empty_item(writer),
        }
    }
}

fn encode_empty_item(writer: &mut Writer) {
    writer.put_u32(0);
    writer.put_u32(ItemFlags::standard().to_bits());
    writer.put_u32(0);
    writer.put_u32(0);
}

/// Serializes the items behind `indexes` into an [`ItemDragData`] carrying
/// the [`ITEM_LIST_MIME`] stream.
///
/// Only the "true roots" of the selection are written as position-tagged
/// top-level entries: an index whose item is also a descendant of another
/// selected item is folded into its ancestor's subtree instead of being
/// encoded twice.
pub(crate) fn encode_items(model: &StandardItemModel, indexes: &[ModelIndex]) -> ItemDragData {
    let mut selected: Vec<StandardItem> = Vec::new();
    let mut roots: HashSet<usize> = HashSet::new();
    for index in indexes {
        if let Some(item) = model.item_from_index(index) {
            if roots.insert(item.as_ptr_usize()) {
                selected.push(item);
            }
        }
    }

    // Every selected item that is reachable below another selected item is
    // removed from the top-level set; the traversal visits each item once.
    let mut seen: HashSet<usize> = HashSet::new();
    let mut stack: Vec<StandardItem> = selected.clone();
    while let Some(item) = stack.pop() {
        if !seen.insert(item.as_ptr_usize()) {
            continue;
        }
        for child in item.occupied_children() {
            roots.remove(&child.as_ptr_usize());
            stack.push(child);
        }
    }

    let mut writer = Writer::new();
    for item in selected.iter().filter(|item| roots.contains(&item.as_ptr_usize())) {
        let (row, column) = item.position().unwrap_or((0, 0));
        writer.put_u32(row as u32);
        writer.put_u32(column as u32);
        encode_item(&mut writer, item);
    }

    let mut data = ItemDragData::new();
    data.set_data(ITEM_LIST_MIME, writer.into_bytes());
    data
}

// -----------------------------------------------------------------------------
// Item stream decode
// -----------------------------------------------------------------------------

fn decode_item_into(
    reader: &mut Reader<'_>,
    item: &StandardItem,
    model: &StandardItemModel,
) -> Result<(), PayloadDecodeError> {
    let role_count = reader.u32()? as usize;
    if role_count > reader.remaining() / MIN_ROLE_ENTRY_LEN {
        return Err(PayloadDecodeError::CountOutOfRange {
            field: "role",
            value: role_count as u64,
        });
    }
    let mut values: BTreeMap<u32, ItemValue> = BTreeMap::new();
    for _ in 0..role_count {
        let role = reader.u32()?;
        let value = reader.value()?;
        if role != ItemRole::Flags.value() && value.is_some() {
            let key = ItemRole::from_value(role)
                .map(|r| r.storage_value())
                .unwrap_or(role);
            values.insert(key, value);
        }
    }
    let flags = reader.u32()?;
    values.insert(ItemRole::Flags.value(), ItemValue::Int(flags as i64));
    item.replace_values(values);

    let column_count = reader.u32()? as usize;
    let child_count = reader.u32()? as usize;
    if child_count > 0 && column_count == 0 {
        return Err(PayloadDecodeError::ZeroColumns);
    }
    if child_count > reader.remaining() / MIN_ITEM_RECORD_LEN {
        return Err(PayloadDecodeError::CountOutOfRange {
            field: "child",
            value: child_count as u64,
        });
    }
    item.set_column_count(column_count);
    for child_pos in (0..child_count).rev() {
        let child = model.create_item();
        decode_item_into(reader, &child, model)?;
        item.set_child(child_pos / column_count, child_pos % column_count, child);
    }
    Ok(())
}

/// Decodes an [`ITEM_LIST_MIME`] stream and inserts the reconstructed items
/// into the destination table.
///
/// Dragged rows are compressed into consecutive destination rows starting at
/// `row` (append when `None`); the destination auto-expands, and a
/// collision bit-array catches distinct source cells mapping to the same
/// destination cell, spilling them into an extra inserted row. Items that
/// end up with no placement are discarded.
///
/// Returns `false` without touching the model when the action or format is
/// unsupported or the stream is malformed.
pub(crate) fn drop_item_data(
    model: &StandardItemModel,
    data: &ItemDragData,
    action: DropAction,
    row: Option<usize>,
    column: Option<usize>,
    parent: &ModelIndex,
) -> bool {
    if !action.can_copy() && !action.can_move() {
        return false;
    }
    let Some(bytes) = data.data(ITEM_LIST_MIME) else {
        return false;
    };

    let parent_row_count = model.row_count(parent);
    let row = row.unwrap_or(parent_row_count).min(parent_row_count);
    let column = column.unwrap_or(0);

    // Decode every top-level entry up front; a malformed stream fails the
    // whole drop before the model is touched.
    let mut reader = Reader::new(bytes);
    let mut rows: Vec<usize> = Vec::new();
    let mut columns: Vec<usize> = Vec::new();
    let mut items: Vec<StandardItem> = Vec::new();
    let (mut top, mut left, mut bottom, mut right) = (usize::MAX, usize::MAX, 0usize, 0usize);
    while reader.has_remaining() {
        let result = (|| {
            let r = reader.u32()? as usize;
            let c = reader.u32()? as usize;
            let item = model.create_item();
            decode_item_into(&mut reader, &item, model)?;
            Ok::<_, PayloadDecodeError>((r, c, item))
        })();
        match result {
            Ok((r, c, item)) => {
                top = top.min(r);
                left = left.min(c);
                bottom = bottom.max(r);
                right = right.max(c);
                rows.push(r);
                columns.push(c);
                items.push(item);
            }
            Err(err) => {
                tracing::warn!(
                    target: targets::MIME,
                    error = %err,
                    "rejecting malformed item drag payload"
                );
                return false;
            }
        }
    }
    if items.is_empty() {
        return false;
    }

    // Compress the dragged rows into consecutive destination rows.
    let mut rows_to_insert = vec![0usize; bottom + 1];
    for &r in &rows {
        rows_to_insert[r] = 1;
    }
    let mut drag_row_count = 0usize;
    for slot in rows_to_insert.iter_mut() {
        if *slot == 1 {
            *slot = drag_row_count;
            drag_row_count += 1;
        }
    }
    for r in rows.iter_mut() {
        *r = top + rows_to_insert[*r];
    }

    let drag_column_count = right - left + 1;
    // Distinct source cells can map to the same destination cell (items
    // dragged from different tables); track written cells to spill
    // collisions into extra rows.
    let mut is_written_to = vec![false; drag_row_count * drag_column_count];

    // Make space in the destination table.
    let mut col_count = model.column_count(parent);
    if col_count < drag_column_count + column {
        model.insert_columns(col_count, drag_column_count + column - col_count, parent);
        col_count = model.column_count(parent);
    }
    model.insert_rows(row, drag_row_count, parent);

    let parent_item = match model.item_from_index(parent) {
        Some(item) => item,
        None => model.invisible_root_item(),
    };

    let mut destinations: Vec<Option<(usize, usize)>> = vec![None; items.len()];
    for j in 0..items.len() {
        let relative_row = rows[j] - top;
        let relative_column = columns[j] - left;
        let mut destination_row = relative_row + row;
        let mut destination_column = relative_column + column;
        let mut flat = relative_row * drag_column_count + relative_column;
        if destination_column >= col_count || is_written_to[flat] {
            destination_column = destination_column.clamp(column, col_count - 1);
            destination_row = row + drag_row_count;
            model.insert_rows(row + drag_row_count, 1, parent);
            flat = drag_row_count * drag_column_count + relative_column;
            drag_row_count += 1;
            is_written_to.resize(drag_row_count * drag_column_count, false);
        }
        if !is_written_to[flat] {
            destinations[j] = Some((destination_row, destination_column));
            is_written_to[flat] = true;
        }
    }

    for (destination, item) in destinations.into_iter().zip(items) {
        match destination {
            Some((r, c)) => {
                parent_item.set_child(r, c, item);
            }
            None => {
                tracing::trace!(
                    target: targets::MIME,
                    "discarding dropped item with no placement"
                );
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_action_flags() {
        let actions = DropAction::COPY | DropAction::MOVE;
        assert!(actions.can_copy());
        assert!(actions.can_move());
        assert!(!actions.can_link());
        assert!(actions.contains(DropAction::COPY));
        assert_eq!(actions.preferred(), DropAction::COPY);
        assert_eq!(DropAction::NONE.preferred(), DropAction::NONE);
    }

    #[test]
    fn test_drag_data_formats() {
        let mut data = ItemDragData::new();
        assert!(data.is_empty());

        data.set_data(ITEM_LIST_MIME, vec![1, 2, 3]);
        assert!(data.has_format(ITEM_LIST_MIME));
        assert!(!data.has_format("text/plain"));
        assert_eq!(data.data(ITEM_LIST_MIME), Some(&[1u8, 2, 3][..]));
        assert_eq!(data.formats().collect::<Vec<_>>(), vec![ITEM_LIST_MIME]);
    }

    #[test]
    fn test_value_codec_round_trip() {
        let values = [
            ItemValue::None,
            ItemValue::from("héllo"),
            ItemValue::Int(-42),
            ItemValue::Float(2.5),
            ItemValue::Bool(true),
            ItemValue::CheckState(CheckState::PartiallyChecked),
            ItemValue::Alignment(Alignment::right()),
            ItemValue::Size(12.0, 34.5),
        ];
        let mut writer = Writer::new();
        for value in &values {
            writer.put_value(value);
        }
        let bytes = writer.into_bytes();
        let mut reader = Reader::new(&bytes);
        for value in &values {
            assert_eq!(&reader.value().unwrap(), value);
        }
        assert!(!reader.has_remaining());
    }

    #[test]
    fn test_custom_values_encode_as_none() {
        let mut writer = Writer::new();
        writer.put_value(&ItemValue::new(7u32));
        let bytes = writer.into_bytes();
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.value().unwrap(), ItemValue::None);
    }

    #[test]
    fn test_reader_rejects_truncation() {
        let mut writer = Writer::new();
        writer.put_value(&ItemValue::from("truncate me"));
        let bytes = writer.into_bytes();
        let mut reader = Reader::new(&bytes[..bytes.len() - 3]);
        assert!(matches!(
            reader.value(),
            Err(PayloadDecodeError::CountOutOfRange { .. })
                | Err(PayloadDecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_reader_rejects_bad_tag() {
        let mut reader = Reader::new(&[0xff]);
        assert_eq!(reader.value(), Err(PayloadDecodeError::BadValueTag(0xff)));
    }
}
