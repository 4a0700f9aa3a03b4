//! Tests for the standard item model: table scenarios, sorting, persistent
//! indexes, and the drag-and-drop payload round trip.

use std::sync::Arc;

use parking_lot::Mutex;
use trellis::model::{
    DropAction, ITEM_LIST_MIME, ItemDragData, ItemModel, ItemRole, ItemValue, ModelIndex,
    SortOrder, StandardItem, StandardItemModel,
};

fn root() -> ModelIndex {
    ModelIndex::invalid()
}

/// Recursively asserts that two subtrees carry the same data, flags, and
/// child structure on every occupied cell.
fn assert_subtree_equivalent(expected: &StandardItem, actual: &StandardItem) {
    assert_eq!(expected.item_data(), actual.item_data());
    assert_eq!(expected.flags(), actual.flags());
    assert_eq!(expected.column_count(), actual.column_count());
    assert_eq!(expected.row_count(), actual.row_count());
    for row in 0..expected.row_count() {
        for column in 0..expected.column_count() {
            if let Some(expected_child) = expected.child(row, column) {
                let actual_child = actual
                    .child(row, column)
                    .unwrap_or_else(|| panic!("missing child at ({row}, {column})"));
                assert_subtree_equivalent(&expected_child, &actual_child);
            }
        }
    }
}

#[test]
fn test_set_item_on_empty_model_grows_table() {
    let model = StandardItemModel::new();
    assert_eq!(model.row_count(&root()), 0);
    assert_eq!(model.column_count(&root()), 0);

    let item = StandardItem::with_text("corner");
    model.set_item(2, 3, item.clone());

    assert_eq!(model.row_count(&root()), 3);
    assert_eq!(model.column_count(&root()), 4);
    assert_eq!(model.item(2, 3), Some(item));
}

#[test]
fn test_insert_remove_round_trip_restores_counts() {
    let model = StandardItemModel::with_dimensions(2, 2);
    let marker = StandardItem::with_text("survivor");
    model.set_item(1, 0, marker.clone());

    assert!(model.insert_rows(1, 4, &root()));
    assert_eq!(model.row_count(&root()), 6);
    assert!(model.remove_rows(1, 4, &root()));
    assert_eq!(model.row_count(&root()), 2);
    assert_eq!(model.item(1, 0), Some(marker));
}

#[test]
fn test_take_row_detaches_items() {
    let model = StandardItemModel::new();
    model.append_row(vec![
        StandardItem::with_text("a"),
        StandardItem::with_text("b"),
    ]);
    model.append_row(vec![StandardItem::with_text("c")]);

    let taken = model.take_row(0);
    assert_eq!(taken.len(), 2);
    assert_eq!(model.row_count(&root()), 1);
    for item in taken.iter().flatten() {
        assert!(item.model().is_none());
        assert!(item.parent().is_none());
    }
}

#[test]
fn test_sort_descending_moves_persistent_index_to_row_zero() {
    let model = StandardItemModel::new();
    for text in ["alpha", "mid", "zulu"] {
        model.append_row(vec![StandardItem::with_text(text)]);
    }
    // Persistent index on the originally-last row, which sorts first
    // under Descending.
    let persistent = model.persistent_index(&model.index(2, 0, &root()));

    model.sort(0, SortOrder::Descending);

    let texts: Vec<_> = (0..3)
        .map(|row| model.item(row, 0).unwrap().text().unwrap())
        .collect();
    assert_eq!(texts, ["zulu", "mid", "alpha"]);
    assert_eq!(persistent.row(), 0);
    assert_eq!(
        model.display_text(&persistent.index()).as_deref(),
        Some("zulu")
    );
}

#[test]
fn test_edit_role_aliasing_through_model() {
    let model = StandardItemModel::with_dimensions(1, 1);
    let index = model.index(0, 0, &root());
    assert!(model.set_data(&index, ItemValue::from("Editable"), ItemRole::Edit));
    assert_eq!(
        model.data(&index, ItemRole::Display).as_str(),
        Some("Editable")
    );
}

#[test]
fn test_set_child_with_attached_item_leaves_slot_unchanged() {
    let model = StandardItemModel::new();
    let owned = StandardItem::with_text("owned");
    model.append_row(vec![owned.clone()]);

    let other = StandardItem::new();
    assert!(!other.set_child(0, 0, owned.clone()));
    assert_eq!(other.child(0, 0), None);
    assert_eq!(model.item(0, 0), Some(owned));
}

#[test]
fn test_layout_signals_bracket_sort() {
    let model = StandardItemModel::new();
    for text in ["b", "a"] {
        model.append_row(vec![StandardItem::with_text(text)]);
    }

    let events = Arc::new(Mutex::new(Vec::new()));
    let observed = model.clone();
    let sink = events.clone();
    model.signals().layout_about_to_change.connect(move |_| {
        let first = observed.display_text(&observed.index(0, 0, &ModelIndex::invalid()));
        sink.lock().push(("about", first));
    });
    let observed = model.clone();
    let sink = events.clone();
    model.signals().layout_changed.connect(move |_| {
        let first = observed.display_text(&observed.index(0, 0, &ModelIndex::invalid()));
        sink.lock().push(("changed", first));
    });

    model.sort(0, SortOrder::Ascending);

    let events = events.lock();
    assert_eq!(events[0], ("about", Some("b".to_string())));
    assert_eq!(events[1], ("changed", Some("a".to_string())));
}

#[test]
fn test_mime_round_trip_reproduces_subtrees() {
    let source = StandardItemModel::new();

    // First selected root: a 2x2 subtree with one empty slot and a
    // grandchild.
    let parent = StandardItem::with_text("parent");
    parent.set_check_state(trellis::model::CheckState::Checked);
    parent.set_data(ItemValue::Int(7), ItemRole::User(3));
    let child_a = StandardItem::with_text("child a");
    let grandchild = StandardItem::with_text("grandchild");
    child_a.set_child(0, 0, grandchild);
    parent.set_child(0, 0, child_a);
    parent.set_child(1, 1, StandardItem::with_text("child d"));

    // Second selected root: a flat item with non-default flags.
    let sibling = StandardItem::with_text("sibling");
    sibling.set_editable(false);

    source.append_row(vec![parent.clone()]);
    source.append_row(vec![sibling.clone()]);

    // Select both roots AND a descendant of the first; the descendant must
    // be folded into its ancestor's subtree rather than encoded twice.
    let parent_index = source.index(0, 0, &root());
    let sibling_index = source.index(1, 0, &root());
    let child_index = source.index(0, 0, &parent_index);
    let payload = source.mime_data(&[
        parent_index.clone(),
        sibling_index,
        child_index,
    ]);
    assert!(payload.has_format(ITEM_LIST_MIME));

    let target = StandardItemModel::new();
    assert!(target.drop_mime_data(&payload, DropAction::COPY, None, None, &root()));

    // Two top-level entries, no duplicate for the selected descendant.
    assert_eq!(target.row_count(&root()), 2);
    assert_eq!(target.column_count(&root()), 1);

    let dropped_parent = target.item(0, 0).unwrap();
    let dropped_sibling = target.item(1, 0).unwrap();
    assert_subtree_equivalent(&parent, &dropped_parent);
    assert_eq!(dropped_sibling.text().as_deref(), Some("sibling"));
    assert!(!dropped_sibling.flags().editable);
}

#[test]
fn test_drop_appends_at_requested_row() {
    let source = StandardItemModel::new();
    source.append_row(vec![StandardItem::with_text("dragged")]);
    let payload = source.mime_data(&[source.index(0, 0, &root())]);

    let target = StandardItemModel::new();
    for text in ["one", "two"] {
        target.append_row(vec![StandardItem::with_text(text)]);
    }

    assert!(target.drop_mime_data(&payload, DropAction::MOVE, Some(1), None, &root()));
    let texts: Vec<_> = (0..3)
        .map(|row| target.item(row, 0).unwrap().text().unwrap())
        .collect();
    assert_eq!(texts, ["one", "dragged", "two"]);
}

#[test]
fn test_drop_collision_spills_into_extra_row() {
    // Two separately encoded payloads whose top-level entries share the
    // same source position; concatenated they collide on the destination
    // cell and the second item must spill into an extra inserted row.
    let source_a = StandardItemModel::new();
    source_a.append_row(vec![StandardItem::with_text("first")]);
    let source_b = StandardItemModel::new();
    source_b.append_row(vec![StandardItem::with_text("second")]);

    let payload_a = source_a.mime_data(&[source_a.index(0, 0, &root())]);
    let payload_b = source_b.mime_data(&[source_b.index(0, 0, &root())]);
    let mut combined_bytes = payload_a.data(ITEM_LIST_MIME).unwrap().to_vec();
    combined_bytes.extend_from_slice(payload_b.data(ITEM_LIST_MIME).unwrap());
    let mut combined = ItemDragData::new();
    combined.set_data(ITEM_LIST_MIME, combined_bytes);

    let target = StandardItemModel::new();
    assert!(target.drop_mime_data(&combined, DropAction::COPY, None, None, &root()));

    assert_eq!(target.row_count(&root()), 2);
    let texts: Vec<_> = (0..2)
        .map(|row| target.item(row, 0).unwrap().text().unwrap())
        .collect();
    assert!(texts.contains(&"first".to_string()));
    assert!(texts.contains(&"second".to_string()));
}

#[test]
fn test_drop_rejects_unsupported_action_and_format() {
    let source = StandardItemModel::new();
    source.append_row(vec![StandardItem::with_text("x")]);
    let payload = source.mime_data(&[source.index(0, 0, &root())]);

    let target = StandardItemModel::new();
    assert!(!target.drop_mime_data(&payload, DropAction::LINK, None, None, &root()));
    assert!(!target.drop_mime_data(&ItemDragData::new(), DropAction::COPY, None, None, &root()));
    assert_eq!(target.row_count(&root()), 0);
}

#[test]
fn test_drop_rejects_truncated_payload() {
    let source = StandardItemModel::new();
    source.append_row(vec![StandardItem::with_text("payload")]);
    let payload = source.mime_data(&[source.index(0, 0, &root())]);
    let bytes = payload.data(ITEM_LIST_MIME).unwrap();

    let mut truncated = ItemDragData::new();
    truncated.set_data(ITEM_LIST_MIME, bytes[..bytes.len() - 2].to_vec());

    let target = StandardItemModel::new();
    assert!(!target.drop_mime_data(&truncated, DropAction::COPY, None, None, &root()));
    assert_eq!(target.row_count(&root()), 0);
}

#[test]
fn test_drop_rejects_zero_columns_with_children() {
    // Hand-crafted stream: one top-level entry whose record declares five
    // child slots but zero columns.
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0u32.to_le_bytes()); // row
    bytes.extend_from_slice(&0u32.to_le_bytes()); // column
    bytes.extend_from_slice(&0u32.to_le_bytes()); // role count
    bytes.extend_from_slice(&0u32.to_le_bytes()); // flags
    bytes.extend_from_slice(&0u32.to_le_bytes()); // column count
    bytes.extend_from_slice(&5u32.to_le_bytes()); // child count
    let mut payload = ItemDragData::new();
    payload.set_data(ITEM_LIST_MIME, bytes);

    let target = StandardItemModel::new();
    assert!(!target.drop_mime_data(&payload, DropAction::COPY, None, None, &root()));
    assert_eq!(target.row_count(&root()), 0);
}

#[test]
fn test_header_lockstep_from_root_item_api() {
    // Structural edits made through the invisible root item must keep the
    // model's header arrays in lockstep, same as the model-level API.
    let model = StandardItemModel::with_dimensions(3, 1);
    model.set_vertical_header_labels(&["r0", "r1", "r2"]);

    let root_item = model.invisible_root_item();
    root_item.remove_rows(0, 1);

    // Removing through the item API dropped the first header item too.
    assert_eq!(model.row_count(&root()), 2);
    assert_eq!(
        model
            .header_data(0, trellis::model::Orientation::Vertical, ItemRole::Display)
            .as_str(),
        Some("r1")
    );
    assert_eq!(
        model
            .header_data(1, trellis::model::Orientation::Vertical, ItemRole::Display)
            .as_str(),
        Some("r2")
    );
}

#[test]
fn test_take_column_detaches_and_shrinks() {
    let model = StandardItemModel::new();
    model.append_row(vec![
        StandardItem::with_text("a0"),
        StandardItem::with_text("a1"),
    ]);
    model.append_row(vec![
        StandardItem::with_text("b0"),
        StandardItem::with_text("b1"),
    ]);

    let taken = model.take_column(0);
    assert_eq!(taken.len(), 2);
    assert_eq!(model.column_count(&root()), 1);
    assert_eq!(taken[0].as_ref().unwrap().text().as_deref(), Some("a0"));
    assert!(taken[0].as_ref().unwrap().model().is_none());
    assert_eq!(model.item(0, 0).unwrap().text().as_deref(), Some("a1"));
}
