//! Data roles for item models.
//!
//! Roles define what type of data is being requested or set on a model item.
//! Each item can have multiple pieces of data associated with it,
//! distinguished by their role.

use std::cmp::Ordering;

/// Standard roles for accessing different aspects of item data.
///
/// When querying data from a model via `ItemModel::data()`, the role
/// specifies what information is being requested. Each item can have data
/// for multiple roles.
///
/// Role 0 ([`ItemRole::Flags`]) is reserved: items store their flag bitmask
/// under it, and the convenience accessors on `StandardItem` read and write
/// it. [`ItemRole::Edit`] aliases [`ItemRole::Display`] — both read and
/// write the same stored value.
///
/// # Example
///
/// ```ignore
/// use trellis::model::{ItemModel, ModelIndex, ItemRole};
///
/// // Get display text
/// let text = model.data(&index, ItemRole::Display);
///
/// // Get custom data
/// let custom = model.data(&index, ItemRole::User(0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ItemRole {
    /// Reserved: the item's flag bitmask. Use the flag accessors instead of
    /// reading this directly.
    Flags = 0,

    /// Primary text to display. Should return `String`.
    Display = 1,

    /// Icon or decoration to show alongside the text.
    Decoration = 2,

    /// Value for editing. Stored in the same slot as `Display`.
    Edit = 3,

    /// Tooltip text shown on hover. Should return `String`.
    ToolTip = 4,

    /// Text shown in the status bar when the item is selected.
    StatusTip = 5,

    /// Extended "What's This?" help text.
    WhatsThis = 6,

    /// Text alignment for this item. Should return `Alignment`.
    TextAlignment = 7,

    /// Check state for checkable items. Should return `CheckState`.
    CheckState = 8,

    /// Size hint for the item. Should return `Size`.
    SizeHint = 9,

    /// Accessible text for screen readers.
    AccessibleText = 10,

    /// Accessible description for screen readers.
    AccessibleDescription = 11,

    /// First role available for application-specific data.
    /// Use `ItemRole::User(n)` for custom roles where n >= 0.
    User(u32) = 256,
}

impl ItemRole {
    /// Returns `true` if this is a user-defined role.
    #[inline]
    pub fn is_user_role(&self) -> bool {
        matches!(self, ItemRole::User(_))
    }

    /// Returns the numeric value of this role.
    ///
    /// Standard roles have fixed values 0-255.
    /// User roles have values >= 256.
    pub fn value(&self) -> u32 {
        match self {
            ItemRole::Flags => 0,
            ItemRole::Display => 1,
            ItemRole::Decoration => 2,
            ItemRole::Edit => 3,
            ItemRole::ToolTip => 4,
            ItemRole::StatusTip => 5,
            ItemRole::WhatsThis => 6,
            ItemRole::TextAlignment => 7,
            ItemRole::CheckState => 8,
            ItemRole::SizeHint => 9,
            ItemRole::AccessibleText => 10,
            ItemRole::AccessibleDescription => 11,
            ItemRole::User(n) => 256 + n,
        }
    }

    /// Creates an ItemRole from a numeric value.
    ///
    /// Returns `None` for reserved but undefined role values (12-255).
    pub fn from_value(value: u32) -> Option<Self> {
        match value {
            0 => Some(ItemRole::Flags),
            1 => Some(ItemRole::Display),
            2 => Some(ItemRole::Decoration),
            3 => Some(ItemRole::Edit),
            4 => Some(ItemRole::ToolTip),
            5 => Some(ItemRole::StatusTip),
            6 => Some(ItemRole::WhatsThis),
            7 => Some(ItemRole::TextAlignment),
            8 => Some(ItemRole::CheckState),
            9 => Some(ItemRole::SizeHint),
            10 => Some(ItemRole::AccessibleText),
            11 => Some(ItemRole::AccessibleDescription),
            12..=255 => None, // Reserved for future standard roles
            n => Some(ItemRole::User(n - 256)),
        }
    }

    /// Returns the role under which this role's data is actually stored.
    ///
    /// `Edit` and `Display` alias the same storage slot; everything else
    /// stores under its own value.
    #[inline]
    pub(crate) fn storage_value(&self) -> u32 {
        match self {
            ItemRole::Edit => ItemRole::Display.value(),
            other => other.value(),
        }
    }
}

/// Alignment of content within an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Alignment {
    /// Horizontal alignment.
    pub horizontal: HorizontalAlignment,
    /// Vertical alignment.
    pub vertical: VerticalAlignment,
}

impl Alignment {
    /// Creates a new alignment with the specified horizontal and vertical values.
    pub fn new(horizontal: HorizontalAlignment, vertical: VerticalAlignment) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Left-aligned, vertically centered (common default).
    pub const fn left() -> Self {
        Self {
            horizontal: HorizontalAlignment::Left,
            vertical: VerticalAlignment::Center,
        }
    }

    /// Centered horizontally and vertically.
    pub const fn center() -> Self {
        Self {
            horizontal: HorizontalAlignment::Center,
            vertical: VerticalAlignment::Center,
        }
    }

    /// Right-aligned, vertically centered.
    pub const fn right() -> Self {
        Self {
            horizontal: HorizontalAlignment::Right,
            vertical: VerticalAlignment::Center,
        }
    }
}

/// Horizontal content alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlignment {
    /// Align to the left edge.
    #[default]
    Left,
    /// Align to the center.
    Center,
    /// Align to the right edge.
    Right,
    /// Justify (stretch to fill width).
    Justify,
}

/// Vertical content alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlignment {
    /// Align to the top edge.
    Top,
    /// Align to the center.
    #[default]
    Center,
    /// Align to the bottom edge.
    Bottom,
}

/// Check state for checkable items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum CheckState {
    /// Item is unchecked.
    #[default]
    Unchecked,
    /// Item is partially checked (for tri-state checkboxes).
    PartiallyChecked,
    /// Item is checked.
    Checked,
}

impl CheckState {
    /// Returns `true` if the item is checked (fully or partially).
    pub fn is_checked(&self) -> bool {
        !matches!(self, CheckState::Unchecked)
    }

    /// Returns `true` if the item is fully checked.
    pub fn is_fully_checked(&self) -> bool {
        matches!(self, CheckState::Checked)
    }

    /// Toggles between Unchecked and Checked.
    /// PartiallyChecked becomes Unchecked.
    pub fn toggle(&self) -> CheckState {
        match self {
            CheckState::Unchecked => CheckState::Checked,
            CheckState::PartiallyChecked | CheckState::Checked => CheckState::Unchecked,
        }
    }
}

/// Type-erased container for item data.
///
/// `ItemValue` can hold any type of data associated with an item role.
/// It provides type-safe access through the `as_*` methods and the generic
/// `downcast` method.
///
/// `Custom` values are process-local: cloning one yields `ItemValue::None`,
/// and the drag payload codec skips them.
///
/// # Example
///
/// ```
/// use trellis::model::ItemValue;
///
/// // Create from a string
/// let value = ItemValue::from("Hello");
/// assert_eq!(value.as_str(), Some("Hello"));
///
/// // Downcast an arbitrary type
/// let value = ItemValue::new(42u32);
/// assert_eq!(value.downcast::<u32>(), Some(&42));
/// ```
#[derive(Debug, Default)]
pub enum ItemValue {
    /// No data.
    #[default]
    None,
    /// String data (for Display, ToolTip, etc.).
    String(String),
    /// Integer data.
    Int(i64),
    /// Floating point data.
    Float(f64),
    /// Boolean data.
    Bool(bool),
    /// Content alignment data.
    Alignment(Alignment),
    /// Check state data.
    CheckState(CheckState),
    /// Size data (width, height).
    Size(f32, f32),
    /// Custom data (type-erased).
    Custom(Box<dyn std::any::Any + Send + Sync>),
}

impl Clone for ItemValue {
    fn clone(&self) -> Self {
        match self {
            ItemValue::None => ItemValue::None,
            ItemValue::String(s) => ItemValue::String(s.clone()),
            ItemValue::Int(n) => ItemValue::Int(*n),
            ItemValue::Float(n) => ItemValue::Float(*n),
            ItemValue::Bool(b) => ItemValue::Bool(*b),
            ItemValue::Alignment(a) => ItemValue::Alignment(*a),
            ItemValue::CheckState(s) => ItemValue::CheckState(*s),
            ItemValue::Size(w, h) => ItemValue::Size(*w, *h),
            // Custom data cannot be cloned; becomes None
            ItemValue::Custom(_) => ItemValue::None,
        }
    }
}

impl PartialEq for ItemValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ItemValue::None, ItemValue::None) => true,
            (ItemValue::String(a), ItemValue::String(b)) => a == b,
            (ItemValue::Int(a), ItemValue::Int(b)) => a == b,
            (ItemValue::Float(a), ItemValue::Float(b)) => a == b,
            (ItemValue::Bool(a), ItemValue::Bool(b)) => a == b,
            (ItemValue::Alignment(a), ItemValue::Alignment(b)) => a == b,
            (ItemValue::CheckState(a), ItemValue::CheckState(b)) => a == b,
            (ItemValue::Size(aw, ah), ItemValue::Size(bw, bh)) => aw == bw && ah == bh,
            // Custom data has no equality; treat as always distinct
            _ => false,
        }
    }
}

impl ItemValue {
    /// Creates new custom data from any type.
    pub fn new<T: std::any::Any + Send + Sync + 'static>(value: T) -> Self {
        ItemValue::Custom(Box::new(value))
    }

    /// Returns `true` if this is `ItemValue::None`.
    pub fn is_none(&self) -> bool {
        matches!(self, ItemValue::None)
    }

    /// Returns `true` if this contains some data.
    pub fn is_some(&self) -> bool {
        !self.is_none()
    }

    /// Attempts to get the data as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ItemValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Attempts to get the data as an owned string.
    pub fn into_string(self) -> Option<String> {
        match self {
            ItemValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to get the data as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ItemValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to get the data as a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ItemValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to get the data as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ItemValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to get the data as an alignment.
    pub fn as_alignment(&self) -> Option<Alignment> {
        match self {
            ItemValue::Alignment(a) => Some(*a),
            _ => None,
        }
    }

    /// Attempts to get the data as a check state.
    pub fn as_check_state(&self) -> Option<CheckState> {
        match self {
            ItemValue::CheckState(s) => Some(*s),
            _ => None,
        }
    }

    /// Attempts to get the data as a size tuple.
    pub fn as_size(&self) -> Option<(f32, f32)> {
        match self {
            ItemValue::Size(w, h) => Some((*w, *h)),
            _ => None,
        }
    }

    /// Attempts to downcast custom data to the specified type.
    pub fn downcast<T: std::any::Any>(&self) -> Option<&T> {
        match self {
            ItemValue::Custom(data) => data.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Attempts to downcast and take ownership of custom data.
    pub fn downcast_into<T: std::any::Any>(self) -> Option<T> {
        match self {
            ItemValue::Custom(data) => data.downcast::<T>().ok().map(|b| *b),
            _ => None,
        }
    }

    /// A best-effort string rendering used as a comparison fallback when two
    /// values have different types.
    fn sort_key(&self) -> String {
        match self {
            ItemValue::String(s) => s.clone(),
            ItemValue::Int(n) => n.to_string(),
            ItemValue::Float(n) => n.to_string(),
            ItemValue::Bool(b) => b.to_string(),
            _ => String::new(),
        }
    }
}

/// Total ordering between two item values, used by sorting.
///
/// Same-type values compare naturally; `Int` and `Float` compare as floats;
/// `None` sorts before everything else; mixed types fall back to comparing
/// their display-string renderings.
pub fn value_ordering(lhs: &ItemValue, rhs: &ItemValue) -> Ordering {
    match (lhs, rhs) {
        (ItemValue::None, ItemValue::None) => Ordering::Equal,
        (ItemValue::None, _) => Ordering::Less,
        (_, ItemValue::None) => Ordering::Greater,
        (ItemValue::Int(a), ItemValue::Int(b)) => a.cmp(b),
        (ItemValue::Float(a), ItemValue::Float(b)) => a.total_cmp(b),
        (ItemValue::Int(a), ItemValue::Float(b)) => (*a as f64).total_cmp(b),
        (ItemValue::Float(a), ItemValue::Int(b)) => a.total_cmp(&(*b as f64)),
        (ItemValue::Bool(a), ItemValue::Bool(b)) => a.cmp(b),
        (ItemValue::String(a), ItemValue::String(b)) => a.cmp(b),
        (ItemValue::CheckState(a), ItemValue::CheckState(b)) => a.cmp(b),
        (a, b) => a.sort_key().cmp(&b.sort_key()),
    }
}

impl From<String> for ItemValue {
    fn from(s: String) -> Self {
        ItemValue::String(s)
    }
}

impl From<&str> for ItemValue {
    fn from(s: &str) -> Self {
        ItemValue::String(s.to_string())
    }
}

impl From<i64> for ItemValue {
    fn from(n: i64) -> Self {
        ItemValue::Int(n)
    }
}

impl From<i32> for ItemValue {
    fn from(n: i32) -> Self {
        ItemValue::Int(n as i64)
    }
}

impl From<f64> for ItemValue {
    fn from(n: f64) -> Self {
        ItemValue::Float(n)
    }
}

impl From<f32> for ItemValue {
    fn from(n: f32) -> Self {
        ItemValue::Float(n as f64)
    }
}

impl From<bool> for ItemValue {
    fn from(b: bool) -> Self {
        ItemValue::Bool(b)
    }
}

impl From<Alignment> for ItemValue {
    fn from(a: Alignment) -> Self {
        ItemValue::Alignment(a)
    }
}

impl From<CheckState> for ItemValue {
    fn from(s: CheckState) -> Self {
        ItemValue::CheckState(s)
    }
}

impl From<Option<String>> for ItemValue {
    fn from(opt: Option<String>) -> Self {
        match opt {
            Some(s) => ItemValue::String(s),
            None => ItemValue::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_role_values() {
        assert_eq!(ItemRole::Flags.value(), 0);
        assert_eq!(ItemRole::Display.value(), 1);
        assert_eq!(ItemRole::User(0).value(), 256);
        assert_eq!(ItemRole::User(10).value(), 266);
    }

    #[test]
    fn test_item_role_from_value() {
        assert_eq!(ItemRole::from_value(0), Some(ItemRole::Flags));
        assert_eq!(ItemRole::from_value(8), Some(ItemRole::CheckState));
        assert_eq!(ItemRole::from_value(256), Some(ItemRole::User(0)));
        assert_eq!(ItemRole::from_value(100), None); // Reserved
    }

    #[test]
    fn test_edit_aliases_display_storage() {
        assert_eq!(ItemRole::Edit.storage_value(), ItemRole::Display.value());
        assert_eq!(ItemRole::ToolTip.storage_value(), ItemRole::ToolTip.value());
    }

    #[test]
    fn test_check_state_toggle() {
        assert_eq!(CheckState::Unchecked.toggle(), CheckState::Checked);
        assert_eq!(CheckState::Checked.toggle(), CheckState::Unchecked);
        assert_eq!(CheckState::PartiallyChecked.toggle(), CheckState::Unchecked);
    }

    #[test]
    fn test_item_value_string() {
        let value = ItemValue::from("hello");
        assert_eq!(value.as_str(), Some("hello"));
        assert!(value.as_int().is_none());
    }

    #[test]
    fn test_item_value_custom() {
        #[derive(Debug, PartialEq)]
        struct MyData(u32);

        let value = ItemValue::new(MyData(42));
        assert_eq!(value.downcast::<MyData>(), Some(&MyData(42)));
        assert!(value.downcast::<u32>().is_none());

        // Cloning custom data degrades to None
        assert!(value.clone().is_none());
    }

    #[test]
    fn test_value_ordering() {
        use std::cmp::Ordering;

        assert_eq!(
            value_ordering(&ItemValue::Int(1), &ItemValue::Int(2)),
            Ordering::Less
        );
        assert_eq!(
            value_ordering(&ItemValue::Int(3), &ItemValue::Float(2.5)),
            Ordering::Greater
        );
        assert_eq!(
            value_ordering(&ItemValue::from("a"), &ItemValue::from("b")),
            Ordering::Less
        );
        // None sorts before any value
        assert_eq!(
            value_ordering(&ItemValue::None, &ItemValue::from("a")),
            Ordering::Less
        );
        // Mixed types fall back to string renderings
        assert_eq!(
            value_ordering(&ItemValue::Int(10), &ItemValue::from("10")),
            Ordering::Equal
        );
    }
}
