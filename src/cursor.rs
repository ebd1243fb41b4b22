//! Abstract cursor identities and their backend cursor names.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Describes the appearance of the mouse cursor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MouseCursor {
    Default,
    /// Hides the cursor.
    None,
    Text,
    VerticalText,
    Pointer,
    Crosshair,
    AllScroll,
    ColResize,
    RowResize,
    Grab,
    Grabbing,
    NotAllowed,
    Wait,
    Progress,
    NorthWestResize,
    NorthEastResize,
    SouthWestResize,
    SouthEastResize,
    NorthSouthResize,
    EastWestResize,
    WestResize,
    EastResize,
    NorthResize,
    SouthResize,
    NorthEastSouthWestResize,
    NorthWestSouthEastResize,
}

impl MouseCursor {
    pub const COUNT: usize = 26;

    /// Every cursor identity, in discriminant order.
    pub const ALL: [MouseCursor; MouseCursor::COUNT] = [
        MouseCursor::Default,
        MouseCursor::None,
        MouseCursor::Text,
        MouseCursor::VerticalText,
        MouseCursor::Pointer,
        MouseCursor::Crosshair,
        MouseCursor::AllScroll,
        MouseCursor::ColResize,
        MouseCursor::RowResize,
        MouseCursor::Grab,
        MouseCursor::Grabbing,
        MouseCursor::NotAllowed,
        MouseCursor::Wait,
        MouseCursor::Progress,
        MouseCursor::NorthWestResize,
        MouseCursor::NorthEastResize,
        MouseCursor::SouthWestResize,
        MouseCursor::SouthEastResize,
        MouseCursor::NorthSouthResize,
        MouseCursor::EastWestResize,
        MouseCursor::WestResize,
        MouseCursor::EastResize,
        MouseCursor::NorthResize,
        MouseCursor::SouthResize,
        MouseCursor::NorthEastSouthWestResize,
        MouseCursor::NorthWestSouthEastResize,
    ];

    /// Converts a raw cursor id back into a cursor. Ids outside the
    /// enumeration yield `None`.
    pub fn from_raw(id: u32) -> Option<Self> {
        MouseCursor::ALL.get(id as usize).cloned()
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self as u32
    }
}

impl Default for MouseCursor {
    fn default() -> Self {
        MouseCursor::Default
    }
}

// Xcursor theme names, indexed by `MouseCursor as usize`. Wayland compositors
// load cursors from the same themes.
const XCURSOR_NAMES: [&str; MouseCursor::COUNT] = [
    "left_ptr",
    "",
    "xterm",
    "vertical-text",
    "hand2",
    "crosshair",
    "fleur",
    "sb_h_double_arrow",
    "sb_v_double_arrow",
    "hand1",
    "move",
    "crossed_circle",
    "watch",
    "left_ptr_watch",
    "top_left_corner",
    "top_right_corner",
    "bottom_left_corner",
    "bottom_right_corner",
    "sb_v_double_arrow",
    "sb_h_double_arrow",
    "left_side",
    "right_side",
    "top_side",
    "bottom_side",
    "fd_double_arrow",
    "bd_double_arrow",
];

/// Immutable table from cursor identity to backend cursor name.
///
/// An empty name is meaningful: the backend should show no cursor at all.
#[derive(Debug, Clone, Copy)]
pub struct CursorCatalog {
    names: &'static [&'static str; MouseCursor::COUNT],
}

impl CursorCatalog {
    pub const XCURSOR: CursorCatalog = CursorCatalog {
        names: &XCURSOR_NAMES,
    };

    #[inline]
    pub fn name(&self, cursor: MouseCursor) -> &'static str {
        self.names[cursor as usize]
    }

    /// Looks up a raw cursor id. Returns `None` for ids that are not part of
    /// the cursor enumeration.
    pub fn lookup(&self, id: u32) -> Option<&'static str> {
        MouseCursor::from_raw(id).map(|cursor| self.name(cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_cursor_is_found() {
        for cursor in MouseCursor::ALL.iter() {
            assert_eq!(
                CursorCatalog::XCURSOR.lookup(cursor.raw()),
                Some(CursorCatalog::XCURSOR.name(*cursor)),
            );
        }
    }

    #[test]
    fn all_is_in_discriminant_order() {
        for (index, cursor) in MouseCursor::ALL.iter().enumerate() {
            assert_eq!(cursor.raw() as usize, index);
        }
    }

    #[test]
    fn hidden_cursor_maps_to_empty_name() {
        assert_eq!(CursorCatalog::XCURSOR.lookup(MouseCursor::None.raw()), Some(""));
        assert_eq!(CursorCatalog::XCURSOR.name(MouseCursor::Default), "left_ptr");
        assert_eq!(CursorCatalog::XCURSOR.name(MouseCursor::Grabbing), "move");
    }

    #[test]
    fn out_of_range_ids_are_rejected() {
        assert_eq!(CursorCatalog::XCURSOR.lookup(MouseCursor::COUNT as u32), None);
        assert_eq!(CursorCatalog::XCURSOR.lookup(u32::max_value()), None);
        assert_eq!(MouseCursor::from_raw(MouseCursor::COUNT as u32), None);
    }

    #[test]
    fn only_the_hidden_cursor_is_unnamed() {
        for cursor in MouseCursor::ALL.iter() {
            let name = CursorCatalog::XCURSOR.name(*cursor);
            assert_eq!(name.is_empty(), *cursor == MouseCursor::None, "{:?}", cursor);
        }
    }
}
