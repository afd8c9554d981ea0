//! Window style flags

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Window decorations and affordances
    ///
    /// Bit values are stable: `TITLE_BAR = 1` through `HIDE_IN_TASKBAR = 64`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct WindowStyle: u32 {
        /// Title bar
        const TITLE_BAR = 1;
        /// Window border
        const BORDER = 1 << 1;
        /// Close button
        const CLOSE = 1 << 2;
        /// Minimize button
        const MINIMIZE = 1 << 3;
        /// Maximize button
        const MAXIMIZE = 1 << 4;
        /// User resizing
        const RESIZE = 1 << 5;
        /// Keep the window out of the taskbar
        const HIDE_IN_TASKBAR = 1 << 6;

        /// Every decoration except `HIDE_IN_TASKBAR`
        const DEFAULT = Self::TITLE_BAR.bits()
            | Self::BORDER.bits()
            | Self::CLOSE.bits()
            | Self::MINIMIZE.bits()
            | Self::MAXIMIZE.bits()
            | Self::RESIZE.bits();
    }
}

impl Default for WindowStyle {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl WindowStyle {
    /// Bits that differ between `self` and `other`
    pub const fn changed(self, other: Self) -> Self {
        self.symmetric_difference(other)
    }

    /// Whether the platform should draw a frame at all
    pub const fn is_decorated(self) -> bool {
        self.intersects(Self::TITLE_BAR.union(Self::BORDER))
    }
}
