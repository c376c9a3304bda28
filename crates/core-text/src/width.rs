//! Display width of characters and tab-stop arithmetic.
//!
//! Screen geometry is measured in cells. A tab advances to the next multiple of
//! the tab width measured on the unwrapped (virtual) column; every other
//! character takes its `unicode-width` width, with zero-width and control
//! characters counted as one cell so each buffer column stays addressable.

use unicode_width::UnicodeWidthChar;

/// Cell width of a non-tab character (never 0).
#[inline]
pub fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(1).max(1)
}

/// Cells a tab occupies when it starts at virtual column `vcol`.
#[inline]
pub fn tab_advance(vcol: usize, tab_width: usize) -> usize {
    let tw = tab_width.max(1);
    tw - vcol % tw
}

/// Cells occupied by `c` when it starts at virtual column `vcol`.
#[inline]
pub fn cell_width(c: char, vcol: usize, tab_width: usize) -> usize {
    if c == '\t' {
        tab_advance(vcol, tab_width)
    } else {
        char_width(c)
    }
}

/// Total unwrapped width of `text` with tabs expanded.
pub fn display_width(text: &str, tab_width: usize) -> usize {
    text.chars()
        .fold(0, |vcol, c| vcol + cell_width(c, vcol, tab_width))
}

/// Virtual column at which character `col` starts.
pub fn virtual_col(text: &str, col: usize, tab_width: usize) -> usize {
    text.chars()
        .take(col)
        .fold(0, |vcol, c| vcol + cell_width(c, vcol, tab_width))
}

/// Character column whose span covers virtual column `vcol` (clamped to the line length).
pub fn col_for_virtual(text: &str, vcol: usize, tab_width: usize) -> usize {
    let mut start = 0;
    for (i, c) in text.chars().enumerate() {
        let w = cell_width(c, start, tab_width);
        if vcol < start + w {
            return i;
        }
        start += w;
    }
    text.chars().count()
}
