//! Style attributes: color + text attribute bitset.
//!
//! Grounded on the teacher's `Rgba`/`Attr` pair (`rust/src/utils/mod.rs`),
//! adapted to the three color modes the spec calls for (Named, Indexed,
//! RGB) rather than a single packed-u32 representation, since containers
//! here compare styles structurally rather than unpacking a shared buffer.

bitflags::bitflags! {
    /// Text attribute flags, combined with bitwise OR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attrs: u8 {
        const BOLD          = 1 << 0;
        const FAINT         = 1 << 1;
        const ITALIC        = 1 << 2;
        const UNDERLINE     = 1 << 3;
        const BLINK         = 1 << 4;
        const INVERSE       = 1 << 5;
        const HIDDEN        = 1 << 6;
        const STRIKETHROUGH = 1 << 7;
    }
}

/// One of the 16 standard ANSI color names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

impl NamedColor {
    /// Base SGR offset (30/90-series) index within its bright/non-bright half.
    const fn ansi_index(self) -> u8 {
        self as u8
    }
}

/// A foreground or background color in one of three modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Let the terminal pick (SGR 39/49).
    #[default]
    Default,
    Named(NamedColor),
    Indexed(u8),
    Rgb(u8, u8, u8),
}

/// Foreground + background + attribute flags. Structural equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StyleAttributes {
    pub fg: Color,
    pub bg: Color,
    pub attrs: Attrs,
}

impl StyleAttributes {
    pub const NORMAL: Self = Self {
        fg: Color::Default,
        bg: Color::Default,
        attrs: Attrs::empty(),
    };

    pub fn new(fg: Color, bg: Color, attrs: Attrs) -> Self {
        Self { fg, bg, attrs }
    }

    /// Merge `other` over `self`: any non-default field in `other` wins.
    pub fn merge(self, other: StyleAttributes) -> StyleAttributes {
        StyleAttributes {
            fg: if other.fg == Color::Default { self.fg } else { other.fg },
            bg: if other.bg == Color::Default { self.bg } else { other.bg },
            attrs: self.attrs | other.attrs,
        }
    }
}

/// SGR parameter codes for foreground/background, given a [`Color`].
pub(crate) fn sgr_fg_params(color: Color) -> Vec<u16> {
    match color {
        Color::Default => vec![39],
        Color::Named(n) => {
            let idx = n.ansi_index();
            if idx < 8 {
                vec![30 + idx as u16]
            } else {
                vec![90 + (idx - 8) as u16]
            }
        }
        Color::Indexed(n) => vec![38, 5, n as u16],
        Color::Rgb(r, g, b) => vec![38, 2, r as u16, g as u16, b as u16],
    }
}

pub(crate) fn sgr_bg_params(color: Color) -> Vec<u16> {
    match color {
        Color::Default => vec![49],
        Color::Named(n) => {
            let idx = n.ansi_index();
            if idx < 8 {
                vec![40 + idx as u16]
            } else {
                vec![100 + (idx - 8) as u16]
            }
        }
        Color::Indexed(n) => vec![48, 5, n as u16],
        Color::Rgb(r, g, b) => vec![48, 2, r as u16, g as u16, b as u16],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_is_default_plus_no_attrs() {
        let s = StyleAttributes::NORMAL;
        assert_eq!(s.fg, Color::Default);
        assert_eq!(s.bg, Color::Default);
        assert!(s.attrs.is_empty());
    }

    #[test]
    fn equality_is_structural() {
        let a = StyleAttributes::new(Color::Named(NamedColor::Red), Color::Default, Attrs::BOLD);
        let b = StyleAttributes::new(Color::Named(NamedColor::Red), Color::Default, Attrs::BOLD);
        assert_eq!(a, b);
        let c = StyleAttributes::new(Color::Named(NamedColor::Red), Color::Default, Attrs::ITALIC);
        assert_ne!(a, c);
    }

    #[test]
    fn merge_prefers_non_default_other() {
        let base = StyleAttributes::new(Color::Named(NamedColor::Red), Color::Default, Attrs::BOLD);
        let over = StyleAttributes::new(Color::Default, Color::Named(NamedColor::Blue), Attrs::ITALIC);
        let merged = base.merge(over);
        assert_eq!(merged.fg, Color::Named(NamedColor::Red));
        assert_eq!(merged.bg, Color::Named(NamedColor::Blue));
        assert_eq!(merged.attrs, Attrs::BOLD | Attrs::ITALIC);
    }

    #[test]
    fn named_indexing_matches_sgr_base_offsets() {
        assert_eq!(sgr_fg_params(Color::Named(NamedColor::Black)), vec![30]);
        assert_eq!(sgr_fg_params(Color::Named(NamedColor::BrightWhite)), vec![97]);
        assert_eq!(sgr_bg_params(Color::Named(NamedColor::Black)), vec![40]);
        assert_eq!(sgr_bg_params(Color::Named(NamedColor::BrightWhite)), vec![107]);
        assert_eq!(sgr_fg_params(Color::Indexed(200)), vec![38, 5, 200]);
        assert_eq!(sgr_fg_params(Color::Rgb(1, 2, 3)), vec![38, 2, 1, 2, 3]);
    }
}
