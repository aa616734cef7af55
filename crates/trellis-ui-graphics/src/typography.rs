//! Typography keys used for text measurement caching

/// Font style (normal, italic, oblique)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

/// Font weight (100-900)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const THIN: FontWeight = FontWeight(100);
    pub const LIGHT: FontWeight = FontWeight(300);
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const MEDIUM: FontWeight = FontWeight(500);
    pub const BOLD: FontWeight = FontWeight(700);
    pub const BLACK: FontWeight = FontWeight(900);
}

impl Default for FontWeight {
    fn default() -> Self {
        FontWeight::NORMAL
    }
}

/// Text style flags that influence measured size.
///
/// Only discrete fields live here so the style can key a hash map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextStyle {
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub monospace: bool,
    /// Tab width in spaces, 0 means the default.
    pub tab_width: u8,
}

impl TextStyle {
    pub fn bold() -> Self {
        Self {
            font_weight: FontWeight::BOLD,
            ..Self::default()
        }
    }

    pub fn monospace() -> Self {
        Self {
            monospace: true,
            ..Self::default()
        }
    }
}
