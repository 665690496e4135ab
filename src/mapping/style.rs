//! Cell presentation: colors, alignments, borders and the composable [`CellStyle`].

use rust_xlsxwriter::Color;
use rust_xlsxwriter::Format;
use rust_xlsxwriter::FormatAlign;
use rust_xlsxwriter::FormatBorder;
use rust_xlsxwriter::FormatPattern;

/// The legacy indexed Excel palette.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IndexedColor {
    Black,
    White,
    Red,
    BrightGreen,
    Blue,
    Yellow,
    Pink,
    Turquoise,
    DarkRed,
    Green,
    DarkBlue,
    DarkYellow,
    Violet,
    Teal,
    Grey25Percent,
    Grey50Percent,
    CornflowerBlue,
    Coral,
    RoyalBlue,
    SkyBlue,
    LightGreen,
    LightYellow,
    PaleBlue,
    Rose,
    Lavender,
    Tan,
    LightBlue,
    Aqua,
    Lime,
    Gold,
    LightOrange,
    Orange,
    Grey40Percent,
    SeaGreen,
    Brown,
    Indigo,
    Grey80Percent,
}

impl IndexedColor {
    /// Position of the color in the indexed palette
    pub fn index(&self) -> u8 {
        match self {
            Self::Black => 8,
            Self::White => 9,
            Self::Red => 10,
            Self::BrightGreen => 11,
            Self::Blue => 12,
            Self::Yellow => 13,
            Self::Pink => 14,
            Self::Turquoise => 15,
            Self::DarkRed => 16,
            Self::Green => 17,
            Self::DarkBlue => 18,
            Self::DarkYellow => 19,
            Self::Violet => 20,
            Self::Teal => 21,
            Self::Grey25Percent => 22,
            Self::Grey50Percent => 23,
            Self::CornflowerBlue => 24,
            Self::Coral => 29,
            Self::RoyalBlue => 30,
            Self::SkyBlue => 40,
            Self::LightGreen => 42,
            Self::LightYellow => 43,
            Self::PaleBlue => 44,
            Self::Rose => 45,
            Self::Lavender => 46,
            Self::Tan => 47,
            Self::LightBlue => 48,
            Self::Aqua => 49,
            Self::Lime => 50,
            Self::Gold => 51,
            Self::LightOrange => 52,
            Self::Orange => 53,
            Self::Grey40Percent => 55,
            Self::SeaGreen => 57,
            Self::Brown => 60,
            Self::Indigo => 62,
            Self::Grey80Percent => 63,
        }
    }

    /// Default RGB value of the palette entry
    pub fn rgb(&self) -> u32 {
        match self {
            Self::Black => 0x000000,
            Self::White => 0xFFFFFF,
            Self::Red => 0xFF0000,
            Self::BrightGreen => 0x00FF00,
            Self::Blue => 0x0000FF,
            Self::Yellow => 0xFFFF00,
            Self::Pink => 0xFF00FF,
            Self::Turquoise => 0x00FFFF,
            Self::DarkRed => 0x800000,
            Self::Green => 0x008000,
            Self::DarkBlue => 0x000080,
            Self::DarkYellow => 0x808000,
            Self::Violet => 0x800080,
            Self::Teal => 0x008080,
            Self::Grey25Percent => 0xC0C0C0,
            Self::Grey50Percent => 0x808080,
            Self::CornflowerBlue => 0x9999FF,
            Self::Coral => 0xFF8080,
            Self::RoyalBlue => 0x0066CC,
            Self::SkyBlue => 0x00CCFF,
            Self::LightGreen => 0xCCFFCC,
            Self::LightYellow => 0xFFFF99,
            Self::PaleBlue => 0x99CCFF,
            Self::Rose => 0xFF99CC,
            Self::Lavender => 0xCC99FF,
            Self::Tan => 0xFFCC99,
            Self::LightBlue => 0x3366FF,
            Self::Aqua => 0x33CCCC,
            Self::Lime => 0x99CC00,
            Self::Gold => 0xFFCC00,
            Self::LightOrange => 0xFF9900,
            Self::Orange => 0xFF6600,
            Self::Grey40Percent => 0x969696,
            Self::SeaGreen => 0x339966,
            Self::Brown => 0x993300,
            Self::Indigo => 0x333399,
            Self::Grey80Percent => 0x333333,
        }
    }
}

impl From<IndexedColor> for Color {
    fn from(color: IndexedColor) -> Self {
        Color::RGB(color.rgb())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlign {
    General,
    Left,
    #[default]
    Center,
    Right,
    Fill,
    Justify,
    CenterSelection,
    Distributed,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum VerticalAlign {
    Top,
    #[default]
    Center,
    Bottom,
    Justify,
    Distributed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BorderStyle {
    None,
    Thin,
    Medium,
    Dashed,
    Dotted,
    Thick,
    Double,
    Hair,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FillPattern {
    NoFill,
    Solid,
}

/// Border style per side of a cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BorderSides {
    pub top: Option<BorderStyle>,
    pub bottom: Option<BorderStyle>,
    pub left: Option<BorderStyle>,
    pub right: Option<BorderStyle>,
}

impl BorderSides {
    pub fn all(style: BorderStyle) -> Self {
        BorderSides {
            top: Some(style),
            bottom: Some(style),
            left: Some(style),
            right: Some(style),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.bottom.is_none() && self.left.is_none() && self.right.is_none()
    }

    pub(crate) fn merge(&self, other: &BorderSides) -> BorderSides {
        BorderSides {
            top: other.top.or(self.top),
            bottom: other.bottom.or(self.bottom),
            left: other.left.or(self.left),
            right: other.right.or(self.right),
        }
    }
}

/// Presentation of one cell. Unset properties fall back to the cell default.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellStyle {
    pub horizontal: Option<HorizontalAlign>,
    pub vertical: Option<VerticalAlign>,
    pub fill_pattern: Option<FillPattern>,
    pub fill_color: Option<IndexedColor>,
    pub font_color: Option<IndexedColor>,
    pub wrap_text: Option<bool>,
    pub borders: BorderSides,
    pub border_color: Option<IndexedColor>,
}

impl CellStyle {
    /// Thin black borders on every side.
    pub fn bordered() -> Self {
        CellStyle {
            borders: BorderSides::all(BorderStyle::Thin),
            border_color: Some(IndexedColor::Black),
            ..CellStyle::default()
        }
    }

    /// Return a new style by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: CellStyle) -> CellStyle {
        self.merge(&patch)
    }

    /// Merge two styles with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &CellStyle) -> CellStyle {
        CellStyle {
            horizontal: other.horizontal.or(self.horizontal),
            vertical: other.vertical.or(self.vertical),
            fill_pattern: other.fill_pattern.or(self.fill_pattern),
            fill_color: other.fill_color.or(self.fill_color),
            font_color: other.font_color.or(self.font_color),
            wrap_text: other.wrap_text.or(self.wrap_text),
            borders: self.borders.merge(&other.borders),
            border_color: other.border_color.or(self.border_color),
        }
    }

    /// Converts the style into a writer format.
    pub fn to_format(&self) -> Format {
        let mut format = Format::new();

        if let Some(align) = self.horizontal {
            format = format.set_align(derive_horizontal_align(align));
        }
        if let Some(align) = self.vertical {
            format = format.set_align(derive_vertical_align(align));
        }

        if let Some(FillPattern::Solid) = self.fill_pattern {
            format = format.set_pattern(FormatPattern::Solid);
        }
        if let Some(color) = self.fill_color {
            format = format.set_background_color(color);
        }
        if let Some(color) = self.font_color {
            format = format.set_font_color(color);
        }
        if self.wrap_text.unwrap_or(false) {
            format = format.set_text_wrap();
        }

        if let Some(style) = self.borders.top {
            format = format.set_border_top(derive_format_border(style));
        }
        if let Some(style) = self.borders.bottom {
            format = format.set_border_bottom(derive_format_border(style));
        }
        if let Some(style) = self.borders.left {
            format = format.set_border_left(derive_format_border(style));
        }
        if let Some(style) = self.borders.right {
            format = format.set_border_right(derive_format_border(style));
        }
        if let Some(color) = self.border_color {
            format = format.set_border_color(color);
        }

        format
    }
}

fn derive_format_border(style: BorderStyle) -> FormatBorder {
    match style {
        BorderStyle::None => FormatBorder::None,
        BorderStyle::Thin => FormatBorder::Thin,
        BorderStyle::Medium => FormatBorder::Medium,
        BorderStyle::Dashed => FormatBorder::Dashed,
        BorderStyle::Dotted => FormatBorder::Dotted,
        BorderStyle::Thick => FormatBorder::Thick,
        BorderStyle::Double => FormatBorder::Double,
        BorderStyle::Hair => FormatBorder::Hair,
    }
}

fn derive_horizontal_align(align: HorizontalAlign) -> FormatAlign {
    match align {
        HorizontalAlign::General => FormatAlign::General,
        HorizontalAlign::Left => FormatAlign::Left,
        HorizontalAlign::Center => FormatAlign::Center,
        HorizontalAlign::Right => FormatAlign::Right,
        HorizontalAlign::Fill => FormatAlign::Fill,
        HorizontalAlign::Justify => FormatAlign::Justify,
        HorizontalAlign::CenterSelection => FormatAlign::CenterAcross,
        HorizontalAlign::Distributed => FormatAlign::Distributed,
    }
}

fn derive_vertical_align(align: VerticalAlign) -> FormatAlign {
    match align {
        VerticalAlign::Top => FormatAlign::Top,
        VerticalAlign::Center => FormatAlign::VerticalCenter,
        VerticalAlign::Bottom => FormatAlign::Bottom,
        VerticalAlign::Justify => FormatAlign::VerticalJustify,
        VerticalAlign::Distributed => FormatAlign::VerticalDistributed,
    }
}
