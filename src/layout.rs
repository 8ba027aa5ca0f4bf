//! Layer geometry and fonts for each [`FontVariant`].

use crate::FontVariant;
use embedded_graphics::{
    mono_font::{
        iso_8859_1::{FONT_10X20, FONT_6X10, FONT_6X12, FONT_8X13_BOLD, FONT_9X15, FONT_9X18_BOLD},
        MonoFont,
    },
    prelude::{Point, Size},
    primitives::Rectangle,
};

/// Axis-aligned layer frame in display coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Horizontal centre, used as the anchor for centred text
    pub fn center_x(&self) -> i32 {
        self.x + (self.w / 2) as i32
    }

    #[cfg(test)]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.w as i32 && y < self.y + self.h as i32
    }
}

impl From<Rect> for Rectangle {
    fn from(r: Rect) -> Self {
        Rectangle::new(Point::new(r.x, r.y), Size::new(r.w, r.h))
    }
}

/// Frames of the four layers on the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub time: Rect,
    pub battery: Rect,
    pub date: Rect,
    pub weather: Rect,
}

impl Layout {
    /// Layer frames for a window `width` pixels wide.
    pub fn for_variant(variant: FontVariant, width: u32) -> Self {
        match variant {
            FontVariant::Solaria => Layout {
                time: Rect::new(0, 25, width, 45),
                battery: Rect::new(10, 69, 124, 2),
                date: Rect::new(0, 69, width, 15),
                weather: Rect::new(0, 100, width, 25),
            },
            FontVariant::Pirulen => Layout {
                time: Rect::new(0, 31, width, 45),
                battery: Rect::new(10, 69, 124, 2),
                date: Rect::new(0, 70, width, 15),
                weather: Rect::new(0, 101, width, 25),
            },
        }
    }
}

/// Fonts for the three text layers.
///
/// ISO-8859-1 glyph sets, so the degree sign of "72°F" has a glyph.
#[derive(Clone, Copy)]
pub struct FontSet {
    pub time: &'static MonoFont<'static>,
    pub date: &'static MonoFont<'static>,
    pub weather: &'static MonoFont<'static>,
}

impl FontSet {
    pub fn for_variant(variant: FontVariant) -> Self {
        match variant {
            FontVariant::Solaria => FontSet {
                time: &FONT_10X20,
                date: &FONT_6X10,
                weather: &FONT_9X15,
            },
            FontVariant::Pirulen => FontSet {
                time: &FONT_9X18_BOLD,
                date: &FONT_6X12,
                weather: &FONT_8X13_BOLD,
            },
        }
    }
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet")
            .field("time", &self.time.character_size)
            .field("date", &self.date.character_size)
            .field("weather", &self.weather.character_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layers_span_window_width() {
        for variant in [FontVariant::Solaria, FontVariant::Pirulen] {
            let layout = Layout::for_variant(variant, 144);
            assert_eq!(layout.time.w, 144);
            assert_eq!(layout.date.w, 144);
            assert_eq!(layout.weather.w, 144);
            assert_eq!(layout.battery, Rect::new(10, 69, 124, 2));
        }
    }

    #[test]
    fn test_variants_shift_text_layers() {
        let solaria = Layout::for_variant(FontVariant::Solaria, 144);
        let pirulen = Layout::for_variant(FontVariant::Pirulen, 144);
        assert_eq!(solaria.time.y, 25);
        assert_eq!(pirulen.time.y, 31);
        assert_eq!(pirulen.date.y, solaria.date.y + 1);
        assert_eq!(pirulen.weather.y, solaria.weather.y + 1);
    }

    #[test]
    fn test_rect_helpers() {
        let r = Rect::new(10, 69, 124, 2);
        assert_eq!(r.center_x(), 72);
        assert!(r.contains(10, 69));
        assert!(r.contains(133, 70));
        assert!(!r.contains(134, 70));
        assert!(!r.contains(10, 71));

        let rect: Rectangle = r.into();
        assert_eq!(rect.top_left, Point::new(10, 69));
        assert_eq!(rect.size, Size::new(124, 2));
    }

    #[test]
    fn test_fonts_fit_their_layers() {
        for variant in [FontVariant::Solaria, FontVariant::Pirulen] {
            let layout = Layout::for_variant(variant, 144);
            let fonts = FontSet::for_variant(variant);
            assert!(fonts.time.character_size.height <= layout.time.h);
            assert!(fonts.date.character_size.height <= layout.date.h);
            assert!(fonts.weather.character_size.height <= layout.weather.h);
        }
    }
}
