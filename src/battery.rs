//! Battery meter layer.
//!
//! A two-pixel bar under the clock: black track, white fill from the left,
//! proportional to the charge percentage.

use crate::layout::Rect;
use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
};
use serde::{Deserialize, Serialize};

/// Charge state as reported by the battery service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryState {
    /// 0-100
    pub charge_percent: u8,
    pub is_charging: bool,
}

/// Width in pixels of the filled part of a `width`-pixel bar at `level` percent.
///
/// Levels above 100 are clamped.
pub fn bar_width(level: u8, width: u32) -> u32 {
    let level = level.min(100) as u32;
    level * width / 100
}

/// State behind the battery layer's draw procedure.
#[derive(Debug, Default)]
pub struct BatteryMeter {
    level: u8,
    dirty: bool,
}

impl BatteryMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the new charge level and mark the layer for redraw.
    pub fn update(&mut self, state: BatteryState) {
        self.level = state.charge_percent.min(100);
        self.dirty = true;
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Draw procedure: track then bar, inside `bounds`.
    pub fn draw<D>(&mut self, target: &mut D, bounds: Rect) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let track: Rectangle = bounds.into();
        track
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::Off))
            .draw(target)?;

        let width = bar_width(self.level, bounds.w);
        if width > 0 {
            Rectangle::new(track.top_left, Size::new(width, bounds.h))
                .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
                .draw(target)?;
        }

        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::Framebuffer;

    #[test]
    fn test_bar_width_scales_to_layer() {
        assert_eq!(bar_width(0, 124), 0);
        assert_eq!(bar_width(50, 124), 62);
        assert_eq!(bar_width(100, 124), 124);
        assert_eq!(bar_width(1, 124), 1);
    }

    #[test]
    fn test_bar_width_clamps_overfull_level() {
        assert_eq!(bar_width(250, 124), 124);
    }

    #[test]
    fn test_update_marks_dirty_and_draw_clears() {
        let mut meter = BatteryMeter::new();
        assert!(!meter.is_dirty());

        meter.update(BatteryState {
            charge_percent: 40,
            is_charging: false,
        });
        assert!(meter.is_dirty());
        assert_eq!(meter.level(), 40);

        let mut fb = Framebuffer::new(144, 168);
        meter.draw(&mut fb, Rect::new(10, 69, 124, 2)).unwrap();
        assert!(!meter.is_dirty());
    }

    #[test]
    fn test_draw_fills_from_left() {
        let mut meter = BatteryMeter::new();
        meter.update(BatteryState {
            charge_percent: 50,
            is_charging: true,
        });

        let mut fb = Framebuffer::new(144, 168);
        fb.clear(BinaryColor::On).unwrap();
        meter.draw(&mut fb, Rect::new(10, 69, 124, 2)).unwrap();

        // 62 lit columns, two rows tall
        assert!(fb.pixel(10, 69));
        assert!(fb.pixel(71, 70));
        assert!(!fb.pixel(72, 69));
        assert!(!fb.pixel(133, 70));
        // Outside the layer is untouched
        assert!(fb.pixel(9, 69));
        assert!(fb.pixel(134, 69));
        assert!(fb.pixel(10, 71));
    }

    #[test]
    fn test_empty_battery_draws_only_track() {
        let mut meter = BatteryMeter::new();
        meter.update(BatteryState::default());

        let mut fb = Framebuffer::new(144, 168);
        meter.draw(&mut fb, Rect::new(10, 69, 124, 2)).unwrap();
        assert_eq!(fb.lit_pixels(), 0);
    }
}
