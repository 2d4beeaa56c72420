//! Checkbox payload

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

use crate::ui::color::{Color, ModeColor};

/// Inset of the check mark from the outline, in pixels.
const MARK_INSET: u32 = 2;

/// Checkbox payload
#[derive(Debug, Clone, Copy, Default)]
pub struct Checkbox {
    checked: bool,
}

impl Checkbox {
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub(crate) fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    /// Square glyph in the top-left of `area`: an outline, with a filled inner
    /// square when checked.
    pub(crate) fn draw<C, D>(&self, target: &mut D, area: Rectangle) -> Result<(), D::Error>
    where
        C: ModeColor,
        D: DrawTarget<Color = C>,
    {
        let side = area.size.width.min(area.size.height);
        if side == 0 {
            return Ok(());
        }
        let ink = C::reduce(Color::WHITE);
        let glyph = Rectangle::new(area.top_left, Size::new_equal(side));

        glyph
            .into_styled(PrimitiveStyle::with_stroke(ink, 1))
            .draw(target)?;

        if self.checked && side > 2 * MARK_INSET {
            glyph
                .offset(-(MARK_INSET as i32))
                .into_styled(PrimitiveStyle::with_fill(ink))
                .draw(target)?;
        }
        Ok(())
    }
}
