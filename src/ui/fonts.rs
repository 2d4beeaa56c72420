//! Font lookup by name
//!
//! Labels and buttons refer to fonts by name. The renderer resolves the name
//! through a [`FontResolver`]; names it cannot resolve fall back to
//! [`DEFAULT_FONT`] so text is always drawn.

use embedded_graphics::mono_font::{MonoFont, ascii};

/// Font used when a name is empty or unknown.
pub const DEFAULT_FONT: &MonoFont<'static> = &ascii::FONT_6X10;

/// Resolves a font name to glyph data.
pub trait FontResolver {
    fn resolve(&self, name: &str) -> Option<&'static MonoFont<'static>>;
}

/// The ASCII mono fonts shipped with embedded-graphics, named by cell size
/// (`"5x8"`, `"6x10"`, `"10x20"`, ...). Matching ignores ASCII case, so
/// `"6X10"` works too.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFonts;

const BUILTIN: &[(&str, &MonoFont<'static>)] = &[
    ("4x6", &ascii::FONT_4X6),
    ("5x7", &ascii::FONT_5X7),
    ("5x8", &ascii::FONT_5X8),
    ("6x9", &ascii::FONT_6X9),
    ("6x10", &ascii::FONT_6X10),
    ("6x12", &ascii::FONT_6X12),
    ("6x13", &ascii::FONT_6X13),
    ("7x13", &ascii::FONT_7X13),
    ("7x14", &ascii::FONT_7X14),
    ("8x13", &ascii::FONT_8X13),
    ("9x15", &ascii::FONT_9X15),
    ("9x18", &ascii::FONT_9X18),
    ("10x20", &ascii::FONT_10X20),
];

impl FontResolver for BuiltinFonts {
    fn resolve(&self, name: &str) -> Option<&'static MonoFont<'static>> {
        BUILTIN
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|&(_, font)| font)
    }
}

/// Resolve `name`, falling back to [`DEFAULT_FONT`].
pub fn resolve_or_default(fonts: &dyn FontResolver, name: &str) -> &'static MonoFont<'static> {
    fonts.resolve(name).unwrap_or(DEFAULT_FONT)
}
