use foundation::math::Vec3;

/// Screen-space metrics of a city label pill.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub font_size_px: f64,
    /// Extra tracking per glyph, in ems.
    pub letter_spacing_em: f64,
    pub badge_font_size_px: f64,
    pub padding_px: [f64; 2],
    /// Status dot plus the gap after it.
    pub dot_px: f64,
    pub badge_gap_px: f64,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_size_px: 10.0,
            letter_spacing_em: 0.28,
            badge_font_size_px: 8.0,
            padding_px: [10.0, 6.0],
            dot_px: 12.0,
            badge_gap_px: 4.0,
        }
    }
}

pub const BADGE_ACTIVE: &str = "ACTIVE";
pub const BADGE_SPONSORED: &str = "SPONSORED";

/// Projects a world position to screen pixels; `None` when not on screen.
pub trait LabelProjector {
    fn project(&self, world: Vec3) -> Option<[f64; 2]>;
}

fn estimate_text_width(text: &str, font_size_px: f64, letter_spacing_em: f64) -> f64 {
    let count = text.chars().count().max(1) as f64;
    count * font_size_px * (0.6 + letter_spacing_em)
}

/// Unscaled pill size: name row plus an optional badge row.
pub fn estimate_label_size(text: &str, badges: &[&str], style: &LabelStyle) -> [f64; 2] {
    let name_w = style.dot_px + estimate_text_width(text, style.font_size_px, style.letter_spacing_em);
    let mut width = name_w;
    let mut height = style.font_size_px;
    if !badges.is_empty() {
        let badge_w: f64 = badges
            .iter()
            .map(|b| estimate_text_width(b, style.badge_font_size_px, 0.24) + 2.0 * style.badge_gap_px)
            .sum();
        width = width.max(badge_w);
        height += style.badge_gap_px + style.badge_font_size_px + style.badge_gap_px;
    }
    [
        width + 2.0 * style.padding_px[0],
        height + 2.0 * style.padding_px[1],
    ]
}

/// Axis-aligned hit region centred on the label anchor.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LabelRect {
    pub center: [f64; 2],
    pub half_size: [f64; 2],
}

impl LabelRect {
    pub fn centered(center: [f64; 2], size: [f64; 2], scale: f64) -> Self {
        Self {
            center,
            half_size: [size[0] * 0.5 * scale, size[1] * 0.5 * scale],
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (x - self.center[0]).abs() <= self.half_size[0]
            && (y - self.center[1]).abs() <= self.half_size[1]
    }
}
