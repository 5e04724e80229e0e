//! 8-bit RGBA colors with the hue/saturation/brightness model used for the
//! icosphere detail ramp.

/// Non-premultiplied 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Rgba8 {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Rgba8 {
    pub const WHITE: Rgba8 = Rgba8::rgb(255, 255, 255);
    pub const BLACK: Rgba8 = Rgba8::rgb(0, 0, 0);
    pub const RED: Rgba8 = Rgba8::rgb(255, 0, 0);
    pub const GREEN: Rgba8 = Rgba8::rgb(0, 255, 0);
    pub const BLUE: Rgba8 = Rgba8::rgb(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Builds an opaque color from hue, saturation and brightness.
    ///
    /// Hue wraps around, so only its fractional part matters. Saturation and
    /// brightness are expected in `[0, 1]`.
    pub fn from_hsb(hue: f32, saturation: f32, brightness: f32) -> Self {
        let channel = |v: f32| (v * 255.0 + 0.5).clamp(0.0, 255.0) as u8;

        if saturation == 0.0 {
            let v = channel(brightness);
            return Self::rgb(v, v, v);
        }

        let h = (hue - hue.floor()) * 6.0;
        let f = h - h.floor();
        let p = brightness * (1.0 - saturation);
        let q = brightness * (1.0 - saturation * f);
        let t = brightness * (1.0 - saturation * (1.0 - f));
        let (r, g, b) = match h as u32 {
            0 => (brightness, t, p),
            1 => (q, brightness, p),
            2 => (p, brightness, t),
            3 => (p, q, brightness),
            4 => (t, p, brightness),
            _ => (brightness, p, q),
        };
        Self::rgb(channel(r), channel(g), channel(b))
    }

    /// Returns `[hue, saturation, brightness]`, each in `[0, 1]`.
    pub fn to_hsb(self) -> [f32; 3] {
        let (r, g, b) = (self.r as f32, self.g as f32, self.b as f32);
        let cmax = r.max(g).max(b);
        let cmin = r.min(g).min(b);

        let brightness = cmax / 255.0;
        let saturation = if cmax != 0.0 { (cmax - cmin) / cmax } else { 0.0 };
        if saturation == 0.0 {
            return [0.0, saturation, brightness];
        }

        let span = cmax - cmin;
        let red_c = (cmax - r) / span;
        let green_c = (cmax - g) / span;
        let blue_c = (cmax - b) / span;
        let mut hue = if r == cmax {
            blue_c - green_c
        } else if g == cmax {
            2.0 + red_c - blue_c
        } else {
            4.0 + green_c - red_c
        } / 6.0;
        if hue < 0.0 {
            hue += 1.0;
        }
        [hue, saturation, brightness]
    }

    /// Same color with alpha set from a `[0, 1]` opacity.
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    /// Scales saturation and brightness, clamping each to 1. Alpha is kept.
    pub fn adjust_sat_br(self, saturation: f32, brightness: f32) -> Self {
        let [h, s, b] = self.to_hsb();
        let adjusted = Self::from_hsb(h, (s * saturation).min(1.0), (b * brightness).min(1.0));
        Self { a: self.a, ..adjusted }
    }

    /// Components normalized to `[0, 1]`, as used by material color factors.
    pub fn to_unit_rgba(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a].map(|c| c as f32 / 255.0)
    }
}
