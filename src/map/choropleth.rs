use crate::data::JoinedSlice;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn hex(v: u32) -> Self {
        Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }

    /// Linear blend towards `other` by `t` in [0, 1]
    pub fn mix(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(lerp(self.0, other.0), lerp(self.1, other.1), lerp(self.2, other.2))
    }
}

/// Piecewise-linear colour ramp over [0, 1]
#[derive(Debug)]
pub struct ColorScale {
    pub stops: &'static [(f64, Rgb)],
}

/// Single-year production ramp
pub static ANNUAL: ColorScale = ColorScale {
    stops: &[
        (0.0, Rgb::hex(0xF2E1A3)),
        (0.033, Rgb::hex(0xF2D07A)),
        (0.067, Rgb::hex(0xF1BD56)),
        (0.1, Rgb::hex(0xF0A637)),
        (0.134, Rgb::hex(0xF07F1D)),
        (0.34, Rgb::hex(0xE86D14)),
        (0.48, Rgb::hex(0xE35710)),
        (0.68, Rgb::hex(0xD83D0D)),
        (1.0, Rgb::hex(0xD12608)),
    ],
};

/// Lifetime production ramp
pub static CUMULATIVE: ColorScale = ColorScale {
    stops: &[
        (0.0, Rgb::hex(0xD9D689)),
        (0.033, Rgb::hex(0xD9B459)),
        (0.067, Rgb::hex(0xD99854)),
        (0.1, Rgb::hex(0xD47E4F)),
        (0.134, Rgb::hex(0xCB6445)),
        (0.34, Rgb::hex(0xBB4A46)),
        (0.48, Rgb::hex(0xA93647)),
        (0.68, Rgb::hex(0x8B2F48)),
        (1.0, Rgb::hex(0x622F4E)),
    ],
};

/// ColorBrewer OrRd with its near-white first tenth cut off, for the animation
pub static ORANGE_RED: ColorScale = ColorScale {
    stops: &[
        (0.0, Rgb::hex(0xFEEBCF)),
        (0.0278, Rgb::hex(0xFEE8C8)),
        (0.1667, Rgb::hex(0xFDD49E)),
        (0.3056, Rgb::hex(0xFDBB84)),
        (0.4444, Rgb::hex(0xFC8D59)),
        (0.5833, Rgb::hex(0xEF6548)),
        (0.7222, Rgb::hex(0xD7301F)),
        (0.8611, Rgb::hex(0xB30000)),
        (1.0, Rgb::hex(0x7F0000)),
    ],
};

impl ColorScale {
    /// Colour at position `t`, clamped to [0, 1]
    pub fn sample(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mut lower = self.stops[0];
        for &(pos, color) in self.stops {
            if t <= pos {
                let span = pos - lower.0;
                if span <= 0.0 {
                    return color;
                }
                return lower.1.mix(color, (t - lower.0) / span);
            }
            lower = (pos, color);
        }
        lower.1
    }
}

/// Value range mapped onto a colour scale
#[derive(Clone, Copy, Debug)]
pub struct ColorRange {
    pub min: f64,
    pub max: f64,
    pub scale: &'static ColorScale,
}

impl ColorRange {
    pub fn new(min: f64, max: f64, scale: &'static ColorScale) -> Self {
        Self { min, max, scale }
    }

    pub fn color(&self, value: f64) -> Rgb {
        let span = self.max - self.min;
        let t = if span > 0.0 { (value - self.min) / span } else { 0.0 };
        self.scale.sample(t)
    }
}

/// Fill colour per country for one map
#[derive(Clone, Debug)]
pub struct Choropleth {
    /// Indexed like the country list; `None` renders uncoloured
    pub fills: Vec<Option<Rgb>>,
    pub range: ColorRange,
}

impl Choropleth {
    /// Colour the joined values; `range` defaults to the joined data's min/max
    pub fn from_joined(joined: &JoinedSlice<'_>, scale: &'static ColorScale, range: Option<(f64, f64)>) -> Self {
        let (min, max) = range
            .or_else(|| joined.value_range())
            .unwrap_or((0.0, 0.0));
        Self::from_values(joined.rows.iter().map(|r| r.map(|r| r.value)), ColorRange::new(min, max, scale))
    }

    pub fn from_values(values: impl Iterator<Item = Option<f64>>, range: ColorRange) -> Self {
        Self {
            fills: values.map(|v| v.map(|v| range.color(v))).collect(),
            range,
        }
    }

    pub fn fill(&self, country: usize) -> Option<Rgb> {
        self.fills.get(country).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_endpoints_and_clamp() {
        assert_eq!(ANNUAL.sample(0.0), Rgb::hex(0xF2E1A3));
        assert_eq!(ANNUAL.sample(1.0), Rgb::hex(0xD12608));
        assert_eq!(ANNUAL.sample(-3.0), Rgb::hex(0xF2E1A3));
        assert_eq!(CUMULATIVE.sample(7.0), Rgb::hex(0x622F4E));
        assert_eq!(ANNUAL.sample(f64::NAN), Rgb::hex(0xF2E1A3));
    }

    #[test]
    fn test_scale_interpolates_between_stops() {
        let mid = ANNUAL.sample(0.84);
        let t = (0.84 - 0.68) / (1.0 - 0.68);
        assert_eq!(mid, Rgb::hex(0xD83D0D).mix(Rgb::hex(0xD12608), t));
        assert_ne!(mid, Rgb::hex(0xD83D0D));
        assert_eq!(ANNUAL.sample(0.34), Rgb::hex(0xE86D14));
    }

    #[test]
    fn test_orange_red_starts_a_tenth_into_orrd() {
        // OrRd's 9 colours sit 1/8 apart, so 0.1 is 0.8 of the way from the first to the second
        let start = Rgb::hex(0xFFF7EC).mix(Rgb::hex(0xFEE8C8), 0.8);
        assert_eq!(start, Rgb::hex(0xFEEBCF));
        assert_eq!(ORANGE_RED.sample(0.0), start);
        assert_eq!(ORANGE_RED.sample(1.0), Rgb::hex(0x7F0000));
    }

    #[test]
    fn test_range_maps_values() {
        let range = ColorRange::new(0.0, 10.0, &CUMULATIVE);
        assert_eq!(range.color(0.0), Rgb::hex(0xD9D689));
        assert_eq!(range.color(10.0), Rgb::hex(0x622F4E));
        // Degenerate range collapses to the low end
        assert_eq!(ColorRange::new(5.0, 5.0, &ANNUAL).color(5.0), Rgb::hex(0xF2E1A3));
    }

    #[test]
    fn test_choropleth_keeps_missing_uncoloured() {
        let range = ColorRange::new(0.0, 2.0, &ANNUAL);
        let map = Choropleth::from_values([Some(0.0), None, Some(2.0)].into_iter(), range);
        assert_eq!(map.fill(0), Some(Rgb::hex(0xF2E1A3)));
        assert_eq!(map.fill(1), None);
        assert_eq!(map.fill(2), Some(Rgb::hex(0xD12608)));
        assert_eq!(map.fill(9), None);
    }
}
