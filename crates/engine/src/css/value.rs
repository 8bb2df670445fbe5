//! CSS value parsing: colors and lengths.
//!
//! Hand-parsed from declaration value strings; the grader needs "is this a
//! non-default color" and "how many pixels is this", not a spec-complete
//! value model.

/// A parsed color value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorValue {
    Rgb(u8, u8, u8),
    Rgba(u8, u8, u8, f32),
    Named(String),
}

impl ColorValue {
    /// Parse a CSS color value. Returns `None` for anything unrecognized
    /// (gradients, `var()`, malformed input).
    pub fn parse(value: &str) -> Option<ColorValue> {
        let value = value.trim().to_ascii_lowercase();

        if let Some(hex) = value.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        if value.starts_with("rgb(") || value.starts_with("rgba(") {
            return Self::parse_rgb_function(&value);
        }

        match value.as_str() {
            "black" => Some(ColorValue::Rgb(0, 0, 0)),
            "white" => Some(ColorValue::Rgb(255, 255, 255)),
            "red" => Some(ColorValue::Rgb(255, 0, 0)),
            "green" => Some(ColorValue::Rgb(0, 128, 0)),
            "blue" => Some(ColorValue::Rgb(0, 0, 255)),
            "yellow" => Some(ColorValue::Rgb(255, 255, 0)),
            "orange" => Some(ColorValue::Rgb(255, 165, 0)),
            "purple" => Some(ColorValue::Rgb(128, 0, 128)),
            "cyan" => Some(ColorValue::Rgb(0, 255, 255)),
            "magenta" => Some(ColorValue::Rgb(255, 0, 255)),
            "gray" | "grey" => Some(ColorValue::Rgb(128, 128, 128)),
            "transparent" => Some(ColorValue::Rgba(0, 0, 0, 0.0)),
            name @ ("teal" | "navy" | "maroon" | "olive" | "lime" | "aqua" | "silver"
            | "fuchsia" | "pink" | "brown" | "gold" | "beige" | "coral" | "indigo" | "violet"
            | "khaki" | "salmon" | "tan" | "turquoise" | "lavender" | "crimson" | "tomato") => {
                Some(ColorValue::Named(name.to_string()))
            }
            // Keywords and unknown names are not colors we can reason about
            _ => None,
        }
    }

    fn parse_hex(hex: &str) -> Option<ColorValue> {
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(ColorValue::Rgb(r, g, b))
            }
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
                Some(ColorValue::Rgb(r, g, b))
            }
            _ => None,
        }
    }

    fn parse_rgb_function(value: &str) -> Option<ColorValue> {
        let open = value.find('(')?;
        let close = value.rfind(')')?;
        let args: Vec<&str> = value[open + 1..close]
            .split([',', '/', ' '])
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        if args.len() < 3 {
            return None;
        }
        let channel = |raw: &str| -> Option<u8> {
            if let Some(pct) = raw.strip_suffix('%') {
                let pct: f32 = pct.parse().ok()?;
                Some((pct / 100.0 * 255.0).round().clamp(0.0, 255.0) as u8)
            } else {
                let num: f32 = raw.parse().ok()?;
                Some(num.round().clamp(0.0, 255.0) as u8)
            }
        };
        let r = channel(args[0])?;
        let g = channel(args[1])?;
        let b = channel(args[2])?;
        if let Some(alpha_raw) = args.get(3) {
            let alpha: f32 = if let Some(pct) = alpha_raw.strip_suffix('%') {
                pct.parse::<f32>().ok()? / 100.0
            } else {
                alpha_raw.parse().ok()?
            };
            Some(ColorValue::Rgba(r, g, b, alpha.clamp(0.0, 1.0)))
        } else {
            Some(ColorValue::Rgb(r, g, b))
        }
    }

    /// The default text color.
    pub fn is_black(&self) -> bool {
        match self {
            ColorValue::Rgb(0, 0, 0) => true,
            ColorValue::Rgba(0, 0, 0, alpha) => *alpha >= 1.0,
            ColorValue::Named(name) => name == "black",
            _ => false,
        }
    }

    /// The default background color.
    pub fn is_transparent(&self) -> bool {
        match self {
            ColorValue::Rgba(_, _, _, alpha) => *alpha == 0.0,
            ColorValue::Named(name) => name == "transparent",
            _ => false,
        }
    }
}

/// A parsed length value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LengthValue {
    Px(f32),
    Em(f32),
    Rem(f32),
    Percent(f32),
    Vw(f32),
    Vh(f32),
    Auto,
    Zero,
}

impl LengthValue {
    /// Parse a CSS length. Returns `None` for unrecognized units and
    /// function values (`calc()`, `min()`, ...).
    pub fn parse(value: &str) -> Option<LengthValue> {
        let value = value.trim().to_ascii_lowercase();

        if value == "auto" {
            return Some(LengthValue::Auto);
        }
        if value == "0" {
            return Some(LengthValue::Zero);
        }

        let unit_value = |suffix: &str| -> Option<f32> {
            value.strip_suffix(suffix)?.trim().parse::<f32>().ok()
        };

        if let Some(px) = unit_value("px") {
            return Some(LengthValue::Px(px));
        }
        if let Some(rem) = unit_value("rem") {
            return Some(LengthValue::Rem(rem));
        }
        if let Some(em) = unit_value("em") {
            return Some(LengthValue::Em(em));
        }
        if let Some(pct) = unit_value("%") {
            return Some(LengthValue::Percent(pct));
        }
        if let Some(vw) = unit_value("vw") {
            return Some(LengthValue::Vw(vw));
        }
        if let Some(vh) = unit_value("vh") {
            return Some(LengthValue::Vh(vh));
        }

        // Unitless nonzero numbers are treated as pixels, the way quirky
        // documents expect
        value.parse::<f32>().ok().map(|num| {
            if num == 0.0 {
                LengthValue::Zero
            } else {
                LengthValue::Px(num)
            }
        })
    }

    /// Resolve to pixels against a font size and viewport.
    pub fn to_px(&self, font_size: f32, viewport_width: f32, viewport_height: f32) -> f32 {
        match self {
            LengthValue::Px(px) => *px,
            LengthValue::Em(em) => em * font_size,
            LengthValue::Rem(rem) => rem * 16.0,
            LengthValue::Percent(_) => 0.0, // needs a containing block, handled by layout
            LengthValue::Vw(vw) => vw / 100.0 * viewport_width,
            LengthValue::Vh(vh) => vh / 100.0 * viewport_height,
            LengthValue::Auto | LengthValue::Zero => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hex_colors() {
        assert_eq!(ColorValue::parse("#ff0000"), Some(ColorValue::Rgb(255, 0, 0)));
        assert_eq!(ColorValue::parse("#f00"), Some(ColorValue::Rgb(255, 0, 0)));
        assert_eq!(ColorValue::parse("#12345"), None);
    }

    #[test]
    fn test_rgb_functions() {
        assert_eq!(
            ColorValue::parse("rgb(10, 20, 30)"),
            Some(ColorValue::Rgb(10, 20, 30))
        );
        assert_eq!(
            ColorValue::parse("rgba(0, 0, 0, 0.5)"),
            Some(ColorValue::Rgba(0, 0, 0, 0.5))
        );
        assert_eq!(
            ColorValue::parse("rgb(100%, 0%, 0%)"),
            Some(ColorValue::Rgb(255, 0, 0))
        );
    }

    #[test]
    fn test_default_detection() {
        assert!(ColorValue::parse("black").unwrap().is_black());
        assert!(ColorValue::parse("#000").unwrap().is_black());
        assert!(ColorValue::parse("rgb(0,0,0)").unwrap().is_black());
        assert!(ColorValue::parse("transparent").unwrap().is_transparent());
        assert!(ColorValue::parse("rgba(9, 9, 9, 0)").unwrap().is_transparent());
        assert!(!ColorValue::parse("#222").unwrap().is_black());
    }

    #[test]
    fn test_lengths() {
        assert_eq!(LengthValue::parse("2000px"), Some(LengthValue::Px(2000.0)));
        assert_eq!(LengthValue::parse("1.5em"), Some(LengthValue::Em(1.5)));
        assert_eq!(LengthValue::parse("2rem"), Some(LengthValue::Rem(2.0)));
        assert_eq!(LengthValue::parse("50%"), Some(LengthValue::Percent(50.0)));
        assert_eq!(LengthValue::parse("auto"), Some(LengthValue::Auto));
        assert_eq!(LengthValue::parse("0"), Some(LengthValue::Zero));
        assert_eq!(LengthValue::parse("calc(100% - 2em)"), None);
    }

    #[test]
    fn test_length_resolution() {
        assert_eq!(LengthValue::Px(10.0).to_px(16.0, 375.0, 667.0), 10.0);
        assert_eq!(LengthValue::Em(2.0).to_px(20.0, 375.0, 667.0), 40.0);
        assert_eq!(LengthValue::Vw(100.0).to_px(16.0, 375.0, 667.0), 375.0);
    }
}
