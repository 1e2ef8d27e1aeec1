/// CSS colour parsing for the handful of notations stylesheets use for
/// custom properties: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()`.
use image::Rgba;

pub fn parse(value: &str) -> Option<Rgba<u8>> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = value.to_ascii_lowercase();
    let args = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    parse_functional(args)
}

fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|n| n * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Rgba([nibble(0)?, nibble(1)?, nibble(2)?, 255])),
        4 => Some(Rgba([nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?])),
        6 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
        8 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
        _ => None,
    }
}

fn parse_functional(args: &str) -> Option<Rgba<u8>> {
    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();
    if !(3..=4).contains(&parts.len()) {
        return None;
    }
    let channel = |s: &str| -> Option<u8> {
        let v = match s.strip_suffix('%') {
            Some(p) => p.parse::<f64>().ok()? / 100.0 * 255.0,
            None => s.parse::<f64>().ok()?,
        };
        Some(v.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = match parts.get(3) {
        Some(s) => {
            let a = match s.strip_suffix('%') {
                Some(p) => p.parse::<f64>().ok()? / 100.0,
                None => s.parse::<f64>().ok()?,
            };
            (a.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        None => 255,
    };
    Some(Rgba([channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, alpha]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_forms() {
        assert_eq!(parse("#ffd29a"), Some(Rgba([0xff, 0xd2, 0x9a, 255])));
        assert_eq!(parse("  #FFF "), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(parse("#0008"), Some(Rgba([0, 0, 0, 0x88])));
        assert_eq!(parse("#ff6a4d80"), Some(Rgba([0xff, 0x6a, 0x4d, 0x80])));
    }

    #[test]
    fn test_functional_forms() {
        assert_eq!(parse("rgba(1,241,248,0.9)"), Some(Rgba([1, 241, 248, 230])));
        assert_eq!(parse("rgb(10 20 30)"), Some(Rgba([10, 20, 30, 255])));
        assert_eq!(parse("RGB(100%, 0%, 50%)"), Some(Rgba([255, 0, 128, 255])));
        assert_eq!(parse("rgb(1 2 3 / 50%)"), Some(Rgba([1, 2, 3, 128])));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("#ggg"), None);
        assert_eq!(parse("#12345"), None);
        assert_eq!(parse("orange"), None);
        assert_eq!(parse("rgb(1,2)"), None);
    }
}
