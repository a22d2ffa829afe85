/// Parse a CSS-like color into straight RGBA8.
///
/// Accepted forms: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`, `rgba(r, g, b, a)`
/// (with `a` in `[0, 1]`) and a small set of named colors.
pub(crate) fn parse_color(s: &str) -> Result<[u8; 4], String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = s.to_ascii_lowercase();
    if let Some(args) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_rgb_fn(args);
    }
    named(&lower).ok_or_else(|| format!("unsupported color '{s}'"))
}

fn parse_hex(hex: &str) -> Result<[u8; 4], String> {
    fn nibble(c: u8) -> Option<u8> {
        match c {
            b'0'..=b'9' => Some(c - b'0'),
            b'a'..=b'f' => Some(c - b'a' + 10),
            b'A'..=b'F' => Some(c - b'A' + 10),
            _ => None,
        }
    }

    let bytes = hex.as_bytes();
    let mut digits = Vec::with_capacity(bytes.len());
    for &b in bytes {
        digits.push(nibble(b).ok_or_else(|| format!("invalid hex color '#{hex}'"))?);
    }
    match digits.len() {
        3 | 4 => {
            let mut out = [255u8; 4];
            for (i, d) in digits.iter().enumerate() {
                out[i] = d * 17;
            }
            Ok(out)
        }
        6 | 8 => {
            let mut out = [255u8; 4];
            for (i, pair) in digits.chunks_exact(2).enumerate() {
                out[i] = pair[0] * 16 + pair[1];
            }
            Ok(out)
        }
        _ => Err(format!(
            "hex color '#{hex}' must have 3, 4, 6 or 8 digits"
        )),
    }
}

fn parse_rgb_fn(args: &str) -> Result<[u8; 4], String> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(format!("rgb()/rgba() expects 3 or 4 components, got '{args}'"));
    }
    let mut out = [255u8; 4];
    for (i, p) in parts.iter().take(3).enumerate() {
        let v: f64 = p
            .parse()
            .map_err(|_| format!("invalid color component '{p}'"))?;
        if !(0.0..=255.0).contains(&v) {
            return Err(format!("color component '{p}' must be in [0, 255]"));
        }
        out[i] = v.round() as u8;
    }
    if let Some(a) = parts.get(3) {
        let v: f64 = a.parse().map_err(|_| format!("invalid alpha '{a}'"))?;
        if !(0.0..=1.0).contains(&v) {
            return Err(format!("alpha '{a}' must be in [0, 1]"));
        }
        out[3] = (v * 255.0).round() as u8;
    }
    Ok(out)
}

fn named(name: &str) -> Option<[u8; 4]> {
    let rgb = match name {
        "white" => [255, 255, 255],
        "black" => [0, 0, 0],
        "red" => [255, 0, 0],
        "green" => [0, 128, 0],
        "lime" => [0, 255, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "cyan" => [0, 255, 255],
        "magenta" => [255, 0, 255],
        "orange" => [255, 165, 0],
        "gray" | "grey" => [128, 128, 128],
        "transparent" => return Some([0, 0, 0, 0]),
        _ => return None,
    };
    Some([rgb[0], rgb[1], rgb[2], 255])
}
