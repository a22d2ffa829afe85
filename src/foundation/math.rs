pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Premultiply straight RGBA8 bytes in place.
pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = mul_div255_u8(u16::from(px[0]), a);
        px[1] = mul_div255_u8(u16::from(px[1]), a);
        px[2] = mul_div255_u8(u16::from(px[2]), a);
    }
}

/// Source-over blend of premultiplied `src` onto premultiplied `dst`, in place.
pub(crate) fn premul_over_in_place(dst: &mut [u8], src: &[u8]) -> bool {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return false;
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = u16::from(s[3]);
        if sa == 0 {
            continue;
        }
        if sa == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255u16 - sa;
        d[3] = s[3].saturating_add(mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            d[c] = s[c].saturating_add(mul_div255_u8(u16::from(d[c]), inv));
        }
    }
    true
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
