use super::*;

#[test]
fn mul_div255_rounds_to_nearest() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(0, 255), 0);
    assert_eq!(mul_div255_u8(128, 255), 128);
    assert_eq!(mul_div255_u8(255, 153), 153);
}

#[test]
fn premultiply_zero_alpha_clears_color() {
    let mut px = vec![200u8, 100, 50, 0, 255, 255, 255, 255];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![0, 0, 0, 0, 255, 255, 255, 255]);
}

#[test]
fn over_transparent_src_keeps_dst() {
    let mut dst = vec![10u8, 20, 30, 255];
    assert!(premul_over_in_place(&mut dst, &[0, 0, 0, 0]));
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn over_opaque_src_replaces_dst() {
    let mut dst = vec![10u8, 20, 30, 255];
    assert!(premul_over_in_place(&mut dst, &[1, 2, 3, 255]));
    assert_eq!(dst, vec![1, 2, 3, 255]);
}

#[test]
fn over_sixty_percent_red_on_blue() {
    // 60% red, premultiplied: (153, 0, 0, 153).
    let mut dst = vec![0u8, 0, 255, 255];
    assert!(premul_over_in_place(&mut dst, &[153, 0, 0, 153]));
    assert_eq!(dst[0], 153);
    assert_eq!(dst[1], 0);
    assert_eq!(dst[2], 102);
    assert_eq!(dst[3], 255);
}

#[test]
fn over_rejects_mismatched_lengths() {
    let mut dst = vec![0u8; 8];
    assert!(!premul_over_in_place(&mut dst, &[0u8; 4]));
}
