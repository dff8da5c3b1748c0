use super::*;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    let src = [200, 200, 200, 200];
    assert_eq!(over(dst, src, 0.0), dst);
}

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    let src = [255, 255, 255, 0];
    assert_eq!(over(dst, src, 1.0), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn over_dst_transparent_returns_src() {
    let dst = [0, 0, 0, 0];
    let src = [100, 110, 120, 200];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn over_half_black_on_white_is_mid_grey() {
    let out = over([255, 255, 255, 255], [0, 0, 0, 128], 1.0);
    assert_eq!(out, [127, 127, 127, 255]);
}

#[test]
fn over_in_place_rejects_mismatched_lengths() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4], 1.0).is_err());
}

#[test]
fn over_at_clips_negative_and_overflowing_offsets() {
    let (dw, dh) = (4u32, 3u32);
    let mut dst = vec![0u8; (dw * dh * 4) as usize];
    let src = [255u8, 0, 0, 255].repeat(4);

    over_at(&mut dst, dw, dh, &src, 2, 2, -1, -1, 1.0).unwrap();
    over_at(&mut dst, dw, dh, &src, 2, 2, 3, 2, 1.0).unwrap();

    let px = |x: u32, y: u32| {
        let i = ((y * dw + x) * 4) as usize;
        [dst[i], dst[i + 1], dst[i + 2], dst[i + 3]]
    };
    assert_eq!(px(0, 0), [255, 0, 0, 255]);
    assert_eq!(px(1, 0), [0, 0, 0, 0]);
    assert_eq!(px(3, 2), [255, 0, 0, 255]);
    assert_eq!(px(2, 2), [0, 0, 0, 0]);
}

#[test]
fn over_at_fully_outside_is_noop() {
    let mut dst = vec![7u8; 16];
    over_at(&mut dst, 2, 2, &[255u8; 4], 1, 1, 5, 0, 1.0).unwrap();
    assert_eq!(dst, vec![7u8; 16]);
}

#[test]
fn scale_alpha_scales_every_channel() {
    let mut px = vec![200u8, 100, 50, 200];
    scale_alpha_in_place(&mut px, 0.5);
    assert_eq!(px, [100, 50, 25, 100]);
}
