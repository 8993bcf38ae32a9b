use super::*;

#[test]
fn fps_rejects_zero() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(24, 0).is_err());
    assert!(Fps::new(24, 1).is_ok());
}

#[test]
fn frame_at_rounds_to_nearest_boundary() {
    let fps = Fps::new(24, 1).unwrap();
    assert_eq!(fps.frame_at(Duration::ZERO), 0);
    assert_eq!(fps.frame_at(Duration::from_secs(3)), 72);
    // 1.02s * 24 = 24.48 -> 24
    assert_eq!(fps.frame_at(Duration::from_millis(1020)), 24);
    // 1.03s * 24 = 24.72 -> 25
    assert_eq!(fps.frame_at(Duration::from_millis(1030)), 25);
}

#[test]
fn frame_at_uses_rational_fps() {
    let fps = Fps::new(30000, 1001).unwrap();
    let frames = fps.frame_at(Duration::from_secs(10));
    assert_eq!(frames, 300);
}

#[test]
fn sample_at_scales_by_rate() {
    assert_eq!(sample_at(Duration::from_secs(2), 48_000), 96_000);
    assert_eq!(sample_at(Duration::from_millis(500), 44_100), 22_050);
}

#[test]
fn rgb_hex_is_lowercase() {
    assert_eq!(Rgb8::new(144, 169, 183).to_hex(), "#90a9b7");
    assert_eq!(Rgb8::BLACK.to_rgba(), [0, 0, 0, 255]);
}
