use mycolight_core::color::{hsv_to_rgb, rgb_to_hsv, Hsv};
use mycolight_core::fixture::Fixture;
use proptest::prelude::*;

proptest! {
    #[test]
    fn rgb_survives_hsv_round_trip(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
        let (h, s, v) = rgb_to_hsv(r, g, b);
        let (r2, g2, b2) = hsv_to_rgb(h, s, v);
        prop_assert!((r as i16 - r2 as i16).abs() <= 1);
        prop_assert!((g as i16 - g2 as i16).abs() <= 1);
        prop_assert!((b as i16 - b2 as i16).abs() <= 1);
    }

    #[test]
    fn hsv_survives_rgb_round_trip(
        h in 0.0f32..360.0,
        s in 0.5f32..=1.0,
        v in 0.5f32..=1.0,
    ) {
        let (r, g, b) = hsv_to_rgb(h, s, v);
        let (h2, s2, v2) = rgb_to_hsv(r, g, b);
        let hue_error = {
            let d = (h - h2).rem_euclid(360.0);
            d.min(360.0 - d)
        };
        // one quantization step in 8 bits, seen through the conversion
        prop_assert!(hue_error <= 3.0, "hue {} came back as {}", h, h2);
        prop_assert!((s - s2).abs() <= 0.02, "saturation {} came back as {}", s, s2);
        prop_assert!((v - v2).abs() <= 1.0 / 255.0, "value {} came back as {}", v, v2);
    }

    #[test]
    fn grey_and_black_round_trip(h in 0.0f32..360.0, v in 0.0f32..=1.0) {
        let (r, g, b) = hsv_to_rgb(h, 0.0, v);
        prop_assert!(r == g && g == b);
        let (_, s2, v2) = rgb_to_hsv(r, g, b);
        prop_assert_eq!(s2, 0.0);
        prop_assert!((v - v2).abs() <= 1.0 / 255.0);

        let (r, g, b) = hsv_to_rgb(h, v, 0.0);
        prop_assert_eq!((r, g, b), (0, 0, 0));
        prop_assert_eq!(rgb_to_hsv(r, g, b).2, 0.0);
    }

    #[test]
    fn any_float_input_yields_valid_color(
        h in prop::num::f32::ANY,
        s in prop::num::f32::ANY,
        v in prop::num::f32::ANY,
    ) {
        let color = Hsv::new(h, s, v);
        prop_assert!((0.0..360.0).contains(&color.h));
        prop_assert!((0.0..=1.0).contains(&color.s));
        prop_assert!((0.0..=1.0).contains(&color.v));
        // quantization never panics
        let _ = hsv_to_rgb(h, s, v);
    }

    #[test]
    fn smoothing_never_overshoots(
        start_v in 0.0f32..=1.0,
        target_v in 0.0f32..=1.0,
        rate in 0.1f32..50.0,
        dt in 0.001f32..0.2,
    ) {
        let mut fixture = Fixture::new("f", 1, 3).unwrap();
        fixture.set_current(Hsv::new(0.0, 1.0, start_v));
        fixture.set_target(Hsv::new(0.0, 1.0, target_v));

        let mut distance = (target_v - start_v).abs();
        for _ in 0..50 {
            fixture.smooth(rate, dt);
            let v = fixture.current().v;
            let lo = start_v.min(target_v) - 1e-5;
            let hi = start_v.max(target_v) + 1e-5;
            prop_assert!(v >= lo && v <= hi, "v {} left [{}, {}]", v, lo, hi);

            let next = (target_v - v).abs();
            prop_assert!(next <= distance + 1e-6);
            distance = next;
        }
    }

    #[test]
    fn smoothing_converges_in_bounded_ticks(
        start_h in 0.0f32..360.0,
        target_h in 0.0f32..360.0,
        start_s in 0.0f32..=1.0,
        target_s in 0.0f32..=1.0,
        start_v in 0.0f32..=1.0,
        target_v in 0.0f32..=1.0,
        rate in 0.5f32..50.0,
        dt in 0.01f32..0.1,
    ) {
        let mut fixture = Fixture::new("f", 1, 3).unwrap();
        fixture.set_current(Hsv::new(start_h, start_s, start_v));
        fixture.set_target(Hsv::new(target_h, target_s, target_v));

        // the remaining distance shrinks by (1 - k) per tick
        let k = (rate * dt).min(1.0);
        let ticks = if k >= 1.0 {
            1
        } else {
            (1e-4f32.ln() / (1.0 - k).ln()).ceil() as usize + 1
        };
        for _ in 0..ticks {
            fixture.smooth(rate, dt);
        }

        let c = fixture.current();
        let hue_gap = {
            let d = (c.h - target_h).rem_euclid(360.0);
            d.min(360.0 - d)
        };
        prop_assert!(hue_gap < 0.05, "hue {} after {} ticks", hue_gap, ticks);
        prop_assert!((c.s - target_s).abs() < 1e-3);
        prop_assert!((c.v - target_v).abs() < 1e-3);
    }

    #[test]
    fn smoothing_hue_takes_short_arc(
        start_h in 0.0f32..360.0,
        target_h in 0.0f32..360.0,
    ) {
        let mut fixture = Fixture::new("f", 1, 3).unwrap();
        fixture.set_current(Hsv::new(start_h, 1.0, 1.0));
        fixture.set_target(Hsv::new(target_h, 1.0, 1.0));

        let arc = |a: f32, b: f32| {
            let d = (a - b).rem_euclid(360.0);
            d.min(360.0 - d)
        };
        let before = arc(start_h, target_h);
        fixture.smooth(10.0, 0.05);
        let after = arc(fixture.current().h, target_h);
        prop_assert!((after - before * 0.5).abs() < 0.01, "before {} after {}", before, after);
    }
}
