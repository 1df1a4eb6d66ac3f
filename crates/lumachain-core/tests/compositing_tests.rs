use lumachain_core::{
    layout_chain, BlendMode, ChannelLayout, ChannelMapping, CoreError, Fixture, Pixel, PixelBuffer,
};
use proptest::prelude::*;

fn arb_pixel() -> impl Strategy<Value = Pixel> {
    any::<[u8; 4]>().prop_map(Pixel::from_argb)
}

fn arb_pixels(len: usize) -> impl Strategy<Value = Vec<Pixel>> {
    prop::collection::vec(arb_pixel(), len)
}

fn arb_mode() -> impl Strategy<Value = BlendMode> {
    prop::sample::select(BlendMode::all().to_vec())
}

#[test]
fn test_single_overwrite_layer_passes_through() {
    let mut fixture = Fixture::new(3);
    let layer = fixture.add_layer();
    layer.set_mode(BlendMode::Overwrite);
    let pixels = [
        Pixel::new(0, 1, 2, 3),
        Pixel::new(17, 200, 100, 50),
        Pixel::new(255, 0, 0, 0),
    ];
    layer.set(0, &pixels).unwrap();

    assert_eq!(fixture.composite().as_slice(), &pixels);
}

#[test]
fn test_skip_preserves_data_for_reenable() {
    let mut fixture = Fixture::new(2);
    let layer = fixture.add_layer();
    layer.fill(Pixel::rgb(5, 6, 7));
    layer.set_mode(BlendMode::Skip);
    assert_eq!(fixture.composite(), PixelBuffer::new(2));

    layer.set_mode(BlendMode::Overwrite);
    assert_eq!(fixture.composite()[1], Pixel::rgb(5, 6, 7));
}

#[test]
fn test_mapping_fed_layer_over_static_base() {
    let mut fixture = Fixture::new(6);
    let base = fixture.add_layer();
    base.set_mode(BlendMode::Overwrite);
    base.fill(Pixel::rgb(1, 1, 1));

    let live = fixture.add_layer();
    live.fill(Pixel::OFF.with_alpha(255));
    live.add_mapping(ChannelMapping::new(2, 3, ChannelLayout::Rgb, 0))
        .unwrap();
    live.add_mapping(ChannelMapping::new(3, 3, ChannelLayout::Rgb, 3))
        .unwrap();

    live.ingest(2, &[10, 11, 12, 20, 21, 22, 30, 31, 32]);
    let frame = fixture.composite();
    assert_eq!(frame[0], Pixel::rgb(10, 11, 12));
    assert_eq!(frame[2], Pixel::rgb(30, 31, 32));
    // Universe 3 has not arrived yet: opaque black from the live layer
    assert_eq!(frame[3], Pixel::rgb(0, 0, 0));
}

#[test]
fn test_truncated_mapping_leaves_prior_data() {
    let mut fixture = Fixture::new(2);
    let layer = fixture.add_layer();
    let mapping = ChannelMapping::new(0, 2, ChannelLayout::Rgb, 0);
    layer.add_mapping(mapping).unwrap();
    layer.set(0, &[Pixel::new(9, 1, 2, 3), Pixel::new(9, 4, 5, 6)]).unwrap();
    let before = layer.snapshot();

    let err = layer.apply_mapping(&mapping, &[0u8; 5]).unwrap_err();
    assert!(matches!(err, CoreError::TruncatedInput { expected: 6, actual: 5, .. }));
    assert!(!err.is_configuration());
    assert_eq!(*layer.snapshot(), *before);

    let report = layer.ingest(0, &[0u8; 5]);
    assert_eq!(report.skipped, 1);
    assert_eq!(*layer.snapshot(), *before);
}

#[test]
fn test_mapping_out_of_range_rejected() {
    let mut fixture = Fixture::new(4);
    let layer = fixture.add_layer();
    let err = layer
        .add_mapping(ChannelMapping::new(0, 2, ChannelLayout::Rgb, 3))
        .unwrap_err();
    assert_eq!(err, CoreError::MappingOutOfRange { start: 3, end: 5, len: 4 });
}

#[test]
fn test_mappings_on_different_layers_are_independent() {
    let mut fixture = Fixture::new(4);
    let a = fixture.add_layer();
    let b = fixture.add_layer();
    let mapping = ChannelMapping::new(0, 4, ChannelLayout::Rgb, 0);
    a.add_mapping(mapping).unwrap();
    b.add_mapping(mapping).unwrap();
}

proptest! {
    #[test]
    fn prop_skip_only_stack_is_off(pixels in arb_pixels(8), layers in 0usize..4) {
        let mut fixture = Fixture::new(8);
        for _ in 0..layers {
            let layer = fixture.add_layer();
            layer.set(0, &pixels).unwrap();
            layer.set_mode(BlendMode::Skip);
        }
        prop_assert_eq!(fixture.composite(), PixelBuffer::new(8));
    }

    #[test]
    fn prop_opaque_composite_shows_top(below in arb_pixels(6), top in arb_pixels(6)) {
        let mut fixture = Fixture::new(6);
        let lower = fixture.add_layer();
        lower.set(0, &below).unwrap();
        let upper = fixture.add_layer();
        let opaque: Vec<Pixel> = top.iter().map(|p| p.with_alpha(255)).collect();
        upper.set(0, &opaque).unwrap();

        let composited = fixture.composite();
        prop_assert_eq!(composited.as_slice(), opaque.as_slice());
    }

    #[test]
    fn prop_transparent_composite_is_identity(below in arb_pixels(6), top in arb_pixels(6)) {
        let mut fixture = Fixture::new(6);
        let lower = fixture.add_layer();
        lower.set_mode(BlendMode::Overwrite);
        lower.set(0, &below).unwrap();
        let upper = fixture.add_layer();
        let clear: Vec<Pixel> = top.iter().map(|p| p.with_alpha(0)).collect();
        upper.set(0, &clear).unwrap();

        let composited = fixture.composite();
        prop_assert_eq!(composited.as_slice(), below.as_slice());
    }

    #[test]
    fn prop_overwrite_ignores_everything_below(
        stack in prop::collection::vec((arb_mode(), arb_pixels(4)), 0..4),
        top in arb_pixels(4),
    ) {
        let mut fixture = Fixture::new(4);
        for (mode, pixels) in &stack {
            let layer = fixture.add_layer();
            layer.set_mode(*mode);
            layer.set(0, pixels).unwrap();
        }
        let last = fixture.add_layer();
        last.set_mode(BlendMode::Overwrite);
        last.set(0, &top).unwrap();

        let composited = fixture.composite();
        prop_assert_eq!(composited.as_slice(), top.as_slice());
    }

    #[test]
    fn prop_layout_is_idempotent(counts in prop::collection::vec(0usize..64, 0..8)) {
        let mut fixtures: Vec<Fixture> = counts.iter().map(|&n| Fixture::new(n)).collect();
        let total = layout_chain(&mut fixtures);
        let first: Vec<_> = fixtures.iter().map(|f| f.offset()).collect();
        prop_assert_eq!(layout_chain(&mut fixtures), total);
        let second: Vec<_> = fixtures.iter().map(|f| f.offset()).collect();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(total, counts.iter().sum::<usize>());

        // Contiguous, no gaps, no overlap
        let mut expected = 0;
        for fixture in &fixtures {
            prop_assert_eq!(fixture.offset(), Some(expected));
            expected += fixture.pixel_count();
        }
    }

    #[test]
    fn prop_argb_mapping_round_trip(pixels in arb_pixels(5), start in 0usize..3) {
        let mapping = ChannelMapping::new(0, 5, ChannelLayout::Argb, start);
        let mut source = vec![Pixel::OFF; start + 5];
        source[start..].copy_from_slice(&pixels);

        let channels = mapping.read_pixels(&source);
        let mut decoded = vec![Pixel::OFF; start + 5];
        mapping.write_pixels(mapping.channels(&channels).unwrap(), &mut decoded);
        prop_assert_eq!(&decoded[start..], pixels.as_slice());
    }

    #[test]
    fn prop_rgb_mapping_round_trip_keeps_alpha(pixels in arb_pixels(5), alpha in any::<u8>()) {
        let mapping = ChannelMapping::new(0, 5, ChannelLayout::Rgb, 0);
        let channels = mapping.read_pixels(&pixels);
        let mut decoded = vec![Pixel::OFF.with_alpha(alpha); 5];
        mapping.write_pixels(mapping.channels(&channels).unwrap(), &mut decoded);
        for (out, original) in decoded.iter().zip(&pixels) {
            prop_assert_eq!(*out, original.with_alpha(alpha));
        }
    }
}
