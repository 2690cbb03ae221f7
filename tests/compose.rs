use remixel::{
    BlendMode, HalftoneParams, OverlayGeometry, RasterSurface, ShapeType, composite_to_raster,
    overlay::SizeF,
};

fn background(w: u32, h: u32) -> RasterSurface {
    let mut s = RasterSurface::new(w, h).unwrap();
    for y in 0..h {
        for x in 0..w {
            let v = ((x * 5 + y * 11) % 256) as u8;
            s.put_pixel(x, y, [v, v.wrapping_add(60), v.wrapping_add(120), 255]);
        }
    }
    s
}

fn overlay(content_w: f64, content_h: f64) -> OverlayGeometry {
    remixel::halftone::generate(
        &HalftoneParams {
            shape: ShapeType::Hexagons,
            fill: "#00FF00".to_string(),
            distance: 10.0,
            width: content_w,
            height: content_h,
        },
        None,
    )
    .unwrap()
}

#[test]
fn output_dims_follow_background_for_every_blend_mode() {
    let bg = background(60, 40);
    let ov = overlay(30.0, 20.0);

    for mode in BlendMode::ALL {
        let out = composite_to_raster(&ov, &bg, mode).unwrap();
        // content * (background.width / content_width) on both axes.
        assert_eq!(
            (out.width(), out.height()),
            (60, 40),
            "wrong dims for {mode:?}"
        );
    }
}

#[test]
fn output_dims_are_independent_of_overlay_native_resolution() {
    let bg = background(60, 40);

    for renderer in [
        SizeF::new(30.0, 20.0),
        SizeF::new(120.0, 80.0),
        SizeF::new(1024.0, 683.0),
    ] {
        let mut ov = overlay(30.0, 20.0);
        ov.renderer = renderer;
        let out = composite_to_raster(&ov, &bg, BlendMode::Multiply).unwrap();
        assert_eq!((out.width(), out.height()), (60, 40));
    }
}

#[test]
fn background_is_painted_under_the_overlay() {
    let bg = background(32, 32);
    // A zero-coverage overlay: empty path renders nothing, so the export is
    // exactly the cover-fit background.
    let mut ov = overlay(32.0, 32.0);
    ov.path = kurbo::BezPath::new();

    let out = composite_to_raster(&ov, &bg, BlendMode::Normal).unwrap();
    assert_eq!((out.width(), out.height()), (32, 32));
    // Same aspect and size: cover placement is the identity blit.
    assert_eq!(out.pixel(3, 7), bg.pixel(3, 7));
    assert_eq!(out.pixel(31, 31), bg.pixel(31, 31));
}

#[test]
fn multiply_never_brightens_the_background() {
    let bg = background(24, 24);
    let ov = overlay(24.0, 24.0);

    let multiplied = composite_to_raster(&ov, &bg, BlendMode::Multiply).unwrap();

    for y in 0..24 {
        for x in 0..24 {
            let m = multiplied.pixel(x, y);
            let b = bg.pixel(x, y);
            assert_eq!(m[3], 255);
            // Multiply darkens (or keeps) every channel of the backdrop.
            for i in 0..3 {
                assert!(
                    m[i] <= b[i].saturating_add(1),
                    "multiply brightened ({x},{y}) ch{i}: {} > {}",
                    m[i],
                    b[i]
                );
            }
        }
    }
}

#[test]
fn blend_modes_produce_distinct_composites() {
    let bg = background(24, 24);
    let ov = overlay(24.0, 24.0);

    let normal = composite_to_raster(&ov, &bg, BlendMode::Normal).unwrap();
    let difference = composite_to_raster(&ov, &bg, BlendMode::Difference).unwrap();
    let screen = composite_to_raster(&ov, &bg, BlendMode::Screen).unwrap();

    assert_ne!(normal, difference);
    assert_ne!(normal, screen);
    assert_ne!(difference, screen);
}

#[test]
fn half_resolution_content_doubles_export_scale() {
    // Same background, overlay described at half the background's width:
    // the export still lands at background resolution.
    let bg = background(128, 96);
    let out = composite_to_raster(&overlay(64.0, 48.0), &bg, BlendMode::Normal).unwrap();
    assert_eq!((out.width(), out.height()), (128, 96));
}
