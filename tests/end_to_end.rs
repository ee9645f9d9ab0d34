use cloak_fx::cloak::{BgrImage, ColorRange, Compositor, Phase};
use cloak_fx::config::CloakConfig;
use image::Rgb;

const BLACK: [u8; 3] = [0, 0, 0];
const BLUE: [u8; 3] = [255, 0, 0];

fn blue_compositor(frames_needed: usize) -> Compositor {
    let range = ColorRange::new([90, 50, 50], [130, 255, 255]).unwrap();
    Compositor::new(range, frames_needed).unwrap()
}

fn with_block(base: &BgrImage, x0: u32, y0: u32, side: u32, bgr: [u8; 3]) -> BgrImage {
    let mut frame = base.clone();
    for y in y0..y0 + side {
        for x in x0..x0 + side {
            frame.put_pixel(x, y, Rgb(bgr));
        }
    }
    frame
}

fn prime(compositor: &mut Compositor, frame: &BgrImage) {
    while compositor.phase() == Phase::Learning {
        let output = compositor.process(frame).unwrap();
        assert_eq!(&output, frame);
    }
}

#[test]
fn test_blue_region_is_replaced_by_black_background() {
    let black = BgrImage::from_pixel(9, 9, Rgb(BLACK));
    let mut compositor = blue_compositor(3);

    for _ in 0..3 {
        assert_eq!(compositor.process(&black).unwrap(), black);
    }
    assert_eq!(compositor.phase(), Phase::Active);
    assert_eq!(compositor.background(), Some(&black));

    let live = with_block(&black, 2, 2, 5, BLUE);
    let output = compositor.process(&live).unwrap();

    assert_eq!(output, black);
}

#[test]
fn test_single_blue_pixel_is_treated_as_noise() {
    let black = BgrImage::from_pixel(9, 9, Rgb(BLACK));
    let mut compositor = blue_compositor(3);
    prime(&mut compositor, &black);

    let mut live = black.clone();
    live.put_pixel(4, 4, Rgb(BLUE));
    let output = compositor.process(&live).unwrap();

    assert_eq!(output, live);
}

#[test]
fn test_cloak_reveals_scene_behind_it() {
    let scene = BgrImage::from_fn(20, 16, |x, y| Rgb([(x * 3) as u8, (y * 10) as u8, 200]));
    let mut compositor = blue_compositor(5);
    prime(&mut compositor, &scene);

    // A person-sized blob in a non-blue color, plus the cloak
    let live = with_block(&scene, 14, 2, 4, [20, 180, 40]);
    let live = with_block(&live, 3, 5, 7, BLUE);
    let output = compositor.process(&live).unwrap();

    for (x, y, pixel) in output.enumerate_pixels() {
        // Cloak block grown by one pixel on each side
        let in_cloak = (2..11).contains(&x) && (4..13).contains(&y);
        if in_cloak {
            assert_eq!(pixel, scene.get_pixel(x, y), "cloak pixel ({}, {})", x, y);
        } else {
            assert_eq!(pixel, live.get_pixel(x, y), "live pixel ({}, {})", x, y);
        }
    }
}

#[test]
fn test_frames_are_processed_independently() {
    let background = BgrImage::from_pixel(12, 12, Rgb([40, 90, 160]));
    let mut compositor = blue_compositor(2);
    prime(&mut compositor, &background);

    let cloaked = with_block(&background, 2, 2, 8, BLUE);
    let first = compositor.process(&cloaked).unwrap();
    let second = compositor.process(&cloaked).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, background);

    // Nothing from the previous mask carries over
    let plain = with_block(&background, 2, 2, 8, [10, 10, 10]);
    assert_eq!(compositor.process(&plain).unwrap(), plain);
}

#[test]
fn test_dimension_mismatch_is_recoverable() {
    let black = BgrImage::from_pixel(9, 9, Rgb(BLACK));
    let mut compositor = blue_compositor(3);

    compositor.process(&black).unwrap();
    assert!(compositor
        .process(&BgrImage::from_pixel(9, 10, Rgb(BLACK)))
        .is_err());
    compositor.process(&black).unwrap();
    assert_eq!(compositor.phase(), Phase::Learning);
    compositor.process(&black).unwrap();
    assert_eq!(compositor.phase(), Phase::Active);

    let live = with_block(&black, 2, 2, 5, BLUE);
    assert_eq!(compositor.process(&live).unwrap(), black);
}

#[test]
fn test_green_cloak_from_config() {
    let config = CloakConfig::from_toml(
        "lower_bound = [50, 100, 100]\nupper_bound = [70, 255, 255]\nframes_needed = 1\n",
    )
    .unwrap();
    let mut compositor = config.build_compositor().unwrap();

    let scene = BgrImage::from_pixel(10, 10, Rgb([200, 200, 200]));
    prime(&mut compositor, &scene);

    let green = with_block(&scene, 0, 0, 10, [0, 255, 0]);
    assert_eq!(compositor.process(&green).unwrap(), scene);

    // Blue is not the cloak color here
    let blue = with_block(&scene, 0, 0, 10, BLUE);
    assert_eq!(compositor.process(&blue).unwrap(), blue);
}
