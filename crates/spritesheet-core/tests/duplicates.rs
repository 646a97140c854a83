use image::{DynamicImage, Rgba, RgbaImage};
use spritesheet_core::dedup::{DuplicateDetector, pixels_equal};
use spritesheet_core::prelude::*;

fn checker(w: u32, h: u32, seed: u8) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        let v = ((x * 7 + y * 13) as u8).wrapping_add(seed);
        Rgba([v, v.wrapping_mul(3), 255 - v, 255])
    })
}

fn cfg() -> AtlasConfig {
    AtlasConfig::builder()
        .with_max_dimensions(512, 512)
        .trim_mode(TrimMode::Lenient)
        .build()
}

#[test]
fn full_compare_catches_unsampled_difference() {
    let a = checker(16, 16, 0);
    let mut b = a.clone();
    assert!(pixels_equal(&a, &b));
    // (3, 9) is none of the seven sample points
    b.put_pixel(3, 9, Rgba([0, 0, 0, 0]));
    assert!(!pixels_equal(&a, &b));
    assert!(!pixels_equal(&a, &checker(16, 15, 0)));
}

#[test]
fn detector_returns_earliest_match() {
    let mut det = DuplicateDetector::new();
    assert!(det.is_empty());
    det.accept(0, checker(10, 10, 1));
    det.accept(1, checker(10, 10, 2));
    det.accept(5, checker(10, 10, 1));
    assert_eq!(det.len(), 3);

    assert_eq!(det.find_duplicate(&checker(10, 10, 1)), Some(0));
    assert_eq!(det.find_duplicate(&checker(10, 10, 2)), Some(1));
    assert_eq!(det.find_duplicate(&checker(10, 10, 3)), None);
    assert_eq!(det.find_duplicate(&checker(10, 11, 1)), None);

    let ids: Vec<usize> = det.into_images().into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![0, 1, 5]);
}

#[test]
fn identical_images_share_one_slot() {
    let inputs = vec![
        InputImage {
            key: "a".into(),
            image: DynamicImage::ImageRgba8(checker(50, 50, 4)),
        },
        InputImage {
            key: "b".into(),
            image: DynamicImage::ImageRgba8(checker(50, 50, 4)),
        },
    ];
    let out = pack_images(inputs, cfg()).expect("pack");
    let a = out.atlas.frame("a").expect("a");
    let b = out.atlas.frame("b").expect("b");
    assert_eq!(a.frame, b.frame);
    assert_eq!(a.rotated, b.rotated);
    assert_eq!(b.duplicate_of.as_deref(), Some("a"));
    assert!(!a.is_duplicate());
    // only one 50x50 sprite was placed
    assert_eq!((out.atlas.width, out.atlas.height), (50, 50));

    let stats = out.stats();
    assert_eq!(stats.num_frames, 2);
    assert_eq!(stats.num_duplicates, 1);
    assert_eq!(stats.used_frame_area, 2500);
}

#[test]
fn duplicates_are_compared_after_trimming() {
    let core = checker(40, 40, 9);
    let mut padded = RgbaImage::from_pixel(50, 50, Rgba([0, 0, 0, 0]));
    image::imageops::replace(&mut padded, &core, 5, 5);

    let inputs = vec![
        InputImage {
            key: "padded".into(),
            image: DynamicImage::ImageRgba8(padded),
        },
        InputImage {
            key: "bare".into(),
            image: DynamicImage::ImageRgba8(core),
        },
    ];
    let out = pack_images(inputs, cfg()).expect("pack");
    let padded = out.atlas.frame("padded").expect("padded");
    let bare = out.atlas.frame("bare").expect("bare");

    assert_eq!(bare.duplicate_of.as_deref(), Some("padded"));
    assert_eq!(padded.frame, bare.frame);
    assert_eq!(padded.source, Rect::new(5, 5, 40, 40));
    assert_eq!(padded.source_size, (50, 50));
    assert!(padded.trimmed);
    assert_eq!(bare.source, Rect::new(0, 0, 40, 40));
    assert!(!bare.trimmed);
}

#[test]
fn duplicates_follow_their_original() {
    let input = |key: &str, img: RgbaImage| InputImage {
        key: key.into(),
        image: DynamicImage::ImageRgba8(img),
    };
    let inputs = vec![
        input("small", checker(8, 8, 1)),
        input("big", checker(32, 32, 2)),
        input("other", checker(8, 8, 7)),
        input("small_copy", checker(8, 8, 1)),
        input("mid", checker(16, 16, 3)),
    ];
    let out = pack_images(inputs, cfg()).expect("pack");
    let keys: Vec<&str> = out.atlas.frames.iter().map(|f| f.key.as_str()).collect();
    assert_eq!(keys, vec!["big", "mid", "small", "small_copy", "other"]);
}

#[test]
fn detection_can_be_disabled() {
    let inputs = vec![
        InputImage {
            key: "a".into(),
            image: DynamicImage::ImageRgba8(checker(20, 20, 4)),
        },
        InputImage {
            key: "b".into(),
            image: DynamicImage::ImageRgba8(checker(20, 20, 4)),
        },
    ];
    let mut cfg = cfg();
    cfg.detect_duplicates = false;
    let out = pack_images(inputs, cfg).expect("pack");
    assert!(out.atlas.frames.iter().all(|f| !f.is_duplicate()));
    let (a, b) = (&out.atlas.frames[0].frame, &out.atlas.frames[1].frame);
    assert!(!a.intersects(b));
}
