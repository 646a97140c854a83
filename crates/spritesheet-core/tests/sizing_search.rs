use rand::{Rng, SeedableRng};
use spritesheet_core::prelude::*;
use spritesheet_core::sizing::{
    Infeasible, PackItem, attempt_pack, next_pow2, prev_pow2, round_canvas, search, trial_size,
};

fn cfg(max_w: u32, max_h: u32) -> AtlasConfig {
    AtlasConfig::builder()
        .with_max_dimensions(max_w, max_h)
        .build()
}

#[test]
fn pow2_helpers() {
    assert_eq!(next_pow2(0), 1);
    assert_eq!(next_pow2(1), 1);
    assert_eq!(next_pow2(67), 128);
    assert_eq!(next_pow2(128), 128);
    assert_eq!(prev_pow2(67), 64);
    assert_eq!(prev_pow2(64), 64);
    assert_eq!(prev_pow2(1), 1);
}

#[test]
fn trial_size_follows_area_and_aspect() {
    // sqrt(10000 * 1.1) = 104.88
    let t = trial_size(10_000, 0.10, &cfg(2048, 2048));
    assert_eq!(t.raw, (105, 105));
    assert_eq!(t.canvas, (105, 105));

    let t = trial_size(10_000, 0.10, &cfg(2048, 1024));
    assert_eq!(t.raw, (149, 75));

    let mut c = cfg(2048, 2048);
    c.power_of_two = true;
    let t = trial_size(10_000, 0.10, &c);
    assert_eq!(t.raw, (105, 105));
    assert_eq!(t.canvas, (128, 128));

    let t = trial_size(10_000, 0.10, &cfg(100, 100));
    assert_eq!(t.canvas, (100, 100));
}

#[test]
fn duplicates_copy_their_original_slot() {
    let items = [
        PackItem::new(10, 10),
        PackItem::duplicate(10, 10, 0),
        PackItem::new(150, 10),
    ];
    let mut c = cfg(1024, 1024);
    c.allow_rotation = false;

    match attempt_pack(&items, &[2, 0, 1], (100, 100), &c) {
        Err(Infeasible { canvas, item }) => {
            assert_eq!(canvas, (100, 100));
            assert_eq!(item, 2);
        }
        Ok(_) => panic!("Expected the 150px item to fail"),
    }

    let layout = attempt_pack(&items, &[2, 0, 1], (200, 200), &c).expect("fits");
    assert!(layout.placements[0].is_some());
    assert_eq!(layout.placements[1], layout.placements[0]);
    assert_eq!(layout.extent, (160, 10));
}

#[test]
fn slack_grows_until_everything_fits() {
    let items = [PackItem::new(64, 64); 3];
    let layout = search(&items, &[0, 1, 2], &cfg(256, 256)).expect("fits");
    // sides 117..=127 cannot hold two 64px columns; slack 0.32 gives 128
    assert_eq!(layout.canvas, (128, 128));
    assert_eq!(layout.trials, 12);
    assert!((layout.slack - 0.32).abs() < 1e-9);
}

#[test]
fn random_sets_converge_deterministically() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(1234);
    let items: Vec<PackItem> = (0..80)
        .map(|_| PackItem::new(rng.gen_range(4..=64), rng.gen_range(4..=64)))
        .collect();
    let order: Vec<usize> = (0..items.len()).collect();
    let c = cfg(2048, 2048);

    let a = search(&items, &order, &c).expect("fits");
    let b = search(&items, &order, &c).expect("fits");
    assert_eq!(a.canvas, b.canvas);
    assert_eq!(a.placements, b.placements);
    assert!(a.trials < 200, "took {} trials", a.trials);

    let rects: Vec<Rect> = a.placements.iter().map(|p| p.expect("placed").rect).collect();
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            assert!(!rects[i].intersects(&rects[j]));
        }
    }
}

#[test]
fn oversized_item_is_infeasible_up_front() {
    let items = vec![LayoutItem::new("wide", 300, 10)];
    match pack_layout(items, cfg(200, 200)) {
        Err(SpritesheetError::PackingInfeasible {
            required,
            available,
        }) => {
            assert_eq!(required, (300, 10));
            assert_eq!(available, (200, 200));
        }
        other => panic!("Expected PackingInfeasible, got {other:?}"),
    }
}

#[test]
fn item_that_only_fits_rotated() {
    let items = vec![LayoutItem::new("tall", 150, 250)];
    let atlas = pack_layout(items, cfg(300, 200)).expect("fits rotated");
    let f = &atlas.frames[0];
    assert!(f.rotated);
    assert_eq!(f.frame, Rect::new(0, 0, 250, 150));
    assert_eq!((atlas.width, atlas.height), (250, 150));
}

#[test]
fn total_area_over_maximum_is_infeasible() {
    let items: Vec<LayoutItem<String>> = (0..5)
        .map(|i| LayoutItem::new(format!("tile{i}"), 100, 100))
        .collect();
    match pack_layout(items, cfg(200, 200)) {
        Err(SpritesheetError::PackingInfeasible {
            required,
            available,
        }) => {
            assert_eq!(available, (200, 200));
            assert!(required.0 as u64 * required.1 as u64 > 200 * 200);
            assert!(required.0 > 200 || required.1 > 200);
        }
        other => panic!("Expected PackingInfeasible, got {other:?}"),
    }
}

#[test]
fn sparse_pow2_canvas_gets_a_tighter_trial() {
    let mut c = cfg(1024, 1024);
    c.power_of_two = true;

    // first trial is 128x128; the 64x128 retry only fits the item rotated
    let atlas = pack_layout(vec![LayoutItem::new("bar", 100, 40)], c.clone()).expect("fits");
    assert_eq!((atlas.width, atlas.height), (64, 128));
    assert!(atlas.frames[0].rotated);
    assert_eq!(atlas.frames[0].frame, Rect::new(0, 0, 40, 100));

    c.allow_rotation = false;
    let atlas = pack_layout(vec![LayoutItem::new("bar", 100, 40)], c.clone()).expect("fits");
    assert_eq!((atlas.width, atlas.height), (128, 64));
    assert!(!atlas.frames[0].rotated);

    c.square = true;
    let atlas = pack_layout(vec![LayoutItem::new("bar", 100, 40)], c).expect("fits");
    assert_eq!((atlas.width, atlas.height), (128, 128));
}

#[test]
fn canvas_rounding() {
    let mut c = cfg(1024, 1024);
    assert_eq!(round_canvas(100, 40, &c), (100, 40));
    c.power_of_two = true;
    assert_eq!(round_canvas(100, 40, &c), (128, 64));
    c.square = true;
    assert_eq!(round_canvas(100, 40, &c), (128, 128));
    c.power_of_two = false;
    assert_eq!(round_canvas(100, 40, &c), (100, 100));
}

#[test]
fn random_layouts_respect_pow2_and_square() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(77);
    let items: Vec<LayoutItem<String>> = (0..40)
        .map(|i| LayoutItem::new(format!("s{i}"), rng.gen_range(3..=48), rng.gen_range(3..=48)))
        .collect();
    for (pow2, square) in [(true, false), (false, true), (true, true)] {
        let mut c = cfg(1024, 1024);
        c.power_of_two = pow2;
        c.square = square;
        let atlas = pack_layout(items.clone(), c).expect("fits");
        if pow2 {
            assert!(atlas.width.is_power_of_two());
            assert!(atlas.height.is_power_of_two());
        }
        if square {
            assert_eq!(atlas.width, atlas.height);
        }
        for f in &atlas.frames {
            assert!(f.frame.right_ex() <= atlas.width);
            assert!(f.frame.bottom_ex() <= atlas.height);
        }
    }
}
