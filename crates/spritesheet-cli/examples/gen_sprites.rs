//! Writes a seeded folder of sprites for trying out `spritesheet pack`.
//!
//! Usage: cargo run -p spritesheet-cli --example gen_sprites -- [out_root]

use image::{Rgba, RgbaImage};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;

fn fill_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, c: [u8; 4]) {
    let (iw, ih) = img.dimensions();
    for yy in y.min(ih)..y.saturating_add(h).min(ih) {
        for xx in x.min(iw)..x.saturating_add(w).min(iw) {
            img.put_pixel(xx, yy, Rgba(c));
        }
    }
}

fn fill_ellipse(img: &mut RgbaImage, cx: f32, cy: f32, rx: f32, ry: f32, c: [u8; 4]) {
    let (w, h) = img.dimensions();
    for y in 0..h {
        for x in 0..w {
            let dx = (x as f32 - cx) / rx;
            let dy = (y as f32 - cy) / ry;
            if dx * dx + dy * dy <= 1.0 {
                img.put_pixel(x, y, Rgba(c));
            }
        }
    }
}

fn opaque(rng: &mut impl Rng) -> [u8; 4] {
    [rng.r#gen(), rng.r#gen(), rng.r#gen(), 255]
}

/// Opaque blocks of varied size.
fn blocks(out: &Path, rng: &mut impl Rng) -> anyhow::Result<()> {
    fs::create_dir_all(out)?;
    for i in 0..60u32 {
        let (w, h) = (rng.gen_range(12..=96), rng.gen_range(12..=96));
        let img = RgbaImage::from_pixel(w, h, Rgba(opaque(rng)));
        img.save(out.join(format!("block_{i:03}.png")))?;
    }
    Ok(())
}

/// Long thin bars; most only fit a narrow canvas when rotated.
fn bars(out: &Path, rng: &mut impl Rng) -> anyhow::Result<()> {
    fs::create_dir_all(out)?;
    for i in 0..30u32 {
        let long = rng.gen_range(64..=200);
        let thin = rng.gen_range(3..=10);
        let (w, h) = if rng.gen_bool(0.5) { (long, thin) } else { (thin, long) };
        let img = RgbaImage::from_pixel(w, h, Rgba(opaque(rng)));
        img.save(out.join(format!("bar_{i:03}.png")))?;
    }
    Ok(())
}

/// Shapes floating in transparent margins, some with a faint halo so that
/// lenient and strict trimming disagree.
fn margins(out: &Path, rng: &mut impl Rng) -> anyhow::Result<()> {
    fs::create_dir_all(out)?;
    for i in 0..40u32 {
        let (w, h) = (rng.gen_range(40..=128), rng.gen_range(40..=128));
        let mut img = RgbaImage::new(w, h);
        let bw = rng.gen_range(8..=w / 2);
        let bh = rng.gen_range(8..=h / 2);
        let x = rng.gen_range(0..=w - bw);
        let y = rng.gen_range(0..=h - bh);
        if rng.gen_bool(0.5) {
            fill_rect(&mut img, x, y, bw, bh, opaque(rng));
        } else {
            let c = opaque(rng);
            let (cx, cy) = ((x + bw / 2) as f32, (y + bh / 2) as f32);
            fill_ellipse(&mut img, cx, cy, bw as f32 / 2.0 + 3.0, bh as f32 / 2.0 + 3.0, [c[0], c[1], c[2], 1]);
            fill_ellipse(&mut img, cx, cy, bw as f32 / 2.0, bh as f32 / 2.0, c);
        }
        img.save(out.join(format!("margin_{i:03}.png")))?;
    }
    Ok(())
}

/// A few distinct icons, each saved under several names.
fn copies(out: &Path, rng: &mut impl Rng) -> anyhow::Result<()> {
    fs::create_dir_all(out)?;
    let sizes = [16, 24, 32, 48];
    for i in 0..6u32 {
        let s = *sizes.choose(rng).unwrap_or(&32);
        let mut img = RgbaImage::new(s, s);
        fill_ellipse(&mut img, s as f32 / 2.0, s as f32 / 2.0, s as f32 / 2.0, s as f32 / 3.0, opaque(rng));
        for copy in 0..rng.gen_range(2..=4u32) {
            img.save(out.join(format!("icon_{i}_{copy}.png")))?;
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let out_root = std::env::args()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| "assets/sprites".into());

    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5EED_5EED);
    blocks(&out_root.join("blocks"), &mut rng)?;
    bars(&out_root.join("bars"), &mut rng)?;
    margins(&out_root.join("margins"), &mut rng)?;
    copies(&out_root.join("copies"), &mut rng)?;

    println!("Generated sprites under {}", out_root.display());
    Ok(())
}
