use rand::{Rng, SeedableRng};
use spritesheet_core::config::MaxRectsHeuristic;
use spritesheet_core::packer::maxrects::MaxRectsPacker;
use std::time::Instant;

fn run(n: usize, heuristic: MaxRectsHeuristic, seed: u64) {
    let mut p = MaxRectsPacker::new(2048, 2048, true);
    let mut used_area: u64 = 0;
    let page_area: u64 = p.width() as u64 * p.height() as u64;
    let mut placed = 0usize;
    let mut rotated = 0usize;
    let mut free_sum: u64 = 0;

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let start = Instant::now();
    for _ in 0..n {
        let w: u32 = rng.gen_range(4..=96);
        let h: u32 = rng.gen_range(4..=96);
        let Some(pl) = p.insert(w, h, heuristic) else {
            break;
        };
        used_area += pl.rect.area();
        placed += 1;
        rotated += pl.rotated as usize;
        free_sum += p.free_list_len() as u64;
    }
    let elapsed = start.elapsed();
    let occ = used_area as f64 / page_area as f64;
    let avg_free = if placed > 0 {
        free_sum as f64 / placed as f64
    } else {
        0.0
    };
    println!(
        "{:?} placed={} rotated={} occ={:.2}% avg_free={:.1} time={}ms",
        heuristic,
        placed,
        rotated,
        occ * 100.0,
        avg_free,
        elapsed.as_millis()
    );
}

fn main() {
    for (n, seed) in [(1000, 1337), (5000, 4242)] {
        println!("N={n}");
        run(n, MaxRectsHeuristic::BestShortSideFit, seed);
        run(n, MaxRectsHeuristic::BestLongSideFit, seed);
        println!();
    }
}
