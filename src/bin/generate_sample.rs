use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};

const OUTPUT_DIR: &str = "sample_particles";
const IMAGE_SIZE: u32 = 96;

/// Label codes with the grey level used to shade the placeholder grain.
const LABELS: &[(&str, u8)] = &[
    ("PG", 220),
    ("PX", 90),
    ("AMF", 70),
    ("OL", 150),
    ("JJtrlcp", 230),
    ("JJblmcb", 40),
    ("JHtrhcmhv", 200),
    ("AHblmch", 60),
    ("AHa", 120),
    ("AWtr", 140),
    ("LLblhcn", 50),
    ("LJtrlcf", 210),
];

const GRAIN_SIZES: &[&str] = &["phi0phi1", "phi1phi2", "phi2phi3", "morephi0"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }
}

/// Irregular grain on a dark background.
fn grain_image(shade: u8, rng: &mut SimpleRng) -> RgbImage {
    let centre = IMAGE_SIZE as f32 / 2.0;
    let radius = centre * (0.5 + 0.35 * rng.next_f32());
    let lobes = 3.0 + rng.below(4) as f32;
    let phase = rng.next_f32() * std::f32::consts::TAU;

    RgbImage::from_fn(IMAGE_SIZE, IMAGE_SIZE, |x, y| {
        let dx = x as f32 - centre;
        let dy = y as f32 - centre;
        let angle = dy.atan2(dx);
        let edge = radius * (1.0 + 0.15 * (lobes * angle + phase).sin());
        if (dx * dx + dy * dy).sqrt() <= edge {
            Rgb([shade, shade.saturating_sub(10), shade.saturating_sub(25)])
        } else {
            Rgb([12, 12, 16])
        }
    })
}

fn save(dir: &Path, name: &str, img: &RgbImage) -> Result<()> {
    let path = dir.join(name);
    img.save(&path)
        .with_context(|| format!("writing {}", path.display()))
}

fn main() -> Result<()> {
    let dir = Path::new(OUTPUT_DIR);
    fs::create_dir_all(dir).context("creating output folder")?;

    let mut rng = SimpleRng::new(42);
    let mut written = 0;

    for afe in ["AFE01", "AFE02"] {
        for sample in 1..=2 {
            for (particle, &(label, shade)) in LABELS.iter().enumerate() {
                let grain = GRAIN_SIZES[rng.below(GRAIN_SIZES.len())];
                let magnification = ["5X", "10X"][rng.below(2)];
                let img = grain_image(shade, &mut rng);

                if rng.below(3) == 0 {
                    // Multi-focus stack: several frames of the same particle.
                    let stem = format!("{afe}_{sample}_1_{particle}_m1_{magnification}_{grain}_{label}");
                    for frame in 1..=3 {
                        save(dir, &format!("{stem}-{frame}.png"), &img)?;
                        written += 1;
                    }
                } else {
                    let index = 1 + rng.below(9);
                    let stem = format!("{afe}_{sample}_1_{particle}_b{index}_{magnification}_{grain}_{label}");
                    save(dir, &format!("{stem}.png"), &img)?;
                    written += 1;
                }
            }
        }
    }

    // Names that break the convention, to exercise the rejection list.
    let img = grain_image(128, &mut rng);
    for bad in [
        "AFE01_1_1_99_b1_5X_phi0phi1.png",
        "AFE01_1_1_98_b1_5X_phi01_PG.png",
        "AFE01_1_1_97_b_5X_phi0phi1_PG.png",
    ] {
        save(dir, bad, &img)?;
        written += 1;
    }

    println!("Wrote {written} particle images to {OUTPUT_DIR}/");
    Ok(())
}
