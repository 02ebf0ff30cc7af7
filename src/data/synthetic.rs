// ============================================================
// Layer 4 — Synthetic Digit Source
// ============================================================
// Generates seven-segment style digits so the whole pipeline
// runs without network access:
//
//      aaaa
//     f    b
//     f    b
//      gggg
//     e    c
//     e    c
//      dddd
//
// Each sample gets a random offset, random stroke intensity
// and sparse background noise, so the classes are separable
// but not identical copies. Labels cycle 0..9 for balance.
//
// Same seed → same dataset, same split.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::data::splitter::split_train_val;
use crate::domain::digit::{DigitSplits, RawDigit, IMAGE_PIXELS, IMAGE_SIDE, NUM_CLASSES};
use crate::domain::error::DigitResult;
use crate::domain::traits::DigitSource;

/// Segment rectangles as (row_start, row_end, col_start, col_end), exclusive ends.
const SEGMENTS: [(usize, usize, usize, usize); 7] = [
    (4, 6, 8, 20),    // a: top
    (4, 14, 18, 20),  // b: upper right
    (14, 24, 18, 20), // c: lower right
    (22, 24, 8, 20),  // d: bottom
    (14, 24, 8, 10),  // e: lower left
    (4, 14, 8, 10),   // f: upper left
    (13, 15, 8, 20),  // g: middle
];

/// Lit segments per digit, indexing SEGMENTS as a..g.
const DIGIT_SEGMENTS: [&[usize]; NUM_CLASSES] = [
    &[0, 1, 2, 3, 4, 5],    // 0
    &[1, 2],                // 1
    &[0, 1, 3, 4, 6],       // 2
    &[0, 1, 2, 3, 6],       // 3
    &[1, 2, 5, 6],          // 4
    &[0, 2, 3, 5, 6],       // 5
    &[0, 2, 3, 4, 5, 6],    // 6
    &[0, 1, 2],             // 7
    &[0, 1, 2, 3, 4, 5, 6], // 8
    &[0, 1, 2, 3, 5, 6],    // 9
];

const MAX_SHIFT: i64 = 3;
const TRAIN_FRACTION: f64 = 0.8;

pub struct SyntheticDigits {
    count: usize,
    seed:  u64,
}

impl SyntheticDigits {
    pub fn new(count: usize, seed: u64) -> Self {
        Self { count, seed }
    }

    fn render(label: u8, rng: &mut StdRng) -> RawDigit {
        let mut pixels = vec![0u8; IMAGE_PIXELS];

        // Sparse background noise
        for p in pixels.iter_mut() {
            if rng.gen_bool(0.05) {
                *p = rng.gen_range(0..40);
            }
        }

        let dx        = rng.gen_range(-MAX_SHIFT..=MAX_SHIFT);
        let dy        = rng.gen_range(-MAX_SHIFT..=MAX_SHIFT);
        let intensity = rng.gen_range(180..=255u8);

        for &segment in DIGIT_SEGMENTS[label as usize] {
            let (r0, r1, c0, c1) = SEGMENTS[segment];
            for row in r0..r1 {
                for col in c0..c1 {
                    let y = row as i64 + dy;
                    let x = col as i64 + dx;
                    if (0..IMAGE_SIDE as i64).contains(&y) && (0..IMAGE_SIDE as i64).contains(&x) {
                        pixels[y as usize * IMAGE_SIDE + x as usize] = intensity;
                    }
                }
            }
        }

        RawDigit::new(pixels, label)
    }
}

impl DigitSource for SyntheticDigits {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn load(&self) -> DigitResult<DigitSplits> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let samples: Vec<RawDigit> = (0..self.count)
            .map(|i| Self::render((i % NUM_CLASSES) as u8, &mut rng))
            .collect();

        let (train, test) = split_train_val(samples, TRAIN_FRACTION, &mut rng);
        tracing::info!(
            "Generated {} synthetic digits (seed {})",
            self.count,
            self.seed,
        );
        Ok(DigitSplits::new(train, test))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes() {
        let splits = SyntheticDigits::new(100, 7).load().unwrap();
        assert_eq!(splits.train.len(), 80);
        assert_eq!(splits.test.len(), 20);
        assert!(splits.train.iter().all(|d| d.pixels.len() == IMAGE_PIXELS));
    }

    #[test]
    fn test_deterministic_for_seed() {
        let a = SyntheticDigits::new(40, 3).load().unwrap();
        let b = SyntheticDigits::new(40, 3).load().unwrap();
        assert_eq!(a.train, b.train);
        assert_eq!(a.test, b.test);
    }

    #[test]
    fn test_every_label_present() {
        let splits = SyntheticDigits::new(50, 1).load().unwrap();
        for label in 0..NUM_CLASSES as u8 {
            assert!(splits.train.iter().chain(&splits.test).any(|d| d.label == label));
        }
    }

    #[test]
    fn test_eight_lights_more_than_one() {
        let mut rng = StdRng::seed_from_u64(0);
        let lit = |d: &RawDigit| d.pixels.iter().filter(|&&p| p >= 180).count();
        let one   = SyntheticDigits::render(1, &mut rng);
        let eight = SyntheticDigits::render(8, &mut rng);
        assert!(lit(&eight) > lit(&one));
    }
}
