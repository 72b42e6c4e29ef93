//! Perceptual fingerprints for near-duplicate background detection.
//!
//! Backgrounds are reduced to a 64-bit mean-threshold hash: downsample to an
//! 8x8 grid, convert to greyscale, and set one bit per cell that is brighter
//! than the grid mean. Hamming similarity between two hashes approximates
//! visual similarity well enough to reject template-looking repeats. This is
//! a near-duplicate guard, not a cryptographic hash.

use image::imageops::FilterType;
use image::RgbaImage;
use tokio::sync::Mutex;
use tracing::warn;

/// Grid edge for the downsampled fingerprint.
const GRID: u32 = 8;

/// Default similarity above which a background counts as a duplicate.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Compute the 64-bit perceptual fingerprint of an image.
///
/// Deterministic given identical pixel input.
pub fn fingerprint(image: &RgbaImage) -> u64 {
    let small = image::imageops::resize(image, GRID, GRID, FilterType::Triangle);
    let grey = image::imageops::grayscale(&small);

    let pixels: Vec<u8> = grey.pixels().map(|p| p.0[0]).collect();
    let mean = pixels.iter().map(|&p| p as u32).sum::<u32>() / pixels.len() as u32;

    let mut bits = 0u64;
    for (i, &p) in pixels.iter().enumerate() {
        if p as u32 > mean {
            bits |= 1 << i;
        }
    }
    bits
}

/// Fraction of matching bits between two fingerprints (1.0 = identical).
pub fn similarity(a: u64, b: u64) -> f64 {
    let matching = 64 - (a ^ b).count_ones();
    matching as f64 / 64.0
}

/// Outcome of a ledger acceptance check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AcceptOutcome {
    /// The background was unique and has been recorded.
    Accepted,
    /// Too similar to a previously accepted background.
    Rejected { similarity: f64 },
    /// Recorded despite similarity because the retry budget was exhausted.
    AcceptedExhausted { similarity: f64 },
}

impl AcceptOutcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, AcceptOutcome::Rejected { .. })
    }
}

/// Shared ledger of fingerprints accepted within one job.
///
/// Uniqueness correctness depends on every worker seeing all previously
/// accepted backgrounds, so the check and the append happen as one critical
/// section under a single lock. Two workers can otherwise both decide a
/// mutually-similar pair is unique.
#[derive(Debug)]
pub struct UniquenessLedger {
    accepted: Mutex<Vec<u64>>,
    threshold: f64,
}

impl Default for UniquenessLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl UniquenessLedger {
    /// Ledger with the default similarity threshold.
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_SIMILARITY_THRESHOLD)
    }

    /// Ledger with a custom similarity threshold.
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            accepted: Mutex::new(Vec::new()),
            threshold,
        }
    }

    /// Atomically check a candidate against every accepted fingerprint and
    /// record it when unique. With `force`, the candidate is recorded even
    /// when similar (used once the retry budget is exhausted).
    pub async fn try_accept(&self, candidate: u64, force: bool) -> AcceptOutcome {
        let mut accepted = self.accepted.lock().await;

        let worst = accepted
            .iter()
            .map(|&prior| similarity(candidate, prior))
            .fold(0.0f64, f64::max);

        if worst > self.threshold {
            if !force {
                return AcceptOutcome::Rejected { similarity: worst };
            }
            warn!(
                similarity = worst,
                threshold = self.threshold,
                "Accepting near-duplicate background after exhausted retries"
            );
            accepted.push(candidate);
            return AcceptOutcome::AcceptedExhausted { similarity: worst };
        }

        accepted.push(candidate);
        AcceptOutcome::Accepted
    }

    /// Number of accepted fingerprints.
    pub async fn len(&self) -> usize {
        self.accepted.lock().await.len()
    }

    /// Whether the ledger is empty.
    pub async fn is_empty(&self) -> bool {
        self.accepted.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(64, 64, Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    fn gradient() -> RgbaImage {
        RgbaImage::from_fn(64, 64, |_, y| {
            let v = (y * 4) as u8;
            Rgba([v, v, v, 255])
        })
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let img = gradient();
        assert_eq!(fingerprint(&img), fingerprint(&img));
    }

    #[test]
    fn test_similarity_identical() {
        let fp = fingerprint(&gradient());
        assert_eq!(similarity(fp, fp), 1.0);
    }

    #[test]
    fn test_similarity_inverted() {
        let fp = fingerprint(&gradient());
        assert_eq!(similarity(fp, !fp), 0.0);
    }

    #[tokio::test]
    async fn test_ledger_accepts_distinct() {
        let ledger = UniquenessLedger::new();
        let a = fingerprint(&gradient());
        let b = !a;
        assert_eq!(ledger.try_accept(a, false).await, AcceptOutcome::Accepted);
        assert_eq!(ledger.try_accept(b, false).await, AcceptOutcome::Accepted);
        assert_eq!(ledger.len().await, 2);
    }

    #[tokio::test]
    async fn test_ledger_rejects_duplicate() {
        let ledger = UniquenessLedger::new();
        let fp = fingerprint(&solid([200, 200, 200]));
        ledger.try_accept(fp, false).await;
        let outcome = ledger.try_accept(fp, false).await;
        assert!(matches!(outcome, AcceptOutcome::Rejected { .. }));
        // Rejected candidates are not recorded
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_ledger_force_accept_records() {
        let ledger = UniquenessLedger::new();
        let fp = fingerprint(&solid([10, 10, 10]));
        ledger.try_accept(fp, false).await;
        let outcome = ledger.try_accept(fp, true).await;
        assert!(matches!(outcome, AcceptOutcome::AcceptedExhausted { .. }));
        assert_eq!(ledger.len().await, 2);
    }
}
