//! Evolves a snapshot into the next one a polling consumer sees.

use rand::seq::index;
use rand::{CryptoRng, Rng};
use time::OffsetDateTime;

use crate::drum::DrumRecord;
use crate::synthesis::{
    sample_location, sample_scan_hash, sample_tamper_status, sample_weight, synthesize,
};

/// How much of a snapshot changes between polls, and how.
///
/// Probabilities outside `[0, 1]` behave as if clamped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerturbPolicy {
    /// Smallest share of the snapshot picked for edits, inclusive.
    pub min_update_fraction: f64,

    /// Largest share of the snapshot picked for edits, exclusive.
    pub max_update_fraction: f64,

    pub weight_probability: f64,
    pub tamper_status_probability: f64,
    pub location_probability: f64,
    pub scan_hash_probability: f64,
}

impl Default for PerturbPolicy {
    fn default() -> Self {
        PerturbPolicy {
            min_update_fraction: 0.1,
            max_update_fraction: 0.3,
            weight_probability: 0.5,
            tamper_status_probability: 0.3,
            location_probability: 0.4,
            scan_hash_probability: 0.2,
        }
    }
}

/// Derives the next snapshot from `current` with the default policy.
/// See [`evolve_with`].
pub fn evolve<R>(
    rng: &mut R,
    now: OffsetDateTime,
    current: Vec<DrumRecord>,
    target: usize,
) -> Vec<DrumRecord>
where
    R: Rng + CryptoRng + ?Sized,
{
    evolve_with(rng, now, current, target, &PerturbPolicy::default())
}

/// Derives the next snapshot from `current`: drops random records until
/// at most `target` remain, appends fresh ones until exactly `target`
/// exist, then edits fields of a random share of the result in place.
///
/// The returned vector always has exactly `target` records. Surviving
/// records keep their `drum_id` and `batch_code`.
pub fn evolve_with<R>(
    rng: &mut R,
    now: OffsetDateTime,
    current: Vec<DrumRecord>,
    target: usize,
    policy: &PerturbPolicy,
) -> Vec<DrumRecord>
where
    R: Rng + CryptoRng + ?Sized,
{
    let mut records = current;

    shrink(rng, &mut records, target);
    grow(rng, now, &mut records, target);
    perturb(rng, &mut records, policy);

    records
}

/// Keeps a uniformly chosen `target` records in their original order.
fn shrink<R: Rng + ?Sized>(rng: &mut R, records: &mut Vec<DrumRecord>, target: usize) {
    if records.len() <= target {
        return;
    }

    let mut keep = vec![false; records.len()];
    for position in index::sample(rng, records.len(), target) {
        keep[position] = true;
    }

    let mut keep = keep.into_iter();
    records.retain(|_| keep.next().unwrap_or(false));
}

fn grow<R>(rng: &mut R, now: OffsetDateTime, records: &mut Vec<DrumRecord>, target: usize)
where
    R: Rng + CryptoRng + ?Sized,
{
    records.reserve(target.saturating_sub(records.len()));

    while records.len() < target {
        records.push(synthesize(rng, now));
    }
}

fn perturb<R>(rng: &mut R, records: &mut [DrumRecord], policy: &PerturbPolicy)
where
    R: Rng + CryptoRng + ?Sized,
{
    if records.is_empty() {
        return;
    }

    let spread = (policy.max_update_fraction - policy.min_update_fraction).max(0.0);
    let fraction = policy.min_update_fraction + rng.gen::<f64>() * spread;
    let update_count = (records.len() as f64 * fraction).floor().max(0.0) as usize;

    // positions are drawn with replacement, so a record may be edited twice
    for _ in 0..update_count {
        let index = rng.gen_range(0..records.len());
        perturb_record(rng, &mut records[index], policy);
    }
}

/// Each field group is rolled independently and always resampled as a
/// whole.
fn perturb_record<R>(rng: &mut R, record: &mut DrumRecord, policy: &PerturbPolicy)
where
    R: Rng + CryptoRng + ?Sized,
{
    if chance(rng, policy.weight_probability) {
        record.weight = sample_weight(rng);
    }

    if chance(rng, policy.tamper_status_probability) {
        record.tamper_status = sample_tamper_status(rng);
    }

    if chance(rng, policy.location_probability) {
        record.location = sample_location(rng);
    }

    if chance(rng, policy.scan_hash_probability) {
        record.facial_recognition_scan_hash = sample_scan_hash(rng);
    }
}

fn chance<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    rng.gen::<f64>() < probability
}
