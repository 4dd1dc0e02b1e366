//! Builds drum records from scratch.
//!
//! Every function here takes its random source explicitly. The source
//! must be cryptographically strong because identifiers and scan hashes
//! are drawn from it; a seeded `StdRng` satisfies that and keeps tests
//! reproducible.

use std::convert::TryFrom;

use rand::{CryptoRng, Rng};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};
use uuid::Builder;

use crate::drum::{
    DrumRecord, LocationData, TamperStatus, BATCH_CODE_PREFIX, DRUM_ID_PREFIX, MAX_SEAL_DELAY,
    MAX_WEIGHT, MIN_WEIGHT, USER_ID_PREFIX,
};

/// The earliest possible pour date.
pub const POUR_EPOCH: OffsetDateTime = datetime!(2025-01-01 0:00 UTC);

pub const SEALED_PROBABILITY: f64 = 0.8;

pub const UPLOADED_PROBABILITY: f64 = 0.7;

const SCAN_HASH_BYTES: usize = 32;

/// Synthesizes a single record, poured at some point between
/// [`POUR_EPOCH`] and `now`.
pub fn synthesize<R>(rng: &mut R, now: OffsetDateTime) -> DrumRecord
where
    R: Rng + CryptoRng + ?Sized,
{
    let span = i64::try_from((now - POUR_EPOCH).whole_milliseconds()).unwrap_or(i64::MAX);
    let poured_after = if span > 0 { rng.gen_range(0..=span) } else { 0 };
    let sealed_after = poured_after + rng.gen_range(0..=MAX_SEAL_DELAY.whole_milliseconds() as i64);

    DrumRecord {
        drum_id: prefixed_id(rng, DRUM_ID_PREFIX),
        batch_code: prefixed_id(rng, BATCH_CODE_PREFIX),
        weight: sample_weight(rng),
        pour_date: whole_seconds_after_epoch(poured_after),
        tamper_seal: whole_seconds_after_epoch(sealed_after),
        tamper_status: sample_tamper_status(rng),
        location: sample_location(rng),
        facial_recognition_scan_hash: sample_scan_hash(rng),
    }
}

/// Synthesizes `count` independent records.
pub fn synthesize_many<R>(rng: &mut R, now: OffsetDateTime, count: usize) -> Vec<DrumRecord>
where
    R: Rng + CryptoRng + ?Sized,
{
    let mut records = Vec::with_capacity(count);

    for _ in 0..count {
        records.push(synthesize(rng, now));
    }

    records
}

/// Draws a weight uniformly from the two-decimal values in
/// `[MIN_WEIGHT, MAX_WEIGHT)`.
pub(crate) fn sample_weight<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let hundredths = rng.gen_range(hundredths(MIN_WEIGHT)..hundredths(MAX_WEIGHT));

    hundredths as f64 / 100.0
}

pub(crate) fn sample_tamper_status<R: Rng + ?Sized>(rng: &mut R) -> TamperStatus {
    if rng.gen_bool(SEALED_PROBABILITY) {
        TamperStatus::Sealed
    } else {
        TamperStatus::Tampered
    }
}

/// The uploader is always fresh, whether or not the location was
/// uploaded.
pub(crate) fn sample_location<R>(rng: &mut R) -> LocationData
where
    R: Rng + CryptoRng + ?Sized,
{
    LocationData {
        is_uploaded: rng.gen_bool(UPLOADED_PROBABILITY),
        uploader_user_id: prefixed_id(rng, USER_ID_PREFIX),
    }
}

pub(crate) fn sample_scan_hash<R>(rng: &mut R) -> String
where
    R: Rng + CryptoRng + ?Sized,
{
    let mut bytes = [0u8; SCAN_HASH_BYTES];
    rng.fill(&mut bytes[..]);

    hex::encode(bytes)
}

fn prefixed_id<R>(rng: &mut R, prefix: &str) -> String
where
    R: Rng + CryptoRng + ?Sized,
{
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes[..]);

    format!("{}{}", prefix, Builder::from_random_bytes(bytes).into_uuid())
}

fn hundredths(value: f64) -> u32 {
    (value * 100.0).round() as u32
}

fn whole_seconds_after_epoch(milliseconds: i64) -> OffsetDateTime {
    POUR_EPOCH + Duration::seconds(milliseconds.div_euclid(1000))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use time::macros::datetime;
    use time::OffsetDateTime;

    use super::{synthesize, synthesize_many, POUR_EPOCH};
    use crate::drum::{TamperStatus, MAX_SEAL_DELAY, TIMEZONE_UTC_OFFSET};

    const NOW: OffsetDateTime = datetime!(2026-10-19 12:00 UTC);

    #[test]
    fn synthesized_records_hold_invariants() {
        let mut rng = StdRng::seed_from_u64(7);

        for n in &[1, 2, 17, 250] {
            let records = synthesize_many(&mut rng, NOW, *n);
            assert_eq!(records.len(), *n);

            for record in &records {
                record
                    .validate()
                    .unwrap_or_else(|e| panic!("{:?} is invalid: {}", record, e));
                assert_eq!(record.unit_of_measurement(), "kg");
                assert!(record.pour_date() >= POUR_EPOCH);
                assert!(record.pour_date() <= NOW);
                assert!(record.tamper_seal() >= record.pour_date());
                assert!(record.tamper_seal() - record.pour_date() <= MAX_SEAL_DELAY);
            }
        }
    }

    #[test]
    fn drum_ids_are_unique() {
        let mut rng = StdRng::seed_from_u64(11);
        let records = synthesize_many(&mut rng, NOW, 100);

        let ids = records.iter().map(|r| r.drum_id()).collect::<HashSet<_>>();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn identifiers_look_like_uuids() {
        let mut rng = StdRng::seed_from_u64(13);
        let record = synthesize(&mut rng, NOW);

        for (value, prefix) in &[
            (record.drum_id(), "drum-"),
            (record.batch_code(), "batch-"),
            (record.location().uploader_user_id(), "user-"),
        ] {
            let uuid = uuid::Uuid::parse_str(&value[prefix.len()..]).expect("parse UUID suffix");
            assert_eq!(uuid.get_version_num(), 4);
        }
    }

    #[test]
    fn same_seed_gives_same_records() {
        let first = synthesize_many(&mut StdRng::seed_from_u64(3), NOW, 20);
        let second = synthesize_many(&mut StdRng::seed_from_u64(3), NOW, 20);

        assert_eq!(first, second);
    }

    #[test]
    fn clock_before_epoch_pours_at_epoch() {
        let mut rng = StdRng::seed_from_u64(5);
        let record = synthesize(&mut rng, datetime!(2024-06-01 0:00 UTC));

        assert_eq!(record.pour_date(), POUR_EPOCH);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn distributions_are_roughly_right() {
        let mut rng = StdRng::seed_from_u64(17);
        let records = synthesize_many(&mut rng, NOW, 4000);

        let sealed = records
            .iter()
            .filter(|r| r.tamper_status() == TamperStatus::Sealed)
            .count() as f64
            / 4000.0;
        let uploaded = records
            .iter()
            .filter(|r| r.location().is_uploaded())
            .count() as f64
            / 4000.0;
        let mean_weight = records.iter().map(|r| r.weight()).sum::<f64>() / 4000.0;

        assert!((sealed - 0.8).abs() < 0.05, "sealed share {}", sealed);
        assert!((uploaded - 0.7).abs() < 0.05, "uploaded share {}", uploaded);
        assert!((mean_weight - 30.0).abs() < 1.5, "mean weight {}", mean_weight);
    }

    #[test]
    fn offset_is_a_label() {
        let mut rng = StdRng::seed_from_u64(19);
        let record = synthesize(&mut rng, NOW);
        let value = serde_json::to_value(&record).expect("serialize record");

        assert_eq!(value["pourDateTimestampTimezoneUTCOffset"], TIMEZONE_UTC_OFFSET);
        assert_eq!(value["pourDateTimestampHour"], record.pour_date().hour());
    }
}
