use std::mem;
use std::sync::Mutex;

use rand::{CryptoRng, Rng};
use time::OffsetDateTime;

use crate::drum::DrumRecord;
use crate::errors::BackendError;
use crate::mutation::evolve;
use crate::synthesis::synthesize_many;

/// Holds the current snapshot for the lifetime of the process.
///
/// A single lock covers reading the snapshot, evolving it and storing
/// the result, so concurrent requests see one generation after another.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    records: Mutex<Vec<DrumRecord>>,
}

/// The outcome of advancing the snapshot.
#[derive(Debug)]
pub struct Advanced {
    /// How many records were stored before this generation.
    pub previous_len: usize,

    /// The records now stored.
    pub records: Vec<DrumRecord>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored snapshot with one of exactly `target` records.
    /// An empty store is filled with fresh records; otherwise the stored
    /// records are evolved.
    pub fn advance<R>(
        &self,
        rng: &mut R,
        now: OffsetDateTime,
        target: usize,
    ) -> Result<Advanced, BackendError>
    where
        R: Rng + CryptoRng + ?Sized,
    {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| BackendError::SnapshotPoisoned)?;

        let current = mem::take(&mut *guard);
        let previous_len = current.len();

        let records = if current.is_empty() {
            synthesize_many(rng, now, target)
        } else {
            evolve(rng, now, current, target)
        };

        *guard = records.clone();

        Ok(Advanced {
            previous_len,
            records,
        })
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> Result<usize, BackendError> {
        self.records
            .lock()
            .map(|records| records.len())
            .map_err(|_| BackendError::SnapshotPoisoned)
    }

    pub fn is_empty(&self) -> Result<bool, BackendError> {
        self.len().map(|len| len == 0)
    }

    /// Drops every stored record. This also recovers a lock poisoned by
    /// an earlier failure, since an empty snapshot is always valid.
    pub fn reset(&self) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();

        self.records.clear_poison();
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use time::macros::datetime;
    use time::OffsetDateTime;

    use super::SnapshotStore;
    use crate::errors::BackendError;

    const NOW: OffsetDateTime = datetime!(2026-10-19 12:00 UTC);

    #[test]
    fn first_generation_synthesizes() {
        let store = SnapshotStore::new();
        let mut rng = StdRng::seed_from_u64(1);

        let advanced = store.advance(&mut rng, NOW, 10).expect("advance snapshot");

        assert_eq!(advanced.previous_len, 0);
        assert_eq!(advanced.records.len(), 10);
        assert_eq!(store.len().expect("count records"), 10);
    }

    #[test]
    fn later_generations_evolve_the_stored_records() {
        let store = SnapshotStore::new();
        let mut rng = StdRng::seed_from_u64(2);

        let first = store.advance(&mut rng, NOW, 10).expect("advance snapshot");
        let second = store.advance(&mut rng, NOW, 10).expect("advance snapshot");

        assert_eq!(second.previous_len, 10);

        let first_ids = first.records.iter().map(|r| r.drum_id()).collect::<Vec<_>>();
        let second_ids = second.records.iter().map(|r| r.drum_id()).collect::<Vec<_>>();
        assert_eq!(first_ids, second_ids);

        let third = store.advance(&mut rng, NOW, 4).expect("advance snapshot");
        assert_eq!(third.previous_len, 10);
        assert_eq!(store.len().expect("count records"), 4);
        assert!(third
            .records
            .iter()
            .all(|r| second_ids.contains(&r.drum_id())));
    }

    #[test]
    fn reset_starts_over() {
        let store = SnapshotStore::new();
        let mut rng = StdRng::seed_from_u64(3);

        let first = store.advance(&mut rng, NOW, 6).expect("advance snapshot");
        store.reset();
        assert!(store.is_empty().expect("check emptiness"));

        let second = store.advance(&mut rng, NOW, 6).expect("advance snapshot");
        assert_eq!(second.previous_len, 0);
        assert!(second
            .records
            .iter()
            .all(|r| first.records.iter().all(|f| f.drum_id() != r.drum_id())));
    }

    #[test]
    fn poisoned_store_fails_until_reset() {
        let store = SnapshotStore::new();
        let mut rng = StdRng::seed_from_u64(4);

        let _ = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = store.records.lock().expect("lock records");
            panic!("generation blew up");
        }));

        assert!(matches!(
            store.advance(&mut rng, NOW, 3),
            Err(BackendError::SnapshotPoisoned)
        ));
        assert!(matches!(store.len(), Err(BackendError::SnapshotPoisoned)));

        store.reset();

        assert_eq!(store.advance(&mut rng, NOW, 3).expect("advance snapshot").records.len(), 3);
    }
}
