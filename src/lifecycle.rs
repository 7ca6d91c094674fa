//! Trained-state slot shared by the predictor and the recommender.
//!
//! The fitted state is an immutable snapshot behind an `Arc`. Readers clone
//! the `Arc` under a short read lock and keep working on it even if a
//! retrain swaps in a new snapshot meanwhile. Training runs are serialized by
//! a separate mutex, so at most one is in flight per slot and the write lock
//! is only held for the pointer swap.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

/// Externally visible training state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Untrained,
    Training,
    Trained,
}

pub struct ModelSlot<T> {
    current: RwLock<Option<Arc<T>>>,
    training: Mutex<()>,
}

impl<T> Default for ModelSlot<T> {
    fn default() -> Self {
        Self {
            current: RwLock::new(None),
            training: Mutex::new(()),
        }
    }
}

impl<T> ModelSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The installed snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<T>> {
        self.current.read().clone()
    }

    pub fn is_trained(&self) -> bool {
        self.current.read().is_some()
    }

    /// `Training` while a run is in flight, even if an older snapshot is
    /// still being served.
    pub fn state(&self) -> LifecycleState {
        if self.training.is_locked() {
            LifecycleState::Training
        } else if self.is_trained() {
            LifecycleState::Trained
        } else {
            LifecycleState::Untrained
        }
    }

    /// Run `train` and install its result. On error the previous snapshot,
    /// if any, stays in place.
    pub fn retrain<E, F>(&self, train: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let _guard = self.training.lock();
        Ok(self.install(train()?))
    }

    /// Return the installed snapshot, training first if there is none.
    ///
    /// Concurrent callers that find the slot empty wait for a single run
    /// instead of each starting their own.
    pub fn get_or_train<E, F>(&self, train: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(current) = self.snapshot() {
            return Ok(current);
        }
        let _guard = self.training.lock();
        // Another caller may have finished while we waited.
        if let Some(current) = self.snapshot() {
            return Ok(current);
        }
        Ok(self.install(train()?))
    }

    fn install(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        *self.current.write() = Some(Arc::clone(&value));
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_slot_starts_untrained() {
        let slot: ModelSlot<u32> = ModelSlot::new();
        assert_eq!(slot.state(), LifecycleState::Untrained);
        assert!(slot.snapshot().is_none());
    }

    #[test]
    fn test_retrain_installs_and_replaces() {
        let slot = ModelSlot::new();
        slot.retrain(|| Ok::<_, ()>(1)).unwrap();
        let first = slot.snapshot().unwrap();

        slot.retrain(|| Ok::<_, ()>(2)).unwrap();

        // Old readers keep their snapshot, new readers see the replacement.
        assert_eq!(*first, 1);
        assert_eq!(*slot.snapshot().unwrap(), 2);
        assert_eq!(slot.state(), LifecycleState::Trained);
    }

    #[test]
    fn test_failed_retrain_keeps_previous() {
        let slot = ModelSlot::new();
        slot.retrain(|| Ok::<_, &str>(7)).unwrap();

        assert_eq!(slot.retrain(|| Err::<u32, _>("boom")), Err("boom"));
        assert_eq!(*slot.snapshot().unwrap(), 7);
    }

    #[test]
    fn test_failed_first_train_stays_untrained() {
        let slot: ModelSlot<u32> = ModelSlot::new();
        assert!(slot.retrain(|| Err::<u32, _>(())).is_err());
        assert_eq!(slot.state(), LifecycleState::Untrained);
    }

    #[test]
    fn test_state_reports_training_in_flight() {
        let slot: ModelSlot<u32> = ModelSlot::new();
        let seen = slot
            .retrain(|| Ok::<_, ()>(if slot.state() == LifecycleState::Training { 1 } else { 0 }))
            .unwrap();
        assert_eq!(*seen, 1);
    }

    #[test]
    fn test_get_or_train_runs_once() {
        let slot = Arc::new(ModelSlot::<usize>::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let slot = Arc::clone(&slot);
                let runs = Arc::clone(&runs);
                thread::spawn(move || {
                    *slot
                        .get_or_train(|| {
                            runs.fetch_add(1, Ordering::SeqCst);
                            Ok::<_, ()>(99)
                        })
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 99);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
