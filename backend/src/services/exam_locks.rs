//! Per-exam serialization of allocation runs.
//!
//! Two runs for the same exam must not interleave their read and replace
//! phases; runs for different exams hold different mutexes and proceed in
//! parallel.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::api::ExamId;

/// Registry of one async mutex per exam currently in use.
#[derive(Clone, Default)]
pub struct ExamLocks {
    locks: Arc<Mutex<HashMap<ExamId, Arc<AsyncMutex<()>>>>>,
}

/// Held for the duration of one exam's allocation run.
pub struct ExamGuard {
    exam: ExamId,
    registry: ExamLocks,
    _guard: OwnedMutexGuard<()>,
}

impl ExamLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other run holds `exam`, then hold it.
    pub async fn acquire(&self, exam: ExamId) -> ExamGuard {
        let lock = self.locks.lock().entry(exam).or_default().clone();
        let guard = lock.lock_owned().await;
        ExamGuard {
            exam,
            registry: self.clone(),
            _guard: guard,
        }
    }

    /// Number of exams with a holder or waiter.
    pub fn tracked(&self) -> usize {
        self.locks.lock().len()
    }
}

impl ExamGuard {
    pub fn exam(&self) -> ExamId {
        self.exam
    }
}

impl Drop for ExamGuard {
    fn drop(&mut self) {
        let mut locks = self.registry.locks.lock();
        // Map entry + this guard's own handle: nobody else is waiting
        if locks
            .get(&self.exam)
            .is_some_and(|lock| Arc::strong_count(lock) <= 2)
        {
            locks.remove(&self.exam);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_exam_is_serialized() {
        let locks = ExamLocks::new();
        let guard = locks.acquire(ExamId::new(1)).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(ExamId::new(1)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn test_different_exams_do_not_block() {
        let locks = ExamLocks::new();
        let _first = locks.acquire(ExamId::new(1)).await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire(ExamId::new(2)))
            .await
            .expect("second exam must not wait on the first");
        assert_eq!(second.exam(), ExamId::new(2));
        assert_eq!(locks.tracked(), 2);
    }
}
