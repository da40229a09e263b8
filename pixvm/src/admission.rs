use std::sync::{
    Arc,
    atomic::{
        AtomicU64, AtomicUsize,
        Ordering::{AcqRel, Acquire, Release},
    },
};

use crate::{AdmissionError, Anchor};

/// Gatekeeper for new executors.
///
/// Admission needs both a free anchor (one running bit per grid cell) and a
/// free slot under the global ceiling, checked in that order. A granted
/// admission is an [`ExecutorGuard`] that gives both back when dropped.
#[derive(Debug)]
pub struct Admission {
    width: u32,
    height: u32,
    running: Box<[AtomicU64]>,
    active: AtomicUsize,
    max_active: usize,
}

/// Proof that an executor holds its anchor. Releases on drop, whatever way
/// the executor ends.
#[derive(Debug)]
pub struct ExecutorGuard {
    admission: Arc<Admission>,
    anchor: Anchor,
    word: usize,
    mask: u64,
}

impl Admission {
    pub fn new(width: u32, height: u32, max_active: usize) -> Self {
        let cells = width as usize * height as usize;
        let running = (0..cells.div_ceil(64)).map(|_| AtomicU64::new(0)).collect();
        Self {
            width,
            height,
            running,
            active: AtomicUsize::new(0),
            max_active,
        }
    }

    pub fn try_start(self: &Arc<Self>, anchor: Anchor) -> Result<ExecutorGuard, AdmissionError> {
        if anchor.x >= self.width || anchor.y >= self.height {
            return Err(AdmissionError::OutsideGrid);
        }
        let (word, mask) = self.bit(anchor);

        let prev = self.running[word].fetch_or(mask, AcqRel);
        if prev & mask != 0 {
            return Err(AdmissionError::AlreadyRunning);
        }

        let max = self.max_active;
        if self
            .active
            .fetch_update(AcqRel, Acquire, |n| (n < max).then_some(n + 1))
            .is_err()
        {
            // only our own bit goes back
            self.running[word].fetch_and(!mask, Release);
            return Err(AdmissionError::ConcurrencyLimitExceeded);
        }

        Ok(ExecutorGuard {
            admission: Arc::clone(self),
            anchor,
            word,
            mask,
        })
    }

    /// Executors currently admitted.
    pub fn active(&self) -> usize {
        self.active.load(Acquire)
    }

    pub fn max_active(&self) -> usize {
        self.max_active
    }

    pub fn is_running(&self, anchor: Anchor) -> bool {
        if anchor.x >= self.width || anchor.y >= self.height {
            return false;
        }
        let (word, mask) = self.bit(anchor);
        self.running[word].load(Acquire) & mask != 0
    }

    fn bit(&self, anchor: Anchor) -> (usize, u64) {
        let cell = anchor.y as usize * self.width as usize + anchor.x as usize;
        (cell / 64, 1 << (cell % 64))
    }
}

impl ExecutorGuard {
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }
}

impl Drop for ExecutorGuard {
    fn drop(&mut self) {
        self.admission.running[self.word].fetch_and(!self.mask, Release);
        self.admission.active.fetch_sub(1, AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    fn admission(max: usize) -> Arc<Admission> {
        Arc::new(Admission::new(64, 64, max))
    }

    #[test]
    fn start_marks_anchor_and_counts() {
        let a = admission(4);
        let anchor = Anchor::new(3, 9);
        let guard = a.try_start(anchor).unwrap();
        assert_eq!(guard.anchor(), anchor);
        assert!(a.is_running(anchor));
        assert!(!a.is_running(Anchor::new(4, 9)));
        assert_eq!(a.active(), 1);
    }

    #[test]
    fn second_start_on_same_anchor_is_refused() {
        let a = admission(4);
        let _g = a.try_start(Anchor::new(1, 1)).unwrap();
        assert_eq!(
            a.try_start(Anchor::new(1, 1)).unwrap_err(),
            AdmissionError::AlreadyRunning
        );
        assert_eq!(a.active(), 1);
    }

    #[test]
    fn concurrent_starts_admit_exactly_one() {
        for _ in 0..50 {
            let a = admission(100);
            let barrier = Arc::new(Barrier::new(2));
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let a = a.clone();
                    let barrier = barrier.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        a.try_start(Anchor::new(7, 7))
                    })
                })
                .collect();
            let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

            let admitted = results.iter().filter(|r| r.is_ok()).count();
            assert_eq!(admitted, 1);
            assert!(results
                .iter()
                .any(|r| matches!(r, Err(AdmissionError::AlreadyRunning))));
        }
    }

    #[test]
    fn ceiling_refuses_without_counting() {
        let a = admission(100);
        let guards: Vec<_> = (0..100)
            .map(|i| a.try_start(Anchor::new(i % 64, i / 64)).unwrap())
            .collect();
        assert_eq!(a.active(), 100);

        let extra = Anchor::new(10, 10);
        assert_eq!(
            a.try_start(extra).unwrap_err(),
            AdmissionError::ConcurrencyLimitExceeded
        );
        assert_eq!(a.active(), 100);
        // the refused anchor must not stay marked
        assert!(!a.is_running(extra));

        drop(guards);
        assert_eq!(a.active(), 0);
        assert!(a.try_start(extra).is_ok());
    }

    #[test]
    fn guard_releases_on_drop() {
        let a = admission(1);
        let anchor = Anchor::new(63, 63);
        {
            let _g = a.try_start(anchor).unwrap();
            assert_eq!(a.active(), 1);
        }
        assert_eq!(a.active(), 0);
        assert!(!a.is_running(anchor));
        assert!(a.try_start(anchor).is_ok());
    }

    #[test]
    fn guard_releases_when_thread_panics() {
        let a = admission(2);
        let anchor = Anchor::new(2, 2);
        let guard = a.try_start(anchor).unwrap();
        let h = thread::spawn(move || {
            let _guard = guard;
            panic!("executor blew up");
        });
        assert!(h.join().is_err());
        assert_eq!(a.active(), 0);
        assert!(!a.is_running(anchor));
    }

    #[test]
    fn anchors_outside_the_grid_are_refused() {
        let a = admission(2);
        assert_eq!(
            a.try_start(Anchor::new(64, 0)).unwrap_err(),
            AdmissionError::OutsideGrid
        );
        assert_eq!(a.active(), 0);
    }
}
