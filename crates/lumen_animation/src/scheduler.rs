//! Frame scheduler
//!
//! The [`AnimationScheduler`] owns the frame clock and every ticker created
//! from it. Each call to [`tick_at`](AnimationScheduler::tick_at) (or
//! [`advance`](AnimationScheduler::advance) / [`tick`](AnimationScheduler::tick))
//! is one frame: every active, unmuted ticker is called once with the time
//! since it was started.
//!
//! Tickers hold a weak [`SchedulerHandle`], so dropping the scheduler does not
//! leak them; a ticker whose scheduler is gone simply never fires.
//!
//! ```rust
//! use lumen_animation::{AnimationScheduler, TickerProvider};
//! use std::time::Duration;
//!
//! let scheduler = AnimationScheduler::new();
//! let mut ticker = scheduler.create_ticker(Box::new(|elapsed| {
//!     println!("{elapsed:?} since start");
//! }));
//! ticker.start();
//!
//! scheduler.advance(Duration::from_millis(16));
//! assert!(scheduler.has_active_tickers());
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::ticker::{Task, Ticker, TickerProvider};

new_key_type! {
    /// Handle to a ticker registered with a scheduler
    pub struct TickerId;
}

/// Scheduler-side state of one ticker
struct TickerSlot {
    callback: Rc<dyn Fn(Duration)>,
    /// Frame time of the current run's start, while active
    start_time: Option<Duration>,
    /// Elapsed time brought over from an absorbed ticker
    carried: Duration,
    muted: bool,
}

impl TickerSlot {
    fn elapsed(&self, now: Duration) -> Option<Duration> {
        self.start_time
            .map(|start| now.saturating_sub(start) + self.carried)
    }
}

/// Internal state of the scheduler
struct SchedulerInner {
    tickers: SlotMap<TickerId, TickerSlot>,
    /// Current frame time, relative to `epoch`
    now: Duration,
    epoch: Instant,
    frame_count: u64,
    reduced_motion: bool,
    /// True while tickers of a frame are being called
    dispatching: bool,
    /// Continuations queued during a frame
    deferred: VecDeque<Task>,
}

/// The frame clock that drives every [`Ticker`] created from it
pub struct AnimationScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                tickers: SlotMap::with_key(),
                now: Duration::ZERO,
                epoch: Instant::now(),
                frame_count: 0,
                reduced_motion: false,
                dispatching: false,
                deferred: VecDeque::new(),
            })),
        }
    }

    /// Get a handle to this scheduler for passing to components
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Set the accessibility flag that shortens animations
    pub fn set_reduced_motion(&self, enabled: bool) {
        self.inner.borrow_mut().reduced_motion = enabled;
    }

    /// Current frame time, measured from the scheduler's creation
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    pub fn frame_count(&self) -> u64 {
        self.inner.borrow().frame_count
    }

    /// Run a frame at the wall-clock time since the scheduler was created
    pub fn tick(&self) -> bool {
        let frame_time = self.inner.borrow().epoch.elapsed();
        self.tick_at(frame_time)
    }

    /// Run a frame `dt` after the current one
    pub fn advance(&self, dt: Duration) -> bool {
        let frame_time = self.now() + dt;
        self.tick_at(frame_time)
    }

    /// Run a frame at `frame_time`
    ///
    /// Calls every ticker that was active and unmuted when the frame began,
    /// unless an earlier callback in the same frame stopped, muted or dropped
    /// it. Completion continuations released during the frame run after the
    /// last ticker.
    ///
    /// Returns true if any tickers are still active (need another frame).
    ///
    /// # Panics
    ///
    /// Panics if called from inside a ticker callback.
    pub fn tick_at(&self, frame_time: Duration) -> bool {
        let due: SmallVec<[TickerId; 8]> = {
            let mut inner = self.inner.borrow_mut();
            assert!(
                !inner.dispatching,
                "AnimationScheduler::tick_at() called while a frame was being dispatched"
            );
            if frame_time < inner.now {
                tracing::warn!(
                    ?frame_time,
                    now = ?inner.now,
                    "frame time went backwards; keeping the previous frame time"
                );
            } else {
                inner.now = frame_time;
            }
            inner.frame_count += 1;
            inner.dispatching = true;
            inner
                .tickers
                .iter()
                .filter(|(_, slot)| slot.start_time.is_some() && !slot.muted)
                .map(|(id, _)| id)
                .collect()
        };

        if !due.is_empty() {
            tracing::debug!(
                frame = self.frame_count(),
                tickers = due.len(),
                "dispatching frame"
            );
        }

        for id in due {
            let call = {
                let inner = self.inner.borrow();
                inner.tickers.get(id).and_then(|slot| {
                    if slot.muted {
                        return None;
                    }
                    slot.elapsed(inner.now)
                        .map(|elapsed| (Rc::clone(&slot.callback), elapsed))
                })
            };
            if let Some((callback, elapsed)) = call {
                callback(elapsed);
            }
        }

        self.inner.borrow_mut().dispatching = false;
        loop {
            let next = self.inner.borrow_mut().deferred.pop_front();
            match next {
                Some(task) => task(),
                None => break,
            }
        }

        self.has_active_tickers()
    }

    /// Check if any tickers are running (muted ones included)
    pub fn has_active_tickers(&self) -> bool {
        self.inner
            .borrow()
            .tickers
            .iter()
            .any(|(_, slot)| slot.start_time.is_some())
    }

    /// Get the number of registered tickers
    pub fn ticker_count(&self) -> usize {
        self.inner.borrow().tickers.len()
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TickerProvider for AnimationScheduler {
    fn create_ticker(&self, on_tick: Box<dyn Fn(Duration)>) -> Ticker {
        self.handle().create_ticker(on_tick)
    }

    fn reduced_motion(&self) -> bool {
        self.inner.borrow().reduced_motion
    }
}

/// A weak handle to the animation scheduler
///
/// This is passed to components that need to create tickers.
/// It won't prevent the scheduler from being dropped.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<RefCell<SchedulerInner>>,
}

impl SchedulerHandle {
    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    fn with_slot<R>(&self, id: TickerId, f: impl FnOnce(&mut TickerSlot, Duration) -> R) -> Option<R> {
        let inner = self.inner.upgrade()?;
        let mut inner = inner.borrow_mut();
        let now = inner.now;
        inner.tickers.get_mut(id).map(|slot| f(slot, now))
    }

    pub(crate) fn start_ticker(&self, id: TickerId, carried: Duration) {
        let started = self.with_slot(id, |slot, now| {
            slot.start_time = Some(now);
            slot.carried = carried;
        });
        if started.is_none() {
            tracing::warn!("starting a ticker whose scheduler has been dropped; it will never fire");
        }
    }

    pub(crate) fn stop_ticker(&self, id: TickerId) {
        self.with_slot(id, |slot, _| {
            slot.start_time = None;
            slot.carried = Duration::ZERO;
        });
    }

    pub(crate) fn remove_ticker(&self, id: TickerId) {
        if let Some(inner) = self.inner.upgrade() {
            inner.borrow_mut().tickers.remove(id);
        }
    }

    pub(crate) fn elapsed(&self, id: TickerId) -> Option<Duration> {
        self.with_slot(id, |slot, now| slot.elapsed(now)).flatten()
    }

    pub(crate) fn is_muted(&self, id: TickerId) -> bool {
        self.with_slot(id, |slot, _| slot.muted).unwrap_or(false)
    }

    pub(crate) fn set_muted(&self, id: TickerId, muted: bool) {
        self.with_slot(id, |slot, _| slot.muted = muted);
    }

    pub(crate) fn is_dispatching(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.borrow().dispatching)
    }

    pub(crate) fn defer(&self, tasks: SmallVec<[Task; 2]>) {
        if let Some(inner) = self.inner.upgrade() {
            inner.borrow_mut().deferred.extend(tasks);
        }
    }
}

impl TickerProvider for SchedulerHandle {
    fn create_ticker(&self, on_tick: Box<dyn Fn(Duration)>) -> Ticker {
        let id = match self.inner.upgrade() {
            Some(inner) => inner.borrow_mut().tickers.insert(TickerSlot {
                callback: Rc::from(on_tick),
                start_time: None,
                carried: Duration::ZERO,
                muted: false,
            }),
            None => {
                tracing::warn!("creating a ticker on a dropped scheduler");
                TickerId::default()
            }
        };
        Ticker::new(id, self.clone())
    }

    fn reduced_motion(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.borrow().reduced_motion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_scheduler_tick() {
        let scheduler = AnimationScheduler::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let mut ticker = scheduler.create_ticker(Box::new(move |_| counter.set(counter.get() + 1)));

        // Inactive tickers are not called
        assert!(!scheduler.advance(Duration::from_millis(16)));
        assert_eq!(hits.get(), 0);

        ticker.start();
        assert!(scheduler.advance(Duration::from_millis(16)));
        assert!(scheduler.advance(Duration::from_millis(16)));
        assert_eq!(hits.get(), 2);
        assert_eq!(scheduler.frame_count(), 3);
        assert_eq!(scheduler.now(), Duration::from_millis(48));
    }

    #[test]
    fn test_frame_time_never_goes_backwards() {
        let scheduler = AnimationScheduler::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut ticker =
            scheduler.create_ticker(Box::new(move |elapsed| sink.borrow_mut().push(elapsed)));

        ticker.start();
        scheduler.tick_at(Duration::from_millis(100));
        scheduler.tick_at(Duration::from_millis(50));
        assert_eq!(
            *seen.borrow(),
            vec![Duration::from_millis(100), Duration::from_millis(100)]
        );
    }

    #[test]
    fn test_ticker_stopped_mid_frame_is_skipped() {
        let scheduler = AnimationScheduler::new();
        let victim: Rc<RefCell<Option<Ticker>>> = Rc::new(RefCell::new(None));

        // The stopper occupies the first slot, so it runs before the victim
        let target = Rc::clone(&victim);
        let mut stopper = scheduler.create_ticker(Box::new(move |_| {
            if let Some(ticker) = target.borrow_mut().as_mut() {
                ticker.stop(true);
            }
        }));

        let victim_hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&victim_hits);
        let mut ticker = scheduler.create_ticker(Box::new(move |_| counter.set(counter.get() + 1)));
        let future = ticker.start();
        *victim.borrow_mut() = Some(ticker);

        stopper.start();
        scheduler.advance(Duration::from_millis(1));
        assert_eq!(victim_hits.get(), 0);
        assert!(future.is_canceled());
    }

    #[test]
    fn test_continuations_run_after_frame() {
        let scheduler = AnimationScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let shared: Rc<RefCell<Option<Ticker>>> = Rc::new(RefCell::new(None));
        let finisher = Rc::clone(&shared);
        let log = Rc::clone(&order);
        let mut first = scheduler.create_ticker(Box::new(move |_| {
            log.borrow_mut().push("first tick");
            if let Some(ticker) = finisher.borrow_mut().as_mut() {
                ticker.stop(false);
            }
        }));
        let log = Rc::clone(&order);
        let mut second = scheduler.create_ticker(Box::new(move |_| log.borrow_mut().push("second tick")));

        let future = second.start();
        let log = Rc::clone(&order);
        future.when_complete(move || log.borrow_mut().push("continuation"));
        *shared.borrow_mut() = Some(second);

        first.start();
        scheduler.advance(Duration::from_millis(16));

        assert!(future.is_complete());
        let order = order.borrow();
        assert_eq!(order.last(), Some(&"continuation"));
        assert!(order.contains(&"first tick"));
    }

    #[test]
    fn test_reduced_motion_flag() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        assert!(!handle.reduced_motion());

        scheduler.set_reduced_motion(true);
        assert!(scheduler.reduced_motion());
        assert!(handle.reduced_motion());

        let ticker = handle.create_ticker(Box::new(|_| {}));
        assert!(ticker.reduced_motion());
    }

    #[test]
    fn test_handle_weak_reference() {
        let handle = {
            let scheduler = AnimationScheduler::new();
            scheduler.handle()
        };

        // Scheduler is dropped, handle should not be alive
        assert!(!handle.is_alive());

        // Operations should safely no-op
        let mut ticker = handle.create_ticker(Box::new(|_| {}));
        let future = ticker.start();
        assert!(ticker.is_active());
        ticker.stop(false);
        assert!(future.is_complete());
    }
}
