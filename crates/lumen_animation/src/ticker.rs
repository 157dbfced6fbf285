//! Tickers and completion futures
//!
//! A [`Ticker`] calls its callback once per frame with the time elapsed since
//! it was started. Tickers come from a [`TickerProvider`]; the provider shipped
//! with this crate is the [`AnimationScheduler`](crate::AnimationScheduler).
//!
//! Starting a ticker hands out a [`TickerFuture`]. The future settles exactly
//! once: it completes when the ticker is stopped with `canceled = false` (an
//! animation that ran to its end) and is canceled otherwise. Two views of the
//! same outcome are available:
//!
//! - [`TickerFuture`] itself only ever resolves on completion
//! - [`TickerFuture::or_cancel`] resolves on completion and fails with
//!   [`TickerCanceled`] on cancellation

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use smallvec::SmallVec;

use crate::error::TickerCanceled;
use crate::scheduler::{SchedulerHandle, TickerId};

/// A source of tickers
///
/// Object safe so controllers can be re-pointed at a different provider with
/// [`AnimationController::resync`](crate::AnimationController::resync).
pub trait TickerProvider {
    /// Create a ticker that calls `on_tick` every frame while it is active
    fn create_ticker(&self, on_tick: Box<dyn Fn(Duration)>) -> Ticker;

    /// Whether the platform asked for reduced motion
    fn reduced_motion(&self) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Complete,
    Canceled,
}

pub(crate) type Task = Box<dyn FnOnce()>;

#[derive(Default)]
struct FutureState {
    outcome: Option<Outcome>,
    on_complete: Vec<Box<dyn FnOnce()>>,
    on_settled: Vec<Box<dyn FnOnce(Result<(), TickerCanceled>)>>,
    wakers: SmallVec<[Waker; 1]>,
}

/// One-shot completion token for a ticker run
///
/// Clones share the same outcome.
#[derive(Clone, Default)]
pub struct TickerFuture {
    state: Rc<RefCell<FutureState>>,
}

impl TickerFuture {
    pub(crate) fn pending() -> Self {
        Self::default()
    }

    /// A future that has already completed
    pub fn complete() -> Self {
        let future = Self::pending();
        future.state.borrow_mut().outcome = Some(Outcome::Complete);
        future
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().outcome.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.state.borrow().outcome == Some(Outcome::Complete)
    }

    pub fn is_canceled(&self) -> bool {
        self.state.borrow().outcome == Some(Outcome::Canceled)
    }

    /// Run `f` once the run completes
    ///
    /// Runs immediately if the run has already completed. Never runs if the
    /// run is canceled.
    pub fn when_complete(&self, f: impl FnOnce() + 'static) {
        let outcome = {
            let mut state = self.state.borrow_mut();
            if state.outcome.is_none() {
                state.on_complete.push(Box::new(f));
                return;
            }
            state.outcome
        };
        if outcome == Some(Outcome::Complete) {
            f();
        }
    }

    /// A view of this future that also reports cancellation
    pub fn or_cancel(&self) -> TickerFutureOrCancel {
        TickerFutureOrCancel {
            state: Rc::clone(&self.state),
        }
    }

    /// Record the outcome and collect the continuations to run
    ///
    /// The outcome is visible immediately; the continuations run when the
    /// returned [`Resolution`] is dispatched.
    pub(crate) fn settle(&self, canceled: bool, scheduler: &SchedulerHandle) -> Resolution {
        let mut state = self.state.borrow_mut();
        if state.outcome.is_some() {
            return Resolution::empty();
        }
        let outcome = if canceled {
            Outcome::Canceled
        } else {
            Outcome::Complete
        };
        state.outcome = Some(outcome);

        let on_complete = std::mem::take(&mut state.on_complete);
        let on_settled = std::mem::take(&mut state.on_settled);
        let wakers = std::mem::take(&mut state.wakers);

        let mut tasks: SmallVec<[Task; 2]> = SmallVec::new();
        for waker in wakers {
            tasks.push(Box::new(move || waker.wake()));
        }
        match outcome {
            Outcome::Complete => {
                for f in on_complete {
                    tasks.push(f);
                }
                for f in on_settled {
                    tasks.push(Box::new(move || f(Ok(()))));
                }
            }
            Outcome::Canceled => {
                for f in on_settled {
                    tasks.push(Box::new(move || f(Err(TickerCanceled))));
                }
            }
        }
        Resolution {
            scheduler: Some(scheduler.clone()),
            tasks,
        }
    }
}

impl Future for TickerFuture {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut state = self.state.borrow_mut();
        match state.outcome {
            Some(Outcome::Complete) => Poll::Ready(()),
            // A canceled run never resolves this view
            Some(Outcome::Canceled) => Poll::Pending,
            None => {
                if !state.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    state.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

impl fmt::Debug for TickerFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.state.borrow().outcome {
            None => "active",
            Some(Outcome::Complete) => "complete",
            Some(Outcome::Canceled) => "canceled",
        };
        write!(f, "TickerFuture({status})")
    }
}

/// A [`TickerFuture`] view that fails with [`TickerCanceled`]
#[derive(Clone)]
pub struct TickerFutureOrCancel {
    state: Rc<RefCell<FutureState>>,
}

impl TickerFutureOrCancel {
    /// Run `f` with the outcome once the run settles, immediately if it
    /// already has
    pub fn when_settled(&self, f: impl FnOnce(Result<(), TickerCanceled>) + 'static) {
        let outcome = {
            let mut state = self.state.borrow_mut();
            match state.outcome {
                Some(outcome) => outcome,
                None => {
                    state.on_settled.push(Box::new(f));
                    return;
                }
            }
        };
        f(match outcome {
            Outcome::Complete => Ok(()),
            Outcome::Canceled => Err(TickerCanceled),
        });
    }
}

impl Future for TickerFutureOrCancel {
    type Output = Result<(), TickerCanceled>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.state.borrow_mut();
        match state.outcome {
            Some(Outcome::Complete) => Poll::Ready(Ok(())),
            Some(Outcome::Canceled) => Poll::Ready(Err(TickerCanceled)),
            None => {
                if !state.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    state.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

/// Continuations released by settling a [`TickerFuture`]
///
/// Holding a `Resolution` lets the caller finish its own bookkeeping (and
/// release any borrows) before user code runs.
#[must_use = "continuations only run when the resolution is dispatched"]
pub(crate) struct Resolution {
    scheduler: Option<SchedulerHandle>,
    tasks: SmallVec<[Task; 2]>,
}

impl Resolution {
    pub(crate) fn empty() -> Self {
        Self {
            scheduler: None,
            tasks: SmallVec::new(),
        }
    }

    /// Run the continuations, or queue them behind the frame being dispatched
    pub(crate) fn dispatch(self) {
        if self.tasks.is_empty() {
            return;
        }
        if let Some(scheduler) = &self.scheduler {
            if scheduler.is_dispatching() {
                scheduler.defer(self.tasks);
                return;
            }
        }
        for task in self.tasks {
            task();
        }
    }
}

/// A per-frame callback source
///
/// While active, the owning scheduler calls the callback once per frame with
/// the time elapsed since [`start`](Ticker::start). A muted ticker keeps its
/// clock running but is not called.
pub struct Ticker {
    id: TickerId,
    scheduler: SchedulerHandle,
    future: Option<TickerFuture>,
    disposed: bool,
    debug_label: Option<String>,
}

impl Ticker {
    pub(crate) fn new(id: TickerId, scheduler: SchedulerHandle) -> Self {
        Self {
            id,
            scheduler,
            future: None,
            disposed: false,
            debug_label: None,
        }
    }

    pub fn set_debug_label(&mut self, label: impl Into<String>) {
        self.debug_label = Some(label.into());
    }

    pub fn debug_label(&self) -> Option<&str> {
        self.debug_label.as_deref()
    }

    /// Whether a run is in progress (even if muted)
    pub fn is_active(&self) -> bool {
        self.future.is_some()
    }

    /// Whether the callback will be called on the next frame
    pub fn is_ticking(&self) -> bool {
        self.is_active() && !self.is_muted()
    }

    pub fn is_muted(&self) -> bool {
        self.scheduler.is_muted(self.id)
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.scheduler.set_muted(self.id, muted);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Whether the scheduler behind this ticker asks for reduced motion
    pub fn reduced_motion(&self) -> bool {
        self.scheduler.reduced_motion()
    }

    /// Time since [`start`](Ticker::start) at the scheduler's current frame
    pub fn elapsed(&self) -> Option<Duration> {
        self.scheduler.elapsed(self.id)
    }

    /// Begin calling the callback every frame
    ///
    /// # Panics
    ///
    /// Panics if the ticker is already active or has been disposed.
    pub fn start(&mut self) -> TickerFuture {
        assert!(!self.disposed, "Ticker.start() called after Ticker.dispose().");
        assert!(
            !self.is_active(),
            "A ticker was started twice. A ticker that is already active must be stopped \
             before start() can be called again. ({})",
            self.debug_label().unwrap_or("unlabeled ticker")
        );
        let future = TickerFuture::pending();
        self.future = Some(future.clone());
        self.scheduler.start_ticker(self.id, Duration::ZERO);
        tracing::debug!(label = ?self.debug_label, "ticker started");
        future
    }

    /// Stop calling the callback and settle the current run
    ///
    /// `canceled = false` completes the run's future; `true` cancels it.
    /// Does nothing if the ticker is not active.
    pub fn stop(&mut self, canceled: bool) {
        self.stop_deferred(canceled).dispatch();
    }

    /// [`stop`](Ticker::stop) without running the continuations yet
    pub(crate) fn stop_deferred(&mut self, canceled: bool) -> Resolution {
        let Some(future) = self.future.take() else {
            return Resolution::empty();
        };
        self.scheduler.stop_ticker(self.id);
        tracing::debug!(label = ?self.debug_label, canceled, "ticker stopped");
        future.settle(canceled, &self.scheduler)
    }

    /// Release the ticker, canceling a run in progress
    pub fn dispose(&mut self) {
        self.dispose_deferred().dispatch();
    }

    pub(crate) fn dispose_deferred(&mut self) -> Resolution {
        let resolution = match self.future.take() {
            Some(future) => future.settle(true, &self.scheduler),
            None => Resolution::empty(),
        };
        self.scheduler.remove_ticker(self.id);
        self.disposed = true;
        tracing::debug!(label = ?self.debug_label, "ticker disposed");
        resolution
    }

    /// Take over `original`'s run, then dispose `original`
    ///
    /// The future, the elapsed time and the muted flag carry over, so the
    /// next frame of the new scheduler continues where the old one left off.
    ///
    /// # Panics
    ///
    /// Panics if this ticker is active.
    pub fn absorb_ticker(&mut self, original: &mut Ticker) {
        assert!(
            !self.is_active(),
            "Cannot absorb a ticker into a ticker that is already active"
        );
        assert!(!self.disposed, "Cannot absorb a ticker into a disposed ticker");

        self.set_muted(original.is_muted());
        if let Some(future) = original.future.take() {
            let carried = original.elapsed().unwrap_or_default();
            original.scheduler.stop_ticker(original.id);
            self.future = Some(future);
            self.scheduler.start_ticker(self.id, carried);
            tracing::debug!(label = ?self.debug_label, ?carried, "ticker absorbed active run");
        }
        // Nothing is pending on the original any more, so this settles nothing
        original.dispose();
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if !self.disposed {
            self.dispose_deferred().dispatch();
        }
    }
}

impl fmt::Debug for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticker")
            .field("label", &self.debug_label)
            .field("active", &self.is_active())
            .field("muted", &self.is_muted())
            .field("disposed", &self.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::AnimationScheduler;
    use std::cell::Cell;

    fn counting_ticker(scheduler: &AnimationScheduler) -> (Ticker, Rc<RefCell<Vec<Duration>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let ticker =
            scheduler.create_ticker(Box::new(move |elapsed| sink.borrow_mut().push(elapsed)));
        (ticker, seen)
    }

    #[test]
    fn test_elapsed_measured_from_start() {
        let scheduler = AnimationScheduler::new();
        let (mut ticker, seen) = counting_ticker(&scheduler);

        scheduler.advance(Duration::from_millis(50));
        ticker.start();
        scheduler.advance(Duration::from_millis(16));
        scheduler.advance(Duration::from_millis(16));

        assert_eq!(
            *seen.borrow(),
            vec![Duration::from_millis(16), Duration::from_millis(32)]
        );
    }

    #[test]
    fn test_stop_completes_or_cancels() {
        let scheduler = AnimationScheduler::new();
        let (mut ticker, _) = counting_ticker(&scheduler);

        let first = ticker.start();
        ticker.stop(false);
        assert!(first.is_complete());
        assert!(!ticker.is_active());

        let second = ticker.start();
        ticker.stop(true);
        assert!(second.is_canceled());
    }

    #[test]
    fn test_continuations() {
        let scheduler = AnimationScheduler::new();
        let (mut ticker, _) = counting_ticker(&scheduler);

        let completed = Rc::new(Cell::new(false));
        let settled = Rc::new(RefCell::new(None));

        let future = ticker.start();
        let flag = Rc::clone(&completed);
        future.when_complete(move || flag.set(true));
        let sink = Rc::clone(&settled);
        future
            .or_cancel()
            .when_settled(move |result| *sink.borrow_mut() = Some(result));

        ticker.stop(true);
        assert!(!completed.get());
        assert_eq!(*settled.borrow(), Some(Err(TickerCanceled)));
    }

    #[test]
    fn test_when_complete_on_settled_future_runs_now() {
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        TickerFuture::complete().when_complete(move || counter.set(counter.get() + 1));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_futures_resolve() {
        pollster::block_on(TickerFuture::complete());
        assert_eq!(
            pollster::block_on(TickerFuture::complete().or_cancel()),
            Ok(())
        );

        let scheduler = AnimationScheduler::new();
        let (mut ticker, _) = counting_ticker(&scheduler);
        let future = ticker.start();
        ticker.stop(true);
        assert_eq!(pollster::block_on(future.or_cancel()), Err(TickerCanceled));
    }

    #[test]
    fn test_muted_ticker_keeps_time() {
        let scheduler = AnimationScheduler::new();
        let (mut ticker, seen) = counting_ticker(&scheduler);

        ticker.start();
        ticker.set_muted(true);
        assert!(ticker.is_active());
        assert!(!ticker.is_ticking());

        scheduler.advance(Duration::from_millis(100));
        assert!(seen.borrow().is_empty());

        ticker.set_muted(false);
        scheduler.advance(Duration::from_millis(10));
        assert_eq!(*seen.borrow(), vec![Duration::from_millis(110)]);
    }

    #[test]
    fn test_absorb_transfers_run() {
        let old_scheduler = AnimationScheduler::new();
        let new_scheduler = AnimationScheduler::new();
        let (mut old, old_seen) = counting_ticker(&old_scheduler);
        let (mut new, new_seen) = counting_ticker(&new_scheduler);

        new_scheduler.advance(Duration::from_secs(5));

        let future = old.start();
        old.set_muted(true);
        old_scheduler.advance(Duration::from_millis(40));

        new.absorb_ticker(&mut old);
        assert!(old.is_disposed());
        assert!(new.is_active());
        assert!(new.is_muted());
        assert!(future.is_pending());

        new.set_muted(false);
        new_scheduler.advance(Duration::from_millis(10));
        old_scheduler.advance(Duration::from_millis(10));

        assert!(old_seen.borrow().is_empty());
        assert_eq!(*new_seen.borrow(), vec![Duration::from_millis(50)]);

        new.stop(false);
        assert!(future.is_complete());
    }

    #[test]
    fn test_dispose_cancels() {
        let scheduler = AnimationScheduler::new();
        let (mut ticker, _) = counting_ticker(&scheduler);
        let future = ticker.start();
        ticker.dispose();
        assert!(future.is_canceled());
        assert_eq!(scheduler.ticker_count(), 0);
    }

    #[test]
    #[should_panic(expected = "started twice")]
    fn test_double_start_panics() {
        let scheduler = AnimationScheduler::new();
        let (mut ticker, _) = counting_ticker(&scheduler);
        ticker.start();
        ticker.start();
    }

    #[test]
    fn test_drop_cancels_active_run() {
        let scheduler = AnimationScheduler::new();
        let (mut ticker, _) = counting_ticker(&scheduler);
        let future = ticker.start();
        let settled = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&settled);
        future
            .or_cancel()
            .when_settled(move |result| *sink.borrow_mut() = Some(result));

        drop(ticker);
        assert!(future.is_canceled());
        assert_eq!(*settled.borrow(), Some(Err(TickerCanceled)));
        assert_eq!(pollster::block_on(future.or_cancel()), Err(TickerCanceled));
    }

    #[test]
    fn test_drop_unregisters() {
        let scheduler = AnimationScheduler::new();
        let (ticker, _) = counting_ticker(&scheduler);
        assert_eq!(scheduler.ticker_count(), 1);
        drop(ticker);
        assert_eq!(scheduler.ticker_count(), 0);
    }
}
