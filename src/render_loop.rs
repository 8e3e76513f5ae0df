//! Periodic render loop: capture surface → pixelation → output surface.
//!
//! The loop runs as a single tokio task. Each tick reads the latest frame,
//! pixelates the whole grid and writes the result to the sink. A frame that
//! was already written is not processed again. Tick errors are
//! logged and counted; they never end the loop. Missed ticks are skipped
//! rather than queued, so a slow tick delays the next one instead of causing
//! a burst.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::frame::{Frame, FrameSlot};
use crate::pixelate::{BlockSize, FrameProcessor, PixelateError};

/// Something that can hand out the most recent captured frame without blocking.
pub trait FrameSource: Send + Sync {
    /// The latest frame, or `None` if nothing has been captured yet.
    ///
    /// Returning the same `Arc` as the previous call means nothing new was
    /// captured.
    fn latest_frame(&self) -> Option<Arc<Frame>>;
}

impl FrameSource for FrameSlot {
    fn latest_frame(&self) -> Option<Arc<Frame>> {
        self.latest()
    }
}

/// Destination for pixelated frames. Last write wins.
pub trait OutputSink: Send {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), SinkError>;
}

/// Output sink shared between the render task and its owner.
pub type SharedSink = Arc<Mutex<dyn OutputSink>>;

/// Errors raised by an output sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The surface rejected the write (detached, closed, too small)
    #[error("output surface unavailable: {0}")]
    Unavailable(String),

    #[error("output surface I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single tick produced no output.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error("no frame available from the capture surface")]
    FrameUnavailable,

    #[error(transparent)]
    Pixelate(#[from] PixelateError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("output sink lock poisoned")]
    SinkPoisoned,
}

/// How often the loop ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickRate {
    /// As fast as the scheduler allows (1 ms period)
    Continuous,
    /// Fixed frames per second
    Fps(u32),
}

impl TickRate {
    /// `0` means continuous.
    pub fn from_fps(fps: u32) -> Self {
        if fps == 0 {
            TickRate::Continuous
        } else {
            TickRate::Fps(fps)
        }
    }

    pub fn period(self) -> Duration {
        match self {
            TickRate::Continuous => Duration::from_millis(1),
            TickRate::Fps(fps) => Duration::from_micros(1_000_000 / fps.max(1) as u64),
        }
    }
}

impl fmt::Display for TickRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickRate::Continuous => write!(f, "max fps"),
            TickRate::Fps(fps) => write!(f, "{} fps", fps),
        }
    }
}

/// Render loop lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// Point-in-time counters for a render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopStats {
    /// Frames written to the sink
    pub rendered: u64,
    /// Ticks that ended in an error
    pub failed: u64,
    /// Ticks skipped because the source had nothing new
    pub unchanged: u64,
    /// Tick tasks currently alive
    pub active_tasks: usize,
}

#[derive(Debug, Default)]
struct Counters {
    rendered: AtomicU64,
    failed: AtomicU64,
    unchanged: AtomicU64,
    active_tasks: AtomicUsize,
}

/// Keeps `active_tasks` accurate however the task ends, including abort
/// before the first poll.
struct ActiveGuard(Arc<Counters>);

impl ActiveGuard {
    fn new(counters: Arc<Counters>) -> Self {
        counters.active_tasks.fetch_add(1, Ordering::SeqCst);
        Self(counters)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.active_tasks.fetch_sub(1, Ordering::SeqCst);
    }
}

struct ActiveLoop {
    handle: JoinHandle<()>,
    sink: SharedSink,
    rate: TickRate,
}

/// Owner of the periodic pixelation task.
///
/// At most one tick task is alive per `RenderLoop`: `start` waits for the
/// previous task to be gone before spawning the next.
pub struct RenderLoop {
    block: BlockSize,
    counters: Arc<Counters>,
    active: Option<ActiveLoop>,
}

impl fmt::Debug for RenderLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderLoop")
            .field("block", &self.block)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl RenderLoop {
    pub fn new(block: BlockSize) -> Self {
        Self {
            block,
            counters: Arc::new(Counters::default()),
            active: None,
        }
    }

    pub fn block_size(&self) -> BlockSize {
        self.block
    }

    pub fn state(&self) -> LoopState {
        if self.active.is_some() {
            LoopState::Running
        } else {
            LoopState::Idle
        }
    }

    /// Rate of the running loop, `None` when idle.
    pub fn rate(&self) -> Option<TickRate> {
        self.active.as_ref().map(|a| a.rate)
    }

    pub fn stats(&self) -> LoopStats {
        LoopStats {
            rendered: self.counters.rendered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            unchanged: self.counters.unchanged.load(Ordering::Relaxed),
            active_tasks: self.counters.active_tasks.load(Ordering::SeqCst),
        }
    }

    /// Start ticking against `source`, replacing any running loop.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(&mut self, source: Arc<dyn FrameSource>, sink: SharedSink, rate: TickRate) {
        self.stop().await;

        let guard = ActiveGuard::new(Arc::clone(&self.counters));
        let task = TickTask {
            source,
            sink: Arc::clone(&sink),
            processor: FrameProcessor::new(self.block),
            output: Frame::from_raw(Vec::new(), 0, 0),
            last_written: None,
            counters: Arc::clone(&self.counters),
            failure_streak: 0,
        };
        let handle = tokio::spawn(task.run(rate, guard));

        log::info!("Render loop started ({}, block {})", rate, self.block);
        self.active = Some(ActiveLoop { handle, sink, rate });
    }

    /// Cancel the tick task. Calling this while idle does nothing.
    pub async fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        active.handle.abort();
        match active.handle.await {
            Err(e) if e.is_panic() => log::error!("Render task panicked: {}", e),
            _ => {}
        }
        log::info!("Render loop stopped");
    }

    /// Restart a running loop against a new frame source, keeping its sink
    /// and rate. Returns `false` (and does nothing) when idle.
    pub async fn replace_source(&mut self, source: Arc<dyn FrameSource>) -> bool {
        let Some(active) = self.active.as_ref() else {
            return false;
        };
        let sink = Arc::clone(&active.sink);
        let rate = active.rate;
        self.start(source, sink, rate).await;
        true
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.handle.abort();
        }
    }
}

struct TickTask {
    source: Arc<dyn FrameSource>,
    sink: SharedSink,
    processor: FrameProcessor,
    output: Frame,
    /// Source frame behind the last successful write
    last_written: Option<Arc<Frame>>,
    counters: Arc<Counters>,
    failure_streak: u64,
}

impl TickTask {
    async fn run(mut self, rate: TickRate, _guard: ActiveGuard) {
        let mut interval = tokio::time::interval(rate.period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            match self.tick() {
                Ok(Tick::Unchanged) => {
                    self.counters.unchanged.fetch_add(1, Ordering::Relaxed);
                }
                Ok(Tick::Rendered) => {
                    self.counters.rendered.fetch_add(1, Ordering::Relaxed);
                    if self.failure_streak > 0 {
                        log::info!(
                            "Render loop recovered after {} failed tick(s)",
                            self.failure_streak
                        );
                        self.failure_streak = 0;
                    }
                }
                Err(e) => {
                    self.counters.failed.fetch_add(1, Ordering::Relaxed);
                    self.failure_streak += 1;
                    if self.failure_streak == 1 {
                        log::warn!("Render tick failed: {}", e);
                    } else {
                        log::debug!("Render tick failed ({} in a row): {}", self.failure_streak, e);
                    }
                }
            }
        }
    }

    fn tick(&mut self) -> Result<Tick, TickError> {
        let frame = self
            .source
            .latest_frame()
            .ok_or(TickError::FrameUnavailable)?;
        if self
            .last_written
            .as_ref()
            .is_some_and(|last| Arc::ptr_eq(last, &frame))
        {
            return Ok(Tick::Unchanged);
        }

        self.processor.process_into(&frame, &mut self.output)?;
        let mut sink = self.sink.lock().map_err(|_| TickError::SinkPoisoned)?;
        sink.write_frame(&self.output)?;
        self.last_written = Some(frame);
        Ok(Tick::Rendered)
    }
}

enum Tick {
    Rendered,
    Unchanged,
}

/// Sink that discards frames and counts them. Used for headless runs.
#[derive(Debug, Default)]
pub struct NullSink {
    written: u64,
}

impl NullSink {
    pub fn frames_written(&self) -> u64 {
        self.written
    }
}

impl OutputSink for NullSink {
    fn write_frame(&mut self, _frame: &Frame) -> Result<(), SinkError> {
        self.written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Rgba;

    /// Source that yields nothing for the first `gaps` reads.
    struct GappySource {
        gaps: usize,
        reads: AtomicUsize,
    }

    impl FrameSource for GappySource {
        fn latest_frame(&self) -> Option<Arc<Frame>> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst);
            (n >= self.gaps).then(|| Arc::new(Frame::filled(16, 16, Rgba::BLACK)))
        }
    }

    /// Source that captures a new frame on every read.
    struct LiveSource;

    impl FrameSource for LiveSource {
        fn latest_frame(&self) -> Option<Arc<Frame>> {
            Some(Arc::new(Frame::filled(8, 8, Rgba::BLACK)))
        }
    }

    /// Sink that rejects the first `failures` writes.
    #[derive(Default)]
    struct FlakySink {
        failures: usize,
        attempts: usize,
        written: usize,
    }

    impl OutputSink for FlakySink {
        fn write_frame(&mut self, _frame: &Frame) -> Result<(), SinkError> {
            self.attempts += 1;
            if self.attempts <= self.failures {
                return Err(SinkError::Unavailable("detached".to_string()));
            }
            self.written += 1;
            Ok(())
        }
    }

    fn block() -> BlockSize {
        BlockSize::new(4).unwrap()
    }

    fn slot_with_frame() -> Arc<dyn FrameSource> {
        let slot = FrameSlot::new();
        slot.publish(Frame::filled(8, 8, Rgba::BLACK));
        Arc::new(slot)
    }

    fn null_sink() -> SharedSink {
        Arc::new(Mutex::new(NullSink::default()))
    }

    #[test]
    fn test_tick_rate_period() {
        assert_eq!(TickRate::Fps(25).period(), Duration::from_millis(40));
        assert_eq!(TickRate::Continuous.period(), Duration::from_millis(1));
        assert_eq!(TickRate::from_fps(0), TickRate::Continuous);
        assert_eq!(TickRate::from_fps(30), TickRate::Fps(30));
    }

    #[test]
    fn test_tick_rate_display() {
        assert_eq!(TickRate::Fps(25).to_string(), "25 fps");
        assert_eq!(TickRate::Continuous.to_string(), "max fps");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_on_idle_loop_is_a_noop() {
        let mut render = RenderLoop::new(block());
        render.stop().await;
        render.stop().await;
        assert_eq!(render.state(), LoopState::Idle);
        assert_eq!(render.stats().active_tasks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_leaves_one_task() {
        let mut render = RenderLoop::new(block());
        render.start(slot_with_frame(), null_sink(), TickRate::Fps(100)).await;
        render.start(slot_with_frame(), null_sink(), TickRate::Fps(100)).await;
        tokio::task::yield_now().await;

        assert_eq!(render.state(), LoopState::Running);
        assert_eq!(render.stats().active_tasks, 1);

        render.stop().await;
        assert_eq!(render.state(), LoopState::Idle);
        assert_eq!(render.stats().active_tasks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_renders_into_sink() {
        let sink = Arc::new(Mutex::new(NullSink::default()));
        let shared: SharedSink = sink.clone();
        let mut render = RenderLoop::new(block());
        render.start(Arc::new(LiveSource), shared, TickRate::Fps(100)).await;

        tokio::time::sleep(Duration::from_millis(95)).await;
        render.stop().await;

        let written = sink.lock().unwrap().frames_written();
        assert!(written >= 5, "expected several frames, got {written}");
        assert_eq!(render.stats().rendered, written);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_frame_is_written_once() {
        let slot = FrameSlot::new();
        slot.publish(Frame::filled(8, 8, Rgba::BLACK));
        let sink = Arc::new(Mutex::new(NullSink::default()));
        let shared: SharedSink = sink.clone();
        let mut render = RenderLoop::new(block());
        render.start(Arc::new(slot.clone()), shared, TickRate::Fps(100)).await;

        tokio::time::sleep(Duration::from_millis(95)).await;
        assert_eq!(sink.lock().unwrap().frames_written(), 1);
        assert!(render.stats().unchanged >= 5);

        slot.publish(Frame::filled(8, 8, Rgba::BLACK));
        tokio::time::sleep(Duration::from_millis(25)).await;
        render.stop().await;

        assert_eq!(sink.lock().unwrap().frames_written(), 2);
        assert_eq!(render.stats().rendered, 2);
        assert_eq!(render.stats().failed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_frames_do_not_stop_the_loop() {
        let source = Arc::new(GappySource {
            gaps: 3,
            reads: AtomicUsize::new(0),
        });
        let mut render = RenderLoop::new(block());
        render.start(source, null_sink(), TickRate::Fps(100)).await;

        tokio::time::sleep(Duration::from_millis(95)).await;
        let stats = render.stats();
        render.stop().await;

        assert_eq!(stats.failed, 3);
        assert!(stats.rendered > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_errors_do_not_stop_the_loop() {
        let sink = Arc::new(Mutex::new(FlakySink {
            failures: 2,
            ..FlakySink::default()
        }));
        let shared: SharedSink = sink.clone();
        let mut render = RenderLoop::new(block());
        render.start(slot_with_frame(), shared, TickRate::Fps(100)).await;

        tokio::time::sleep(Duration::from_millis(95)).await;
        render.stop().await;

        let sink = sink.lock().unwrap();
        assert!(sink.written > 0);
        assert_eq!(render.stats().failed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_size_mismatch_is_a_failed_tick() {
        let slot = FrameSlot::new();
        slot.publish(Frame::from_raw(vec![0; 10], 4, 4));
        let mut render = RenderLoop::new(block());
        render.start(Arc::new(slot), null_sink(), TickRate::Fps(100)).await;

        tokio::time::sleep(Duration::from_millis(35)).await;
        let stats = render.stats();
        render.stop().await;

        assert_eq!(stats.rendered, 0);
        assert!(stats.failed >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_source_when_idle_does_nothing() {
        let mut render = RenderLoop::new(block());
        assert!(!render.replace_source(slot_with_frame()).await);
        assert_eq!(render.state(), LoopState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_source_keeps_rate_and_single_task() {
        let mut render = RenderLoop::new(block());
        render.start(slot_with_frame(), null_sink(), TickRate::Fps(50)).await;

        assert!(render.replace_source(slot_with_frame()).await);
        tokio::task::yield_now().await;

        assert_eq!(render.rate(), Some(TickRate::Fps(50)));
        assert_eq!(render.stats().active_tasks, 1);
        render.stop().await;
    }
}
