// evlayer Event Runner
// Sequential source -> engine -> sink loop with cooperative cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::input::{KeySource, PollOutcome, SourceError};
use crate::output::{KeySink, SinkError};
use crate::remap::{Outcome, RemapEngine};

/// Default wait per poll before the running flag is checked again
pub const DEFAULT_POLL_TIMEOUT_MS: i32 = 100;

/// Fatal errors that stop the runner
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("input source failed: {0}")]
    Source(#[from] SourceError),

    #[error("output sink failed: {0}")]
    Sink(#[from] SinkError),
}

/// Counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Key events handed to the engine
    pub events: u64,
    /// Events that produced one remapped output event
    pub emitted: u64,
    /// Events that ran a bound action
    pub actions: u64,
    /// Events dropped with a warning
    pub ignored: u64,
}

impl RunStats {
    fn record(&mut self, outcome: &Outcome) {
        self.events += 1;
        match outcome {
            Outcome::Emitted(..) => self.emitted += 1,
            Outcome::ActionInvoked(_) => self.actions += 1,
            Outcome::Ignored(_) => self.ignored += 1,
            Outcome::LayerPushed { .. } | Outcome::LayerReleased { .. } | Outcome::LayerHeld => {}
        }
    }
}

/// Drives one input source through the remap engine into one sink.
///
/// Events are processed strictly one at a time. The shared `running` flag
/// is checked between events, never during one, so a stop request (signal
/// handler or shutdown action) leaves no event half done. Whatever ends the
/// loop, the source is released and the sink closed before `run` returns.
pub struct EventRunner<S: KeySource, K: KeySink> {
    engine: RemapEngine,
    source: S,
    sink: K,
    running: Arc<AtomicBool>,
    poll_timeout_ms: i32,
    stats: RunStats,
}

impl<S: KeySource, K: KeySink> EventRunner<S, K> {
    pub fn new(engine: RemapEngine, source: S, sink: K, running: Arc<AtomicBool>) -> Self {
        Self {
            engine,
            source,
            sink,
            running,
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            stats: RunStats::default(),
        }
    }

    /// Set how long a single poll may block (milliseconds, -1 = forever)
    pub fn with_poll_timeout(mut self, timeout_ms: i32) -> Self {
        self.poll_timeout_ms = timeout_ms;
        self
    }

    /// Run until the source closes, the running flag is cleared, or a
    /// source/sink failure occurs. Always shuts down before returning.
    pub fn run(&mut self) -> Result<RunStats, RunError> {
        log::info!("Event runner started");

        let result = self.pump();
        if let Err(e) = &result {
            log::error!("Stopping on fatal error: {}", e);
        }
        let shutdown = self.shutdown();

        log::info!(
            "Event runner stopped: {} events, {} emitted, {} actions, {} ignored",
            self.stats.events,
            self.stats.emitted,
            self.stats.actions,
            self.stats.ignored
        );

        if let (Err(_), Err(e)) = (&result, &shutdown) {
            log::warn!("Closing the output sink also failed: {}", e);
        }
        result?;
        shutdown?;
        Ok(self.stats)
    }

    fn pump(&mut self) -> Result<(), RunError> {
        while self.running.load(Ordering::SeqCst) {
            let events = match self.source.poll(self.poll_timeout_ms)? {
                PollOutcome::Events(events) => events,
                PollOutcome::Closed => {
                    log::info!("Input source closed");
                    return Ok(());
                }
            };

            for (idx, event) in events.iter().enumerate() {
                if !self.running.load(Ordering::SeqCst) {
                    log::debug!("Stop requested, dropping {} pending event(s)", events.len() - idx);
                    return Ok(());
                }
                let outcome = self.engine.process(*event, &mut self.sink)?;
                log::debug!("{} -> {:?}", event, outcome);
                self.stats.record(&outcome);
            }
        }
        log::info!("Stop requested");
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), SinkError> {
        self.source.release();
        self.sink.close()
    }

    /// Ask the loop to stop before the next event
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn running(&self) -> &Arc<AtomicBool> {
        &self.running
    }

    pub fn engine(&self) -> &RemapEngine {
        &self.engine
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn into_parts(self) -> (RemapEngine, S, K) {
        (self.engine, self.source, self.sink)
    }
}
