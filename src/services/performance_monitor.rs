//! Background performance monitor.
//!
//! Samples recent iteration latency on a fixed interval and switches the
//! loop between normal and reduced operation. It never touches loop state:
//! decisions are published as [`RuntimeDirectives`] on a watch channel the
//! loop reads at iteration boundaries, and the only side effect is clearing
//! the history cache.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::time::{interval, Instant};
use tracing::{debug, info, warn};

use crate::domain::models::{MonitorConfig, PerformanceMode, RuntimeDirectives};
use crate::domain::ports::CacheControl;

/// Samples kept in the metrics buffer.
const METRICS_CAPACITY: usize = 256;

/// Wall-clock durations of recent iterations, shared between the loop
/// (writer) and the monitor (reader).
#[derive(Debug, Clone, Default)]
pub struct IterationMetrics {
    samples: Arc<Mutex<VecDeque<Duration>>>,
}

impl IterationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, duration: Duration) {
        let mut samples = self
            .samples
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if samples.len() == METRICS_CAPACITY {
            samples.pop_front();
        }
        samples.push_back(duration);
    }

    /// Up to `n` most recent samples, oldest first.
    pub fn recent(&self, n: usize) -> Vec<Duration> {
        let samples = self
            .samples
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let skip = samples.len().saturating_sub(n);
        samples.iter().skip(skip).copied().collect()
    }

    /// Mean of the `n` most recent samples.
    pub fn mean_recent(&self, n: usize) -> Option<Duration> {
        let recent = self.recent(n);
        if recent.is_empty() {
            return None;
        }
        let total: Duration = recent.iter().sum();
        Some(total / recent.len() as u32)
    }

    pub fn len(&self) -> usize {
        self.samples
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Monitor timing and thresholds.
#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    /// Interval between samples.
    pub interval: Duration,
    /// Mean latency above which reduced mode is entered.
    pub latency_threshold: Duration,
    /// Number of recent iterations averaged per sample.
    pub window: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl From<&MonitorConfig> for MonitorSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            latency_threshold: Duration::from_millis(config.latency_threshold_ms),
            window: config.window.max(1),
        }
    }
}

/// Event emitted by the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    Started,
    /// No iteration has finished yet.
    NoSamples { tick: u64 },
    /// Latency sampled, mode unchanged.
    Sampled {
        tick: u64,
        mean_ms: u64,
        mode: PerformanceMode,
    },
    /// Operating mode switched.
    ModeChanged {
        tick: u64,
        mean_ms: u64,
        from: PerformanceMode,
        to: PerformanceMode,
    },
    Stopped,
}

/// Monitor status snapshot.
#[derive(Debug, Clone, Default)]
pub struct MonitorStatus {
    pub running: bool,
    pub ticks: u64,
    pub mode_changes: u64,
    pub cache_clears: u64,
    pub last_mean: Option<Duration>,
}

/// Handle to control a running monitor.
pub struct MonitorHandle {
    stop_flag: Arc<AtomicBool>,
    status: Arc<RwLock<MonitorStatus>>,
}

impl MonitorHandle {
    /// Request the monitor to stop at its next tick.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }

    pub async fn status(&self) -> MonitorStatus {
        self.status.read().await.clone()
    }
}

/// Latency-driven mode switcher.
pub struct PerformanceMonitor {
    settings: MonitorSettings,
    metrics: IterationMetrics,
    cache: Option<Arc<dyn CacheControl>>,
    directives: watch::Sender<RuntimeDirectives>,
    status: Arc<RwLock<MonitorStatus>>,
    stop_flag: Arc<AtomicBool>,
}

impl PerformanceMonitor {
    pub fn new(settings: MonitorSettings, metrics: IterationMetrics) -> Self {
        let (directives, _) = watch::channel(RuntimeDirectives::default());
        Self {
            settings,
            metrics,
            cache: None,
            directives,
            status: Arc::new(RwLock::new(MonitorStatus::default())),
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cache cleared when entering reduced mode.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn CacheControl>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Receiver the loop controller reads directives from.
    pub fn directives(&self) -> watch::Receiver<RuntimeDirectives> {
        self.directives.subscribe()
    }

    pub fn handle(&self) -> MonitorHandle {
        MonitorHandle {
            stop_flag: self.stop_flag.clone(),
            status: self.status.clone(),
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Spawn the monitor, returning a channel for events.
    pub fn run(self) -> mpsc::Receiver<MonitorEvent> {
        let (tx, rx) = mpsc::channel(100);
        tokio::spawn(async move {
            self.run_loop(tx).await;
        });
        rx
    }

    async fn run_loop(self, tx: mpsc::Sender<MonitorEvent>) {
        self.status.write().await.running = true;
        let _ = tx.send(MonitorEvent::Started).await;
        info!(
            interval_secs = self.settings.interval.as_secs(),
            threshold_ms = self.settings.latency_threshold.as_millis() as u64,
            "performance monitor started"
        );

        let mut timer = interval(self.settings.interval);
        loop {
            timer.tick().await;
            if self.stop_flag.load(Ordering::Acquire) {
                break;
            }
            let event = self.sample_once().await;
            if tx.send(event).await.is_err() {
                debug!("monitor event receiver dropped");
            }
        }

        self.status.write().await.running = false;
        let _ = tx.send(MonitorEvent::Stopped).await;
        info!("performance monitor stopped");
    }

    /// Take one latency sample and publish a directive if the mode changes.
    pub async fn sample_once(&self) -> MonitorEvent {
        let started = Instant::now();
        let tick = {
            let mut status = self.status.write().await;
            status.ticks += 1;
            status.ticks
        };

        let Some(mean) = self.metrics.mean_recent(self.settings.window) else {
            debug!(tick, "no iteration samples yet");
            return MonitorEvent::NoSamples { tick };
        };
        let mean_ms = mean.as_millis() as u64;
        self.status.write().await.last_mean = Some(mean);

        let current = self.directives.borrow().mode;
        let target = if mean > self.settings.latency_threshold {
            PerformanceMode::Reduced
        } else {
            PerformanceMode::Normal
        };

        if target == current {
            debug!(tick, mean_ms, mode = ?current, "latency sampled");
            return MonitorEvent::Sampled {
                tick,
                mean_ms,
                mode: current,
            };
        }

        self.directives.send_replace(RuntimeDirectives { mode: target });
        let mut cleared = false;
        if target == PerformanceMode::Reduced {
            if let Some(cache) = &self.cache {
                cache.clear().await;
                cleared = true;
            }
            warn!(
                tick,
                mean_ms,
                threshold_ms = self.settings.latency_threshold.as_millis() as u64,
                "iteration latency high, switching to reduced mode"
            );
        } else {
            info!(tick, mean_ms, "iteration latency recovered, back to normal mode");
        }

        {
            let mut status = self.status.write().await;
            status.mode_changes += 1;
            if cleared {
                status.cache_clears += 1;
            }
        }
        debug!(elapsed_us = started.elapsed().as_micros() as u64, "sample done");

        MonitorEvent::ModeChanged {
            tick,
            mean_ms,
            from: current,
            to: target,
        }
    }
}
