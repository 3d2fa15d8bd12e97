#[cfg(feature = "cli")]
use std::sync::atomic::{AtomicU64, Ordering};
#[cfg(feature = "cli")]
use std::sync::Mutex;
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{MemoryRefreshKind, Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

#[cfg(feature = "cli")]
const MIB: u64 = 1024 * 1024;

/// Resource usage of this process at one job checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSample {
    pub cpu_percent: f32,
    pub rss_mb: u64,
    pub rss_share: f32,
    pub peak_rss_mb: u64,
    pub since_start: Duration,
}

#[cfg(feature = "cli")]
struct Sampler {
    system: Mutex<System>,
    pid: Pid,
    peak_rss_mb: AtomicU64,
}

#[cfg(feature = "cli")]
impl Sampler {
    fn for_current_process() -> Option<Self> {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => pid,
            Err(e) => {
                tracing::warn!("Process monitor disabled, no PID available: {}", e);
                return None;
            }
        };

        // RAM totals plus this one process, nothing else
        let system = System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::nothing().with_ram()),
        );
        let sampler = Self {
            system: Mutex::new(system),
            pid,
            peak_rss_mb: AtomicU64::new(0),
        };
        sampler.refresh_process();
        Some(sampler)
    }

    fn refresh_process(&self) -> Option<()> {
        let mut system = self.system.lock().ok()?;
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );
        Some(())
    }

    fn sample(&self, since_start: Duration) -> Option<PhaseSample> {
        self.refresh_process()?;
        let system = self.system.lock().ok()?;
        let process = system.process(self.pid)?;

        let rss_mb = process.memory() / MIB;
        let total_mb = system.total_memory() / MIB;
        let peak_rss_mb = self.peak_rss_mb.fetch_max(rss_mb, Ordering::Relaxed).max(rss_mb);

        Some(PhaseSample {
            cpu_percent: process.cpu_usage(),
            rss_mb,
            rss_share: if total_mb > 0 {
                rss_mb as f32 / total_mb as f32 * 100.0
            } else {
                0.0
            },
            peak_rss_mb,
            since_start,
        })
    }
}

// No process sampling without the cli feature.
#[cfg(not(feature = "cli"))]
struct Sampler;

#[cfg(not(feature = "cli"))]
impl Sampler {
    fn for_current_process() -> Option<Self> {
        tracing::warn!("Process monitor requested but built without the cli feature");
        None
    }

    fn sample(&self, _since_start: Duration) -> Option<PhaseSample> {
        None
    }
}

/// Logs CPU and memory of the sync process at job checkpoints (`--monitor`).
///
/// A disabled monitor never touches the process table.
pub struct ProcessMonitor {
    sampler: Option<Sampler>,
    started: Instant,
}

impl ProcessMonitor {
    pub fn new(enabled: bool) -> Self {
        Self {
            sampler: if enabled {
                Sampler::for_current_process()
            } else {
                None
            },
            started: Instant::now(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.sampler.is_some()
    }

    pub fn sample(&self) -> Option<PhaseSample> {
        self.sampler.as_ref()?.sample(self.started.elapsed())
    }

    pub fn checkpoint(&self, phase: &str) {
        if let Some(s) = self.sample() {
            tracing::info!(
                "📊 {}: CPU {:.1}%, RSS {}MB ({:.1}% of RAM), after {:.1}s",
                phase,
                s.cpu_percent,
                s.rss_mb,
                s.rss_share,
                s.since_start.as_secs_f64()
            );
        }
    }

    pub fn finish(&self) {
        if let Some(s) = self.sample() {
            tracing::info!(
                "📊 Job finished in {:.1}s, peak RSS {}MB",
                s.since_start.as_secs_f64(),
                s.peak_rss_mb
            );
        }
    }
}

impl Default for ProcessMonitor {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_has_no_sampler() {
        let monitor = ProcessMonitor::disabled();
        assert!(monitor.sampler.is_none());
        assert!(!monitor.is_enabled());
        assert!(monitor.sample().is_none());
    }

    #[test]
    fn test_peak_never_below_current() {
        let monitor = ProcessMonitor::new(true);
        let Some(first) = monitor.sample() else {
            return;
        };
        let _ballast = vec![1u8; 4 * MIB as usize];
        let second = monitor.sample().unwrap();
        assert!(second.peak_rss_mb >= first.rss_mb);
        assert!(second.peak_rss_mb >= second.rss_mb);
        assert!(second.since_start >= first.since_start);
    }
}
