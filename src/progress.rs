//! Progress reporting for the resampling loop.
//!
//! With the `progress` feature a live `indicatif` bar shows the resample count and the
//! duration of solver runs. Without it, [`ResampleProgress`] compiles to no-ops so the
//! loop code is the same in both builds.
use std::time::{Duration, Instant};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Wall-clock statistics of the solver runs seen so far.
#[derive(Debug, Clone)]
pub(crate) struct RunClock {
    started: Instant,
    total: Duration,
    runs: u32,
}

impl RunClock {
    pub(crate) fn new() -> Self {
        RunClock {
            started: Instant::now(),
            total: Duration::ZERO,
            runs: 0,
        }
    }

    /// Close the current run, start the next one; returns the closed run's duration.
    pub(crate) fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.duration_since(self.started);
        self.started = now;
        self.total += dt;
        self.runs += 1;
        dt
    }

    pub(crate) fn mean(&self) -> Duration {
        if self.runs == 0 {
            Duration::ZERO
        } else {
            self.total / self.runs
        }
    }
}

/// `"253µs"`, `"42ms"` or `"3.14s"` depending on the scale.
pub(crate) fn format_duration(d: Duration) -> String {
    match d.as_micros() {
        us if us < 1_000 => format!("{us}µs"),
        us if us < 1_000_000 => format!("{}ms", us / 1_000),
        _ => format!("{:.2}s", d.as_secs_f32()),
    }
}

pub(crate) struct ResampleProgress {
    clock: RunClock,
    #[cfg(feature = "progress")]
    bar: ProgressBar,
}

impl ResampleProgress {
    pub(crate) fn new(total: usize) -> Self {
        #[cfg(feature = "progress")]
        let bar = {
            let bar = ProgressBar::new((total as u64).max(1));
            if let Ok(style) = ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos}/{len} resamples | ETA {eta_precise} | {msg}",
            ) {
                bar.set_style(style);
            }
            bar
        };
        #[cfg(not(feature = "progress"))]
        let _ = total;

        ResampleProgress {
            clock: RunClock::new(),
            #[cfg(feature = "progress")]
            bar,
        }
    }

    /// One resample finished.
    pub(crate) fn advance(&mut self) {
        let last = self.clock.lap();
        tracing::trace!(
            last = %format_duration(last),
            mean = %format_duration(self.clock.mean()),
            "resample done"
        );
        #[cfg(feature = "progress")]
        {
            self.bar.set_message(format!(
                "last: {}, mean: {}",
                format_duration(last),
                format_duration(self.clock.mean())
            ));
            self.bar.inc(1);
        }
    }

    pub(crate) fn finish(self) {
        #[cfg(feature = "progress")]
        self.bar.finish_and_clear();
    }
}
