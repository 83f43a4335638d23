//! Progress reporting for long mesh builds.
//!
//! Purely observational: reports monotonically increasing completion fractions to
//! an optional callback and logs every tenth.

use crate::float_types::Real;
use std::time::Instant;

pub struct Pacifier<'a> {
    name: String,
    verbose: bool,
    last_tenth: i32,
    last_fraction: Real,
    started: Instant,
    callback: Option<&'a mut dyn FnMut(Real)>,
}

impl<'a> Pacifier<'a> {
    /// `verbose` controls the log output; the callback is always invoked.
    pub fn start(name: &str, verbose: bool, callback: Option<&'a mut dyn FnMut(Real)>) -> Self {
        if verbose {
            log::info!("building collision mesh for {name}");
        }
        Self {
            name: name.to_string(),
            verbose,
            last_tenth: -1,
            last_fraction: 0.0,
            started: Instant::now(),
            callback,
        }
    }

    /// Report `fraction` done. Values below the last report are raised to it.
    pub fn update(&mut self, fraction: Real) {
        let fraction = fraction.clamp(self.last_fraction, 1.0);
        self.last_fraction = fraction;

        if let Some(callback) = self.callback.as_deref_mut() {
            callback(fraction);
        }

        let tenth = (fraction * 10.0) as i32;
        if tenth > self.last_tenth {
            self.last_tenth = tenth;
            if self.verbose {
                log::info!("{}: {}%", self.name, tenth * 10);
            }
        }
    }

    pub fn finish(mut self) {
        self.update(1.0);
        if self.verbose {
            log::info!(
                "{}: done ({:.2} secs)",
                self.name,
                self.started.elapsed().as_secs_f32()
            );
        }
    }
}
