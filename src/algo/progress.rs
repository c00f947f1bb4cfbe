//! Progress reporting for the relaxation loop.
//!
//! ```
//! use distmesh::algo::progress::Progress;
//!
//! let progress = Progress::new(|step, max_steps, message| {
//!     if step % 100 == 0 {
//!         println!("[{}/{}] {}", step, max_steps, message);
//!     }
//! });
//! progress.report(0, 10, "relaxing");
//! ```

/// A callback receiving `(current, total, message)` updates.
///
/// For relaxation `current` is the step index and `total` the step cap;
/// runs usually converge long before `total` is reached.
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// A reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}
