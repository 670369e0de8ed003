//! Initialization and lifecycle management.
//!
//! Only one [`Scenescope`] handle may be alive per process, because the
//! window system allows a single event loop. The handle owns all scene state;
//! dropping it (or calling [`Scenescope::shutdown`]) releases the slot so a
//! later [`Scenescope::init`] succeeds again.

use std::sync::atomic::{AtomicBool, Ordering};

use scenescope_core::{Context, Options, Result, ScenescopeError};
use scenescope_render::ScreenshotCounter;

use crate::Scenescope;

static INSTANCE_LIVE: AtomicBool = AtomicBool::new(false);

/// Marks the process-wide handle slot as taken while alive.
pub(crate) struct InstanceGuard(());

impl InstanceGuard {
    fn acquire() -> Result<Self> {
        INSTANCE_LIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ScenescopeError::DoubleInitialization)?;
        Ok(Self(()))
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        INSTANCE_LIVE.store(false, Ordering::Release);
    }
}

/// Returns whether a [`Scenescope`] handle is currently alive.
#[must_use]
pub fn is_initialized() -> bool {
    INSTANCE_LIVE.load(Ordering::Acquire)
}

impl Scenescope {
    /// Initializes scenescope with default options.
    ///
    /// # Errors
    ///
    /// Returns [`ScenescopeError::DoubleInitialization`] if another handle is
    /// still alive.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use scenescope::*;
    ///
    /// fn main() -> Result<()> {
    ///     let mut viewer = Scenescope::init()?;
    ///     viewer.register_point_cloud("points", vec![Vec3::ZERO, Vec3::X], false)?;
    ///     viewer.show()?;
    ///     Ok(())
    /// }
    /// ```
    pub fn init() -> Result<Self> {
        Self::init_with_options(Options::default())
    }

    /// Initializes scenescope with the given options.
    ///
    /// A second initialization fails even in permissive mode, since there is
    /// no handle to continue with.
    pub fn init_with_options(options: Options) -> Result<Self> {
        let guard = InstanceGuard::acquire()?;
        if options.logs_info() {
            log::info!("{}initialized '{}'", options.print_prefix, options.program_name);
        }
        Ok(Self {
            ctx: Context::new(options),
            user_callback: None,
            screenshots: ScreenshotCounter::default(),
            offscreen: None,
            offscreen_size: None,
            offscreen_extent: None,
            view_camera: None,
            event_loop: None,
            _guard: guard,
        })
    }

    /// Removes every structure and releases the handle.
    ///
    /// Equivalent to dropping the handle, with a log line.
    pub fn shutdown(mut self) {
        self.ctx.remove_all_structures();
        if self.ctx.options.logs_info() {
            log::info!("{}shut down", self.ctx.options.print_prefix);
        }
    }
}
