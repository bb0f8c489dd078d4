use std::marker::PhantomData;

use gstreamer as gst;

/// Scoped GStreamer initialization.
///
/// Pipelines are built against a borrowed `Framework`, so they cannot outlive
/// it. Dropping the guard deinitializes GStreamer unless it was created with
/// [`Framework::init_shared`].
pub struct Framework {
    deinit_on_drop: bool,
    // GStreamer must be torn down from the thread that owns the main loop.
    _not_send: PhantomData<*const ()>,
}

impl Framework {
    pub fn init() -> Result<Self, gst::glib::Error> {
        gst::init()?;
        let (major, minor, micro, _) = gst::version();
        log::info!("GStreamer {major}.{minor}.{micro} initialized");
        Ok(Self {
            deinit_on_drop: true,
            _not_send: PhantomData,
        })
    }

    /// Initialize without tearing down on drop. For tests, where several
    /// guards share one process.
    pub fn init_shared() -> Result<Self, gst::glib::Error> {
        gst::init()?;
        Ok(Self {
            deinit_on_drop: false,
            _not_send: PhantomData,
        })
    }

    pub fn has_element(&self, factory: &str) -> bool {
        gst::ElementFactory::find(factory).is_some()
    }
}

impl Drop for Framework {
    fn drop(&mut self) {
        if self.deinit_on_drop {
            log::debug!("Deinitializing GStreamer");
            // SAFETY: `VrPipeline` borrows this guard, so no pipeline wrapper is
            // alive here. Element clones taken from a pipeline can still escape
            // that borrow; callers must drop every driver, window player and
            // element clone before this guard, as `main` does by scoping them
            // inside it. The guard is !Send, so this runs on the initializing
            // thread.
            unsafe { gst::deinit() };
        }
    }
}
