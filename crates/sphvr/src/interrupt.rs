use std::cell::Cell;
use std::rc::Rc;

use gstreamer::glib;

#[cfg(unix)]
const SIGINT: i32 = 2;

/// SIGINT watch on the default GLib main context.
///
/// The callback runs from whichever loop dispatches that context: the GLib
/// main loop in the driver, or explicit context iteration in window mode.
/// Dropping the guard removes the watch.
pub struct InterruptGuard {
    raised: Rc<Cell<bool>>,
    on_interrupt: Rc<dyn Fn()>,
    source: Option<glib::SourceId>,
}

impl InterruptGuard {
    pub fn install(on_interrupt: impl Fn() + 'static) -> Self {
        let raised = Rc::new(Cell::new(false));
        let on_interrupt: Rc<dyn Fn()> = Rc::new(on_interrupt);

        // Elsewhere Ctrl-C terminates the process without releasing the pipeline.
        #[cfg(unix)]
        let source = {
            let raised = Rc::clone(&raised);
            let on_interrupt = Rc::clone(&on_interrupt);
            Some(glib::unix_signal_add_local(SIGINT, move || {
                log::info!("Interrupted");
                raised.set(true);
                on_interrupt();
                glib::ControlFlow::Continue
            }))
        };
        #[cfg(not(unix))]
        let source = None;

        Self {
            raised,
            on_interrupt,
            source,
        }
    }

    /// Act as if SIGINT had been delivered.
    pub fn raise(&self) {
        self.raised.set(true);
        (self.on_interrupt)();
    }

    pub fn raised(&self) -> bool {
        self.raised.get()
    }

    /// Dispatch pending work on the default context, then report whether an
    /// interrupt arrived. For loops that do not run a GLib main loop.
    pub fn poll(&self) -> bool {
        let context = glib::MainContext::default();
        while context.iteration(false) {}
        self.raised()
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        if let Some(source) = self.source.take() {
            source.remove();
        }
    }
}
