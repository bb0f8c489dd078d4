use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use gstreamer as gst;
use gstreamer::glib;
use gstreamer::prelude::*;

use crate::framework::Framework;
use crate::interrupt::InterruptGuard;
use crate::orientation::{OrientationAnimator, OrientationState};
use crate::pipeline::events::{EventHandler, LoopAction, PipelineEvent};
use crate::pipeline::{PipelineError, PipelineSpec, VrPipeline};
use crate::settings::SphvrConfig;

/// Quits a running [`OrientationDriver`] loop. Cheap to clone.
#[derive(Clone)]
pub struct StopHandle(glib::MainLoop);

impl StopHandle {
    pub fn stop(&self) {
        self.0.quit();
    }
}

/// Counters reported once the loop has exited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub eos_count: u32,
    pub error_count: u32,
}

/// Plays a spherical video through the VR compositor and sweeps its
/// orientation on a GLib timer.
pub struct OrientationDriver<'fw> {
    pipeline: VrPipeline<'fw>,
    main_loop: glib::MainLoop,
    config: SphvrConfig,
}

impl<'fw> OrientationDriver<'fw> {
    pub fn new(
        framework: &'fw Framework,
        video_path: &Path,
        config: &SphvrConfig,
    ) -> Result<Self, PipelineError> {
        let spec = PipelineSpec::new(config.sink.clone());
        let pipeline = VrPipeline::build(framework, &spec, video_path)?;
        Ok(Self::with_pipeline(pipeline, config))
    }

    pub fn with_pipeline(pipeline: VrPipeline<'fw>, config: &SphvrConfig) -> Self {
        Self {
            pipeline,
            main_loop: glib::MainLoop::new(None, false),
            config: config.clone(),
        }
    }

    pub fn pipeline(&self) -> &VrPipeline<'fw> {
        &self.pipeline
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.main_loop.clone())
    }

    /// Run until a handler or SIGINT quits the loop, then release the pipeline.
    pub fn run(&self) -> Result<RunSummary> {
        let handler = Rc::new(RefCell::new(EventHandler::new(self.config.stop_on_eos)));
        let bus = self.pipeline.bus()?;
        let bus_watch = {
            let handler = Rc::clone(&handler);
            let main_loop = self.main_loop.clone();
            let pipeline = self.pipeline.pipeline().downgrade();
            bus.add_watch_local(move |_, msg| {
                let pipeline = pipeline.upgrade();
                let event = PipelineEvent::from_message(msg, pipeline.as_ref());
                if handler.borrow_mut().handle(&event) == LoopAction::Quit {
                    log::info!("Stopping main loop");
                    main_loop.quit();
                }
                glib::ControlFlow::Continue
            })
            .context("Failed to watch pipeline bus")?
        };

        if let Err(e) = self.pipeline.play() {
            self.pipeline.release();
            return Err(e.into());
        }

        let state = OrientationState::new(
            self.config.initial_roll,
            self.config.initial_pitch,
            self.config.initial_yaw,
        );
        let animator = Rc::new(RefCell::new(OrientationAnimator::new(
            state,
            self.config.pitch_step,
            self.pipeline.compositor().clone(),
        )));
        let tick_source = {
            let animator = Rc::clone(&animator);
            glib::timeout_add_local(self.config.tick_interval(), move || {
                if animator.borrow_mut().tick() {
                    glib::ControlFlow::Continue
                } else {
                    glib::ControlFlow::Break
                }
            })
        };
        let interrupt = {
            let main_loop = self.main_loop.clone();
            InterruptGuard::install(move || main_loop.quit())
        };

        log::info!(
            "Playing, orientation tick every {} ms",
            self.config.tick_interval().as_millis()
        );
        self.main_loop.run();

        tick_source.remove();
        drop(interrupt);
        drop(bus_watch);
        self.pipeline.release();

        let handler = handler.borrow();
        let summary = RunSummary {
            ticks: animator.borrow().ticks(),
            eos_count: handler.eos_count(),
            error_count: handler.error_count(),
        };
        log::info!(
            "Stopped after {} ticks ({} eos, {} errors)",
            summary.ticks,
            summary.eos_count,
            summary.error_count
        );
        Ok(summary)
    }

    pub fn current_state(&self) -> gst::State {
        self.pipeline.current_state()
    }
}
