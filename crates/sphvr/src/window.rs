use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use gstreamer as gst;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::driver::RunSummary;
use crate::framework::Framework;
use crate::interrupt::InterruptGuard;
use crate::orientation::{OrientationAnimator, OrientationState};
use crate::pipeline::events::{EventHandler, LoopAction, PipelineEvent};
use crate::pipeline::{PipelineSpec, VrPipeline};
use crate::settings::SphvrConfig;
use crate::sink::{self, VideoSinkBinding};

/// Delay before re-seeking a paused pipeline after a click, so the sink has
/// finished handling the button press.
const CLICK_SEEK_DELAY: Duration = Duration::from_millis(90);

/// Plays the VR pipeline inside a winit window. The orientation tick and bus
/// draining both run from the winit loop.
struct WindowPlayer<'fw> {
    pipeline: VrPipeline<'fw>,
    sink: Box<dyn VideoSinkBinding>,
    animator: OrientationAnimator<gst::Element>,
    handler: EventHandler,
    bus: gst::Bus,
    window: Option<Window>,
    config: SphvrConfig,
    next_tick: Instant,
    pending_seek: Option<Instant>,
    failure: Option<anyhow::Error>,
    interrupt: InterruptGuard,
}

impl<'fw> WindowPlayer<'fw> {
    fn new(framework: &'fw Framework, video_path: &Path, config: &SphvrConfig) -> Result<Self> {
        let spec = PipelineSpec::new(config.sink.clone());
        let pipeline = VrPipeline::build(framework, &spec, video_path)?;
        let sink = sink::binding_for(
            &config.sink,
            pipeline.sink().clone(),
            config.window_width,
            config.window_height,
        )?;
        let bus = pipeline.bus()?;
        let state = OrientationState::new(config.initial_roll, config.initial_pitch, config.initial_yaw);
        let animator = OrientationAnimator::new(state, config.pitch_step, pipeline.compositor().clone());

        Ok(Self {
            pipeline,
            sink,
            animator,
            handler: EventHandler::new(config.stop_on_eos),
            bus,
            window: None,
            config: config.clone(),
            next_tick: Instant::now(),
            pending_seek: None,
            failure: None,
            interrupt: InterruptGuard::install(|| {}),
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure = Some(err);
        event_loop.exit();
    }

    fn toggle_playback(&mut self) {
        let result = if self.pipeline.current_state() == gst::State::Playing {
            log::info!("Paused");
            self.pipeline.pause()
        } else {
            log::info!("Playing");
            self.pipeline.play()
        };
        if let Err(e) = result {
            log::error!("{e}");
        }
    }

    fn drain_bus(&mut self, event_loop: &ActiveEventLoop) {
        while let Some(msg) = self.bus.pop() {
            let event = PipelineEvent::from_message(&msg, Some(self.pipeline.pipeline()));
            if self.handler.handle(&event) == LoopAction::Quit {
                event_loop.exit();
            }
        }
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            ticks: self.animator.ticks(),
            eos_count: self.handler.eos_count(),
            error_count: self.handler.error_count(),
        }
    }
}

impl ApplicationHandler for WindowPlayer<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title("sphvr")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => w,
            Err(e) => return self.fail(event_loop, anyhow::anyhow!("Failed to create window: {e}")),
        };

        // The window is realized at this point, so the handle query can succeed.
        if let Err(e) = sink::attach(self.sink.as_mut(), &window) {
            return self.fail(event_loop, e.into());
        }
        let size = window.inner_size();
        self.sink.resize(size.width, size.height);
        self.window = Some(window);

        if let Err(e) = self.pipeline.play() {
            return self.fail(event_loop, e.into());
        }
        self.next_tick = Instant::now() + self.config.tick_interval();
        log::info!("Window playback started");
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => self.sink.resize(size.width, size.height),
            WindowEvent::RedrawRequested => self.sink.expose(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Space => self.toggle_playback(),
                _ => {}
            },
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                ..
            } => {
                if self.pipeline.current_state() == gst::State::Paused {
                    self.pending_seek = Some(Instant::now() + CLICK_SEEK_DELAY);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.interrupt.poll() {
            event_loop.exit();
            return;
        }
        if self.window.is_none() {
            return;
        }

        self.drain_bus(event_loop);

        let now = Instant::now();
        if now >= self.next_tick {
            self.animator.tick();
            self.next_tick += self.config.tick_interval();
            if self.next_tick < now {
                // Fell behind (window dragged, system suspended); skip the backlog.
                self.next_tick = now + self.config.tick_interval();
            }
        }

        if let Some(at) = self.pending_seek {
            if now >= at {
                self.pending_seek = None;
                self.pipeline.flush_seek();
            }
        }

        let wake = match self.pending_seek {
            Some(at) => at.min(self.next_tick),
            None => self.next_tick,
        };
        event_loop.set_control_flow(ControlFlow::WaitUntil(wake));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.pipeline.release();
    }
}

/// Play `video_path` in a native window until it is closed.
pub fn run(framework: &Framework, video_path: &Path, config: &SphvrConfig) -> Result<RunSummary> {
    let mut player = WindowPlayer::new(framework, video_path, config)?;
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut player)?;

    if let Some(err) = player.failure.take() {
        return Err(err);
    }
    let summary = player.summary();
    log::info!(
        "Window closed after {} ticks ({} eos, {} errors)",
        summary.ticks,
        summary.eos_count,
        summary.error_count
    );
    Ok(summary)
}
