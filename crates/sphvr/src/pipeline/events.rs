use gstreamer as gst;
use gstreamer::prelude::*;

/// Bus message reduced to what the playback loop reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    EndOfStream,
    Error {
        source: Option<String>,
        message: String,
        debug: Option<String>,
    },
    Warning {
        source: Option<String>,
        message: String,
        debug: Option<String>,
    },
    /// State change of the top-level pipeline. Child element transitions are
    /// reported as `Other`.
    StateChanged { old: gst::State, new: gst::State },
    Other,
}

impl PipelineEvent {
    pub fn from_message(msg: &gst::Message, pipeline: Option<&gst::Pipeline>) -> Self {
        use gst::MessageView;

        let source = || msg.src().map(|s| s.path_string().to_string());
        match msg.view() {
            MessageView::Eos(..) => PipelineEvent::EndOfStream,
            MessageView::Error(err) => PipelineEvent::Error {
                source: source(),
                message: err.error().to_string(),
                debug: err.debug().map(|d| d.to_string()),
            },
            MessageView::Warning(w) => PipelineEvent::Warning {
                source: source(),
                message: w.error().to_string(),
                debug: w.debug().map(|d| d.to_string()),
            },
            MessageView::StateChanged(sc) => {
                let from_pipeline = match (pipeline, msg.src()) {
                    (Some(p), Some(src)) => src == p.upcast_ref::<gst::Object>(),
                    _ => false,
                };
                if from_pipeline {
                    PipelineEvent::StateChanged {
                        old: sc.old(),
                        new: sc.current(),
                    }
                } else {
                    PipelineEvent::Other
                }
            }
            _ => PipelineEvent::Other,
        }
    }
}

/// What the dispatcher should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Continue,
    Quit,
}

/// Logs bus events and decides whether the loop keeps running.
#[derive(Debug, Default)]
pub struct EventHandler {
    stop_on_eos: bool,
    eos_count: u32,
    error_count: u32,
    warning_count: u32,
}

impl EventHandler {
    pub fn new(stop_on_eos: bool) -> Self {
        Self {
            stop_on_eos,
            ..Default::default()
        }
    }

    pub fn handle(&mut self, event: &PipelineEvent) -> LoopAction {
        match event {
            PipelineEvent::EndOfStream => self.on_eos(),
            PipelineEvent::Error { source, message, debug } => {
                self.on_error(source.as_deref(), message, debug.as_deref())
            }
            PipelineEvent::Warning { source, message, debug } => {
                self.warning_count += 1;
                log::warn!(
                    "Warning from {}: {message} ({})",
                    source.as_deref().unwrap_or("pipeline"),
                    debug.as_deref().unwrap_or("no debug info")
                );
                LoopAction::Continue
            }
            PipelineEvent::StateChanged { old, new } => {
                log::debug!("Pipeline {old:?} -> {new:?}");
                LoopAction::Continue
            }
            PipelineEvent::Other => LoopAction::Continue,
        }
    }

    fn on_eos(&mut self) -> LoopAction {
        self.eos_count += 1;
        log::info!("End-of-stream reached");
        if self.stop_on_eos {
            LoopAction::Quit
        } else {
            LoopAction::Continue
        }
    }

    fn on_error(&mut self, source: Option<&str>, message: &str, debug: Option<&str>) -> LoopAction {
        self.error_count += 1;
        log::error!(
            "Error from {}: {message} {}",
            source.unwrap_or("pipeline"),
            debug.unwrap_or("")
        );
        LoopAction::Continue
    }

    pub fn eos_count(&self) -> u32 {
        self.eos_count
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn warning_count(&self) -> u32 {
        self.warning_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_event() -> PipelineEvent {
        PipelineEvent::Error {
            source: Some("/GstPipeline:pipeline0/GstFileSrc:src".into()),
            message: "Resource not found.".into(),
            debug: Some("No such file".into()),
        }
    }

    #[test]
    fn eos_counted_once_and_continues() {
        let mut handler = EventHandler::new(false);
        assert_eq!(handler.handle(&PipelineEvent::EndOfStream), LoopAction::Continue);
        assert_eq!(handler.eos_count(), 1);
        assert_eq!(handler.error_count(), 0);
    }

    #[test]
    fn error_counted_once_and_continues() {
        let mut handler = EventHandler::new(false);
        assert_eq!(handler.handle(&error_event()), LoopAction::Continue);
        assert_eq!(handler.error_count(), 1);
        assert_eq!(handler.eos_count(), 0);
    }

    #[test]
    fn repeated_emissions_count_individually() {
        let mut handler = EventHandler::new(false);
        for _ in 0..3 {
            handler.handle(&PipelineEvent::EndOfStream);
            handler.handle(&error_event());
        }
        handler.handle(&PipelineEvent::Other);
        assert_eq!(handler.eos_count(), 3);
        assert_eq!(handler.error_count(), 3);
    }

    #[test]
    fn stop_on_eos_quits() {
        let mut handler = EventHandler::new(true);
        assert_eq!(handler.handle(&PipelineEvent::EndOfStream), LoopAction::Quit);
        // Errors never stop the loop.
        assert_eq!(handler.handle(&error_event()), LoopAction::Continue);
    }

    #[test]
    fn warnings_and_state_changes_continue() {
        let mut handler = EventHandler::new(true);
        let warning = PipelineEvent::Warning {
            source: None,
            message: "late buffer".into(),
            debug: None,
        };
        assert_eq!(handler.handle(&warning), LoopAction::Continue);
        let change = PipelineEvent::StateChanged {
            old: gst::State::Paused,
            new: gst::State::Playing,
        };
        assert_eq!(handler.handle(&change), LoopAction::Continue);
        assert_eq!(handler.warning_count(), 1);
    }

    #[test]
    fn converts_bus_messages() {
        gst::init().unwrap();
        let eos = gst::message::Eos::new();
        assert_eq!(PipelineEvent::from_message(&eos, None), PipelineEvent::EndOfStream);

        let err = gst::message::Error::builder(gst::ResourceError::NotFound, "missing file")
            .debug("filesrc could not open")
            .build();
        match PipelineEvent::from_message(&err, None) {
            PipelineEvent::Error { message, debug, .. } => {
                assert_eq!(message, "missing file");
                assert_eq!(debug.as_deref(), Some("filesrc could not open"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
