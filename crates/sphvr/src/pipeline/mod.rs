pub mod events;

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use gstreamer as gst;
use gstreamer::glib;
use gstreamer::prelude::*;

use crate::framework::Framework;
use crate::orientation::OrientationTarget;
use crate::sink::SinkKind;

/// Name given to the file source in the pipeline description.
pub const SOURCE_NAME: &str = "src";
/// Name given to the VR compositor in the pipeline description.
pub const COMPOSITOR_NAME: &str = "comp";
/// Name given to the display sink in the pipeline description.
pub const SINK_NAME: &str = "sink";
/// Compositor property that takes the view quaternion.
pub const ORIENTATION_PROPERTY: &str = "orientation";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("element factory `{0}` is not installed")]
    MissingFactory(String),
    #[error("invalid pipeline description: {0}")]
    Parse(#[source] glib::Error),
    #[error("pipeline description did not produce a pipeline")]
    NotAPipeline,
    #[error("element `{0}` not found in pipeline")]
    MissingElement(&'static str),
    #[error("compositor has no `{0}` property")]
    MissingProperty(&'static str),
    #[error("compositor property `{name}` is `{found}`, expected a GVariant accepting `ad`")]
    WrongPropertyType { name: &'static str, found: String },
    #[error("video path is not valid UTF-8: {}", .0.display())]
    InvalidPath(PathBuf),
    #[error("pipeline has no bus")]
    NoBus,
    #[error("failed to set pipeline state to {0:?}")]
    StateChange(gst::State),
}

/// Textual layout of the five-stage VR playback chain.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSpec {
    pub sink: SinkKind,
}

impl PipelineSpec {
    pub fn new(sink: SinkKind) -> Self {
        Self { sink }
    }

    /// Factories that must be installed for the description to parse.
    pub fn required_factories(&self) -> Vec<&str> {
        let mut factories = vec!["filesrc", "decodebin", "glupload", "vrcompositor"];
        factories.extend(self.sink.required_factories());
        factories
    }

    pub fn description(&self) -> String {
        format!(
            "filesrc name={SOURCE_NAME} ! decodebin ! glupload ! vrcompositor name={COMPOSITOR_NAME} ! {}",
            self.sink.description(SINK_NAME)
        )
    }
}

/// A built VR playback pipeline. Set to `Null` when dropped.
pub struct VrPipeline<'fw> {
    pipeline: gst::Pipeline,
    compositor: gst::Element,
    sink: gst::Element,
    _framework: PhantomData<&'fw Framework>,
}

impl<'fw> VrPipeline<'fw> {
    pub fn build(
        framework: &'fw Framework,
        spec: &PipelineSpec,
        video_path: &Path,
    ) -> Result<Self, PipelineError> {
        for factory in spec.required_factories() {
            if !framework.has_element(factory) {
                return Err(PipelineError::MissingFactory(factory.to_string()));
            }
        }

        let location = video_path
            .to_str()
            .ok_or_else(|| PipelineError::InvalidPath(video_path.to_path_buf()))?;
        if !video_path.exists() {
            log::warn!("Video file {} does not exist yet", video_path.display());
        }

        let description = spec.description();
        let pipeline = Self::launch(framework, &description)?;

        let source = pipeline
            .pipeline
            .by_name(SOURCE_NAME)
            .ok_or(PipelineError::MissingElement(SOURCE_NAME))?;
        source.set_property("location", location);

        require_variant_property(&pipeline.compositor, ORIENTATION_PROPERTY)?;

        log::info!("Pipeline ready for {}", video_path.display());
        Ok(pipeline)
    }

    /// Parse `description` and look up the compositor and sink by name.
    /// The compositor's orientation property is not checked here.
    pub(crate) fn launch(_framework: &'fw Framework, description: &str) -> Result<Self, PipelineError> {
        log::debug!("Launching pipeline: {description}");
        let pipeline = gst::parse::launch(description)
            .map_err(PipelineError::Parse)?
            .downcast::<gst::Pipeline>()
            .map_err(|_| PipelineError::NotAPipeline)?;

        let compositor = pipeline
            .by_name(COMPOSITOR_NAME)
            .ok_or(PipelineError::MissingElement(COMPOSITOR_NAME))?;
        let sink = pipeline
            .by_name(SINK_NAME)
            .ok_or(PipelineError::MissingElement(SINK_NAME))?;

        Ok(Self {
            pipeline,
            compositor,
            sink,
            _framework: PhantomData,
        })
    }

    pub fn pipeline(&self) -> &gst::Pipeline {
        &self.pipeline
    }

    /// The compositor element, as an orientation target.
    pub fn compositor(&self) -> &gst::Element {
        &self.compositor
    }

    pub fn sink(&self) -> &gst::Element {
        &self.sink
    }

    pub fn bus(&self) -> Result<gst::Bus, PipelineError> {
        self.pipeline.bus().ok_or(PipelineError::NoBus)
    }

    pub fn set_state(&self, state: gst::State) -> Result<(), PipelineError> {
        self.pipeline
            .set_state(state)
            .map_err(|_| PipelineError::StateChange(state))?;
        log::debug!("Pipeline state -> {state:?}");
        Ok(())
    }

    /// Current pipeline state, without waiting for pending transitions.
    pub fn current_state(&self) -> gst::State {
        self.pipeline.current_state()
    }

    pub fn play(&self) -> Result<(), PipelineError> {
        self.set_state(gst::State::Playing)
    }

    pub fn pause(&self) -> Result<(), PipelineError> {
        self.set_state(gst::State::Paused)
    }

    /// Flushing seek to the current position, used to redraw a paused frame.
    pub fn flush_seek(&self) {
        let Some(position) = self.pipeline.query_position::<gst::ClockTime>() else {
            log::debug!("No position to seek to");
            return;
        };
        if let Err(e) = self
            .pipeline
            .seek_simple(gst::SeekFlags::FLUSH | gst::SeekFlags::ACCURATE, position)
        {
            log::warn!("Flush seek failed: {e}");
        }
    }

    pub fn release(&self) {
        if let Err(e) = self.set_state(gst::State::Null) {
            log::error!("Failed to release pipeline: {e}");
        }
    }
}

impl Drop for VrPipeline<'_> {
    fn drop(&mut self) {
        self.pipeline.set_state(gst::State::Null).ok();
    }
}

/// `set_property` panics on a type mismatch, so the value type is checked
/// once here instead of on every tick.
pub fn require_variant_property(
    element: &gst::Element,
    name: &'static str,
) -> Result<(), PipelineError> {
    let pspec = element
        .find_property(name)
        .ok_or(PipelineError::MissingProperty(name))?;
    let wrong_type = || PipelineError::WrongPropertyType {
        name,
        found: pspec.value_type().name().to_string(),
    };
    if pspec.value_type() != glib::Variant::static_type() {
        return Err(wrong_type());
    }
    let accepts_doubles = pspec
        .downcast_ref::<glib::ParamSpecVariant>()
        .and_then(|p| p.type_())
        .is_some_and(|t| glib::VariantTy::new("ad").is_ok_and(|ad| ad.is_subtype_of(t)));
    if !accepts_doubles {
        return Err(wrong_type());
    }
    Ok(())
}

impl OrientationTarget for gst::Element {
    fn set_orientation(&self, quat: [f64; 4]) {
        let variant = quat.to_vec().to_variant();
        self.set_property(ORIENTATION_PROPERTY, variant);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_description_matches_gl_chain() {
        let spec = PipelineSpec::new(SinkKind::GlOverlay);
        assert_eq!(
            spec.description(),
            "filesrc name=src ! decodebin ! glupload ! vrcompositor name=comp ! glimagesink name=sink"
        );
    }

    #[test]
    fn overlay_sink_downloads_from_gl() {
        let spec = PipelineSpec::new(SinkKind::Overlay("xvimagesink".into()));
        let desc = spec.description();
        assert!(desc.ends_with("gldownload ! videoconvert ! xvimagesink name=sink"), "{desc}");
        assert!(spec.required_factories().contains(&"xvimagesink"));
        assert!(spec.required_factories().contains(&"gldownload"));
    }

    #[test]
    fn required_factories_cover_all_stages() {
        let spec = PipelineSpec::new(SinkKind::GlOverlay);
        assert_eq!(
            spec.required_factories(),
            vec!["filesrc", "decodebin", "glupload", "vrcompositor", "glimagesink"]
        );
    }

    #[test]
    fn missing_factory_is_fatal() {
        let framework = Framework::init_shared().unwrap();
        let spec = PipelineSpec::new(SinkKind::Overlay("definitely-not-a-sink".into()));
        let err = match VrPipeline::build(&framework, &spec, Path::new("/tmp/video.mp4")) {
            Err(e) => e,
            Ok(_) => panic!("build should fail"),
        };
        assert!(matches!(err, PipelineError::MissingFactory(_)), "{err}");
    }

    #[test]
    fn non_variant_property_is_rejected() {
        gst::init().unwrap();
        let fakesink = gst::ElementFactory::make("fakesink").build().unwrap();
        let err = require_variant_property(&fakesink, "sync").unwrap_err();
        match err {
            PipelineError::WrongPropertyType { name, found } => {
                assert_eq!(name, "sync");
                assert_eq!(found, "gboolean");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn absent_property_is_rejected() {
        gst::init().unwrap();
        let identity = gst::ElementFactory::make("identity").build().unwrap();
        assert!(matches!(
            require_variant_property(&identity, ORIENTATION_PROPERTY),
            Err(PipelineError::MissingProperty("orientation"))
        ));
    }

    #[test]
    fn launch_requires_named_compositor_and_sink() {
        let framework = Framework::init_shared().unwrap();
        let err = match VrPipeline::launch(&framework, "fakesrc ! identity name=comp ! fakesink") {
            Err(e) => e,
            Ok(_) => panic!("launch should fail without a sink name"),
        };
        assert!(matches!(err, PipelineError::MissingElement("sink")), "{err}");
    }

    #[test]
    fn orientation_variant_is_double_array() {
        let variant = [0.0f64, 0.0, 0.0, 1.0].to_vec().to_variant();
        assert_eq!(variant.type_().as_str(), "ad");
        assert_eq!(variant.get::<Vec<f64>>(), Some(vec![0.0, 0.0, 0.0, 1.0]));
    }
}
