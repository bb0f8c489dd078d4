pub mod handle;
pub mod overlay;

use serde::{Deserialize, Serialize};

use gstreamer as gst;

pub use handle::{HandleSource, WindowHandle};
pub use overlay::{GlOverlaySink, OverlaySink};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("surface has no native window yet")]
    Unrealized,
    #[error("native window handle is null")]
    NullHandle,
    #[error("windowing platform `{0}` cannot host a video overlay")]
    UnsupportedPlatform(&'static str),
    #[error("element `{0}` does not implement GstVideoOverlay")]
    NotAnOverlay(String),
}

/// Which sink renders into the embedded window.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Any `GstVideoOverlay` sink fed with system-memory frames.
    Overlay(String),
    /// `glimagesink`, fed directly with GL memory.
    #[default]
    GlOverlay,
}

impl SinkKind {
    pub fn factory(&self) -> &str {
        match self {
            SinkKind::Overlay(factory) => factory,
            SinkKind::GlOverlay => "glimagesink",
        }
    }

    pub fn required_factories(&self) -> Vec<&str> {
        match self {
            SinkKind::Overlay(factory) => vec!["gldownload", "videoconvert", factory],
            SinkKind::GlOverlay => vec!["glimagesink"],
        }
    }

    /// Pipeline fragment that takes GL memory and ends in a sink named `name`.
    pub fn description(&self, name: &str) -> String {
        match self {
            SinkKind::Overlay(factory) => {
                format!("gldownload ! videoconvert ! {factory} name={name}")
            }
            SinkKind::GlOverlay => format!("glimagesink name={name}"),
        }
    }
}

/// A video sink that can render into a foreign native window.
pub trait VideoSinkBinding {
    fn element(&self) -> &gst::Element;

    /// Hand the sink a native window. Call only once the window is realized.
    fn bind_handle(&mut self, handle: WindowHandle) -> Result<(), SinkError>;

    fn bound_handle(&self) -> Option<WindowHandle>;

    /// Window was resized to `width` x `height` physical pixels.
    fn resize(&mut self, width: u32, height: u32);

    /// Ask the sink to redraw its last frame.
    fn expose(&self);
}

/// Wrap `element` in the binding that matches `kind`.
pub fn binding_for(
    kind: &SinkKind,
    element: gst::Element,
    width: u32,
    height: u32,
) -> Result<Box<dyn VideoSinkBinding>, SinkError> {
    Ok(match kind {
        SinkKind::Overlay(_) => Box::new(OverlaySink::new(element)?),
        SinkKind::GlOverlay => Box::new(GlOverlaySink::new(element, width, height)?),
    })
}

/// Acquire the surface's handle and bind it in one step.
pub fn attach(
    sink: &mut dyn VideoSinkBinding,
    surface: &impl HandleSource,
) -> Result<WindowHandle, SinkError> {
    let handle = surface.acquire_handle()?;
    sink.bind_handle(handle)?;
    Ok(handle)
}
