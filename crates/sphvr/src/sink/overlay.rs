use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_video as gst_video;
use gstreamer_video::prelude::*;

use super::{SinkError, VideoSinkBinding, WindowHandle};

fn as_overlay(element: &gst::Element) -> Result<gst_video::VideoOverlay, SinkError> {
    element
        .clone()
        .dynamic_cast::<gst_video::VideoOverlay>()
        .map_err(|e| {
            let name = e
                .factory()
                .map(|f| f.name().to_string())
                .unwrap_or_else(|| e.name().to_string());
            SinkError::NotAnOverlay(name)
        })
}

fn set_handle(overlay: &gst_video::VideoOverlay, handle: WindowHandle) {
    // SAFETY: `WindowHandle` is only built from a realized native window, and
    // the caller keeps that window alive for as long as the pipeline renders.
    unsafe { overlay.set_window_handle(handle.get()) };
}

/// Generic `GstVideoOverlay` sink (xvimagesink, ximagesink, d3d11videosink...).
pub struct OverlaySink {
    element: gst::Element,
    overlay: gst_video::VideoOverlay,
    handle: Option<WindowHandle>,
}

impl OverlaySink {
    pub fn new(element: gst::Element) -> Result<Self, SinkError> {
        let overlay = as_overlay(&element)?;
        Ok(Self {
            element,
            overlay,
            handle: None,
        })
    }
}

impl VideoSinkBinding for OverlaySink {
    fn element(&self) -> &gst::Element {
        &self.element
    }

    fn bind_handle(&mut self, handle: WindowHandle) -> Result<(), SinkError> {
        set_handle(&self.overlay, handle);
        self.handle = Some(handle);
        log::info!("Bound {} to window {:#x}", self.element.name(), handle.get());
        Ok(())
    }

    fn bound_handle(&self) -> Option<WindowHandle> {
        self.handle
    }

    fn resize(&mut self, _width: u32, _height: u32) {
        // These sinks track the window size themselves.
        self.overlay.expose();
    }

    fn expose(&self) {
        self.overlay.expose();
    }
}

/// `glimagesink` rendering into a fixed-aspect canvas.
/// Input events stay with the host window instead of the sink.
pub struct GlOverlaySink {
    element: gst::Element,
    overlay: gst_video::VideoOverlay,
    handle: Option<WindowHandle>,
    canvas_width: u32,
    canvas_height: u32,
    aspect: f64,
}

impl GlOverlaySink {
    pub fn new(element: gst::Element, width: u32, height: u32) -> Result<Self, SinkError> {
        let overlay = as_overlay(&element)?;
        overlay.handle_events(false);
        let (width, height) = (width.max(1), height.max(1));
        Ok(Self {
            element,
            overlay,
            handle: None,
            canvas_width: width,
            canvas_height: height,
            aspect: f64::from(width) / f64::from(height),
        })
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }

    pub fn aspect(&self) -> f64 {
        self.aspect
    }
}

/// Largest rectangle with `aspect` centered inside `width` x `height`.
pub fn letterbox(aspect: f64, width: u32, height: u32) -> (i32, i32, i32, i32) {
    let (w, h) = (f64::from(width), f64::from(height));
    if w / h > aspect {
        let fit_w = (h * aspect).round();
        (((w - fit_w) / 2.0) as i32, 0, fit_w as i32, height as i32)
    } else {
        let fit_h = (w / aspect).round();
        (0, ((h - fit_h) / 2.0) as i32, width as i32, fit_h as i32)
    }
}

impl VideoSinkBinding for GlOverlaySink {
    fn element(&self) -> &gst::Element {
        &self.element
    }

    fn bind_handle(&mut self, handle: WindowHandle) -> Result<(), SinkError> {
        set_handle(&self.overlay, handle);
        self.handle = Some(handle);
        log::info!("Bound glimagesink to window {:#x}", handle.get());
        Ok(())
    }

    fn bound_handle(&self) -> Option<WindowHandle> {
        self.handle
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.canvas_width = width;
        self.canvas_height = height;
        let (x, y, w, h) = letterbox(self.aspect, width, height);
        if let Err(e) = self.overlay.set_render_rectangle(x, y, w, h) {
            log::warn!("Failed to set render rectangle: {e}");
        }
        self.overlay.expose();
    }

    fn expose(&self) {
        self.overlay.expose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letterbox_wide_window_pillarboxes() {
        // 16:9 content in a 2000x900 window: full height, centered horizontally.
        let (x, y, w, h) = letterbox(16.0 / 9.0, 2000, 900);
        assert_eq!((y, w, h), (0, 1600, 900));
        assert_eq!(x, 200);
    }

    #[test]
    fn letterbox_tall_window_letterboxes() {
        let (x, y, w, h) = letterbox(2.0, 800, 800);
        assert_eq!((x, y, w, h), (0, 200, 800, 400));
    }

    #[test]
    fn letterbox_exact_fit() {
        assert_eq!(letterbox(1280.0 / 720.0, 1280, 720), (0, 0, 1280, 720));
    }

    #[test]
    fn fakesink_is_not_an_overlay() {
        gst::init().unwrap();
        let element = gst::ElementFactory::make("fakesink").build().unwrap();
        assert!(matches!(GlOverlaySink::new(element, 10, 10), Err(SinkError::NotAnOverlay(_))));
    }
}
