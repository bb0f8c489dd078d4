use std::num::NonZeroUsize;

use winit::raw_window_handle::{HandleError, HasWindowHandle, RawWindowHandle};

use super::SinkError;

/// Native window identifier as GstVideoOverlay expects it: an XID, a
/// `wl_surface*`, an `HWND` or an `NSView*`, widened to `usize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(NonZeroUsize);

impl WindowHandle {
    pub fn new(raw: usize) -> Result<Self, SinkError> {
        NonZeroUsize::new(raw).map(Self).ok_or(SinkError::NullHandle)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

/// A drawing surface that can hand out its native window handle.
pub trait HandleSource {
    /// Fails with [`SinkError::Unrealized`] until the surface has a native window.
    fn acquire_handle(&self) -> Result<WindowHandle, SinkError>;
}

impl HandleSource for WindowHandle {
    fn acquire_handle(&self) -> Result<WindowHandle, SinkError> {
        Ok(*self)
    }
}

impl HandleSource for winit::window::Window {
    fn acquire_handle(&self) -> Result<WindowHandle, SinkError> {
        let handle = self.window_handle().map_err(|e| match e {
            HandleError::NotSupported => SinkError::UnsupportedPlatform("unknown"),
            _ => SinkError::Unrealized,
        })?;
        native_handle(handle.as_raw())
    }
}

pub fn native_handle(raw: RawWindowHandle) -> Result<WindowHandle, SinkError> {
    let value = match raw {
        RawWindowHandle::Xlib(h) => h.window as usize,
        RawWindowHandle::Xcb(h) => h.window.get() as usize,
        RawWindowHandle::Wayland(h) => h.surface.as_ptr() as usize,
        RawWindowHandle::Win32(h) => h.hwnd.get() as usize,
        RawWindowHandle::AppKit(h) => h.ns_view.as_ptr() as usize,
        RawWindowHandle::UiKit(_) => return Err(SinkError::UnsupportedPlatform("uikit")),
        RawWindowHandle::AndroidNdk(_) => return Err(SinkError::UnsupportedPlatform("android")),
        RawWindowHandle::Web(_) | RawWindowHandle::WebCanvas(_) | RawWindowHandle::WebOffscreenCanvas(_) => {
            return Err(SinkError::UnsupportedPlatform("web"));
        }
        _ => return Err(SinkError::UnsupportedPlatform("other")),
    };
    WindowHandle::new(value)
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use winit::raw_window_handle::{XcbWindowHandle, XlibWindowHandle};

    use super::*;

    #[test]
    fn zero_handle_rejected() {
        assert!(matches!(WindowHandle::new(0), Err(SinkError::NullHandle)));
        assert_eq!(WindowHandle::new(7).unwrap().get(), 7);
    }

    #[test]
    fn xlib_window_id_passes_through() {
        let raw = RawWindowHandle::Xlib(XlibWindowHandle::new(0x0400_0012));
        assert_eq!(native_handle(raw).unwrap().get(), 0x0400_0012);
    }

    #[test]
    fn unmapped_xlib_window_is_null() {
        let raw = RawWindowHandle::Xlib(XlibWindowHandle::new(0));
        assert!(matches!(native_handle(raw), Err(SinkError::NullHandle)));
    }

    #[test]
    fn xcb_window_id_passes_through() {
        let raw = RawWindowHandle::Xcb(XcbWindowHandle::new(NonZeroU32::new(99).unwrap()));
        assert_eq!(native_handle(raw).unwrap().get(), 99);
    }
}
