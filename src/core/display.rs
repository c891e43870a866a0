//! Display surface seen by the viewer.
//!
//! Setting a source is fire-and-forget. Whoever owns the surface learns about
//! a failed load asynchronously and reports it back through
//! [`Viewer::handle_load_failure`](super::viewer::Viewer::handle_load_failure).

pub trait FrameDisplay {
    /// Start showing the image at `path`
    fn set_source(&mut self, path: &str);

    /// Path last passed to `set_source`
    fn source(&self) -> Option<&str>;
}
