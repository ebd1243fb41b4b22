//! Window creation with ordered backend fallback.

use std::cmp;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use raw_window_handle::{HasRawWindowHandle, RawWindowHandle};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::backend::{Backend, DriverRegistry, NativeWindow};
use crate::context::GraphicsContext;
use crate::cursor::MouseCursor;
use crate::error::{ContextError, CreationError, OsError};

static NEXT_WINDOW_ID: AtomicU64 = AtomicU64::new(1);
static LIVE_WINDOWS: AtomicUsize = AtomicUsize::new(0);

/// Number of windows currently alive in this process.
pub(crate) fn live_windows() -> usize {
    LIVE_WINDOWS.load(Ordering::SeqCst)
}

/// Identifier of a window. Unique for the lifetime of the process.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowId(u64);

impl WindowId {
    pub(crate) fn next() -> Self {
        WindowId(NEXT_WINDOW_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Notifications a driver delivers about one of its windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    CloseRequested,
    Resized(u32, u32),
    Focused(bool),
    RedrawRequested,
    /// The window is gone on the backend side; drop the [`Window`].
    Destroyed,
}

/// Application hooks handed to the driver that realizes a window.
///
/// The core passes them to the driver untouched. Drivers may call them from
/// their own event threads.
pub trait Callbacks: Send + Sync {
    fn event(&self, window: WindowId, event: WindowEvent) {
        let _ = (window, event);
    }
}

impl Callbacks for () {}

/// Options a window is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WindowAttributes {
    /// Initial size of the drawable area. `None` means 800x600.
    pub dimensions: Option<(u32, u32)>,
    pub min_dimensions: Option<(u32, u32)>,
    pub max_dimensions: Option<(u32, u32)>,
    pub title: String,
    pub decorations: bool,
    pub visible: bool,
    /// Allocate the graphics context while creating the window. When false
    /// the context stays uninitialized until [`Window::init_context`].
    pub graphics_context: bool,
}

impl Default for WindowAttributes {
    fn default() -> Self {
        WindowAttributes {
            dimensions: None,
            min_dimensions: None,
            max_dimensions: None,
            title: "casement window".to_owned(),
            decorations: true,
            visible: true,
            graphics_context: true,
        }
    }
}

impl WindowAttributes {
    /// The size to create the window with, clamped to the min/max constraints.
    ///
    /// Compositors and window managers often only apply constraints on user
    /// resizes, so drivers should use this for the initial size.
    pub fn initial_size(&self) -> (u32, u32) {
        let mut dimensions = self.dimensions.unwrap_or((800, 600));
        if let Some(max) = self.max_dimensions {
            dimensions.0 = cmp::min(dimensions.0, max.0);
            dimensions.1 = cmp::min(dimensions.1, max.1);
        }
        if let Some(min) = self.min_dimensions {
            dimensions.0 = cmp::max(dimensions.0, min.0);
            dimensions.1 = cmp::max(dimensions.1, min.1);
        }
        dimensions
    }
}

/// Object that allows you to build windows.
#[derive(Debug, Clone, Default)]
pub struct WindowBuilder {
    pub window: WindowAttributes,
}

impl WindowBuilder {
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    #[inline]
    pub fn with_title<T: Into<String>>(mut self, title: T) -> Self {
        self.window.title = title.into();
        self
    }

    #[inline]
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.window.dimensions = Some((width, height));
        self
    }

    #[inline]
    pub fn with_min_dimensions(mut self, width: u32, height: u32) -> Self {
        self.window.min_dimensions = Some((width, height));
        self
    }

    #[inline]
    pub fn with_max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.window.max_dimensions = Some((width, height));
        self
    }

    #[inline]
    pub fn with_decorations(mut self, decorations: bool) -> Self {
        self.window.decorations = decorations;
        self
    }

    #[inline]
    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.window.visible = visible;
        self
    }

    #[inline]
    pub fn with_graphics_context(mut self, graphics_context: bool) -> Self {
        self.window.graphics_context = graphics_context;
        self
    }

    /// Builds the window on the first backend of `registry` that accepts it.
    pub fn build(
        self,
        registry: &DriverRegistry,
        callbacks: Arc<dyn Callbacks>,
    ) -> Result<Window, CreationError> {
        create_window(registry, callbacks, self.window)
    }
}

/// Creates a window on the first driver of `registry` that succeeds.
///
/// Drivers are tried in priority order and absent slots are skipped. The
/// first success wins and no further driver is asked. If every driver fails,
/// the error of the first one tried is returned. A registry without any
/// driver yields [`CreationError::NoBackendAvailable`].
pub fn create_window(
    registry: &DriverRegistry,
    callbacks: Arc<dyn Callbacks>,
    attributes: WindowAttributes,
) -> Result<Window, CreationError> {
    let id = WindowId::next();
    let mut first_error: Option<(Backend, OsError)> = None;

    for (backend, driver) in registry.drivers() {
        debug!("Trying the {} backend for window {:?}", backend, id);
        match driver.realize(id, Arc::clone(&callbacks), &attributes) {
            Ok(native) => {
                info!("Created window {:?} on the {} backend", id, backend);
                return Window::new(id, backend, attributes, native);
            }
            Err(err) => {
                warn!("The {} backend could not create window {:?}: {}", backend, id, err);
                if first_error.is_none() {
                    first_error = Some((backend, err));
                }
            }
        }
    }

    match first_error {
        Some((backend, error)) => Err(CreationError::Os { backend, error }),
        None => Err(CreationError::NoBackendAvailable),
    }
}

/// A window realized by one of the registered drivers.
pub struct Window {
    id: WindowId,
    backend: Backend,
    attributes: WindowAttributes,
    // Declared before `native` so the context is released before the
    // surface it renders to.
    context: GraphicsContext,
    native: Box<dyn NativeWindow>,
}

impl Window {
    fn new(
        id: WindowId,
        backend: Backend,
        attributes: WindowAttributes,
        native: Box<dyn NativeWindow>,
    ) -> Result<Self, CreationError> {
        LIVE_WINDOWS.fetch_add(1, Ordering::SeqCst);
        let window = Window {
            id,
            backend,
            context: GraphicsContext::new(id, backend),
            attributes,
            native,
        };
        if window.attributes.graphics_context {
            window.init_context()?;
        }
        Ok(window)
    }

    #[inline]
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// The backend whose driver created this window.
    #[inline]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    #[inline]
    pub fn attributes(&self) -> &WindowAttributes {
        &self.attributes
    }

    #[inline]
    pub fn context(&self) -> &GraphicsContext {
        &self.context
    }

    /// Allocates the graphics context of a window built without one.
    ///
    /// # Panics
    ///
    /// Panics if the context is already initialized.
    pub fn init_context(&self) -> Result<(), ContextError> {
        self.context.initialize(&*self.native)
    }

    /// Makes this window's context current on the calling thread.
    #[inline]
    pub fn make_context_current(&self) -> Result<(), ContextError> {
        self.context.make_current()
    }

    /// Swaps the buffers of this window's context, which must be current on
    /// the calling thread.
    #[inline]
    pub fn swap_buffers(&self) -> Result<(), ContextError> {
        self.context.swap_buffers()
    }

    /// Changes the cursor shown over this window. [`MouseCursor::None`]
    /// hides it.
    pub fn set_cursor(&self, cursor: MouseCursor) {
        let name = self.backend.cursor_catalog().name(cursor);
        self.native.set_cursor(name);
    }

    #[inline]
    pub fn raw_window_handle(&self) -> RawWindowHandle {
        self.native.raw_window_handle()
    }
}

unsafe impl HasRawWindowHandle for Window {
    fn raw_window_handle(&self) -> RawWindowHandle {
        self.native.raw_window_handle()
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        LIVE_WINDOWS.fetch_sub(1, Ordering::SeqCst);
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("backend", &self.backend)
            .field("attributes", &self.attributes)
            .field("context", &self.context)
            .finish()
    }
}


#[cfg(all(
    test,
    any(
        target_os = "linux",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd"
    )
))]
mod creation_tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::test_util::{ContextSpec, MockDriver, MockWindow};

    struct BrokenContextDriver;

    impl crate::backend::WindowDriver for BrokenContextDriver {
        fn realize(
            &self,
            _id: WindowId,
            _callbacks: Arc<dyn Callbacks>,
            _attributes: &WindowAttributes,
        ) -> Result<Box<dyn NativeWindow>, OsError> {
            Ok(Box::new(MockWindow::new(ContextSpec {
                fail_create: true,
                ..ContextSpec::default()
            })))
        }
    }

    #[test]
    fn empty_registry_reports_no_backend() {
        let registry = DriverRegistry::empty();
        let err = create_window(&registry, Arc::new(()), WindowAttributes::default()).unwrap_err();
        assert!(matches!(err, CreationError::NoBackendAvailable));
    }

    #[test]
    fn first_success_stops_the_search() {
        let wayland = MockDriver::succeeding();
        let x11 = MockDriver::succeeding();
        let x11_attempts = Arc::clone(&x11.attempts);
        let registry = DriverRegistry::builder()
            .with_driver(Backend::Wayland, wayland)
            .with_driver(Backend::X11, x11)
            .build();

        let window = WindowBuilder::new().build(&registry, Arc::new(())).unwrap();
        assert_eq!(window.backend(), Backend::Wayland);
        assert_eq!(x11_attempts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn first_error_is_kept_when_every_backend_fails() {
        let wayland = MockDriver::failing("no compositor socket");
        let x11 = MockDriver::failing("cannot open display");
        let wayland_attempts = Arc::clone(&wayland.attempts);
        let x11_attempts = Arc::clone(&x11.attempts);
        let registry = DriverRegistry::builder()
            .with_driver(Backend::Wayland, wayland)
            .with_driver(Backend::X11, x11)
            .build();

        match create_window(&registry, Arc::new(()), WindowAttributes::default()) {
            Err(CreationError::Os { backend, error }) => {
                assert_eq!(backend, Backend::Wayland);
                assert_eq!(error.to_string(), "no compositor socket");
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(wayland_attempts.load(Ordering::SeqCst), 1);
        assert_eq!(x11_attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn graphics_context_is_initialized_on_creation() {
        let registry = DriverRegistry::builder()
            .with_driver(Backend::X11, MockDriver::succeeding())
            .build();
        let window = WindowBuilder::new().build(&registry, Arc::new(())).unwrap();
        assert!(window.context().is_initialized());
        assert_eq!(window.context().window_id(), window.id());
        assert_eq!(window.context().backend(), Backend::X11);
    }

    #[test]
    fn graphics_context_can_be_deferred() {
        let registry = DriverRegistry::builder()
            .with_driver(Backend::X11, MockDriver::succeeding())
            .build();
        let window = WindowBuilder::new()
            .with_graphics_context(false)
            .build(&registry, Arc::new(()))
            .unwrap();
        assert!(!window.context().is_initialized());
        assert!(matches!(window.swap_buffers(), Err(ContextError::NotInitialized)));

        window.init_context().unwrap();
        window.make_context_current().unwrap();
        window.swap_buffers().unwrap();
    }

    #[test]
    fn context_failure_fails_creation_without_fallback() {
        let x11 = MockDriver::succeeding();
        let x11_attempts = Arc::clone(&x11.attempts);
        let registry = DriverRegistry::builder()
            .with_driver(Backend::Wayland, BrokenContextDriver)
            .with_driver(Backend::X11, x11)
            .build();

        let err = WindowBuilder::new().build(&registry, Arc::new(())).unwrap_err();
        assert!(matches!(err, CreationError::Context(ContextError::Os(_))));
        assert_eq!(x11_attempts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn raw_handle_comes_from_the_native_window() {
        let registry = DriverRegistry::builder()
            .with_driver(Backend::X11, MockDriver::succeeding())
            .build();
        let window = WindowBuilder::new().build(&registry, Arc::new(())).unwrap();
        match HasRawWindowHandle::raw_window_handle(&window) {
            RawWindowHandle::Xlib(handle) => assert_eq!(handle.window, 0x2a),
            other => panic!("unexpected handle {:?}", other),
        }
    }
}
