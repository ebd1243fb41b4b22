//! Graphics contexts and the per-thread "current context".
//!
//! A context moves through `Uninitialized -> Detached <-> Current(thread)` and
//! is destroyed together with its window. It can be current on at most one
//! thread at a time, and a thread has at most one current context. Taking a
//! context that another thread holds fails immediately and never waits.
//!
//! Misuse that can only come from a programming error panics: initializing a
//! context twice, or querying extensions and entry points without a current
//! context. Everything else is reported through [`ContextError`].

use std::cell::RefCell;
use std::fmt;
use std::os::raw::c_void;
use std::ptr;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::backend::{Backend, NativeWindow};
use crate::error::ContextError;
use crate::window::WindowId;

bitflags! {
    /// Optional features a backend context may support.
    #[derive(Default)]
    pub struct ContextCapabilities: u32 {
        /// Negative swap intervals are accepted, letting a late frame swap
        /// immediately instead of waiting for the next refresh
        /// (`GLX_EXT_swap_control_tear`, `WGL_EXT_swap_control_tear`).
        const SWAP_CONTROL_TEAR = 1 << 0;
    }
}

/// The graphics context a backend allocated for one window.
///
/// Every method is only called from the thread the context is current on,
/// except `make_current`, which is called from the thread acquiring it.
pub trait BackendContext: Send + Sync {
    fn make_current(&self) -> Result<(), ContextError>;

    fn make_not_current(&self) -> Result<(), ContextError>;

    fn swap_buffers(&self) -> Result<(), ContextError>;

    fn set_swap_interval(&self, interval: i32) -> Result<(), ContextError>;

    fn capabilities(&self) -> ContextCapabilities;

    fn is_extension_supported(&self, name: &str) -> bool;

    fn get_proc_address(&self, name: &str) -> *const c_void;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextState {
    Uninitialized,
    Detached,
    Current(ThreadId),
}

struct Inner {
    state: ContextState,
    // `Some` exactly when `state` is not `Uninitialized`.
    native: Option<Arc<dyn BackendContext>>,
    swap_interval: i32,
}

struct ContextShared {
    window: WindowId,
    backend: Backend,
    inner: Mutex<Inner>,
}

thread_local! {
    static CURRENT: RefCell<Option<Weak<ContextShared>>> = RefCell::new(None);
}

fn thread_current() -> Option<Arc<ContextShared>> {
    CURRENT.with(|current| current.borrow().as_ref().and_then(Weak::upgrade))
}

fn clear_thread_current(shared: &ContextShared) {
    let _ = CURRENT.try_with(|current| {
        let mut current = current.borrow_mut();
        let is_shared = current
            .as_ref()
            .map_or(false, |weak| ptr::eq(weak.as_ptr(), shared));
        if is_shared {
            *current = None;
        }
    });
}

fn make_current(shared: &Arc<ContextShared>) -> Result<(), ContextError> {
    let me = thread::current().id();
    let native = {
        let mut inner = shared.inner.lock();
        match inner.state {
            ContextState::Uninitialized => return Err(ContextError::NotInitialized),
            ContextState::Current(owner) if owner == me => return Ok(()),
            ContextState::Current(owner) => return Err(ContextError::CurrentOnOtherThread(owner)),
            ContextState::Detached => (),
        }
        let native = match inner.native {
            Some(ref native) => Arc::clone(native),
            None => return Err(ContextError::NotInitialized),
        };
        // Claimed before the backend call, so a racing thread sees the owner.
        inner.state = ContextState::Current(me);
        native
    };

    let result = release_previous(shared).and_then(|()| native.make_current());
    if let Err(err) = result {
        shared.inner.lock().state = ContextState::Detached;
        return Err(err);
    }

    CURRENT.with(|current| *current.borrow_mut() = Some(Arc::downgrade(shared)));
    trace!(
        "Graphics context of window {:?} is now current on {:?}",
        shared.window,
        me,
    );
    Ok(())
}

// A thread can only have one current context; detach whatever it had before.
fn release_previous(next: &Arc<ContextShared>) -> Result<(), ContextError> {
    match thread_current() {
        Some(ref previous) if !Arc::ptr_eq(previous, next) => previous.detach(),
        _ => Ok(()),
    }
}

impl ContextShared {
    fn initialize(&self, window: &dyn NativeWindow) -> Result<(), ContextError> {
        let mut inner = self.inner.lock();
        if inner.state != ContextState::Uninitialized {
            panic!(
                "graphics context of window {:?} is already initialized",
                self.window,
            );
        }
        let native = window.create_context()?;
        inner.native = Some(Arc::from(native));
        inner.state = ContextState::Detached;
        trace!("Initialized graphics context of window {:?}", self.window);
        Ok(())
    }

    /// The backend context, if it is current on the calling thread.
    fn current_native(&self) -> Result<Arc<dyn BackendContext>, ContextError> {
        let me = thread::current().id();
        let inner = self.inner.lock();
        match inner.state {
            ContextState::Uninitialized => Err(ContextError::NotInitialized),
            ContextState::Detached => Err(ContextError::NotCurrent),
            ContextState::Current(owner) if owner != me => {
                Err(ContextError::CurrentOnOtherThread(owner))
            }
            ContextState::Current(_) => inner.native.clone().ok_or(ContextError::NotInitialized),
        }
    }

    fn expect_current(&self, what: &str, name: &str) -> Arc<dyn BackendContext> {
        match self.current_native() {
            Ok(native) => native,
            Err(err) => panic!("cannot look up {} {:?}: {}", what, name, err),
        }
    }

    fn detach(&self) -> Result<(), ContextError> {
        let native = match self.current_native() {
            Err(ContextError::NotCurrent) => return Ok(()),
            result => result?,
        };
        // Only the owning thread gets here, and nobody else may change the
        // state while it owns the context.
        native.make_not_current()?;
        self.inner.lock().state = ContextState::Detached;
        clear_thread_current(self);
        trace!("Detached graphics context of window {:?}", self.window);
        Ok(())
    }

    fn set_swap_interval(&self, interval: i32) -> Result<(), ContextError> {
        let native = self.current_native()?;
        if interval < 0
            && !native
                .capabilities()
                .contains(ContextCapabilities::SWAP_CONTROL_TEAR)
        {
            return Err(ContextError::SwapControlTearUnsupported(interval));
        }
        native.set_swap_interval(interval)?;
        self.inner.lock().swap_interval = interval;
        Ok(())
    }

    fn is_extension_supported(&self, name: &str) -> bool {
        self.expect_current("extension", name)
            .is_extension_supported(name)
    }

    fn get_proc_address(&self, name: &str) -> *const c_void {
        self.expect_current("function", name).get_proc_address(name)
    }
}

impl Drop for ContextShared {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if let ContextState::Current(owner) = inner.state {
            if owner != thread::current().id() {
                // Releasing here would unbind whatever this thread has current.
                warn!(
                    "Graphics context of window {:?} dropped while current on {:?}",
                    self.window, owner,
                );
            } else if let Some(ref native) = inner.native {
                if let Err(err) = native.make_not_current() {
                    warn!(
                        "Failed to release graphics context of window {:?}: {}",
                        self.window, err,
                    );
                }
            }
        }
        clear_thread_current(self);
    }
}

/// The exclusive right to issue graphics commands against one window.
pub struct GraphicsContext {
    shared: Arc<ContextShared>,
}

impl GraphicsContext {
    pub(crate) fn new(window: WindowId, backend: Backend) -> Self {
        GraphicsContext {
            shared: Arc::new(ContextShared {
                window,
                backend,
                inner: Mutex::new(Inner {
                    state: ContextState::Uninitialized,
                    native: None,
                    swap_interval: 0,
                }),
            }),
        }
    }

    /// Allocates the backend context for `window`.
    ///
    /// # Panics
    ///
    /// Panics if the context was already initialized.
    pub(crate) fn initialize(&self, window: &dyn NativeWindow) -> Result<(), ContextError> {
        self.shared.initialize(window)
    }

    #[inline]
    pub fn window_id(&self) -> WindowId {
        self.shared.window
    }

    #[inline]
    pub fn backend(&self) -> Backend {
        self.shared.backend
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.inner.lock().state != ContextState::Uninitialized
    }

    /// The thread this context is current on, if any.
    pub fn owner(&self) -> Option<ThreadId> {
        match self.shared.inner.lock().state {
            ContextState::Current(owner) => Some(owner),
            _ => None,
        }
    }

    /// Returns true if this context is current on the calling thread.
    pub fn is_current(&self) -> bool {
        self.owner() == Some(thread::current().id())
    }

    /// Makes this context current on the calling thread.
    ///
    /// Any other context current on this thread is detached first. Fails with
    /// [`ContextError::CurrentOnOtherThread`] if another thread holds it; the
    /// owner is left untouched.
    pub fn make_current(&self) -> Result<(), ContextError> {
        make_current(&self.shared)
    }

    /// Releases this context from the calling thread.
    ///
    /// Only the owning thread may detach. Detaching a context that is not
    /// current anywhere does nothing.
    pub fn detach(&self) -> Result<(), ContextError> {
        self.shared.detach()
    }

    /// Swaps the front and back buffers.
    ///
    /// With a positive swap interval the driver may block until the next
    /// vertical refresh.
    pub fn swap_buffers(&self) -> Result<(), ContextError> {
        self.shared.current_native()?.swap_buffers()
    }

    /// Sets the number of vertical refreshes to wait before a swap.
    ///
    /// `0` disables vsync. Negative values allow a late frame to swap
    /// immediately and are only accepted when the backend reports
    /// [`ContextCapabilities::SWAP_CONTROL_TEAR`]; otherwise this fails with
    /// [`ContextError::SwapControlTearUnsupported`] rather than clamping.
    pub fn set_swap_interval(&self, interval: i32) -> Result<(), ContextError> {
        self.shared.set_swap_interval(interval)
    }

    /// The last swap interval applied successfully.
    pub fn swap_interval(&self) -> i32 {
        self.shared.inner.lock().swap_interval
    }

    /// `None` until the context is initialized.
    pub fn capabilities(&self) -> Option<ContextCapabilities> {
        self.shared
            .inner
            .lock()
            .native
            .as_ref()
            .map(|native| native.capabilities())
    }

    /// # Panics
    ///
    /// Panics if this context is not current on the calling thread.
    pub fn is_extension_supported(&self, name: &str) -> bool {
        self.shared.is_extension_supported(name)
    }

    /// # Panics
    ///
    /// Panics if this context is not current on the calling thread.
    pub fn get_proc_address(&self, name: &str) -> *const c_void {
        self.shared.get_proc_address(name)
    }
}

impl fmt::Debug for GraphicsContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("GraphicsContext")
            .field("window", &self.shared.window)
            .field("backend", &self.shared.backend)
            .field("state", &inner.state)
            .field("swap_interval", &inner.swap_interval)
            .finish()
    }
}

/// The window whose context is current on the calling thread.
pub fn current_window() -> Option<WindowId> {
    thread_current().map(|shared| shared.window)
}

/// Detaches whatever context is current on the calling thread.
pub fn detach_current() -> Result<(), ContextError> {
    match thread_current() {
        Some(shared) => shared.detach(),
        None => Ok(()),
    }
}

/// Sets the swap interval of the calling thread's current context.
pub fn set_swap_interval(interval: i32) -> Result<(), ContextError> {
    thread_current()
        .ok_or(ContextError::NotCurrent)?
        .set_swap_interval(interval)
}

/// Reports whether the calling thread's current context supports an
/// extension. Cache the answer if you need it often: extension strings do not
/// change during the lifetime of a context.
///
/// # Panics
///
/// Panics if no context is current on the calling thread.
pub fn extension_supported(name: &str) -> bool {
    match thread_current() {
        Some(shared) => shared.is_extension_supported(name),
        None => panic!("cannot look up extension {:?}: no current context", name),
    }
}

/// Looks up a core or extension entry point in the calling thread's current
/// context.
///
/// # Panics
///
/// Panics if no context is current on the calling thread.
pub fn get_proc_address(name: &str) -> *const c_void {
    match thread_current() {
        Some(shared) => shared.get_proc_address(name),
        None => panic!("cannot look up function {:?}: no current context", name),
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
mod tests {
    use super::*;
    use crate::test_util::{ContextSpec, MockWindow};
    use crate::window::WindowId;

    fn context_with(spec: ContextSpec) -> (GraphicsContext, MockWindow) {
        let window = MockWindow::new(spec);
        let context = GraphicsContext::new(WindowId::next(), Backend::X11);
        (context, window)
    }

    fn ready(spec: ContextSpec) -> (GraphicsContext, MockWindow) {
        let (context, window) = context_with(spec);
        context.initialize(&window).unwrap();
        (context, window)
    }

    #[test]
    fn uninitialized_context_rejects_everything() {
        let (context, _window) = context_with(ContextSpec::default());
        assert!(!context.is_initialized());
        assert!(matches!(context.make_current(), Err(ContextError::NotInitialized)));
        assert!(matches!(context.swap_buffers(), Err(ContextError::NotInitialized)));
        assert!(matches!(context.set_swap_interval(1), Err(ContextError::NotInitialized)));
        assert!(matches!(context.detach(), Err(ContextError::NotInitialized)));
        assert_eq!(context.capabilities(), None);
    }

    #[test]
    #[should_panic(expected = "already initialized")]
    fn initializing_twice_panics() {
        let (context, window) = ready(ContextSpec::default());
        let _ = context.initialize(&window);
    }

    #[test]
    fn initialize_reports_backend_failure() {
        let (context, window) = context_with(ContextSpec {
            fail_create: true,
            ..ContextSpec::default()
        });
        assert!(matches!(context.initialize(&window), Err(ContextError::Os(_))));
        assert!(!context.is_initialized());
    }

    #[test]
    fn detached_context_cannot_swap() {
        let (context, window) = ready(ContextSpec::default());
        assert!(matches!(context.swap_buffers(), Err(ContextError::NotCurrent)));
        assert!(matches!(context.set_swap_interval(1), Err(ContextError::NotCurrent)));
        assert_eq!(window.log.count("swap_buffers"), 0);
        assert_eq!(window.log.count("set_swap_interval"), 0);
    }

    #[test]
    #[should_panic(expected = "cannot look up extension")]
    fn extension_query_on_detached_context_panics() {
        let (context, _window) = ready(ContextSpec::default());
        context.is_extension_supported("GLX_EXT_swap_control");
    }

    #[test]
    #[should_panic(expected = "cannot look up function")]
    fn proc_address_on_uninitialized_context_panics() {
        let (context, _window) = context_with(ContextSpec::default());
        context.get_proc_address("glClear");
    }

    #[test]
    fn current_context_swaps_and_queries() {
        let (context, window) = ready(ContextSpec {
            extensions: vec!["GLX_EXT_swap_control"],
            ..ContextSpec::default()
        });
        context.make_current().unwrap();
        assert!(context.is_current());
        assert_eq!(current_window(), Some(context.window_id()));

        context.swap_buffers().unwrap();
        context.set_swap_interval(1).unwrap();
        assert_eq!(context.swap_interval(), 1);
        assert!(context.is_extension_supported("GLX_EXT_swap_control"));
        assert!(!context.is_extension_supported("GLX_EXT_swap_control_tear"));
        assert!(!context.get_proc_address("glClear").is_null());
        assert_eq!(
            window.log.calls(),
            vec!["create_context", "make_current", "swap_buffers", "set_swap_interval"],
        );
    }

    #[test]
    fn make_current_twice_on_same_thread_is_a_no_op() {
        let (context, window) = ready(ContextSpec::default());
        context.make_current().unwrap();
        context.make_current().unwrap();
        assert_eq!(window.log.count("make_current"), 1);
    }

    #[test]
    fn other_thread_cannot_steal_the_context() {
        let (context, _window) = ready(ContextSpec::default());
        let context = Arc::new(context);
        context.make_current().unwrap();
        let owner = thread::current().id();

        let remote = Arc::clone(&context);
        thread::spawn(move || {
            assert!(matches!(
                remote.make_current(),
                Err(ContextError::CurrentOnOtherThread(id)) if id == owner
            ));
            assert!(matches!(
                remote.swap_buffers(),
                Err(ContextError::CurrentOnOtherThread(_))
            ));
            assert!(matches!(
                remote.detach(),
                Err(ContextError::CurrentOnOtherThread(_))
            ));
            assert_eq!(current_window(), None);
        })
        .join()
        .unwrap();

        assert_eq!(context.owner(), Some(owner));
        context.swap_buffers().unwrap();
    }

    #[test]
    fn detached_context_can_move_to_another_thread() {
        let (context, window) = ready(ContextSpec::default());
        let context = Arc::new(context);
        context.make_current().unwrap();
        context.detach().unwrap();
        assert_eq!(current_window(), None);

        let remote = Arc::clone(&context);
        thread::spawn(move || {
            remote.make_current().unwrap();
            remote.swap_buffers().unwrap();
            remote.detach().unwrap();
        })
        .join()
        .unwrap();

        assert_eq!(context.owner(), None);
        assert_eq!(window.log.count("make_not_current"), 2);
    }

    #[test]
    fn detach_is_idempotent() {
        let (context, window) = ready(ContextSpec::default());
        context.detach().unwrap();
        assert_eq!(window.log.count("make_not_current"), 0);
    }

    #[test]
    fn negative_interval_requires_swap_control_tear() {
        let (context, window) = ready(ContextSpec::default());
        context.make_current().unwrap();
        context.set_swap_interval(2).unwrap();
        assert!(matches!(
            context.set_swap_interval(-1),
            Err(ContextError::SwapControlTearUnsupported(-1))
        ));
        assert_eq!(context.swap_interval(), 2);
        assert_eq!(window.log.intervals(), vec![2]);
    }

    #[test]
    fn negative_interval_with_swap_control_tear() {
        let (context, window) = ready(ContextSpec {
            capabilities: ContextCapabilities::SWAP_CONTROL_TEAR,
            ..ContextSpec::default()
        });
        context.make_current().unwrap();
        context.set_swap_interval(-1).unwrap();
        assert_eq!(context.swap_interval(), -1);
        assert_eq!(window.log.intervals(), vec![-1]);
    }

    #[test]
    fn failed_make_current_leaves_context_detached() {
        let (context, _window) = ready(ContextSpec {
            fail_make_current: true,
            ..ContextSpec::default()
        });
        assert!(matches!(context.make_current(), Err(ContextError::ContextLost)));
        assert_eq!(context.owner(), None);
        assert_eq!(current_window(), None);
    }

    #[test]
    fn making_another_context_current_detaches_the_first() {
        let (first, first_window) = ready(ContextSpec::default());
        let (second, _second_window) = ready(ContextSpec::default());

        first.make_current().unwrap();
        second.make_current().unwrap();

        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(current_window(), Some(second.window_id()));
        assert_eq!(first_window.log.count("make_not_current"), 1);
    }

    #[test]
    fn thread_level_functions_follow_the_current_context() {
        let (context, window) = ready(ContextSpec {
            extensions: vec!["GL_ARB_debug_output"],
            ..ContextSpec::default()
        });
        assert!(matches!(set_swap_interval(1), Err(ContextError::NotCurrent)));
        detach_current().unwrap();

        context.make_current().unwrap();
        set_swap_interval(1).unwrap();
        assert_eq!(context.swap_interval(), 1);
        assert!(extension_supported("GL_ARB_debug_output"));
        assert!(!get_proc_address("glDebugMessageCallback").is_null());

        detach_current().unwrap();
        assert_eq!(current_window(), None);
        assert!(!context.is_current());
        assert_eq!(window.log.count("make_not_current"), 1);
    }

    #[test]
    #[should_panic(expected = "no current context")]
    fn thread_level_extension_query_without_context_panics() {
        extension_supported("GL_ARB_debug_output");
    }

    #[test]
    fn dropping_a_current_context_releases_it() {
        let (context, window) = ready(ContextSpec::default());
        context.make_current().unwrap();
        drop(context);
        assert_eq!(current_window(), None);
        assert_eq!(window.log.count("make_not_current"), 1);
    }

    #[test]
    fn dropping_on_a_non_owner_thread_leaves_the_backend_alone() {
        let (context, window) = ready(ContextSpec::default());
        let context = Arc::new(context);
        let owner = {
            let context = Arc::clone(&context);
            thread::spawn(move || {
                context.make_current().unwrap();
                thread::current().id()
            })
            .join()
            .unwrap()
        };
        assert_eq!(context.owner(), Some(owner));

        drop(context);
        assert_eq!(window.log.count("make_not_current"), 0);
        assert_eq!(window.log.calls(), vec!["create_context", "make_current"]);
        assert_eq!(current_window(), None);
    }
}
