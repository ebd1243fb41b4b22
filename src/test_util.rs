#![cfg(any(
    target_os = "linux",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]

use std::os::raw::c_void;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use raw_window_handle::unix::XlibHandle;
use raw_window_handle::RawWindowHandle;

use crate::backend::{NativeWindow, WindowDriver};
use crate::context::{BackendContext, ContextCapabilities};
use crate::error::{ContextError, OsError};
use crate::window::{Callbacks, WindowAttributes, WindowId};

#[derive(Default)]
pub struct CallLog {
    calls: Mutex<Vec<&'static str>>,
    intervals: Mutex<Vec<i32>>,
}

impl CallLog {
    fn record(&self, call: &'static str) {
        self.calls.lock().push(call);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    pub fn intervals(&self) -> Vec<i32> {
        self.intervals.lock().clone()
    }
}

#[derive(Clone, Default)]
pub struct ContextSpec {
    pub capabilities: ContextCapabilities,
    pub extensions: Vec<&'static str>,
    pub fail_create: bool,
    pub fail_make_current: bool,
}

pub struct MockContext {
    log: Arc<CallLog>,
    spec: ContextSpec,
}

impl BackendContext for MockContext {
    fn make_current(&self) -> Result<(), ContextError> {
        if self.spec.fail_make_current {
            return Err(ContextError::ContextLost);
        }
        self.log.record("make_current");
        Ok(())
    }

    fn make_not_current(&self) -> Result<(), ContextError> {
        self.log.record("make_not_current");
        Ok(())
    }

    fn swap_buffers(&self) -> Result<(), ContextError> {
        self.log.record("swap_buffers");
        Ok(())
    }

    fn set_swap_interval(&self, interval: i32) -> Result<(), ContextError> {
        self.log.record("set_swap_interval");
        self.log.intervals.lock().push(interval);
        Ok(())
    }

    fn capabilities(&self) -> ContextCapabilities {
        self.spec.capabilities
    }

    fn is_extension_supported(&self, name: &str) -> bool {
        self.spec.extensions.iter().any(|extension| *extension == name)
    }

    fn get_proc_address(&self, _name: &str) -> *const c_void {
        self as *const MockContext as *const c_void
    }
}

pub struct MockWindow {
    pub log: Arc<CallLog>,
    pub cursor: Mutex<Option<String>>,
    spec: ContextSpec,
}

impl MockWindow {
    pub fn new(spec: ContextSpec) -> Self {
        MockWindow {
            log: Arc::new(CallLog::default()),
            cursor: Mutex::new(None),
            spec,
        }
    }
}

impl NativeWindow for MockWindow {
    fn raw_window_handle(&self) -> RawWindowHandle {
        RawWindowHandle::Xlib(XlibHandle {
            window: 0x2a,
            ..XlibHandle::empty()
        })
    }

    fn create_context(&self) -> Result<Box<dyn BackendContext>, ContextError> {
        if self.spec.fail_create {
            return Err(ContextError::Os(OsError::new("no matching framebuffer config")));
        }
        self.log.record("create_context");
        Ok(Box::new(MockContext {
            log: Arc::clone(&self.log),
            spec: self.spec.clone(),
        }))
    }

    fn set_cursor(&self, name: &str) {
        *self.cursor.lock() = Some(name.to_owned());
    }
}

/// Driver that either always succeeds or always fails with a fixed message.
pub struct MockDriver {
    failure: Option<&'static str>,
    pub attempts: Arc<AtomicUsize>,
}

impl MockDriver {
    pub fn succeeding() -> Self {
        MockDriver {
            failure: None,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(message: &'static str) -> Self {
        MockDriver {
            failure: Some(message),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl WindowDriver for MockDriver {
    fn realize(
        &self,
        _id: WindowId,
        _callbacks: Arc<dyn Callbacks>,
        _attributes: &WindowAttributes,
    ) -> Result<Box<dyn NativeWindow>, OsError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Some(message) => Err(OsError::new(message)),
            None => Ok(Box::new(MockWindow::new(ContextSpec::default()))),
        }
    }
}
