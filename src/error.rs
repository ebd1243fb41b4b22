use std::error::Error;
use std::fmt;
use std::thread::ThreadId;

use crate::backend::Backend;

/// An error reported by a backend driver or by the native library behind it.
///
/// The core never interprets the contents: it is carried through unchanged so
/// the caller sees exactly what the driver reported.
#[derive(Debug)]
pub struct OsError {
    error: Box<dyn Error + Send + Sync>,
}

impl OsError {
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        OsError {
            error: error.into(),
        }
    }

    #[inline]
    pub fn get_ref(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.error
    }

    /// Attempts to recover the concrete error type the driver produced.
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.error.downcast_ref::<E>()
    }

    pub fn into_inner(self) -> Box<dyn Error + Send + Sync> {
        self.error
    }
}

impl fmt::Display for OsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl Error for OsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.error)
    }
}

/// Error that can happen while creating a window.
#[derive(Debug)]
pub enum CreationError {
    /// No driver is registered for any backend. This points at the build or
    /// the registry setup, not at the environment the program runs in.
    NoBackendAvailable,
    /// Every registered driver failed. Holds the error of the
    /// highest-priority driver that was tried.
    Os { backend: Backend, error: OsError },
    /// A driver realized the window but its graphics context could not be
    /// allocated.
    Context(ContextError),
}

impl CreationError {
    /// The backend whose error is being reported, if any backend was tried.
    pub fn backend(&self) -> Option<Backend> {
        match *self {
            CreationError::Os { backend, .. } => Some(backend),
            _ => None,
        }
    }
}

impl fmt::Display for CreationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CreationError::NoBackendAvailable => f.write_str("no window driver available"),
            CreationError::Os { backend, ref error } => {
                write!(f, "{} backend failed to create the window: {}", backend, error)
            }
            CreationError::Context(ref err) => {
                write!(f, "failed to create the graphics context: {}", err)
            }
        }
    }
}

impl Error for CreationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            CreationError::NoBackendAvailable => None,
            CreationError::Os { ref error, .. } => Some(error),
            CreationError::Context(ref err) => Some(err),
        }
    }
}

impl From<ContextError> for CreationError {
    fn from(err: ContextError) -> Self {
        CreationError::Context(err)
    }
}

/// Error that can happen when manipulating a graphics context.
#[derive(Debug)]
pub enum ContextError {
    /// The context has not been allocated yet.
    NotInitialized,
    /// The operation requires the context to be current on the calling thread.
    NotCurrent,
    /// The context is current on another thread and must be detached there first.
    CurrentOnOtherThread(ThreadId),
    /// A negative swap interval was requested but the backend lacks late-swap
    /// tearing support.
    SwapControlTearUnsupported(i32),
    ContextLost,
    Os(OsError),
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ContextError::NotInitialized => f.write_str("graphics context is not initialized"),
            ContextError::NotCurrent => {
                f.write_str("graphics context is not current on the calling thread")
            }
            ContextError::CurrentOnOtherThread(owner) => {
                write!(f, "graphics context is current on thread {:?}", owner)
            }
            ContextError::SwapControlTearUnsupported(interval) => write!(
                f,
                "swap interval {} requires swap control tear, which the backend does not support",
                interval,
            ),
            ContextError::ContextLost => f.write_str("graphics context lost"),
            ContextError::Os(ref err) => write!(f, "{}", err),
        }
    }
}

impl Error for ContextError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            ContextError::Os(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<OsError> for ContextError {
    fn from(err: OsError) -> Self {
        ContextError::Os(err)
    }
}

/// The event loop no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventLoopClosed;

impl fmt::Display for EventLoopClosed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("tried to wake up a closed event loop")
    }
}

impl Error for EventLoopClosed {}

/// A backend name that matches none of the known backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBackendError {
    pub(crate) name: String,
}

impl fmt::Display for ParseBackendError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "unknown backend {:?}, expected one of \"wayland\" or \"x11\"",
            self.name,
        )
    }
}

impl Error for ParseBackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NoSocket;

    impl fmt::Display for NoSocket {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("no compositor socket")
        }
    }

    impl Error for NoSocket {}

    #[test]
    fn os_error_keeps_the_driver_error() {
        let err = OsError::new(NoSocket);
        assert!(err.downcast_ref::<NoSocket>().is_some());
        assert_eq!(err.to_string(), "no compositor socket");
    }

    #[test]
    fn creation_error_names_the_backend() {
        let err = CreationError::Os {
            backend: Backend::Wayland,
            error: OsError::new("E1"),
        };
        assert_eq!(err.backend(), Some(Backend::Wayland));
        assert_eq!(err.to_string(), "wayland backend failed to create the window: E1");
        assert!(err.source().is_some());
        assert_eq!(CreationError::NoBackendAvailable.backend(), None);
    }
}
