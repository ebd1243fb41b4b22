//! Casement picks a window backend at runtime and manages the graphics context
//! attached to each window it creates.
//!
//! # Building a window
//!
//! Window creation goes through a [`DriverRegistry`], a fixed, priority-ordered
//! set of driver slots (Wayland before X11). Each slot either holds a
//! [`WindowDriver`] or is explicitly absent. Creating a window tries every
//! present driver in order and keeps the first one that succeeds:
//!
//! ```ignore
//! let registry = DriverRegistry::builder()
//!     .with_driver(Backend::Wayland, my_wayland_driver)
//!     .with_driver(Backend::X11, my_x11_driver)
//!     .with_config(BackendConfig::from_env()?)
//!     .build();
//!
//! let window = WindowBuilder::new()
//!     .with_title("A fantastic window!")
//!     .build(&registry, Arc::new(()))?;
//!
//! window.make_context_current()?;
//! window.context().set_swap_interval(1)?;
//! ```
//!
//! If the registry has no driver at all, creation fails with
//! [`CreationError::NoBackendAvailable`]. If every driver fails, the error of
//! the highest-priority driver is returned.
//!
//! # Graphics contexts
//!
//! A [`GraphicsContext`] may be current on at most one thread at a time.
//! Acquiring a context held by another thread fails immediately instead of
//! waiting for it.
//!
//! # Event loop
//!
//! An [`EventLoop`] is created in either [`LoopMode::Block`] or
//! [`LoopMode::Poll`]. Pick the mode before creating any window.

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate bitflags;

pub use raw_window_handle;

pub use crate::backend::{
    Backend, BackendConfig, DriverRegistry, DriverRegistryBuilder, DriverSlot, NativeWindow,
    WindowDriver,
};
pub use crate::context::{BackendContext, ContextCapabilities, GraphicsContext};
pub use crate::cursor::{CursorCatalog, MouseCursor};
pub use crate::error::{
    ContextError, CreationError, EventLoopClosed, OsError, ParseBackendError,
};
pub use crate::event_loop::{EventLoop, EventLoopProxy, LoopMode};
pub use crate::time::TimeSource;
pub use crate::window::{
    create_window, Callbacks, Window, WindowAttributes, WindowBuilder, WindowEvent, WindowId,
};

pub mod backend;
pub mod context;
pub mod cursor;
pub mod error;
pub mod event_loop;
pub mod time;
pub mod window;

mod platform_impl;

#[cfg(test)]
mod test_util;
