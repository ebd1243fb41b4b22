//! Window drivers and the registry that orders them.
//!
//! A driver realizes windows for one display-protocol family. The registry
//! holds exactly one slot per [`Backend`]; a slot either carries a driver or
//! is explicitly [`DriverSlot::Absent`].

use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use raw_window_handle::RawWindowHandle;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::context::BackendContext;
use crate::cursor::CursorCatalog;
use crate::error::{ContextError, OsError, ParseBackendError};
use crate::window::{Callbacks, WindowAttributes, WindowId};

/// Environment variable that restricts window creation to a single backend.
pub const BACKEND_ENV_VAR: &str = "CASEMENT_UNIX_BACKEND";

/// A display-protocol family.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Backend {
    Wayland,
    X11,
}

impl Backend {
    pub const COUNT: usize = 2;

    /// Order in which backends are tried. Wayland is preferred over X11.
    pub const PRIORITY: [Backend; Backend::COUNT] = [Backend::Wayland, Backend::X11];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Backend::Wayland => "wayland",
            Backend::X11 => "x11",
        }
    }

    /// Whether support for this backend was compiled in.
    pub fn is_compiled(self) -> bool {
        match self {
            Backend::Wayland => cfg!(feature = "wayland"),
            Backend::X11 => cfg!(feature = "x11"),
        }
    }

    /// Cursor names understood by this backend.
    pub fn cursor_catalog(self) -> CursorCatalog {
        match self {
            Backend::Wayland | Backend::X11 => CursorCatalog::XCURSOR,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wayland" => Ok(Backend::Wayland),
            "x11" => Ok(Backend::X11),
            _ => Err(ParseBackendError { name: s.to_owned() }),
        }
    }
}

/// Creates native windows for one backend.
///
/// A failed `realize` must clean up after itself: once it returns an error,
/// the next driver in the registry gets its turn and must not be hindered by
/// anything the failed attempt left behind.
pub trait WindowDriver: Send + Sync {
    fn realize(
        &self,
        id: WindowId,
        callbacks: Arc<dyn Callbacks>,
        attributes: &WindowAttributes,
    ) -> Result<Box<dyn NativeWindow>, OsError>;
}

/// A live window owned by the driver that created it.
///
/// The core only talks to it through this trait and never looks at
/// backend-private state.
pub trait NativeWindow: Send + Sync {
    fn raw_window_handle(&self) -> RawWindowHandle;

    /// Allocates the graphics context for this window's surface.
    fn create_context(&self) -> Result<Box<dyn BackendContext>, ContextError>;

    /// Applies a cursor by its backend name. An empty name hides the cursor.
    fn set_cursor(&self, name: &str);
}

/// One registry slot.
pub enum DriverSlot {
    Present(Box<dyn WindowDriver>),
    Absent,
}

impl DriverSlot {
    #[inline]
    pub fn is_present(&self) -> bool {
        match *self {
            DriverSlot::Present(_) => true,
            DriverSlot::Absent => false,
        }
    }

    pub fn driver(&self) -> Option<&dyn WindowDriver> {
        match *self {
            DriverSlot::Present(ref driver) => Some(&**driver),
            DriverSlot::Absent => None,
        }
    }
}

impl fmt::Debug for DriverSlot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DriverSlot::Present(_) => f.write_str("Present(..)"),
            DriverSlot::Absent => f.write_str("Absent"),
        }
    }
}

impl Default for DriverSlot {
    fn default() -> Self {
        DriverSlot::Absent
    }
}

/// Runtime restrictions applied when a registry is built.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackendConfig {
    /// Only this backend may be used; every other slot is left absent.
    pub forced: Option<Backend>,
}

impl BackendConfig {
    /// Reads [`BACKEND_ENV_VAR`]. Unset or empty means no restriction.
    pub fn from_env() -> Result<Self, ParseBackendError> {
        match env::var(BACKEND_ENV_VAR) {
            Ok(ref value) if !value.trim().is_empty() => Ok(BackendConfig {
                forced: Some(value.parse()?),
            }),
            Ok(_) | Err(env::VarError::NotPresent) => Ok(BackendConfig::default()),
            Err(env::VarError::NotUnicode(value)) => Err(ParseBackendError {
                name: value.to_string_lossy().into_owned(),
            }),
        }
    }

    #[inline]
    pub fn allows(&self, backend: Backend) -> bool {
        self.forced.map_or(true, |forced| forced == backend)
    }
}

/// The fixed, priority-ordered set of window drivers.
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Default)]
pub struct DriverRegistry {
    slots: [DriverSlot; Backend::COUNT],
}

impl DriverRegistry {
    /// A registry with every slot absent.
    pub fn empty() -> Self {
        DriverRegistry::default()
    }

    pub fn builder() -> DriverRegistryBuilder {
        DriverRegistryBuilder::default()
    }

    #[inline]
    pub fn slot(&self, backend: Backend) -> &DriverSlot {
        &self.slots[backend.index()]
    }

    /// Present drivers in priority order.
    pub fn drivers(&self) -> impl Iterator<Item = (Backend, &dyn WindowDriver)> + '_ {
        let priority: &'static [Backend; Backend::COUNT] = &Backend::PRIORITY;
        priority.iter().filter_map(move |&backend| {
            self.slot(backend)
                .driver()
                .map(|driver| (backend, driver))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| !slot.is_present())
    }
}

#[derive(Default)]
pub struct DriverRegistryBuilder {
    slots: [DriverSlot; Backend::COUNT],
    config: BackendConfig,
}

impl DriverRegistryBuilder {
    /// Registers the driver for `backend`, replacing any earlier one.
    ///
    /// Drivers for backends that were compiled out are discarded.
    pub fn with_driver<D>(mut self, backend: Backend, driver: D) -> Self
    where
        D: WindowDriver + 'static,
    {
        if backend.is_compiled() {
            self.slots[backend.index()] = DriverSlot::Present(Box::new(driver));
        } else {
            warn!(
                "Ignoring {} driver: support for this backend is not compiled in",
                backend,
            );
        }
        self
    }

    pub fn with_config(mut self, config: BackendConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> DriverRegistry {
        let config = self.config;
        let mut slots = self.slots;
        for &backend in Backend::PRIORITY.iter() {
            let slot = &mut slots[backend.index()];
            if slot.is_present() && !config.allows(backend) {
                debug!("Disabling {} driver: backend restricted to {:?}", backend, config.forced);
                *slot = DriverSlot::Absent;
            }
        }
        DriverRegistry { slots }
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
    use crate::test_util::MockDriver;

    #[test]
    fn parses_backend_names() {
        assert_eq!("wayland".parse::<Backend>(), Ok(Backend::Wayland));
        assert_eq!(" X11 ".parse::<Backend>(), Ok(Backend::X11));
        assert!("mir".parse::<Backend>().is_err());
    }

    #[test]
    fn priority_prefers_wayland() {
        assert_eq!(Backend::PRIORITY, [Backend::Wayland, Backend::X11]);
    }

    #[test]
    fn empty_registry_has_no_drivers() {
        let registry = DriverRegistry::empty();
        assert!(registry.is_empty());
        assert_eq!(registry.drivers().count(), 0);
        assert!(!registry.slot(Backend::X11).is_present());
    }

    #[test]
    #[cfg(all(feature = "x11", feature = "wayland"))]
    fn drivers_come_out_in_priority_order() {
        let registry = DriverRegistry::builder()
            .with_driver(Backend::X11, MockDriver::succeeding())
            .with_driver(Backend::Wayland, MockDriver::succeeding())
            .build();
        let order: Vec<_> = registry.drivers().map(|(backend, _)| backend).collect();
        assert_eq!(order, vec![Backend::Wayland, Backend::X11]);
    }

    #[test]
    #[cfg(all(feature = "x11", feature = "wayland"))]
    fn forced_backend_disables_the_others() {
        let registry = DriverRegistry::builder()
            .with_driver(Backend::X11, MockDriver::succeeding())
            .with_driver(Backend::Wayland, MockDriver::succeeding())
            .with_config(BackendConfig {
                forced: Some(Backend::X11),
            })
            .build();
        assert!(!registry.slot(Backend::Wayland).is_present());
        assert!(registry.slot(Backend::X11).is_present());
    }

    #[test]
    fn config_is_read_from_the_environment() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        // One test owns the variable so parallel tests never race on it.
        env::remove_var(BACKEND_ENV_VAR);
        assert_eq!(BackendConfig::from_env(), Ok(BackendConfig::default()));

        env::set_var(BACKEND_ENV_VAR, "  ");
        assert_eq!(BackendConfig::from_env(), Ok(BackendConfig::default()));

        env::set_var(BACKEND_ENV_VAR, "Wayland");
        assert_eq!(
            BackendConfig::from_env(),
            Ok(BackendConfig {
                forced: Some(Backend::Wayland),
            })
        );

        env::set_var(BACKEND_ENV_VAR, "mir");
        assert_eq!(
            BackendConfig::from_env(),
            Err(ParseBackendError {
                name: "mir".to_owned(),
            })
        );

        env::set_var(BACKEND_ENV_VAR, OsString::from_vec(vec![b'x', 0xff]));
        assert!(BackendConfig::from_env().is_err());

        env::remove_var(BACKEND_ENV_VAR);
    }

    #[test]
    #[cfg(not(feature = "x11"))]
    fn compiled_out_driver_leaves_its_slot_absent() {
        use crate::error::CreationError;
        use crate::window::{create_window, WindowAttributes};

        let registry = DriverRegistry::builder()
            .with_driver(Backend::X11, MockDriver::succeeding())
            .build();
        assert!(!registry.slot(Backend::X11).is_present());
        assert!(registry.is_empty());
        let err = create_window(&registry, Arc::new(()), WindowAttributes::default()).unwrap_err();
        assert!(matches!(err, CreationError::NoBackendAvailable));
    }

    #[test]
    #[cfg(all(not(feature = "wayland"), feature = "x11"))]
    fn compiled_out_wayland_driver_is_skipped() {
        let registry = DriverRegistry::builder()
            .with_driver(Backend::Wayland, MockDriver::succeeding())
            .with_driver(Backend::X11, MockDriver::succeeding())
            .build();
        let order: Vec<_> = registry.drivers().map(|(backend, _)| backend).collect();
        assert_eq!(order, vec![Backend::X11]);
    }

    #[test]
    fn compiled_backends_follow_features() {
        assert_eq!(Backend::X11.is_compiled(), cfg!(feature = "x11"));
        assert_eq!(Backend::Wayland.is_compiled(), cfg!(feature = "wayland"));
    }

    #[test]
    fn config_allows_everything_by_default() {
        let config = BackendConfig::default();
        assert!(config.allows(Backend::Wayland));
        assert!(config.allows(Backend::X11));
    }
}
