//! Shows which backend a window lands on for a few registry setups.
//!
//! Set `CASEMENT_UNIX_BACKEND=x11` to force the X11 driver.

#[cfg(any(
    target_os = "linux",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]
fn main() {
    use std::os::raw::c_void;
    use std::ptr;
    use std::sync::Arc;

    use casement::raw_window_handle::unix::WaylandHandle;
    use casement::raw_window_handle::RawWindowHandle;
    use casement::{
        Backend, BackendConfig, BackendContext, Callbacks, ContextCapabilities, ContextError,
        DriverRegistry, NativeWindow, OsError, WindowAttributes, WindowBuilder, WindowDriver,
        WindowId,
    };

    struct Context;

    impl BackendContext for Context {
        fn make_current(&self) -> Result<(), ContextError> {
            Ok(())
        }
        fn make_not_current(&self) -> Result<(), ContextError> {
            Ok(())
        }
        fn swap_buffers(&self) -> Result<(), ContextError> {
            Ok(())
        }
        fn set_swap_interval(&self, _interval: i32) -> Result<(), ContextError> {
            Ok(())
        }
        fn capabilities(&self) -> ContextCapabilities {
            ContextCapabilities::empty()
        }
        fn is_extension_supported(&self, _name: &str) -> bool {
            false
        }
        fn get_proc_address(&self, _name: &str) -> *const c_void {
            ptr::null()
        }
    }

    struct Surface;

    impl NativeWindow for Surface {
        fn raw_window_handle(&self) -> RawWindowHandle {
            RawWindowHandle::Wayland(WaylandHandle::empty())
        }
        fn create_context(&self) -> Result<Box<dyn BackendContext>, ContextError> {
            Ok(Box::new(Context))
        }
        fn set_cursor(&self, _name: &str) {}
    }

    /// Succeeds, or fails with the given message.
    struct Driver(Option<&'static str>);

    impl WindowDriver for Driver {
        fn realize(
            &self,
            _id: WindowId,
            _callbacks: Arc<dyn Callbacks>,
            _attributes: &WindowAttributes,
        ) -> Result<Box<dyn NativeWindow>, OsError> {
            match self.0 {
                Some(message) => Err(OsError::new(message)),
                None => Ok(Box::new(Surface)),
            }
        }
    }

    simple_logger::init_with_level(log::Level::Debug).unwrap();

    let config = match BackendConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            BackendConfig::default()
        }
    };

    let setups: Vec<(&str, Option<Driver>, Option<Driver>)> = vec![
        ("both available", Some(Driver(None)), Some(Driver(None))),
        (
            "no compositor",
            Some(Driver(Some("no compositor socket"))),
            Some(Driver(None)),
        ),
        (
            "no display at all",
            Some(Driver(Some("no compositor socket"))),
            Some(Driver(Some("cannot open display :0"))),
        ),
        ("nothing registered", None, None),
    ];

    for (label, wayland, x11) in setups {
        let mut builder = DriverRegistry::builder().with_config(config);
        if let Some(driver) = wayland {
            builder = builder.with_driver(Backend::Wayland, driver);
        }
        if let Some(driver) = x11 {
            builder = builder.with_driver(Backend::X11, driver);
        }
        let registry = builder.build();

        match WindowBuilder::new().build(&registry, Arc::new(())) {
            Ok(window) => println!("{}: window {:?} on {}", label, window.id(), window.backend()),
            Err(err) => println!("{}: {}", label, err),
        }
    }
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
)))]
fn main() {
    println!("This demo needs a Unix desktop target.");
}
