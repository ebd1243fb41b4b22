//! Opens a window on a headless driver and drains its events in poll mode.

#[cfg(any(
    target_os = "linux",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]
mod headless {
    use std::os::raw::c_void;
    use std::ptr;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use casement::raw_window_handle::unix::XlibHandle;
    use casement::raw_window_handle::RawWindowHandle;
    use casement::{
        BackendContext, Callbacks, ContextCapabilities, ContextError, EventLoopProxy,
        NativeWindow, OsError, WindowAttributes, WindowDriver, WindowEvent, WindowId,
    };

    /// Forwards driver events into the event loop.
    pub struct Forward(pub Mutex<EventLoopProxy<(WindowId, WindowEvent)>>);

    impl Callbacks for Forward {
        fn event(&self, window: WindowId, event: WindowEvent) {
            if let Err(err) = self.0.lock().unwrap().send((window, event)) {
                log::warn!("Dropping {:?} for window {:?}: {}", event, window, err);
            }
        }
    }

    struct HeadlessContext;

    impl BackendContext for HeadlessContext {
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
            ContextCapabilities::SWAP_CONTROL_TEAR
        }

        fn is_extension_supported(&self, _name: &str) -> bool {
            false
        }

        fn get_proc_address(&self, _name: &str) -> *const c_void {
            ptr::null()
        }
    }

    struct HeadlessWindow(u64);

    impl NativeWindow for HeadlessWindow {
        fn raw_window_handle(&self) -> RawWindowHandle {
            RawWindowHandle::Xlib(XlibHandle {
                window: self.0 as _,
                ..XlibHandle::empty()
            })
        }

        fn create_context(&self) -> Result<Box<dyn BackendContext>, ContextError> {
            Ok(Box::new(HeadlessContext))
        }

        fn set_cursor(&self, name: &str) {
            println!("cursor is now {:?}", name);
        }
    }

    /// Pretends to be a display server: resizes the window, asks for a few
    /// redraws and then for the window to close.
    pub struct HeadlessDriver;

    impl WindowDriver for HeadlessDriver {
        fn realize(
            &self,
            id: WindowId,
            callbacks: Arc<dyn Callbacks>,
            attributes: &WindowAttributes,
        ) -> Result<Box<dyn NativeWindow>, OsError> {
            let (width, height) = attributes.initial_size();
            thread::spawn(move || {
                callbacks.event(id, WindowEvent::Resized(width, height));
                for _ in 0..3 {
                    thread::sleep(Duration::from_millis(16));
                    callbacks.event(id, WindowEvent::RedrawRequested);
                }
                callbacks.event(id, WindowEvent::CloseRequested);
            });
            Ok(Box::new(HeadlessWindow(id.raw())))
        }
    }
}

#[cfg(any(
    target_os = "linux",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]
fn main() {
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use casement::{
        Backend, DriverRegistry, EventLoop, LoopMode, MouseCursor, WindowBuilder, WindowEvent,
    };

    simple_logger::init_with_level(log::Level::Debug).unwrap();

    let event_loop = EventLoop::new(LoopMode::Poll);
    let callbacks = Arc::new(headless::Forward(Mutex::new(event_loop.create_proxy())));

    let registry = DriverRegistry::builder()
        .with_driver(Backend::X11, headless::HeadlessDriver)
        .build();
    let window = WindowBuilder::new()
        .with_title("A fantastic window!")
        .with_min_dimensions(1024, 768)
        .build(&registry, callbacks)
        .unwrap();

    window.make_context_current().unwrap();
    window.context().set_swap_interval(1).unwrap();
    window.set_cursor(MouseCursor::Crosshair);

    let mut running = true;
    while running {
        event_loop.poll_events(|(id, event)| {
            println!("{:?}: {:?}", id, event);
            match event {
                WindowEvent::RedrawRequested => window.swap_buffers().unwrap(),
                WindowEvent::CloseRequested => running = false,
                _ => (),
            }
        });
        thread::sleep(Duration::from_millis(5));
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
