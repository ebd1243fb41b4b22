#![cfg(any(
    target_os = "linux",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]

use std::os::raw::c_void;
use std::ptr;
use std::sync::{Arc, Mutex};

use casement::raw_window_handle::unix::WaylandHandle;
use casement::raw_window_handle::RawWindowHandle;
use casement::{
    Backend, BackendConfig, BackendContext, Callbacks, ContextCapabilities, ContextError,
    CreationError, DriverRegistry, EventLoop, LoopMode, MouseCursor, NativeWindow, OsError,
    WindowAttributes, WindowBuilder, WindowDriver, WindowEvent, WindowId,
};

struct NullContext;

impl BackendContext for NullContext {
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

struct TestWindow {
    cursor: Arc<Mutex<Option<String>>>,
}

impl NativeWindow for TestWindow {
    fn raw_window_handle(&self) -> RawWindowHandle {
        RawWindowHandle::Wayland(WaylandHandle::empty())
    }

    fn create_context(&self) -> Result<Box<dyn BackendContext>, ContextError> {
        Ok(Box::new(NullContext))
    }

    fn set_cursor(&self, name: &str) {
        *self.cursor.lock().unwrap() = Some(name.to_owned());
    }
}

#[derive(Clone, Copy, Debug)]
enum Outcome {
    Succeed,
    Fail(&'static str),
}

struct TestDriver {
    outcome: Outcome,
    cursor: Arc<Mutex<Option<String>>>,
    attempts: Arc<Mutex<u32>>,
}

impl TestDriver {
    fn new(outcome: Outcome) -> Self {
        TestDriver {
            outcome,
            cursor: Arc::new(Mutex::new(None)),
            attempts: Arc::new(Mutex::new(0)),
        }
    }
}

impl WindowDriver for TestDriver {
    fn realize(
        &self,
        id: WindowId,
        callbacks: Arc<dyn Callbacks>,
        _attributes: &WindowAttributes,
    ) -> Result<Box<dyn NativeWindow>, OsError> {
        *self.attempts.lock().unwrap() += 1;
        match self.outcome {
            Outcome::Succeed => {
                callbacks.event(id, WindowEvent::RedrawRequested);
                Ok(Box::new(TestWindow {
                    cursor: Arc::clone(&self.cursor),
                }))
            }
            Outcome::Fail(message) => Err(OsError::new(message)),
        }
    }
}

fn registry(wayland: Option<Outcome>, x11: Option<Outcome>) -> DriverRegistry {
    let mut builder = DriverRegistry::builder();
    if let Some(outcome) = wayland {
        builder = builder.with_driver(Backend::Wayland, TestDriver::new(outcome));
    }
    if let Some(outcome) = x11 {
        builder = builder.with_driver(Backend::X11, TestDriver::new(outcome));
    }
    builder.build()
}

fn create(registry: &DriverRegistry) -> Result<casement::Window, CreationError> {
    WindowBuilder::new()
        .with_title("scenario")
        .build(registry, Arc::new(()))
}

#[test]
fn scenario_a_single_backend_succeeds() {
    let registry = registry(Some(Outcome::Succeed), None);
    let window = create(&registry).unwrap();
    assert_eq!(window.backend(), Backend::Wayland);
    assert_eq!(window.attributes().title, "scenario");
}

#[test]
fn scenario_b_falls_back_after_a_failure() {
    let registry = registry(Some(Outcome::Fail("E1")), Some(Outcome::Succeed));
    let window = create(&registry).unwrap();
    assert_eq!(window.backend(), Backend::X11);
}

#[test]
fn scenario_c_reports_the_first_error() {
    let registry = registry(Some(Outcome::Fail("E1")), Some(Outcome::Fail("E2")));
    match create(&registry) {
        Err(CreationError::Os { backend, error }) => {
            assert_eq!(backend, Backend::Wayland);
            assert_eq!(error.to_string(), "E1");
        }
        other => panic!("expected the Wayland error, got {:?}", other),
    }
}

#[test]
fn scenario_d_polling_without_messages_returns_immediately() {
    let event_loop: EventLoop<WindowEvent> = EventLoop::new(LoopMode::Poll);
    assert_eq!(event_loop.poll_events(|_| unreachable!()), 0);
}

#[test]
fn every_registry_configuration_follows_the_fallback_rules() {
    let choices = [
        None,
        Some(Outcome::Succeed),
        Some(Outcome::Fail("wayland failed")),
    ];
    let x11_choices = [
        None,
        Some(Outcome::Succeed),
        Some(Outcome::Fail("x11 failed")),
    ];

    for &wayland in choices.iter() {
        for &x11 in x11_choices.iter() {
            let registry = registry(wayland, x11);
            let result = create(&registry);
            let present: Vec<(Backend, Outcome)> = vec![
                wayland.map(|o| (Backend::Wayland, o)),
                x11.map(|o| (Backend::X11, o)),
            ]
            .into_iter()
            .flatten()
            .collect();

            let winner = present.iter().find(|(_, o)| matches!(o, Outcome::Succeed));
            match (winner, present.first(), result) {
                (_, None, Err(CreationError::NoBackendAvailable)) => (),
                (Some(&(backend, _)), _, Ok(window)) => assert_eq!(window.backend(), backend),
                (None, Some(&(backend, Outcome::Fail(message))), Err(CreationError::Os { backend: got, error })) => {
                    assert_eq!(got, backend);
                    assert_eq!(error.to_string(), message);
                }
                (_, _, result) => panic!(
                    "wayland={:?} x11={:?} produced {:?}",
                    wayland, x11, result,
                ),
            }
        }
    }
}

#[test]
fn failed_backends_are_not_retried_and_later_ones_are_not_tried() {
    let wayland = TestDriver::new(Outcome::Fail("E1"));
    let x11 = TestDriver::new(Outcome::Succeed);
    let wayland_attempts = Arc::clone(&wayland.attempts);
    let x11_attempts = Arc::clone(&x11.attempts);
    let registry = DriverRegistry::builder()
        .with_driver(Backend::Wayland, wayland)
        .with_driver(Backend::X11, x11)
        .build();

    create(&registry).unwrap();
    assert_eq!(*wayland_attempts.lock().unwrap(), 1);
    assert_eq!(*x11_attempts.lock().unwrap(), 1);
}

#[test]
fn forcing_a_backend_skips_the_preferred_one() {
    let registry = DriverRegistry::builder()
        .with_driver(Backend::Wayland, TestDriver::new(Outcome::Succeed))
        .with_driver(Backend::X11, TestDriver::new(Outcome::Succeed))
        .with_config(BackendConfig {
            forced: Some(Backend::X11),
        })
        .build();
    assert_eq!(create(&registry).unwrap().backend(), Backend::X11);
}

#[test]
fn forcing_a_missing_backend_leaves_no_driver() {
    let registry = DriverRegistry::builder()
        .with_driver(Backend::X11, TestDriver::new(Outcome::Succeed))
        .with_config(BackendConfig {
            forced: Some(Backend::Wayland),
        })
        .build();
    assert!(matches!(create(&registry), Err(CreationError::NoBackendAvailable)));
}

#[test]
fn windows_on_different_backends_can_coexist() {
    let wayland_only = registry(Some(Outcome::Succeed), None);
    let x11_only = registry(None, Some(Outcome::Succeed));
    let a = create(&wayland_only).unwrap();
    let b = create(&x11_only).unwrap();
    assert_eq!(a.backend(), Backend::Wayland);
    assert_eq!(b.backend(), Backend::X11);
    assert_ne!(a.id(), b.id());
}

#[test]
fn cursor_names_reach_the_native_window() {
    let driver = TestDriver::new(Outcome::Succeed);
    let cursor = Arc::clone(&driver.cursor);
    let registry = DriverRegistry::builder()
        .with_driver(Backend::Wayland, driver)
        .build();
    let window = create(&registry).unwrap();

    window.set_cursor(MouseCursor::Text);
    assert_eq!(cursor.lock().unwrap().as_deref(), Some("xterm"));
    window.set_cursor(MouseCursor::None);
    assert_eq!(cursor.lock().unwrap().as_deref(), Some(""));
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<(WindowId, WindowEvent)>>,
}

impl Callbacks for Recorder {
    fn event(&self, window: WindowId, event: WindowEvent) {
        self.events.lock().unwrap().push((window, event));
    }
}

#[test]
fn callbacks_are_handed_to_the_driver() {
    let registry = registry(Some(Outcome::Succeed), None);
    let recorder = Arc::new(Recorder::default());
    let window = WindowBuilder::new()
        .build(&registry, recorder.clone())
        .unwrap();
    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec![(window.id(), WindowEvent::RedrawRequested)],
    );
}

#[test]
fn window_context_round_trip() {
    let registry = registry(None, Some(Outcome::Succeed));
    let window = create(&registry).unwrap();

    window.make_context_current().unwrap();
    assert_eq!(casement::context::current_window(), Some(window.id()));
    window.swap_buffers().unwrap();
    window.context().set_swap_interval(0).unwrap();
    assert!(matches!(
        window.context().set_swap_interval(-1),
        Err(ContextError::SwapControlTearUnsupported(-1))
    ));
    casement::context::detach_current().unwrap();
    assert!(matches!(window.swap_buffers(), Err(ContextError::NotCurrent)));
}
