//! A frame loop that polls for messages posted from another thread and
//! measures frame times with the high-resolution clock.

use std::thread;
use std::time::Duration;

use casement::{EventLoop, LoopMode, TimeSource};

fn main() {
    simple_logger::init_with_level(log::Level::Info).unwrap();

    let event_loop = EventLoop::new(LoopMode::Poll);
    let proxy = event_loop.create_proxy();

    thread::spawn(move || {
        // Post a message every 100ms until the loop goes away.
        for tick in 0.. {
            thread::sleep(Duration::from_millis(100));
            if proxy.send(tick).is_err() {
                break;
            }
        }
    });

    let clock = TimeSource;
    println!("timer frequency: {} Hz", clock.frequency());

    let start = clock.now();
    let mut last = start;
    let mut received = 0;
    while received < 10 {
        received += event_loop.poll_events(|tick| println!("tick {}", tick));

        let now = clock.now();
        let frame = clock.seconds_between(last, now);
        if frame > 0.05 {
            log::warn!("slow frame: {:.3}s", frame);
        }
        last = now;
        thread::sleep(Duration::from_millis(16));
    }
    println!("{:.2}s elapsed", clock.seconds_between(start, clock.now()));
    event_loop.run();
}
