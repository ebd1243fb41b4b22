#![cfg(feature = "serde")]

use casement::{Backend, LoopMode, MouseCursor, WindowAttributes};
use serde::{Deserialize, Serialize};

fn needs_serde<S: Serialize + Deserialize<'static>>() {}

#[test]
fn window_serde() {
    needs_serde::<WindowAttributes>();
    needs_serde::<MouseCursor>();
}

#[test]
fn backend_serde() {
    needs_serde::<Backend>();
    needs_serde::<LoopMode>();
}
