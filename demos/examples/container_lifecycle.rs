// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Containers: identity, first render, and unmount.
//!
//! A container owns one observer. The rendering layer writes
//! `APPEAR_ID_ATTRIBUTE="<id>"` on the element, then reports the first
//! render so observation can start. A container unmounted before its element
//! was rendered never observes anything.
//!
//! Run:
//! - `cargo run -p understory_visibility_demos --example container_lifecycle`

use kurbo::Rect;
use understory_visibility::adapters::rect::RectSource;
use understory_visibility::container::{APPEAR_ID_ATTRIBUTE, Container, ContainerOptions};
use understory_visibility::observer::Lifecycle;

fn main() {
    let mut source = RectSource::new(Rect::new(0.0, 0.0, 320.0, 480.0));

    let mut card: Container = Container::new(ContainerOptions::default());
    println!("<div {APPEAR_ID_ATTRIBUTE}=\"{}\">", card.id());
    card.on_initialized(|| {
        println!("  observing");
        Ok(())
    });
    card.on_appeared(|| {
        println!("  card appeared");
        Ok(())
    });

    // The element is now in the rendered output.
    source.set_element(card.locator(), Rect::new(10.0, 100.0, 310.0, 200.0));
    card.first_render_complete(&mut source);
    for signal in source.poll() {
        card.handle_signal(&signal);
    }
    println!("  visible={} ratio={}", card.is_visible(), card.current_threshold());

    card.unmount(&mut source);
    source.remove_element(&card.locator());
    assert_eq!(card.lifecycle(), Lifecycle::Disposed);

    // Torn down before the element ever reached the page.
    let mut ghost: Container = Container::new(ContainerOptions::with_id("ghost"));
    let started = ghost.first_render_complete(&mut source);
    println!("ghost started: {started}, lifecycle: {:?}", ghost.lifecycle());
    ghost.unmount(&mut source);
    assert_eq!(source.subscription_count(), 0);
}
