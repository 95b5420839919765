// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observer events while scrolling a single element into and out of view.
//!
//! A [`RectSource`] stands in for the browser: it measures a fixed element
//! against a moving viewport and reports threshold crossings.
//!
//! Run:
//! - `cargo run -p understory_visibility_demos --example visibility_basics`

use kurbo::{Rect, Vec2};
use understory_visibility::adapters::rect::RectSource;
use understory_visibility::observer::{Observer, ObserverOptions};
use understory_visibility::types::EventKinds;

fn main() {
    let mut source = RectSource::new(Rect::new(0.0, 0.0, 400.0, 300.0));
    source.set_element("#banner", Rect::new(0.0, 400.0, 400.0, 600.0));

    let mut banner: Observer = Observer::new(
        ObserverOptions::default()
            .with_thresholds(vec![0.0, 0.25, 0.5, 0.75, 1.0])
            .with_margin("0px 0px 50px 0px"),
    );
    banner.listen(EventKinds::all(), |e| {
        println!("  event: {e:?}");
        Ok(())
    });
    banner.on_first_appeared(|| {
        println!("  (lazy-load the banner image here)");
        Ok(())
    });

    assert!(banner.start_observing("#banner", &mut source));

    for step in 0..8 {
        println!("scroll y = {}", source.viewport().y0);
        for signal in source.poll() {
            banner.handle_signal(&signal);
        }
        println!(
            "  visible={} appeared={} ratio={:.2}",
            banner.is_visible(),
            banner.has_appeared(),
            banner.current_threshold()
        );
        let dy = if step < 5 { 100.0 } else { -200.0 };
        source.scroll_by(Vec2::new(0.0, dy));
    }

    banner.dispose_in(&mut source);
    assert_eq!(source.subscription_count(), 0);
}
