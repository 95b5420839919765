// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Track the most visible section of a long page, e.g. to highlight the
//! matching entry in a table of contents.
//!
//! Run:
//! - `cargo run -p understory_visibility_demos --example most_visible`

use kurbo::{Rect, Vec2};
use understory_visibility::adapters::rect::RectSource;
use understory_visibility::comparator::{Comparator, SharedComparator};
use understory_visibility::observer::{Observer, ObserverOptions};
use understory_visibility::thresholds::Thresholds;

const SECTIONS: [&str; 4] = ["intro", "install", "usage", "faq"];

fn main() {
    let mut source = RectSource::new(Rect::new(0.0, 0.0, 800.0, 500.0));
    for (i, name) in SECTIONS.iter().enumerate() {
        let top = i as f64 * 400.0;
        source.set_element(format!("#{name}"), Rect::new(0.0, top, 800.0, top + 400.0));
    }

    let toc: SharedComparator<&'static str> = Comparator::shared();
    toc.borrow_mut().on_most_visible_changed(|m| {
        match m {
            Some(m) => println!("  toc highlight -> {} ({:.2})", m.data, m.threshold),
            None => println!("  toc highlight -> none"),
        }
        Ok(())
    });

    let mut sections: Vec<Observer<&'static str>> = SECTIONS
        .iter()
        .map(|name| {
            let mut obs = Observer::new(
                ObserverOptions::with_data(*name).with_thresholds(Thresholds::Interval(0.05)),
            );
            obs.attach(&toc);
            obs.start_observing(format!("#{name}"), &mut source);
            obs
        })
        .collect();

    for _ in 0..6 {
        println!("scroll y = {}", source.viewport().y0);
        for signal in source.poll() {
            for section in &mut sections {
                section.handle_signal(&signal);
            }
        }
        source.scroll_by(Vec2::new(0.0, 230.0));
    }

    // Unmounting a section removes it from the group.
    if let Some(mut faq) = sections.pop() {
        faq.dispose_in(&mut source);
    }
    println!("members left: {}", toc.borrow().len());
}
