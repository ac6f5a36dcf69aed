// SPDX-FileCopyrightText: 2022 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

// These tests drive gpio-sim chips, so require the gpio-sim kernel module
// and permission to configure it.
// Run them with `cargo test --test chardev -- --ignored`.

use gpioseq::chardev::{ChardevPinMap, ChardevWriter};
use gpioseq::pin::{PinMap, PinWriter};
use gpioseq::{ChipsetId, Level, Options, SetRequest, StateCoordinator};
use gpiosim::Simpleton;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn chipset_of(dev_path: &Path) -> ChipsetId {
    dev_path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_prefix("gpiochip"))
        .and_then(|n| n.parse().ok())
        .expect("sim should be a gpiochip")
}

fn sim_level(l: Level) -> gpiosim::Level {
    match l {
        Level::On => gpiosim::Level::High,
        Level::Off => gpiosim::Level::Low,
    }
}

#[test]
#[ignore = "requires gpio-sim"]
fn pin_map() {
    let s = Simpleton::new(8);
    let chipset = chipset_of(s.dev_path());
    let pm = ChardevPinMap::default();
    assert_eq!(pm.num_pins(chipset), Some(8));
    assert!(pm.has_pin(chipset, 0));
    assert!(pm.has_pin(chipset, 7));
    assert!(!pm.has_pin(chipset, 8));
}

#[test]
#[ignore = "requires gpio-sim"]
fn write() {
    let s = Simpleton::new(8);
    let chipset = chipset_of(s.dev_path());
    let w = ChardevWriter::default().with_consumer("gpioseq-test");

    w.write(chipset, 3, Level::On).unwrap();
    assert_eq!(s.get_level(3).unwrap(), sim_level(Level::On));
    assert_eq!(w.read(chipset, 3).unwrap(), Level::On);

    // reuses the held request
    w.write(chipset, 3, Level::Off).unwrap();
    assert_eq!(s.get_level(3).unwrap(), sim_level(Level::Off));
    assert_eq!(w.read(chipset, 3).unwrap(), Level::Off);
}

#[test]
#[ignore = "requires gpio-sim"]
fn read_input() {
    let s = Simpleton::new(8);
    let chipset = chipset_of(s.dev_path());
    let w = ChardevWriter::default();

    s.pullup(5).unwrap();
    assert_eq!(w.read(chipset, 5).unwrap(), Level::On);
    s.pulldown(5).unwrap();
    assert_eq!(w.read(chipset, 5).unwrap(), Level::Off);
}

#[test]
#[ignore = "requires gpio-sim"]
fn toggle_sequence() {
    let s = Simpleton::new(8);
    let chipset = chipset_of(s.dev_path());
    let c = StateCoordinator::new(
        Arc::new(ChardevWriter::default()),
        Arc::new(ChardevPinMap::default()),
    );
    let req = SetRequest::new(chipset, vec![1, 2], Level::On)
        .unwrap()
        .with_options(Options::new(Duration::from_millis(5), 2).unwrap());
    c.set_single(&req).unwrap();
    assert_eq!(s.get_level(1).unwrap(), sim_level(Level::On));
    assert_eq!(s.get_level(2).unwrap(), sim_level(Level::On));

    let e = c
        .set_single(&SetRequest::new(chipset, vec![8], Level::On).unwrap())
        .unwrap_err();
    assert!(e.is_validation());
}
