// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_tracks_wall_time() {
    let before = Utc::now();
    let now = SystemClock.now();
    assert!(now >= before);
}

#[test]
fn fake_clock_can_be_advanced() {
    let clock = FakeClock::new();
    let t1 = clock.now();
    clock.advance(Duration::from_secs(60));
    assert_eq!((clock.now() - t1).num_seconds(), 60);
}

#[test]
fn fake_clock_is_cloneable_and_shared() {
    let clock1 = FakeClock::new();
    let clock2 = clock1.clone();
    let t1 = clock1.now();
    clock2.advance(Duration::from_secs(30));
    assert_eq!((clock1.now() - t1).num_seconds(), 30);
}

#[test]
fn fake_clock_set_and_epoch_ms_agree() {
    let clock = FakeClock::new();
    let target = Utc::now() + ChronoDuration::hours(1);
    clock.set(target);
    assert_eq!(clock.now(), target);
    assert_eq!(clock.epoch_ms(), target.timestamp_millis());
}
