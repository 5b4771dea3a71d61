//! Resident context under concurrent use
//!
//! Context is thread-local: guards on one thread never leak into another.

use std::sync::{Arc, Barrier};
use std::thread;

use floorboard_core::{Floor, PrincipalId};
use floorboard_logging::ResidentContextGuard;

#[test]
fn test_concurrent_resident_contexts() {
    const NUM_THREADS: usize = 16;
    const ITERATIONS: usize = 200;

    let barrier = Arc::new(Barrier::new(NUM_THREADS));
    let mut handles = Vec::new();

    for thread_id in 0..NUM_THREADS {
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            let principal = PrincipalId::new(format!("uid-{}", thread_id));
            let floor = Floor::new(thread_id as u32 + 1);
            barrier.wait();

            for _ in 0..ITERATIONS {
                let _guard = ResidentContextGuard::new(&principal).with_floor(floor);
                let ctx = ResidentContextGuard::current().unwrap();
                assert_eq!(ctx.principal_id, principal.as_str());
                assert_eq!(ctx.floor, Some(floor.number()));
            }
            assert!(ResidentContextGuard::current().is_none());
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_rapid_floor_switching() {
    let principal = PrincipalId::new("uid-1");
    let _session = ResidentContextGuard::new(&principal);
    let instance = ResidentContextGuard::current_instance_id();

    for number in [3, 999, 12, 1, 19] {
        let _viewing =
            ResidentContextGuard::with_instance_id(&principal, instance.unwrap()).with_floor(Floor::new(number));
        assert_eq!(ResidentContextGuard::current_floor(), Some(number));
        assert_eq!(ResidentContextGuard::current_instance_id(), instance);
    }
    assert_eq!(ResidentContextGuard::current_floor(), None);
}
