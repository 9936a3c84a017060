#![no_main]

use libfuzzer_sys::fuzz_target;
use preimage::{integer, Event, PreimageError, RealSet, ResourceLimits, Symbol, Transform};

fuzz_target!(|data: &[u8]| {
    let mut t = Transform::identity(Symbol::new("x"));
    for byte in data.iter().take(64) {
        t = match byte % 6 {
            0 => Transform::abs(t),
            1 => Transform::pow(t, integer(3)).unwrap(),
            2 => Transform::pow(t, integer(-1)).unwrap(),
            3 => Transform::exp(t, 2).unwrap(),
            4 => Transform::log(t, 2).unwrap(),
            _ => Transform::poly(t, vec![integer(1), integer(-2)]).unwrap(),
        };
    }
    let Ok(target) = RealSet::closed(-1, 1) else {
        return;
    };
    match t.solve_with_limits(&target, &ResourceLimits::default()) {
        Ok(_) | Err(PreimageError::ResourceExhausted(_)) => {}
        Err(err) => panic!("{} failed on [-1, 1]: {}", t, err),
    }

    let mut event = Event::interval(t, target);
    for _ in 0..data.len().min(4096) {
        event = Event::not_of(event);
    }
    let _ = event.simplify(64).solve();
});
