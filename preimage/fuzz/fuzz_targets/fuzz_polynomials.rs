#![no_main]

use libfuzzer_sys::fuzz_target;
use preimage::{polynomial, rational, Interval, Bound, Real, ResourceLimits};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let (ends, coeffs) = data.split_at(2);
    let coeffs: Vec<_> = coeffs
        .iter()
        .take(8)
        .map(|&c| rational(c as i8 as i64, 3))
        .collect();
    let lo = ends[0] as i8 as i64;
    let hi = lo + (ends[1] % 16) as i64;
    let Ok(interval) = Interval::new(
        Bound::Inclusive(Real::from(lo)),
        Bound::Exclusive(Real::from(hi)),
    ) else {
        return;
    };
    let limits = ResourceLimits {
        max_isolation_steps: 2_000,
        ..ResourceLimits::default()
    };
    if let Ok(solved) = polynomial::solve_with_limits(&coeffs, &interval, &limits) {
        for piece in &solved {
            if let (Some(a), Some(b)) = (piece.lower().finite(), piece.upper().finite()) {
                if let Some(mid) = a.rational_between(b) {
                    let value = Real::poly_value(&coeffs, &Real::from_rational(mid));
                    assert!(interval.contains(&value));
                }
            }
        }
    }
});
