//! Small numeric helpers shared by the analysis and synthesis models.

use std::f64::consts::PI;

/// Check whether `num` is a power of two (zero is not).
pub fn is_power_of_two(num: usize) -> bool {
    num != 0 && (num & (num - 1)) == 0
}

/// Convert an amplitude ratio to decibels.
pub fn amplitude_to_db(amp: f64) -> f64 {
    20.0 * amp.max(f64::EPSILON).log10()
}

/// Convert decibels to an amplitude ratio.
pub fn db_to_amplitude(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Root mean square error between two equally long signals.
pub fn rmse(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len(), "rmse inputs must have equal length");
    if x.is_empty() {
        return 0.0;
    }
    let sum: f64 = x.iter().zip(y).map(|(a, b)| (a - b) * (a - b)).sum();
    (sum / x.len() as f64).sqrt()
}

/// Piecewise-linear interpolation of `fp` over sample points `xp` at `x`.
///
/// `xp` must be sorted ascending. Values of `x` outside `xp` clamp to the
/// first/last `fp` value, matching numpy's `interp`.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    debug_assert_eq!(xp.len(), fp.len());
    if xp.is_empty() {
        return 0.0;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[xp.len() - 1] {
        return fp[fp.len() - 1];
    }
    // first sample point strictly above x
    let hi = xp.partition_point(|&p| p <= x);
    let lo = hi - 1;
    let span = xp[hi] - xp[lo];
    if span == 0.0 {
        return fp[lo];
    }
    fp[lo] + (fp[hi] - fp[lo]) * (x - xp[lo]) / span
}

/// Unwrap a phase spectrum in place so consecutive bins never jump by more
/// than pi.
pub fn unwrap_phase(phase: &mut [f64]) {
    let mut offset = 0.0;
    for i in 1..phase.len() {
        let diff = phase[i] + offset - phase[i - 1];
        if diff > PI {
            offset -= 2.0 * PI * ((diff + PI) / (2.0 * PI)).floor();
        } else if diff < -PI {
            offset += 2.0 * PI * ((-diff + PI) / (2.0 * PI)).floor();
        }
        phase[i] += offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_of_two_detection() {
        assert!(is_power_of_two(1));
        assert!(is_power_of_two(1024));
        assert!(!is_power_of_two(0));
        assert!(!is_power_of_two(1000));
    }

    #[test]
    fn db_roundtrip() {
        for amp in [1.0, 0.5, 1e-3] {
            let db = amplitude_to_db(amp);
            assert!((db_to_amplitude(db) - amp).abs() < 1e-12);
        }
        // floor keeps silence finite
        assert!(amplitude_to_db(0.0).is_finite());
    }

    #[test]
    fn rmse_of_identical_signals_is_zero() {
        let x = vec![0.1, -0.2, 0.3];
        assert_eq!(rmse(&x, &x), 0.0);
    }

    #[test]
    fn rmse_of_constant_offset() {
        let x = vec![0.0; 10];
        let y = vec![2.0; 10];
        assert!((rmse(&x, &y) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn interp_midpoints_and_clamping() {
        let xp = [0.0, 1.0, 2.0];
        let fp = [0.0, 10.0, 0.0];
        assert_eq!(interp(0.5, &xp, &fp), 5.0);
        assert_eq!(interp(1.5, &xp, &fp), 5.0);
        assert_eq!(interp(-1.0, &xp, &fp), 0.0);
        assert_eq!(interp(5.0, &xp, &fp), 0.0);
    }

    #[test]
    fn unwrap_removes_two_pi_jumps() {
        let mut phase = vec![0.0, 3.0, 3.0 - 2.0 * PI + 0.2, 3.0 + 0.4 - 2.0 * PI];
        unwrap_phase(&mut phase);
        for pair in phase.windows(2) {
            assert!((pair[1] - pair[0]).abs() <= PI + 1e-12);
        }
        assert!((phase[2] - 3.2).abs() < 1e-12);
    }
}
