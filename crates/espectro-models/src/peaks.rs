//! Peak detection and parabolic refinement on magnitude spectra.

use espectro_core::math::interp;

/// A spectral peak refined to a fractional bin location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Fractional bin location.
    pub loc: f64,
    /// Interpolated magnitude in dB.
    pub mag: f64,
    /// Interpolated phase in radians.
    pub phase: f64,
}

/// Find strict local maxima of a magnitude spectrum above `threshold_db`.
///
/// Boundary bins never qualify. Returns bin indices in ascending order; an
/// empty result is normal for silent or noisy frames.
pub fn find_peaks(mag_db: &[f64], threshold_db: f64) -> Vec<usize> {
    if mag_db.len() < 3 {
        return Vec::new();
    }
    (1..mag_db.len() - 1)
        .filter(|&i| {
            mag_db[i] > threshold_db && mag_db[i] > mag_db[i - 1] && mag_db[i] > mag_db[i + 1]
        })
        .collect()
}

/// Refine detected peaks by parabolic interpolation over the peak bin and
/// its two neighbors.
///
/// The fractional offset is `0.5 * (l - r) / (l - 2c + r)`; the magnitude is
/// the parabola's apex; the phase is interpolated linearly between the bins
/// surrounding the refined location. A degenerate parabola (flat triple,
/// zero denominator) falls back to the integer bin values instead of
/// producing NaN.
pub fn interpolate_peaks(mag_db: &[f64], phase: &[f64], peak_bins: &[usize]) -> Vec<Peak> {
    let bin_axis: Vec<f64> = (0..phase.len()).map(|i| i as f64).collect();
    peak_bins
        .iter()
        .map(|&i| {
            let c = mag_db[i];
            let l = mag_db[i - 1];
            let r = mag_db[i + 1];
            let denom = l - 2.0 * c + r;
            let (loc, mag) = if denom == 0.0 {
                (i as f64, c)
            } else {
                let delta = 0.5 * (l - r) / denom;
                (i as f64 + delta, c - 0.25 * (l - r) * delta)
            };
            Peak {
                loc,
                mag,
                phase: interp(loc, &bin_axis, phase),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_isolated_maximum() {
        let mag = vec![-80.0, -40.0, -10.0, -40.0, -80.0];
        assert_eq!(find_peaks(&mag, -60.0), vec![2]);
    }

    #[test]
    fn threshold_excludes_quiet_peaks() {
        let mag = vec![-80.0, -70.0, -80.0, -20.0, -80.0];
        assert_eq!(find_peaks(&mag, -60.0), vec![3]);
        assert_eq!(find_peaks(&mag, -90.0), vec![1, 3]);
    }

    #[test]
    fn plateaus_and_boundaries_are_not_peaks() {
        // equal neighbors fail the strict comparison
        let mag = vec![-10.0, -10.0, -10.0, -10.0];
        assert!(find_peaks(&mag, -60.0).is_empty());
        // a maximum at the first or last bin is ignored
        let mag = vec![0.0, -10.0, -20.0, -5.0];
        assert!(find_peaks(&mag, -60.0).is_empty());
    }

    #[test]
    fn empty_peak_list_interpolates_to_empty() {
        let peaks = interpolate_peaks(&[-80.0, -10.0, -80.0], &[0.0, 0.0, 0.0], &[]);
        assert!(peaks.is_empty());
    }

    #[test]
    fn symmetric_peak_stays_on_bin() {
        let mag = vec![-40.0, -10.0, -40.0];
        let phase = vec![0.1, 0.2, 0.3];
        let peaks = interpolate_peaks(&mag, &phase, &[1]);
        assert_eq!(peaks.len(), 1);
        assert!((peaks[0].loc - 1.0).abs() < 1e-12);
        assert!((peaks[0].mag - (-10.0)).abs() < 1e-12);
        assert!((peaks[0].phase - 0.2).abs() < 1e-12);
    }

    #[test]
    fn skewed_peak_moves_toward_larger_neighbor() {
        // larger right neighbor pulls the refined location right of the bin
        let mag = vec![-40.0, -10.0, -20.0];
        let phase = vec![0.0, 0.0, 1.0];
        let peaks = interpolate_peaks(&mag, &phase, &[1]);
        assert!(peaks[0].loc > 1.0 && peaks[0].loc < 2.0, "loc {}", peaks[0].loc);
        assert!(peaks[0].mag >= -10.0);
        // phase follows the location into the right interval
        assert!(peaks[0].phase > 0.0 && peaks[0].phase < 1.0);
    }

    #[test]
    fn degenerate_parabola_falls_back_to_bin() {
        // collinear triple: l - 2c + r == 0, which find_peaks can never
        // produce but a caller-supplied bin list can
        let mag = vec![-20.0, -15.0, -10.0];
        let peaks = interpolate_peaks(&mag, &[0.0, 0.0, 0.0], &[1]);
        assert_eq!(peaks[0].loc, 1.0);
        assert_eq!(peaks[0].mag, -15.0);
    }
}
