//! Harmonic model: f0 estimation by two-way mismatch and harmonic selection.
//!
//! Unlike the general sinusoidal tracker, harmonics are anchored to an
//! estimated fundamental: column k of the output table always holds the
//! k-th harmonic. Continuity across frames comes from the narrow
//! per-harmonic search window, not from greedy assignment.

use crate::dft::Dft;
use crate::error::{ModelError, Result};
use crate::frames::Framer;
use crate::peaks::{find_peaks, interpolate_peaks};
use crate::sine::{clean_sinusoid_tracks, SineTracks};

// Two-way mismatch weights from Beauchamp and Maher.
const TWM_P: f64 = 0.5;
const TWM_Q: f64 = 1.4;
const TWM_R: f64 = 0.5;
const TWM_RHO: f64 = 0.33;
const TWM_MAX_PEAKS: usize = 10;

/// Tunables for harmonic analysis.
#[derive(Debug, Clone, Copy)]
pub struct HarmonicParams {
    /// Number of harmonics to extract (table width).
    pub n_harmonics: usize,
    /// Lower bound of the f0 search range in Hz.
    pub min_f0: f64,
    /// Upper bound of the f0 search range in Hz. Must stay below 10 kHz.
    pub max_f0: f64,
    /// Maximum acceptable two-way mismatch error for a voiced frame.
    pub f0_error_max: f64,
    /// Growth of the per-harmonic search window per Hz of peak frequency.
    pub harm_dev_slope: f64,
    /// Minimum harmonic track duration in seconds.
    pub min_sine_dur: f64,
}

impl Default for HarmonicParams {
    fn default() -> Self {
        Self {
            n_harmonics: 100,
            min_f0: 130.0,
            max_f0: 3000.0,
            f0_error_max: 7.0,
            harm_dev_slope: 0.01,
            min_sine_dur: 0.02,
        }
    }
}

/// Score f0 candidates by two-way mismatch against the detected peaks.
///
/// Each candidate's predicted harmonic series is matched against the
/// measured peaks (predicted-to-measured) and the peaks against the
/// nearest harmonic of the candidate (measured-to-predicted); both
/// directions penalize frequency mismatch and reward amplitude. Returns
/// the best candidate and its error, or `None` when either list is empty.
pub fn two_way_mismatch(pfreq: &[f64], pmag: &[f64], candidates: &[f64]) -> Option<(f64, f64)> {
    if pfreq.is_empty() || candidates.is_empty() {
        return None;
    }
    let a_max = pmag.iter().fold(f64::MIN, |a, &b| a.max(b));
    let max_np = TWM_MAX_PEAKS.min(pfreq.len());

    let mut best: Option<(f64, f64)> = None;
    for &f0c in candidates {
        // predicted to measured: each harmonic finds its nearest peak
        let mut error_pm = 0.0;
        for h in 1..=max_np {
            let predicted = f0c * h as f64;
            let mut dist = f64::MAX;
            let mut nearest = 0;
            for (j, &pf) in pfreq.iter().enumerate() {
                let d = (predicted - pf).abs();
                if d < dist {
                    dist = d;
                    nearest = j;
                }
            }
            let ponddif = dist * predicted.powf(-TWM_P);
            let mag_factor = 10f64.powf((pmag[nearest] - a_max) / 20.0);
            error_pm += ponddif + mag_factor * (TWM_Q * ponddif - TWM_R);
        }

        // measured to predicted: each peak finds its nearest harmonic
        let mut error_mp = 0.0;
        for j in 0..max_np {
            let nharm = (pfreq[j] / f0c).round().max(1.0);
            let dist = (pfreq[j] - nharm * f0c).abs();
            let ponddif = dist * pfreq[j].powf(-TWM_P);
            let mag_factor = 10f64.powf((pmag[j] - a_max) / 20.0);
            error_mp += mag_factor * (ponddif + mag_factor * (TWM_Q * ponddif - TWM_R));
        }

        let error = error_pm / max_np as f64 + TWM_RHO * error_mp / max_np as f64;
        if best.is_none_or(|(_, e)| error < e) {
            best = Some((f0c, error));
        }
    }
    best
}

/// Estimate the fundamental frequency of one frame's peaks.
///
/// Candidates are the peaks inside `(min_f0, max_f0)`. When a stable f0
/// from previous frames is supplied (`f0_stable > 0`), candidates narrow
/// to those within half of it; the loudest candidate is re-admitted when
/// it sits more than a quarter of `f0_stable` away from any multiple of
/// it, so an octave change can still break a stale lock. Returns 0 for
/// an unvoiced frame.
pub fn estimate_f0(
    pfreq: &[f64],
    pmag: &[f64],
    f0_error_max: f64,
    min_f0: f64,
    max_f0: f64,
    f0_stable: f64,
) -> f64 {
    if pfreq.len() < 3 && f0_stable == 0.0 {
        return 0.0;
    }
    let candidates: Vec<usize> = (0..pfreq.len())
        .filter(|&i| pfreq[i] > min_f0 && pfreq[i] < max_f0)
        .collect();
    if candidates.is_empty() {
        return 0.0;
    }

    let mut cand_freq: Vec<f64> = candidates.iter().map(|&i| pfreq[i]).collect();
    if f0_stable > 0.0 {
        let mut shortlist: Vec<usize> = (0..cand_freq.len())
            .filter(|&i| (cand_freq[i] - f0_stable).abs() < f0_stable / 2.0)
            .collect();
        let loudest = (0..candidates.len())
            .max_by(|&a, &b| {
                pmag[candidates[a]]
                    .partial_cmp(&pmag[candidates[b]])
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(0);
        let mut off_multiple = cand_freq[loudest] % f0_stable;
        if off_multiple > f0_stable / 2.0 {
            off_multiple = f0_stable - off_multiple;
        }
        if !shortlist.contains(&loudest) && off_multiple > f0_stable / 4.0 {
            shortlist.insert(0, loudest);
        }
        cand_freq = shortlist.iter().map(|&i| cand_freq[i]).collect();
    }

    match two_way_mismatch(pfreq, pmag, &cand_freq) {
        Some((f0, error)) if f0 > 0.0 && error < f0_error_max => f0,
        _ => 0.0,
    }
}

/// Select one frame's harmonics from its interpolated peaks.
///
/// For harmonic k below the Nyquist frequency, the nearest peak to
/// `k * f0` is accepted when it deviates less than
/// `f0/3 + harm_dev_slope * peak_freq` from either the predicted
/// frequency or that harmonic's frequency in the previous frame
/// (`prev_hfreq`, empty on the first voiced frame). Absent harmonics are
/// written as 0 frequency and 0 magnitude.
pub fn detect_harmonics(
    pfreq: &[f64],
    pmag: &[f64],
    pphase: &[f64],
    f0: f64,
    n_harmonics: usize,
    prev_hfreq: &[f64],
    fs: f64,
    harm_dev_slope: f64,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut hfreq = vec![0.0; n_harmonics];
    let mut hmag = vec![0.0; n_harmonics];
    let mut hphase = vec![0.0; n_harmonics];
    if f0 <= 0.0 || pfreq.is_empty() {
        return (hfreq, hmag, hphase);
    }

    for hi in 0..n_harmonics {
        let predicted = f0 * (hi + 1) as f64;
        if predicted >= fs / 2.0 {
            break;
        }
        let mut pei = 0;
        let mut dist = f64::MAX;
        for (j, &pf) in pfreq.iter().enumerate() {
            let d = (pf - predicted).abs();
            if d < dist {
                dist = d;
                pei = j;
            }
        }
        let dev_predicted = (pfreq[pei] - predicted).abs();
        let dev_previous = match prev_hfreq.get(hi) {
            Some(&prev) if prev > 0.0 => (pfreq[pei] - prev).abs(),
            _ => fs,
        };
        let threshold = f0 / 3.0 + harm_dev_slope * pfreq[pei];
        if dev_predicted < threshold || dev_previous < threshold {
            hfreq[hi] = pfreq[pei];
            hmag[hi] = pmag[pei];
            hphase[hi] = pphase[pei];
        }
    }
    (hfreq, hmag, hphase)
}

/// Analyze a sound with the harmonic model.
///
/// Returns a track table whose column k holds harmonic k+1. Frames where
/// no acceptable f0 is found are all-zero rows (unvoiced).
pub fn from_audio(
    x: &[f64],
    fs: f64,
    window: &[f64],
    n: usize,
    hop: usize,
    threshold_db: f64,
    params: &HarmonicParams,
) -> Result<SineTracks> {
    if params.min_f0 < 0.0 {
        return Err(ModelError::InvalidParameter {
            param: "min_f0",
            value: params.min_f0,
            reason: "minimum fundamental frequency must be non-negative",
        });
    }
    if params.max_f0 >= 10000.0 {
        return Err(ModelError::InvalidParameter {
            param: "max_f0",
            value: params.max_f0,
            reason: "maximum fundamental frequency must be below 10 kHz",
        });
    }
    if params.min_sine_dur < 0.0 {
        return Err(ModelError::InvalidParameter {
            param: "min_sine_dur",
            value: params.min_sine_dur,
            reason: "minimum harmonic track duration must be non-negative",
        });
    }
    if hop == 0 {
        return Err(ModelError::InvalidHop(hop));
    }
    if window.len() % 2 == 0 {
        return Err(ModelError::WindowNotOdd(window.len()));
    }

    let dft = Dft::new(n)?;
    let framer = Framer::new(x, window.len(), hop);

    let mut tracks = SineTracks::default();
    let mut prev_hfreq: Vec<f64> = Vec::new();
    let mut f0_stable = 0.0;

    for l in 0..framer.num_frames() {
        let (mx, px) = dft.analyze(framer.frame(l), window)?;
        let bins = find_peaks(&mx, threshold_db);
        let peaks = interpolate_peaks(&mx, &px, &bins);

        let pfreq: Vec<f64> = peaks.iter().map(|p| fs * p.loc / n as f64).collect();
        let pmag: Vec<f64> = peaks.iter().map(|p| p.mag).collect();
        let pphase: Vec<f64> = peaks.iter().map(|p| p.phase).collect();

        let f0 = estimate_f0(
            &pfreq,
            &pmag,
            params.f0_error_max,
            params.min_f0,
            params.max_f0,
            f0_stable,
        );
        // the stable f0 tracks slow drift; a jump resets it
        if (f0_stable == 0.0 && f0 > 0.0)
            || (f0_stable > 0.0 && (f0_stable - f0).abs() < f0_stable / 5.0)
        {
            f0_stable = f0;
        } else {
            f0_stable = 0.0;
        }

        let (hfreq, hmag, hphase) = detect_harmonics(
            &pfreq,
            &pmag,
            &pphase,
            f0,
            params.n_harmonics,
            &prev_hfreq,
            fs,
            params.harm_dev_slope,
        );
        prev_hfreq.clone_from(&hfreq);
        tracks.freq.push(hfreq);
        tracks.mag.push(hmag);
        tracks.phase.push(hphase);
    }

    let min_frames = (fs * params.min_sine_dur / hop as f64).round() as usize;
    tracks.freq = clean_sinusoid_tracks(tracks.freq, min_frames);
    Ok(tracks)
}
