//! Sinusoidal model: partial tracking analysis and spectral resynthesis.
//!
//! Analysis detects and interpolates spectral peaks per frame, then links
//! them across frames into continuous partial trajectories: the loudest
//! peaks claim the nearest active track within a frequency-dependent
//! tolerance (continuation), unclaimed peaks open new track slots (birth),
//! and unmatched tracks go dormant (death, frequency 0). A final cleaning
//! pass removes trajectory fragments too short to be real partials.

use std::cmp::Ordering;

use espectro_core::math::interp;

use crate::dft::Dft;
use crate::error::{ModelError, Result};
use crate::frames::Framer;
use crate::peaks::{find_peaks, interpolate_peaks};
use crate::synth;

/// Sinusoidal track table: rows are frames, columns are track slots.
///
/// A cell with frequency 0 means the track is absent in that frame. Column
/// identity is assignment-derived: it persists across frames by continuity,
/// not by spectrum bin. All rows have the same width.
#[derive(Debug, Clone, Default)]
pub struct SineTracks {
    /// Frequencies in Hz, `[frame][slot]`.
    pub freq: Vec<Vec<f64>>,
    /// Magnitudes in dB, `[frame][slot]`.
    pub mag: Vec<Vec<f64>>,
    /// Phases in radians, `[frame][slot]`. May be empty (no rows), in which
    /// case synthesis propagates phase from frame to frame.
    pub phase: Vec<Vec<f64>>,
}

impl SineTracks {
    /// Number of frames (rows).
    pub fn num_frames(&self) -> usize {
        self.freq.len()
    }

    /// Number of track slots (row width).
    pub fn num_tracks(&self) -> usize {
        self.freq.first().map_or(0, Vec::len)
    }
}

/// Tunables for sinusoidal analysis.
#[derive(Debug, Clone, Copy)]
pub struct SineParams {
    /// Maximum simultaneous tracks per frame.
    pub max_sines: usize,
    /// Minimum track duration in seconds; shorter fragments are cleaned out.
    pub min_sine_dur: f64,
    /// Allowed frame-to-frame frequency deviation at 0 Hz.
    pub freq_dev_offset: f64,
    /// Growth of the allowed deviation per Hz of peak frequency.
    pub freq_dev_slope: f64,
}

impl Default for SineParams {
    fn default() -> Self {
        Self {
            max_sines: 100,
            min_sine_dur: 0.01,
            freq_dev_offset: 20.0,
            freq_dev_slope: 0.01,
        }
    }
}

/// Analyze a sound with the sinusoidal model.
///
/// `window` must have odd length M <= `n`; frames advance by `hop` samples;
/// peaks below `threshold_db` are ignored.
pub fn from_audio(
    x: &[f64],
    fs: f64,
    window: &[f64],
    n: usize,
    hop: usize,
    threshold_db: f64,
    params: &SineParams,
) -> Result<SineTracks> {
    if params.min_sine_dur < 0.0 {
        return Err(ModelError::InvalidParameter {
            param: "min_sine_dur",
            value: params.min_sine_dur,
            reason: "minimum sine track duration must be non-negative",
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
    let mut prev_freq: Vec<f64> = Vec::new();

    for l in 0..framer.num_frames() {
        let (mx, px) = dft.analyze(framer.frame(l), window)?;
        let bins = find_peaks(&mx, threshold_db);
        let peaks = interpolate_peaks(&mx, &px, &bins);

        let pfreq: Vec<f64> = peaks.iter().map(|p| fs * p.loc / n as f64).collect();
        let pmag: Vec<f64> = peaks.iter().map(|p| p.mag).collect();
        let pphase: Vec<f64> = peaks.iter().map(|p| p.phase).collect();

        let (mut tf, mut tm, mut tp) = track_partials(
            &pfreq,
            &pmag,
            &pphase,
            &prev_freq,
            params.freq_dev_offset,
            params.freq_dev_slope,
        );
        tf.truncate(params.max_sines);
        tm.truncate(params.max_sines);
        tp.truncate(params.max_sines);
        prev_freq.clone_from(&tf);

        // rows have fixed width max_sines; unused slots stay at 0
        let mut row_f = vec![0.0; params.max_sines];
        let mut row_m = vec![0.0; params.max_sines];
        let mut row_p = vec![0.0; params.max_sines];
        row_f[..tf.len()].copy_from_slice(&tf);
        row_m[..tm.len()].copy_from_slice(&tm);
        row_p[..tp.len()].copy_from_slice(&tp);
        tracks.freq.push(row_f);
        tracks.mag.push(row_m);
        tracks.phase.push(row_p);
    }

    let min_frames = (fs * params.min_sine_dur / hop as f64).round() as usize;
    tracks.freq = clean_sinusoid_tracks(tracks.freq, min_frames);
    Ok(tracks)
}

/// Synthesize a sound from sinusoidal tracks. See
/// [`synth::synthesize_sinusoids`].
pub fn to_audio(tracks: &SineTracks, n: usize, hop: usize, fs: f64) -> Result<Vec<f64>> {
    synth::synthesize_sinusoids(tracks, n, hop, fs)
}

/// Assign one frame's peaks to the previous frame's tracks.
///
/// Greedy continuation in descending peak-magnitude order (ties broken by
/// ascending peak index): each peak claims the closest unclaimed active
/// track if their frequency distance is below
/// `freq_dev_offset + freq_dev_slope * peak_freq`. Peaks left over are
/// births: they fill dormant slots in slot order, again loudest first, and
/// grow the row if all slots are taken. Unmatched active tracks output 0.
///
/// Returns (frequencies, magnitudes, phases) at least as wide as
/// `prev_freq`. Deterministic for identical inputs.
pub fn track_partials(
    pfreq: &[f64],
    pmag: &[f64],
    pphase: &[f64],
    prev_freq: &[f64],
    freq_dev_offset: f64,
    freq_dev_slope: f64,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let slots = prev_freq.len();
    let mut out_f = vec![0.0; slots];
    let mut out_m = vec![0.0; slots];
    let mut out_p = vec![0.0; slots];

    let mut peak_claimed = vec![false; pfreq.len()];
    let mut track_claimed = vec![false; slots];

    // current peaks in descending magnitude order
    let mut mag_order: Vec<usize> = (0..pfreq.len()).filter(|&i| pfreq[i] != 0.0).collect();
    mag_order.sort_by(|&a, &b| {
        pmag[b]
            .partial_cmp(&pmag[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let incoming: Vec<usize> = (0..slots).filter(|&t| prev_freq[t] != 0.0).collect();
    let mut incoming_left = incoming.len();

    // continuation
    for &i in &mag_order {
        if incoming_left == 0 {
            break;
        }
        let nearest = incoming
            .iter()
            .copied()
            .filter(|&t| !track_claimed[t])
            .min_by(|&a, &b| {
                let da = (pfreq[i] - prev_freq[a]).abs();
                let db = (pfreq[i] - prev_freq[b]).abs();
                da.partial_cmp(&db).unwrap_or(Ordering::Equal)
            });
        if let Some(t) = nearest {
            let distance = (pfreq[i] - prev_freq[t]).abs();
            if distance < freq_dev_offset + freq_dev_slope * pfreq[i] {
                out_f[t] = pfreq[i];
                out_m[t] = pmag[i];
                out_p[t] = pphase[i];
                track_claimed[t] = true;
                peak_claimed[i] = true;
                incoming_left -= 1;
            }
        }
    }

    // birth: leftover peaks fill dormant slots, loudest first
    let empty_slots: Vec<usize> = (0..slots).filter(|&t| prev_freq[t] == 0.0).collect();
    let mut left: Vec<usize> = (0..pfreq.len()).filter(|&i| !peak_claimed[i]).collect();
    left.sort_by(|&a, &b| {
        pmag[b]
            .partial_cmp(&pmag[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    for (k, &i) in left.iter().enumerate() {
        if let Some(&t) = empty_slots.get(k) {
            out_f[t] = pfreq[i];
            out_m[t] = pmag[i];
            out_p[t] = pphase[i];
        } else {
            out_f.push(pfreq[i]);
            out_m.push(pmag[i]);
            out_p.push(pphase[i]);
        }
    }

    (out_f, out_m, out_p)
}

/// Zero out track fragments of `min_frames` frames or fewer.
///
/// For each column, maximal contiguous runs of positive frequency are
/// located; runs no longer than `min_frames` are considered noise and set
/// to 0. Only the frequency table is modified; synthesis keys on frequency,
/// so magnitudes and phases of pruned cells are ignored downstream.
pub fn clean_sinusoid_tracks(mut freq: Vec<Vec<f64>>, min_frames: usize) -> Vec<Vec<f64>> {
    let num_frames = freq.len();
    if num_frames == 0 || freq[0].is_empty() {
        return freq;
    }
    let num_tracks = freq[0].len();

    for t in 0..num_tracks {
        let mut l = 0;
        while l < num_frames {
            if freq[l][t] > 0.0 {
                let start = l;
                while l < num_frames && freq[l][t] > 0.0 {
                    l += 1;
                }
                if l - start <= min_frames {
                    for row in freq.iter_mut().take(l).skip(start) {
                        row[t] = 0.0;
                    }
                }
            } else {
                l += 1;
            }
        }
    }
    freq
}

/// Time scaling of sinusoidal tracks.
///
/// `time_scaling` is a flat list of (input time, output time) pairs with
/// ascending times; frames are remapped by linear interpolation, nearest
/// input frame per output frame. Phases are dropped (resynthesis
/// propagates them).
pub fn scale_time(tracks: &SineTracks, time_scaling: &[f64]) -> Result<SineTracks> {
    let indices = time_scale_indices(tracks.num_frames(), time_scaling)?;
    let mut scaled = SineTracks::default();
    for src in indices {
        scaled.freq.push(tracks.freq[src].clone());
        scaled.mag.push(tracks.mag[src].clone());
    }
    Ok(scaled)
}

/// Map output frame numbers to source frame numbers for time scaling.
pub(crate) fn time_scale_indices(frames: usize, time_scaling: &[f64]) -> Result<Vec<usize>> {
    if time_scaling.is_empty() || time_scaling.len() % 2 != 0 {
        return Err(ModelError::InvalidParameter {
            param: "time_scaling",
            value: time_scaling.len() as f64,
            reason: "expected a non-empty flat list of (input, output) time pairs",
        });
    }
    if frames == 0 {
        return Ok(Vec::new());
    }

    let in_times: Vec<f64> = time_scaling.iter().step_by(2).copied().collect();
    let out_times: Vec<f64> = time_scaling.iter().skip(1).step_by(2).copied().collect();
    let max_in = in_times.iter().fold(f64::MIN, |a, &b| a.max(b));
    let max_out = out_times.iter().fold(f64::MIN, |a, &b| a.max(b));
    if max_in <= 0.0 || max_out <= 0.0 {
        return Err(ModelError::InvalidParameter {
            param: "time_scaling",
            value: max_in.min(max_out),
            reason: "scaling times must reach a positive maximum",
        });
    }

    let out_frames = (frames as f64 * max_out / max_in) as usize;
    let in_axis: Vec<f64> = in_times
        .iter()
        .map(|&v| (frames - 1) as f64 * v / max_in)
        .collect();
    let out_axis: Vec<f64> = out_times
        .iter()
        .map(|&v| out_frames as f64 * v / max_out)
        .collect();

    Ok((0..out_frames)
        .map(|l| {
            let src = interp(l as f64, &out_axis, &in_axis).round() as usize;
            src.min(frames - 1)
        })
        .collect())
}

/// Frequency scaling of sinusoidal tracks.
///
/// `freq_scaling` is a flat list of (time, factor) pairs; 1 means no
/// scaling. The factor envelope is interpolated per frame and applied to
/// every non-zero track frequency.
pub fn scale_frequencies(tracks: &SineTracks, freq_scaling: &[f64]) -> Result<SineTracks> {
    if freq_scaling.is_empty() || freq_scaling.len() % 2 != 0 {
        return Err(ModelError::InvalidParameter {
            param: "freq_scaling",
            value: freq_scaling.len() as f64,
            reason: "expected a non-empty flat list of (time, factor) pairs",
        });
    }
    let frames = tracks.num_frames();
    if frames == 0 {
        return Ok(SineTracks::default());
    }

    let last_time = freq_scaling[freq_scaling.len() - 2];
    if last_time <= 0.0 {
        return Err(ModelError::InvalidParameter {
            param: "freq_scaling",
            value: last_time,
            reason: "the last control time must be positive",
        });
    }
    let times: Vec<f64> = freq_scaling
        .iter()
        .step_by(2)
        .map(|&v| frames as f64 * v / last_time)
        .collect();
    let factors: Vec<f64> = freq_scaling.iter().skip(1).step_by(2).copied().collect();

    let mut scaled = tracks.clone();
    scaled.phase = Vec::new();
    for (l, row) in scaled.freq.iter_mut().enumerate() {
        let factor = interp(l as f64, &times, &factors);
        for f in row.iter_mut() {
            if *f != 0.0 {
                *f *= factor;
            }
        }
    }
    Ok(scaled)
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- tracker ---

    #[test]
    fn first_frame_births_all_peaks_loudest_first() {
        let (f, m, _) = track_partials(
            &[100.0, 200.0, 300.0],
            &[-30.0, -10.0, -20.0],
            &[0.0; 3],
            &[],
            20.0,
            0.01,
        );
        // appended in magnitude order
        assert_eq!(f, vec![200.0, 300.0, 100.0]);
        assert_eq!(m, vec![-10.0, -20.0, -30.0]);
    }

    #[test]
    fn continuation_follows_nearest_track_within_tolerance() {
        let prev = vec![100.0, 400.0];
        let (f, _, _) = track_partials(&[105.0, 395.0], &[-10.0, -12.0], &[0.0; 2], &prev, 20.0, 0.01);
        assert_eq!(f, vec![105.0, 395.0]);
    }

    #[test]
    fn peak_outside_tolerance_births_new_slot() {
        let prev = vec![100.0];
        // 600 Hz is way off the only active track
        let (f, _, _) = track_partials(&[600.0], &[-10.0], &[0.0], &prev, 20.0, 0.01);
        assert_eq!(f.len(), 2);
        assert_eq!(f[0], 0.0, "old track must go dormant");
        assert_eq!(f[1], 600.0);
    }

    #[test]
    fn dormant_slot_is_reused_for_birth() {
        let prev = vec![0.0, 300.0];
        let (f, _, _) = track_partials(&[299.0, 1000.0], &[-10.0, -5.0], &[0.0; 2], &prev, 20.0, 0.01);
        // 299 continues slot 1; 1000 births into the dormant slot 0
        assert_eq!(f, vec![1000.0, 299.0]);
    }

    #[test]
    fn loudest_peak_gets_first_choice() {
        // both peaks are nearest to the same single track; the louder wins
        let prev = vec![200.0];
        let (f, m, _) = track_partials(
            &[195.0, 205.0],
            &[-20.0, -6.0],
            &[0.0; 2],
            &prev,
            20.0,
            0.01,
        );
        assert_eq!(f[0], 205.0);
        assert_eq!(m[0], -6.0);
        // the quieter peak births a new slot
        assert_eq!(f[1], 195.0);
    }

    #[test]
    fn tracker_is_deterministic_under_ties() {
        let prev = vec![200.0];
        // identical magnitudes: ascending index breaks the tie
        let a = track_partials(&[195.0, 205.0], &[-6.0, -6.0], &[0.1, 0.2], &prev, 20.0, 0.01);
        let b = track_partials(&[195.0, 205.0], &[-6.0, -6.0], &[0.1, 0.2], &prev, 20.0, 0.01);
        assert_eq!(a, b);
        assert_eq!(a.0[0], 195.0, "lower index wins a magnitude tie");
    }

    // --- cleaning ---

    fn column(table: &[Vec<f64>], t: usize) -> Vec<f64> {
        table.iter().map(|row| row[t]).collect()
    }

    #[test]
    fn short_runs_are_zeroed_long_runs_survive() {
        // column 0: run of 2, then run of 4
        let freq = vec![
            vec![100.0],
            vec![100.0],
            vec![0.0],
            vec![100.0],
            vec![100.0],
            vec![100.0],
            vec![100.0],
        ];
        let cleaned = clean_sinusoid_tracks(freq, 2);
        assert_eq!(column(&cleaned, 0), vec![0.0, 0.0, 0.0, 100.0, 100.0, 100.0, 100.0]);
    }

    #[test]
    fn run_at_table_edges_is_measured_correctly() {
        let freq = vec![vec![50.0], vec![50.0], vec![50.0], vec![0.0], vec![50.0]];
        // min 1: the trailing single-frame run dies, the leading run of 3 lives
        let cleaned = clean_sinusoid_tracks(freq, 1);
        assert_eq!(column(&cleaned, 0), vec![50.0, 50.0, 50.0, 0.0, 0.0]);
    }

    #[test]
    fn cleaning_empty_table_is_a_noop() {
        let cleaned = clean_sinusoid_tracks(Vec::new(), 3);
        assert!(cleaned.is_empty());
    }

    // --- parameter validation ---

    #[test]
    fn negative_min_duration_is_rejected() {
        let params = SineParams {
            min_sine_dur: -0.1,
            ..SineParams::default()
        };
        let window = vec![1.0; 255];
        let err = from_audio(&[0.0; 1000], 44100.0, &window, 512, 128, -80.0, &params);
        assert!(matches!(
            err,
            Err(ModelError::InvalidParameter {
                param: "min_sine_dur",
                ..
            })
        ));
    }

    #[test]
    fn even_window_is_rejected() {
        let window = vec![1.0; 256];
        let err = from_audio(
            &[0.0; 1000],
            44100.0,
            &window,
            512,
            128,
            -80.0,
            &SineParams::default(),
        );
        assert!(matches!(err, Err(ModelError::WindowNotOdd(256))));
    }

    // --- transformations ---

    fn two_frame_tracks() -> SineTracks {
        SineTracks {
            freq: vec![vec![100.0, 0.0], vec![110.0, 0.0]],
            mag: vec![vec![-10.0, 0.0], vec![-12.0, 0.0]],
            phase: Vec::new(),
        }
    }

    #[test]
    fn scale_time_doubles_frame_count() {
        let tracks = two_frame_tracks();
        let scaled = scale_time(&tracks, &[0.0, 0.0, 1.0, 2.0]).unwrap();
        assert_eq!(scaled.num_frames(), 4);
        assert!(scaled.phase.is_empty());
    }

    #[test]
    fn scale_time_rejects_odd_control_array() {
        let tracks = two_frame_tracks();
        assert!(matches!(
            scale_time(&tracks, &[0.0, 0.0, 1.0]),
            Err(ModelError::InvalidParameter {
                param: "time_scaling",
                ..
            })
        ));
    }

    #[test]
    fn scale_frequencies_applies_factor_only_to_active_cells() {
        let tracks = two_frame_tracks();
        let scaled = scale_frequencies(&tracks, &[0.0, 2.0, 1.0, 2.0]).unwrap();
        assert_eq!(scaled.freq[0][0], 200.0);
        assert_eq!(scaled.freq[1][0], 220.0);
        assert_eq!(scaled.freq[0][1], 0.0, "dormant cells stay at 0");
    }

    #[test]
    fn scale_frequencies_rejects_odd_control_array() {
        let tracks = two_frame_tracks();
        assert!(matches!(
            scale_frequencies(&tracks, &[0.0, 2.0, 1.0]),
            Err(ModelError::InvalidParameter {
                param: "freq_scaling",
                ..
            })
        ));
    }
}
