//! Induction and exothermic timescales from a sampled signal.
//!
//! The signal is thermicity for the flow systems and dT/dt for the
//! explosions. Induction is placed at the signal peak; the exothermic time
//! is the width of the pulse above half the peak.

use crate::error::{ZoneError, ZoneResult};
use serde::{Deserialize, Serialize};

/// Where a sampled quantity sits in the profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakLocation {
    pub index: usize,
    pub time: f64,
    pub distance: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    Start,
    End,
}

/// Signal peak, tagged with whether it fell on either end of the profile.
///
/// A peak on the boundary means the profile did not resolve the peak
/// (window too short, or no reaction at all) and the location is only a
/// fallback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "at", rename_all = "snake_case")]
pub enum InductionPoint {
    Interior(PeakLocation),
    AtBoundary {
        location: PeakLocation,
        boundary: Boundary,
    },
}

impl InductionPoint {
    /// `Ok` for an interior peak, `Err` carrying the fallback location for
    /// a boundary peak.
    pub fn location(&self) -> Result<&PeakLocation, &PeakLocation> {
        match self {
            InductionPoint::Interior(loc) => Ok(loc),
            InductionPoint::AtBoundary { location, .. } => Err(location),
        }
    }

    pub fn is_interior(&self) -> bool {
        matches!(self, InductionPoint::Interior(_))
    }
}

/// Half-maximum width of the pulse following the peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pulse", rename_all = "snake_case")]
pub enum ExothermicPulse {
    Width {
        /// Last sample below half-max before the peak, or 0 when the
        /// profile starts above it
        rise_index: usize,
        /// First sample below half-max after the peak
        fall_index: usize,
        time: f64,
        distance: f64,
    },
    /// The signal never fell back below half its peak after exceeding it.
    NoPulse,
}

impl ExothermicPulse {
    /// Pulse duration, zero when there was no pulse.
    pub fn time(&self) -> f64 {
        match self {
            ExothermicPulse::Width { time, .. } => *time,
            ExothermicPulse::NoPulse => 0.0,
        }
    }

    /// Pulse length in space, zero when there was no pulse.
    pub fn distance(&self) -> f64 {
        match self {
            ExothermicPulse::Width { distance, .. } => *distance,
            ExothermicPulse::NoPulse => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedTimescales {
    pub induction: InductionPoint,
    pub exothermic: ExothermicPulse,
    /// First times the signal reached 10% and 90% of its peak
    pub onset_10: Option<f64>,
    pub onset_90: Option<f64>,
}

/// Index of the first largest finite value.
pub fn peak_index(signal: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in signal.iter().enumerate() {
        if !v.is_finite() {
            continue;
        }
        if best.is_none_or(|(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

fn check_lengths(time: &[f64], distance: &[f64], signal: &[f64]) -> ZoneResult<()> {
    if signal.is_empty() {
        return Err(ZoneError::invalid("empty profile"));
    }
    if time.len() != signal.len() || distance.len() != signal.len() {
        return Err(ZoneError::invalid(format!(
            "profile columns differ in length: {} times, {} distances, {} samples",
            time.len(),
            distance.len(),
            signal.len()
        )));
    }
    Ok(())
}

/// Locate the signal peak. A peak on the first or last sample is returned
/// as [`InductionPoint::AtBoundary`] and logged.
pub fn induction_point(time: &[f64], distance: &[f64], signal: &[f64]) -> ZoneResult<InductionPoint> {
    check_lengths(time, distance, signal)?;
    let index = peak_index(signal).ok_or_else(|| ZoneError::invalid("signal has no finite samples"))?;
    let location = PeakLocation {
        index,
        time: time[index],
        distance: distance[index],
        value: signal[index],
    };
    let boundary = if index == 0 {
        Some(Boundary::Start)
    } else if index + 1 == signal.len() {
        Some(Boundary::End)
    } else {
        None
    };
    Ok(match boundary {
        None => InductionPoint::Interior(location),
        Some(boundary) => {
            tracing::warn!(
                index,
                time = location.time,
                ?boundary,
                "signal peak on the profile boundary; induction time is a fallback"
            );
            InductionPoint::AtBoundary { location, boundary }
        }
    })
}

fn crossing(x: &[f64], signal: &[f64], i: usize, level: f64) -> f64 {
    // linear crossing of `level` between samples i and i + 1
    let (s0, s1) = (signal[i], signal[i + 1]);
    if s1 == s0 {
        return x[i];
    }
    let frac = ((level - s0) / (s1 - s0)).clamp(0.0, 1.0);
    x[i] + frac * (x[i + 1] - x[i])
}

/// Width of the pulse around `peak` at half its height.
///
/// Scans forward for the first sample above half the peak, then for the
/// first later sample back below it. Crossing times are interpolated
/// linearly between the bracketing samples.
pub fn exothermic_pulse(
    time: &[f64],
    distance: &[f64],
    signal: &[f64],
    peak: &PeakLocation,
) -> ZoneResult<ExothermicPulse> {
    check_lengths(time, distance, signal)?;
    let half = 0.5 * peak.value;
    let pulse = (half > 0.0)
        .then(|| signal.iter().position(|&s| s > half))
        .flatten()
        .and_then(|above| {
            let below = signal[above..].iter().position(|&s| s < half)? + above;
            Some((above, below))
        });

    let Some((above, fall)) = pulse else {
        tracing::warn!(
            peak_index = peak.index,
            "signal does not fall back below half its peak; exothermic time set to zero"
        );
        return Ok(ExothermicPulse::NoPulse);
    };

    // a profile that starts above half-max rises at its first sample
    let (rise, t_rise, x_rise) = match above.checked_sub(1) {
        Some(rise) => (
            rise,
            crossing(time, signal, rise, half),
            crossing(distance, signal, rise, half),
        ),
        None => (0, time[0], distance[0]),
    };
    let t_fall = crossing(time, signal, fall - 1, half);
    let x_fall = crossing(distance, signal, fall - 1, half);
    Ok(ExothermicPulse::Width {
        rise_index: rise,
        fall_index: fall,
        time: t_fall - t_rise,
        distance: x_fall - x_rise,
    })
}

/// First time before the peak at which the signal reached `fraction` of
/// its peak value.
pub fn onset_time(time: &[f64], signal: &[f64], peak: &PeakLocation, fraction: f64) -> Option<f64> {
    if peak.value <= 0.0 {
        return None;
    }
    let level = fraction * peak.value;
    signal[..=peak.index]
        .iter()
        .position(|&s| s >= level)
        .map(|i| time[i])
}

/// All timescales of one profile.
pub fn derive(time: &[f64], distance: &[f64], signal: &[f64]) -> ZoneResult<DerivedTimescales> {
    let induction = induction_point(time, distance, signal)?;
    let peak = match induction.location() {
        Ok(loc) | Err(loc) => *loc,
    };
    Ok(DerivedTimescales {
        induction,
        exothermic: exothermic_pulse(time, distance, signal, &peak)?,
        onset_10: onset_time(time, signal, &peak, 0.1),
        onset_90: onset_time(time, signal, &peak, 0.9),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grid(n: usize, dt: f64) -> Vec<f64> {
        (0..n).map(|i| i as f64 * dt).collect()
    }

    #[test]
    fn interior_peak_and_pulse() {
        let t = grid(11, 1.0);
        let s = [0.0, 0.0, 1.0, 2.0, 4.0, 8.0, 4.0, 2.0, 1.0, 0.0, 0.0];
        let ts = derive(&t, &t, &s).unwrap();
        let loc = ts.induction.location().unwrap();
        assert_eq!(loc.index, 5);
        assert_eq!(loc.time, 5.0);
        // half-max 4 is crossed exactly at samples 4 and 6
        match ts.exothermic {
            ExothermicPulse::Width { time, .. } => assert!((time - 2.0).abs() < 1e-12),
            other => panic!("expected a pulse, got {other:?}"),
        }
        assert_eq!(ts.onset_10, Some(2.0));
        assert_eq!(ts.onset_90, Some(5.0));
    }

    #[test]
    fn monotone_signal_peaks_at_end_without_pulse() {
        let t = grid(20, 1e-9);
        let s: Vec<f64> = (0..20).map(|i| (i as f64).exp()).collect();
        let ts = derive(&t, &t, &s).unwrap();
        match ts.induction {
            InductionPoint::AtBoundary { location, boundary } => {
                assert_eq!(boundary, Boundary::End);
                assert_eq!(location.index, 19);
            }
            other => panic!("expected a boundary peak, got {other:?}"),
        }
        assert_eq!(ts.exothermic, ExothermicPulse::NoPulse);
        assert_eq!(ts.exothermic.time(), 0.0);
    }

    #[test]
    fn decaying_signal_peaks_at_start() {
        let t = grid(5, 1.0);
        let s = [5.0, 4.0, 3.0, 2.0, 1.0];
        let ts = derive(&t, &t, &s).unwrap();
        assert!(matches!(
            ts.induction,
            InductionPoint::AtBoundary { boundary: Boundary::Start, .. }
        ));
        // half-max 2.5 is crossed half way between samples 2 and 3
        assert!((ts.exothermic.time() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn pulse_starting_above_half_max_rises_at_first_sample() {
        // von Neumann-like start: 0.88 of the peak on the first sample
        let t = grid(9, 0.5);
        let x: Vec<f64> = t.iter().map(|v| 2.0 * v).collect();
        let s = [8.8, 9.4, 10.0, 9.0, 6.0, 4.0, 2.0, 1.0, 0.5];
        let ts = derive(&t, &x, &s).unwrap();
        assert_eq!(ts.induction.location().map(|l| l.index), Ok(2));
        match ts.exothermic {
            ExothermicPulse::Width {
                rise_index,
                fall_index,
                time,
                distance,
            } => {
                assert_eq!(rise_index, 0);
                assert_eq!(fall_index, 5);
                // half-max 5 crossed half way between t = 2.0 and t = 2.5
                assert!((time - 2.25).abs() < 1e-12);
                assert!((distance - 4.5).abs() < 1e-12);
            }
            other => panic!("expected a pulse, got {other:?}"),
        }
        assert_eq!(ts.onset_10, Some(0.0));
    }

    #[test]
    fn nonpositive_signal_has_no_pulse() {
        let t = grid(5, 1.0);
        let s = [-3.0, -2.0, -1.0, -2.0, -3.0];
        let ts = derive(&t, &t, &s).unwrap();
        assert!(ts.induction.is_interior());
        assert_eq!(ts.exothermic, ExothermicPulse::NoPulse);
        assert_eq!(ts.onset_10, None);
    }

    #[test]
    fn bad_columns_rejected() {
        assert!(derive(&[], &[], &[]).is_err());
        assert!(derive(&[0.0, 1.0], &[0.0], &[1.0, 2.0]).is_err());
        assert!(derive(&[0.0, 1.0], &[0.0, 1.0], &[f64::NAN, f64::NAN]).is_err());
    }

    proptest! {
        #[test]
        fn interior_peak_index_found(n in 3usize..200, frac in 0.0f64..1.0) {
            let k = 1 + ((n - 2) as f64 * frac) as usize % (n - 2);
            let t = grid(n, 1.0);
            let s: Vec<f64> = (0..n).map(|i| -((i as f64) - k as f64).abs()).collect();
            let ind = induction_point(&t, &t, &s).unwrap();
            prop_assert_eq!(ind.location().map(|l| l.index), Ok(k));
        }

        #[test]
        fn gaussian_half_width(sigma in 0.5f64..3.0, centre in 8.0f64..12.0) {
            let dt = 0.01;
            let t = grid(2001, dt);
            let s: Vec<f64> = t
                .iter()
                .map(|x| (-(x - centre).powi(2) / (2.0 * sigma * sigma)).exp())
                .collect();
            let ts = derive(&t, &t, &s).unwrap();
            let fwhm = 2.0 * (2.0 * std::f64::consts::LN_2).sqrt() * sigma;
            prop_assert!((ts.exothermic.time() - fwhm).abs() < 2.0 * dt);
            let loc = ts.induction.location().unwrap();
            prop_assert!((loc.time - centre).abs() <= dt);
        }
    }
}
