//! Adaptive integration driver and result recording.

use crate::error::{ZoneError, ZoneResult};
use crate::integrator::{Rosenbrock23, StepAttempt, finite_difference_jacobian, step_factor};
use crate::model::{OdeModel, StopReason};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Options for reaction-zone integration.
///
/// `t_end` and `max_step` left unset take the defaults of the system being
/// integrated (see [`crate::ReactionZoneKind`]).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationOptions {
    /// Final time (seconds)
    pub t_end: Option<f64>,
    pub rtol: f64,
    pub atol: f64,
    /// Largest step (seconds)
    pub max_step: Option<f64>,
    /// First trial step; estimated from the initial slope when unset
    pub first_step: Option<f64>,
    /// Floor on the step size; steps accepted at the floor are flagged
    pub min_step: f64,
    /// Cap on attempted steps, rejected ones included
    pub max_steps: usize,
    /// Wall-clock budget (seconds)
    pub deadline_s: Option<f64>,
    /// Record only at these times (strictly increasing, within `[0, t_end]`)
    pub t_eval: Option<Vec<f64>>,
    /// ZND and stagnation stop once `1 - M²` drops below this
    pub sonic_cutoff: f64,
}

impl Default for IntegrationOptions {
    fn default() -> Self {
        Self {
            t_end: None,
            rtol: 1e-5,
            atol: 1e-8,
            max_step: None,
            first_step: None,
            min_step: 1e-20,
            max_steps: 200_000,
            deadline_s: None,
            t_eval: None,
            sonic_cutoff: 1e-3,
        }
    }
}

impl IntegrationOptions {
    pub fn with_t_end(mut self, t_end: f64) -> Self {
        self.t_end = Some(t_end);
        self
    }

    pub fn with_max_step(mut self, max_step: f64) -> Self {
        self.max_step = Some(max_step);
        self
    }

    pub fn with_t_eval(mut self, t_eval: Vec<f64>) -> Self {
        self.t_eval = Some(t_eval);
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline_s = Some(deadline.as_secs_f64());
        self
    }

    fn validate(&self, t_end: f64, max_step: f64) -> ZoneResult<()> {
        if !(t_end > 0.0 && t_end.is_finite()) {
            return Err(ZoneError::invalid(format!("t_end must be positive, got {t_end}")));
        }
        if !(max_step > 0.0) {
            return Err(ZoneError::invalid(format!("max_step must be positive, got {max_step}")));
        }
        if !(self.rtol > 0.0 && self.atol > 0.0) {
            return Err(ZoneError::invalid("rtol and atol must be positive"));
        }
        if self.max_steps == 0 {
            return Err(ZoneError::invalid("max_steps must be positive"));
        }
        if let Some(d) = self.deadline_s {
            if !(d >= 0.0 && d.is_finite()) {
                return Err(ZoneError::invalid(format!("deadline must be non-negative, got {d}")));
            }
        }
        if let Some(times) = &self.t_eval {
            let increasing = times.windows(2).all(|w| w[1] > w[0]);
            let inside = times.iter().all(|&t| (0.0..=t_end).contains(&t));
            if times.is_empty() || !increasing || !inside {
                return Err(ZoneError::invalid(
                    "t_eval must be non-empty, strictly increasing and within [0, t_end]",
                ));
            }
        }
        Ok(())
    }
}

/// Why integration ended before `t_end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationCause {
    StepCap,
    Deadline,
}

/// How an integration ended.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IntegrationStatus {
    Completed,
    /// The model's stop condition fired after the last recorded step.
    Stopped { reason: StopReason, t: f64 },
    /// Partial result; the profile ends at `t`.
    Truncated { cause: TruncationCause, t: f64 },
}

impl IntegrationStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, IntegrationStatus::Completed)
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, IntegrationStatus::Truncated { .. })
    }
}

/// Recorded solution.
#[derive(Clone, Debug)]
pub struct Trajectory {
    /// Strictly increasing times (seconds)
    pub t: Vec<f64>,
    pub y: Vec<DVector<f64>>,
    pub status: IntegrationStatus,
    /// Some step was accepted at the minimum step size without meeting
    /// the tolerances
    pub tolerance_not_met: bool,
    pub accepted_steps: usize,
    pub rejected_steps: usize,
}

struct Recorder<'a> {
    t_eval: Option<&'a [f64]>,
    next: usize,
    t: Vec<f64>,
    y: Vec<DVector<f64>>,
}

impl<'a> Recorder<'a> {
    fn new(t_eval: Option<&'a [f64]>, y0: &DVector<f64>) -> Self {
        let mut rec = Self {
            t_eval,
            next: 0,
            t: Vec::new(),
            y: Vec::new(),
        };
        match t_eval {
            None => rec.push(0.0, y0.clone()),
            Some(times) if times.first() == Some(&0.0) => {
                rec.push(0.0, y0.clone());
                rec.next = 1;
            }
            Some(_) => {}
        }
        rec
    }

    fn push(&mut self, t: f64, y: DVector<f64>) {
        self.t.push(t);
        self.y.push(y);
    }

    fn accepted(
        &mut self,
        method: &Rosenbrock23,
        t: f64,
        t_new: f64,
        y: &DVector<f64>,
        step: &StepAttempt,
    ) {
        let h = t_new - t;
        match self.t_eval {
            None => self.push(t_new, step.y_new.clone()),
            Some(times) => {
                while self.next < times.len() && times[self.next] <= t_new {
                    let te = times[self.next];
                    let s = ((te - t) / h).clamp(0.0, 1.0);
                    let ye = if te == t_new {
                        step.y_new.clone()
                    } else {
                        method.interpolate(y, step, h, s)
                    };
                    self.push(te, ye);
                    self.next += 1;
                }
            }
        }
    }
}

fn initial_step(
    y0: &DVector<f64>,
    f0: &DVector<f64>,
    rtol: f64,
    atol: f64,
    limit: f64,
) -> f64 {
    let n = y0.len().max(1) as f64;
    let mut d0 = 0.0;
    let mut d1 = 0.0;
    for (y, f) in y0.iter().zip(f0.iter()) {
        let scale = atol + rtol * y.abs();
        d0 += (y / scale).powi(2);
        d1 += (f / scale).powi(2);
    }
    let (d0, d1) = ((d0 / n).sqrt(), (d1 / n).sqrt());
    let h = if d0 < 1e-5 || d1 < 1e-5 {
        1e-6 * limit
    } else {
        0.01 * d0 / d1
    };
    h.min(limit)
}

/// Integrate `model` from `y0` at t = 0 to `t_end`.
///
/// Always returns a trajectory unless the inputs are invalid or the model
/// fails outright. Hitting `max_steps` or the deadline yields a partial
/// trajectory with a `Truncated` status.
pub fn integrate<M: OdeModel + ?Sized>(
    model: &mut M,
    y0: DVector<f64>,
    t_end: f64,
    max_step: f64,
    opts: &IntegrationOptions,
) -> ZoneResult<Trajectory> {
    opts.validate(t_end, max_step)?;
    if y0.len() != model.dim() {
        return Err(ZoneError::invalid(format!(
            "initial state has {} entries, model expects {}",
            y0.len(),
            model.dim()
        )));
    }

    let method = Rosenbrock23::default();
    let started = Instant::now();
    let deadline = opts.deadline_s.map(Duration::from_secs_f64);
    let (rtol, atol) = (opts.rtol, opts.atol);

    let mut recorder = Recorder::new(opts.t_eval.as_deref(), &y0);
    let mut t = 0.0;
    let mut y = y0;
    let mut f = DVector::zeros(y.len());
    model.rhs(&y, &mut f)?;
    if f.iter().any(|v| !v.is_finite()) {
        return Err(ZoneError::NonFiniteRhs { t });
    }

    let mut h = opts
        .first_step
        .unwrap_or_else(|| initial_step(&y, &f, rtol, atol, max_step))
        .min(max_step)
        .min(t_end);
    let mut jac = finite_difference_jacobian(model, t, &y, &f)?;

    let mut attempts = 0;
    let mut accepted_steps = 0;
    let mut rejected_steps = 0;
    let mut tolerance_not_met = false;
    let mut status = IntegrationStatus::Completed;

    while t < t_end {
        if attempts >= opts.max_steps {
            tracing::warn!(t, attempts, "integration truncated at the step cap");
            status = IntegrationStatus::Truncated {
                cause: TruncationCause::StepCap,
                t,
            };
            break;
        }
        if deadline.is_some_and(|d| started.elapsed() >= d) {
            tracing::warn!(t, accepted_steps, "integration truncated at the deadline");
            status = IntegrationStatus::Truncated {
                cause: TruncationCause::Deadline,
                t,
            };
            break;
        }
        attempts += 1;

        let h_min = (16.0 * f64::EPSILON * t.abs()).max(opts.min_step);
        h = h.min(max_step).max(h_min);
        let last = t + h >= t_end;
        if last {
            h = t_end - t;
        }

        let step = match method.attempt(model, t, &y, &f, &jac, h, rtol, atol) {
            Ok(step) => step,
            Err(e @ (ZoneError::NonFiniteRhs { .. } | ZoneError::Gas(_))) => {
                // a stage left the physical region: shrink and retry
                if h <= h_min {
                    return Err(e);
                }
                rejected_steps += 1;
                h = (0.25 * h).max(h_min);
                continue;
            }
            Err(e) => return Err(e),
        };

        let at_floor = h <= h_min;
        if step.error > 1.0 && !at_floor {
            rejected_steps += 1;
            h *= step_factor(step.error).min(0.9);
            continue;
        }
        if step.error > 1.0 {
            if !tolerance_not_met {
                tracing::warn!(t, h, error = step.error, "step accepted at minimum size");
            }
            tolerance_not_met = true;
        }

        let t_new = if last { t_end } else { t + h };
        recorder.accepted(&method, t, t_new, &y, &step);
        t = t_new;
        accepted_steps += 1;
        let factor = step_factor(step.error);
        y = step.y_new;
        f = step.f_new;

        if let Some(reason) = model.stop_condition(&y)? {
            tracing::warn!(t, ?reason, "integration stopped by the model");
            status = IntegrationStatus::Stopped { reason, t };
            break;
        }

        h *= factor;
        if t < t_end {
            jac = finite_difference_jacobian(model, t, &y, &f)?;
        }
    }

    tracing::debug!(
        accepted_steps,
        rejected_steps,
        t,
        recorded = recorder.t.len(),
        "integration finished"
    );

    Ok(Trajectory {
        t: recorder.t,
        y: recorder.y,
        status,
        tolerance_not_met,
        accepted_steps,
        rejected_steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Robertson's stiff kinetics problem.
    struct Robertson;

    impl OdeModel for Robertson {
        fn dim(&self) -> usize {
            3
        }

        fn rhs(&mut self, y: &DVector<f64>, dydt: &mut DVector<f64>) -> ZoneResult<()> {
            let (a, b, c) = (y[0], y[1], y[2]);
            dydt[0] = -0.04 * a + 1e4 * b * c;
            dydt[1] = 0.04 * a - 1e4 * b * c - 3e7 * b * b;
            dydt[2] = 3e7 * b * b;
            Ok(())
        }
    }

    struct Decay;

    impl OdeModel for Decay {
        fn dim(&self) -> usize {
            1
        }

        fn rhs(&mut self, y: &DVector<f64>, dydt: &mut DVector<f64>) -> ZoneResult<()> {
            dydt[0] = -y[0];
            Ok(())
        }

        fn stop_condition(&mut self, y: &DVector<f64>) -> ZoneResult<Option<StopReason>> {
            Ok((y[0] < 0.5).then_some(StopReason::Sonic))
        }
    }

    fn robertson_y0() -> DVector<f64> {
        DVector::from_vec(vec![1.0, 0.0, 0.0])
    }

    #[test]
    fn robertson_reference_values() {
        let opts = IntegrationOptions {
            rtol: 1e-6,
            atol: 1e-10,
            ..Default::default()
        };
        let traj = integrate(&mut Robertson, robertson_y0(), 40.0, 40.0, &opts).unwrap();
        assert!(traj.status.is_complete());
        let y = traj.y.last().unwrap();
        // reference solution at t = 40
        assert!((y[0] - 0.7158).abs() < 1e-3, "y0 = {}", y[0]);
        assert!((y[2] - 0.2842).abs() < 1e-3);
        assert!((y.sum() - 1.0).abs() < 1e-6);
        assert!(traj.t.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(*traj.t.last().unwrap(), 40.0);
    }

    #[test]
    fn t_eval_samples_requested_times() {
        let times = vec![0.0, 0.25, 0.5, 1.0];
        let opts = IntegrationOptions::default().with_t_eval(times);
        // Decay stops itself below 0.5, i.e. near t = ln 2
        let traj = integrate(&mut Decay, DVector::from_element(1, 1.0), 1.0, 0.1, &opts).unwrap();
        assert_eq!(traj.t, vec![0.0, 0.25, 0.5]);
        assert!((traj.y[1][0] - (-0.25f64).exp()).abs() < 1e-4);
        assert!(matches!(
            traj.status,
            IntegrationStatus::Stopped {
                reason: StopReason::Sonic,
                ..
            }
        ));
    }

    #[test]
    fn step_cap_truncates() {
        let opts = IntegrationOptions::default().with_max_steps(5);
        let traj = integrate(&mut Robertson, robertson_y0(), 40.0, 40.0, &opts).unwrap();
        assert!(traj.status.is_truncated());
        assert!(traj.t.len() <= 6);
        assert!(*traj.t.last().unwrap() < 40.0);
    }

    #[test]
    fn zero_deadline_truncates_immediately() {
        let opts = IntegrationOptions::default().with_deadline(Duration::ZERO);
        let traj = integrate(&mut Robertson, robertson_y0(), 40.0, 40.0, &opts).unwrap();
        assert_eq!(
            traj.status,
            IntegrationStatus::Truncated {
                cause: TruncationCause::Deadline,
                t: 0.0
            }
        );
        assert_eq!(traj.t, vec![0.0]);
    }

    #[test]
    fn invalid_options_rejected() {
        let opts = IntegrationOptions::default().with_t_eval(vec![0.5, 0.2]);
        assert!(integrate(&mut Decay, DVector::from_element(1, 1.0), 1.0, 0.1, &opts).is_err());
        let opts = IntegrationOptions::default();
        assert!(integrate(&mut Decay, DVector::from_element(1, 1.0), -1.0, 0.1, &opts).is_err());
        assert!(integrate(&mut Decay, DVector::from_element(2, 1.0), 1.0, 0.1, &opts).is_err());
    }

    #[test]
    fn options_from_yaml() {
        let opts: IntegrationOptions = serde_yaml::from_str("rtol: 1.0e-6\nt_end: 0.002\n").unwrap();
        assert_eq!(opts.rtol, 1e-6);
        assert_eq!(opts.t_end, Some(0.002));
        assert_eq!(opts.atol, 1e-8);
        assert_eq!(opts.max_steps, 200_000);
    }
}
