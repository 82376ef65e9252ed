//! Rankine-Hugoniot jump systems.
//!
//! Every system has two unknowns. The first is always the downstream
//! temperature; the second depends on the [`JumpKind`].

use crate::error::{ShockError, ShockResult};
use crate::evaluator::{StatePoint, ThermoMode, evaluate};
use crate::newton::JumpResidual;
use nalgebra::Vector2;
use sf_core::numeric::ensure_positive;
use sf_gas::{GasModel, GasState};

/// Enthalpy and momentum jump residuals `[FH, FP]` across a shock moving at
/// `w1` into gas at (`p1`, `rho1`, `h1`).
///
/// The downstream wave-frame speed follows from mass conservation,
/// `w2 = w1 rho1 / rho2`.
pub fn fhfp(w1: f64, upstream: &Upstream, downstream: StatePoint, rho2: f64) -> [f64; 2] {
    let w2 = w1 * upstream.density / rho2;
    let fh = downstream.enthalpy + 0.5 * w2 * w2 - upstream.enthalpy - 0.5 * w1 * w1;
    let fp = downstream.pressure + rho2 * w2 * w2 - upstream.pressure - upstream.density * w1 * w1;
    [fh, fp]
}

/// Residuals `[FH, FP]` for a shock reflected off a closed end, where the gas
/// ahead (state 2) moves at `u2` and is brought to rest.
pub fn reflected_residual(u2: f64, upstream: &Upstream, downstream: StatePoint, rho3: f64) -> [f64; 2] {
    let ratio = rho3 / upstream.density;
    let fp = downstream.pressure
        - upstream.pressure
        - upstream.density * u2 * u2 / (1.0 - upstream.density / rho3);
    let fh = downstream.enthalpy - upstream.enthalpy - 0.5 * u2 * u2 * (ratio + 1.0) / (ratio - 1.0);
    [fh, fp]
}

/// Thermodynamic summary of the gas ahead of a jump.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Upstream {
    pub pressure: f64,
    pub density: f64,
    pub enthalpy: f64,
}

impl Upstream {
    pub fn of(model: &dyn GasModel, state: &GasState) -> ShockResult<Self> {
        Ok(Self {
            pressure: state.pressure(),
            density: state.density(),
            enthalpy: model.enthalpy_mass(state)?,
        })
    }
}

/// Which jump is being solved and what is held fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JumpKind {
    /// Incident shock at a given speed; unknowns (T2, v2), with v2 kept
    /// below the upstream volume.
    Incident { shock_speed: f64 },
    /// Reflected shock behind gas moving at `particle_speed`; unknowns
    /// (T3, v3), with v3 kept below the incident post-shock volume.
    Reflected { particle_speed: f64 },
    /// Downstream density fixed; unknowns (T2, w1). Used to sample the
    /// equilibrium Hugoniot for the CJ search.
    FixedDensity { density: f64 },
}

/// Residual system for one jump solve.
///
/// Owns the working gas state that is re-evaluated on every residual call, so
/// the caller's upstream state is never touched.
pub struct JumpSystem<'a> {
    model: &'a dyn GasModel,
    upstream: Upstream,
    upstream_volume: f64,
    reference_y: Vec<f64>,
    working: GasState,
    mode: ThermoMode,
    kind: JumpKind,
    evaluations: usize,
}

impl<'a> JumpSystem<'a> {
    pub fn new(
        model: &'a dyn GasModel,
        upstream: &GasState,
        mode: ThermoMode,
        kind: JumpKind,
    ) -> ShockResult<Self> {
        match kind {
            JumpKind::Incident { shock_speed } => ensure_positive(shock_speed, "incident shock speed")?,
            JumpKind::Reflected { particle_speed } => {
                ensure_positive(particle_speed, "reflected particle speed")?
            }
            JumpKind::FixedDensity { density } => ensure_positive(density, "downstream density")?,
        };
        Ok(Self {
            model,
            upstream: Upstream::of(model, upstream)?,
            upstream_volume: upstream.specific_volume(),
            reference_y: upstream.mass_fractions().to_vec(),
            working: upstream.clone(),
            mode,
            kind,
            evaluations: 0,
        })
    }

    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    pub fn kind(&self) -> JumpKind {
        self.kind
    }

    /// Residual evaluations performed so far, Jacobian columns included.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Downstream density implied by the unknown vector.
    pub fn downstream_density(&self, x: Vector2<f64>) -> f64 {
        match self.kind {
            JumpKind::FixedDensity { density } => density,
            _ => 1.0 / x[1],
        }
    }

    /// Working state left at the last evaluated point.
    pub fn working(&self) -> &GasState {
        &self.working
    }

    /// Re-evaluate at `x` and hand back the working state.
    pub fn into_state_at(mut self, x: Vector2<f64>) -> ShockResult<GasState> {
        let rho = self.downstream_density(x);
        self.point(rho, x[0])?;
        Ok(self.working)
    }

    fn point(&mut self, rho: f64, t: f64) -> ShockResult<StatePoint> {
        if !(rho.is_finite() && rho > 0.0 && t.is_finite() && t > 0.0) {
            return Err(ShockError::InvalidInput {
                what: format!("jump iterate left the physical region (T = {t}, rho = {rho})"),
            });
        }
        self.evaluations += 1;
        Ok(evaluate(
            self.model,
            &mut self.working,
            &self.reference_y,
            rho,
            t,
            self.mode,
        )?)
    }
}

impl JumpResidual for JumpSystem<'_> {
    fn residual(&mut self, x: Vector2<f64>) -> ShockResult<Vector2<f64>> {
        let rho = self.downstream_density(x);
        let down = self.point(rho, x[0])?;
        let r = match self.kind {
            JumpKind::Incident { shock_speed } => fhfp(shock_speed, &self.upstream, down, rho),
            JumpKind::FixedDensity { .. } => fhfp(x[1], &self.upstream, down, rho),
            JumpKind::Reflected { particle_speed } => {
                reflected_residual(particle_speed, &self.upstream, down, rho)
            }
        };
        Ok(Vector2::new(r[0], r[1]))
    }

    fn upper_bound(&self, i: usize) -> Option<f64> {
        // v = v_upstream is always a root of the jump equations
        match (self.kind, i) {
            (JumpKind::Incident { .. } | JumpKind::Reflected { .. }, 1) => Some(self.upstream_volume),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn air() -> Upstream {
        Upstream {
            pressure: 101_325.0,
            density: 1.2,
            enthalpy: 0.0,
        }
    }

    #[test]
    fn nonpositive_parameters_rejected() {
        use sf_core::units::{k, pa};
        use sf_gas::{Composition, IdealGasMixture};

        let gas = IdealGasMixture::hydrogen_air().unwrap();
        let up = gas
            .state_tpx(k(300.0), pa(101_325.0), &Composition::pure("N2"))
            .unwrap();
        for kind in [
            JumpKind::Incident { shock_speed: 0.0 },
            JumpKind::Reflected { particle_speed: -10.0 },
            JumpKind::FixedDensity { density: f64::INFINITY },
        ] {
            let err = JumpSystem::new(&gas, &up, ThermoMode::Frozen, kind).err().unwrap();
            assert!(matches!(err, ShockError::InvalidInput { .. }), "{kind:?}: {err}");
        }
    }

    #[test]
    fn incident_volume_bounded_by_upstream() {
        use sf_core::units::{k, pa};
        use sf_gas::{Composition, IdealGasMixture};

        let gas = IdealGasMixture::hydrogen_air().unwrap();
        let up = gas
            .state_tpx(k(300.0), pa(101_325.0), &Composition::pure("N2"))
            .unwrap();
        let sys = JumpSystem::new(&gas, &up, ThermoMode::Frozen, JumpKind::Incident { shock_speed: 500.0 })
            .unwrap();
        assert_eq!(sys.upper_bound(1), Some(up.specific_volume()));
        assert_eq!(sys.upper_bound(0), None);
    }

    #[test]
    fn identity_jump_has_zero_residual() {
        let up = air();
        let down = StatePoint {
            pressure: up.pressure,
            enthalpy: up.enthalpy,
        };
        let r = fhfp(800.0, &up, down, up.density);
        assert!(r[0].abs() < 1e-9);
        assert!(r[1].abs() < 1e-6);
    }

    #[test]
    fn momentum_residual_sign() {
        // compressing without raising the pressure leaves a momentum deficit
        let up = air();
        let down = StatePoint {
            pressure: up.pressure,
            enthalpy: up.enthalpy,
        };
        let r = fhfp(800.0, &up, down, 4.0 * up.density);
        assert!(r[1] < 0.0);
    }

    #[test]
    fn reflected_residual_matches_closed_form() {
        let up = air();
        let u2 = 300.0;
        let rho3 = 2.0 * up.density;
        // exact (P3, h3) from the two jump equations
        let p3 = up.pressure + up.density * u2 * u2 / (1.0 - 0.5);
        let h3 = up.enthalpy + 0.5 * u2 * u2 * 3.0;
        let r = reflected_residual(
            u2,
            &up,
            StatePoint {
                pressure: p3,
                enthalpy: h3,
            },
            rho3,
        );
        assert!(r[0].abs() < 1e-9);
        assert!(r[1].abs() < 1e-6);
    }
}
