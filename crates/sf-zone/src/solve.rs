//! Entry points: build a system, integrate it, sample the profile.

use crate::error::{ZoneError, ZoneResult};
use crate::profile::ReactionZoneProfile;
use crate::sim::{IntegrationOptions, integrate};
use crate::systems::{ReactionZoneKind, ReactionZoneSystem};
use sf_gas::{GasModel, GasState};
use sf_shock::{ShockConfig, ShockSolution, post_shock_frozen};

/// Integrate `kind` from `initial` and return the sampled profile.
///
/// For the flow systems `initial` is the post-shock state.
pub fn solve_reaction_zone(
    model: &dyn GasModel,
    initial: &GasState,
    kind: ReactionZoneKind,
    opts: &IntegrationOptions,
) -> ZoneResult<ReactionZoneProfile> {
    let t_end = opts.t_end.unwrap_or_else(|| kind.default_t_end());
    let max_step = opts.max_step.unwrap_or_else(|| kind.default_max_step());
    let mut system = ReactionZoneSystem::new(model, initial, kind, opts.sonic_cutoff)?;
    let y0 = system.initial_vector();

    let span = tracing::info_span!("reaction_zone", kind = kind.label(), t_end);
    let _guard = span.enter();
    tracing::info!(
        t0 = initial.temperature(),
        p0 = initial.pressure(),
        "integrating"
    );
    let trajectory = integrate(&mut system, y0, t_end, max_step, opts)?;
    let profile = ReactionZoneProfile::from_trajectory(model, &mut system, trajectory)?;
    if let Some(last) = profile.last() {
        tracing::info!(
            samples = profile.len(),
            t_final = last.time,
            t_final_k = last.temperature,
            status = ?profile.status,
            "profile complete"
        );
    }
    Ok(profile)
}

/// Constant-volume explosion from `initial`.
pub fn cv_explosion(
    model: &dyn GasModel,
    initial: &GasState,
    opts: &IntegrationOptions,
) -> ZoneResult<ReactionZoneProfile> {
    solve_reaction_zone(model, initial, ReactionZoneKind::ConstantVolume, opts)
}

/// Constant-pressure explosion from `initial`.
pub fn cp_explosion(
    model: &dyn GasModel,
    initial: &GasState,
    opts: &IntegrationOptions,
) -> ZoneResult<ReactionZoneProfile> {
    solve_reaction_zone(model, initial, ReactionZoneKind::ConstantPressure, opts)
}

/// ZND structure behind a shock at `shock_speed` into `upstream`, starting
/// from an already computed `post_shock` state.
pub fn znd(
    model: &dyn GasModel,
    upstream: &GasState,
    post_shock: &GasState,
    shock_speed: f64,
    opts: &IntegrationOptions,
) -> ZoneResult<ReactionZoneProfile> {
    let kind = ReactionZoneKind::Znd {
        upstream_density: upstream.density(),
        shock_speed,
    };
    solve_reaction_zone(model, post_shock, kind, opts)
}

/// Stagnation-point flow between a shock and a body `standoff` behind it.
pub fn stagnation(
    model: &dyn GasModel,
    upstream: &GasState,
    post_shock: &GasState,
    shock_speed: f64,
    standoff: f64,
    opts: &IntegrationOptions,
) -> ZoneResult<ReactionZoneProfile> {
    let kind = ReactionZoneKind::Stagnation {
        upstream_density: upstream.density(),
        shock_speed,
        standoff,
    };
    solve_reaction_zone(model, post_shock, kind, opts)
}

/// Frozen shock followed by the ZND reaction zone.
///
/// Returns the shock solution alongside the profile; a shock that did not
/// converge is rejected since the profile would start from a wrong state.
pub fn znd_behind_shock(
    model: &dyn GasModel,
    upstream: &GasState,
    shock_speed: f64,
    shock: &ShockConfig,
    opts: &IntegrationOptions,
) -> ZoneResult<(ShockSolution, ReactionZoneProfile)> {
    let solution = post_shock_frozen(model, upstream, shock_speed, shock)?;
    if !solution.converged {
        return Err(ZoneError::invalid(format!(
            "frozen shock at {shock_speed} m/s did not converge"
        )));
    }
    let profile = znd(model, upstream, &solution.state, shock_speed, opts)?;
    Ok((solution, profile))
}
