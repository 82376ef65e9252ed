//! Shock and CJ scenarios on stoichiometric hydrogen-air.

use sf_core::units::{atm, k, pa};
use sf_gas::{Composition, GasModel, GasState, IdealGasMixture};
use sf_shock::{
    CjConfig, ShockConfig, ThermoMode, cj_speed, cj_speed_batch, cj_state, incident_residual,
    post_shock, post_shock_frozen, reflected_shock,
};

fn h2_air(gas: &IdealGasMixture, p: f64) -> GasState {
    let comp = Composition::parse("H2:2 O2:1 N2:3.76").unwrap();
    gas.state_tpx(k(298.15), pa(p), &comp).unwrap()
}

#[test]
fn frozen_incident_at_2000() {
    let gas = IdealGasMixture::hydrogen_air().unwrap();
    let s1 = h2_air(&gas, 101_325.0);
    let sol = post_shock_frozen(&gas, &s1, 2000.0, &ShockConfig::default()).unwrap();

    assert!(sol.converged, "iterations = {}", sol.iterations);
    assert!(sol.iterations < 500);
    assert!(sol.pressure_ratio(&s1) > 5.0);
    assert!(sol.state.temperature() > 1000.0 && sol.state.temperature() < 2000.0);
    // composition frozen across the jump
    assert_eq!(sol.state.mass_fractions(), s1.mass_fractions());

    let [fh, fp] = sol.residual;
    assert!(fh.abs() < 1e-3 * 0.5 * 2000.0 * 2000.0, "FH = {fh}");
    assert!(fp.abs() < 1e-3 * sol.state.pressure(), "FP = {fp}");
}

#[test]
fn weak_frozen_shocks_compress() {
    let gas = IdealGasMixture::hydrogen_air().unwrap();
    let cfg = ShockConfig::default();
    for mixture in ["N2:1", "AR:1", "H2:2 O2:1 N2:3.76"] {
        let comp = Composition::parse(mixture).unwrap();
        let s1 = gas.state_tpx(k(300.0), atm(1.0), &comp).unwrap();
        let a1 = gas.sound_speed_frozen(&s1).unwrap();
        for mach in [1.001, 1.005, 1.01, 1.05, 1.2, 1.5, 2.0] {
            let sol = post_shock_frozen(&gas, &s1, mach * a1, &cfg).unwrap();
            assert!(sol.converged, "{mixture} M = {mach}");
            assert!(
                sol.density_ratio(&s1) > 1.0,
                "{mixture} M = {mach}: rho2/rho1 = {}",
                sol.density_ratio(&s1)
            );
            assert!(sol.pressure_ratio(&s1) > 1.0, "{mixture} M = {mach}");
            assert!(sol.state.temperature() > s1.temperature(), "{mixture} M = {mach}");
        }
    }
}

#[test]
fn equilibrium_incident_above_cj() {
    let gas = IdealGasMixture::hydrogen_air().unwrap();
    let s1 = h2_air(&gas, 101_325.0);
    let cfg = ShockConfig::default();
    let eq = post_shock(&gas, &s1, 2500.0, ThermoMode::Equilibrium, &cfg).unwrap();
    let frozen = post_shock(&gas, &s1, 2500.0, ThermoMode::Frozen, &cfg).unwrap();

    assert!(eq.converged);
    // heat release behind the equilibrium shock
    assert!(eq.state.temperature() > frozen.state.temperature());
    let water = gas.species_index("H2O").unwrap();
    assert!(eq.state.mass_fractions()[water] > 0.1);

    let r = incident_residual(&gas, &s1, &eq).unwrap();
    assert!(r[1].abs() < 1e-3 * eq.state.pressure());
}

#[test]
fn reflected_on_converged_incident() {
    let gas = IdealGasMixture::hydrogen_air().unwrap();
    let cfg = ShockConfig::default();
    let s1 = h2_air(&gas, 101_325.0);
    let inc = post_shock_frozen(&gas, &s1, 2000.0, &cfg).unwrap();
    assert!(inc.converged);

    let refl = reflected_shock(&gas, &s1, &inc, ThermoMode::Frozen, &cfg).unwrap();
    assert!(refl.converged);
    assert!(refl.reflected_speed > 0.0, "UR = {}", refl.reflected_speed);
    assert!(refl.pressure() > inc.state.pressure());
    assert!(refl.state.temperature() > inc.state.temperature());
}

#[test]
fn cj_speed_deterministic_and_rises_with_pressure() {
    let gas = IdealGasMixture::hydrogen_air().unwrap();
    let cfg = CjConfig::default();
    let low = h2_air(&gas, 101_325.0);
    let high = gas
        .state_tpx(k(298.15), atm(10.0), &Composition::parse("H2:2 O2:1 N2:3.76").unwrap())
        .unwrap();

    let batch = cj_speed_batch(&gas, &[low.clone(), high], &cfg);
    let single = cj_speed(&gas, &low, &cfg).unwrap();
    let at_1atm = batch[0].as_ref().unwrap();
    let at_10atm = batch[1].as_ref().unwrap();

    // same inputs, same answer, whichever thread ran it
    assert_eq!(single.speed.to_bits(), at_1atm.speed.to_bits());
    assert_eq!(single.samples, at_1atm.samples);

    assert!(at_1atm.speed > 1700.0 && at_1atm.speed < 2400.0, "U_cj = {}", at_1atm.speed);
    assert!(at_10atm.speed >= at_1atm.speed);
    assert!(at_1atm.density_ratio > 1.5 && at_1atm.density_ratio < 2.0);
    assert!(at_1atm.refinements >= cfg.min_refinements);
    assert!(at_1atm.refinements <= cfg.max_refinements);
    assert!(at_1atm.uncertainty.is_finite() && at_1atm.uncertainty >= 0.0);

    let state = cj_state(&gas, &low, at_1atm, &ShockConfig::default()).unwrap();
    assert!(state.state.temperature() > 2500.0);
    assert!(state.density_ratio(&low) > 1.5);
}

#[test]
fn refinement_cap_is_reported() {
    let gas = IdealGasMixture::hydrogen_air().unwrap();
    let s1 = h2_air(&gas, 101_325.0);
    let cfg = CjConfig {
        max_refinements: 1,
        min_refinements: 4,
        ..CjConfig::default()
    };
    let res = cj_speed(&gas, &s1, &cfg).unwrap();
    assert_eq!(res.refinements, 1);
    assert!(!res.status.is_converged());
    assert!(res.speed.is_finite());
}
