use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use sf_core::units::{atm, k};
use sf_gas::{Composition, GasModel, GasState, IdealGasMixture};
use sf_results::{InitialConditions, ZoneSummary, load_json, save_json, zone_report};
use sf_shock::ShockConfig;
use sf_zone::{IntegrationOptions, cv_explosion, znd_behind_shock};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn h2_air(gas: &IdealGasMixture, t: f64, p_atm: f64) -> GasState {
    let comp = Composition::parse("H2:2 O2:1 N2:3.76").unwrap();
    gas.state_tpx(k(t), atm(p_atm), &comp).unwrap()
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
}

#[test]
fn truncated_explosion_report_flags_missing_pulse() {
    let gas = IdealGasMixture::hydrogen_air().unwrap();
    let s0 = h2_air(&gas, 1500.0, 10.0);
    let profile = cv_explosion(&gas, &s0, &IntegrationOptions::default().with_t_end(1e-7)).unwrap();
    let ts = profile.timescales().unwrap();
    let report = zone_report(&profile, InitialConditions::of(&gas, &s0), &ts, date());
    let text = report.to_text().unwrap();

    assert!(text.starts_with("# CV: EXPLOSION STRUCTURE CALCULATION\n"));
    assert!(text.contains("# CALCULATION RUN ON January 15, 2025"));
    assert!(text.contains("# PRESSURE (ATM) 10.0"));
    assert!(text.contains("H2:0.2959"));
    assert!(text.contains("no exothermic pulse"));
    assert!(text.contains("peak at the end of the profile"));
    assert!(!text.contains("SHOCK SPEED"));
    assert!(text.contains(
        "Variables = \"Time (s)\", \"Temperature (K)\", \"Pressure (atm)\", \"Density (kg/m3)\", \"dT/dt (K/s)\""
    ));

    let data: Vec<&str> = text
        .lines()
        .skip_while(|l| !l.starts_with("Variables"))
        .skip(1)
        .collect();
    assert_eq!(data.len(), profile.len());
    assert!(data.iter().all(|row| row.split('\t').count() == 5));
}

#[test]
fn znd_report_and_summary_saved() {
    let gas = IdealGasMixture::hydrogen_air().unwrap();
    let s1 = h2_air(&gas, 298.15, 1.0);
    let (_, profile) = znd_behind_shock(
        &gas,
        &s1,
        2000.0,
        &ShockConfig::default(),
        &IntegrationOptions::default().with_t_end(1e-6),
    )
    .unwrap();
    let ts = profile.timescales().unwrap();
    let initial = InitialConditions::of(&gas, &s1);
    let report = zone_report(&profile, initial.clone(), &ts, date());

    let dir = unique_temp_dir("sf_results_znd");
    let report_path = dir.join("h2air_znd.txt");
    report.save(&report_path).unwrap();
    let text = fs::read_to_string(&report_path).unwrap();
    assert!(text.starts_with("# ZND: DETONATION STRUCTURE CALCULATION\n"));
    assert!(text.contains("# SHOCK SPEED (M/S) 2000.00"));
    assert!(text.contains("# Induction zone length (m) ="));
    let header = text.lines().find(|l| l.starts_with("Variables")).unwrap();
    assert_eq!(header.matches("\", \"").count() + 1, report.columns.len());

    let summary = ZoneSummary::new(&profile, initial, ts);
    let summary_path = dir.join("h2air_znd.json");
    save_json(&summary, &summary_path).unwrap();
    let loaded: ZoneSummary = load_json(&summary_path).unwrap();
    assert_eq!(loaded, summary);
    assert_eq!(loaded.samples, profile.len());

    fs::remove_dir_all(&dir).unwrap();
}
