//! Text reports: a `#`-commented header block, a `Variables = ...` line and
//! tab-separated data rows.

use crate::{ResultsError, ResultsResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sf_core::constants::ONE_ATM_PA;
use sf_gas::{GasModel, GasState};
use sf_zone::{
    Boundary, DerivedTimescales, ExothermicPulse, InductionPoint, IntegrationStatus,
    ReactionZoneKind, ReactionZoneProfile,
};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Conditions printed in the header; the upstream state for shock-driven
/// profiles, the starting state for explosions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialConditions {
    pub temperature: f64,
    pub pressure: f64,
    pub density: f64,
    /// `name:fraction` pairs separated by spaces
    pub mole_fractions: String,
}

impl InitialConditions {
    pub fn of(model: &dyn GasModel, state: &GasState) -> Self {
        let x = model.mole_fractions(state);
        let mole_fractions = x
            .iter()
            .enumerate()
            .filter(|(_, xk)| **xk > 0.0)
            .map(|(k, xk)| format!("{}:{xk:.4}", model.species_name(k)))
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            temperature: state.temperature(),
            pressure: state.pressure(),
            density: state.density(),
            mole_fractions,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub title: String,
    pub date: NaiveDate,
    pub initial: InitialConditions,
    pub shock_speed: Option<f64>,
    /// Extra header lines, written after the initial conditions
    pub notes: Vec<String>,
    pub columns: Vec<Column>,
}

impl Report {
    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn write_to<W: Write>(&self, mut out: W) -> ResultsResult<()> {
        if let Some(bad) = self.columns.iter().find(|c| c.values.len() != self.rows()) {
            return Err(ResultsError::RaggedColumns {
                column: bad.name.clone(),
                expected: self.rows(),
                got: bad.values.len(),
            });
        }
        let init = &self.initial;
        writeln!(out, "# {}", self.title)?;
        writeln!(out, "# CALCULATION RUN ON {}", self.date.format("%B %d, %Y"))?;
        writeln!(out)?;
        writeln!(out, "# INITIAL CONDITIONS")?;
        writeln!(out, "# TEMPERATURE (K) {:.1}", init.temperature)?;
        writeln!(out, "# PRESSURE (ATM) {:.1}", init.pressure / ONE_ATM_PA)?;
        writeln!(out, "# DENSITY (KG/M^3) {:.4e}", init.density)?;
        writeln!(out, "# SPECIES MOLE FRACTIONS: {}", init.mole_fractions)?;
        if let Some(u) = self.shock_speed {
            writeln!(out, "# SHOCK SPEED (M/S) {u:.2}")?;
        }
        writeln!(out)?;
        for note in &self.notes {
            writeln!(out, "# {note}")?;
        }
        if !self.notes.is_empty() {
            writeln!(out)?;
        }
        writeln!(out, "# REACTION ZONE STRUCTURE")?;
        writeln!(out)?;
        writeln!(out, "# THE OUTPUT DATA COLUMNS ARE:")?;
        let names: Vec<String> = self.columns.iter().map(|c| format!("\"{}\"", c.name)).collect();
        writeln!(out, "Variables = {}", names.join(", "))?;
        for i in 0..self.rows() {
            let row: Vec<String> = self
                .columns
                .iter()
                .map(|c| format!("{:.6e}", c.values[i]))
                .collect();
            writeln!(out, "{}", row.join("\t"))?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn to_text(&self) -> ResultsResult<String> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn save(&self, path: &Path) -> ResultsResult<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = fs::File::create(path)?;
        self.write_to(std::io::BufWriter::new(file))
    }
}

fn boundary_note(ind: &InductionPoint) -> Option<String> {
    match ind {
        InductionPoint::Interior(_) => None,
        InductionPoint::AtBoundary { boundary, .. } => {
            let end = match boundary {
                Boundary::Start => "start",
                Boundary::End => "end",
            };
            Some(format!("WARNING: peak at the {end} of the profile; induction value is a fallback"))
        }
    }
}

fn status_notes(profile: &ReactionZoneProfile) -> Vec<String> {
    let mut notes = Vec::new();
    match profile.status {
        IntegrationStatus::Completed => {}
        IntegrationStatus::Stopped { reason, t } => {
            notes.push(format!("Integration stopped at t = {t:.4e} s ({reason:?})"))
        }
        IntegrationStatus::Truncated { cause, t } => notes.push(format!(
            "WARNING: integration truncated at t = {t:.4e} s ({cause:?}); profile is partial"
        )),
    }
    if profile.tolerance_not_met {
        notes.push("WARNING: integration tolerance not met on some steps".to_string());
    }
    notes
}

fn atm_column(profile: &ReactionZoneProfile) -> Vec<f64> {
    profile.column(|s| s.pressure / ONE_ATM_PA)
}

/// Report for a reaction-zone profile, with header and columns chosen by
/// the profile's kind.
pub fn zone_report(
    profile: &ReactionZoneProfile,
    initial: InitialConditions,
    timescales: &DerivedTimescales,
    date: NaiveDate,
) -> Report {
    let peak = match timescales.induction.location() {
        Ok(loc) | Err(loc) => *loc,
    };
    let mut notes = status_notes(profile);
    notes.extend(boundary_note(&timescales.induction));
    if timescales.exothermic == ExothermicPulse::NoPulse {
        notes.push("WARNING: no exothermic pulse; exothermic value set to 0".to_string());
    }

    let (title, shock_speed, columns) = match profile.kind {
        ReactionZoneKind::Znd { shock_speed, .. } => {
            notes.push(format!("Induction zone length (m) =   {:.4e}", peak.distance));
            notes.push(format!("Induction time (s) =   {:.4e}", peak.time));
            notes.push(format!(
                "Exothermic length (m) =   {:.4e}",
                timescales.exothermic.distance()
            ));
            notes.push(format!("Exothermic time (s) =   {:.4e}", timescales.exothermic.time()));
            notes.push(format!("Maximum thermicity (1/s) =   {:.4e}", peak.value));
            let columns = vec![
                Column::new("Distance (m)", profile.distances()),
                Column::new("Mach Number", profile.column(|s| s.mach)),
                Column::new("Time (s)", profile.times()),
                Column::new("Pressure (atm)", atm_column(profile)),
                Column::new("Temperature (K)", profile.column(|s| s.temperature)),
                Column::new("Density (kg/m3)", profile.column(|s| s.density)),
                Column::new("Flow speed (m/s)", profile.column(|s| s.speed)),
                Column::new("Lab-frame velocity (m/s)", profile.column(|s| s.lab_speed)),
                Column::new("Sound speed (frozen) (m/s)", profile.column(|s| s.sound_speed)),
                Column::new("Gamma (frozen)", profile.column(|s| s.gamma)),
                Column::new("Molar mass (kg/kmol)", profile.column(|s| s.molar_mass)),
                Column::new("Thermicity (1/s)", profile.column(|s| s.thermicity)),
            ];
            ("ZND: DETONATION STRUCTURE CALCULATION", Some(shock_speed), columns)
        }
        ReactionZoneKind::Stagnation {
            shock_speed,
            standoff,
            ..
        } => {
            notes.push(format!("Standoff distance (m) =   {standoff:.4e}"));
            notes.push(format!("Induction distance (m) =   {:.4e}", peak.distance));
            notes.push(format!("Induction time (s) =   {:.4e}", peak.time));
            notes.push(format!("Exothermic time (s) =   {:.4e}", timescales.exothermic.time()));
            let columns = vec![
                Column::new("Distance (m)", profile.distances()),
                Column::new("Time (s)", profile.times()),
                Column::new("Flow speed (m/s)", profile.column(|s| s.speed)),
                Column::new("Pressure (atm)", atm_column(profile)),
                Column::new("Temperature (K)", profile.column(|s| s.temperature)),
                Column::new("Density (kg/m3)", profile.column(|s| s.density)),
                Column::new("Mach Number", profile.column(|s| s.mach)),
                Column::new("Thermicity (1/s)", profile.column(|s| s.thermicity)),
            ];
            ("STAGNATION POINT: REACTION ZONE STRUCTURE CALCULATION", Some(shock_speed), columns)
        }
        ReactionZoneKind::ConstantVolume | ReactionZoneKind::ConstantPressure => {
            notes.push("Induction Times".to_string());
            notes.push(format!("Time to Peak DTDt =   {:.4e}", peak.time));
            let onset = |t: Option<f64>| t.map_or_else(|| "n/a".to_string(), |t| format!("{t:.4e}"));
            notes.push(format!("Time to 0.1 Peak DTDt =   {}", onset(timescales.onset_10)));
            notes.push(format!("Time to 0.9 Peak DTDt =   {}", onset(timescales.onset_90)));
            notes.push(format!("Exothermic pulse time =   {:.4e}", timescales.exothermic.time()));
            let title = if profile.kind == ReactionZoneKind::ConstantVolume {
                "CV: EXPLOSION STRUCTURE CALCULATION"
            } else {
                "CP: EXPLOSION STRUCTURE CALCULATION"
            };
            let columns = vec![
                Column::new("Time (s)", profile.times()),
                Column::new("Temperature (K)", profile.column(|s| s.temperature)),
                Column::new("Pressure (atm)", atm_column(profile)),
                Column::new("Density (kg/m3)", profile.column(|s| s.density)),
                Column::new("dT/dt (K/s)", profile.column(|s| s.dtdt)),
            ];
            (title, None, columns)
        }
    };

    Report {
        title: title.to_string(),
        date,
        initial,
        shock_speed,
        notes,
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts every write, fails on flush.
    struct FailingFlush(Vec<u8>);

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("disk full"))
        }
    }

    fn sample_report() -> Report {
        Report {
            title: "TEST".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
            initial: InitialConditions {
                temperature: 300.0,
                pressure: ONE_ATM_PA,
                density: 0.8,
                mole_fractions: "H2:0.5000 O2:0.5000".to_string(),
            },
            shock_speed: Some(1968.354),
            notes: vec!["note".to_string()],
            columns: vec![
                Column::new("Time (s)", vec![0.0, 1e-6]),
                Column::new("Temperature (K)", vec![1500.0, 1510.0]),
            ],
        }
    }

    #[test]
    fn flush_failure_is_reported() {
        let mut sink = FailingFlush(Vec::new());
        let err = sample_report().write_to(&mut sink).unwrap_err();
        assert!(matches!(err, ResultsError::Io(_)), "{err:?}");
        assert!(sink.0.starts_with(b"# TEST\n"));
    }

    #[test]
    fn header_and_rows() {
        let text = sample_report().to_text().unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# TEST");
        assert_eq!(lines[1], "# CALCULATION RUN ON March 07, 2024");
        assert!(lines.contains(&"# TEMPERATURE (K) 300.0"));
        assert!(lines.contains(&"# PRESSURE (ATM) 1.0"));
        assert!(lines.contains(&"# SHOCK SPEED (M/S) 1968.35"));
        assert!(lines.contains(&"# note"));

        let var = lines.iter().position(|l| l.starts_with("Variables = ")).unwrap();
        assert_eq!(lines[var], "Variables = \"Time (s)\", \"Temperature (K)\"");
        let rows = &lines[var + 1..];
        assert_eq!(rows.len(), 2);
        let cells: Vec<f64> = rows[1].split('\t').map(|c| c.parse().unwrap()).collect();
        assert_eq!(cells, vec![1e-6, 1510.0]);
    }

    #[test]
    fn ragged_columns_rejected() {
        let mut report = sample_report();
        report.columns[1].values.pop();
        assert!(matches!(
            report.to_text(),
            Err(ResultsError::RaggedColumns { expected: 2, got: 1, .. })
        ));
    }
}
