mod case;
mod error;

use case::Case;
use clap::{Args, Parser, Subcommand};
use error::{CliError, CliResult};
use sf_gas::{GasState, IdealGasMixture};
use sf_results::{
    CjSummary, InitialConditions, ShockSummary, ZoneSummary, save_json, to_json, zone_report,
};
use sf_shock::{
    ThermoMode, cj_speed, cj_speed_batch, cj_state, post_shock, post_shock_frozen, reflected_shock,
};
use sf_zone::{ReactionZoneKind, ReactionZoneProfile, solve_reaction_zone};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(about = "shockflow - shock, detonation and reaction-zone calculations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Default)]
struct CaseArgs {
    /// YAML case file; flags below override its values
    #[arg(long)]
    case: Option<PathBuf>,
    /// Built-in mechanism name or mechanism file
    #[arg(long)]
    mechanism: Option<String>,
    /// Mixture as mole amounts, e.g. "H2:2 O2:1 N2:3.76"
    #[arg(long)]
    mixture: Option<String>,
    /// Initial pressure [Pa]
    #[arg(long)]
    pressure: Option<f64>,
    /// Initial temperature [K]
    #[arg(long)]
    temperature: Option<f64>,
    /// Shock speed [m/s]
    #[arg(long)]
    speed: Option<f64>,
    /// Use equilibrium instead of frozen composition behind shocks
    #[arg(long)]
    equilibrium: bool,
    /// Final integration time [s]
    #[arg(long)]
    t_end: Option<f64>,
    /// Path prefix for the report and JSON summary
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Print the JSON summary to stdout
    #[arg(long)]
    json: bool,
}

impl CaseArgs {
    fn resolve(&self) -> CliResult<Case> {
        let mut case = match &self.case {
            Some(path) => Case::load(path)?,
            None => Case::default(),
        };
        if let Some(m) = &self.mechanism {
            case.mechanism = m.clone();
        }
        if let Some(x) = &self.mixture {
            case.mixture = x.clone();
        }
        if let Some(p) = self.pressure {
            case.pressure_pa = p;
        }
        if let Some(t) = self.temperature {
            case.temperature_k = t;
        }
        if self.speed.is_some() {
            case.shock_speed = self.speed;
        }
        if self.equilibrium {
            case.mode = ThermoMode::Equilibrium;
        }
        if self.t_end.is_some() {
            case.integration.t_end = self.t_end;
        }
        if self.output.is_some() {
            case.output = self.output.clone();
        }
        Ok(case)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Post-shock state of an incident shock
    Shock {
        #[command(flatten)]
        args: CaseArgs,
    },
    /// Reflected shock off a closed end, behind an incident shock
    Reflected {
        #[command(flatten)]
        args: CaseArgs,
    },
    /// Chapman-Jouguet detonation speed and state
    Cj {
        #[command(flatten)]
        args: CaseArgs,
        /// Additional initial pressures [Pa] solved in parallel
        #[arg(long, value_delimiter = ',')]
        sweep: Vec<f64>,
    },
    /// ZND reaction zone behind a frozen shock
    Znd {
        #[command(flatten)]
        args: CaseArgs,
        /// Run at this multiple of the CJ speed instead of --speed
        #[arg(long)]
        overdrive: Option<f64>,
    },
    /// Constant-volume explosion (behind a frozen shock when --speed is set)
    Cv {
        #[command(flatten)]
        args: CaseArgs,
    },
    /// Constant-pressure explosion (behind a frozen shock when --speed is set)
    Cp {
        #[command(flatten)]
        args: CaseArgs,
    },
    /// Stagnation-point reaction zone behind a bow shock
    Stagnation {
        #[command(flatten)]
        args: CaseArgs,
        /// Shock standoff distance [m]
        #[arg(long)]
        standoff: Option<f64>,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Shock { args } => cmd_shock(&args),
        Commands::Reflected { args } => cmd_reflected(&args),
        Commands::Cj { args, sweep } => cmd_cj(&args, &sweep),
        Commands::Znd { args, overdrive } => cmd_znd(&args, overdrive),
        Commands::Cv { args } => cmd_explosion(&args, ReactionZoneKind::ConstantVolume),
        Commands::Cp { args } => cmd_explosion(&args, ReactionZoneKind::ConstantPressure),
        Commands::Stagnation { args, standoff } => cmd_stagnation(&args, standoff),
    };
    if let Err(e) = result {
        tracing::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn print_state(label: &str, state: &GasState) {
    println!(
        "  {label}: T = {:.2} K, P = {:.5e} Pa, rho = {:.5e} kg/m3",
        state.temperature(),
        state.pressure(),
        state.density()
    );
}

fn emit_json<T: serde::Serialize>(args: &CaseArgs, case: &Case, value: &T) -> CliResult<()> {
    if args.json {
        println!("{}", to_json(value)?);
    }
    if let Some(path) = case.output_path(".json") {
        save_json(value, &path)?;
        println!("✓ Summary written to {}", path.display());
    }
    Ok(())
}

fn cmd_shock(args: &CaseArgs) -> CliResult<()> {
    let case = args.resolve()?;
    let gas = case.gas()?;
    let s1 = case.initial_state(&gas)?;
    let speed = case.shock_speed()?;

    let sol = post_shock(&gas, &s1, speed, case.mode, &case.shock)?;
    println!("Incident shock at {speed:.2} m/s ({})", case.mode.label());
    print_state("state 1", &s1);
    print_state("state 2", &sol.state);
    println!(
        "  P2/P1 = {:.4}, rho2/rho1 = {:.4}, u2 (lab) = {:.2} m/s",
        sol.pressure_ratio(&s1),
        sol.density_ratio(&s1),
        sol.particle_speed(&s1)
    );
    if !sol.converged {
        println!("  WARNING: not converged after {} iterations", sol.iterations);
    }
    emit_json(args, &case, &ShockSummary::incident(&sol))
}

fn cmd_reflected(args: &CaseArgs) -> CliResult<()> {
    let case = args.resolve()?;
    let gas = case.gas()?;
    let s1 = case.initial_state(&gas)?;
    let speed = case.shock_speed()?;

    let incident = post_shock(&gas, &s1, speed, case.mode, &case.shock)?;
    let reflected = reflected_shock(&gas, &s1, &incident, case.mode, &case.shock)?;
    println!("Reflected shock behind {speed:.2} m/s incident ({})", case.mode.label());
    print_state("state 2", &incident.state);
    print_state("state 3", &reflected.state);
    println!(
        "  reflected speed = {:.2} m/s, u2 = {:.2} m/s",
        reflected.reflected_speed, reflected.particle_speed
    );
    if !reflected.converged {
        println!("  WARNING: not converged after {} iterations", reflected.iterations);
    }
    emit_json(args, &case, &ShockSummary::reflected(&reflected))
}

fn cmd_cj(args: &CaseArgs, sweep: &[f64]) -> CliResult<()> {
    let case = args.resolve()?;
    let gas = case.gas()?;
    let s1 = case.initial_state(&gas)?;

    let cj = cj_speed(&gas, &s1, &case.cj)?;
    println!(
        "CJ speed = {:.2} m/s (±{:.2}), rho2/rho1 = {:.4}, R² = {:.6}, {} refinements",
        cj.speed, cj.uncertainty, cj.density_ratio, cj.fit.r_squared, cj.refinements
    );
    if !cj.status.is_converged() {
        println!("  WARNING: fit tolerance not met");
    }
    let state = cj_state(&gas, &s1, &cj, &case.shock)?;
    print_state("CJ state", &state.state);

    if !sweep.is_empty() {
        let states = sweep
            .iter()
            .map(|&p| {
                let point = Case {
                    pressure_pa: p,
                    ..case.clone()
                };
                point.initial_state(&gas)
            })
            .collect::<CliResult<Vec<_>>>()?;
        println!("Pressure sweep:");
        for (p, result) in sweep.iter().zip(cj_speed_batch(&gas, &states, &case.cj)) {
            match result {
                Ok(r) => println!("  P1 = {p:.5e} Pa: U_CJ = {:.2} m/s", r.speed),
                Err(e) => println!("  P1 = {p:.5e} Pa: failed ({e})"),
            }
        }
    }
    emit_json(args, &case, &CjSummary::from(&cj))
}

/// Report, summary and console output shared by the reaction-zone commands.
fn finish_zone(
    args: &CaseArgs,
    case: &Case,
    gas: &IdealGasMixture,
    header_state: &GasState,
    profile: &ReactionZoneProfile,
    suffix: &str,
) -> CliResult<()> {
    let timescales = profile.timescales()?;
    let initial = InitialConditions::of(gas, header_state);
    let peak = match timescales.induction.location() {
        Ok(loc) => *loc,
        Err(loc) => {
            println!("  WARNING: signal peak on the profile boundary");
            *loc
        }
    };
    println!(
        "{}: {} samples, status {:?}",
        profile.kind.label(),
        profile.len(),
        profile.status
    );
    println!(
        "  induction time = {:.4e} s, distance = {:.4e} m",
        peak.time, peak.distance
    );
    println!("  exothermic time = {:.4e} s", timescales.exothermic.time());
    if let Some(last) = profile.last() {
        println!("  final T = {:.2} K at t = {:.4e} s", last.temperature, last.time);
    }

    if let Some(path) = case.output_path(&format!("_{suffix}.txt")) {
        let date = chrono::Local::now().date_naive();
        zone_report(profile, initial.clone(), &timescales, date).save(&path)?;
        println!("✓ Report written to {}", path.display());
    }
    let summary = ZoneSummary::new(profile, initial, timescales);
    let json_case = Case {
        output: case.output_path(&format!("_{suffix}")),
        ..case.clone()
    };
    emit_json(args, &json_case, &summary)
}

fn cmd_znd(args: &CaseArgs, overdrive: Option<f64>) -> CliResult<()> {
    let case = args.resolve()?;
    let gas = case.gas()?;
    let s1 = case.initial_state(&gas)?;
    let speed = match overdrive {
        Some(f) => {
            let cj = cj_speed(&gas, &s1, &case.cj)?;
            println!("CJ speed = {:.2} m/s, running at {f} x CJ", cj.speed);
            f * cj.speed
        }
        None => case.shock_speed()?,
    };

    let shock = post_shock_frozen(&gas, &s1, speed, &case.shock)?;
    if !shock.converged {
        return Err(CliError::Missing("converged frozen shock state"));
    }
    print_state("von Neumann state", &shock.state);
    let kind = ReactionZoneKind::Znd {
        upstream_density: s1.density(),
        shock_speed: speed,
    };
    let profile = solve_reaction_zone(&gas, &shock.state, kind, &case.integration)?;
    finish_zone(args, &case, &gas, &s1, &profile, "znd")
}

fn cmd_explosion(args: &CaseArgs, kind: ReactionZoneKind) -> CliResult<()> {
    let case = args.resolve()?;
    let gas = case.gas()?;
    let s0 = case.initial_state(&gas)?;
    let start = match case.shock_speed {
        Some(speed) => {
            let shock = post_shock_frozen(&gas, &s0, speed, &case.shock)?;
            print_state("post-shock state", &shock.state);
            shock.state
        }
        None => s0.clone(),
    };
    let profile = solve_reaction_zone(&gas, &start, kind, &case.integration)?;
    let suffix = match kind {
        ReactionZoneKind::ConstantPressure => "cp",
        _ => "cv",
    };
    finish_zone(args, &case, &gas, &s0, &profile, suffix)
}

fn cmd_stagnation(args: &CaseArgs, standoff: Option<f64>) -> CliResult<()> {
    let case = args.resolve()?;
    let gas = case.gas()?;
    let s1 = case.initial_state(&gas)?;
    let speed = case.shock_speed()?;
    let standoff = standoff
        .or(case.standoff_m)
        .ok_or(CliError::Missing("standoff distance (--standoff or standoff_m)"))?;

    let shock = post_shock_frozen(&gas, &s1, speed, &case.shock)?;
    print_state("post-shock state", &shock.state);
    let kind = ReactionZoneKind::Stagnation {
        upstream_density: s1.density(),
        shock_speed: speed,
        standoff,
    };
    let profile = solve_reaction_zone(&gas, &shock.state, kind, &case.integration)?;
    finish_zone(args, &case, &gas, &s1, &profile, "stg")
}
