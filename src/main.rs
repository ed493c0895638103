//! Tariff engine entry point — CLI wiring and config-driven pipeline.

use std::path::{Path, PathBuf};
use std::process;

use tariff_sim::config::{EngineConfig, ProfileConfig};
use tariff_sim::cost::batch::cost_all;
use tariff_sim::cost::residential;
use tariff_sim::cost::residential::ResidentialRate;
use tariff_sim::io::export::{export_cost_results, export_flags, export_residential_rates};
use tariff_sim::io::read_phrase_file;
use tariff_sim::profile::{LoadProfile, ProfileSummary};
use tariff_sim::tariff::classify::{classification_counts, classify_all};
use tariff_sim::tariff::filter::{
    FilterReport, retain_active, retain_costable_commercial, retain_no_demand, retain_rated,
    retain_unmatched,
};
use tariff_sim::tariff::record::TariffRecord;
use tariff_sim::urdb::RateDataset;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    rates_override: Option<String>,
    out_override: Option<String>,
    workers_override: Option<usize>,
    extra_profiles: Vec<(String, String)>,
}

fn print_help() {
    eprintln!("tariff-sim — levelized cost-of-charging tariff engine");
    eprintln!();
    eprintln!("Usage: tariff-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>       Load engine configuration from TOML file");
    eprintln!("  --rates <path>        Override the rate table path");
    eprintln!("  --profile <id=path>   Add a station load profile (repeatable)");
    eprintln!("  --out <dir>           Override the output directory");
    eprintln!("  --workers <n>         Override the worker count");
    eprintln!("  --help                Show this help message");
    eprintln!();
    eprintln!("Without --config, built-in defaults are used (see config module).");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        rates_override: None,
        out_override: None,
        workers_override: None,
        extra_profiles: Vec::new(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --config requires a path argument");
                    process::exit(1);
                }
                cli.config_path = Some(args[i].clone());
            }
            "--rates" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --rates requires a path argument");
                    process::exit(1);
                }
                cli.rates_override = Some(args[i].clone());
            }
            "--out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --out requires a directory argument");
                    process::exit(1);
                }
                cli.out_override = Some(args[i].clone());
            }
            "--workers" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --workers requires a count argument");
                    process::exit(1);
                }
                match args[i].parse::<usize>() {
                    Ok(n) => cli.workers_override = Some(n),
                    Err(_) => {
                        eprintln!("error: --workers value \"{}\" is not a valid count", args[i]);
                        process::exit(1);
                    }
                }
            }
            "--profile" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --profile requires an id=path argument");
                    process::exit(1);
                }
                match args[i].split_once('=') {
                    Some((id, path)) if !id.is_empty() && !path.is_empty() => {
                        cli.extra_profiles.push((id.to_string(), path.to_string()));
                    }
                    _ => {
                        eprintln!("error: --profile expects id=path, got \"{}\"", args[i]);
                        process::exit(1);
                    }
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Loads a phrase list, treating an unreadable file as fatal.
fn load_phrases(path: Option<&Path>) -> Vec<String> {
    match path {
        None => Vec::new(),
        Some(path) => read_phrase_file(path).unwrap_or_else(|e| {
            eprintln!("error: cannot read phrase file {}: {e}", path.display());
            process::exit(1);
        }),
    }
}

/// Residential pass: filter, classify, and estimate levelized rates.
fn run_residential(
    mut records: Vec<TariffRecord>,
    res_phrases: &[String],
    ev_phrases: &[String],
    out_dir: &Path,
) {
    let mut report = FilterReport::default();
    retain_active(&mut records, &mut report);
    retain_unmatched(&mut records, res_phrases, &mut report);
    let unclassifiable = classify_all(&mut records, ev_phrases);
    if unclassifiable > 0 {
        println!("residential: {unclassifiable} rates lack a decodable schedule");
    }
    let counts = classification_counts(&records);
    println!(
        "residential: {} demand / {} no-demand rates",
        counts.get("demand").copied().unwrap_or(0),
        counts.get("no_demand").copied().unwrap_or(0)
    );
    retain_rated(&mut records, &mut report);
    retain_no_demand(&mut records, &mut report);

    let mut rates: Vec<ResidentialRate> = Vec::new();
    let mut dropped = 0usize;
    for record in &records {
        match residential::levelized_rate(record) {
            Ok(rate) => rates.push(rate),
            Err(_) => dropped += 1,
        }
    }

    println!("residential: {report}");
    println!(
        "residential: estimated {} rates ({} dropped during estimation)",
        rates.len(),
        dropped
    );

    if let Err(e) = export_residential_rates(&rates, &out_dir.join("res_rates.csv")) {
        eprintln!("error: failed to write residential rates: {e}");
        process::exit(1);
    }
    if let Err(e) = export_flags(&records, &out_dir.join("res_rate_flags.csv")) {
        eprintln!("error: failed to write residential flags: {e}");
        process::exit(1);
    }
}

/// Commercial pass: filter, classify, and cost each station profile.
fn run_commercial(
    mut records: Vec<TariffRecord>,
    com_phrases: &[String],
    profiles: &[ProfileConfig],
    workers: usize,
    out_dir: &Path,
) {
    let mut report = FilterReport::default();
    retain_active(&mut records, &mut report);
    retain_unmatched(&mut records, com_phrases, &mut report);
    let unclassifiable = classify_all(&mut records, &[]);
    if unclassifiable > 0 {
        println!("commercial: {unclassifiable} rates lack a decodable schedule");
    }
    retain_costable_commercial(&mut records, &mut report);
    retain_rated(&mut records, &mut report);
    println!("commercial: {report}");

    if let Err(e) = export_flags(&records, &out_dir.join("com_rate_flags.csv")) {
        eprintln!("error: failed to write commercial flags: {e}");
        process::exit(1);
    }

    for profile_cfg in profiles {
        let profile = match LoadProfile::from_csv_path(&profile_cfg.path) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("error: profile \"{}\": {e}", profile_cfg.id);
                process::exit(1);
            }
        };
        let summary = ProfileSummary::from_profile(&profile);
        let outcome = cost_all(&records, &summary, workers);
        println!("{}: {}", profile_cfg.id, outcome.report);

        let out_path = out_dir.join(format!("dcfc_costs_{}.csv", profile_cfg.id));
        if let Err(e) = export_cost_results(&outcome.results, &out_path) {
            eprintln!("error: failed to write {}: {e}", out_path.display());
            process::exit(1);
        }
    }
}

fn main() {
    let cli = parse_args();

    let mut config = match cli.config_path {
        Some(ref path) => match EngineConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    if let Some(path) = cli.rates_override {
        config.dataset.rates_path = PathBuf::from(path);
    }
    if let Some(dir) = cli.out_override {
        config.output.dir = PathBuf::from(dir);
    }
    if let Some(n) = cli.workers_override {
        config.batch.workers = n;
    }
    for (id, path) in cli.extra_profiles {
        config.profiles.push(ProfileConfig {
            id,
            path: PathBuf::from(path),
        });
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    if let Err(e) = std::fs::create_dir_all(&config.output.dir) {
        eprintln!(
            "error: cannot create output directory {}: {e}",
            config.output.dir.display()
        );
        process::exit(1);
    }

    let dataset = match RateDataset::from_csv_path(&config.dataset.rates_path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    println!("dataset: {}", dataset.report);

    let res_phrases = load_phrases(config.filters.residential_exclusions.as_deref());
    let com_phrases = load_phrases(config.filters.commercial_exclusions.as_deref());
    let ev_phrases = load_phrases(config.filters.ev_rate_phrases.as_deref());

    let (residential_records, commercial_records) = dataset.into_sectors();
    run_residential(
        residential_records,
        &res_phrases,
        &ev_phrases,
        &config.output.dir,
    );
    run_commercial(
        commercial_records,
        &com_phrases,
        &config.profiles,
        config.effective_workers(),
        &config.output.dir,
    );
}
