use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use collinear::{cfg, CollinearCfg, CollinearityEngine, KeyPolicy, Line, LineRecord, Point};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::SubscriberBuilder;

mod csv_io;
mod provenance;

#[derive(Parser, Debug)]
#[command(name = "collinear-cli")]
#[command(about = "Report every group of three or more collinear points")]
struct Cmd {
    /// CSV input, one `x,y` pair per row (stdin if absent or `-`)
    input: Option<PathBuf>,

    /// CSV output, one `id,x1,y1,...` row per line (stdout if absent or `-`)
    output: Option<PathBuf>,

    /// Relative tolerance for slope comparison
    #[arg(long, default_value_t = cfg::REL_TOL, value_parser = parse_tol)]
    rel_tol: f64,

    /// Absolute tolerance for slope comparison
    #[arg(long, default_value_t = cfg::ABS_TOL, value_parser = parse_tol)]
    abs_tol: f64,

    /// Smallest group to report
    #[arg(long, default_value_t = cfg::MIN_POINTS, value_parser = parse_min_points)]
    min_points: usize,

    /// Merge lines whose slope/intercept differ only within tolerance
    #[arg(long)]
    tolerant_keys: bool,

    /// Write `<output-stem>.provenance.json` next to the output file
    #[arg(long)]
    provenance: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace); logs go to stderr
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cmd {
    fn cfg(&self) -> CollinearCfg {
        CollinearCfg {
            rel_tol: self.rel_tol,
            abs_tol: self.abs_tol,
            min_points: self.min_points,
            keys: if self.tolerant_keys {
                KeyPolicy::Tolerant
            } else {
                KeyPolicy::Exact
            },
        }
    }

    fn input_path(&self) -> Option<&Path> {
        file_arg(self.input.as_deref())
    }

    fn output_path(&self) -> Option<&Path> {
        file_arg(self.output.as_deref())
    }
}

/// `-` means the standard stream.
fn file_arg(p: Option<&Path>) -> Option<&Path> {
    p.filter(|p| p.as_os_str() != "-")
}

fn parse_tol(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if !(v.is_finite() && v >= 0.0) {
        return Err(format!("tolerance must be finite and >= 0, got {v}"));
    }
    Ok(v)
}

fn parse_min_points(s: &str) -> Result<usize, String> {
    let v: usize = s.parse().map_err(|e| format!("{e}"))?;
    if v < 2 {
        return Err(format!("a line has at least 2 points, got {v}"));
    }
    Ok(v)
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    SubscriberBuilder::default()
        .with_target(false)
        .with_writer(io::stderr)
        .with_max_level(log_level(cmd.verbose))
        .init();
    run(&cmd)
}

fn run(cmd: &Cmd) -> Result<()> {
    let cfg = cmd.cfg();
    let input = display_name(cmd.input_path(), "stdin");
    let points = load(cmd.input_path())?;
    info!(input, points = points.len(), "input loaded");

    // Open the sink before computing so an unwritable destination fails early.
    let sink = open_sink(cmd.output_path())?;

    let mut engine = CollinearityEngine::with_cfg(&points, cfg);
    engine.sweep_points();
    let records: Vec<LineRecord> = engine.collinear_lines().map(Line::to_record).collect();
    let stats = engine.stats();
    info!(
        pairs = stats.pairs,
        degenerate_pairs = stats.degenerate_pairs,
        lines = stats.lines_discovered,
        emitted = records.len(),
        "grouping done"
    );

    let output = display_name(cmd.output_path(), "stdout");
    csv_io::write_records(sink, &records).with_context(|| format!("writing {output}"))?;
    info!(output, rows = records.len(), "output written");

    if cmd.provenance {
        match cmd.output_path() {
            Some(out) => {
                let payload = provenance::Payload::new(input, &cfg, stats, records.len());
                let path = provenance::write_sidecar(out, &payload)?;
                info!(path = %path.display(), "provenance written");
            }
            None => warn!("--provenance needs an output file; skipped"),
        }
    }
    Ok(())
}

fn display_name(path: Option<&Path>, fallback: &str) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| fallback.to_string())
}

fn load(path: Option<&Path>) -> Result<Vec<Point>> {
    match path {
        Some(p) => {
            let file =
                File::open(p).with_context(|| format!("opening input {}", p.display()))?;
            csv_io::read_points(file).with_context(|| format!("reading {}", p.display()))
        }
        None => csv_io::read_points(io::stdin().lock()).context("reading stdin"),
    }
}

fn open_sink(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(p) => {
            if let Some(parent) = p.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("creating output dir {}", parent.display()))?;
                }
            }
            let file =
                File::create(p).with_context(|| format!("creating output {}", p.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> Cmd {
        let mut full = vec!["collinear-cli"];
        full.extend_from_slice(args);
        Cmd::try_parse_from(full).unwrap()
    }

    #[test]
    fn defaults_match_library() {
        let cmd = parse(&[]);
        let cfg = cmd.cfg();
        let lib = CollinearCfg::default();
        assert_eq!(cfg.rel_tol, lib.rel_tol);
        assert_eq!(cfg.abs_tol, lib.abs_tol);
        assert_eq!(cfg.min_points, lib.min_points);
        assert_eq!(cfg.keys, KeyPolicy::Exact);
        assert!(cmd.input_path().is_none());
        assert!(cmd.output_path().is_none());
    }

    #[test]
    fn dash_means_standard_stream() {
        let cmd = parse(&["-", "-"]);
        assert!(cmd.input_path().is_none());
        assert!(cmd.output_path().is_none());
    }

    #[test]
    fn rejects_bad_options() {
        let bad = |args: &[&str]| {
            let mut full = vec!["collinear-cli"];
            full.extend_from_slice(args);
            Cmd::try_parse_from(full).is_err()
        };
        assert!(bad(&["--min-points", "1"]));
        assert!(bad(&["--rel-tol", "-1"]));
        assert!(bad(&["--abs-tol", "nan"]));
        assert!(!bad(&["--min-points", "2", "--tolerant-keys", "-vv"]));
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(log_level(0), Level::WARN);
        assert_eq!(log_level(1), Level::INFO);
        assert_eq!(log_level(5), Level::TRACE);
    }

    #[test]
    fn run_writes_groups_and_provenance() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("points.csv");
        let output = dir.path().join("out").join("lines.csv");
        fs::write(&input, "0,0\n1,1\n2,2\n0,1\n5,0\n5,3\n5,-2\n").unwrap();
        let cmd = parse(&[
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--provenance",
        ]);
        run(&cmd).unwrap();
        let text = fs::read_to_string(&output).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].ends_with(",0,0,1,1,2,2"));
        assert!(rows[1].ends_with(",5,0,5,3,5,-2"));
        assert!(dir.path().join("out").join("lines.provenance.json").exists());
    }

    #[test]
    fn malformed_input_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("points.csv");
        let output = dir.path().join("lines.csv");
        fs::write(&input, "0,0\n1,x\n").unwrap();
        let cmd = parse(&[input.to_str().unwrap(), output.to_str().unwrap()]);
        let err = run(&cmd).unwrap_err();
        assert!(format!("{err:#}").contains("not a number"));
        assert!(!output.exists());
    }

    #[test]
    fn missing_input_is_fatal() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("absent.csv");
        let output = dir.path().join("lines.csv");
        let cmd = parse(&[input.to_str().unwrap(), output.to_str().unwrap()]);
        let err = run(&cmd).unwrap_err();
        assert!(err.to_string().contains("opening input"));
    }
}
