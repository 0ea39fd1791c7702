use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use gifscope_core::{DecodeOptions, Report};
use glob::glob;
use tracing::Level;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIFSCOPE_BUILD_COMMIT"),
    " ",
    env!("GIFSCOPE_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "gifscope")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Offline decoder and inspector for GIF89a files.",
    long_about = None,
    after_help = "Examples:\n  gifscope inspect anim.gif -o report.json\n  gifscope inspect anim.gif --stdout --pretty\n  gifscope indexes anim.gif --frame 2"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a GIF and write a versioned JSON report.
    #[command(alias = "analyze")]
    Inspect(InspectArgs),
    /// Print the color indexes of one frame, one row per line.
    Indexes(IndexesArgs),
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Path to a .gif file (glob patterns must match exactly one file)
    input: PathBuf,

    /// Output report path (JSON)
    #[arg(short = 'o', long, required_unless_present = "stdout")]
    report: Option<PathBuf>,

    /// Write JSON report to stdout
    #[arg(long, conflicts_with = "report")]
    stdout: bool,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,

    /// Exit with a non-zero code if any frame had to be zero-padded
    #[arg(long)]
    strict: bool,

    /// List frame geometry and padding after decoding
    #[arg(long)]
    list_frames: bool,

    /// Keep interlaced frames in transmission order
    #[arg(long)]
    no_deinterlace: bool,
}

#[derive(Args, Debug)]
struct IndexesArgs {
    /// Path to a .gif file
    input: PathBuf,

    /// Zero-based frame number
    #[arg(long, default_value_t = 0)]
    frame: usize,

    /// Keep interlaced frames in transmission order
    #[arg(long)]
    no_deinterlace: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Inspect(args) => {
            init_logging(cli.verbose, args.quiet);
            cmd_inspect(args)
        }
        Commands::Indexes(args) => {
            init_logging(cli.verbose, false);
            cmd_indexes(args)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        // keep the cause chain, e.g. "GIF decoding failed: GIF container error: ..."
        CliError::new(format!("{:#}", err), None)
    }
}

fn cmd_inspect(args: InspectArgs) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&args.input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;

    let report_path = match (args.stdout, args.report) {
        (true, _) => None,
        (false, Some(path)) => Some(path),
        (false, None) => {
            return Err(CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            ));
        }
    };

    if let Some(report_path) = report_path.as_ref() {
        ensure_distinct_output(report_path, &input_abs)?;
    }

    let options = DecodeOptions {
        deinterlace: !args.no_deinterlace,
    };
    let rep = gifscope_core::analyze_gif_file_with(&resolved_input, &options)
        .context("GIF decoding failed")?;
    let json = serialize_report(&rep, args.pretty, args.compact)?;

    match report_path {
        None => print!("{}", json),
        Some(report_path) => {
            if let Some(parent) = report_path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            fs::write(&report_path, json)
                .with_context(|| format!("Failed to write report: {}", report_path.display()))?;
            if !args.quiet {
                eprintln!("OK: report written -> {}", report_path.display());
            }
        }
    }

    if args.list_frames && !args.quiet {
        print_frames(&rep);
    }
    if args.strict && has_padded_frames(&rep) {
        return Err(CliError::new(
            "incomplete frames detected",
            Some("use --list-frames to inspect".to_string()),
        ));
    }
    Ok(())
}

fn cmd_indexes(args: IndexesArgs) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&args.input)?;
    validate_input_file(&resolved_input)?;

    let data = fs::read(&resolved_input)
        .with_context(|| format!("Failed to read input file: {}", resolved_input.display()))?;
    let options = DecodeOptions {
        deinterlace: !args.no_deinterlace,
    };
    let gif = gifscope_core::decode_bytes_with(&data, &options).context("GIF decoding failed")?;

    let frame_count = gif.frames.len();
    let decoded = gif.frames.get(args.frame).ok_or_else(|| {
        CliError::new(
            format!("frame {} out of range ({} frames)", args.frame, frame_count),
            Some("frames are numbered from 0".to_string()),
        )
    })?;

    let width = (decoded.frame.descriptor.width as usize).max(1);
    let mut out = String::with_capacity(decoded.color_indexes.len() * 4);
    for row in decoded.color_indexes.chunks(width) {
        let line = row
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&line);
        out.push('\n');
    }
    print!("{}", out);
    Ok(())
}

fn ensure_distinct_output(report_path: &Path, input_abs: &Path) -> Result<(), CliError> {
    let report_dir = report_path
        .parent()
        .map(|parent| {
            if parent.as_os_str().is_empty() {
                fs::canonicalize(".")
            } else {
                fs::canonicalize(parent)
            }
        })
        .transpose()
        .with_context(|| format!("Failed to resolve output path: {}", report_path.display()))?;
    let Some(report_dir) = report_dir else {
        return Ok(());
    };
    let file_name = report_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid report path"))?;
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!(
                "report path must differ from input: {}",
                report_path.display()
            ),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn serialize_report(rep: &Report, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    let json = if pretty {
        serde_json::to_string_pretty(rep)
    } else {
        serde_json::to_string(rep)
    };
    json.context("JSON serialization failed").map_err(Into::into)
}

fn has_padded_frames(rep: &Report) -> bool {
    rep.frames.iter().any(|frame| frame.padded_pixels > 0)
}

fn print_frames(rep: &Report) {
    eprintln!("Frames:");
    for frame in &rep.frames {
        let mut line = format!(
            "  #{} {}x{} at ({},{}) delay={} padded={}",
            frame.index,
            frame.width,
            frame.height,
            frame.left,
            frame.top,
            frame.delay_time,
            frame.padded_pixels
        );
        if let Some(err) = &frame.lzw_error {
            line.push_str(&format!(" ({})", err));
        }
        eprintln!("{}", line);
    }
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .gif file".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .gif file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "gif" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .gif file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.len() > 1 {
        let mut message = format!(
            "multiple files match pattern '{}' ({} matches); matches: ",
            pattern,
            matches.len()
        );
        message.push_str(
            &matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        );
        if matches.len() > 3 {
            message.push_str(", ...");
        }
        return Err(CliError::new(
            message,
            Some("pass a single GIF file, or run once per file".to_string()),
        ));
    }

    matches.pop().ok_or_else(|| {
        CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected a .gif file".to_string()),
        )
    })
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
