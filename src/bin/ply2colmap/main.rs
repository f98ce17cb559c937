//! ply2colmap CLI - Convert PLY point clouds into COLMAP points3D.txt files.

use ply2colmap::backup::create_backup;
use ply2colmap::convert::{convert_with, group_digits, ConvertOptions, NoProgress};
use ply2colmap::ply::PlyReader;
use ply2colmap::settings::Settings;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Verbosity selected on the command line.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Verbosity {
    Quiet,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Flags shared by all commands.
struct Flags {
    verbosity: Verbosity,
    backup: Option<bool>,
    use_mmap: Option<bool>,
}

fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            let level = verbosity.directive();
            EnvFilter::new(format!("ply2colmap={level},ply2colmap_cli={level}"))
        });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init();
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut flags = Flags {
        verbosity: Verbosity::Info,
        backup: None,
        use_mmap: None,
    };
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => flags.verbosity = Verbosity::Debug,
            "-vv" | "--trace" => flags.verbosity = Verbosity::Trace,
            "-q" | "--quiet" => flags.verbosity = Verbosity::Quiet,
            "--backup" => flags.backup = Some(true),
            "--no-backup" => flags.backup = Some(false),
            "--no-mmap" => flags.use_mmap = Some(false),
            _ => filtered_args.push(arg),
        }
    }

    init_logging(flags.verbosity);

    let Some(&command) = filtered_args.first() else {
        // No arguments: reconvert the last input if there is one
        return cmd_convert(None, None, &flags);
    };

    match command {
        "convert" | "c" => {
            let input = filtered_args.get(1).map(PathBuf::from);
            let output = filtered_args.get(2).map(PathBuf::from);
            cmd_convert(input, output, &flags)
        }
        "info" | "i" => {
            let Some(input) = filtered_args.get(1) else {
                eprintln!("Error: missing file argument");
                eprintln!("Usage: ply2colmap-cli info <file.ply>");
                return ExitCode::FAILURE;
            };
            cmd_info(Path::new(input))
        }
        "recent" | "r" => cmd_recent(),
        "version" | "-V" | "--version" => {
            print_version();
            ExitCode::SUCCESS
        }
        "help" | "h" | "-h" | "--help" => {
            print_help();
            ExitCode::SUCCESS
        }
        // Default: if file exists, convert it; otherwise error
        _ => {
            if Path::new(command).exists() {
                let output = filtered_args.get(1).map(PathBuf::from);
                cmd_convert(Some(PathBuf::from(command)), output, &flags)
            } else {
                eprintln!("Unknown command: {}", command);
                eprintln!();
                print_help();
                ExitCode::FAILURE
            }
        }
    }
}

fn print_help() {
    println!("ply2colmap - PLY point cloud to COLMAP points3D.txt converter");
    println!();
    println!("USAGE:");
    println!("    ply2colmap-cli [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    c, convert [in] [out]         Convert a PLY file (default: last input)");
    println!("    i, info    <file>             Show the parsed PLY header");
    println!("    r, recent                     List recently converted files");
    println!("    version                       Show version and build date");
    println!("    h, help                       Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only show warnings and errors");
    println!("    --backup         Copy the input aside before converting");
    println!("    --no-backup      Skip the backup copy");
    println!("    --no-mmap        Read binary bodies without memory mapping");
    println!();
    println!("EXAMPLES:");
    println!("    ply2colmap-cli convert scan/cloud.ply            # writes scan/points3D.txt");
    println!("    ply2colmap-cli convert cloud.ply sparse/0/points3D.txt");
    println!("    ply2colmap-cli info cloud.ply");
    println!();
    println!("NOTES:");
    println!("    - Passing a .ply file directly is equivalent to 'convert'");
    println!("    - RUST_LOG overrides the verbosity flags");
    println!("    - Settings are kept in the user config directory (ply2colmap/settings.json)");
}

fn print_version() {
    println!(
        "ply2colmap {} (built {})",
        env!("CARGO_PKG_VERSION"),
        env!("PLY2COLMAP_BUILD_STAMP")
    );
}

fn cmd_convert(input: Option<PathBuf>, output: Option<PathBuf>, flags: &Flags) -> ExitCode {
    let mut settings = Settings::load();

    let Some(input) = input.or_else(|| settings.last_input.clone()) else {
        eprintln!("Error: no input file given and no previous input remembered");
        eprintln!("Usage: ply2colmap-cli convert <input.ply> [output.txt]");
        return ExitCode::FAILURE;
    };

    if !input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ply"))
    {
        warn!("{} does not have a .ply extension", input.display());
    }

    let mut options: ConvertOptions = settings.convert.clone();
    if let Some(use_mmap) = flags.use_mmap {
        options.use_mmap = use_mmap;
    }

    if flags.backup.unwrap_or(settings.backup) {
        match create_backup(&input) {
            Ok(backup) => info!(
                "Backup of source file: {} ({:.1} MB)",
                backup.path.display(),
                backup.size as f64 / (1024.0 * 1024.0)
            ),
            Err(e) => warn!("Backup not created, converting anyway: {}", e),
        }
    }

    match convert_with(&input, output.as_deref(), &options, &mut NoProgress) {
        Ok(report) => {
            if report.truncated {
                warn!(
                    "Input ended early: {} of {} declared points present",
                    group_digits(report.processed),
                    group_digits(report.declared)
                );
            }
            info!("CONVERSION COMPLETED SUCCESSFULLY");

            settings.add_recent(input);
            if let Err(e) = settings.save() {
                debug!("could not save settings: {}", e);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_recent() -> ExitCode {
    let settings = Settings::load();
    let recent = settings.recent_inputs();
    if recent.is_empty() {
        println!("No recent files.");
        return ExitCode::SUCCESS;
    }
    for (i, path) in recent.iter().enumerate() {
        let marker = if settings.last_input.as_ref() == Some(*path) { "*" } else { " " };
        println!("{} {:>2}. {}", marker, i + 1, path.display());
    }
    ExitCode::SUCCESS
}

fn cmd_info(path: &Path) -> ExitCode {
    let reader = match PlyReader::open(path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to open {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let header = reader.header();
    let layout = reader.layout();

    println!("File:      {}", path.display());
    println!("Size:      {} bytes", group_digits(reader.size()));
    println!("Encoding:  {}", header.encoding);
    println!("Vertices:  {}", group_digits(header.record_count));
    println!("Body at:   byte {}", header.data_offset);
    println!();
    println!("Elements:");
    for element in &header.elements {
        match element.row_width {
            Some(width) => println!("  {:<12} {:>14} rows, {} bytes each", element.name, group_digits(element.count), width),
            None => println!("  {:<12} {:>14} rows, variable width", element.name, group_digits(element.count)),
        }
    }
    println!();
    println!("Vertex fields:");
    for (idx, field) in header.fields.iter().enumerate() {
        let role = if layout.position.contains(&idx) {
            "  (position)"
        } else if layout.color.is_some_and(|c| c.contains(&idx)) {
            "  (colour)"
        } else {
            ""
        };
        println!("  {:<12} {:<8}{}", field.name, field.kind, role);
    }
    if !layout.has_color() {
        println!();
        println!("No complete colour fields: points get the default colour.");
    }

    ExitCode::SUCCESS
}
