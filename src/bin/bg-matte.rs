use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};

use bg_matte::{
    default_output_path, FilterParameters, MatteEngine, Mode, ProcessOptions, ProcessResult,
    WhitePolicy,
};

#[derive(Clone, Copy, ValueEnum)]
enum CliMode {
    /// Pick white or soft via the white-background heuristic
    Auto,
    /// White-background heuristic extraction (no model needed)
    White,
    /// Neural saliency mask, graded alpha
    Soft,
    /// Neural saliency mask, binary alpha
    Hard,
}

#[derive(Parser)]
#[command(
    name = "bg-matte",
    about = "Remove image backgrounds: saliency masks or white-background heuristics to alpha mattes",
    version,
    after_help = "Simple usage: bg-matte --mode white <image>\n\n\
                  NOTE: The soft/hard mask modes need a saliency model, which this binary\n\
                  does not bundle; register an inference backend through the library API."
)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_matte.png)
    #[arg(short, long)]
    output: Option<String>,

    /// Matte derivation mode
    #[arg(short, long, value_enum, default_value = "auto")]
    mode: CliMode,

    /// Hard-matte cut level on the 0-255 alpha scale
    #[arg(long, default_value = "140")]
    threshold: u8,

    /// Box blur radius for the matte (0 = off)
    #[arg(long, default_value = "0")]
    blur: u32,

    /// Feather amount, softens edges with a half-strength blur (0 = off)
    #[arg(long, default_value = "0")]
    feather: u32,

    /// Refine the matte: negative erodes, positive dilates (capped at 10)
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    refine: i32,

    /// Soft-matte gamma times 100 (100 = gamma 1.0)
    #[arg(long, default_value = "100")]
    alpha_power: u32,

    /// Near-white channel floor for the white-background extractor
    #[arg(long, default_value = "238")]
    white_tolerance: u8,

    /// Use the binary near-white policy instead of the graded one
    #[arg(long)]
    hard_white: bool,

    /// Crop uniform near-white margins before processing
    #[arg(long)]
    autocrop: bool,

    /// Channel floor above which a margin pixel counts as near-white
    #[arg(long, default_value = "245")]
    margin_threshold: u8,

    /// Padding kept around the content when cropping
    #[arg(long, default_value = "2")]
    crop_padding: u32,

    /// Model registry key for the neural modes
    #[arg(long)]
    model: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if cli.alpha_power == 0 {
        eprintln!("Error: --alpha-power must be positive");
        process::exit(1);
    }

    let params = FilterParameters {
        threshold: cli.threshold,
        blur_radius: cli.blur,
        feather: cli.feather,
        refine: cli.refine,
        alpha_power: cli.alpha_power,
        white_tolerance: cli.white_tolerance,
        white_policy: if cli.hard_white {
            WhitePolicy::Hard
        } else {
            WhitePolicy::Soft
        },
        auto_crop: cli.autocrop,
        margin_threshold: cli.margin_threshold,
        crop_padding: cli.crop_padding,
    };

    let opts = ProcessOptions {
        mode: match cli.mode {
            CliMode::Auto => Mode::Auto,
            CliMode::White => Mode::White,
            CliMode::Soft => Mode::SoftMask,
            CliMode::Hard => Mode::HardMask,
        },
        params,
        model: cli.model,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let mut engine = MatteEngine::new();

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: bg-matte <input_dir> -o <output_dir>");
            process::exit(1);
        };
        engine.process_directory(input_path, &output_dir, &opts)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![engine.process_file(input_path, &output_path, &opts)]
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.success {
        if !opts.quiet {
            match result.route {
                Some(route) => eprintln!("[OK] {filename} ({route})"),
                None => eprintln!("[OK] {filename}"),
            }
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && result.success && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
