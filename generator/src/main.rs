use clap::Parser;
use std::path::PathBuf;

use twgen::diag::Diagnostic;
use twgen::emit::{EmitOptions, TypeSizing};
use twgen::fixed::OverflowPolicy;
use twgen::pass::PassId;
use twgen::pipeline::{self, GenerationState};
use twgen::twiddle::TableKeying;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum EmitStage {
    Vhdl,
    Params,
    BuildInfo,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum TableArg {
    Pair,
    Product,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OverflowArg {
    Wrap,
    Error,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum SizingArg {
    Literal,
    Symbolic,
}

#[derive(Parser, Debug)]
#[command(
    name = "twgen",
    version,
    about = "Twiddle factor generator — emits the DFT twiddle table as a VHDL package"
)]
struct Cli {
    /// VHDL constants package declaring TW_PRES, DFT_LG_DSPS and DFT_SIZE
    #[arg(default_value = "package.vhd")]
    source: PathBuf,

    /// Output file path (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Vhdl)]
    emit: EmitStage,

    /// Twiddle table keying
    #[arg(long, value_enum)]
    table: Option<TableArg>,

    /// Handling of components that do not fit in 8 bits
    #[arg(long, value_enum)]
    overflow: Option<OverflowArg>,

    /// Array type bounds: numeric, or written against the constants package
    #[arg(long, value_enum)]
    sizing: Option<SizingArg>,

    /// Reproduce the legacy generator's output (product keying, symbolic sizing)
    #[arg(long)]
    legacy: bool,

    /// Name of the generated package
    #[arg(long, default_value = "twiddles")]
    package_name: String,

    /// Package providing PERDSP, DFT_SIZE and TWLEN
    #[arg(long, default_value = "constants")]
    constants_package: String,

    /// Print generator passes and timing
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    /// Start from the default or legacy preset, then apply explicit flags.
    fn emit_options(&self) -> EmitOptions {
        let mut options = if self.legacy {
            EmitOptions::legacy()
        } else {
            EmitOptions::default()
        };
        options.package_name = self.package_name.clone();
        options.constants_package = self.constants_package.clone();
        if let Some(table) = self.table {
            options.keying = match table {
                TableArg::Pair => TableKeying::Pair,
                TableArg::Product => TableKeying::Product,
            };
        }
        if let Some(overflow) = self.overflow {
            options.overflow = match overflow {
                OverflowArg::Wrap => OverflowPolicy::Wrap,
                OverflowArg::Error => OverflowPolicy::Error,
            };
        }
        if let Some(sizing) = self.sizing {
            options.sizing = match sizing {
                SizingArg::Literal => TypeSizing::Literal,
                SizingArg::Symbolic => TypeSizing::Symbolic,
            };
        }
        options
    }
}

fn print_diagnostics(diags: &[Diagnostic]) {
    for diag in diags {
        eprintln!("twgen: {}", diag);
    }
}

fn main() {
    let cli = Cli::parse();
    let options = cli.emit_options();

    if cli.verbose {
        eprintln!("twgen: source = {}", cli.source.display());
        match &cli.output {
            Some(path) => eprintln!("twgen: output = {}", path.display()),
            None => eprintln!("twgen: output = <stdout>"),
        }
        eprintln!("twgen: emit   = {:?}", cli.emit);
        eprintln!(
            "twgen: table  = {:?}, overflow = {:?}, sizing = {:?}",
            options.keying, options.overflow, options.sizing
        );
    }

    // ── Read source ──
    let source = match std::fs::read_to_string(&cli.source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("twgen: error: {}: {}", cli.source.display(), e);
            std::process::exit(2);
        }
    };

    // ── Run passes ──
    let terminal = match cli.emit {
        EmitStage::Params => PassId::Validate,
        EmitStage::Vhdl | EmitStage::BuildInfo => PassId::Emit,
    };
    let mut state = GenerationState::new(source);
    let outcome = pipeline::run_pipeline(&mut state, terminal, &options, cli.verbose, |_, diags| {
        print_diagnostics(diags)
    });
    if let Err(e) = outcome {
        if cli.verbose {
            eprintln!("twgen: {}", e);
        }
        std::process::exit(1);
    }

    // ── Render requested output ──
    let text = match cli.emit {
        EmitStage::Vhdl => state.generated.as_ref().map(|g| g.vhdl_source.clone()),
        EmitStage::Params => state.params.as_ref().map(pipeline::params_json),
        EmitStage::BuildInfo => Some(pipeline::build_info_json(&state, &options)),
    };
    let text = match text {
        Some(t) => t,
        None => {
            eprintln!("twgen: generation finished with no output");
            std::process::exit(1);
        }
    };

    // ── Write ──
    match &cli.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &text) {
                eprintln!("twgen: error: {}: {}", path.display(), e);
                std::process::exit(2);
            }
            if cli.verbose {
                eprintln!("twgen: wrote {} bytes to {}", text.len(), path.display());
            }
        }
        None => print!("{}", text),
    }
}
