//! MiniJava Compiler Driver
//!
//! Command-line front for the code-generation backend. It reads a lowered
//! IR program (JSON), runs selection, optimization and register allocation,
//! and writes SPARC assembly. Built-in sample programs make it usable
//! without a front end.

use clap::{Parser, Subcommand};
use log::info;
use mjc_codegen::{emit_program, samples, write_program, Backend, CodeFragment};
use mjc_common::{CompilerConfig, CompilerError, ErrorReporter, OptLevel};
use mjc_ir::IrProgram;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "mjc")]
#[command(about = "MiniJava Compiler - SPARC backend")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an IR program (JSON) to SPARC assembly
    Compile {
        /// Input IR program
        input: PathBuf,

        /// Output assembly file (defaults to the input with a .s extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: BackendOptions,
    },

    /// Compile one of the built-in sample programs
    Sample {
        /// Sample name (factorial, add-zero, discard-call, locals)
        name: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Dump the sample's IR as JSON instead of compiling it
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        options: BackendOptions,
    },
}

#[derive(clap::Args)]
struct BackendOptions {
    /// Optimization level (O0 skips the peephole optimizer)
    #[arg(long = "opt", default_value = "O1")]
    opt_level: OptLevel,

    /// Emit procedure bodies without prologue and epilogue
    #[arg(long)]
    no_frames: bool,

    /// Print the generated assembly to stdout
    #[arg(long)]
    print_asm: bool,

    /// Log optimizer and allocator decisions
    #[arg(short, long)]
    verbose: bool,
}

impl BackendOptions {
    fn config(&self) -> CompilerConfig {
        CompilerConfig {
            opt_level: self.opt_level,
            procedure_frames: !self.no_frames,
            verbose: self.verbose,
            ..CompilerConfig::default()
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compile { input, output, options } => {
            init_logging(options.verbose);
            compile_file(&input, output.as_deref(), &options)
        }
        Commands::Sample { name, output, json, options } => {
            init_logging(options.verbose);
            run_sample(&name, output.as_deref(), json, &options)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn compile_file(input: &Path, output: Option<&Path>, options: &BackendOptions) -> Result<(), CompilerError> {
    let text = fs::read_to_string(input).map_err(|e| CompilerError::IoError {
        message: format!("Unable to read {}: {}", input.display(), e),
    })?;
    let program = IrProgram::from_json(&text)?;

    let fragments = compile(program, options)?;

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => input.with_extension("s"),
    };
    write_program(&fragments, &path)?;
    info!("Assembly written to: {}", path.display());
    Ok(())
}

fn run_sample(name: &str, output: Option<&Path>, json: bool, options: &BackendOptions) -> Result<(), CompilerError> {
    let program = samples::sample(name).ok_or_else(|| {
        CompilerError::input(format!(
            "Unknown sample: {} (available: {})",
            name,
            samples::SAMPLE_NAMES.join(", ")
        ))
    })?;

    if json {
        let text = program.to_json()?;
        match output {
            Some(path) => {
                fs::write(path, &text)?;
                info!("IR written to: {}", path.display());
            }
            None => print!("{}", text),
        }
        return Ok(());
    }

    let fragments = compile(program, options)?;
    match output {
        Some(path) => {
            write_program(&fragments, path)?;
            info!("Assembly written to: {}", path.display());
        }
        None if !options.print_asm => print!("{}", emit_program(&fragments)),
        None => {}
    }
    Ok(())
}

/// Run the backend. Diagnostics are printed either way; errors fail the
/// compilation.
fn compile(program: IrProgram, options: &BackendOptions) -> Result<Vec<CodeFragment>, CompilerError> {
    let backend = Backend::new(options.config());
    let mut reporter = ErrorReporter::new();

    let fragments: Option<Vec<CodeFragment>> = backend.run(program, &mut reporter);
    reporter.print_diagnostics();

    let fragments = match fragments {
        Some(fragments) if !reporter.has_errors() => fragments,
        _ => return Err(CompilerError::failed(&reporter)),
    };

    if options.print_asm {
        print!("{}", emit_program(&fragments));
    }
    Ok(fragments)
}
