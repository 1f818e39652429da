//! CLI entry point for the `accum` assembler, runner and disassembler.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use accum_asm::parser::parse_number;
use accum_asm::{assemble_file, Assembly};
use accum_core::{
    disassemble_range, CoreConfig, CoreState, StateReport, StopReason, TraceEvent, TraceSink,
};
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;
use tracing_subscriber::EnvFilter;

const USAGE_TEXT: &str = "\
Usage: accum <command> [options]

Commands:
  build  <input> [-o <output>] [--verbose]         Assemble source to binary
  run    <input> [--max-steps N] [--watch ADDR]...  Assemble (or load .bin) and run
  disasm <input> [--origin ADDR]                    Print an assembly listing

Options:
  -o, --output <file>  Output file path (default: input stem + .bin)
  -v, --verbose        Print listing to stderr (build only)
  --max-steps <n>      Stop after n instructions (run only)
  --watch <addr>       Print the byte at addr after the run (repeatable)
  --origin <addr>      Load address for raw binaries (disasm only)
  -h, --help           Show this help message

Inputs ending in .bin are loaded raw; anything else is assembled.
Set RUST_LOG (e.g. RUST_LOG=trace) for execution tracing on stderr.

Examples:
  accum build sum.asm
  accum run sum.asm --watch 0x1003
  accum disasm sum.bin
";

const EXIT_FAILURE: i32 = 1;
const EXIT_USAGE: i32 = 2;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Build(BuildArgs),
    Run(RunArgs),
    Disasm(DisasmArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct BuildArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    verbose: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    input: PathBuf,
    max_steps: Option<u64>,
    watch: Vec<u16>,
}

#[derive(Debug, PartialEq, Eq)]
struct DisasmArgs {
    input: PathBuf,
    origin: u16,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    let command = match command_str.as_str() {
        "build" => parse_build_args(args).map(Command::Build),
        "run" => parse_run_args(args).map(Command::Run),
        "disasm" => parse_disasm_args(args).map(Command::Disasm),
        other => Err(format!("unknown command: {other}")),
    };
    match command {
        Err(help) if help == USAGE_TEXT => Ok(ParseResult::Help),
        other => other.map(ParseResult::Command),
    }
}

fn next_value(args: &mut impl Iterator<Item = OsString>, flag: &str) -> Result<String, String> {
    args.next()
        .map(|value| value.to_string_lossy().to_string())
        .ok_or_else(|| format!("missing value for {flag}"))
}

fn parse_address(text: &str, flag: &str) -> Result<u16, String> {
    parse_number(text)
        .and_then(|value| u16::try_from(value).ok())
        .ok_or_else(|| format!("invalid address for {flag}: {text}"))
}

fn set_input(input: &mut Option<PathBuf>, arg: OsString) -> Result<(), String> {
    if arg.to_string_lossy().starts_with('-') {
        return Err(format!("unknown option: {}", arg.to_string_lossy()));
    }
    if input.is_some() {
        return Err("multiple input paths provided".to_string());
    }
    *input = Some(PathBuf::from(arg));
    Ok(())
}

#[allow(clippy::while_let_on_iterator)]
fn parse_build_args(mut args: impl Iterator<Item = OsString>) -> Result<BuildArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }

        if arg == "-o" || arg == "--output" {
            output = Some(PathBuf::from(next_value(&mut args, "-o")?));
            continue;
        }

        set_input(&mut input, arg)?;
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(BuildArgs {
        input,
        output,
        verbose,
    })
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(mut args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut max_steps: Option<u64> = None;
    let mut watch = Vec::new();

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--max-steps" {
            let value = next_value(&mut args, "--max-steps")?;
            let steps = parse_number(&value)
                .and_then(|steps| u64::try_from(steps).ok())
                .ok_or_else(|| format!("invalid step count: {value}"))?;
            max_steps = Some(steps);
            continue;
        }

        if arg == "--watch" {
            let value = next_value(&mut args, "--watch")?;
            watch.push(parse_address(&value, "--watch")?);
            continue;
        }

        set_input(&mut input, arg)?;
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(RunArgs {
        input,
        max_steps,
        watch,
    })
}

#[allow(clippy::while_let_on_iterator)]
fn parse_disasm_args(mut args: impl Iterator<Item = OsString>) -> Result<DisasmArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut origin = 0;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--origin" {
            let value = next_value(&mut args, "--origin")?;
            origin = parse_address(&value, "--origin")?;
            continue;
        }

        set_input(&mut input, arg)?;
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(DisasmArgs { input, origin })
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("out");

    let parent = input.parent().unwrap_or_else(|| Path::new(""));

    parent.join(format!("{stem}.bin"))
}

fn is_raw_binary(input: &Path) -> bool {
    input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("bin"))
}

fn assemble_input(input: &Path) -> Result<Assembly, i32> {
    assemble_file(input).map_err(|e| {
        eprintln!("error: {}: {e}", input.display());
        EXIT_FAILURE
    })
}

fn load_image(input: &Path) -> Result<Vec<u8>, i32> {
    if is_raw_binary(input) {
        fs::read(input).map_err(|e| {
            eprintln!("error: failed to read {}: {e}", input.display());
            EXIT_FAILURE
        })
    } else {
        assemble_input(input).map(|assembly| assembly.image)
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn run_build(args: BuildArgs) -> Result<(), i32> {
    let assembly = assemble_input(&args.input)?;

    let output_path = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input));

    if let Err(e) = fs::write(&output_path, &assembly.image) {
        eprintln!("error: failed to write output: {e}");
        return Err(EXIT_FAILURE);
    }

    if args.verbose {
        print_listing(&assembly);
    }

    println!(
        "Assembled {} ({} bytes) -> {}",
        args.input.display(),
        assembly.image.len(),
        output_path.display()
    );

    Ok(())
}

fn print_listing(assembly: &Assembly) {
    for entry in &assembly.listing {
        eprintln!(
            "{:04X}: {:<15} {}",
            entry.address,
            hex_bytes(&entry.bytes),
            entry.source
        );
    }
}

/// Prints the register state after every retired instruction.
struct StepPrinter;

impl TraceSink for StepPrinter {
    fn on_event(&mut self, event: TraceEvent) {
        if let TraceEvent::InstructionRetired { regs, .. } = event {
            let report = StateReport {
                regs,
                watch: Vec::new(),
            };
            println!("{report}");
        }
    }
}

fn run_program(args: &RunArgs) -> Result<(), i32> {
    let image = load_image(&args.input)?;

    let mut state = CoreState::new();
    if let Err(fault) = state.load_image(0x0000, &image) {
        eprintln!("error: cannot load {}: {fault}", args.input.display());
        return Err(EXIT_FAILURE);
    }

    let config = CoreConfig {
        max_steps: args.max_steps,
        ..CoreConfig::default()
    };
    println!("Initial state");
    println!("{}", state.report(&args.watch));
    let outcome = state.run_traced(&config, &mut StepPrinter);

    println!();
    match outcome.stop {
        StopReason::Halted => println!(
            "halted at PC=0x{:04X} after {} steps",
            state.regs.pc(),
            outcome.steps
        ),
        StopReason::StepLimit => println!("step limit reached after {} steps", outcome.steps),
        StopReason::Fault(fault) => {
            println!("{}", state.report(&args.watch));
            eprintln!(
                "error: {} fault at PC=0x{:04X} after {} steps: {fault}",
                fault.class(),
                state.regs.pc(),
                outcome.steps
            );
            return Err(EXIT_FAILURE);
        }
    }
    println!("{}", state.report(&args.watch));

    Ok(())
}

fn run_disasm(args: &DisasmArgs) -> Result<(), i32> {
    let (image, origin) = if is_raw_binary(&args.input) {
        (load_image(&args.input)?, args.origin)
    } else {
        (assemble_input(&args.input)?.image, 0)
    };

    if origin != 0 {
        println!("        .org 0x{origin:04X}");
    }
    for row in disassemble_range(origin, &image, &CoreConfig::default()) {
        println!(
            "        {:<24}; {:04X}: {}",
            row.to_source(),
            row.addr_start,
            hex_bytes(&row.bytes)
        );
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(command)) => {
            tracing::debug!(?command, "starting");
            let result = match command {
                Command::Build(args) => run_build(args),
                Command::Run(args) => run_program(&args),
                Command::Disasm(args) => run_disasm(&args),
            };
            result.err().unwrap_or(0)
        }
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{USAGE_TEXT}");
            EXIT_USAGE
        }
    };

    std::process::exit(exit_code);
}
