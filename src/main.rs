#![deny(warnings)]
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use cairo_exec::cairo_run;
use cairo_exec::hint_processor::builtin_hint_processor::builtin_hint_processor_definition::BuiltinHintProcessor;
use cairo_exec::vm::errors::cairo_run_errors::CairoRunError;
use clap::{Parser, ValueHint};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(value_parser, value_hint=ValueHint::FilePath)]
    filename: PathBuf,
    #[clap(long = "trace_file", value_parser)]
    trace_file: Option<PathBuf>,
    #[clap(long = "memory_file", value_parser)]
    memory_file: Option<PathBuf>,
    #[clap(long = "print_output")]
    print_output: bool,
    #[clap(long = "entrypoint", default_value = "main")]
    entrypoint: String,
}

fn run(args: Args) -> Result<(), CairoRunError> {
    let hint_executor = BuiltinHintProcessor::new_empty();
    let cairo_run_config = cairo_run::CairoRunConfig {
        entrypoint: &args.entrypoint,
        print_output: args.print_output,
    };
    let cairo_runner = cairo_run::cairo_run(&args.filename, &cairo_run_config, &hint_executor)?;

    if let Some(trace_path) = args.trace_file {
        let mut writer = BufWriter::new(File::create(trace_path)?);
        cairo_run::write_binary_trace(&cairo_runner.relocated_trace, &mut writer)?;
    }

    if let Some(memory_path) = args.memory_file {
        let mut writer = BufWriter::new(File::create(memory_path)?);
        cairo_run::write_binary_memory(&cairo_runner.relocated_memory, &mut writer)?;
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
