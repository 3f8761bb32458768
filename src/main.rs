//! Thin CLI wrapper around [`proto_compiler::Compiler`] (spec §6 "CLI
//! surface"): argument parsing, wiring a [`proto_resolve::DirectoryResolver`]
//! from `-I` flags, calling `Compiler::compile`, writing the resulting
//! `FileDescriptorSet` to `-o`, and mapping the aggregate result to a process
//! exit code. Contains no compiler logic of its own.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use prost::Message;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use proto_compiler::{CompileError, Compiler, CompilerOptions, SourceInfoMode};
use proto_diagnostics::Severity;
use proto_resolve::{AnyResolver, CompositeResolver};

#[derive(Parser, Debug)]
#[command(name = "protoc-rs", about = "A pure-source compiler front end for the Protocol Buffers schema language")]
struct Cli {
    /// Proto import path (repeatable), mirroring protoc's `-I`/`--proto_path`.
    #[arg(short = 'I', long = "proto_path", value_name = "PATH")]
    proto_path: Vec<PathBuf>,

    /// Where to write the compiled `FileDescriptorSet`.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: PathBuf,

    /// How much `SourceCodeInfo` to attach to each compiled file.
    #[arg(long = "source-info", value_enum, default_value_t = SourceInfoArg::None)]
    source_info: SourceInfoArg,

    /// Upper bound on concurrently compiling files; 0 means unbounded.
    #[arg(long = "max-parallelism", default_value_t = 8)]
    max_parallelism: isize,

    /// `.proto` files to compile, resolved against `proto_path`.
    #[arg(required = true)]
    files: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SourceInfoArg {
    None,
    Standard,
    ExtraComments,
}

impl From<SourceInfoArg> for SourceInfoMode {
    fn from(value: SourceInfoArg) -> Self {
        match value {
            SourceInfoArg::None => SourceInfoMode::None,
            SourceInfoArg::Standard => SourceInfoMode::Standard,
            SourceInfoArg::ExtraComments => SourceInfoMode::ExtraComments,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let resolver = AnyResolver::Composite(CompositeResolver::with_well_known_types(cli.proto_path.clone()));
    let options = CompilerOptions::new(resolver)
        .with_max_parallelism(cli.max_parallelism)
        .with_source_info_mode(cli.source_info.into());

    let compiler = Compiler::new(options);
    let outcome = compiler.compile(cli.files.clone()).await;

    match outcome.into_result() {
        Ok(files) => {
            let descriptor_set = prost_types::FileDescriptorSet {
                file: files.into_iter().filter_map(|f| f.pool.map(|pool| pool.file.clone())).collect(),
            };

            match std::fs::write(&cli.output, descriptor_set.encode_to_vec()) {
                Ok(()) => {
                    info!(output = %cli.output.display(), "wrote descriptor set");
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    error!(output = %cli.output.display(), error = %err, "failed to write descriptor set");
                    ExitCode::FAILURE
                }
            }
        }
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn report_error(err: &CompileError) {
    match err {
        CompileError::Diagnostics(diagnostics) => {
            for diagnostic in diagnostics {
                match diagnostic.severity {
                    Severity::Error => eprintln!("error: {diagnostic}"),
                    Severity::Warning => eprintln!("warning: {diagnostic}"),
                }
            }
        }
        other => eprintln!("error: {other}"),
    }
}
