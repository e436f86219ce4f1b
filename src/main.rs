use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use protoc_gen_decls::codegen;
use protoc_gen_decls::descriptor::{CodeGeneratorRequest, decode_descriptor_set};
use protoc_gen_decls::error::{Error, Result};
use protoc_gen_decls::plugin;

/// Generate TypeScript, Flow or Elm declarations from Protocol Buffer schemas.
///
/// Without a subcommand this runs as a protoc plugin: a serialized
/// CodeGeneratorRequest is read from stdin and the response written to stdout.
#[derive(Parser)]
#[command(name = "protoc-gen-decls", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate declarations from a descriptor set on disk.
    Generate {
        /// Descriptor set written by `protoc --include_imports --descriptor_set_out`.
        #[arg(long)]
        descriptor_set: PathBuf,

        /// Comma-separated schema file names to generate, as named in the set.
        /// Defaults to every file in the set.
        ///
        /// Example: --files search.proto,common/paging.proto
        #[arg(long)]
        files: Option<String>,

        /// Generator parameters, in plugin parameter syntax.
        ///
        /// Example: --params target=flow,int_enums
        #[arg(long, default_value = "", env = "PROTOC_GEN_DECLS_PARAMS")]
        params: String,

        /// Output directory for generated files.
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Suppress non-error output.
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");

        // Print cause chain.
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = std::error::Error::source(cause);
        }

        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        None => {
            let stdin = std::io::stdin();
            if stdin.is_terminal() {
                eprintln!(
                    "protoc-gen-decls is a protoc plugin; run it through protoc \
                     (--decls_out=...) or use the `generate` subcommand."
                );
                process::exit(2);
            }
            plugin::serve(stdin.lock(), std::io::stdout().lock()).map_err(|e| Error::Write {
                path: PathBuf::from("<stdout>"),
                source: e,
            })?;
        }

        Some(Commands::Generate {
            descriptor_set,
            files,
            params,
            output_dir,
            quiet,
        }) => {
            if !quiet {
                eprintln!("Loading descriptor set from {}", descriptor_set.display());
            }
            let bytes = std::fs::read(&descriptor_set).map_err(|e| Error::Read {
                path: descriptor_set.clone(),
                source: e,
            })?;
            let set = decode_descriptor_set(&bytes)?;
            if !quiet {
                eprintln!("Loaded {} schema files", set.file.len());
            }

            let file_to_generate: Vec<String> = match files {
                Some(files) => files
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                None => set.file.iter().filter_map(|f| f.name.clone()).collect(),
            };

            let request = CodeGeneratorRequest {
                file_to_generate,
                parameter: Some(params),
                proto_file: set.file,
            };
            let generated = plugin::run(&request)?;
            codegen::write_files(&generated.files, &output_dir)?;

            if !quiet {
                let stats = generated.stats;
                eprintln!(
                    "Generated {} files: {} messages, {} enums, {} services",
                    stats.files_generated,
                    stats.messages_generated,
                    stats.enums_generated,
                    stats.services_generated
                );
                if stats.unknown_types_defaulted > 0 {
                    eprintln!(
                        "Rendered {} fields of unsupported type as unknown",
                        stats.unknown_types_defaulted
                    );
                }
                if stats.unused_imports > 0 {
                    eprintln!("Commented out {} unused imports", stats.unused_imports);
                }
                eprintln!("Done.");
            }
        }
    }

    Ok(())
}
