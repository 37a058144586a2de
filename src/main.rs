//! Command-line access to the shader contract.
//!
//! ```text
//! anchorview-contract [-v] [wgsl | table | check | plan <config.json>]
//! ```

use std::error::Error;
use std::path::PathBuf;

use anchorview_gpu::{bindings, layout, specialization, validate_contract, wgsl, FrameConfig};
use clap::{Parser, Subcommand};

/// Validate the shader contract and print its GPU-side declaration
#[derive(Parser, Debug)]
#[command(name = "anchorview-contract")]
#[command(version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Print the WGSL prelude (default)
    Wgsl,

    /// Print every slot table and uniform layout
    Table,

    /// Validate the contract and exit
    Check,

    /// Print buffer sizes for a frame configuration
    Plan {
        /// Path to a JSON frame configuration
        path: PathBuf,
    },
}

fn print_tables() {
    let binding_tables = bindings::tables();
    let specialization_tables = specialization::tables();
    for table in binding_tables.iter().chain(specialization_tables.iter()) {
        println!("{} (slots {}..{})", table.category, table.first, table.end());
        for entry in table.sorted_entries() {
            println!("  {:>3}  {}", entry.slot, entry.name);
        }
        for slot in table.retired {
            println!("  {:>3}  (retired)", slot);
        }
    }

    for structure in layout::ALL {
        println!("{} ({} bytes, align {})", structure.name, structure.size, structure.align);
        for field in structure.fields {
            println!(
                "  {:>3}  {:<28} {:<10} {} bytes",
                field.offset,
                field.name,
                field.kind.wgsl_type(),
                field.size
            );
        }
        for reserved in structure.reserved {
            println!("       {:<28} reserved: {}", reserved.name, reserved.note);
        }
    }
}

fn print_plan(config: &FrameConfig) -> anchorview_gpu::Result<()> {
    println!("viewports:              {:?}", config.viewports());
    println!("quality:                {:?}", config.quality);
    println!("frames in flight:       {}", config.frames_in_flight);
    println!(
        "shared uniforms:        {} bytes ({} per pass)",
        config.shared_uniform_buffer_size()?,
        config.shared_uniform_stride()?
    );
    println!(
        "anchor instances:       {} bytes ({} per frame)",
        config.anchor_instance_buffer_size()?,
        config.anchor_instance_stride()?
    );
    println!("material uniform stride: {} bytes", config.material_uniform_stride()?);
    Ok(())
}

fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    validate_contract()?;
    match command {
        Commands::Wgsl => print!("{}", wgsl::shader_prelude()),
        Commands::Table => print_tables(),
        Commands::Check => println!("contract ok"),
        Commands::Plan { path } => {
            let json = std::fs::read_to_string(&path)?;
            let config = FrameConfig::from_json(&json)?;
            print_plan(&config)?;
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Err(e) = run(cli.command.unwrap_or(Commands::Wgsl)) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
