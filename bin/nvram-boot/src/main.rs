use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use log::{info, warn};
use nvram_core::{Attributes, Outcome};
use nvram_linux::setup;
use nvram_persist::{Backend, VarPersistence};
use nvram_vars::{Guid, VarStore};

#[derive(Clone, Copy, ValueEnum)]
enum Medium {
    File,
    Flash,
}

#[derive(Parser)]
struct Cli {
    #[arg(long, value_enum, default_value = "file")] backend: Medium,
    #[arg(long, default_value = "./nvram")] root: PathBuf,
    #[command(subcommand)] command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load the store and print every variable
    Show,
    /// Load, set a variable, save
    Set {
        name: String,
        value: String,
        /// Keep the variable out of the store
        #[arg(long)] volatile: bool,
    },
    /// Load, delete a variable, save
    Delete { name: String },
}

fn open_backend(cli: &Cli) -> anyhow::Result<Box<dyn Backend>> {
    Ok(match cli.backend {
        Medium::File => Box::new(setup::file_backend(&cli.root)?),
        Medium::Flash => Box::new(setup::flash_backend(&cli.root)?),
    })
}

fn print_store(store: &VarStore) {
    if store.is_empty() {
        println!("{}", "(no variables)".dimmed());
    }
    for var in store.iter() {
        let nv = var.attributes.contains(Attributes::NON_VOLATILE);
        let tag = if nv { "NV".green() } else { "RAM".yellow() };
        println!("{} {}-{} = {}", tag, var.vendor, var.name.bold(), String::from_utf8_lossy(&var.data));
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    info!(">>> NVRAM BOOT: {} backend under {}", match cli.backend {
        Medium::File => "file",
        Medium::Flash => "flash",
    }, cli.root.display());

    let mut ctl = VarPersistence::new(open_backend(&cli)?);
    let mut live = VarStore::new();

    // Boot: a missing or corrupt store only means defaults
    match ctl.load(&mut live) {
        Outcome::Success => info!("Restored {} variables", live.len()),
        Outcome::Recoverable => warn!("Starting with default variables"),
        Outcome::Fatal => anyhow::bail!("out of resources while loading variables"),
    }

    let attrs = Attributes::NON_VOLATILE | Attributes::BOOTSERVICE_ACCESS | Attributes::RUNTIME_ACCESS;
    match cli.command {
        Command::Show => {
            print_store(&live);
            return Ok(());
        }
        Command::Set { name, value, volatile } => {
            let attrs = if volatile { Attributes::BOOTSERVICE_ACCESS } else { attrs };
            live.set(Guid::GLOBAL, &name, attrs, value.as_bytes())?;
        }
        Command::Delete { name } => {
            live.remove(Guid::GLOBAL, &name)?;
        }
    }

    // Shutdown
    if ctl.save(&live) != Outcome::Success {
        anyhow::bail!("failed to persist variables");
    }
    print_store(&live);
    Ok(())
}
