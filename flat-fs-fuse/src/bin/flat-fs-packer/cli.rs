use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
pub struct Cli {
    /// Volume image, created and formatted if missing
    #[arg(long, short)]
    pub image: PathBuf,

    /// Owner of newly created files
    #[arg(long, default_value_t = 0)]
    pub uid: u32,

    /// Group of newly created files
    #[arg(long, default_value_t = 0)]
    pub gid: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Copy every regular file of a host directory into the volume
    Pack {
        /// Host source directory
        #[arg(long, short)]
        source: PathBuf,

        /// Image size in MiB when a new image is created
        #[arg(long, default_value_t = 32)]
        size_mib: u64,
    },
    /// List the root directory
    Ls,
    /// Print a file of the volume to stdout
    Cat {
        /// File name inside the volume
        name: String,
    },
    /// Delete a file of the volume
    Rm {
        /// File name inside the volume
        name: String,
    },
}
