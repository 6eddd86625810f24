//! CLI module for moviegraph.
//!
//! Subcommands:
//! - `project`: Project the CSV sources into the intermediate store
//! - `load`: Bulk-load the intermediate store into the graph store
//! - `run`: Both, in order

mod load;
mod project;

use clap::{Parser, Subcommand};

/// moviegraph - movie catalog to property graph
#[derive(Parser)]
#[command(name = "moviegraph")]
#[command(about = "Projects the movie catalog into a property graph and bulk-loads it")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Decode and project the sources into Vertices/ and Edges/ under the data root
    Project,

    /// Load the projected groups into the configured graph store
    Load,

    /// Project, then load
    Run,
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Project => self.run_project().await,
            Command::Load => self.run_load().await,
            Command::Run => {
                self.run_project().await?;
                self.run_load().await
            }
        }
    }
}
