use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Data directory (config, models, stored runs).
    /// Defaults to ~/.mailsift
    #[clap(long)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full pipeline over a CSV of records (id,subject,body)
    Run {
        /// Path to the records CSV
        input: String,

        /// Key to store the run under (generated if omitted)
        #[clap(short, long)]
        key: Option<String>,
    },
    /// Rank a stored run's records against a query
    Query {
        /// Key of a stored run
        key: String,

        /// Query text
        text: String,

        /// Number of results (config default if omitted)
        #[clap(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Print a run's question/answer catalogue, most frequent first
    Catalogue {
        /// Key of a stored run
        key: String,
    },
}
