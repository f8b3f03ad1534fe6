use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "hydra", version, about = "Parallel research query orchestrator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a research question
    Ask {
        /// The question to research
        query: String,

        /// Model name (e.g., "gemini-2.0-flash", "gpt-4o-mini")
        #[arg(short, long)]
        model: Option<String>,

        /// Search provider: "duckduckgo" or "brave"
        #[arg(short, long)]
        provider: Option<String>,

        /// Maximum number of research subtasks per query
        #[arg(long)]
        max_subtasks: Option<usize>,

        /// Per-subtask timeout in seconds
        #[arg(long)]
        subtask_timeout: Option<u64>,

        /// Global request deadline in seconds
        #[arg(long)]
        deadline: Option<u64>,
    },
}
