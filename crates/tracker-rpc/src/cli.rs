use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "tracker-rpc",
    version,
    about = "JSON-RPC service and CLI for Redmine trackers"
)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'o', value_enum, global = true, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Path to a TOML config file
    #[arg(long, env = "TRACKER_CONFIG", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Tracker base URL (overrides config file)
    #[arg(long, env = "TRACKER_URL", global = true)]
    pub url: Option<String>,

    /// Tracker login (overrides config file)
    #[arg(long, env = "TRACKER_LOGIN", global = true)]
    pub login: Option<String>,

    /// Tracker password (overrides config file)
    #[arg(long, env = "TRACKER_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Project operations
    #[command(visible_alias = "p")]
    Project {
        #[command(subcommand)]
        action: ProjectCommands,
    },
    /// Issue operations
    #[command(visible_alias = "i")]
    Issue {
        #[command(subcommand)]
        action: IssueCommands,
    },
    /// Show the user the credentials belong to
    User,
    /// Time report operations
    #[command(visible_alias = "r")]
    Report {
        #[command(subcommand)]
        action: ReportCommands,
    },
    /// JSON-RPC server and client
    Rpc {
        #[command(subcommand)]
        action: RpcCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// List projects with their issue and activity types
    #[command(visible_alias = "ls")]
    List,
    /// Get project by ID
    #[command(visible_alias = "g")]
    Get {
        /// Numeric project ID
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum IssueCommands {
    /// List issues of a project assigned to you
    #[command(visible_alias = "ls")]
    List {
        /// Numeric project ID
        project: i64,
        /// Number of issues to skip
        #[arg(long, default_value_t = 0)]
        offset: u32,
        /// Page size (0 means the tracker default of 100)
        #[arg(long, default_value_t = 0)]
        limit: u32,
    },
    /// Get issue by ID
    #[command(visible_alias = "g")]
    Get {
        /// Numeric issue ID
        id: i64,
    },
    /// Get issue by its page URL (e.g. https://redmine.example.com/issues/42)
    Url {
        url: String,
    },
    /// Create an issue assigned to you
    #[command(visible_alias = "new", visible_alias = "c")]
    Create {
        /// Numeric project ID
        project: i64,
        /// Issue subject
        #[arg(long, short = 't')]
        title: String,
        /// Issue description
        #[arg(long, short = 'd', default_value = "")]
        description: String,
        /// Issue type (Redmine tracker) ID
        #[arg(long = "type", value_name = "TYPE_ID")]
        type_id: i64,
        /// Estimated effort in hours
        #[arg(long)]
        estimate: Option<f64>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Completion in percent
        #[arg(long, default_value_t = 0)]
        done: i32,
    },
    /// Set completion percentage of an issue
    Progress {
        /// Numeric issue ID
        id: i64,
        /// Completion in percent (0-100)
        #[arg(value_parser = clap::value_parser!(i32).range(0..=100))]
        percent: i32,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Record time spent on an issue
    #[command(visible_alias = "c")]
    Create {
        /// Numeric issue ID
        #[arg(long)]
        issue: i64,
        /// Activity type ID
        #[arg(long)]
        activity: i64,
        /// Time spent in hours
        #[arg(long)]
        duration: f64,
        /// Day of the work (YYYY-MM-DD, default today)
        #[arg(long)]
        started: Option<String>,
        /// Comment for the entry
        #[arg(long, short = 'm', default_value = "")]
        comment: String,
    },
    /// Total time you reported on a day
    Total {
        /// Day (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RpcCommands {
    /// Serve newline-delimited JSON-RPC 2.0 requests on stdin/stdout
    Serve,
    /// Run a single JSON-RPC method and print its result
    Call {
        /// Method name, with or without the "API." prefix
        method: String,
        /// JSON params; the configured tracker is used when "tracker" is absent
        #[arg(long, default_value = "{}")]
        params: String,
    },
}

pub fn print_completions(shell: Shell) {
    use clap::CommandFactory;
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "tracker-rpc", &mut std::io::stdout());
}
