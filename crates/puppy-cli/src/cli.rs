use clap::{Parser, Subcommand, ValueEnum};
use puppy_core::{EventFilter, EventKind};

#[derive(Parser)]
#[command(name = "puppy")]
#[command(about = "Log puppy events and see how long it has been since the last one")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Events API origin (overrides PUPPY_API_BASE_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log an event that just happened
    #[command(alias = "add")]
    Log {
        /// What happened
        #[arg(value_enum)]
        kind: KindArg,
    },
    /// List logged events, newest first
    List {
        /// Only show one kind of event
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        kind: FilterArg,
        /// Number of events to show
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show time since the last event of each kind
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an event by id
    Delete {
        /// Event id as shown by `puppy list`
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum KindArg {
    Pee,
    Poop,
    Water,
    Food,
}

impl From<KindArg> for EventKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Pee => Self::Pee,
            KindArg::Poop => Self::Poop,
            KindArg::Water => Self::Water,
            KindArg::Food => Self::Food,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum FilterArg {
    All,
    Pee,
    Poop,
    Water,
    Food,
}

impl From<FilterArg> for EventFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::All => Self::All,
            FilterArg::Pee => Self::Kind(EventKind::Pee),
            FilterArg::Poop => Self::Kind(EventKind::Poop),
            FilterArg::Water => Self::Kind(EventKind::Water),
            FilterArg::Food => Self::Kind(EventKind::Food),
        }
    }
}
