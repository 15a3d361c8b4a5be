//! CozyCampus CLI
//!
//! Browse and manage campus events, clubs, participation and the forum from
//! the terminal.

use clap::{Parser, Subcommand};
use cozycampus_api_client::ApiError;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod output;

use commands::{clubs, config, events, forum, participants};

/// Command-line client for the CozyCampus backend
#[derive(Parser)]
#[command(name = "cozycampus")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    format: String,

    /// Configuration file (defaults to .cozycampus.toml or cozycampus.toml)
    #[arg(long, global = true, env = "COZYCAMPUS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Campus events
    Events {
        #[command(subcommand)]
        action: EventsAction,
    },

    /// Events organized by clubs
    ClubEvents {
        #[command(subcommand)]
        action: ClubEventsAction,
    },

    /// Clubs and their members
    Clubs {
        #[command(subcommand)]
        action: ClubsAction,
    },

    /// Event participation
    Participants {
        #[command(subcommand)]
        action: ParticipantsAction,
    },

    /// Forum comments
    Comments {
        #[command(subcommand)]
        action: CommentsAction,
    },

    /// Forum posts
    Posts {
        #[command(subcommand)]
        action: PostsAction,
    },

    /// Forum moderation reports
    Reports {
        #[command(subcommand)]
        action: ReportsAction,
    },

    /// Client configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum EventsAction {
    /// List all campus events
    List,

    /// Search events by text
    Search {
        /// Search term
        term: String,
    },

    /// Create a campus event
    Create {
        /// Event title
        title: String,

        /// Creating user
        #[arg(long)]
        creator: i64,

        /// Description
        #[arg(short, long)]
        description: Option<String>,

        /// Venue
        #[arg(long)]
        venue: Option<String>,

        /// Start time (RFC 3339 or YYYY-MM-DD HH:MM:SS)
        #[arg(long)]
        start: Option<String>,

        /// End time (defaults to one hour after the start)
        #[arg(long)]
        end: Option<String>,
    },

    /// Move an event to another status
    Transition {
        /// Event id
        id: i64,

        /// Target status (AVENIR, EN_COURS, PASSE, ANNULE)
        status: String,

        /// Event creator
        #[arg(long)]
        creator: i64,
    },
}

#[derive(Subcommand)]
enum ClubEventsAction {
    /// List club events, optionally for one club
    List {
        /// Club id
        #[arg(long)]
        club: Option<i64>,
    },
}

#[derive(Subcommand)]
enum ClubsAction {
    /// List clubs
    List {
        /// Include pending and rejected clubs
        #[arg(short, long)]
        all: bool,

        /// Count members for each club
        #[arg(short, long)]
        members: bool,
    },

    /// List clubs awaiting moderation
    Pending,

    /// Accept a pending club
    Accept {
        /// Club id
        id: i64,
    },

    /// Reject a pending club
    Reject {
        /// Club id
        id: i64,
    },

    /// List the members of a club
    Members {
        /// Club id
        id: i64,

        /// Load missing user details
        #[arg(long)]
        with_users: bool,
    },

    /// Remove a member from a club
    RemoveMember {
        /// Club id
        club: i64,

        /// Member to remove
        member: i64,

        /// Administrator performing the removal
        #[arg(long)]
        admin: i64,
    },
}

#[derive(Subcommand)]
enum ParticipantsAction {
    /// Join an event
    Join {
        /// Event id
        event: i64,

        /// Joining user
        #[arg(long)]
        user: i64,

        /// The event is a club event
        #[arg(long)]
        club_event: bool,
    },

    /// Leave an event
    Leave {
        /// Event id
        event: i64,

        /// Leaving user
        #[arg(long)]
        user: i64,

        /// The event is a club event
        #[arg(long)]
        club_event: bool,
    },

    /// Events the user takes part in
    Mine {
        /// User id
        #[arg(long)]
        user: i64,

        /// List club events instead of campus events
        #[arg(long)]
        club_event: bool,
    },
}

#[derive(Subcommand)]
enum CommentsAction {
    /// Comments of a post
    List {
        /// Post id
        post: i64,
    },

    /// Comment on a post
    Post {
        /// Post id
        post: i64,

        /// Comment text
        content: String,

        /// Author
        #[arg(long)]
        user: i64,
    },
}

#[derive(Subcommand)]
enum PostsAction {
    /// List posts
    List {
        /// Only posts with this category tag
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Search posts
    Search {
        /// Search query
        query: String,
    },
}

#[derive(Subcommand)]
enum ReportsAction {
    /// Reports waiting for a moderator
    Pending,

    /// Mark a report resolved
    Resolve {
        /// Report id
        id: i64,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = if cli.verbose {
        cozycampus_telemetry::TelemetryConfig::verbose()
    } else {
        cozycampus_telemetry::TelemetryConfig::default()
    };
    let telemetry = if cli.format == "json" {
        telemetry.json()
    } else {
        telemetry
    };
    if let Err(e) = cozycampus_telemetry::init_with_config(&telemetry) {
        eprintln!("{} {}", "Warning:".yellow().bold(), e);
    }

    let ctx = commands::Context {
        config_path: cli.config,
        format: cli.format,
    };

    let result = match cli.command {
        Commands::Events { action } => match action {
            EventsAction::List => events::list(&ctx).await,
            EventsAction::Search { term } => events::search(&ctx, &term).await,
            EventsAction::Create { title, creator, description, venue, start, end } => {
                let draft = events::DraftArgs { title, description, venue, start, end };
                events::create(&ctx, creator, draft).await
            }
            EventsAction::Transition { id, status, creator } => {
                events::transition(&ctx, id, &status, creator).await
            }
        },

        Commands::ClubEvents { action } => match action {
            ClubEventsAction::List { club } => events::list_club_events(&ctx, club).await,
        },

        Commands::Clubs { action } => match action {
            ClubsAction::List { all, members } => clubs::list(&ctx, !all, members).await,
            ClubsAction::Pending => clubs::pending(&ctx).await,
            ClubsAction::Accept { id } => clubs::accept(&ctx, id).await,
            ClubsAction::Reject { id } => clubs::reject(&ctx, id).await,
            ClubsAction::Members { id, with_users } => clubs::members(&ctx, id, with_users).await,
            ClubsAction::RemoveMember { club, member, admin } => {
                clubs::remove_member(&ctx, club, member, admin).await
            }
        },

        Commands::Participants { action } => match action {
            ParticipantsAction::Join { event, user, club_event } => {
                participants::join(&ctx, user, event, club_event).await
            }
            ParticipantsAction::Leave { event, user, club_event } => {
                participants::leave(&ctx, user, event, club_event).await
            }
            ParticipantsAction::Mine { user, club_event } => {
                participants::mine(&ctx, user, club_event).await
            }
        },

        Commands::Comments { action } => match action {
            CommentsAction::List { post } => forum::comments(&ctx, post).await,
            CommentsAction::Post { post, content, user } => {
                forum::comment(&ctx, user, post, &content).await
            }
        },

        Commands::Posts { action } => match action {
            PostsAction::List { category } => forum::posts(&ctx, category.as_deref()).await,
            PostsAction::Search { query } => forum::search(&ctx, &query).await,
        },

        Commands::Reports { action } => match action {
            ReportsAction::Pending => forum::pending_reports(&ctx).await,
            ReportsAction::Resolve { id } => forum::resolve_report(&ctx, id).await,
        },

        Commands::Config { action } => match action {
            ConfigAction::Show => config::show(&ctx),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = match e.downcast_ref::<ApiError>() {
                Some(
                    api @ (ApiError::ApiResponse { .. }
                    | ApiError::Unauthorized
                    | ApiError::Network(_)
                    | ApiError::Timeout(_)
                    | ApiError::RetriesExhausted { .. }),
                ) => api.user_message(),
                _ => format!("{e:#}"),
            };
            eprintln!("{} {}", "Error:".red().bold(), message);
            tracing::debug!(error = ?e, "Command failed");
            ExitCode::FAILURE
        }
    }
}
