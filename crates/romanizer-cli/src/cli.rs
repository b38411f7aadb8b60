//! Argument parsing and command dispatch.

use clap::{Args, Parser, Subcommand, ValueEnum};
use romanizer_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig, init_logging, with_request_id};
use url::Url;
use uuid::Uuid;

use crate::client::{AppContext, CliError, CliResult, parse_url};
use crate::commands::library::{handle_cache_delete, handle_favorite_toggle, handle_favorites};
use crate::commands::playlist::{
    handle_playlist_add, handle_playlist_create, handle_playlist_delete, handle_playlist_list,
    handle_playlist_remove_track, handle_playlist_rename, handle_playlist_reorder,
    handle_playlist_save_order,
};
use crate::commands::prime::handle_prime;
use crate::commands::track::handle_track_watch;

const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TRACK_POLL_MS: u64 = 3_000;
const DEFAULT_TRACK_MAX_ATTEMPTS: u32 = 30;
const DEFAULT_PRIMING_POLL_MS: u64 = 2_000;

/// Parses CLI arguments, executes the requested command and maps the outcome
/// to a process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let format = match cli.log_format.parse::<LogFormat>() {
        Ok(format) => format,
        Err(err) => {
            let err = CliError::validation(err.to_string());
            eprintln!("error: {}", err.display_message());
            return err.exit_code();
        }
    };
    if let Err(err) = init_logging(&LoggingConfig {
        format,
        ..LoggingConfig::default()
    }) {
        eprintln!("warning: {err}");
    }

    let _context = GlobalContextGuard::new(command_label(&cli.command));
    let trace_id = Uuid::new_v4().to_string();
    match with_request_id(trace_id, dispatch(cli)).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let ctx = AppContext::from_cli(&cli)?;
    let format = cli.output;

    match cli.command {
        Command::Track(TrackCommand::Watch(args)) => handle_track_watch(&ctx, args, format).await,
        Command::Prime(args) => handle_prime(&ctx, args, format).await,
        Command::Favorites(favorites) => match favorites {
            FavoritesCommand::Add(args) => handle_favorites(&ctx, args, true, format).await,
            FavoritesCommand::Remove(args) => handle_favorites(&ctx, args, false, format).await,
            FavoritesCommand::Toggle(args) => handle_favorite_toggle(&ctx, args, format).await,
        },
        Command::Playlist(playlist) => match playlist {
            PlaylistCommand::List => handle_playlist_list(&ctx, format).await,
            PlaylistCommand::Add(args) => handle_playlist_add(&ctx, args, format).await,
            PlaylistCommand::Create(args) => handle_playlist_create(&ctx, args, format).await,
            PlaylistCommand::Rename(args) => handle_playlist_rename(&ctx, args, format).await,
            PlaylistCommand::Delete(args) => handle_playlist_delete(&ctx, args, format).await,
            PlaylistCommand::RemoveTrack(args) => {
                handle_playlist_remove_track(&ctx, args, format).await
            }
            PlaylistCommand::Reorder(args) => handle_playlist_reorder(&ctx, args, format).await,
            PlaylistCommand::SaveOrder(args) => {
                handle_playlist_save_order(&ctx, args, format).await
            }
        },
        Command::Cache(CacheCommand::Delete(args)) => handle_cache_delete(&ctx, args, format).await,
    }
}

#[derive(Parser)]
#[command(
    name = "romanizer",
    about = "Drive the Romanizer client core against a running backend"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "ROMANIZER_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(
        long,
        global = true,
        env = "ROMANIZER_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long,
        global = true,
        env = "ROMANIZER_TRACK_POLL_MS",
        default_value_t = DEFAULT_TRACK_POLL_MS,
        help = "Delay between track status polls"
    )]
    pub(crate) track_poll_ms: u64,
    #[arg(
        long,
        global = true,
        env = "ROMANIZER_TRACK_MAX_ATTEMPTS",
        default_value_t = DEFAULT_TRACK_MAX_ATTEMPTS,
        help = "Track status polls before pending content is marked as timed out"
    )]
    pub(crate) track_max_attempts: u32,
    #[arg(
        long,
        global = true,
        env = "ROMANIZER_PRIMING_POLL_MS",
        default_value_t = DEFAULT_PRIMING_POLL_MS,
        help = "Delay between priming job progress polls"
    )]
    pub(crate) priming_poll_ms: u64,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for events and reports"
    )]
    pub(crate) output: OutputFormat,
    #[arg(
        long,
        global = true,
        env = "ROMANIZER_LOG_FORMAT",
        default_value = "auto",
        help = "Log format on stderr: json, pretty or auto"
    )]
    pub(crate) log_format: String,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    #[command(subcommand)]
    Track(TrackCommand),
    Prime(PrimeArgs),
    #[command(subcommand)]
    Favorites(FavoritesCommand),
    #[command(subcommand)]
    Playlist(PlaylistCommand),
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Subcommand)]
pub(crate) enum TrackCommand {
    /// Follow a track page until every content slot settles.
    Watch(TrackWatchArgs),
}

#[derive(Subcommand)]
pub(crate) enum FavoritesCommand {
    /// Favorite the given tracks in one request.
    Add(FavoritesArgs),
    /// Unfavorite the given tracks in one request.
    Remove(FavoritesArgs),
    /// Flip the favorite state of a single track.
    Toggle(FavoriteToggleArgs),
}

#[derive(Subcommand)]
pub(crate) enum PlaylistCommand {
    /// List the user's playlists.
    List,
    Add(PlaylistAddArgs),
    Create(PlaylistCreateArgs),
    Rename(PlaylistRenameArgs),
    Delete(PlaylistDeleteArgs),
    RemoveTrack(PlaylistRemoveTrackArgs),
    Reorder(PlaylistReorderArgs),
    SaveOrder(PlaylistSaveOrderArgs),
}

#[derive(Subcommand)]
pub(crate) enum CacheCommand {
    /// Remove one track's cached content.
    Delete(CacheDeleteArgs),
}

#[derive(Args)]
pub(crate) struct TrackWatchArgs {
    #[arg(help = "Track identifier")]
    pub(crate) track_id: String,
}

#[derive(Args)]
pub(crate) struct PrimeArgs {
    #[arg(help = "Playlist whose uncached tracks should be generated")]
    pub(crate) playlist_id: String,
}

#[derive(Args)]
pub(crate) struct FavoritesArgs {
    #[arg(required = true, help = "Track identifiers")]
    pub(crate) track_ids: Vec<String>,
    #[arg(long, short = 'y', help = "Skip the confirmation prompt")]
    pub(crate) yes: bool,
}

#[derive(Args)]
pub(crate) struct FavoriteToggleArgs {
    #[arg(help = "Track identifier")]
    pub(crate) track_id: String,
    #[arg(long, help = "The track is currently a favorite")]
    pub(crate) favorited: bool,
}

#[derive(Args)]
pub(crate) struct PlaylistAddArgs {
    #[arg(help = "Target playlist identifier")]
    pub(crate) playlist_id: String,
    #[arg(required = true, help = "Track identifiers")]
    pub(crate) track_ids: Vec<String>,
}

#[derive(Args)]
pub(crate) struct PlaylistCreateArgs {
    #[arg(long, help = "Name of the new playlist")]
    pub(crate) name: String,
    #[arg(required = true, help = "Track identifiers")]
    pub(crate) track_ids: Vec<String>,
}

#[derive(Args)]
pub(crate) struct PlaylistRenameArgs {
    #[arg(help = "Playlist identifier")]
    pub(crate) playlist_id: String,
    #[arg(help = "New playlist name")]
    pub(crate) new_name: String,
    #[arg(long, help = "Current name; the rename is skipped when unchanged")]
    pub(crate) current_name: Option<String>,
}

#[derive(Args)]
pub(crate) struct PlaylistDeleteArgs {
    #[arg(help = "Playlist identifier")]
    pub(crate) playlist_id: String,
    #[arg(long, short = 'y', help = "Skip the confirmation prompt")]
    pub(crate) yes: bool,
}

#[derive(Args)]
pub(crate) struct PlaylistRemoveTrackArgs {
    #[arg(help = "Playlist identifier")]
    pub(crate) playlist_id: String,
    #[arg(help = "Track identifier")]
    pub(crate) track_id: String,
    #[arg(long, short = 'y', help = "Skip the confirmation prompts")]
    pub(crate) yes: bool,
    #[arg(long, help = "Delete the playlist when the removal leaves it empty")]
    pub(crate) delete_if_empty: bool,
}

#[derive(Args)]
pub(crate) struct PlaylistReorderArgs {
    #[arg(help = "Playlist identifier")]
    pub(crate) playlist_id: String,
    #[arg(help = "Current position of the item")]
    pub(crate) from: u32,
    #[arg(help = "Position the item moves to")]
    pub(crate) to: u32,
}

#[derive(Args)]
pub(crate) struct PlaylistSaveOrderArgs {
    #[arg(required = true, help = "Playlist identifiers in display order")]
    pub(crate) playlist_ids: Vec<String>,
}

#[derive(Args)]
pub(crate) struct CacheDeleteArgs {
    #[arg(help = "Track identifier or its `track_` cache key")]
    pub(crate) track: String,
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Track(TrackCommand::Watch(_)) => "track_watch",
        Command::Prime(_) => "prime",
        Command::Favorites(FavoritesCommand::Add(_)) => "favorites_add",
        Command::Favorites(FavoritesCommand::Remove(_)) => "favorites_remove",
        Command::Favorites(FavoritesCommand::Toggle(_)) => "favorites_toggle",
        Command::Playlist(playlist) => match playlist {
            PlaylistCommand::List => "playlist_list",
            PlaylistCommand::Add(_) => "playlist_add",
            PlaylistCommand::Create(_) => "playlist_create",
            PlaylistCommand::Rename(_) => "playlist_rename",
            PlaylistCommand::Delete(_) => "playlist_delete",
            PlaylistCommand::RemoveTrack(_) => "playlist_remove_track",
            PlaylistCommand::Reorder(_) => "playlist_reorder",
            PlaylistCommand::SaveOrder(_) => "playlist_save_order",
        },
        Command::Cache(CacheCommand::Delete(_)) => "cache_delete",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("romanizer").chain(args.iter().copied()))
            .expect("arguments parse")
    }

    #[test]
    fn defaults_match_page_timings() {
        let cli = parse(&["track", "watch", "42"]);
        assert_eq!(cli.api_url.as_str(), "http://127.0.0.1:5000/");
        assert_eq!(cli.track_poll_ms, 3_000);
        assert_eq!(cli.track_max_attempts, 30);
        assert_eq!(cli.priming_poll_ms, 2_000);
        assert_eq!(cli.output, OutputFormat::Table);
        assert_eq!(command_label(&cli.command), "track_watch");
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = parse(&[
            "favorites",
            "add",
            "a",
            "b",
            "--yes",
            "--format",
            "json",
            "--api-url",
            "http://localhost:9000",
        ]);
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.api_url.as_str(), "http://localhost:9000/");
        match cli.command {
            Command::Favorites(FavoritesCommand::Add(args)) => {
                assert_eq!(args.track_ids, vec!["a".to_string(), "b".to_string()]);
                assert!(args.yes);
            }
            _ => panic!("expected favorites add"),
        }
    }

    #[test]
    fn invalid_url_is_rejected() {
        let result = Cli::try_parse_from(["romanizer", "--api-url", "not a url", "playlist", "list"]);
        assert!(result.is_err());
    }

    #[test]
    fn favorites_require_at_least_one_track() {
        let result = Cli::try_parse_from(["romanizer", "favorites", "remove"]);
        assert!(result.is_err());
    }

    #[test]
    fn command_label_matches_variants() {
        let cli = parse(&["playlist", "remove-track", "pl", "t1"]);
        assert_eq!(command_label(&cli.command), "playlist_remove_track");
        let cli = parse(&["cache", "delete", "track_9"]);
        assert_eq!(command_label(&cli.command), "cache_delete");
        let cli = parse(&["playlist", "reorder", "pl", "0", "3"]);
        assert_eq!(command_label(&cli.command), "playlist_reorder");
    }
}
