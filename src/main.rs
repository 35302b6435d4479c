//! Purpose: `dogear` CLI entry point and command definitions.
//! Role: Binary crate root; parses args, runs commands, emits output on stdout.
//! Invariants: Commands emit stable stdout formats (human or JSON by flags).
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `dogear::to_exit_code`.
//! Invariants: All backend traffic goes through `api::Client` (session + classification).
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;

mod command_dispatch;

use dogear::api::{Client, DEFAULT_API_BASE_URL};
use dogear::{Error, ErrorKind, Session, to_exit_code};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                let message = clap_error_summary(&err);
                let hint = clap_error_hint(&err);
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(message)
                        .with_hint(hint),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    let session = match &cli.session_file {
        Some(path) => Session::from_file(path),
        None => Session::from_default_file(),
    };
    let client = Client::new(cli.api)
        .map_err(|err| (err, color_mode))?
        .with_session(session);

    let result = command_dispatch::dispatch_command(cli.command, &client);

    result
        .map_err(add_unauthorized_hint)
        .map_err(add_network_hint)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

#[derive(Parser)]
#[command(
    name = "dogear",
    version,
    about = "CLI client for the Dogear book-review platform",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Share book reviews, follow readers, and browse your feed from the terminal.

Mental model:
  - `feed` lists posts (popular, or personalized with --personal)
  - `post` reads and writes reviews
  - `search` finds reviews by title, book, or ISBN
"#,
    after_help = r#"EXAMPLES
  $ dogear login reader@example.com 'hunter2!a'
  $ dogear feed --limit 5
  $ dogear post create --title "Loved it" --content "..." \
      --isbn 9788936434267 --book-title "The Vegetarian" --book-author "Han Kang"
  $ dogear search vegetarian --tag fiction

LEARN MORE
  Session state lives in ~/.dogear/session.json (override with --session-file).
  The backend origin defaults to http://localhost:8000 (override with --api).

  $ dogear <command> --help"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        default_value = DEFAULT_API_BASE_URL,
        value_name = "URL",
        help = "Backend base origin (http(s)://host[:port], no path)"
    )]
    api: String,
    #[arg(
        long = "session-file",
        value_name = "PATH",
        help = "Session file path (default: ~/.dogear/session.json)",
        value_hint = ValueHint::FilePath
    )]
    session_file: Option<PathBuf>,
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        arg_required_else_help = true,
        about = "Log in and store the session",
        after_help = r#"EXAMPLES
  $ dogear login reader@example.com 'secret1!a'

NOTES
  - On success the access token (and your user id) are written to the session file.
  - A 401 from any later command clears the session; log in again."#
    )]
    Login {
        #[arg(help = "Account email")]
        email: String,
        #[arg(help = "Account password")]
        password: String,
    },
    #[command(about = "Log out and clear the stored session")]
    Logout,
    #[command(
        arg_required_else_help = true,
        about = "Create an account",
        after_help = r#"EXAMPLES
  $ dogear signup book_lover reader@example.com 'secret1!a'
  $ dogear signup book_lover reader@example.com 'secret1!a' --bio "I read a lot"

NOTES
  - Usernames: 2-20 characters (letters, Hangul, digits, underscore).
  - Passwords: at least 8 characters with a letter, a digit, and one of !@#$%^&*."#
    )]
    Signup {
        #[arg(help = "Username (2-20 chars)")]
        username: String,
        #[arg(help = "Account email")]
        email: String,
        #[arg(help = "Account password")]
        password: String,
        #[arg(long, help = "Profile bio")]
        bio: Option<String>,
        #[arg(long, help = "Emit the created profile as JSON")]
        json: bool,
    },
    #[command(
        arg_required_else_help = true,
        about = "Delete the account (destructive, cannot be undone)"
    )]
    Withdraw {
        #[arg(help = "Current password, to confirm")]
        password: String,
    },
    #[command(about = "Show the logged-in user's profile")]
    Whoami {
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
    #[command(arg_required_else_help = true, about = "Edit your profile")]
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
    #[command(
        arg_required_else_help = true,
        about = "Change your password",
        after_help = r#"EXAMPLES
  $ dogear password 'old1!aaa' 'new1!aaa'

NOTES
  - New passwords: at least 8 characters with a letter, a digit, and one of !@#$%^&*."#
    )]
    Password {
        #[arg(help = "Current password")]
        current: String,
        #[arg(help = "New password")]
        new: String,
    },
    #[command(
        about = "List posts from the feed",
        after_help = r#"EXAMPLES
  $ dogear feed
  $ dogear feed --personal --page 2
  $ dogear feed --limit 5 --json

NOTES
  - Default is the popular feed; --personal requires a logged-in session."#
    )]
    Feed {
        #[arg(long, help = "Personalized recommendations instead of popular posts")]
        personal: bool,
        #[arg(long, default_value_t = 1, help = "Page number (1-based)")]
        page: u32,
        #[arg(long, default_value_t = 10, help = "Posts per page")]
        limit: u32,
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
    #[command(arg_required_else_help = true, about = "Read and write review posts")]
    Post {
        #[command(subcommand)]
        command: PostCommand,
    },
    #[command(arg_required_else_help = true, about = "Read and write comments")]
    Comments {
        #[command(subcommand)]
        command: CommentsCommand,
    },
    #[command(
        arg_required_else_help = true,
        about = "Toggle a like on a post",
        after_help = r#"EXAMPLES
  $ dogear like 42"#
    )]
    Like {
        #[arg(help = "Post id")]
        post_id: u64,
    },
    #[command(arg_required_else_help = true, about = "Show who liked a post")]
    Likes {
        #[arg(help = "Post id")]
        post_id: u64,
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
    #[command(about = "List posts you have liked")]
    MyLikes {
        #[arg(long, default_value_t = 1, help = "Page number (1-based)")]
        page: u32,
        #[arg(long, default_value_t = 10, help = "Posts per page")]
        limit: u32,
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
    #[command(arg_required_else_help = true, about = "Follow a user")]
    Follow {
        #[arg(help = "User id")]
        user_id: u64,
    },
    #[command(arg_required_else_help = true, about = "Unfollow a user")]
    Unfollow {
        #[arg(help = "User id")]
        user_id: u64,
    },
    #[command(arg_required_else_help = true, about = "List a user's followers")]
    Followers {
        #[arg(help = "User id")]
        user_id: u64,
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
    #[command(arg_required_else_help = true, about = "List who a user follows")]
    Following {
        #[arg(help = "User id")]
        user_id: u64,
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
    #[command(arg_required_else_help = true, about = "Check whether you follow a user")]
    FollowStatus {
        #[arg(help = "User id")]
        user_id: u64,
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
    #[command(
        arg_required_else_help = true,
        about = "Search posts by title, book, or ISBN",
        after_help = r#"EXAMPLES
  $ dogear search vegetarian
  $ dogear search "han kang" --tag fiction --tag korean
  $ dogear search 9788936434267 --json

NOTES
  - At most 3 --tag filters per search."#
    )]
    Search {
        #[arg(help = "Query: post title, book title, or exact ISBN")]
        query: String,
        #[arg(long = "tag", value_name = "TAG", help = "Filter by tag (repeatable, max 3)")]
        tags: Vec<String>,
        #[arg(long, default_value_t = 1, help = "Page number (1-based)")]
        page: u32,
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
    #[command(about = "Print version info")]
    Version,
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        after_help = r#"EXAMPLES
  $ dogear completion bash > ~/.local/share/bash-completion/completions/dogear
  $ dogear completion zsh > ~/.zfunc/_dogear
  $ dogear completion fish > ~/.config/fish/completions/dogear.fish"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum PostCommand {
    #[command(arg_required_else_help = true, about = "Show one post with its comments")]
    Show {
        #[arg(help = "Post id")]
        id: u64,
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
    #[command(
        arg_required_else_help = true,
        about = "Create a review post",
        after_help = r#"EXAMPLES
  $ dogear post create --title "Loved it" --content "..." \
      --isbn 9788936434267 --book-title "The Vegetarian" --book-author "Han Kang""#
    )]
    Create {
        #[arg(long, help = "Post title")]
        title: String,
        #[arg(long, help = "Review text")]
        content: String,
        #[arg(long, help = "Book ISBN (10 or 13 digits)")]
        isbn: String,
        #[arg(long = "book-title", help = "Book title")]
        book_title: String,
        #[arg(long = "book-author", help = "Book author")]
        book_author: String,
        #[arg(long, help = "Emit the created post as JSON")]
        json: bool,
    },
    #[command(arg_required_else_help = true, about = "Edit your post's title or content")]
    Edit {
        #[arg(help = "Post id")]
        id: u64,
        #[arg(long, help = "New title")]
        title: Option<String>,
        #[arg(long, help = "New review text")]
        content: Option<String>,
    },
    #[command(arg_required_else_help = true, about = "Delete your post")]
    Delete {
        #[arg(help = "Post id")]
        id: u64,
    },
    #[command(arg_required_else_help = true, about = "List a user's posts")]
    OfUser {
        #[arg(help = "User id")]
        user_id: u64,
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
    #[command(arg_required_else_help = true, about = "List posts related to a post")]
    Related {
        #[arg(help = "Post id")]
        id: u64,
        #[arg(long, default_value_t = 5, help = "Maximum related posts")]
        limit: u32,
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    #[command(about = "Edit your username or bio")]
    Edit {
        #[arg(long, help = "New username (2-20 chars)")]
        username: Option<String>,
        #[arg(long, help = "New profile bio")]
        bio: Option<String>,
        #[arg(long, help = "Emit the updated profile as JSON")]
        json: bool,
    },
}

#[derive(Subcommand)]
enum CommentsCommand {
    #[command(arg_required_else_help = true, about = "List a post's comments")]
    List {
        #[arg(help = "Post id")]
        post_id: u64,
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
    #[command(
        arg_required_else_help = true,
        about = "Add a comment (or a reply with --reply-to)"
    )]
    Add {
        #[arg(help = "Post id")]
        post_id: u64,
        #[arg(help = "Comment text")]
        content: String,
        #[arg(
            long = "reply-to",
            value_name = "COMMENT_ID",
            help = "Reply to a top-level comment"
        )]
        reply_to: Option<u64>,
    },
    #[command(arg_required_else_help = true, about = "Edit your comment")]
    Edit {
        #[arg(help = "Comment id")]
        comment_id: u64,
        #[arg(help = "New comment text")]
        content: String,
    },
    #[command(arg_required_else_help = true, about = "Delete your comment")]
    Delete {
        #[arg(help = "Comment id")]
        comment_id: u64,
    },
}

fn add_unauthorized_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Unauthorized || err.hint().is_some() {
        return err;
    }
    err.with_hint("Your session has been cleared. Log in again: dogear login <email> <password>.")
}

fn add_network_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Network || err.hint().is_some() {
        return err;
    }
    err.with_hint("Cannot reach the backend. Check that the server is running and --api points at it.")
}

fn add_io_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Io || err.hint().is_some() {
        return err;
    }
    err.with_hint("I/O error. Check the session file path and directory permissions.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_BACKTRACE=1 and share command/context if it persists.",
    )
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Unauthorized => "authentication required".to_string(),
        ErrorKind::Network => "network error".to_string(),
        ErrorKind::Server => "server error".to_string(),
        ErrorKind::Usage => "invalid arguments".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::Internal => "internal error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));
    if let Some(status) = err.status() {
        lines.push(format!(
            "{} {status}",
            colorize_label("status:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    lines.join("\n")
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    } else {
        serde_json::to_string(&value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    };
    println!("{json}");
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `dogear --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "dogear") else {
        return "Try `dogear --help`.".to_string();
    };

    let mut parts = Vec::new();
    for token in tokens.iter().skip(pos + 1) {
        if token.starts_with('-') || token.starts_with('<') || token.starts_with('[') {
            break;
        }
        parts.push(*token);
    }

    if parts.is_empty() {
        return "Try `dogear --help`.".to_string();
    }
    format!("Try `dogear {} --help`.", parts.join(" "))
}
