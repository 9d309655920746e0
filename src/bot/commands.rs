/// An admin command parsed from a message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Login { password: String },
    Logout,
    AddFeed { url: String, name: String },
    RemoveFeed { url: String },
    ListFeeds,
}

pub const USAGE_LOGIN: &str = "Please provide the password. Usage: /login <password>";
pub const USAGE_ADDFEED: &str =
    "Please provide both URL and name for the feed.\nUsage: /addfeed <url> <name>";
pub const USAGE_REMOVEFEED: &str =
    "Please provide the URL of the feed to remove.\nUsage: /removefeed <url>";

/// Parse one message text. `None` for non-commands and unknown commands
/// (those are ignored, not answered); `Some(Err(usage))` when a known
/// command is missing arguments.
pub fn parse(text: &str) -> Option<Result<Command, &'static str>> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }

    let (command, args) = match text.split_once(char::is_whitespace) {
        Some((command, args)) => (command, args.trim()),
        None => (text, ""),
    };
    // Commands in groups can arrive as "/listfeeds@mybot"
    let command = command.split('@').next().unwrap_or(command);

    match command {
        "/start" => Some(Ok(Command::Start)),
        "/logout" => Some(Ok(Command::Logout)),
        "/listfeeds" => Some(Ok(Command::ListFeeds)),
        "/login" => {
            if args.is_empty() {
                Some(Err(USAGE_LOGIN))
            } else {
                Some(Ok(Command::Login {
                    password: args.to_string(),
                }))
            }
        }
        "/addfeed" => match args.split_once(char::is_whitespace) {
            Some((url, name)) if !name.trim().is_empty() => Some(Ok(Command::AddFeed {
                url: url.to_string(),
                name: name.trim().to_string(),
            })),
            _ => Some(Err(USAGE_ADDFEED)),
        },
        "/removefeed" => {
            if args.is_empty() {
                Some(Err(USAGE_REMOVEFEED))
            } else {
                Some(Ok(Command::RemoveFeed {
                    url: args.to_string(),
                }))
            }
        }
        _ => None,
    }
}
