//! Interactive admin console for provisioning users and session tokens.
//!
//! The app itself has no signup flow; an operator creates users here and
//! hands out the minted tokens. Clients present them via the session cookie
//! or the Authorization header.

use anyhow::Result;
use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

mod cli_style;
use cli_style::get_styles;

use geeklog_server::user::{
    AuthToken, AuthTokenValue, SqliteUserStore, UserAuthTokenStore, UserStore,
};

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles=get_styles())]
struct CliArgs {
    /// Path to the users SQLite database file.
    #[clap(value_parser = parse_path)]
    pub path: PathBuf,
}

#[derive(Parser)]
#[command(styles=get_styles(), name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Creates a user with the given handle.
    AddUser { user_handle: String },

    /// Mints a new session token for the given user.
    AddToken { user_handle: String },

    /// Revokes a session token by its value.
    RevokeToken { token: String },

    /// Shows a user's id and session tokens.
    Show { user_handle: String },

    /// Shows all user handles.
    UserHandles,

    /// Deletes tokens unused for the given number of days.
    Prune { unused_for_days: u64 },

    /// Shows the path of the current users db.
    Where,

    /// Close this program.
    Exit,
}

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

const PROMPT: &str = ">> ";

fn execute_command(
    line: String,
    user_store: &SqliteUserStore,
    db_path: String,
) -> CommandExecutionResult {
    if line.is_empty() {
        return CommandExecutionResult::Ok;
    }

    let args =
        shlex::split(&line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect());

    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

    match cli {
        Ok(cli) => {
            println!("{} {}", PROMPT, &line);
            match cli.command {
                InnerCommand::AddUser { user_handle } => {
                    match user_store.create_user(&user_handle) {
                        Ok(user_id) => println!("Created user '{}' with id {}", user_handle, user_id),
                        Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                    }
                }
                InnerCommand::AddToken { user_handle } => {
                    let user_id = match user_store.get_user_id(&user_handle) {
                        Ok(Some(user_id)) => user_id,
                        Ok(None) => {
                            return CommandExecutionResult::Error(format!(
                                "User '{}' not found",
                                user_handle
                            ));
                        }
                        Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                    };
                    let token = AuthToken {
                        user_id,
                        value: AuthTokenValue::generate(),
                        created: Utc::now().timestamp(),
                        last_used: None,
                    };
                    if let Err(err) = user_store.add_user_auth_token(token.clone()) {
                        return CommandExecutionResult::Error(format!("{}", err));
                    }
                    println!("New token for '{}':\n{}", user_handle, token.value.0);
                }
                InnerCommand::RevokeToken { token } => {
                    match user_store.delete_user_auth_token(&AuthTokenValue(token)) {
                        Ok(Some(_)) => println!("Token revoked."),
                        Ok(None) => println!("No such token."),
                        Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                    }
                }
                InnerCommand::Show { user_handle } => {
                    match user_store.get_user_id(&user_handle) {
                        Ok(Some(user_id)) => println!("User id: {}", user_id),
                        Ok(None) => {
                            return CommandExecutionResult::Error(format!(
                                "User '{}' not found",
                                user_handle
                            ));
                        }
                        Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                    }

                    match user_store.get_all_user_auth_tokens(&user_handle) {
                        Ok(tokens) => {
                            println!("\nSession Tokens:");
                            if tokens.is_empty() {
                                println!("  (no tokens)");
                            }
                            for token in tokens.iter() {
                                println!("{:#?}", token);
                            }
                        }
                        Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                    }
                }
                InnerCommand::UserHandles => match user_store.get_all_user_handles() {
                    Ok(handles) => println!("{:#?}", handles),
                    Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                },
                InnerCommand::Prune { unused_for_days } => {
                    match user_store.prune_unused_auth_tokens(unused_for_days) {
                        Ok(count) => println!("Pruned {} token(s)", count),
                        Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                    }
                }
                InnerCommand::Where => {
                    println!("{}", db_path);
                }
                InnerCommand::Exit => return CommandExecutionResult::Exit,
            }
        }

        Err(e) => {
            if e.print().is_err() {
                println!("{}", e);
            }
        }
    }
    CommandExecutionResult::Ok
}

#[derive(rustyline_derive::Hinter)]
struct MyHelper {
    commands_names: Vec<String>,
}

impl MyHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        MyHelper { commands_names }
    }
}

impl Completer for MyHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(" ") {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .map(|c| c.to_string())
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for MyHelper {}
impl Validator for MyHelper {}
impl Helper for MyHelper {}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    let user_store = SqliteUserStore::new(&cli_args.path)?;

    InnerCli::command().print_long_help()?;

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::<MyHelper, FileHistory>::with_config(config)?;

    let helper = MyHelper::new();
    rl.set_helper(Some(helper));
    let _ = rl.clear_screen();

    loop {
        let readline = rl.readline(PROMPT);

        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match execute_command(line, &user_store, cli_args.path.display().to_string()) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => {
                        break;
                    }
                    CommandExecutionResult::Error(err) => {
                        eprintln!("Error: {:?}", err);
                        continue;
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
