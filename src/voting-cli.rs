//! An interactive terminal voting client for the retiro backend.
//! It drives the same step-by-step flow as the web client: categories come in
//! pages, every category on a page needs a selection before the page can be
//! submitted, and progress survives closing and reopening the tool.

use std::collections::HashMap;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use clap::{Arg, ArgAction, ArgMatches, Command};
use rand::Rng;
use rocket::serde::json::serde_json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use retiro_backend::model::api::{
    ballot::{VoteRequest, VotedGroups},
    category::CategorySummary,
    id::ApiId,
    participant::ParticipantSummary,
};
use retiro_backend::model::mongodb::{serde_string_map, Id};
use retiro_backend::session::{CastOutcome, SessionState, VotingSession};

const PROGRAM_NAME: &str = "voting-cli";

const ABOUT_TEXT: &str = "Vote in the retreat awards from a terminal.

The flow matches the web client: pick someone for every category on the
current step, submit, and move on. Progress is saved after every change,
so the tool can be closed and reopened at any point.";

const SERVER: &str = "SERVER";
const STATE_FILE: &str = "STATE_FILE";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .arg(
            Arg::new(SERVER)
                .long("server")
                .help("Base URL of the backend")
                .action(ArgAction::Set)
                .default_value("http://localhost:8000"),
        )
        .arg(
            Arg::new(STATE_FILE)
                .long("state-file")
                .help("Where to keep the device ID and cached selections")
                .action(ArgAction::Set)
                .default_value("voting-state.json"),
        )
}

/// Errors that this program may produce.
#[derive(Debug, Error)]
enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid state file: {0}")]
    State(serde_json::Error),
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server rejected the request: {0}")]
    Server(String),
}

/// On-disk device state: the stable device ID plus any selections that have
/// not been submitted yet.
#[derive(Debug, Serialize, Deserialize)]
struct DeviceState {
    device_id: String,
    #[serde(default, with = "serde_string_map")]
    selections: HashMap<Id, Vec<ApiId>>,
}

/// Generate a fresh device ID: 16 random bytes as lowercase hex.
fn new_device_id() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    data_encoding::HEXLOWER.encode(&bytes)
}

fn load_state(path: &Path) -> Result<DeviceState, Error> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(Error::State)
    } else {
        Ok(DeviceState {
            device_id: new_device_id(),
            selections: HashMap::new(),
        })
    }
}

fn save_state(path: &Path, state: &DeviceState) -> Result<(), Error> {
    let contents = serde_json::to_string_pretty(state).map_err(Error::State)?;
    fs::write(path, contents)?;
    Ok(())
}

fn to_state(selections: &HashMap<Id, Vec<Id>>) -> HashMap<Id, Vec<ApiId>> {
    selections
        .iter()
        .map(|(category, group)| (*category, group.iter().copied().map(ApiId::from).collect()))
        .collect()
}

/// Typed requests against the backend.
struct Api {
    client: reqwest::Client,
    base: String,
}

impl Api {
    fn new(base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    async fn categories(&self) -> Result<Vec<CategorySummary>, Error> {
        let response = self
            .client
            .get(format!("{}/categories", self.base))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn voted_groups(&self, device_id: &str) -> Result<VotedGroups, Error> {
        let response = self
            .client
            .get(format!("{}/my-ballots", self.base))
            .query(&[("deviceId", device_id)])
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn search(&self, query: &str) -> Result<Vec<ParticipantSummary>, Error> {
        let response = self
            .client
            .get(format!("{}/participants/search", self.base))
            .query(&[("query", query)])
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Cast one category's vote. Conflicts are an outcome, not an error:
    /// the flow treats an existing ballot as that category being done.
    async fn cast(
        &self,
        device_id: &str,
        category_id: Id,
        group: Vec<Id>,
    ) -> Result<CastOutcome, Error> {
        let request = VoteRequest {
            category_id: Some(category_id),
            device_id: Some(device_id.to_string()),
            participant_ids: group,
            participant_id: None,
        };
        let response = self
            .client
            .post(format!("{}/vote", self.base))
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(CastOutcome::Accepted)
        } else if status == reqwest::StatusCode::CONFLICT {
            Ok(CastOutcome::Duplicate)
        } else {
            Ok(CastOutcome::Failed(error_message(response).await))
        }
    }
}

/// Turn a non-2xx response into an error carrying the server's message.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(Error::Server(error_message(response).await))
    }
}

/// Extract the `error` field of an error body, falling back to the status.
async fn error_message(response: reqwest::Response) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    }
}

/// Read one trimmed line, or `None` at end of input.
fn prompt(input: &mut impl BufRead, text: &str) -> io::Result<Option<String>> {
    print!("{text}");
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Search the roster and record a selection for the given category.
async fn select_for(
    api: &Api,
    input: &mut impl BufRead,
    session: &mut VotingSession,
    category: &CategorySummary,
) -> Result<(), Error> {
    println!("Voting in '{}'.", category.name);
    if category.allow_multiple_winners {
        println!("This category takes a group: pick several numbers separated by spaces.");
    }

    let query = match prompt(input, "Search the roster: ")? {
        Some(query) if !query.is_empty() => query,
        _ => return Ok(()),
    };
    let matches = api.search(&query).await?;
    if matches.is_empty() {
        println!("Nobody matched '{query}'.");
        return Ok(());
    }
    for (index, participant) in matches.iter().enumerate() {
        match &participant.nickname {
            Some(nickname) => println!("  {}. {} ({nickname})", index + 1, participant.name),
            None => println!("  {}. {}", index + 1, participant.name),
        }
    }

    let picks = match prompt(input, "Pick: ")? {
        Some(picks) if !picks.is_empty() => picks,
        _ => return Ok(()),
    };
    let mut group = Vec::new();
    for pick in picks.split_whitespace() {
        match pick.parse::<usize>() {
            Ok(n) if (1..=matches.len()).contains(&n) => group.push(*matches[n - 1].id),
            _ => {
                println!("'{pick}' is not one of the options.");
                return Ok(());
            }
        }
    }
    if !category.allow_multiple_winners && group.len() > 1 {
        println!("'{}' takes a single winner.", category.name);
        return Ok(());
    }

    session.select(*category.id, group);
    Ok(())
}

/// Submit the current step: cast every pending selection, then advance.
/// A failed cast leaves the session on the same step so it can be retried.
async fn submit_step(
    api: &Api,
    session: &mut VotingSession,
    state: &mut DeviceState,
    state_path: &Path,
) -> Result<(), Error> {
    let missing = session.missing_selections();
    if !missing.is_empty() {
        println!("Still needs a selection:");
        for category in missing {
            println!("  - {}", category.name);
        }
        return Ok(());
    }

    for (category_id, group) in session.pending_submissions() {
        let outcome = api.cast(&state.device_id, category_id, group).await?;
        if let CastOutcome::Duplicate = outcome {
            println!("A vote was already recorded in one category; keeping it.");
        }
        if !session.record_outcome(category_id, &outcome) {
            if let CastOutcome::Failed(message) = outcome {
                println!("Submitting failed: {message}");
                println!("Nothing was lost; submit again to retry.");
            }
            return Ok(());
        }
    }

    session.advance();
    state.selections = to_state(session.selections());
    save_state(state_path, state)?;

    match session.state() {
        SessionState::Completed => println!("All done. Obrigado por votar!"),
        SessionState::InProgress { step } => {
            println!("Step {} of {} coming up.", step + 1, session.total_steps())
        }
        SessionState::NoCategories => {}
    }
    Ok(())
}

async fn run(args: &ArgMatches) -> Result<(), Error> {
    let server: &String = args.get_one(SERVER).unwrap(); // Has a default value.
    let state_file: &String = args.get_one(STATE_FILE).unwrap(); // Has a default value.
    let state_path = Path::new(state_file);

    let api = Api::new(server);
    let mut state = load_state(state_path)?;
    // Persist immediately so a fresh device ID survives an early exit.
    save_state(state_path, &state)?;

    let categories = api.categories().await?;
    let voted = api.voted_groups(&state.device_id).await?;
    let server_votes = voted
        .groups
        .into_iter()
        .map(|(category, group)| (category, group.into_iter().map(|id| *id).collect()))
        .collect();
    let cached = state
        .selections
        .iter()
        .map(|(category, group)| (*category, group.iter().map(|id| **id).collect()))
        .collect();
    let mut session = VotingSession::resume(categories, server_votes, cached);

    match session.state() {
        SessionState::NoCategories => {
            println!("Voting is not open right now.");
            return Ok(());
        }
        SessionState::Completed => {
            println!("This device has already voted in every category. Obrigado!");
            return Ok(());
        }
        SessionState::InProgress { .. } => {}
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();

    while let SessionState::InProgress { step } = session.state() {
        println!();
        println!("--- Step {} of {} ---", step + 1, session.total_steps());
        for (index, category) in session.step_categories().iter().enumerate() {
            let marker = if session.is_voted(*category.id) {
                "[voted]"
            } else if session.selection(*category.id).is_some() {
                "[selected]"
            } else {
                "[ ]"
            };
            println!("  {}. {} {marker}", index + 1, category.name);
        }
        println!(
            "Commands: 1-{} pick a category, s submit, b back, q quit",
            session.step_categories().len()
        );

        let command = match prompt(&mut input, "> ")? {
            Some(command) => command,
            None => break,
        };
        match command.as_str() {
            "q" => break,
            "b" => {
                if !session.back() {
                    println!("Already on the first step.");
                }
            }
            "s" => submit_step(&api, &mut session, &mut state, state_path).await?,
            other => match other.parse::<usize>() {
                Ok(n) if (1..=session.step_categories().len()).contains(&n) => {
                    let category = session.step_categories()[n - 1].clone();
                    if session.is_voted(*category.id) {
                        println!("'{}' already has a recorded vote.", category.name);
                        continue;
                    }
                    select_for(&api, &mut input, &mut session, &category).await?;
                    state.selections = to_state(session.selections());
                    save_state(state_path, &state)?;
                }
                _ => println!("Unrecognised command."),
            },
        }
    }

    Ok(())
}

#[rocket::main]
async fn main() {
    let args = cli().get_matches();
    if let Err(err) = run(&args).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_cli_usage() {
        let args = cli().try_get_matches_from([PROGRAM_NAME]).unwrap();
        assert_eq!(
            args.get_one::<String>(SERVER).unwrap(),
            "http://localhost:8000"
        );
        assert_eq!(
            args.get_one::<String>(STATE_FILE).unwrap(),
            "voting-state.json"
        );

        let command_line = [
            PROGRAM_NAME,
            "--server",
            "http://10.0.0.2:9000",
            "--state-file",
            "/tmp/retiro-votes.json",
        ];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(args.get_one::<String>(SERVER).unwrap(), "http://10.0.0.2:9000");
        assert_eq!(
            args.get_one::<String>(STATE_FILE).unwrap(),
            "/tmp/retiro-votes.json"
        );
    }

    #[test]
    fn bad_cli_usage() {
        let command_line = [PROGRAM_NAME, "--bogus"];
        cli().try_get_matches_from(command_line).unwrap_err();

        let command_line = [PROGRAM_NAME, "stray-positional"];
        cli().try_get_matches_from(command_line).unwrap_err();
    }

    #[test]
    fn device_ids_are_well_formed_and_fresh() {
        let id = new_device_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_device_id());
    }

    #[test]
    fn state_survives_a_round_trip_through_disk() {
        let path = std::env::temp_dir().join(format!("voting-state-test-{}.json", std::process::id()));

        let category = Id::new();
        let participant = Id::new();
        let state = DeviceState {
            device_id: new_device_id(),
            selections: HashMap::from([(category, vec![ApiId::from(participant)])]),
        };
        save_state(&path, &state).unwrap();
        let restored = load_state(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(restored.device_id, state.device_id);
        assert_eq!(restored.selections, state.selections);
    }

    #[test]
    fn missing_state_file_gets_a_fresh_device() {
        let path = Path::new("does-not-exist/voting-state.json");
        let state = load_state(path).unwrap();
        assert_eq!(state.device_id.len(), 32);
        assert!(state.selections.is_empty());
    }
}
