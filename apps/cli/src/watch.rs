//! Interactive watch loop.
//!
//! Stdin carries two kinds of lines: JSON player messages as posted by the
//! embedded player script, and `:commands` typed by the viewer.

use std::{sync::Arc, time::Duration};

use anyhow::{Result, bail};
use console::style;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time::timeout,
};
use vidzpro_core::{
    ApiClient, FileStore, GateConfig, Notice, PlayerEvent, SessionHandle, SessionOutput,
    SessionSnapshot, UserAction, VideoId, open_session,
};

use crate::{create_spinner, render};

/// Upper bound on waiting for a report still in flight when stdin closes.
const REPORT_GRACE: Duration = Duration::from_secs(30);

#[derive(Debug, PartialEq)]
enum Input {
    Player(PlayerEvent),
    User(UserAction),
    Status,
    Help,
    Quit,
    Blank,
}

fn parse_input(line: &str) -> std::result::Result<Input, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Blank);
    }

    if let Some(command) = line.strip_prefix(':') {
        let (name, arg) = command.split_once(' ').unwrap_or((command, ""));
        return match name {
            "confirm" => Ok(Input::User(UserAction::SubmitKeyword(arg.trim().to_string()))),
            "yes" | "y" => Ok(Input::User(UserAction::AnswerUnderstanding(true))),
            "no" | "n" => Ok(Input::User(UserAction::AnswerUnderstanding(false))),
            "again" => Ok(Input::User(UserAction::WatchAgain)),
            "status" => Ok(Input::Status),
            "help" => Ok(Input::Help),
            "quit" | "q" => Ok(Input::Quit),
            other => Err(format!("unknown command :{other}")),
        };
    }

    PlayerEvent::parse(line)
        .map(Input::Player)
        .map_err(|e| format!("not a player message ({e})"))
}

fn print_help() {
    println!(
        "{}",
        style(
            "player JSON lines, or :confirm <word>, :yes, :no, :again, :status, :help, :quit"
        )
        .dim()
    );
}

enum Step {
    Line(Option<String>),
    Output(Option<SessionOutput>),
}

fn refresh(handle: &SessionHandle, last: &mut Option<SessionSnapshot>) {
    if let Some(snapshot) = handle.poll_snapshot() {
        *last = Some(snapshot);
    }
}

pub async fn run(
    api: Arc<ApiClient>,
    store: Arc<FileStore>,
    video: VideoId,
    gate: &GateConfig,
) -> Result<()> {
    let spinner = create_spinner("Loading video...");
    let opened = open_session(api, store, video, gate).await;
    spinner.finish_and_clear();
    let mut handle = opened?;

    render::session_header(handle.detail(), handle.initial_status());
    print_help();

    let keyword = gate.confirmation_keyword.as_str();
    let mut last: Option<SessionSnapshot> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let step = tokio::select! {
            line = lines.next_line() => Step::Line(line?),
            output = handle.next_output() => Step::Output(output),
        };
        refresh(&handle, &mut last);

        let line = match step {
            Step::Output(Some(output)) => {
                render::output(&output, keyword);
                continue;
            }
            Step::Output(None) => bail!("watch session stopped unexpectedly"),
            Step::Line(None) => break,
            Step::Line(Some(line)) => line,
        };

        let accepted = match parse_input(&line) {
            Ok(Input::Player(event)) => handle.player_event(event),
            Ok(Input::User(action)) => handle.user_action(action),
            Ok(Input::Status) => {
                match &last {
                    Some(snapshot) => render::snapshot(snapshot),
                    None => println!("{}", style("no progress yet").dim()),
                }
                true
            }
            Ok(Input::Help) => {
                print_help();
                true
            }
            Ok(Input::Quit) => break,
            Ok(Input::Blank) => true,
            Err(reason) => {
                eprintln!("{} {}", style("?").yellow().bold(), reason);
                true
            }
        };
        if !accepted {
            bail!("watch session is no longer running");
        }
    }

    settle(&mut handle, &mut last, keyword).await;
    if let Some(snapshot) = &last {
        render::snapshot(snapshot);
    }
    handle.close().await
}

/// Whether `output` is the last word on a completion report.
fn settles_report(output: &SessionOutput) -> bool {
    matches!(
        output,
        SessionOutput::Notice(
            Notice::Completed | Notice::ReportFailed { .. } | Notice::MustReauthenticate { .. }
        )
    )
}

/// Print whatever is still queued and give an in-flight report time to land.
///
/// Outputs go out before the snapshot that reflects them, so the report's
/// own notice ends the wait rather than the `reporting` flag.
async fn settle(handle: &mut SessionHandle, last: &mut Option<SessionSnapshot>, keyword: &str) {
    let mut settled = false;
    while let Some(output) = handle.try_next_output() {
        render::output(&output, keyword);
        settled |= settles_report(&output);
    }
    refresh(handle, last);

    while !settled && last.as_ref().is_some_and(|s| s.reporting) {
        match timeout(REPORT_GRACE, handle.next_output()).await {
            Ok(Some(output)) => {
                render::output(&output, keyword);
                settled = settles_report(&output);
            }
            _ => break,
        }
        refresh(handle, last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_viewer_commands() {
        assert_eq!(
            parse_input(":confirm  complete "),
            Ok(Input::User(UserAction::SubmitKeyword("complete".into())))
        );
        assert_eq!(
            parse_input(":yes"),
            Ok(Input::User(UserAction::AnswerUnderstanding(true)))
        );
        assert_eq!(parse_input(":again"), Ok(Input::User(UserAction::WatchAgain)));
        assert_eq!(parse_input("   "), Ok(Input::Blank));
        assert!(parse_input(":skip").is_err());
    }

    #[test]
    fn parses_player_lines() {
        assert_eq!(
            parse_input(r#"{"type":"timeupdate","seconds":12.5}"#),
            Ok(Input::Player(PlayerEvent::TimeUpdate { seconds: 12.5 }))
        );
        assert!(parse_input("timeupdate 12").is_err());
    }

    #[test]
    fn report_outcomes_end_the_wait() {
        assert!(settles_report(&SessionOutput::Notice(Notice::Completed)));
        assert!(settles_report(&SessionOutput::Notice(Notice::ReportFailed {
            message: "offline".into(),
            retryable: true,
        })));
        assert!(settles_report(&SessionOutput::Notice(
            Notice::MustReauthenticate {
                message: "Unauthorized".into(),
            }
        )));
        assert!(!settles_report(&SessionOutput::Notice(Notice::UnderstandingPrompt)));
        assert!(!settles_report(&SessionOutput::Notice(Notice::ForwardBlocked)));
    }
}
