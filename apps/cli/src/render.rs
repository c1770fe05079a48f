use console::style;
use tracing::warn;
use vidzpro_core::{
    CompletionState, Notice, SessionOutput, SessionSnapshot, format_date, format_phone_number,
    format_timestamp, format_watched, key_points,
    status::{InitialStatus, StatusSource},
    types::{PurchasedPlan, UserProfile, Video, VideoCategoriesResponse, VideoDetail},
};

fn rule() {
    println!("{}", style("─".repeat(60)).dim());
}

fn state_label(state: CompletionState) -> &'static str {
    match state {
        CompletionState::NotStarted => "not started",
        CompletionState::InProgress => "watching",
        CompletionState::PendingConfirmation => "waiting for confirmation",
        CompletionState::AwaitingUnderstandingAck => "waiting for understanding",
        CompletionState::Completed => "completed",
    }
}

pub fn profile(profile: &UserProfile) {
    println!(
        "\n{} {}",
        style(format!("{} {}", profile.first_name, profile.last_name))
            .cyan()
            .bold(),
        style(format!("#{}", profile.id)).dim()
    );
    println!("  {:<8}{}", style("Email").dim(), profile.email);
    println!(
        "  {:<8}{}",
        style("Phone").dim(),
        format_phone_number(profile.phone.as_deref())
    );
}

pub fn plan(plan: &PurchasedPlan) {
    match &plan.subscription {
        Some(subscription) => println!(
            "{} {}",
            style("Plan:").dim(),
            style(&subscription.name).cyan().bold()
        ),
        None => println!("{}", style("No active subscription").yellow()),
    }
    if let Some(url) = &plan.subscription_image_url {
        println!("  {}", style(url).dim());
    }
}

pub fn categories(response: &VideoCategoriesResponse) {
    for (heading, list) in [("Toolbox", &response.data), ("ISO", &response.iso)] {
        if list.is_empty() {
            continue;
        }
        println!("\n{}", style(heading).cyan().bold());
        for category in list {
            println!(
                "  {:>4}  {} {}",
                style(category.id).dim(),
                category.name,
                style(format!("[{}]", category.kind)).dim()
            );
        }
    }
}

pub fn videos(videos: &[Video], page: Option<(u32, u32)>) {
    if videos.is_empty() {
        println!("{}", style("No videos assigned").yellow());
    }
    for video in videos {
        let mark = if video.is_completed {
            style("✓").green().bold()
        } else {
            style("·").dim()
        };
        let when = match video.completed_date.as_deref() {
            Some(completed) if video.is_completed => {
                format!("completed {}", format_date(Some(completed)))
            }
            _ => format!("assigned {}", format_date(Some(&video.assign_date))),
        };
        println!(
            "{} {:>5}  {} {}",
            mark,
            style(video.id).dim(),
            video.video_title,
            style(when).dim()
        );
    }
    if let Some((current, last)) = page {
        println!("{}", style(format!("page {current} of {last}")).dim());
    }
}

pub fn detail(detail: &VideoDetail) {
    println!("\n{}", style(&detail.title).cyan().bold());
    if !detail.description.is_empty() {
        println!("{}", detail.description);
    }
    let points = key_points(&detail.key_points);
    if !points.is_empty() {
        println!("\n{}", style("Key points").bold());
        for point in points {
            println!("  • {point}");
        }
    }
    if detail.is_completed {
        println!("\n{}", style("Completed").green());
    }
    println!("{}", style(&detail.url).dim());
}

pub fn session_header(detail: &VideoDetail, status: &InitialStatus) {
    println!("\n{}  {}", style("vidzpro").cyan().bold(), style(&detail.title).bold());
    if status.completed {
        let from = match status.source {
            StatusSource::Remote => "",
            StatusSource::LocalFlag => " (saved on this device)",
            StatusSource::VideoRecord | StatusSource::Unknown => " (from video record)",
        };
        println!(
            "{} Already completed{}{}",
            style("✓").green().bold(),
            style(from).dim(),
            status
                .completed_at
                .as_deref()
                .map(|at| format!(" on {}", format_date(Some(at))))
                .unwrap_or_default()
        );
    }
    rule();
}

pub fn snapshot(snapshot: &SessionSnapshot) {
    println!(
        "{} {}  {} / {}  {}",
        style(state_label(snapshot.state)).yellow(),
        format_watched(snapshot.watched_percent),
        format_timestamp(snapshot.max_reached_position),
        format_timestamp(snapshot.total_duration),
        style(format!("v{}", snapshot.version)).dim()
    );
}

pub fn output(output: &SessionOutput, keyword: &str) {
    match output {
        // Player commands go out as JSON lines for whatever drives the player.
        SessionOutput::Player(command) => match serde_json::to_string(command) {
            Ok(json) => println!("{json}"),
            Err(e) => warn!(error = %e, "could not encode player command"),
        },
        SessionOutput::Notice(notice) => self::notice(notice, keyword),
    }
}

fn notice(notice: &Notice, keyword: &str) {
    match notice {
        Notice::ForwardBlocked => println!(
            "{} Forward seeking is disabled. Please watch the video in order.",
            style("!").yellow().bold()
        ),
        Notice::ConfirmationRequired => println!(
            "{} Video finished. Type {} to confirm.",
            style("?").cyan().bold(),
            style(format!(":confirm {keyword}")).bold()
        ),
        Notice::UnderstandingPrompt => println!(
            "{} Do you understand the video? {}",
            style("?").cyan().bold(),
            style("(:yes / :no)").dim()
        ),
        Notice::KeywordRejected { message } => {
            println!("{} {}", style("✗").red().bold(), message)
        }
        Notice::NotEnoughWatched { watched, threshold } => println!(
            "{} You have watched {:.0}% of the video. At least {:.0}% is required.",
            style("✗").red().bold(),
            watched,
            threshold
        ),
        Notice::ReportFailed { message, retryable } => {
            println!(
                "{} Could not mark the video as watched: {}",
                style("✗").red().bold(),
                message
            );
            if *retryable {
                println!("  {}", style("Answer :yes again to retry.").dim());
            }
        }
        Notice::MustReauthenticate { message } => {
            println!("{} {}", style("✗").red().bold(), message);
            println!(
                "  {}",
                style("Sign in again with `vidzpro login <email>`.").dim()
            );
        }
        Notice::Completed => println!(
            "{} Video marked as understood. {}",
            style("✓").green().bold(),
            format_watched(100.0)
        ),
    }
}
