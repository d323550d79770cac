//! Interactive terminal quiz on top of the session driver.

use std::io::Write;

use quiz_core::model::{ContentRef, Question, Selection, option_label, parse_option_label};
use quiz_core::time::format_mmss;
use quiz_core::timer::remaining_ratio;
use services::{
    AppServices, ContentAdapter, DriverOutcome, ResultView, SessionError, SessionEvent,
    SessionHandle, TimerTone,
};
use tokio::io::{AsyncBufReadExt, BufReader};

enum Input {
    Choose(usize),
    Submit,
    Skip,
    Quit,
    Unknown,
}

fn parse_input(line: &str) -> Input {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "s" | "submit" => Input::Submit,
        "k" | "skip" => Input::Skip,
        "q" | "quit" => Input::Quit,
        other => parse_option_label(other).map_or(Input::Unknown, Input::Choose),
    }
}

fn print_question(question: &Question, index: usize, total: usize, limit_secs: i64) {
    println!();
    println!("QUESTIONS : {} / {}   [{}]", index + 1, total, format_mmss(limit_secs));
    println!("{}", question.prompt());
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}. {option}", option_label(i));
    }
    println!("Pick a letter, Enter to submit, k to skip, q to quit.");
}

fn print_tick(remaining: i64, limit_secs: i64) {
    let marker = match TimerTone::from_ratio(remaining_ratio(remaining, limit_secs)) {
        TimerTone::Calm => ' ',
        TimerTone::Warning => '!',
        TimerTone::Critical => '*',
    };
    print!("\r{marker} {} ", format_mmss(remaining));
    let _ = std::io::stdout().flush();
}

/// Run one quiz for `content` against stdin until it finishes or is cancelled.
///
/// # Errors
///
/// Returns repository or driver failures; an unavailable quiz is reported
/// to the user and is not an error.
pub async fn run_quiz(
    services: &AppServices,
    content: ContentRef,
) -> Result<(), Box<dyn std::error::Error>> {
    let adapter = ContentAdapter::new(content)
        .with_return_hook(|route| println!("Returning to {route}"));
    println!("{}", adapter.breadcrumb().join(" / "));

    let session = match services.quiz_loop().start_session(content).await {
        Ok(session) => session,
        Err(SessionError::Unavailable { .. }) => {
            println!("Quiz not available");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let questions = session.quiz().questions().to_vec();
    let (handle, mut events) = services.driver().spawn(session);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut current = 0;
    let mut limit_secs = 0;
    let mut input_open = true;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    SessionEvent::QuestionStarted { index, total, limit_secs: limit } => {
                        current = index;
                        limit_secs = limit;
                        if let Some(question) = questions.get(index) {
                            print_question(question, index, total, limit);
                        }
                    }
                    SessionEvent::Tick { remaining, .. } => print_tick(remaining, limit_secs),
                    SessionEvent::Selected { option, .. } => {
                        println!("\rSelected {}", option_label(option));
                    }
                    SessionEvent::Recorded { selection, timed_out, .. } => {
                        let what = match selection {
                            Selection::Selected(i) => format!("answer {}", option_label(i)),
                            Selection::Skipped => "skip".to_string(),
                        };
                        let how = if timed_out { " (time up)" } else { "" };
                        println!("\rRecorded {what}{how}");
                    }
                    SessionEvent::Rejected { reason, .. } => {
                        println!("\rIgnored: {reason:?}");
                    }
                    SessionEvent::Finished { .. } | SessionEvent::Cancelled { .. } => {}
                }
            }
            line = lines.next_line(), if input_open => {
                let sent = match line? {
                    Some(line) => send_input(&handle, current, &line).await,
                    None => {
                        input_open = false;
                        handle.cancel().await
                    }
                };
                // The driver may already have finished; stop reading in that case.
                if sent.is_err() {
                    input_open = false;
                }
            }
        }
    }

    match handle.join().await? {
        DriverOutcome::Finished { result, .. } => {
            let view = ResultView::from_result(&result);
            println!();
            println!("Quiz Result");
            println!("Your Score: {}", view.score_label());
            println!("[{}]", adapter.return_label());
            adapter.return_to_content();
        }
        DriverOutcome::Cancelled { answered } => {
            println!();
            println!("Quiz cancelled after {answered} answer(s); nothing was saved.");
        }
    }
    Ok(())
}

async fn send_input(handle: &SessionHandle, current: usize, line: &str) -> Result<(), SessionError> {
    match parse_input(line) {
        Input::Choose(option) => handle.select(current, option).await,
        Input::Submit => handle.submit(current).await,
        Input::Skip => handle.skip(current).await,
        Input::Quit => handle.cancel().await,
        Input::Unknown => {
            println!("Unrecognised input: {}", line.trim());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_maps_to_commands() {
        assert!(matches!(parse_input("b"), Input::Choose(1)));
        assert!(matches!(parse_input(" A "), Input::Choose(0)));
        assert!(matches!(parse_input(""), Input::Submit));
        assert!(matches!(parse_input("skip"), Input::Skip));
        assert!(matches!(parse_input("q"), Input::Quit));
        assert!(matches!(parse_input("??"), Input::Unknown));
    }
}
