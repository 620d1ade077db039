use std::future;
use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{self, MissedTickBehavior};

use crate::client::attachment::read_data_url;
use crate::client::render::{render_ticket, status_line};
use crate::client::session::{COOLDOWN_TICK, ClientSession};
use crate::error::{AppError, AppResult};
use crate::services::{Clipboard, TicketService};

const HELP: &str = "\
Type the bug report; every line is added to the description.
Start a line with // to add text that begins with a slash.
  /generate        triage the description into a ticket
  /image <path>    attach a screenshot (/image alone removes it)
  /copy            copy the ticket to the clipboard as Markdown
  /show            print the current description and ticket
  /clear           start a new description
  /credits         show remaining credits
  /help            show this help
  /quit            leave";

#[derive(Debug, PartialEq, Eq)]
enum Action<'a> {
    Generate,
    Image(Option<&'a str>),
    Copy,
    Show,
    Clear,
    Credits,
    Help,
    Quit,
    Unknown(&'a str),
    Text(&'a str),
}

fn parse_action(line: &str) -> Action<'_> {
    let trimmed = line.trim_start();
    if let Some(text) = trimmed.strip_prefix('/').filter(|rest| rest.starts_with('/')) {
        return Action::Text(text);
    }
    let Some(command) = trimmed.trim_end().strip_prefix('/') else {
        return Action::Text(line);
    };
    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    match name {
        "generate" | "go" => Action::Generate,
        "image" => Action::Image(Some(rest).filter(|path| !path.is_empty())),
        "copy" => Action::Copy,
        "show" => Action::Show,
        "clear" => Action::Clear,
        "credits" => Action::Credits,
        "help" => Action::Help,
        "quit" | "exit" => Action::Quit,
        other => Action::Unknown(other),
    }
}

/// Interactive client: stdin lines, the cooldown ticker and the copied
/// deadline all drive one session from a single task.
pub async fn run(
    mut session: ClientSession,
    service: &dyn TicketService,
    clipboard: &dyn Clipboard,
) -> AppResult<()> {
    println!("TicketZero: AI triage agent");
    println!("{HELP}");
    println!("{}", status_line(&session));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = time::interval(COOLDOWN_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        let copied_until = session.copied_deadline();
        let copied_deadline = async move {
            match copied_until {
                Some(deadline) => time::sleep_until(deadline).await,
                None => future::pending::<()>().await,
            }
        };

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let show_status = match parse_action(&line) {
                    Action::Quit => break,
                    Action::Text(text) => {
                        session.append_line(text);
                        false
                    }
                    Action::Generate => {
                        generate(&mut session, service).await;
                        if session.cooldown() > 0 {
                            ticker.reset();
                        }
                        true
                    }
                    Action::Image(Some(path)) => {
                        attach(&mut session, Path::new(path)).await;
                        true
                    }
                    Action::Image(None) => {
                        session.detach_image();
                        println!("Screenshot removed.");
                        true
                    }
                    Action::Copy => {
                        match session.copy(clipboard).await {
                            Ok(true) => println!("Copied!"),
                            Ok(false) => println!("Nothing to copy yet."),
                            Err(err) => eprintln!("{err}"),
                        }
                        true
                    }
                    Action::Show => {
                        show(&session);
                        true
                    }
                    Action::Clear => {
                        session.set_text(String::new());
                        println!("Description cleared.");
                        true
                    }
                    Action::Credits => true,
                    Action::Help => {
                        println!("{HELP}");
                        false
                    }
                    Action::Unknown(name) => {
                        println!(
                            "Unknown command '/{name}'. Try /help, or start the line with // to add it as text."
                        );
                        false
                    }
                };
                if show_status {
                    println!("{}", status_line(&session));
                }
            }
            _ = ticker.tick(), if session.cooldown() > 0 => {
                match session.tick() {
                    0 => println!("Cooldown finished. {}", status_line(&session)),
                    remaining => println!("Cooldown: {remaining}s"),
                }
            }
            _ = copied_deadline => {
                if session.expire_copied() {
                    println!("{}", status_line(&session));
                }
            }
        }
    }

    Ok(())
}

async fn generate(session: &mut ClientSession, service: &dyn TicketService) {
    println!("Processing...");
    match session.generate(service).await {
        Ok(ticket) => println!("\n{}", render_ticket(ticket)),
        Err(AppError::QuotaExhausted) => eprintln!("Daily limit reached."),
        Err(err) => eprintln!("{err}"),
    }
}

async fn attach(session: &mut ClientSession, path: &Path) {
    match read_data_url(path).await {
        Ok(data_url) => {
            session.attach_image(data_url);
            println!("Screenshot attached.");
        }
        Err(err) => eprintln!("{err}"),
    }
}

fn show(session: &ClientSession) {
    if session.text().is_empty() {
        println!("(no description yet)");
    } else {
        println!("{}", session.text());
    }
    if let Some(ticket) = session.ticket() {
        println!("\n{}", render_ticket(ticket));
    }
}
