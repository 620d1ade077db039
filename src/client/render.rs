use colored::{ColoredString, Colorize};

use crate::client::session::{ClientSession, Phase};
use crate::domain::ticket::{SeverityBadge, Ticket};

fn badge(ticket: &Ticket) -> ColoredString {
    let label = format!(" {} ", ticket.severity.to_uppercase());
    match ticket.badge() {
        SeverityBadge::Alert => label.red().bold().reversed(),
        SeverityBadge::Default => label.blue().bold(),
    }
}

pub fn render_ticket(ticket: &Ticket) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", ticket.title.bold()));
    out.push_str(&format!("{}  {}\n\n", badge(ticket), "AI Generated".dimmed()));

    out.push_str(&format!("{}\n", "SUMMARY".dimmed()));
    out.push_str(&format!("  {}\n\n", ticket.summary));

    out.push_str(&format!("{}\n", "STEPS TO REPRODUCE".dimmed()));
    for (index, step) in ticket.steps.iter().enumerate() {
        out.push_str(&format!("  {} {step}\n", format!("{}.", index + 1).cyan()));
    }
    out.push('\n');

    out.push_str(&format!("{}\n", "SUGGESTED FIX".dimmed()));
    out.push_str(&format!("  {}\n", ticket.fix.cyan()));
    out
}

/// One-line status shown before each prompt.
pub fn status_line(session: &ClientSession) -> String {
    let credits = format!("{} / {} credits", session.credits(), session.daily_limit());
    let button = if session.copied() {
        "Copied!".to_string()
    } else if session.phase() == Phase::Loading {
        "Processing...".to_string()
    } else if session.cooldown() > 0 {
        format!("Cooldown: {}s", session.cooldown())
    } else if session.can_generate() {
        "ready".to_string()
    } else {
        "waiting for input".to_string()
    };
    let image = if session.has_image() {
        "screenshot attached"
    } else {
        "no screenshot"
    };
    format!("[{credits} | {image} | {button}]")
}
