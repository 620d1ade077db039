use std::path::PathBuf;

use clap::Args;
use tokio::io::AsyncReadExt;

use crate::client::attachment::read_data_url;
use crate::client::render::render_ticket;
use crate::client::session::ClientSession;
use crate::error::AppResult;
use crate::services::{Clipboard, TicketService};

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Bug report text. Read from stdin when omitted.
    pub text: Option<String>,
    /// Read the bug report from a file instead.
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
    /// Screenshot to attach.
    #[arg(short, long)]
    pub image: Option<PathBuf>,
    /// Copy the ticket to the clipboard as Markdown.
    #[arg(short, long)]
    pub copy: bool,
}

async fn report_text(args: &GenerateArgs) -> AppResult<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.file {
        return Ok(tokio::fs::read_to_string(path).await?);
    }
    let mut buffer = String::new();
    tokio::io::stdin().read_to_string(&mut buffer).await?;
    Ok(buffer.trim_end().to_string())
}

pub async fn run(
    mut session: ClientSession,
    args: GenerateArgs,
    service: &dyn TicketService,
    clipboard: &dyn Clipboard,
) -> AppResult<()> {
    session.set_text(report_text(&args).await?);
    if let Some(path) = &args.image {
        session.attach_image(read_data_url(path).await?);
    }

    let ticket = session.generate(service).await?;
    println!("{}", render_ticket(ticket));

    if args.copy && session.copy(clipboard).await? {
        println!("Copied to clipboard.");
    }
    println!(
        "{} / {} credits left today.",
        session.credits(),
        session.daily_limit()
    );
    Ok(())
}
