mod commands;
mod fixtures;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use appointment_notify_core::NotifierSettings;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "appointment-notify")]
#[command(about = "Preview appointment notifications and calendar invites")]
struct Cli {
    /// Settings file (defaults to ~/.config/appointment-notify/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose the notification of a task for an appointment
    Preview {
        /// Appointment fixture (JSON)
        appointment: PathBuf,

        /// Notification task (TOML)
        task: PathBuf,

        /// Recipient (defaults to the appointment's mail, or its SMS gateway address)
        #[arg(long)]
        to: Option<String>,

        #[arg(long, default_value = "fr")]
        locale: String,

        /// Send it over SMTP instead of printing it
        #[arg(long)]
        send: bool,
    },
    /// Print the calendar invite of an appointment
    Invite {
        /// Appointment fixture (JSON)
        appointment: PathBuf,

        /// Attendee (defaults to the appointment's mail)
        #[arg(long)]
        to: Option<String>,

        /// Optional attendees, separator-delimited
        #[arg(long, default_value = "")]
        cc: String,

        /// Invite subject (defaults to the form title)
        #[arg(long)]
        subject: Option<String>,

        /// Cancel the meeting instead of creating it
        #[arg(long)]
        cancel: bool,
    },
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    let settings = NotifierSettings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Preview {
            appointment,
            task,
            to,
            locale,
            send,
        } => commands::preview::run(settings, &appointment, &task, to, &locale, send),
        Commands::Invite {
            appointment,
            to,
            cc,
            subject,
            cancel,
        } => commands::invite::run(settings, &appointment, to, &cc, subject, cancel),
    }
}
