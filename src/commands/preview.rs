use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use appointment_notify_core::NotifierSettings;
use appointment_notify_core::recipient;
use appointment_notify_core::transport::{
    MailTransport, RecordingTransport, SendKind, SentMail, SmtpMailTransport,
};

use crate::commands::build_notifier;
use crate::fixtures;

pub fn run(
    settings: NotifierSettings,
    appointment_path: &Path,
    task_path: &Path,
    to: Option<String>,
    locale: &str,
    send: bool,
) -> Result<()> {
    let appointment = fixtures::load_appointment(appointment_path)?;
    let task = fixtures::load_task(task_path)?;
    let history = fixtures::history_for(&appointment);

    let recording = Arc::new(RecordingTransport::new());
    let transport: Arc<dyn MailTransport> = if send {
        let smtp = settings
            .smtp
            .as_ref()
            .context("--send needs an [smtp] section in the settings file")?;
        Arc::new(SmtpMailTransport::new(smtp, &settings.mail_list_separator)?)
    } else {
        recording.clone()
    };

    let notifier = build_notifier(settings, transport)?;

    let content = match to {
        Some(target) => notifier.compose_and_send(
            Some(&appointment),
            Some(&history),
            Some(&task),
            locale,
            &target,
        )?,
        None => recipient::notify_user(
            &notifier,
            Some(&appointment),
            Some(&history),
            Some(&task),
            locale,
        )?,
    };

    let Some(content) = content else {
        println!("Nothing to send.");
        return Ok(());
    };

    if send {
        println!("Sent: {}", content.subject);
        return Ok(());
    }

    for mail in recording.take() {
        print_mail(&mail);
    }
    Ok(())
}

fn print_mail(mail: &SentMail) {
    println!("From: {} <{}>", mail.sender_name, mail.sender_email);
    println!("To: {}", mail.to);
    if mail.kind != SendKind::Html {
        if !mail.cc.is_empty() {
            println!("Cc: {}", mail.cc);
        }
        if !mail.bcc.is_empty() {
            println!("Bcc: {}", mail.bcc);
        }
    }
    println!("Subject: {}", mail.subject);
    println!();
    println!("{}", mail.body);

    if let SendKind::Calendar { method, calendar } = &mail.kind {
        println!();
        println!("--- text/calendar; method={} ---", method.as_ics_str());
        print!("{calendar}");
    }
}
