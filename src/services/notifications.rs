//! Notification emails. Everything except the admin reply is best-effort:
//! a failed send is logged and the triggering operation still succeeds.

use super::{Email, Mailer};
use crate::entities::{contact, investment};

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn row(label: &str, value: &str) -> String {
    format!("<p><strong>{}:</strong> {}</p>", label, escape_html(value))
}

fn block(text: &str) -> String {
    format!("<p style=\"white-space: pre-wrap;\">{}</p>", escape_html(text))
}

pub fn contact_received(admin_inbox: &str, contact: &contact::Model) -> Email {
    let html = [
        "<h2>New contact message</h2>".to_string(),
        row("Name", &contact.name),
        row("Email", &contact.email),
        row("Phone", contact.phone.as_deref().unwrap_or("not provided")),
        row("Subject", &contact.subject),
        block(&contact.message),
    ]
    .concat();

    Email {
        to: admin_inbox.to_string(),
        reply_to: Some(contact.email.clone()),
        subject: format!("New contact message: {}", contact.subject),
        html,
    }
}

pub fn investment_submitted(admin_inbox: &str, investment: &investment::Model, project_title: &str) -> Email {
    let mut parts = vec![
        "<h2>New investment application</h2>".to_string(),
        row("Name", &investment.investor_name),
        row("Email", &investment.email),
        row("Phone", &investment.phone),
        row("Project", project_title),
        row("Amount", &investment.amount.to_string()),
        row("Type", investment.investment_type.label()),
    ];
    if let Some(deadline) = investment.investment_deadline {
        parts.push(row("Expected date", &deadline.format("%Y-%m-%d").to_string()));
    }
    if let Some(message) = investment.message.as_deref() {
        parts.push(block(message));
    }
    parts.push("<p>This investment is <strong>pending</strong> until approved in the admin panel.</p>".to_string());

    Email {
        to: admin_inbox.to_string(),
        reply_to: Some(investment.email.clone()),
        subject: format!("New investment application - {}", investment.investor_name),
        html: parts.concat(),
    }
}

pub fn investment_status_changed(investment: &investment::Model, project_title: &str) -> Email {
    let status = investment.status.as_str();
    let html = [
        format!("<p>Dear {},</p>", escape_html(&investment.investor_name)),
        format!(
            "<p>Your investment of {} in <strong>{}</strong> is now <strong>{}</strong>.</p>",
            investment.amount,
            escape_html(project_title),
            status
        ),
    ]
    .concat();

    Email {
        to: investment.email.clone(),
        reply_to: None,
        subject: format!("Investment update: {}", status),
        html,
    }
}

pub fn contact_reply(contact: &contact::Model, message: &str) -> Email {
    let html = [
        format!("<p>Dear {},</p>", escape_html(&contact.name)),
        block(message),
    ]
    .concat();

    Email {
        to: contact.email.clone(),
        reply_to: None,
        subject: format!("Re: {}", contact.subject),
        html,
    }
}

/// Sends `email`, logging instead of propagating failures. Returns whether it went out.
pub async fn deliver_best_effort(mailer: &dyn Mailer, email: Email, kind: &str) -> bool {
    match mailer.send(email).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(kind, error = %e, "email sending failed (non-critical)");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::contact::ContactStatus;
    use chrono::Utc;

    fn contact() -> contact::Model {
        contact::Model {
            id: 1,
            name: "Rahim <b>".to_string(),
            email: "rahim@example.com".to_string(),
            phone: None,
            subject: "Price of bull #4".to_string(),
            message: "Is it still available?".to_string(),
            status: ContactStatus::New,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn contact_notification_replies_to_sender_and_escapes() {
        let email = contact_received("owner@farm.test", &contact());
        assert_eq!(email.to, "owner@farm.test");
        assert_eq!(email.reply_to.as_deref(), Some("rahim@example.com"));
        assert!(email.html.contains("Rahim &lt;b&gt;"));
        assert!(email.html.contains("not provided"));
    }

    #[test]
    fn reply_prefixes_subject() {
        let email = contact_reply(&contact(), "Yes, come by on Friday.");
        assert_eq!(email.subject, "Re: Price of bull #4");
        assert_eq!(email.to, "rahim@example.com");
    }
}
