//! Email templates
//!
//! Subject, plain text and HTML bodies for verification emails. Every
//! user-provided string is HTML-escaped before it reaches the HTML body.

use platform::mail::MailMessage;

use crate::domain::repository::{DecisionNotice, VerificationRequestedNotice};
use crate::domain::value_objects::VerificationStatus;

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

fn layout(heading: &str, body_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #1f2933; max-width: 600px; margin: 0 auto;">
<h2>{heading}</h2>
{body_html}
<p style="color: #7b8794; font-size: 12px;">This is an automated message from the portfolio platform.</p>
</body>
</html>"#
    )
}

/// Email asking a verifier to review an item
pub fn verification_requested(notice: &VerificationRequestedNotice, link: &str) -> MailMessage {
    let kind = notice.item_kind.label();
    let expires = notice.expires_at.format("%Y-%m-%d %H:%M UTC");

    let subject = format!(
        "Verification request: {} from {}",
        notice.item_title, notice.requester_name
    );

    let text = format!(
        "Hello {verifier},\n\n\
         {requester} has asked you to verify their {kind} \"{title}\".\n\n\
         Review it here: {link}\n\n\
         This link is valid for 72 hours (until {expires}).\n\
         If you were not expecting this request you can ignore this email.\n",
        verifier = notice.verifier_name,
        requester = notice.requester_name,
        title = notice.item_title,
    );

    let body = format!(
        r#"<p>Hello {verifier},</p>
<p><strong>{requester}</strong> has asked you to verify their {kind} <strong>&quot;{title}&quot;</strong>.</p>
<p><a href="{link}" style="display: inline-block; padding: 10px 18px; background: #2563eb; color: #ffffff; text-decoration: none; border-radius: 4px;">Review request</a></p>
<p>This link is valid for 72 hours (until {expires}).</p>
<p>If you were not expecting this request you can ignore this email.</p>"#,
        verifier = escape_html(&notice.verifier_name),
        requester = escape_html(&notice.requester_name),
        title = escape_html(&notice.item_title),
        link = escape_html(link),
    );

    MailMessage {
        to: notice.verifier_email.clone(),
        subject,
        text,
        html: layout("Verification request", &body),
    }
}

/// Email telling an item owner how their request was decided
pub fn decision(notice: &DecisionNotice) -> MailMessage {
    let kind = notice.item_kind.label();
    let (verb, heading) = match notice.status {
        VerificationStatus::Approved => ("approved", "Your item was verified"),
        _ => ("rejected", "Your verification request was rejected"),
    };

    let subject = format!("Your {kind} \"{}\" was {verb}", notice.item_title);

    let mut text = format!(
        "Hello {owner},\n\n{actor} has {verb} your {kind} \"{title}\".\n",
        owner = notice.owner_name,
        actor = notice.actor_name,
        title = notice.item_title,
    );
    let mut body = format!(
        "<p>Hello {owner},</p>\n<p>{actor} has {verb} your {kind} <strong>&quot;{title}&quot;</strong>.</p>",
        owner = escape_html(&notice.owner_name),
        actor = escape_html(&notice.actor_name),
        title = escape_html(&notice.item_title),
    );

    if let Some(comment) = &notice.comment {
        text.push_str(&format!("\nComment from the verifier:\n{comment}\n"));
        body.push_str(&format!(
            "\n<p>Comment from the verifier:</p>\n<blockquote>{}</blockquote>",
            escape_html(comment)
        ));
    }

    if notice.status == VerificationStatus::Rejected {
        text.push_str("\nYou can update the item and request verification again.\n");
        body.push_str("\n<p>You can update the item and request verification again.</p>");
    }

    MailMessage {
        to: notice.owner_email.clone(),
        subject,
        text,
        html: layout(heading, &body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ItemKind;
    use chrono::{TimeZone, Utc};

    fn requested() -> VerificationRequestedNotice {
        VerificationRequestedNotice {
            verifier_email: "prof@mit.edu".to_string(),
            verifier_name: "Prof. Vega".to_string(),
            token: "abc".to_string(),
            item_title: "Research <Assistant>".to_string(),
            item_kind: ItemKind::Experience,
            requester_name: "Sam & Co".to_string(),
            expires_at: Utc.with_ymd_and_hms(2026, 3, 4, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom's & co</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom&#39;s &amp; co&lt;/a&gt;"
        );
    }

    #[test]
    fn test_requested_email_contains_link_and_escapes() {
        let link = "https://app.example/verify/abc";
        let msg = verification_requested(&requested(), link);

        assert_eq!(msg.to, "prof@mit.edu");
        assert!(msg.subject.contains("Research <Assistant>"));
        assert!(msg.text.contains(link));
        assert!(msg.text.contains("2026-03-04 12:00 UTC"));
        assert!(msg.html.contains(link));
        assert!(msg.html.contains("Research &lt;Assistant&gt;"));
        assert!(msg.html.contains("Sam &amp; Co"));
        assert!(!msg.html.contains("<Assistant>"));
    }

    #[test]
    fn test_decision_email_wording() {
        let mut notice = DecisionNotice {
            owner_email: "sam@mit.edu".to_string(),
            owner_name: "Sam".to_string(),
            item_title: "Compilers".to_string(),
            item_kind: ItemKind::Project,
            status: VerificationStatus::Approved,
            comment: Some("Great <b>work</b>".to_string()),
            actor_name: "Prof. Vega".to_string(),
        };

        let approved = decision(&notice);
        assert_eq!(approved.to, "sam@mit.edu");
        assert!(approved.subject.contains("approved"));
        assert!(approved.text.contains("Great <b>work</b>"));
        assert!(approved.html.contains("Great &lt;b&gt;work&lt;/b&gt;"));
        assert!(!approved.text.contains("request verification again"));

        notice.status = VerificationStatus::Rejected;
        notice.comment = None;
        let rejected = decision(&notice);
        assert!(rejected.subject.contains("rejected"));
        assert!(rejected.text.contains("request verification again"));
        assert!(!rejected.text.contains("Comment from the verifier"));
    }
}
