use crate::i18n::UiStrings;
use crate::models::site_data::FormText;
use crate::render::html_escape;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Sent,
    Pending,
    Failed,
}

/// State of the contact form as it should be drawn: field values, the
/// one-time submission id and an optional outcome banner.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactFormView {
    pub name: String,
    pub email: String,
    pub message: String,
    pub submission_id: String,
    pub notice: Option<Notice>,
}

impl ContactFormView {
    /// Blank form with a fresh submission id.
    pub fn fresh() -> Self {
        ContactFormView {
            name: String::new(),
            email: String::new(),
            message: String::new(),
            submission_id: uuid::Uuid::new_v4().to_string(),
            notice: None,
        }
    }

    /// After a successful send: fields cleared, new id for the next message.
    pub fn sent() -> Self {
        ContactFormView {
            notice: Some(Notice::Sent),
            ..Self::fresh()
        }
    }

    /// The same id is still being forwarded by an earlier request.
    pub fn pending(name: &str, email: &str, message: &str, submission_id: &str) -> Self {
        ContactFormView {
            notice: Some(Notice::Pending),
            ..Self::failed(name, email, message, submission_id)
        }
    }

    /// After a failed send: the typed values stay, and so does the id, so a
    /// resubmission is still recognised as the same message.
    pub fn failed(name: &str, email: &str, message: &str, submission_id: &str) -> Self {
        ContactFormView {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
            submission_id: submission_id.to_string(),
            notice: Some(Notice::Failed),
        }
    }
}

/// Build the contact form markup: labels from the data file, values and
/// banner from `view`.
pub fn render_form(view: &ContactFormView, labels: &FormText, ui: &UiStrings) -> String {
    let flash_html = match view.notice {
        Some(Notice::Sent) => format!(
            "<div class=\"contact-flash contact-flash-success\" role=\"status\">{}</div>",
            html_escape(ui.contact_sent)
        ),
        Some(Notice::Pending) => format!(
            "<div class=\"contact-flash contact-flash-pending\" role=\"status\">{}</div>",
            html_escape(ui.contact_pending)
        ),
        Some(Notice::Failed) => format!(
            "<div class=\"contact-flash contact-flash-error\" role=\"alert\">{}</div>",
            html_escape(ui.contact_failed)
        ),
        None => String::new(),
    };

    format!(
        r#"{flash_html}<form method="post" action="/contact" id="contactForm" class="contact-form">
<input type="hidden" name="submission_id" value="{submission_id}">
<div class="contact-form-group"><label for="nameInput" id="namePlaceholder">{name_label}</label><input type="text" id="nameInput" name="name" required placeholder="{name_label}" value="{name}"></div>
<div class="contact-form-group"><label for="emailInput" id="emailPlaceholder">{email_label}</label><input type="email" id="emailInput" name="email" required placeholder="{email_label}" value="{email}"></div>
<div class="contact-form-group"><label for="messageInput" id="messagePlaceholder">{message_label}</label><textarea id="messageInput" name="message" rows="6" required placeholder="{message_label}">{message}</textarea></div>
<button type="submit" class="contact-submit" data-disable-on-submit><span id="sendBtnText">{send}</span></button>
</form>"#,
        flash_html = flash_html,
        submission_id = html_escape(&view.submission_id),
        name_label = html_escape(&labels.name),
        email_label = html_escape(&labels.email),
        message_label = html_escape(&labels.message),
        send = html_escape(&labels.send_button),
        name = html_escape(&view.name),
        email = html_escape(&view.email),
        message = html_escape(&view.message),
    )
}
