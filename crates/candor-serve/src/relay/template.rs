//! Email bodies for the business notification and the customer confirmation.
//!
//! All submitter-provided text is HTML-escaped by maud.

use maud::{Markup, html};

use candor_core::ContactSubmission;

/// Brand palette.
mod colors {
    pub const PRIMARY: &str = "#045043";
    pub const TEXT: &str = "#0b0705";
    pub const MUTED: &str = "#959593";
    pub const LIGHT: &str = "#c4c5c7";
    pub const BACKGROUND: &str = "#fffeff";
    pub const LIGHT_BACKGROUND: &str = "#f8f9fa";
    pub const TABLE_HEADER: &str = "#f9f9f9";
    pub const BORDER: &str = "#959593";
    pub const WHITE: &str = "#fffeff";
}

pub const COMPANY: &str = "Candor Fiction";
pub const TAGLINE: &str = "It's All About the Story";
pub const RESPONSE_TIME: &str = "24 hours";
const SOURCE: &str = "Candor Fiction Website Contact Form";

/// Rendered subject and bodies of one email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Notification sent to the business inbox.
pub fn business_email(contact: &ContactSubmission, submitted_at: &str) -> RenderedEmail {
    let subject = format!("New Contact Form Submission from {}", contact.name);

    let cell_label = format!(
        "padding: 10px; border: 1px solid {}; background-color: {}; font-weight: bold;",
        colors::BORDER,
        colors::TABLE_HEADER
    );
    let cell_value = format!("padding: 10px; border: 1px solid {};", colors::BORDER);

    let markup = html! {
        html {
            body {
                h1 { "New Contact Form Submission" }
                div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;" {
                    h2 style={"color: " (colors::TEXT) ";"} { "Contact Details" }
                    table style="width: 100%; border-collapse: collapse; margin-bottom: 20px;" {
                        tr {
                            td style=(cell_label) { "Name:" }
                            td style=(cell_value) { (contact.name) }
                        }
                        tr {
                            td style=(cell_label) { "Email:" }
                            td style=(cell_value) {
                                a href={"mailto:" (contact.email)} { (contact.email) }
                            }
                        }
                        tr {
                            td style=(cell_label) { "Service Interest:" }
                            td style=(cell_value) { (contact.service) }
                        }
                    }

                    h3 style={"color: " (colors::TEXT) ";"} { "Message:" }
                    div style={
                        "background-color: " (colors::BACKGROUND) "; padding: 20px; border-radius: 8px; "
                        "border-left: 4px solid " (colors::PRIMARY) "; margin-bottom: 20px;"
                    } {
                        p style="margin: 0; line-height: 1.6;" { (multiline(&contact.message)) }
                    }

                    hr style={"border: none; border-top: 1px solid " (colors::BORDER) "; margin: 30px 0;"};
                    p style={"color: " (colors::MUTED) "; font-size: 14px;"} {
                        strong { "Submitted on:" } " " (submitted_at) br;
                        strong { "Source:" } " " (SOURCE)
                    }
                }
            }
        }
    };

    let text = format!(
        "New Contact Form Submission\n\n\
         === Contact Details ===\n\
         Name: {}\n\
         Email: {}\n\
         Service Interest: {}\n\n\
         === Message ===\n\
         {}\n\n\
         === Submission Info ===\n\
         Submitted on: {}\n\
         Source: {}",
        contact.name, contact.email, contact.service, contact.message, submitted_at, SOURCE
    );

    RenderedEmail {
        subject,
        html: markup.into_string(),
        text,
    }
}

/// Acknowledgement sent to the visitor.
pub fn confirmation_email(contact: &ContactSubmission) -> RenderedEmail {
    let subject = format!("Thank you for contacting {COMPANY}");

    let markup = html! {
        html {
            body {
                div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;" {
                    div style="text-align: center; margin-bottom: 30px;" {
                        h1 style={"color: " (colors::PRIMARY) "; margin-bottom: 10px;"} {
                            "Thank you for your message!"
                        }
                        p style={"color: " (colors::MUTED) "; font-size: 16px;"} {
                            "We appreciate you reaching out to " (COMPANY)
                        }
                    }

                    div style={
                        "background-color: " (colors::LIGHT_BACKGROUND)
                        "; padding: 25px; border-radius: 8px; margin-bottom: 25px;"
                    } {
                        p style="margin: 0 0 15px 0; font-size: 16px;" {
                            "Dear " strong { (contact.name) } ","
                        }
                        p style="margin: 0 0 15px 0; line-height: 1.6;" {
                            "We've received your inquiry about our " strong { (contact.service) }
                            " services and will get back to you within " strong { (RESPONSE_TIME) } "."
                        }
                        p style="margin: 0; line-height: 1.6;" {
                            "Our team is excited to help bring your story to life!"
                        }
                    }

                    div style={
                        "border-left: 4px solid " (colors::PRIMARY) "; padding-left: 20px; margin-bottom: 25px;"
                    } {
                        h3 style={"color: " (colors::TEXT) "; margin: 0 0 10px 0;"} { "Your Message:" }
                        div style={
                            "background-color: " (colors::BACKGROUND) "; padding: 15px; border-radius: 5px;"
                        } {
                            p style={"margin: 0; line-height: 1.6; color: " (colors::MUTED) ";"} {
                                (multiline(&contact.message))
                            }
                        }
                    }

                    div style={
                        "text-align: center; padding: 20px; background-color: " (colors::PRIMARY)
                        "; border-radius: 8px; color: " (colors::WHITE) ";"
                    } {
                        p style="margin: 0 0 10px 0; font-size: 18px; font-weight: bold;" { "Best regards," }
                        p style="margin: 0 0 5px 0;" { "The " (COMPANY) " Team" }
                        p style="margin: 0; font-style: italic; opacity: 0.9;" { (TAGLINE) }
                    }

                    div style={
                        "text-align: center; margin-top: 20px; padding-top: 20px; border-top: 1px solid "
                        (colors::BORDER) ";"
                    } {
                        p style={"margin: 0; font-size: 12px; color: " (colors::LIGHT) ";"} {
                            "This is an automated confirmation. Please do not reply to this email."
                        }
                    }
                }
            }
        }
    };

    let text = format!(
        "Thank you for contacting {COMPANY}!\n\n\
         Dear {},\n\n\
         We've received your inquiry about our {} services and will get back to you within {RESPONSE_TIME}.\n\n\
         Our team is excited to help bring your story to life!\n\n\
         === Your Message ===\n\
         {}\n\n\
         ===\n\
         Best regards,\n\
         The {COMPANY} Team\n\
         {TAGLINE}\n\n\
         ---\n\
         This is an automated confirmation. Please do not reply to this email.",
        contact.name, contact.service, contact.message
    );

    RenderedEmail {
        subject,
        html: markup.into_string(),
        text,
    }
}

/// Escaped text with newlines rendered as `<br>`.
fn multiline(text: &str) -> Markup {
    html! {
        @for (i, line) in text.lines().enumerate() {
            @if i > 0 { br; }
            (line)
        }
    }
}
