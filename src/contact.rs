//! Contact endpoint stand-in for the preview server.
//!
//! Answers form posts the way the deployed endpoint does (method check,
//! per-address rate limit, honeypot, validation, JSON or HTML reply) but
//! only logs accepted submissions instead of mailing them.

use crate::log;
use parking_lot::Mutex;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::{
    borrow::Cow,
    net::IpAddr,
    sync::LazyLock,
    time::{Duration, Instant},
};

/// Minimum spacing between two submissions from one address.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(20);

const MAX_NAME: usize = 100;
const MAX_EMAIL: usize = 200;
const MAX_PHONE: usize = 50;
const MAX_MESSAGE: usize = 5000;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s.]+(?:\.[^@\s.]+)+$").unwrap());

/// A decoded form submission, trimmed and length-capped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ContactForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    /// Honeypot field. Humans never see it, so anything here is a bot.
    pub gotcha: String,
}

impl ContactForm {
    /// Decode an `application/x-www-form-urlencoded` body.
    ///
    /// Unknown fields are ignored; a repeated field keeps its last value.
    pub fn parse(body: &str) -> Self {
        let mut form = Self::default();
        for pair in body.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode_component(value);
            let value = value.trim();

            match decode_component(key).as_str() {
                "first_name" => form.first_name = truncate(value, MAX_NAME),
                "last_name" => form.last_name = truncate(value, MAX_NAME),
                "email" => form.email = truncate(value, MAX_EMAIL),
                "phone" => form.phone = truncate(value, MAX_PHONE),
                "message" => form.message = truncate(value, MAX_MESSAGE),
                "_gotcha" => form.gotcha = value.to_owned(),
                _ => {}
            }
        }
        form
    }

    pub fn is_spam(&self) -> bool {
        !self.gotcha.is_empty()
    }

    /// Messages for every invalid field, empty when the form is valid.
    pub fn validate(&self) -> Vec<&'static str> {
        let mut errors = Vec::new();
        if self.first_name.is_empty() {
            errors.push("Vorname ist erforderlich.");
        }
        if self.last_name.is_empty() {
            errors.push("Nachname ist erforderlich.");
        }
        if self.message.is_empty() {
            errors.push("Nachricht ist erforderlich.");
        }
        if !EMAIL_RE.is_match(&self.email) {
            errors.push("Gültige E-Mail ist erforderlich.");
        }
        // Reply-To header injection
        if self.email.contains(['\r', '\n']) {
            errors.push("Ungültige E-Mail.");
        }
        errors
    }
}

/// `+` is a space in form bodies; `urlencoding` only handles `%XX`.
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Whether the client asked for a JSON reply.
///
/// True when `Accept` names `application/json` or `X-Requested-With`
/// mentions `fetch`/`XMLHttpRequest`, compared case-insensitively.
pub fn wants_json(accept: Option<&str>, requested_with: Option<&str>) -> bool {
    let contains = |header: Option<&str>, needle: &str| {
        header.is_some_and(|value| value.to_ascii_lowercase().contains(needle))
    };
    contains(accept, "application/json")
        || contains(requested_with, "fetch")
        || contains(requested_with, "xmlhttprequest")
}

/// How a submission was answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    /// Honeypot filled: answered as a success, silently dropped.
    Spam,
    Invalid(Vec<&'static str>),
    RateLimited,
    MethodNotAllowed,
    /// The request body could not be read.
    Failed,
}

#[derive(Serialize)]
struct JsonBody<'a> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    messages: &'a [&'static str],
}

/// A rendered HTTP reply, independent of the server library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.to_owned(),
        }
    }
}

impl Outcome {
    pub fn status(&self) -> u16 {
        match self {
            Self::Accepted | Self::Spam => 200,
            Self::Invalid(_) => 400,
            Self::MethodNotAllowed => 405,
            Self::RateLimited => 429,
            Self::Failed => 500,
        }
    }

    /// Render the reply, as JSON or as a small HTML page.
    pub fn reply(&self, json: bool) -> Reply {
        let status = self.status();

        // Plain text regardless of negotiation
        match self {
            Self::MethodNotAllowed => return Reply::text(status, "Method Not Allowed"),
            Self::Spam if !json => return Reply::text(status, "OK"),
            _ => {}
        }

        if json {
            let (ok, error, messages) = match self {
                Self::Accepted | Self::Spam => (true, None, &[][..]),
                Self::Invalid(messages) => (false, Some("validation"), messages.as_slice()),
                Self::RateLimited => (false, Some("rate_limited"), &[][..]),
                Self::MethodNotAllowed | Self::Failed => (false, None, &[][..]),
            };
            let body = serde_json::to_string(&JsonBody {
                ok,
                error,
                messages,
            })
            .unwrap_or_else(|_| format!(r#"{{"ok":{ok}}}"#));
            return Reply {
                status,
                content_type: "application/json; charset=utf-8",
                body,
            };
        }

        let body = match self {
            Self::Accepted => page(
                "Danke",
                "Danke! Ihre Nachricht wurde gesendet.",
                "Zur Startseite",
            ),
            Self::Invalid(messages) => page("Fehler", &messages.join(" "), "Zurück"),
            Self::RateLimited => "<!doctype html><meta charset=\"utf-8\"><title>Zu viele Anfragen</title>\
                 <p>Bitte versuchen Sie es später erneut.</p>"
                .to_owned(),
            Self::Spam | Self::MethodNotAllowed | Self::Failed => page(
                "Fehler",
                "Entschuldigung, die Nachricht konnte nicht gesendet werden. \
                 Bitte versuchen Sie es später erneut.",
                "Zurück",
            ),
        };
        Reply {
            status,
            content_type: "text/html; charset=utf-8",
            body,
        }
    }
}

fn page(title: &str, text: &str, link: &str) -> String {
    format!(
        "<!doctype html><meta charset=\"utf-8\"><title>{title}</title>\
         <p>{}</p><p><a href=\"/\">{link}</a></p>",
        html_escape(text)
    )
}

fn html_escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#039;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Form handler with an in-memory per-address rate limit.
#[derive(Debug)]
pub struct ContactEndpoint {
    window: Duration,
    last_seen: Mutex<FxHashMap<IpAddr, Instant>>,
}

impl Default for ContactEndpoint {
    fn default() -> Self {
        Self::new(RATE_LIMIT_WINDOW)
    }
}

impl ContactEndpoint {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: Mutex::new(FxHashMap::default()),
        }
    }

    /// Record a submission from `addr`. Returns false if it came too soon.
    fn admit(&self, addr: IpAddr, now: Instant) -> bool {
        let mut last_seen = self.last_seen.lock();
        // Whatever survives the sweep is still inside the window
        last_seen.retain(|_, last| now.duration_since(*last) < self.window);
        if last_seen.contains_key(&addr) {
            return false;
        }
        last_seen.insert(addr, now);
        true
    }

    /// Decide the outcome of one request.
    pub fn submit(&self, method: &str, addr: IpAddr, body: &str) -> Outcome {
        self.submit_at(method, addr, body, Instant::now())
    }

    fn submit_at(&self, method: &str, addr: IpAddr, body: &str, now: Instant) -> Outcome {
        if !method.eq_ignore_ascii_case("POST") {
            return Outcome::MethodNotAllowed;
        }
        if !self.admit(addr, now) {
            log!("contact"; "rate limited {addr}");
            return Outcome::RateLimited;
        }

        let form = ContactForm::parse(body);
        if form.is_spam() {
            log!("contact"; "honeypot filled by {addr}, dropped");
            return Outcome::Spam;
        }

        let errors = form.validate();
        if !errors.is_empty() {
            return Outcome::Invalid(errors);
        }

        let phone = if form.phone.is_empty() { "-" } else { &form.phone };
        log!("contact"; "{} {} <{}> tel {}: {} chars (not sent)",
            form.first_name, form.last_name, form.email, phone, form.message.chars().count());
        Outcome::Accepted
    }
}
