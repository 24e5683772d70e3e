//! Server-rendered HTML for the account pages.
//!
//! User input is always escaped. Password fields are never filled back in.

use crate::accounts::forms::{
    ConfirmForm, FormErrors, LoginForm, SignupForm, FIELD_CODE, FIELD_CONFIRM_PASSWORD,
    FIELD_EMAIL, FIELD_PASSWORD, FIELD_REMEMBER_ME,
};
use std::fmt::Write;

const SIGNUP_FIELDS: &[&str] = &[FIELD_EMAIL, FIELD_PASSWORD, FIELD_CONFIRM_PASSWORD];
const CONFIRM_FIELDS: &[&str] = &[FIELD_EMAIL, FIELD_CODE];
const LOGIN_FIELDS: &[&str] = &[FIELD_EMAIL, FIELD_PASSWORD, FIELD_REMEMBER_ME];

/// Escape text for use in HTML content and double-quoted attributes.
#[must_use]
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} - WebAdvert</title>
</head>
<body>
<nav>
<a href="/">Home</a>
<a href="/accounts/signup">Sign up</a>
<a href="/accounts/confirm">Confirm account</a>
<a href="/accounts/login">Log in</a>
</nav>
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>
"#
    )
}

/// Form-level errors, listed above the form.
fn summary(errors: &FormErrors, fields: &[&str]) -> String {
    let mut items = String::new();
    for (_, messages) in errors.form_level(fields) {
        for message in messages {
            let _ = writeln!(items, "<li>{}</li>", escape(message));
        }
    }

    if items.is_empty() {
        String::new()
    } else {
        format!("<ul class=\"validation-summary\">\n{items}</ul>\n")
    }
}

fn field_errors(errors: &FormErrors, field: &str) -> String {
    errors
        .field(field)
        .iter()
        .map(|message| format!("<span class=\"field-error\">{}</span>\n", escape(message)))
        .collect()
}

fn input(errors: &FormErrors, label: &str, name: &str, kind: &str, value: &str) -> String {
    format!(
        "<div>\n<label for=\"{name}\">{label}</label>\n<input id=\"{name}\" name=\"{name}\" type=\"{kind}\" value=\"{}\">\n{}</div>\n",
        escape(value),
        field_errors(errors, name)
    )
}

/// `GET /accounts`
#[must_use]
pub fn landing_page() -> String {
    page(
        "Accounts",
        "<p>Create an account, confirm it with the code we email you, then log in.</p>\n\
<ul>\n\
<li><a href=\"/accounts/signup\">Sign up</a></li>\n\
<li><a href=\"/accounts/confirm\">Confirm account</a></li>\n\
<li><a href=\"/accounts/login\">Log in</a></li>\n\
</ul>\n",
    )
}

/// `GET /`
#[must_use]
pub fn home_page(signed_in: bool) -> String {
    let body = if signed_in {
        "<p class=\"session\">You are signed in.</p>\n\
<form method=\"post\" action=\"/accounts/logout\">\n<button type=\"submit\">Log out</button>\n</form>\n"
    } else {
        "<p class=\"session\">You are not signed in. <a href=\"/accounts/login\">Log in</a> or <a href=\"/accounts/signup\">sign up</a>.</p>\n"
    };
    page("WebAdvert", body)
}

#[must_use]
pub fn signup_page(form: &SignupForm, errors: &FormErrors) -> String {
    let mut body = summary(errors, SIGNUP_FIELDS);
    body.push_str("<form method=\"post\" action=\"/accounts/signup\">\n");
    body.push_str(&input(errors, "Email", FIELD_EMAIL, "email", &form.email));
    body.push_str(&input(errors, "Password", FIELD_PASSWORD, "password", ""));
    body.push_str(&input(
        errors,
        "Confirm Password",
        FIELD_CONFIRM_PASSWORD,
        "password",
        "",
    ));
    body.push_str("<button type=\"submit\">Sign up</button>\n</form>\n");
    page("Sign up", &body)
}

#[must_use]
pub fn confirm_page(form: &ConfirmForm, errors: &FormErrors) -> String {
    let mut body = summary(errors, CONFIRM_FIELDS);
    body.push_str("<p>Enter the confirmation code sent to your email.</p>\n");
    body.push_str("<form method=\"post\" action=\"/accounts/confirm\">\n");
    body.push_str(&input(errors, "Email", FIELD_EMAIL, "email", &form.email));
    body.push_str(&input(errors, "Code", FIELD_CODE, "text", &form.code));
    body.push_str("<button type=\"submit\">Confirm</button>\n</form>\n");
    page("Confirm account", &body)
}

#[must_use]
pub fn login_page(form: &LoginForm, errors: &FormErrors) -> String {
    let mut body = summary(errors, LOGIN_FIELDS);
    body.push_str("<form method=\"post\" action=\"/accounts/login\">\n");
    body.push_str(&input(errors, "E-mail", FIELD_EMAIL, "email", &form.email));
    body.push_str(&input(errors, "Password", FIELD_PASSWORD, "password", ""));
    let checked = if form.remember_me { " checked" } else { "" };
    let _ = write!(
        body,
        "<div>\n<input id=\"{FIELD_REMEMBER_ME}\" name=\"{FIELD_REMEMBER_ME}\" type=\"checkbox\" value=\"true\"{checked}>\n<label for=\"{FIELD_REMEMBER_ME}\">Remember Me</label>\n</div>\n"
    );
    body.push_str("<button type=\"submit\">Log in</button>\n</form>\n");
    page("Log in", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
    }

    #[test]
    fn signup_page_keeps_email_but_not_passwords() {
        let form = SignupForm {
            email: "a\"b@c.com".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret2".to_string(),
        };
        let mut errors = FormErrors::new();
        errors.add(
            FIELD_CONFIRM_PASSWORD,
            "Password and its confirmation do not match",
        );

        let html = signup_page(&form, &errors);
        assert!(html.contains("value=\"a&quot;b@c.com\""));
        assert!(!html.contains("secret1"));
        assert!(!html.contains("secret2"));
        assert!(html.contains(
            "<span class=\"field-error\">Password and its confirmation do not match</span>"
        ));
        assert!(!html.contains("validation-summary"));
    }

    #[test]
    fn form_level_errors_go_to_the_summary() {
        let errors = FormErrors::single("User Exists", "User with this email already exists");
        let html = signup_page(&SignupForm::default(), &errors);
        assert!(html.contains(
            "<ul class=\"validation-summary\">\n<li>User with this email already exists</li>\n</ul>"
        ));
        assert!(!html.contains("field-error"));
    }

    #[test]
    fn login_page_preserves_remember_me() {
        let form = LoginForm {
            email: "a@b.com".to_string(),
            password: "secret1".to_string(),
            remember_me: true,
        };
        let html = login_page(&form, &FormErrors::new());
        assert!(html.contains("type=\"checkbox\" value=\"true\" checked>"));
        assert!(html.contains("value=\"a@b.com\""));
        assert!(!html.contains("secret1"));

        let html = login_page(&LoginForm::default(), &FormErrors::new());
        assert!(html.contains("type=\"checkbox\" value=\"true\">"));
    }

    #[test]
    fn confirm_page_shows_code_and_errors() {
        let form = ConfirmForm {
            email: "a@b.com".to_string(),
            code: "<1234>".to_string(),
        };
        let errors = FormErrors::single("CodeMismatch", "Invalid verification code provided");
        let html = confirm_page(&form, &errors);
        assert!(html.contains("value=\"&lt;1234&gt;\""));
        assert!(html.contains("<li>Invalid verification code provided</li>"));
    }

    #[test]
    fn home_page_reflects_session() {
        assert!(home_page(true).contains("You are signed in."));
        assert!(home_page(false).contains("You are not signed in."));
        assert!(landing_page().contains("href=\"/accounts/signup\""));
    }
}
