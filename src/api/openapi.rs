use utoipa::{
    openapi::{Contact, Info, InfoBuilder, License},
    OpenApi,
};

use super::envelope::Envelope;
use super::handlers::{auth, health, hr};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::verify_code::verify_code,
        auth::login::do_login,
        auth::login::login_prompt,
        auth::session::logout,
        hr::list_operators,
        hr::update_operator,
        hr::delete_operator,
        hr::list_roles,
        hr::assign_roles,
    ),
    components(schemas(
        Envelope,
        auth::types::LoginForm,
        auth::types::OperatorProfile,
        hr::OperatorUpdateRequest,
        hr::RoleAssignmentRequest,
        hr::Role,
        health::Health,
    )),
    tags(
        (name = "auth", description = "Login, logout, and verification codes"),
        (name = "hr", description = "Operator administration"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();
    spec.info = cargo_info();
    spec
}

fn cargo_info() -> Info {
    // Use Cargo.toml metadata instead of the derive macro defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();
    info
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    if let Some(start) = author.find('<') {
        let name = author[..start].trim();
        let email = author[start + 1..].trim_end_matches('>').trim();
        let name = if name.is_empty() { None } else { Some(name) };
        let email = if email.is_empty() { None } else { Some(email) };
        (name, email)
    } else {
        let name = author.trim();
        (if name.is_empty() { None } else { Some(name) }, None)
    }
}
