use crate::errors::DomainError;
use url::Url;

pub const TITLE_MAX_LENGTH: usize = 200;
pub const URL_MAX_LENGTH: usize = 200;
pub const REQUIREMENTS_FILE_MAX_LENGTH: usize = 100;
pub const USERNAME_MAX_LENGTH: usize = 150;
pub const EMAIL_MAX_LENGTH: usize = 254;
pub const NAME_MAX_LENGTH: usize = 30;

const REPOSITORY_HOSTS: [&str; 3] = ["github.com", "gitlab.com", "bitbucket.org"];
const REQUIREMENTS_FILE_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

/// Trims a required text field and checks its length in characters.
pub fn required_text(
    field: &str,
    value: &str,
    max_length: Option<usize>,
) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{} is required.", field)));
    }
    if let Some(max) = max_length {
        if value.chars().count() > max {
            return Err(DomainError::validation(format!(
                "{} must be at most {} characters.",
                field, max
            )));
        }
    }
    Ok(value.to_string())
}

pub fn title(value: &str) -> Result<String, DomainError> {
    required_text("Title", value, Some(TITLE_MAX_LENGTH))
}

pub fn description(value: &str) -> Result<String, DomainError> {
    required_text("Description", value, None)
}

fn parse_http_url(value: &str) -> Option<Url> {
    let url = Url::parse(value).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Accepts http(s) links hosted on GitHub, GitLab or Bitbucket, subdomains
/// included.
pub fn repository_url(value: &str) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > URL_MAX_LENGTH {
        return Err(DomainError::InvalidRepositoryUrl);
    }
    let url = parse_http_url(value).ok_or(DomainError::InvalidRepositoryUrl)?;
    let host = url
        .host_str()
        .map(|h| h.to_ascii_lowercase())
        .ok_or(DomainError::InvalidRepositoryUrl)?;

    let allowed = REPOSITORY_HOSTS
        .iter()
        .any(|allowed| host == *allowed || host.ends_with(&format!(".{}", allowed)));
    if !allowed {
        return Err(DomainError::InvalidRepositoryUrl);
    }
    Ok(value.to_string())
}

/// Validates an optional deployment link. Blank input means "no link".
pub fn deployed_url(value: Option<&str>) -> Result<Option<String>, DomainError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > URL_MAX_LENGTH {
        return Err(DomainError::validation(format!(
            "Deployed URL must be at most {} characters.",
            URL_MAX_LENGTH
        )));
    }
    if parse_http_url(value).is_none() {
        return Err(DomainError::validation("Enter a valid deployed URL."));
    }
    Ok(Some(value.to_string()))
}

/// Validates the opaque reference of an uploaded requirements document.
pub fn requirements_file(value: Option<&str>) -> Result<Option<String>, DomainError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > REQUIREMENTS_FILE_MAX_LENGTH {
        return Err(DomainError::validation(format!(
            "Requirements file name must be at most {} characters.",
            REQUIREMENTS_FILE_MAX_LENGTH
        )));
    }
    let extension = value
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !REQUIREMENTS_FILE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(DomainError::validation(
            "Requirements file must be a PDF, DOC or DOCX document.",
        ));
    }
    Ok(Some(value.to_string()))
}

pub fn username(value: &str) -> Result<String, DomainError> {
    let value = required_text("Username", value, Some(USERNAME_MAX_LENGTH))?;
    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '@' | '+' | '_' | '-'));
    if !valid {
        return Err(DomainError::validation(
            "Username may only contain letters, digits and @/./+/-/_ characters.",
        ));
    }
    Ok(value)
}

pub fn email(value: &str) -> Result<String, DomainError> {
    let value = required_text("Email", value, Some(EMAIL_MAX_LENGTH))?;
    let invalid = || DomainError::validation("Enter a valid email address.");

    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let dotted = domain.split('.').collect::<Vec<_>>();
    if dotted.len() < 2 || dotted.iter().any(|label| label.is_empty()) {
        return Err(invalid());
    }
    Ok(value.to_lowercase())
}

pub fn person_name(field: &str, value: &str) -> Result<String, DomainError> {
    required_text(field, value, Some(NAME_MAX_LENGTH))
}
