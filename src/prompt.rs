use std::io::{BufRead, Write};

use crate::error::{DeployError, DeployResult};

/// Validation callback: `Err` carries the message shown before
/// asking again.
pub type Validator = fn(&str) -> Result<(), String>;

/// Line-based interactive prompts.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask until `validate` accepts the trimmed answer. Fails when
    /// input ends first.
    pub fn ask(&mut self, label: &str, validate: Validator) -> DeployResult<String> {
        loop {
            write!(self.output, "{label}: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(DeployError::InvalidInput(format!(
                    "no value entered for {label}"
                )));
            }

            let answer = line.trim();
            match validate(answer) {
                Ok(()) => return Ok(answer.to_string()),
                Err(msg) => writeln!(self.output, "  {msg}")?,
            }
        }
    }

    /// Use `given` when present (validated, no re-prompt),
    /// otherwise ask.
    pub fn resolve(
        &mut self,
        given: Option<&str>,
        label: &str,
        validate: Validator,
    ) -> DeployResult<String> {
        match given {
            Some(value) => {
                let value = value.trim();
                validate(value)
                    .map_err(|msg| DeployError::InvalidInput(format!("{label}: {msg}")))?;
                Ok(value.to_string())
            }
            None => self.ask(label, validate),
        }
    }
}

/// Prompts on the terminal: read stdin, write stderr so stdout
/// stays clean.
#[must_use]
pub fn stdio() -> Prompter<std::io::StdinLock<'static>, std::io::Stderr> {
    Prompter::new(std::io::stdin().lock(), std::io::stderr())
}

/// A bare host name such as `postiz.example.com`.
pub fn validate_domain(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("domain must not be empty".into());
    }
    if value.contains("://") {
        return Err("enter the domain without http:// or https://".into());
    }
    if value.contains('/') || value.chars().any(char::is_whitespace) {
        return Err("domain must not contain paths or spaces".into());
    }
    if !value.contains('.') || value.starts_with('.') || value.ends_with('.') {
        return Err("domain must look like postiz.example.com".into());
    }
    let valid_chars = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if !valid_chars {
        return Err("domain may only contain letters, digits, '-' and '.'".into());
    }
    let bad_label = value
        .split('.')
        .any(|label| label.is_empty() || label.starts_with('-') || label.ends_with('-'));
    if bad_label {
        return Err("each part of the domain must be non-empty and not start or end with '-'".into());
    }
    Ok(())
}

/// Email used for Let's Encrypt registration.
pub fn validate_email(value: &str) -> Result<(), String> {
    let Some((local, domain)) = value.split_once('@') else {
        return Err("email must contain '@'".into());
    };
    if local.is_empty() || domain.contains('@') || value.chars().any(char::is_whitespace) {
        return Err("email must look like admin@example.com".into());
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err("email domain must look like example.com".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domains() {
        assert!(validate_domain("postiz.example.com").is_ok());
        assert!(validate_domain("my-site.io").is_ok());
        assert!(validate_domain("").is_err());
        assert!(validate_domain("https://postiz.example.com").is_err());
        assert!(validate_domain("example.com/app").is_err());
        assert!(validate_domain("localhost").is_err());
        assert!(validate_domain("exa mple.com").is_err());
        assert!(validate_domain("example.com.").is_err());
        assert!(validate_domain("ex_ample.com").is_err());
    }

    #[test]
    fn domain_labels() {
        assert!(validate_domain("a..com").is_err());
        assert!(validate_domain("-a.com").is_err());
        assert!(validate_domain("a-.example.com").is_err());
        assert!(validate_domain("api.my-site.example.com").is_ok());
    }

    #[test]
    fn emails() {
        assert!(validate_email("admin@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("admin").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b@example.com").is_err());
        assert!(validate_email("admin@localhost").is_err());
    }
}
