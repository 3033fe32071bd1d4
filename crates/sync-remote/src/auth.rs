use anyhow::Context;
use keyring::Entry;
use reqwest::Url;
use tracing::debug;

const SERVICE: &str = "backoffice-sync";

/// Keyring account used for the API behind `base_url`: its host, plus the
/// port when one is given.
pub fn account_for_base_url(base_url: &str) -> anyhow::Result<String> {
    let url = Url::parse(base_url).with_context(|| format!("parse base url {base_url}"))?;
    let host = url
        .host_str()
        .with_context(|| format!("base url {base_url} has no host"))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

pub fn get_token(account: &str) -> anyhow::Result<Option<String>> {
    let entry = Entry::new(SERVICE, account).context("open keyring entry")?;
    match entry.get_password() {
        Ok(token) => Ok(Some(token)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(err) => Err(err).context("read token from keyring"),
    }
}

pub fn set_token(account: &str, token: &str) -> anyhow::Result<()> {
    let entry = Entry::new(SERVICE, account).context("open keyring entry")?;
    entry
        .set_password(token)
        .context("write token to keyring")
}

pub fn clear_token(account: &str) -> anyhow::Result<bool> {
    let entry = Entry::new(SERVICE, account).context("open keyring entry")?;
    match entry.delete_credential() {
        Ok(()) => Ok(true),
        Err(keyring::Error::NoEntry) => Ok(false),
        Err(err) => Err(err).context("delete token from keyring"),
    }
}

/// Token for `base_url`: the environment variable wins over the keyring.
/// A keyring failure is not fatal; the request simply goes out without auth.
pub fn resolve_token(base_url: &str, env_var: &str) -> Option<String> {
    pick_token(std::env::var(env_var).ok(), || {
        let account = account_for_base_url(base_url)?;
        get_token(&account)
    })
}

fn pick_token<F>(env_value: Option<String>, stored: F) -> Option<String>
where
    F: FnOnce() -> anyhow::Result<Option<String>>,
{
    if let Some(value) = env_value.filter(|value| !value.trim().is_empty()) {
        return Some(value.trim().to_string());
    }
    match stored() {
        Ok(token) => token,
        Err(err) => {
            debug!(error = %err, "keyring token unavailable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_includes_explicit_port() {
        assert_eq!(
            account_for_base_url("http://localhost:3000").unwrap(),
            "localhost:3000"
        );
        assert_eq!(
            account_for_base_url("https://backoffice.example.com/app").unwrap(),
            "backoffice.example.com"
        );
        assert!(account_for_base_url("not a url").is_err());
    }

    #[test]
    fn env_value_wins_over_keyring() {
        let token = pick_token(Some(" env-token ".to_string()), || {
            panic!("keyring must not be consulted")
        });
        assert_eq!(token.as_deref(), Some("env-token"));
    }

    #[test]
    fn blank_env_value_falls_back_to_keyring() {
        let token = pick_token(Some("  ".to_string()), || Ok(Some("stored".to_string())));
        assert_eq!(token.as_deref(), Some("stored"));
    }

    #[test]
    fn keyring_errors_mean_no_token() {
        let token = pick_token(None, || anyhow::bail!("no secret service"));
        assert!(token.is_none());
    }
}
