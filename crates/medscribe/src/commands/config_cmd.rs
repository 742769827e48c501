//! Config subcommand handlers.

use std::fmt::Write as _;
use std::str::FromStr;

use dialoguer::{Input, Select};
use secrecy::SecretString;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Credential, Profile};
use crate::error::CliError;
use crate::output;

const SETTABLE_KEYS: &str = "store_url, store_key, store_key_env, gemini_url, gemini_model, \
     gemini_key, gemini_key_env, speech_url, speech_model, speech_key, speech_key_env, ca_cert, \
     timeout, free_patient_limit, free_consultation_limit, retry_attempts, retry_backoff_ms, \
     temperature, max_output_tokens, bind";

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking secrets.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "bind = \"{}\"", cfg.defaults.bind);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        for (key, value) in profile_entries(p) {
            let _ = writeln!(out, "{key} = {value}");
        }
    }

    out
}

/// Copy of the config with every plaintext key replaced by a mask.
fn redact(cfg: &Config) -> Config {
    let mask = |v: &mut Option<String>| {
        if v.is_some() {
            *v = Some("****".into());
        }
    };
    let mut out = cfg.clone();
    for p in out.profiles.values_mut() {
        mask(&mut p.store_key);
        mask(&mut p.gemini_key);
        mask(&mut p.speech_key);
    }
    out
}

fn quoted(value: Option<&str>) -> Option<String> {
    value.map(|v| format!("\"{v}\""))
}

fn masked(value: Option<&String>) -> Option<String> {
    value.map(|_| "\"****\"".to_owned())
}

fn number<T: ToString>(value: Option<T>) -> Option<String> {
    value.map(|v| v.to_string())
}

/// Set fields of a profile as TOML-ish `key = value` pairs, secrets masked.
fn profile_entries(p: &Profile) -> Vec<(&'static str, String)> {
    [
        ("store_url", quoted(p.store_url.as_deref())),
        ("store_key", masked(p.store_key.as_ref())),
        ("store_key_env", quoted(p.store_key_env.as_deref())),
        ("gemini_url", quoted(p.gemini_url.as_deref())),
        ("gemini_model", quoted(p.gemini_model.as_deref())),
        ("gemini_key", masked(p.gemini_key.as_ref())),
        ("gemini_key_env", quoted(p.gemini_key_env.as_deref())),
        ("speech_url", quoted(p.speech_url.as_deref())),
        ("speech_model", quoted(p.speech_model.as_deref())),
        ("speech_key", masked(p.speech_key.as_ref())),
        ("speech_key_env", quoted(p.speech_key_env.as_deref())),
        (
            "ca_cert",
            p.ca_cert.as_ref().map(|c| format!("\"{}\"", c.display())),
        ),
        ("timeout", number(p.timeout)),
        ("free_patient_limit", number(p.free_patient_limit)),
        ("free_consultation_limit", number(p.free_consultation_limit)),
        ("retry_attempts", number(p.retry_attempts)),
        ("retry_backoff_ms", number(p.retry_backoff_ms)),
        ("temperature", number(p.temperature)),
        ("max_output_tokens", number(p.max_output_tokens)),
        ("bind", quoted(p.bind.as_deref())),
    ]
    .into_iter()
    .filter_map(|(k, v)| v.map(|v| (k, v)))
    .collect()
}

fn parse_value<T: FromStr>(key: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::validation(key, format!("must be {expected}")))
}

/// Apply `key = value` to a profile.
fn set_profile_value(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key.replace('-', "_").as_str() {
        "store_url" => profile.store_url = Some(value),
        "store_key" => profile.store_key = Some(value),
        "store_key_env" => profile.store_key_env = Some(value),
        "gemini_url" => profile.gemini_url = Some(value),
        "gemini_model" => profile.gemini_model = Some(value),
        "gemini_key" => profile.gemini_key = Some(value),
        "gemini_key_env" => profile.gemini_key_env = Some(value),
        "speech_url" => profile.speech_url = Some(value),
        "speech_model" => profile.speech_model = Some(value),
        "speech_key" => profile.speech_key = Some(value),
        "speech_key_env" => profile.speech_key_env = Some(value),
        "ca_cert" => profile.ca_cert = Some(value.into()),
        "bind" => profile.bind = Some(value),
        "timeout" => profile.timeout = Some(parse_value(key, &value, "a number (seconds)")?),
        "free_patient_limit" => {
            profile.free_patient_limit = Some(parse_value(key, &value, "a whole number")?);
        }
        "free_consultation_limit" => {
            profile.free_consultation_limit = Some(parse_value(key, &value, "a whole number")?);
        }
        "retry_attempts" => {
            let attempts: u32 = parse_value(key, &value, "a whole number")?;
            if attempts == 0 {
                return Err(CliError::validation(key, "must be at least 1"));
            }
            profile.retry_attempts = Some(attempts);
        }
        "retry_backoff_ms" => {
            profile.retry_backoff_ms = Some(parse_value(key, &value, "a number (milliseconds)")?);
        }
        "temperature" => {
            let temperature: f32 = parse_value(key, &value, "a number between 0 and 2")?;
            if !(0.0..=2.0).contains(&temperature) {
                return Err(CliError::validation(key, "must be a number between 0 and 2"));
            }
            profile.temperature = Some(temperature);
        }
        "max_output_tokens" => {
            profile.max_output_tokens = Some(parse_value(key, &value, "a whole number")?);
        }
        other => {
            return Err(CliError::validation(
                other,
                format!("unknown config key '{other}'. Valid keys: {SETTABLE_KEYS}"),
            ));
        }
    }
    Ok(())
}

fn parse_credential(raw: &str) -> Result<Credential, CliError> {
    raw.parse()
        .map_err(|_| CliError::validation("credential", "must be 'store', 'gemini' or 'speech'"))
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::validation("interactive", format!("prompt failed: {e}"))
}

fn store_in_keyring(
    profile_name: &str,
    credential: Credential,
    secret: String,
) -> Result<(), CliError> {
    medscribe_config::store_secret(profile_name, credential, &SecretString::from(secret))?;
    Ok(())
}

/// Prompt for an optional API key and offer keyring or plaintext storage.
///
/// Returns the plaintext value to write into the profile, if any.
fn prompt_key(
    profile_name: &str,
    credential: Credential,
    label: &str,
) -> Result<Option<String>, CliError> {
    let key = rpassword::prompt_password(format!("{label} (leave empty to skip): "))
        .map_err(prompt_err)?;
    if key.is_empty() {
        return Ok(None);
    }

    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(format!("Where to store the {label}?"))
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        store_in_keyring(profile_name, credential, key)?;
        eprintln!("   ✓ {label} stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(key))
    }
}

fn optional(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = redact(&config::load_config()?);
            let out = output::render_single(global.output, &cfg, format_config_redacted, |_| {
                "config".into()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_profile_value(profile, &key, value)?;

            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: medscribe config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(config::profile_not_found(name, &cfg));
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::SetKey { credential } => {
            let credential = parse_credential(&credential)?;
            let cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(config::profile_not_found(profile_name, &cfg));
            }

            let secret = rpassword::prompt_password(format!("{credential} API key: "))
                .map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::validation("secret", "value cannot be empty"));
            }
            store_in_keyring(&profile_name, credential, secret)?;
            eprintln!("✓ {credential} key stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

/// Interactive wizard writing a fresh config with one profile.
fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("✨ medscribe configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let store_url: String = Input::new()
        .with_prompt("Store project URL (leave empty to skip)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    let store_url = optional(store_url);
    if let Some(ref url) = store_url {
        url::Url::parse(url)
            .map_err(|e| CliError::validation("store_url", format!("invalid URL '{url}': {e}")))?;
    }

    let store_key = if store_url.is_some() {
        prompt_key(&profile_name, Credential::Store, "store API key")?
    } else {
        None
    };
    let gemini_key = prompt_key(&profile_name, Credential::Gemini, "Gemini API key")?;
    let speech_key = prompt_key(&profile_name, Credential::Speech, "speech API key")?;

    let profile = Profile {
        store_url,
        store_key,
        gemini_key,
        speech_key,
        ..Profile::default()
    };

    let mut cfg = Config {
        default_profile: Some(profile_name.clone()),
        ..Config::default()
    };
    cfg.profiles.insert(profile_name.clone(), profile);
    config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: medscribe limits");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn set_accepts_dashed_keys_and_parses_numbers() {
        let mut p = Profile::default();
        set_profile_value(&mut p, "free-consultation-limit", "3".into()).unwrap();
        set_profile_value(&mut p, "gemini_model", "gemini-1.5-pro".into()).unwrap();
        set_profile_value(&mut p, "retry_backoff_ms", "250".into()).unwrap();
        assert_eq!(p.free_consultation_limit, Some(3));
        assert_eq!(p.gemini_model.as_deref(), Some("gemini-1.5-pro"));
        assert_eq!(p.retry_backoff_ms, Some(250));
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut p = Profile::default();
        for (key, value) in [
            ("timeout", "soon"),
            ("retry_attempts", "0"),
            ("temperature", "3.5"),
            ("colour", "blue"),
        ] {
            let err = set_profile_value(&mut p, key, value.into()).unwrap_err();
            assert!(matches!(err, CliError::Validation { .. }), "{key}");
        }
    }

    #[test]
    fn redacted_output_masks_secrets() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "clinic".into(),
            Profile {
                store_url: Some("https://abc.example.co".into()),
                store_key: Some("service-role-secret".into()),
                free_patient_limit: Some(2),
                ..Profile::default()
            },
        );
        let text = format_config_redacted(&cfg);
        assert!(text.contains("[profiles.clinic]"));
        assert!(text.contains("store_url = \"https://abc.example.co\""));
        assert!(text.contains("store_key = \"****\""));
        assert!(text.contains("free_patient_limit = 2"));
        assert!(!text.contains("service-role-secret"));

        let json = serde_json::to_string(&redact(&cfg)).unwrap();
        assert!(json.contains("****"));
        assert!(!json.contains("service-role-secret"));
    }

    #[test]
    fn credential_names() {
        assert_eq!(parse_credential("gemini").unwrap(), Credential::Gemini);
        assert!(parse_credential("stripe").is_err());
    }
}
