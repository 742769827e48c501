//! CLI configuration: a thin layer over `medscribe_config`.
//!
//! Resolves the active profile and applies `GlobalOpts` flag overrides
//! (`--store-url`, `--timeout`) before translating it into a
//! `ServiceConfig`.

use medscribe_core::{FreeTierLimits, ServiceConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use medscribe_config::{Config, Credential, Profile, config_path, load_config, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// The active profile with flag overrides applied.
///
/// An explicitly requested profile must exist; the implicit default may be
/// absent, in which case flags and environment variables stand alone.
pub fn effective_profile(global: &GlobalOpts, cfg: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, cfg);
    let mut profile = match cfg.profiles.get(&name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(profile_not_found(name, cfg));
        }
        None => Profile::default(),
    };

    if let Some(ref url) = global.store_url {
        profile.store_url = Some(url.clone());
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
    if profile.timeout.is_none() {
        profile.timeout = Some(cfg.defaults.timeout);
    }

    Ok((name, profile))
}

/// Load config, pick the profile, resolve secrets, and build a
/// `ServiceConfig`.
pub fn service_config(global: &GlobalOpts) -> Result<ServiceConfig, CliError> {
    let cfg = load_config()?;
    let (name, profile) = effective_profile(global, &cfg)?;
    Ok(medscribe_config::profile_to_service_config(&profile, &name)?)
}

/// Free-tier caps of the active profile; no secrets are resolved.
pub fn free_tier_limits(global: &GlobalOpts) -> Result<FreeTierLimits, CliError> {
    let cfg = load_config()?;
    let (_, profile) = effective_profile(global, &cfg)?;
    Ok(medscribe_config::free_tier_limits(&profile))
}

pub fn profile_not_found(name: String, cfg: &Config) -> CliError {
    let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
    available.sort();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}
