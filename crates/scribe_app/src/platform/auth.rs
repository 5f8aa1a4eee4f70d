//! Config-file identity provider: `sign-in` stores a user in the config,
//! `sign-out` removes it. Stands in for an external OAuth provider.

use std::path::PathBuf;

use scribe_engine::{AuthBackend, AuthError, IdentityAdapter, IdentityHub};

use super::config::{load_config, save_config, AppConfig, IdentityConfig};

struct ConfigAuthBackend {
    hub: IdentityHub,
    config_path: PathBuf,
}

#[async_trait::async_trait]
impl AuthBackend for ConfigAuthBackend {
    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut config = load_config(&self.config_path);
        config.identity = None;
        save_config(&self.config_path, &config)
            .map_err(|err| AuthError::Rejected(format!("{err:#}")))?;
        self.hub.publish(None);
        Ok(())
    }
}

/// Builds the identity adapter and reports the user stored in `config`, as
/// an external provider would on start-up.
pub(crate) fn connect(config: &AppConfig, config_path: PathBuf) -> IdentityAdapter {
    let hub = IdentityHub::new();
    let backend = ConfigAuthBackend {
        hub: hub.clone(),
        config_path,
    };
    let adapter = IdentityAdapter::new(hub.clone(), std::sync::Arc::new(backend));
    hub.publish(config.identity.clone().map(Into::into));
    adapter
}

/// Stores `identity` in the config and reports it to subscribers.
pub(crate) fn sign_in(
    adapter: &IdentityAdapter,
    config_path: &std::path::Path,
    identity: IdentityConfig,
) -> anyhow::Result<()> {
    let mut config = load_config(config_path);
    config.identity = Some(identity.clone());
    save_config(config_path, &config)?;
    adapter.hub().publish(Some(identity.into()));
    Ok(())
}
