//! Conversational model providers for seomagic.
//!
//! All providers implement the `seomagic_core::Provider` trait.

pub mod anthropic;

use std::sync::Arc;

use seomagic_config::AppConfig;
use seomagic_core::provider::Provider;

pub use anthropic::AnthropicProvider;

/// Build the configured provider, or `None` when no model API key is set.
pub fn build_from_config(config: &AppConfig) -> Option<Arc<dyn Provider>> {
    let key = config.anthropic_api_key.as_ref()?;
    Some(Arc::new(AnthropicProvider::new(key.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_key_no_provider() {
        assert!(build_from_config(&AppConfig::default()).is_none());

        let config = AppConfig {
            anthropic_api_key: Some("sk-ant-test".into()),
            ..AppConfig::default()
        };
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "anthropic");
    }
}
