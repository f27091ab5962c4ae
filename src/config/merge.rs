use anyhow::Result;

use crate::config::hooks::HookName;
use crate::config::layer::ConfigLayer;
use crate::config::Configuration;

/// Trait for types that can be merged with overriding values
pub trait Merge<T = Self> {
    /// Merge self with another instance, with the other instance taking precedence
    /// for any overlapping fields
    fn merge(&self, other: &T) -> Result<Self>
    where
        Self: Sized;
}

impl Merge<ConfigLayer> for Configuration {
    fn merge(&self, layer: &ConfigLayer) -> Result<Self> {
        let mut merged = self.clone();

        if let Some(repeat) = layer.repeat {
            merged.repeat = repeat;
        }
        if let Some(retry) = layer.retry {
            merged.retry = retry;
        }
        for name in HookName::ALL {
            if let Some(hook) = layer.hooks.get(name) {
                merged.hooks.set(name, hook.clone());
            }
        }
        merged
            .env
            .extend(layer.env.iter().map(|(k, v)| (k.clone(), v.clone())));

        Ok(merged)
    }
}
