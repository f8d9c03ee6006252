use crate::CoreError;

/// Runtime environment handed to security-sensitive components.
///
/// Constructed once at startup from configuration. In production the master
/// key is mandatory; the constructor fails fast instead of silently falling
/// back to the development key.
#[derive(Debug, Clone)]
pub struct Environment {
    pub production: bool,
    pub master_key: Option<String>,
}

impl Environment {
    pub fn new(production: bool, master_key: Option<String>) -> Result<Self, CoreError> {
        let master_key = master_key.filter(|k| !k.is_empty());
        if production && master_key.is_none() {
            return Err(CoreError::ConfigError(
                "master encryption key must be set in production".to_string(),
            ));
        }
        Ok(Self {
            production,
            master_key,
        })
    }
}
