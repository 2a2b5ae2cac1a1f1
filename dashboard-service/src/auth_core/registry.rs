//! Client registry: `client_id -> client_secret`, loaded once at startup.
//!
//! Immutable for the process lifetime -- there is no admin endpoint to
//! rotate a client secret without a restart (spec §4.3.1).

use std::collections::HashMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct ClientRegistry {
    clients: HashMap<String, String>,
}

impl ClientRegistry {
    pub fn new(clients: HashMap<String, String>) -> Result<Self> {
        if clients.is_empty() {
            return Err(Error::Config(
                "client registry must have at least one entry".to_string(),
            ));
        }
        Ok(Self { clients })
    }

    pub fn secret_for(&self, client_id: &str) -> Option<&str> {
        self.clients.get(client_id).map(String::as_str)
    }

    pub fn contains(&self, client_id: &str) -> bool {
        self.clients.contains_key(client_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_map() {
        assert!(ClientRegistry::new(HashMap::new()).is_err());
    }

    #[test]
    fn looks_up_known_client() {
        let mut map = HashMap::new();
        map.insert("desktop-main".to_string(), "s3cret".to_string());
        let registry = ClientRegistry::new(map).unwrap();
        assert_eq!(registry.secret_for("desktop-main"), Some("s3cret"));
        assert!(registry.contains("desktop-main"));
        assert!(!registry.contains("unknown"));
    }
}
