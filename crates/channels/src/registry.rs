use std::{collections::HashMap, sync::Arc};

use {tracing::debug, yuta_config::ClientType};

use crate::session::SessionFactory;

/// Session factories keyed by the client type they serve.
pub struct SessionFactoryRegistry {
    factories: HashMap<ClientType, Arc<dyn SessionFactory>>,
}

impl Default for SessionFactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionFactoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory, replacing any previous one for the same type.
    pub fn register(&mut self, factory: Arc<dyn SessionFactory>) {
        let client_type = factory.client_type();
        debug!(client_type = %client_type, "registered session factory");
        self.factories.insert(client_type, factory);
    }

    #[must_use]
    pub fn with(mut self, factory: Arc<dyn SessionFactory>) -> Self {
        self.register(factory);
        self
    }

    pub fn get(&self, client_type: &ClientType) -> Option<Arc<dyn SessionFactory>> {
        self.factories.get(client_type).cloned()
    }

    pub fn list(&self) -> Vec<&ClientType> {
        self.factories.keys().collect()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{Error, Result, session::SessionHandle},
        async_trait::async_trait,
        yuta_config::ClientConfig,
    };

    struct NamedFactory(ClientType);

    #[async_trait]
    impl SessionFactory for NamedFactory {
        fn client_type(&self) -> ClientType {
            self.0.clone()
        }

        async fn authenticate(&self, config: &ClientConfig) -> Result<SessionHandle> {
            Err(Error::authentication(config.account_id(), "not a real factory"))
        }
    }

    #[test]
    fn lookup_by_client_type() {
        let registry =
            SessionFactoryRegistry::new().with(Arc::new(NamedFactory(ClientType::Matrix)));
        assert!(registry.get(&ClientType::Matrix).is_some());
        assert!(registry.get(&ClientType::Slack).is_none());
        assert!(registry.get(&ClientType::Other("irc".into())).is_none());
        assert_eq!(registry.list(), vec![&ClientType::Matrix]);
    }

    #[tokio::test]
    async fn registered_factory_is_invoked() {
        let registry =
            SessionFactoryRegistry::new().with(Arc::new(NamedFactory(ClientType::Matrix)));
        let factory = registry.get(&ClientType::Matrix).unwrap();
        let err = factory
            .authenticate(&ClientConfig::default())
            .await
            .err()
            .unwrap();
        assert!(err.is_authentication());
    }
}
