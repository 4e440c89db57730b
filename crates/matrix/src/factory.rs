use std::sync::Arc;

use {
    async_trait::async_trait,
    tracing::{info, warn},
};

use {
    yuta_channels::{Error as ChannelError, Result, SessionFactory, SessionHandle},
    yuta_config::{AuthMode, ClientConfig, ClientType},
};

use crate::{
    api::{Credentials, LoginRequest, MatrixApi},
    session::MatrixSession,
};

/// Logs Matrix accounts in and hands out [`MatrixSession`]s.
#[derive(Clone, Default)]
pub struct MatrixSessionFactory;

impl MatrixSessionFactory {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionFactory for MatrixSessionFactory {
    fn client_type(&self) -> ClientType {
        ClientType::Matrix
    }

    async fn authenticate(&self, config: &ClientConfig) -> Result<SessionHandle> {
        let account_id = config.account_id();
        let api = MatrixApi::new(&config.homeserver_url)
            .map_err(|e| ChannelError::authentication(&account_id, e))?;

        let device_name = config.display_name.as_deref();
        let request = match (config.auth_mode(), config.access_token(), config.password()) {
            (Some(AuthMode::Token), Some(token), _) => {
                LoginRequest::token(&config.username, token).with_device_name(device_name)
            },
            (Some(AuthMode::Password), _, Some(password)) => {
                LoginRequest::password(&config.username, password).with_device_name(device_name)
            },
            _ => {
                return Err(ChannelError::authentication(
                    &account_id,
                    "no access token or password configured",
                ));
            },
        };

        let credentials: Credentials = api
            .login(&request)
            .await
            .map_err(|e| ChannelError::authentication(&account_id, e))?
            .into();
        let api = api.authenticated(credentials.access_token.clone());

        if let Some(name) = device_name
            && let Err(e) = api.set_display_name(&credentials.user_id, name).await
        {
            warn!(account_id, error = %e, "failed to set matrix display name");
        }

        info!(
            account_id,
            user_id = credentials.user_id,
            device_id = ?credentials.device_id,
            "matrix session logged in"
        );

        Ok(Arc::new(MatrixSession::new(account_id, credentials, api)))
    }
}
