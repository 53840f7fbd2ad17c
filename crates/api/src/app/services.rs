//! Service wiring shared by every handler.

use std::ops::Deref;
use std::sync::Arc;

use medrx_auth::Hs256Jwt;
use medrx_infra::{EntityDirectory, Services};

use crate::config::ApiConfig;

/// Domain services plus the token issuer used at login.
pub struct AppServices {
    services: Services,
    pub tokens: Arc<Hs256Jwt>,
}

impl AppServices {
    pub fn new(directory: Arc<dyn EntityDirectory>, config: &ApiConfig) -> Self {
        Self {
            services: Services::new(directory),
            tokens: Arc::new(Hs256Jwt::new(config.jwt_secret.as_bytes(), config.token_ttl)),
        }
    }
}

impl Deref for AppServices {
    type Target = Services;

    fn deref(&self) -> &Services {
        &self.services
    }
}
