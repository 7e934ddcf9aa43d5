//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::identity::IdentityClient;
use crate::store::{ProfileStore, ShopStore, SupabaseClient};
use crate::util::rate_limit::{create_limiter, Limiter, LOGIN_RATE_LIMIT};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub supabase: SupabaseClient,
    pub identity: IdentityClient,
    pub profiles: ProfileStore,
    pub shop: ShopStore,
    pub login_limiter: Arc<Limiter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // Initialize Supabase clients
        let supabase = SupabaseClient::new(&config);
        let identity = IdentityClient::new(&config);

        // Initialize stores
        let profiles = ProfileStore::new(supabase.clone());
        let shop = ShopStore::new(supabase.clone());

        let login_limiter = create_limiter(LOGIN_RATE_LIMIT);

        Self {
            config,
            supabase,
            identity,
            profiles,
            shop,
            login_limiter,
        }
    }
}
