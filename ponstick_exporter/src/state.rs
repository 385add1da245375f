//! Shared agent state handed to every request handler.

use std::sync::Arc;

use crate::scrape::Scraper;

#[derive(Clone)]
pub struct AppState {
    // Owns the registry and serializes scrape cycles
    pub scraper: Arc<Scraper>,
}

impl AppState {
    pub fn new(scraper: Scraper) -> Self {
        Self {
            scraper: Arc::new(scraper),
        }
    }
}
