//! Sponsor slideshow content, fetched from the server every time the sponsor
//! screen is about to be shown.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{domain::Screen, protocol::SponsorSlide};
use tokio::sync::watch;
use tracing::info;

use crate::ContentLoader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SponsorCard {
    pub slide: SponsorSlide,
    pub display_time: Duration,
    pub first: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SponsorDeck {
    pub cards: Vec<SponsorCard>,
}

impl SponsorDeck {
    pub fn from_slides(slides: Vec<SponsorSlide>) -> Self {
        let cards = slides
            .into_iter()
            .enumerate()
            .map(|(index, slide)| SponsorCard {
                display_time: Duration::from_secs(u64::from(slide.display_time_sec)),
                first: index == 0,
                slide,
            })
            .collect();
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

pub struct HttpSponsorLoader {
    http: Client,
    server_url: String,
    deck: watch::Sender<SponsorDeck>,
}

impl HttpSponsorLoader {
    pub fn new(server_url: impl Into<String>) -> Self {
        let (deck, _) = watch::channel(SponsorDeck::default());
        Self {
            http: Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
            deck,
        }
    }

    /// The most recently loaded deck, for whatever renders the slideshow.
    pub fn subscribe(&self) -> watch::Receiver<SponsorDeck> {
        self.deck.subscribe()
    }

    pub async fn fetch_deck(&self) -> Result<SponsorDeck> {
        let url = format!("{}/api/sponsor_slides", self.server_url);
        let slides: Vec<SponsorSlide> = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to request sponsor slides: {url}"))?
            .error_for_status()?
            .json()
            .await
            .context("invalid sponsor slides payload")?;
        Ok(SponsorDeck::from_slides(slides))
    }
}

#[async_trait]
impl ContentLoader for HttpSponsorLoader {
    async fn load(&self, screen: Screen) -> Result<()> {
        if screen != Screen::Sponsor {
            return Ok(());
        }
        let deck = self.fetch_deck().await?;
        info!(slides = deck.len(), "loaded sponsor slides");
        self.deck.send_replace(deck);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/sponsor_tests.rs"]
mod tests;
