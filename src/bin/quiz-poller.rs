//! Reference long-poll client: joins the waiting room and follows one match until it ends.
//!
//! Usage: `quiz-poller [server-url] [player-name]`, defaulting to
//! `QUIZ_SERVER_URL` / `QUIZ_PLAYER_NAME` and then `http://localhost:8080` / `poller`.

use std::{env, sync::Arc};

use anyhow::Context;
use reqwest::{Client, Method, StatusCode};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quizzz_back::{
    dto::multiplayer::{JoinResponse, PlayerNameRequest, PlayerSummary, PollQuery},
    state::{
        fingerprint::{ChangeFingerprint, ScreenPhase},
        match_state::MatchId,
    },
};

struct Poller {
    client: Client,
    base_url: Arc<str>,
}

impl Poller {
    fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder().build().context("building http client")?;
        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, path))
    }

    async fn join(&self, name: &str) -> anyhow::Result<JoinResponse> {
        let response = self
            .request(Method::POST, "multiplayer/staging/players")
            .json(&PlayerNameRequest { name: name.into() })
            .send()
            .await?
            .error_for_status()
            .context("joining the waiting room")?;
        Ok(response.json().await?)
    }

    /// One long-poll round; `None` means nothing changed before the server timeout.
    async fn poll(
        &self,
        id: MatchId,
        known: Option<&ChangeFingerprint>,
    ) -> anyhow::Result<Option<ChangeFingerprint>> {
        let query = known.map(PollQuery::from).unwrap_or_default();
        let response = self
            .request(Method::GET, &format!("multiplayer/updates/{id}"))
            .query(&query)
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("polling match {id}"))?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        Ok(Some(response.json().await?))
    }

    async fn roster(&self, id: MatchId, phase: ScreenPhase) -> anyhow::Result<Vec<PlayerSummary>> {
        let path = match phase {
            ScreenPhase::Waiting => "multiplayer/staging/players".to_string(),
            _ => format!("multiplayer/matches/{id}/players"),
        };
        let response = self
            .request(Method::GET, &path)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = env::args().skip(1);
    let base_url = args
        .next()
        .or_else(|| env::var("QUIZ_SERVER_URL").ok())
        .unwrap_or_else(|| "http://localhost:8080".into());
    let name = args
        .next()
        .or_else(|| env::var("QUIZ_PLAYER_NAME").ok())
        .unwrap_or_else(|| "poller".into());

    let poller = Poller::new(&base_url)?;
    let JoinResponse { staging_id: id } = poller.join(&name).await?;
    info!(id, player = %name, "joined waiting room");

    let mut last: Option<ChangeFingerprint> = None;
    loop {
        let Some(fingerprint) = poller.poll(id, last.as_ref()).await? else {
            debug!(id, "no update yet");
            continue;
        };

        let changes = fingerprint.changes_since(last.as_ref());
        if changes.roster_changed {
            let players = poller.roster(id, fingerprint.phase).await?;
            let names: Vec<_> = players
                .iter()
                .map(|p| format!("{} ({})", p.name, p.score))
                .collect();
            info!(id, players = ?names, "roster changed");
        }
        if changes.screen_changed {
            info!(
                id,
                phase = %fingerprint.phase,
                question_index = fingerprint.question_index,
                "screen changed"
            );
        }

        if fingerprint.phase == ScreenPhase::End {
            info!(id, "match over");
            return Ok(());
        }
        last = Some(fingerprint);
    }
}
