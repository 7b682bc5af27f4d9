use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::lifecycle::{AttachToken, Lifecycle, LifecycleState};
use crate::api::MovieApi;
use crate::dom::{Document, DomError, Dom, NodeId};
use crate::models::MovieDetail;
use crate::notify::Notifier;
use crate::templates::MOVIE_DETAILS_TEMPLATE;

pub const MOVIE_ID_ATTRIBUTE: &str = "data-movie-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieId {
    Fixed(i64),
    FromAttribute,
}

impl MovieId {
    pub fn resolve(&self, doc: &Document, host: NodeId) -> Option<i64> {
        match self {
            MovieId::Fixed(id) => Some(*id),
            MovieId::FromAttribute => doc
                .get_attribute(host, MOVIE_ID_ATTRIBUTE)
                .and_then(|v| v.trim().parse().ok()),
        }
    }
}

#[derive(Clone)]
pub struct MovieDetailsPage {
    host: NodeId,
    dom: Dom,
    api: Arc<dyn MovieApi>,
    notifier: Arc<dyn Notifier>,
    movie_id: MovieId,
    movie: Arc<Mutex<Option<MovieDetail>>>,
    lifecycle: Lifecycle,
}

impl MovieDetailsPage {
    pub const TAG: &'static str = "movie-details-page";

    pub fn new(
        dom: Dom,
        api: Arc<dyn MovieApi>,
        notifier: Arc<dyn Notifier>,
        movie_id: MovieId,
    ) -> Self {
        let host = dom.with(|doc| doc.create_element(Self::TAG));
        Self {
            host,
            dom,
            api,
            notifier,
            movie_id,
            movie: Arc::new(Mutex::new(None)),
            lifecycle: Lifecycle::default(),
        }
    }

    pub fn host(&self) -> NodeId {
        self.host
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn movie(&self) -> Option<MovieDetail> {
        self.movie
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_movie(&self, movie: Option<MovieDetail>) {
        *self.movie.lock().unwrap_or_else(PoisonError::into_inner) = movie;
    }

    pub fn connected_callback(&self) -> JoinHandle<()> {
        let token = self.lifecycle.attach();
        self.set_movie(None);
        let page = self.clone();
        tokio::spawn(async move { page.render(token).await })
    }

    pub fn disconnected_callback(&self) {
        self.lifecycle.detach();
    }

    async fn render(&self, mut token: AttachToken) {
        let Some(id) = self.dom.with(|doc| self.movie_id.resolve(doc, self.host)) else {
            warn!("No movie id available for {}", Self::TAG);
            self.fail(&token, "No movie selected", "missing movie id".to_string());
            return;
        };

        let result = tokio::select! {
            res = self.api.movie_by_id(id) => res,
            _ = token.cancelled() => {
                debug!("Render of movie {} cancelled", id);
                return;
            }
        };

        let movie = match result {
            Ok(movie) => movie,
            Err(err) => {
                warn!("Failed to load movie {}: {}", id, err);
                let message = if err.is_not_found() {
                    "Movie doesn't exist"
                } else {
                    "Couldn't load movie"
                };
                self.fail(&token, message, err.to_string());
                return;
            }
        };

        let populated = self.dom.with(|doc| {
            if !token.is_live() || !doc.is_connected(self.host) {
                return Ok(false);
            }
            doc.clear_children(self.host);
            doc.clone_template_into(MOVIE_DETAILS_TEMPLATE, self.host)?;
            populate_details(doc, self.host, &movie);
            self.set_movie(Some(movie.clone()));
            Ok::<_, DomError>(true)
        });

        match populated {
            Ok(true) => {
                info!("Rendered movie {} ({})", movie.id, movie.title);
                token.finish(Ok(()));
            }
            Ok(false) => debug!("Movie {} page detached before render", id),
            Err(e) => {
                error!("Movie details template unavailable: {}", e);
                self.fail(&token, "Couldn't display movie", e.to_string());
            }
        }
    }

    /// Leaves the host empty, records the error and notifies, unless detached.
    fn fail(&self, token: &AttachToken, message: &str, reason: String) {
        let live = self.dom.with(|doc| {
            if !token.is_live() || !doc.is_connected(self.host) {
                return false;
            }
            doc.clear_children(self.host);
            true
        });
        if live && token.finish(Err(reason)) {
            self.notifier.alert(message);
        }
    }
}

fn populate_details(doc: &mut Document, host: NodeId, movie: &MovieDetail) {
    if let Some(h2) = doc.query_selector(host, "h2") {
        doc.set_text(h2, &movie.title);
    }
    if let Some(h3) = doc.query_selector(host, "h3") {
        doc.set_text(h3, &movie.tagline);
    }
    if let Some(img) = doc.query_selector(host, "img") {
        doc.set_attribute(img, "src", &movie.poster_url);
        doc.set_attribute(img, "alt", &format!("{} Poster", movie.title));
    }
    if let Some(overview) = doc.query_selector(host, "#overview") {
        doc.set_text(overview, &movie.overview);
    }
    if let Some(metadata) = doc.query_selector(host, "#metadata") {
        doc.clear_children(metadata);
        let rows = [
            ("Release Year", movie.release_year.to_string()),
            ("Score", format!("{} / 10", movie.score)),
            ("Popularity", movie.popularity.to_string()),
        ];
        for (term, value) in rows {
            let dt = doc.append_element(metadata, "dt");
            doc.set_text(dt, term);
            let dd = doc.append_element(metadata, "dd");
            doc.set_text(dd, &value);
        }
    }
}
