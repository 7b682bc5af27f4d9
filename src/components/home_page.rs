use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::animated_loading::AnimatedLoading;
use super::lifecycle::{AttachToken, Lifecycle, LifecycleState};
use super::list::render_movies_in_list;
use crate::api::MovieApi;
use crate::dom::{Document, Dom, DomError, NodeId};
use crate::models::MovieSummary;
use crate::notify::Notifier;
use crate::templates::HOME_TEMPLATE;

const TOP_LIST: &str = "#top-10 ul";
const RANDOM_LIST: &str = "#random ul";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RandomPolicy {
    #[default]
    AllowOverlap,
    ExcludeTop,
}

impl RandomPolicy {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "allow-overlap" => Some(RandomPolicy::AllowOverlap),
            "exclude-top" => Some(RandomPolicy::ExcludeTop),
            _ => None,
        }
    }

    pub fn apply(&self, top: &[MovieSummary], random: Vec<MovieSummary>) -> Vec<MovieSummary> {
        match self {
            RandomPolicy::AllowOverlap => random,
            RandomPolicy::ExcludeTop => {
                let top_ids: HashSet<i64> = top.iter().map(|m| m.id).collect();
                random
                    .into_iter()
                    .filter(|m| !top_ids.contains(&m.id))
                    .collect()
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeData {
    pub top: Option<Vec<MovieSummary>>,
    pub random: Option<Vec<MovieSummary>>,
}

#[derive(Clone)]
pub struct HomePage {
    host: NodeId,
    dom: Dom,
    api: Arc<dyn MovieApi>,
    notifier: Arc<dyn Notifier>,
    random_policy: RandomPolicy,
    data: Arc<Mutex<HomeData>>,
    lifecycle: Lifecycle,
}

impl HomePage {
    pub const TAG: &'static str = "home-page";

    pub fn new(
        dom: Dom,
        api: Arc<dyn MovieApi>,
        notifier: Arc<dyn Notifier>,
        random_policy: RandomPolicy,
    ) -> Self {
        let host = dom.with(|doc| doc.create_element(Self::TAG));
        Self {
            host,
            dom,
            api,
            notifier,
            random_policy,
            data: Arc::new(Mutex::new(HomeData::default())),
            lifecycle: Lifecycle::default(),
        }
    }

    pub fn host(&self) -> NodeId {
        self.host
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn data(&self) -> HomeData {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_data(&self, data: HomeData) {
        *self.data.lock().unwrap_or_else(PoisonError::into_inner) = data;
    }

    pub fn connected_callback(&self) -> JoinHandle<()> {
        let token = self.lifecycle.attach();
        let cloned = self.dom.with(|doc| {
            doc.clear_children(self.host);
            doc.clone_template_into(HOME_TEMPLATE, self.host)?;
            for loader in doc.query_selector_all(self.host, AnimatedLoading::TAG) {
                AnimatedLoading.connected_callback(doc, loader);
            }
            Ok::<_, DomError>(())
        });
        self.set_data(HomeData::default());
        if let Err(e) = cloned {
            error!("Home template unavailable: {}", e);
            self.fail(&token, "Couldn't display home page", e.to_string());
            return tokio::spawn(async {});
        }
        let page = self.clone();
        tokio::spawn(async move { page.render(token).await })
    }

    pub fn disconnected_callback(&self) {
        self.lifecycle.detach();
    }

    async fn render(&self, mut token: AttachToken) {
        let (top, random) = tokio::select! {
            pair = async { tokio::join!(self.api.top_movies(), self.api.random_movies()) } => pair,
            _ = token.cancelled() => {
                debug!("Home page render cancelled");
                return;
            }
        };
        let random = match (&top, random) {
            (Ok(top), Ok(random)) => Ok(self.random_policy.apply(top, random)),
            (_, random) => random,
        };

        let data = HomeData {
            top: top.as_ref().ok().cloned(),
            random: random.as_ref().ok().cloned(),
        };
        let rendered = self.dom.with(|doc| {
            if !token.is_live() || !doc.is_connected(self.host) {
                return None;
            }
            // A failed region is emptied so its loading placeholder goes away.
            let empty = Vec::new();
            let top_region = self.render_region(doc, TOP_LIST, top.as_ref().unwrap_or(&empty));
            let random_region =
                self.render_region(doc, RANDOM_LIST, random.as_ref().unwrap_or(&empty));
            self.set_data(data);
            Some(top_region.and(random_region))
        });
        let Some(regions) = rendered else {
            debug!("Home page detached before render");
            return;
        };

        let mut failures = Vec::new();
        let mut alerts = Vec::new();
        if let Err(e) = &regions {
            error!("Home page layout is incomplete: {}", e);
            failures.push(format!("layout: {e}"));
            alerts.push("Couldn't display home page");
        }
        if let Err(e) = &top {
            warn!("Failed to load top movies: {}", e);
            failures.push(format!("top movies: {e}"));
            alerts.push("Couldn't load top movies");
        }
        if let Err(e) = &random {
            warn!("Failed to load random movies: {}", e);
            failures.push(format!("random movies: {e}"));
            alerts.push("Couldn't load random movies");
        }

        info!(
            "Home page loaded: {} top, {} random",
            top.as_ref().map_or(0, Vec::len),
            random.as_ref().map_or(0, Vec::len)
        );

        if failures.is_empty() {
            token.finish(Ok(()));
        } else if token.finish(Err(failures.join("; "))) {
            for message in alerts {
                self.notifier.alert(message);
            }
        }
    }

    fn render_region(
        &self,
        doc: &mut Document,
        selector: &str,
        movies: &[MovieSummary],
    ) -> Result<(), DomError> {
        let ul = doc
            .query_selector(self.host, selector)
            .ok_or_else(|| DomError::MissingElement(selector.to_string()))?;
        render_movies_in_list(doc, movies, ul);
        Ok(())
    }

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
