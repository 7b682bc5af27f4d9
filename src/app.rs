use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::{ApiError, MovieApi};
use crate::components::{
    render_movies_in_list, HomePage, LifecycleState, MovieDetailsPage, MovieId,
};
use crate::config::{Config, StartPage};
use crate::dom::{Dom, DomError, NodeId};
use crate::models::SearchQuery;
use crate::notify::Notifier;
use crate::templates::register_builtin_templates;

const SEARCH_RESULTS_ID: &str = "search-results";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search query is empty")]
    EmptyQuery,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Dom(#[from] DomError),
}

#[derive(Clone)]
pub enum Page {
    Home(HomePage),
    Details(MovieDetailsPage),
}

impl Page {
    pub fn host(&self) -> NodeId {
        match self {
            Page::Home(p) => p.host(),
            Page::Details(p) => p.host(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        match self {
            Page::Home(p) => p.state(),
            Page::Details(p) => p.state(),
        }
    }

    fn connected_callback(&self) -> JoinHandle<()> {
        match self {
            Page::Home(p) => p.connected_callback(),
            Page::Details(p) => p.connected_callback(),
        }
    }

    fn disconnected_callback(&self) {
        match self {
            Page::Home(p) => p.disconnected_callback(),
            Page::Details(p) => p.disconnected_callback(),
        }
    }
}

pub struct App {
    dom: Dom,
    api: Arc<dyn MovieApi>,
    notifier: Arc<dyn Notifier>,
    config: Config,
}

impl App {
    pub fn new(dom: Dom, api: Arc<dyn MovieApi>, notifier: Arc<dyn Notifier>, config: Config) -> Self {
        dom.with(register_builtin_templates);
        Self {
            dom,
            api,
            notifier,
            config,
        }
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    fn main_element(&self) -> Result<NodeId, DomError> {
        self.dom.with(|doc| {
            doc.query_selector(doc.root(), "main")
                .ok_or_else(|| DomError::MissingElement("main".to_string()))
        })
    }

    pub fn start(&self) -> Result<(Page, JoinHandle<()>), DomError> {
        let page = match self.config.start_page {
            StartPage::Home => Page::Home(HomePage::new(
                self.dom.clone(),
                self.api.clone(),
                self.notifier.clone(),
                self.config.random_policy,
            )),
            StartPage::Details => Page::Details(MovieDetailsPage::new(
                self.dom.clone(),
                self.api.clone(),
                self.notifier.clone(),
                MovieId::Fixed(self.config.movie_id),
            )),
        };
        let handle = self.mount(&page)?;
        Ok((page, handle))
    }

    pub fn mount(&self, page: &Page) -> Result<JoinHandle<()>, DomError> {
        let main = self.main_element()?;
        self.dom.with(|doc| {
            doc.detach_children(main);
            doc.append_child(main, page.host());
        });
        info!("Mounted page into <main>");
        Ok(page.connected_callback())
    }

    pub fn unmount(&self, page: &Page) {
        self.dom.with(|doc| doc.remove(page.host()));
        page.disconnected_callback();
        debug!("Unmounted page");
    }

    pub async fn search(&self, q: &str) -> Result<usize, SearchError> {
        let q = q.trim();
        if q.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let mut query = SearchQuery::new(q).order(self.config.search_order.clone());
        if let Some(genre) = &self.config.search_genre {
            query = query.genre(genre.clone());
        }
        let movies = self.api.search_movies(&query).await?;
        let main = self.main_element()?;
        self.dom.with(|doc| {
            let list = match doc.query_selector(main, &format!("ul#{SEARCH_RESULTS_ID}")) {
                Some(list) => list,
                None => {
                    let list = doc.append_element(main, "ul");
                    doc.set_attribute(list, "id", SEARCH_RESULTS_ID);
                    list
                }
            };
            render_movies_in_list(doc, &movies, list);
        });
        info!("Search '{}' returned {} movies", q, movies.len());
        Ok(movies.len())
    }
}
