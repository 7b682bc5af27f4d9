use crate::dom::{Document, NodeId};
use crate::models::MovieSummary;

#[derive(Debug, Clone)]
pub struct MovieItem {
    movie: MovieSummary,
}

impl MovieItem {
    pub const TAG: &'static str = "movie-item";

    pub fn new(movie: MovieSummary) -> Self {
        Self { movie }
    }

    pub fn movie(&self) -> &MovieSummary {
        &self.movie
    }

    pub fn mount(&self, doc: &mut Document, parent: NodeId) -> NodeId {
        let host = doc.append_element(parent, Self::TAG);
        self.connected_callback(doc, host);
        host
    }

    pub fn connected_callback(&self, doc: &mut Document, host: NodeId) {
        doc.clear_children(host);
        let link = doc.append_element(host, "a");
        doc.set_attribute(link, "href", "#");
        let article = doc.append_element(link, "article");
        let img = doc.append_element(article, "img");
        doc.set_attribute(img, "src", &self.movie.poster_url);
        doc.set_attribute(img, "alt", &format!("{} Poster", self.movie.title));
        let caption = doc.append_element(article, "p");
        doc.set_text(
            caption,
            &format!("{} ({})", self.movie.title, self.movie.release_year),
        );
    }
}
