use crate::components::AnimatedLoading;
use crate::dom::{Document, NodeId};

pub const HOME_TEMPLATE: &str = "template-home";
pub const MOVIE_DETAILS_TEMPLATE: &str = "template-movie-details";

pub fn register_builtin_templates(doc: &mut Document) {
    if !doc.has_template(HOME_TEMPLATE) {
        define_home(doc);
    }
    if !doc.has_template(MOVIE_DETAILS_TEMPLATE) {
        define_movie_details(doc);
    }
}

fn section(doc: &mut Document, parent: NodeId, id: &str, heading: &str) {
    let section = doc.append_element(parent, "section");
    doc.set_attribute(section, "id", id);
    let h2 = doc.append_element(section, "h2");
    doc.set_text(h2, heading);
    let ul = doc.append_element(section, "ul");
    doc.set_attribute(ul, "class", "movies");
    let loading = doc.append_element(ul, AnimatedLoading::TAG);
    doc.set_attribute(loading, "data-elements", "5");
    doc.set_attribute(loading, "data-width", "150px");
    doc.set_attribute(loading, "data-height", "220px");
}

fn define_home(doc: &mut Document) {
    let template = doc.define_template(HOME_TEMPLATE);
    section(doc, template, "top-10", "Top 10 Movies");
    section(doc, template, "random", "Something to watch today");
}

fn define_movie_details(doc: &mut Document) {
    let template = doc.define_template(MOVIE_DETAILS_TEMPLATE);
    let article = doc.append_element(template, "article");
    doc.set_attribute(article, "id", "movie");
    doc.append_element(article, "h2");
    doc.append_element(article, "h3");
    let header = doc.append_element(article, "header");
    doc.append_element(header, "img");
    let overview = doc.append_element(article, "p");
    doc.set_attribute(overview, "id", "overview");
    let metadata = doc.append_element(article, "dl");
    doc.set_attribute(metadata, "id", "metadata");
}
