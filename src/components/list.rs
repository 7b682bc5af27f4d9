use crate::dom::{Document, NodeId};
use crate::models::MovieSummary;

/// Replaces the children of `ul` with one `<li>` per movie, in input order.
pub fn render_movies_in_list(doc: &mut Document, movies: &[MovieSummary], ul: NodeId) {
    doc.clear_children(ul);
    for movie in movies {
        let li = doc.append_element(ul, "li");
        doc.set_text(li, &movie.title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: i64, title: &str) -> MovieSummary {
        MovieSummary {
            id,
            title: title.to_string(),
            poster_url: format!("/img/{id}.jpg"),
            release_year: 2000,
        }
    }

    fn titles(doc: &Document, ul: NodeId) -> Vec<String> {
        doc.children(ul)
            .into_iter()
            .map(|li| doc.text_content(li))
            .collect()
    }

    #[test]
    fn renders_titles_in_order() {
        let mut doc = Document::new();
        let ul = doc.create_element("ul");
        let movies = vec![summary(1, "Heat"), summary(2, "Alien"), summary(3, "Heat")];
        render_movies_in_list(&mut doc, &movies, ul);
        assert_eq!(titles(&doc, ul), vec!["Heat", "Alien", "Heat"]);
    }

    #[test]
    fn empty_input_leaves_empty_list() {
        let mut doc = Document::new();
        let ul = doc.create_element("ul");
        render_movies_in_list(&mut doc, &[], ul);
        assert!(doc.children(ul).is_empty());
    }

    #[test]
    fn repeated_render_replaces_existing_items() {
        let mut doc = Document::new();
        let ul = doc.create_element("ul");
        let stale = doc.append_element(ul, "li");
        doc.set_text(stale, "stale");
        let movies = vec![summary(1, "Heat"), summary(2, "Alien")];
        render_movies_in_list(&mut doc, &movies, ul);
        render_movies_in_list(&mut doc, &movies, ul);
        assert_eq!(titles(&doc, ul), vec!["Heat", "Alien"]);
    }
}
