use crate::dom::{Document, NodeId};

const MAX_ELEMENTS: usize = 100;

#[derive(Debug, Clone, Copy, Default)]
pub struct AnimatedLoading;

impl AnimatedLoading {
    pub const TAG: &'static str = "animated-loading";

    pub fn connected_callback(&self, doc: &mut Document, host: NodeId) {
        let count = doc
            .get_attribute(host, "data-elements")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0)
            .min(MAX_ELEMENTS);
        let width = doc.get_attribute(host, "data-width").unwrap_or("").to_string();
        let height = doc.get_attribute(host, "data-height").unwrap_or("").to_string();
        let style = format!("width:{width};height:{height};display:inline-block;margin:10px");

        doc.clear_children(host);
        for _ in 0..count {
            let wave = doc.append_element(host, "div");
            doc.set_attribute(wave, "class", "loading-wave");
            doc.set_attribute(wave, "style", &style);
        }
    }
}
