//! HTML and SVG tag tables.

use std::rc::Rc;

use super::node::DomNode;
use super::Dom;
use crate::tag::{Handlers, TagCatalog};

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

pub const HTML_TAGS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "base", "bdi", "bdo",
    "blockquote", "body", "br", "button", "canvas", "caption", "cite", "code", "col", "colgroup",
    "data", "datalist", "dd", "del", "details", "dfn", "dialog", "div", "dl", "dt", "em", "embed",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "head", "header", "hgroup", "hr", "html", "i", "iframe", "img", "input", "ins", "kbd", "label",
    "legend", "li", "link", "main", "map", "mark", "menu", "meta", "meter", "nav", "noscript",
    "object", "ol", "optgroup", "option", "output", "p", "picture", "pre", "progress", "q", "rp",
    "rt", "ruby", "s", "samp", "script", "search", "section", "select", "slot", "small", "source",
    "span", "strong", "style", "sub", "summary", "sup", "table", "tbody", "td", "template",
    "textarea", "tfoot", "th", "thead", "time", "title", "tr", "track", "u", "ul", "var", "video",
    "wbr",
];

pub const SVG_TAGS: &[&str] = &[
    "a", "animate", "animateMotion", "animateTransform", "circle", "clipPath", "defs", "desc",
    "ellipse", "feBlend", "feColorMatrix", "feComposite", "feFlood", "feGaussianBlur", "feMerge",
    "feMergeNode", "feOffset", "filter", "foreignObject", "g", "image", "line", "linearGradient",
    "marker", "mask", "metadata", "path", "pattern", "polygon", "polyline", "radialGradient",
    "rect", "script", "set", "stop", "style", "svg", "switch", "symbol", "text", "textPath",
    "title", "tspan", "use", "view",
];

/// Every HTML tag, created with [`DomNode::element`].
pub fn html_catalog(handlers: Rc<Handlers<Dom>>) -> TagCatalog<Dom> {
    let mut catalog = TagCatalog::new(handlers);
    for &name in HTML_TAGS {
        catalog.register(name, move || DomNode::element(name));
    }
    catalog
}

/// Every SVG tag, created in the SVG namespace.
pub fn svg_catalog(handlers: Rc<Handlers<Dom>>) -> TagCatalog<Dom> {
    let mut catalog = TagCatalog::new(handlers);
    for &name in SVG_TAGS {
        catalog.register(name, move || DomNode::element_ns(SVG_NAMESPACE, name));
    }
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogs_cover_their_tables() {
        let html = html_catalog(Rc::new(Handlers::new()));
        let svg = svg_catalog(Rc::new(Handlers::new()));

        assert_eq!(html.len(), HTML_TAGS.len());
        assert_eq!(svg.len(), SVG_TAGS.len());
        assert!(html.contains("section"));
        assert!(!html.contains("circle"));
    }

    #[test]
    fn svg_nodes_are_namespaced() {
        let svg = svg_catalog(Rc::new(Handlers::new()));
        let circle = svg.tag("circle").map(|tag| tag.options().create());

        assert_eq!(circle.as_ref().ok().and_then(DomNode::namespace), Some(SVG_NAMESPACE));
    }
}
