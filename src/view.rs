// View-model: turns listing records into cards and cards into a node tree.
// Everything here is pure; the terminal front-end and the HTML renderer
// both read from the same `LibraryView`.

use crate::model::{Mode, Record};
use std::fmt::Write as _;

/// Delete control bound to one record path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteControl {
    pub path: String,
}

/// Visual unit for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub name: String,
    pub category: String,
    /// Server-relative identifier of the record.
    pub path: String,
    /// Audio source, `/static/<path>`.
    pub media_url: String,
    pub delete: Option<DeleteControl>,
}

/// Complete content of one container. Building a new view replaces the
/// old one wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryView {
    pub mode: Mode,
    pub container_id: &'static str,
    pub cards: Vec<Card>,
}

pub fn build_view(mode: Mode, records: &[Record]) -> LibraryView {
    let cards = records
        .iter()
        .map(|record| Card {
            name: record.name.clone(),
            category: record.category.clone(),
            path: record.path.clone(),
            media_url: record.media_url(),
            delete: mode.allows_delete().then(|| DeleteControl {
                path: record.path.clone(),
            }),
        })
        .collect();
    LibraryView {
        mode,
        container_id: mode.container_id(),
        cards,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<Node>,
}

impl Element {
    fn new(tag: &'static str) -> Self {
        Element {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => out.push_str(&e.text_content()),
            }
        }
        out
    }

    /// Depth-first search for descendants (self included) with `tag`.
    pub fn find_all(&self, tag: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect(tag, &mut found);
        found
    }

    fn collect<'a>(&'a self, tag: &str, found: &mut Vec<&'a Element>) {
        if self.tag == tag {
            found.push(self);
        }
        for child in &self.children {
            if let Node::Element(e) = child {
                e.collect(tag, found);
            }
        }
    }
}

impl Card {
    pub fn to_element(&self) -> Element {
        let mut card = Element::new("div")
            .attr("class", "card")
            .child(Element::new("h3").text(self.name.as_str()))
            .child(
                Element::new("p")
                    .attr("class", "category")
                    .text(self.category.as_str()),
            )
            .child(
                Element::new("audio")
                    .attr("controls", "")
                    .attr("src", self.media_url.as_str()),
            );
        if let Some(delete) = &self.delete {
            card = card.child(
                Element::new("button")
                    .attr("data-action", "delete")
                    .attr("data-path", delete.path.as_str())
                    .text("Delete"),
            );
        }
        card
    }
}

impl LibraryView {
    pub fn to_element(&self) -> Element {
        self.cards.iter().fold(
            Element::new("div").attr("id", self.container_id),
            |container, card| container.child(card.to_element()),
        )
    }

    pub fn to_html(&self) -> String {
        Node::Element(self.to_element()).to_html()
    }
}

impl Node {
    /// Serialize to HTML. Text and attribute values are escaped, so record
    /// fields can never inject markup.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(&escape(t)),
            Node::Element(e) => {
                out.push('<');
                out.push_str(e.tag);
                for (name, value) in &e.attrs {
                    if value.is_empty() {
                        let _ = write!(out, " {}", name);
                    } else {
                        let _ = write!(out, " {}=\"{}\"", name, escape(value));
                    }
                }
                out.push('>');
                for child in &e.children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{}>", e.tag);
            }
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
