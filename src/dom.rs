//! In-memory document model for the submission page.
//!
//! The page is parsed once with `scraper`; every element carrying an `id`
//! becomes an addressable [`Element`] whose content, class list and disabled
//! flag can be mutated afterwards. Forms additionally remember their named
//! fields so they can be packaged as [`FormData`].

use crate::{Error, Result};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::path::PathBuf;

/// Content currently held by an element
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Plain text, displayed verbatim
    Text(String),
    /// Markup, displayed as HTML
    Markup(String),
}

/// Value of a single form field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// File input; `None` when no file was chosen
    File(Option<PathBuf>),
}

/// A named form field in document order
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    pub value: FieldValue,
}

/// Field values collected from a form, ready to be encoded as multipart
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    pub fields: Vec<FormField>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.fields.push(FormField {
            name: name.to_string(),
            value: FieldValue::Text(value.to_string()),
        });
        self
    }

    /// First text value recorded under `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.name == name).and_then(|f| match &f.value {
            FieldValue::Text(v) => Some(v.as_str()),
            FieldValue::File(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// An addressable element of the document
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    classes: Vec<String>,
    disabled: bool,
    content: Content,
    fields: Vec<FormField>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            classes: Vec::new(),
            disabled: false,
            content: Content::Text(String::new()),
            fields: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Replace the content with plain text (like `textContent = ...`)
    pub fn set_text_content(&mut self, text: &str) {
        self.content = Content::Text(text.to_string());
    }

    /// Replace the content with markup (like `innerHTML = ...`)
    pub fn set_inner_html(&mut self, html: &str) {
        self.content = Content::Markup(html.to_string());
    }

    /// Text with markup stripped
    pub fn text_content(&self) -> String {
        match &self.content {
            Content::Text(t) => t.clone(),
            Content::Markup(html) => Html::parse_fragment(html)
                .root_element()
                .text()
                .collect::<String>(),
        }
    }

    /// Content serialised as HTML; plain text is escaped
    pub fn inner_html(&self) -> String {
        match &self.content {
            Content::Text(t) => escape_html(t),
            Content::Markup(html) => html.clone(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Named fields of a form element (empty for anything else)
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }
}

/// The loaded page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    title: String,
    root_classes: Vec<String>,
    elements: HashMap<String, Element>,
}

impl Document {
    /// Empty document with no addressable elements
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an HTML page. Duplicate ids resolve to the first element in
    /// document order, as `getElementById` does.
    pub fn parse(html: &str) -> Result<Self> {
        let page = Html::parse_document(html);
        let with_id = selector("[id]")?;
        let body = selector("body")?;
        let title = selector("title")?;

        let mut doc = Document {
            title: page
                .select(&title)
                .next()
                .map(|n| n.text().collect::<String>().trim().to_string())
                .unwrap_or_default(),
            root_classes: page
                .select(&body)
                .next()
                .map(|b| b.value().classes().map(|c| c.to_string()).collect())
                .unwrap_or_default(),
            elements: HashMap::new(),
        };

        for node in page.select(&with_id) {
            let Some(id) = node.value().id() else { continue };
            if doc.elements.contains_key(id) {
                continue;
            }
            let mut element = Element::new(node.value().name());
            element.classes = node.value().classes().map(|c| c.to_string()).collect();
            element.disabled = node.value().attr("disabled").is_some();
            element.content = Content::Markup(node.inner_html());
            if element.tag == "form" {
                element.fields = collect_fields(node)?;
            }
            doc.elements.insert(id.to_string(), element);
        }
        log::debug!("parsed page '{}' with {} addressable elements", doc.title, doc.elements.len());
        Ok(doc)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Insert (or replace) an element under `id`
    pub fn insert(&mut self, id: &str, element: Element) {
        self.elements.insert(id.to_string(), element);
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    /// Set plain text on `id` if present; returns whether the element exists
    pub fn set_text_content(&mut self, id: &str, text: &str) -> bool {
        match self.elements.get_mut(id) {
            Some(el) => {
                el.set_text_content(text);
                true
            }
            None => false,
        }
    }

    /// Set markup on `id` if present; returns whether the element exists
    pub fn set_inner_html(&mut self, id: &str, html: &str) -> bool {
        match self.elements.get_mut(id) {
            Some(el) => {
                el.set_inner_html(html);
                true
            }
            None => false,
        }
    }

    pub fn has_root_class(&self, class: &str) -> bool {
        self.root_classes.iter().any(|c| c == class)
    }

    pub fn add_root_class(&mut self, class: &str) {
        if !self.has_root_class(class) {
            self.root_classes.push(class.to_string());
        }
    }

    pub fn remove_root_class(&mut self, class: &str) {
        self.root_classes.retain(|c| c != class);
    }

    /// Collect the current field values of form `form_id`
    pub fn form_data(&self, form_id: &str) -> Result<FormData> {
        let form = self
            .elements
            .get(form_id)
            .filter(|el| el.tag == "form")
            .ok_or_else(|| Error::ElementNotFound(form_id.to_string()))?;
        Ok(FormData {
            fields: form.fields.clone(),
        })
    }

    /// Overwrite the first field named `name` in form `form_id`, appending it
    /// when the form has no such field.
    pub fn set_field(&mut self, form_id: &str, name: &str, value: FieldValue) -> Result<()> {
        let form = self
            .elements
            .get_mut(form_id)
            .filter(|el| el.tag == "form")
            .ok_or_else(|| Error::ElementNotFound(form_id.to_string()))?;
        match form.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => field.value = value,
            None => form.fields.push(FormField {
                name: name.to_string(),
                value,
            }),
        }
        Ok(())
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Page(format!("bad selector {}: {:?}", css, e)))
}

// Successful controls of a form, in document order.
fn collect_fields(form: ElementRef) -> Result<Vec<FormField>> {
    let controls = selector("input[name], textarea[name], select[name]")?;
    let option = selector("option")?;
    let mut fields = Vec::new();

    for control in form.select(&controls) {
        let el = control.value();
        if el.attr("disabled").is_some() {
            continue;
        }
        let name = el.attr("name").unwrap_or_default().to_string();
        let value = match el.name() {
            "textarea" => FieldValue::Text(control.text().collect()),
            "select" => {
                let mut options = control.select(&option);
                let chosen = control
                    .select(&option)
                    .find(|o| o.value().attr("selected").is_some())
                    .or_else(|| options.next());
                match chosen {
                    Some(o) => FieldValue::Text(
                        o.value()
                            .attr("value")
                            .map(|v| v.to_string())
                            .unwrap_or_else(|| o.text().collect::<String>().trim().to_string()),
                    ),
                    None => continue,
                }
            }
            _ => {
                let kind = el.attr("type").unwrap_or("text").to_ascii_lowercase();
                match kind.as_str() {
                    "submit" | "button" | "reset" | "image" => continue,
                    "file" => FieldValue::File(None),
                    "checkbox" | "radio" => {
                        if el.attr("checked").is_none() {
                            continue;
                        }
                        FieldValue::Text(el.attr("value").unwrap_or("on").to_string())
                    }
                    _ => FieldValue::Text(el.attr("value").unwrap_or_default().to_string()),
                }
            }
        };
        fields.push(FormField { name, value });
    }
    Ok(fields)
}

/// Escape text for inclusion in markup
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
