// Built-in rule set for pages rendered without a browser-side rule engine

use crate::audit::{PageAuditor, RawNode, RawViolation};
use crate::error::{Result, ScanError};
use crate::render::RenderedPage;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use tracing::debug;

const HELP_URL_BASE: &str = "https://dequeuniversity.com/rules/axe/4.10";
const MAX_SNIPPET_LEN: usize = 250;

type Check = fn(&Html) -> Result<Vec<RawNode>>;

struct Rule {
    id: &'static str,
    impact: &'static str,
    description: &'static str,
    help: &'static str,
    tags: &'static [&'static str],
    check: Check,
}

const RULES: &[Rule] = &[
    Rule {
        id: "image-alt",
        impact: "critical",
        description: "Ensures <img> elements have alternate text or a role of none or presentation",
        help: "Images must have alternate text",
        tags: &["cat.text-alternatives", "wcag2a", "wcag111", "section508"],
        check: check_image_alt,
    },
    Rule {
        id: "html-has-lang",
        impact: "serious",
        description: "Ensures every HTML document has a lang attribute",
        help: "<html> element must have a lang attribute",
        tags: &["cat.language", "wcag2a", "wcag311"],
        check: check_html_lang,
    },
    Rule {
        id: "document-title",
        impact: "serious",
        description: "Ensures each HTML document contains a non-empty <title> element",
        help: "Documents must have <title> element to aid in navigation",
        tags: &["cat.text-alternatives", "wcag2a", "wcag242"],
        check: check_document_title,
    },
    Rule {
        id: "link-name",
        impact: "serious",
        description: "Ensures links have discernible text",
        help: "Links must have discernible text",
        tags: &["cat.name-role-value", "wcag2a", "wcag244", "wcag412"],
        check: check_link_name,
    },
    Rule {
        id: "button-name",
        impact: "critical",
        description: "Ensures buttons have discernible text",
        help: "Buttons must have discernible text",
        tags: &["cat.name-role-value", "wcag2a", "wcag412"],
        check: check_button_name,
    },
    Rule {
        id: "label",
        impact: "critical",
        description: "Ensures every form element has a label",
        help: "Form elements must have labels",
        tags: &["cat.forms", "wcag2a", "wcag131", "wcag412"],
        check: check_form_labels,
    },
    Rule {
        id: "empty-heading",
        impact: "minor",
        description: "Ensures headings have discernible text",
        help: "Headings should not be empty",
        tags: &["cat.name-role-value", "best-practice"],
        check: check_empty_heading,
    },
];

/// Audits the static markup of a page against a small WCAG 2.x rule set.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticAuditor;

impl StaticAuditor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PageAuditor for StaticAuditor {
    async fn audit(&self, page: &dyn RenderedPage) -> Result<Vec<RawViolation>> {
        let html = page.content().await?;
        let violations = audit_html(&html)?;
        debug!("{} rule(s) failed on {}", violations.len(), page.url());
        Ok(violations)
    }
}

/// Run every rule over `html`. A rule with no failing node is not reported.
pub fn audit_html(html: &str) -> Result<Vec<RawViolation>> {
    let document = Html::parse_document(html);
    let mut violations = Vec::new();

    for rule in RULES {
        let nodes = (rule.check)(&document)?;
        if nodes.is_empty() {
            continue;
        }
        violations.push(RawViolation {
            id: rule.id.to_string(),
            impact: Some(rule.impact.to_string()),
            description: rule.description.to_string(),
            help: rule.help.to_string(),
            help_url: format!("{}/{}", HELP_URL_BASE, rule.id),
            tags: rule.tags.iter().map(|t| t.to_string()).collect(),
            nodes,
        });
    }

    Ok(violations)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScanError::ParseError(format!("{}: {:?}", css, e)))
}

fn check_image_alt(document: &Html) -> Result<Vec<RawNode>> {
    let img = selector("img")?;
    Ok(document
        .select(&img)
        .filter(|el| {
            let attrs = el.value();
            let presentational = matches!(attrs.attr("role"), Some("none") | Some("presentation"));
            attrs.attr("alt").is_none()
                && !presentational
                && !has_aria_name(el)
        })
        .map(|el| {
            failing_node(
                &el,
                "Fix any of the following:\n  Element does not have an alt attribute\n  aria-label attribute does not exist or is empty\n  Element's default semantics were not overridden with role=\"none\" or role=\"presentation\"",
            )
        })
        .collect())
}

fn check_html_lang(document: &Html) -> Result<Vec<RawNode>> {
    let root = selector("html")?;
    Ok(document
        .select(&root)
        .filter(|el| {
            el.value()
                .attr("lang")
                .or_else(|| el.value().attr("xml:lang"))
                .is_none_or(|lang| lang.trim().is_empty())
        })
        .map(|el| RawNode {
            target: vec!["html".to_string()],
            html: opening_tag(&el),
            failure_summary: "Fix any of the following:\n  The <html> element does not have a lang attribute".to_string(),
            xpath: Some(vec![xpath(&el)]),
        })
        .collect())
}

fn check_document_title(document: &Html) -> Result<Vec<RawNode>> {
    let title = selector("title")?;
    let has_title = document
        .select(&title)
        .any(|el| !element_text(&el).is_empty());
    if has_title {
        return Ok(Vec::new());
    }

    let root = selector("html")?;
    Ok(document
        .select(&root)
        .take(1)
        .map(|el| RawNode {
            target: vec!["html".to_string()],
            html: opening_tag(&el),
            failure_summary: "Fix any of the following:\n  Document does not have a non-empty <title> element".to_string(),
            xpath: Some(vec![xpath(&el)]),
        })
        .collect())
}

fn check_link_name(document: &Html) -> Result<Vec<RawNode>> {
    let links = selector("a[href]")?;
    let images = selector("img[alt]")?;
    Ok(document
        .select(&links)
        .filter(|el| {
            let image_text = el
                .select(&images)
                .any(|img| img.value().attr("alt").is_some_and(|alt| !alt.trim().is_empty()));
            element_text(el).is_empty() && !has_aria_name(el) && !image_text
        })
        .map(|el| {
            failing_node(
                &el,
                "Fix all of the following:\n  Element is in tab order and does not have accessible text\n\nFix any of the following:\n  Element does not have text that is visible to screen readers\n  aria-label attribute does not exist or is empty",
            )
        })
        .collect())
}

fn check_button_name(document: &Html) -> Result<Vec<RawNode>> {
    let buttons = selector("button, input[type=\"button\"], input[type=\"submit\"], input[type=\"reset\"]")?;
    Ok(document
        .select(&buttons)
        .filter(|el| {
            let value = el.value();
            let input_text = value
                .attr("value")
                .is_some_and(|v| !v.trim().is_empty());
            // Submit and reset inputs get a default caption from the browser
            let default_caption = value.name() == "input"
                && matches!(value.attr("type"), Some("submit") | Some("reset"));
            element_text(el).is_empty()
                && !input_text
                && !default_caption
                && !has_aria_name(el)
                && value.attr("title").is_none_or(|t| t.trim().is_empty())
        })
        .map(|el| {
            failing_node(
                &el,
                "Fix any of the following:\n  Element does not have inner text that is visible to screen readers\n  aria-label attribute does not exist or is empty\n  Element has no title attribute",
            )
        })
        .collect())
}

fn check_form_labels(document: &Html) -> Result<Vec<RawNode>> {
    let labels = selector("label[for]")?;
    let labelled_ids: HashSet<&str> = document
        .select(&labels)
        .filter_map(|label| label.value().attr("for"))
        .collect();

    let fields = selector("input, select, textarea")?;
    Ok(document
        .select(&fields)
        .filter(|el| {
            let value = el.value();
            let exempt = value.name() == "input"
                && matches!(
                    value.attr("type"),
                    Some("hidden") | Some("submit") | Some("reset") | Some("button") | Some("image")
                );
            let explicit = value.attr("id").is_some_and(|id| labelled_ids.contains(id));
            let wrapped = el.ancestors().any(|node| {
                node.value()
                    .as_element()
                    .is_some_and(|parent| parent.name() == "label")
            });
            !exempt
                && !explicit
                && !wrapped
                && !has_aria_name(el)
                && value.attr("title").is_none_or(|t| t.trim().is_empty())
        })
        .map(|el| {
            failing_node(
                &el,
                "Fix any of the following:\n  Form element does not have an implicit (wrapped) <label>\n  Form element does not have an explicit <label>\n  aria-label attribute does not exist or is empty",
            )
        })
        .collect())
}

fn check_empty_heading(document: &Html) -> Result<Vec<RawNode>> {
    let headings = selector("h1, h2, h3, h4, h5, h6")?;
    Ok(document
        .select(&headings)
        .filter(|el| element_text(el).is_empty() && !has_aria_name(el))
        .map(|el| {
            failing_node(
                &el,
                "Fix any of the following:\n  Element does not have text that is visible to screen readers",
            )
        })
        .collect())
}

fn failing_node(el: &ElementRef, summary: &str) -> RawNode {
    RawNode {
        target: vec![css_target(el)],
        html: snippet(&el.html()),
        failure_summary: summary.to_string(),
        xpath: Some(vec![xpath(el)]),
    }
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn has_aria_name(el: &ElementRef) -> bool {
    let value = el.value();
    value
        .attr("aria-label")
        .is_some_and(|label| !label.trim().is_empty())
        || value.attr("aria-labelledby").is_some()
}

fn opening_tag(el: &ElementRef) -> String {
    let attrs: String = el
        .value()
        .attrs()
        .map(|(k, v)| format!(" {}=\"{}\"", k, v))
        .collect();
    format!("<{}{}>", el.value().name(), attrs)
}

fn snippet(html: &str) -> String {
    if html.len() <= MAX_SNIPPET_LEN {
        return html.to_string();
    }
    let mut end = MAX_SNIPPET_LEN;
    while !html.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &html[..end])
}

fn css_target(el: &ElementRef) -> String {
    let value = el.value();
    if let Some(id) = value.id() {
        return format!("#{}", id);
    }
    let classes: Vec<&str> = value.classes().collect();
    if classes.is_empty() {
        value.name().to_string()
    } else {
        format!("{}.{}", value.name(), classes.join("."))
    }
}

fn xpath(el: &ElementRef) -> String {
    let mut segments = Vec::new();
    let node = **el;

    for current in std::iter::once(node).chain(node.ancestors()) {
        let Node::Element(element) = current.value() else {
            continue;
        };
        let name = element.name();
        let position = 1 + current
            .prev_siblings()
            .filter(|sibling| {
                sibling
                    .value()
                    .as_element()
                    .is_some_and(|e| e.name() == name)
            })
            .count();
        segments.push(format!("{}[{}]", name, position));
    }

    segments.reverse();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HtmlPage;

    fn ids(violations: &[RawViolation]) -> Vec<&str> {
        violations.iter().map(|v| v.id.as_str()).collect()
    }

    const CLEAN_PAGE: &str = r#"<!DOCTYPE html>
        <html lang="en">
        <head><title>Home</title></head>
        <body>
            <h1>Welcome</h1>
            <img src="logo.png" alt="Company logo">
            <a href="/about">About us</a>
            <button>Send</button>
            <label for="email">Email</label><input id="email" type="email">
            <label>Name <input type="text"></label>
            <input type="hidden" name="csrf">
            <input type="submit">
        </body></html>"#;

    #[test]
    fn test_clean_page_has_no_violations() {
        let violations = audit_html(CLEAN_PAGE).unwrap();
        assert!(violations.is_empty(), "unexpected: {:?}", ids(&violations));
    }

    #[test]
    fn test_missing_lang_and_title() {
        let violations = audit_html("<html><head></head><body><p>Hi</p></body></html>").unwrap();
        assert_eq!(ids(&violations), vec!["html-has-lang", "document-title"]);
        assert_eq!(violations[0].nodes[0].target, vec!["html".to_string()]);
    }

    #[test]
    fn test_image_without_alt_is_critical() {
        let html = r#"<html lang="en"><head><title>t</title></head><body>
            <div><img class="hero big" src="a.png"></div>
            <img src="b.png" alt="">
            <img src="c.png" role="presentation">
        </body></html>"#;

        let violations = audit_html(html).unwrap();

        assert_eq!(ids(&violations), vec!["image-alt"]);
        let violation = &violations[0];
        assert_eq!(violation.impact.as_deref(), Some("critical"));
        assert!(violation.tags.contains(&"wcag2a".to_string()));
        assert_eq!(violation.nodes.len(), 1);
        assert_eq!(violation.nodes[0].target, vec!["img.hero.big".to_string()]);
        assert_eq!(
            violation.nodes[0].xpath.as_ref().unwrap()[0],
            "/html[1]/body[1]/div[1]/img[1]"
        );
    }

    #[test]
    fn test_empty_link_and_button() {
        let html = r#"<html lang="en"><head><title>t</title></head><body>
            <a href="/x" id="icon-link"><span></span></a>
            <a href="/y"><img src="y.png" alt="Home"></a>
            <a href="/z" aria-label="Search"></a>
            <button id="close"></button>
            <button title="Menu"></button>
        </body></html>"#;

        let violations = audit_html(html).unwrap();

        assert_eq!(ids(&violations), vec!["link-name", "button-name"]);
        assert_eq!(violations[0].nodes[0].target, vec!["#icon-link".to_string()]);
        assert_eq!(violations[1].nodes[0].target, vec!["#close".to_string()]);
    }

    #[test]
    fn test_unlabelled_form_fields() {
        let html = r#"<html lang="en"><head><title>t</title></head><body>
            <input type="text" name="q">
            <select name="s"></select>
            <textarea aria-label="Comment"></textarea>
        </body></html>"#;

        let violations = audit_html(html).unwrap();

        assert_eq!(ids(&violations), vec!["label"]);
        assert_eq!(violations[0].nodes.len(), 2);
    }

    #[test]
    fn test_empty_heading_is_best_practice_only() {
        let html = r#"<html lang="en"><head><title>t</title></head><body><h2> </h2></body></html>"#;
        let violations = audit_html(html).unwrap();

        assert_eq!(ids(&violations), vec!["empty-heading"]);
        assert_eq!(violations[0].impact.as_deref(), Some("minor"));
        assert!(!violations[0].tags.iter().any(|t| t.starts_with("wcag")));
    }

    #[test]
    fn test_long_snippets_are_truncated() {
        let long_class = "x".repeat(400);
        let html = format!(
            r#"<html lang="en"><head><title>t</title></head><body><img class="{}" src="a.png"></body></html>"#,
            long_class
        );
        let violations = audit_html(&html).unwrap();
        let snippet = &violations[0].nodes[0].html;
        assert!(snippet.ends_with("..."));
        assert!(snippet.len() <= MAX_SNIPPET_LEN + 3);
    }

    #[tokio::test]
    async fn test_static_auditor_reads_page_content() {
        let page = HtmlPage::new("http://example.com/", "<html><body></body></html>");
        let violations = StaticAuditor::new().audit(&page).await.unwrap();
        assert_eq!(ids(&violations), vec!["html-has-lang", "document-title"]);
    }
}
