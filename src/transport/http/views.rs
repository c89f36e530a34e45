//! HTML pages for the visitor list and the generic error screen.

use crate::domain::model::Visitor;
use maud::{html, Markup, DOCTYPE};

/// Shown to the user whenever the list cannot be produced. Never includes error details.
pub const LIST_FAILURE_DETAIL: &str = "Could not retrieve visitors.";

/// Shown when a handler fails in a way no handler anticipated.
pub const GENERIC_FAILURE_DETAIL: &str = "An unexpected error occurred.";

const STYLESHEET: &str = "/static/style.css";

fn page(title: &str, content: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) }
                link rel="stylesheet" href=(STYLESHEET);
            }
            body { (content) }
        }
    }
    .into_string()
}

pub fn render_index(visitors: &[Visitor]) -> String {
    let content = html! {
        h1 { "Visitor Book" }
        form method="post" action="/add" {
            label {
                "Your name "
                input type="text" name="name" required;
            }
            input type="submit" value="Sign";
        }
        @if visitors.is_empty() {
            p.empty { "No visitors yet." }
        } @else {
            ol.visitors {
                @for visitor in visitors {
                    li data-id=(visitor.id) { (visitor.name) }
                }
            }
        }
    };
    page("Visitor Book", content)
}

pub fn render_error(detail: &str) -> String {
    let content = html! {
        h1 { "Something went wrong" }
        p.error { (detail) }
        p { a href="/" { "Back" } }
    };
    page("Error - Visitor Book", content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_lists_visitors_in_given_order() {
        let visitors = vec![
            Visitor { id: 1, name: "Alice".to_string() },
            Visitor { id: 2, name: "Bob".to_string() },
        ];
        let html = render_index(&visitors);
        let alice = html.find("Alice").unwrap();
        let bob = html.find("Bob").unwrap();
        assert!(alice < bob);
        assert!(html.contains("<li data-id=\"2\">Bob</li>"));
        assert!(!html.contains("No visitors yet."));
    }

    #[test]
    fn empty_index_shows_placeholder() {
        assert!(render_index(&[]).contains("No visitors yet."));
    }

    #[test]
    fn names_are_escaped() {
        let visitors = vec![Visitor { id: 7, name: "<script>alert('x')</script>".to_string() }];
        let html = render_index(&visitors);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&lt;/script&gt;"));
    }

    #[test]
    fn markup_characters_in_names_cannot_break_out_of_the_item() {
        let visitors = vec![Visitor { id: 3, name: "Tom & \"Jerry\"".to_string() }];
        let html = render_index(&visitors);
        assert!(html.contains("<li data-id=\"3\">Tom &amp; &quot;Jerry&quot;</li>"));
    }

    #[test]
    fn error_page_only_shows_detail() {
        let html = render_error(LIST_FAILURE_DETAIL);
        assert!(html.contains(LIST_FAILURE_DETAIL));
        assert!(html.contains("href=\"/\""));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Error - Visitor Book</title>"));
    }
}
