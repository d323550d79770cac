//! Per-content-kind wiring around the quiz engine.
//!
//! The engine itself knows nothing about where a quiz lives; these adapters
//! supply the labels and routes a front end needs to frame it, plus the
//! hook that takes the user back to the content item.

use std::fmt;

use quiz_core::model::{ContentKind, ContentRef};

/// Navigation callback invoked with the route of the originating content item.
pub type ReturnHook = Box<dyn Fn(&str) + Send + Sync + 'static>;

pub struct ContentAdapter {
    content: ContentRef,
    on_return: Option<ReturnHook>,
}

impl ContentAdapter {
    #[must_use]
    pub fn new(content: ContentRef) -> Self {
        Self {
            content,
            on_return: None,
        }
    }

    #[must_use]
    pub fn with_return_hook(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_return = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn content(&self) -> ContentRef {
        self.content
    }

    /// Trail shown above the quiz, outermost first.
    #[must_use]
    pub fn breadcrumb(&self) -> Vec<String> {
        vec![
            "Dashboard".to_string(),
            section_title(self.content.kind).to_string(),
            "Quiz".to_string(),
        ]
    }

    /// Route of the content item the quiz belongs to.
    #[must_use]
    pub fn return_route(&self) -> String {
        format!(
            "/dashboard/{}/{}",
            route_segment(self.content.kind),
            self.content.id
        )
    }

    #[must_use]
    pub fn runner_route(&self) -> String {
        format!("{}/quiz-runner", self.return_route())
    }

    /// Label of the button on the result screen.
    #[must_use]
    pub fn return_label(&self) -> String {
        format!("BACK TO {}", self.content.kind.as_str().to_uppercase())
    }

    /// Navigate back to the content item. Returns `false` when no hook was supplied.
    pub fn return_to_content(&self) -> bool {
        match &self.on_return {
            Some(hook) => {
                let route = self.return_route();
                tracing::debug!(content = %self.content, %route, "returning to content");
                hook(&route);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for ContentAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentAdapter")
            .field("content", &self.content)
            .field("has_return_hook", &self.on_return.is_some())
            .finish()
    }
}

fn route_segment(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Webinar => "webinar",
        ContentKind::Conference => "conferences",
        ContentKind::Workshop => "workshop",
        ContentKind::Program => "program",
        ContentKind::Elearning => "elearning",
    }
}

fn section_title(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Webinar => "Webinars",
        ContentKind::Conference => "Conferences",
        ContentKind::Workshop => "Workshops",
        ContentKind::Program => "Programs",
        ContentKind::Elearning => "E-Learning",
    }
}
