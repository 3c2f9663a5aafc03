use std::collections::BTreeMap;

pub const CURRENT_STATUS: &str = "currentStatus";
pub const END_DATE: &str = "detailsEndDate";
pub const DURATION: &str = "detailsDuration";
pub const INITIATE_ANOTHER: &str = "initiateAnotherImport";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Inline,
    InlineBlock,
}

/// Render target for the widget: named text fields, per-element visibility
/// and an indicator icon.
pub trait StatusBoard {
    fn set_text(&mut self, field: &str, text: &str);
    fn set_visibility(&mut self, element: &str, visibility: Visibility);
    fn set_icon(&mut self, href: &str);

    fn show(&mut self, element: &str, inline: bool) {
        let visibility = if inline {
            Visibility::Inline
        } else {
            Visibility::InlineBlock
        };
        self.set_visibility(element, visibility);
    }

    fn hide(&mut self, element: &str) {
        self.set_visibility(element, Visibility::Hidden);
    }
}

/// In-memory board. The dashboard draws from a clone of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldBoard {
    texts: BTreeMap<String, String>,
    visibility: BTreeMap<String, Visibility>,
    icon: Option<String>,
}

impl FieldBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.texts.get(field).map(String::as_str)
    }

    pub fn text_or<'a>(&'a self, field: &str, fallback: &'a str) -> &'a str {
        self.text(field).unwrap_or(fallback)
    }

    /// Elements never shown or hidden count as hidden.
    pub fn visibility(&self, element: &str) -> Visibility {
        self.visibility
            .get(element)
            .copied()
            .unwrap_or(Visibility::Hidden)
    }

    pub fn is_visible(&self, element: &str) -> bool {
        self.visibility(element) != Visibility::Hidden
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }
}

impl StatusBoard for FieldBoard {
    fn set_text(&mut self, field: &str, text: &str) {
        self.texts.insert(field.to_string(), text.to_string());
    }

    fn set_visibility(&mut self, element: &str, visibility: Visibility) {
        self.visibility.insert(element.to_string(), visibility);
    }

    fn set_icon(&mut self, href: &str) {
        self.icon = Some(href.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_and_hide_follow_inline_flag() {
        let mut board = FieldBoard::new();
        assert!(!board.is_visible(INITIATE_ANOTHER));

        board.show(INITIATE_ANOTHER, false);
        assert_eq!(board.visibility(INITIATE_ANOTHER), Visibility::InlineBlock);

        board.show(INITIATE_ANOTHER, true);
        assert_eq!(board.visibility(INITIATE_ANOTHER), Visibility::Inline);

        board.hide(INITIATE_ANOTHER);
        assert!(!board.is_visible(INITIATE_ANOTHER));
    }

    #[test]
    fn later_text_replaces_earlier() {
        let mut board = FieldBoard::new();
        board.set_text(CURRENT_STATUS, "RUNNING");
        board.set_text(CURRENT_STATUS, "DONE");
        assert_eq!(board.text(CURRENT_STATUS), Some("DONE"));
        assert_eq!(board.text_or(END_DATE, "-"), "-");
    }
}
