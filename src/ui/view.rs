use ratatui::{prelude::Rect, Frame};

/// Contract shared by the tab panels
pub trait View {
    /// Render the view
    fn render(&self, f: &mut Frame, area: Rect);

    /// Get the view title
    fn get_title(&self) -> String;

    /// Key hints shown in the status bar while the view is active
    fn get_status(&self) -> String;

    /// Whether the view is capturing text input
    fn is_editing(&self) -> bool {
        false
    }
}
