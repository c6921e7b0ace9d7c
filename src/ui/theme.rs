use ratatui::style::Color;

pub struct Theme {
    pub fg: Color,
    pub comment: Color,
    pub info: Color,
    pub error: Color,
    pub prompt: Color,
    pub address: Color,
    pub type_name: Color,
    pub border_focused: Color,
    pub border_normal: Color,
    pub status_bg: Color,
    pub status_fg: Color,
}

pub const DEFAULT_THEME: Theme = Theme {
    fg: Color::Rgb(205, 214, 244),
    comment: Color::Rgb(108, 112, 134),
    info: Color::Rgb(166, 227, 161),          // Green for progress notes
    error: Color::Rgb(243, 139, 168),         // Red for failures
    prompt: Color::Rgb(137, 180, 250),        // Blue prompt marker
    address: Color::Rgb(249, 226, 175),       // Yellow for addresses
    type_name: Color::Rgb(148, 226, 213),     // Cyan/teal for type names
    border_focused: Color::Rgb(249, 226, 175),
    border_normal: Color::Rgb(108, 112, 134),
    status_bg: Color::Rgb(49, 50, 68),
    status_fg: Color::Rgb(205, 214, 244),
};
