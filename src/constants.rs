//! Default values for widget layout, color handling and node sizing
//!
//! Centralized location for all hard-coded values; `WidgetSettings` starts
//! from these and can override any of them.

/// Layout constants shared by widgets and sockets
pub mod layout {
    /// Height of one input/output slot row
    pub const SLOT_HEIGHT: f32 = 20.0;

    /// Height of a widget row when the widget doesn't compute its own size
    pub const WIDGET_HEIGHT: f32 = 20.0;

    /// Vertical gap the layout inserts after every widget row
    pub const WIDGET_GAP: f32 = 4.0;

    /// Extra padding added once below the widget block
    pub const WIDGET_BLOCK_PADDING: f32 = 8.0;

    /// Minimum node width
    pub const MIN_NODE_WIDTH: f32 = 140.0;

    /// Approximate width of one title character, used for title sizing
    pub const TITLE_CHAR_WIDTH: f32 = 8.4;

    /// Horizontal padding around the title text
    pub const TITLE_PADDING: f32 = 40.0;
}

/// Color widget constants
pub mod color {
    /// Kind tag of the color widget
    pub const KIND: &str = "COLOR";

    /// Value used when a COLOR input declares no default
    pub const DEFAULT_COLOR: &str = "#ff0000";

    /// Brightness above which a color counts as bright
    pub const BRIGHT_THRESHOLD: u8 = 240;

    /// Brightness above which the swatch label is drawn in black
    pub const LABEL_CONTRAST_THRESHOLD: u8 = 125;

    /// View scale above which non-color tagged widgets skip drawing
    pub const CULL_SCALE: f32 = 0.5;

    /// Height of the pointer hit band of a color row
    pub const PICKER_HIT_HEIGHT: f32 = 32.0;

    /// Minimum node area requested by a color widget
    pub const MIN_SIZE: [f32; 2] = [150.0, 30.0];

    /// Horizontal inset of the swatch inside its row
    pub const SWATCH_MARGIN: f32 = 15.0;

    /// Fixed row height of a color widget
    pub const ROW_HEIGHT: f32 = 20.0;

    /// Label font size
    pub const LABEL_FONT_SIZE: f32 = 14.0;
}

/// Widget mode tags
pub mod widget {
    /// Type tag reported for widgets that are hidden behind an input socket
    pub const CONVERTED_TYPE: &str = "converted-widget";

    /// Kind tag of closed choice-set widgets
    pub const COMBO: &str = "COMBO";
}
