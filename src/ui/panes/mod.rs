//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: Source code display with syntax highlighting, cursor line and error line
//! - [`listing`]: Compiled instructions, highlighting those emitted for the cursor line
//! - [`status`]: Status bar with keybindings and compile state
//!
//! Each pane module exports a primary `render_*` function. Panes are stateless
//! apart from the scroll offsets the caller passes in.

pub mod listing;
pub mod source;
pub mod status;

pub use listing::render_listing_pane;
pub use source::render_source_pane;
pub use status::render_status_bar;
