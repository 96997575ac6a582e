//! Remote list screens: HTTP GET, JSON array binding, screen state machine.
//!
//! # Responsibility
//! - Fetch one JSON array per screen and bind it into display rows.
//! - Surface fetch and payload failures as an explicit screen state.

pub mod adapter;
pub mod http;
pub mod screen;

pub use adapter::{AdapterError, JsonArrayAdapter, ListRow, Projection, SlotText};
pub use http::{FetchError, FetchResult, HttpClient, ReqwestHttpClient};
pub use screen::{
    builtin_screen, goods_type_screen, leave_message_screen, ListScreen, ScreenError, ScreenSpec,
    ScreenState, NAME_SLOT, ROW_LAYOUT,
};
