//! Markup handling for Segue
//!
//! Parses fetched documents, extracts the container fragment, and models the
//! elements that navigation events fire on.

mod dom;
pub mod html;

pub use dom::{Container, Element, SelectorList};
pub use html::{Extracted, Fragment, HtmlParser};
