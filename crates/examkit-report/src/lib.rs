//! examkit-report: self-contained HTML rendering of exam reports.

pub mod html;

pub use html::{generate_html, write_html_report};
