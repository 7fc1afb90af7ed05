//! Crawl stages, leaves first.
//!
//! | Stage | Module | Input | Output |
//! |-------|--------|-------|--------|
//! | HTML text helpers | [`html`] | element | normalized text |
//! | HTTP fetch | [`fetch`] | URL | body + final URL, or a classified error |
//! | Link discovery | [`links`] | landing page + patterns | absolute URL set |
//! | Fetch pool | [`pool`] | URL set | one result per URL |
//! | Date resolution | [`dates`] | article page + rules + formats | raw and parsed date |
//! | Article extraction | [`article`] | article page | [`ArticleRecord`](crate::models::ArticleRecord) |
//!
//! Only [`fetch`] and [`pool`] suspend. Everything after a page has been
//! fetched is synchronous.

pub mod article;
pub mod dates;
pub mod fetch;
pub mod html;
pub mod links;
pub mod pool;
