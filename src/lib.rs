#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! `div2-rs` reads and writes the asset formats of DIV Games Studio 2.
//!
//! Palettes (`.PAL`), single images (`.MAP`) and image packages (`.FPG`) are
//! supported, along with PCX and PNG importers feeding them. See
//! [`div2_types`] for the format documentation.

pub use div2_types::*;
