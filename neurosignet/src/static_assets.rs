//! Stylesheets and scripts compiled into the binary, served under `/static`.

use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "static/"]
pub struct Assets;
