//! `ymir printers`: list configured printers. No network access.

use serde::Serialize;
use tabled::Tabled;

use ymir_config::{Config, PrinterProfile};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct PrinterSummary<'a> {
    id: &'a str,
    name: Option<&'a str>,
    url: &'a str,
    auto_connect: bool,
    api_type: Option<&'a str>,
    location: Option<&'a str>,
    make: Option<&'a str>,
    model: Option<&'a str>,
    tags: &'a [String],
}

impl<'a> PrinterSummary<'a> {
    fn new(id: &'a str, profile: &'a PrinterProfile) -> Self {
        Self {
            id,
            name: profile.name.as_deref(),
            url: &profile.url,
            auto_connect: profile.auto_connect,
            api_type: profile.api_type.as_deref(),
            location: profile.location.as_deref(),
            make: profile.make.as_deref(),
            model: profile.model.as_deref(),
            tags: &profile.tags,
        }
    }
}

#[derive(Tabled)]
struct PrinterRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Reconnect")]
    auto_connect: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

fn printer_row(p: &PrinterSummary<'_>) -> PrinterRow {
    let model = match (p.make, p.model) {
        (Some(make), Some(model)) => format!("{make} {model}"),
        (Some(only), None) | (None, Some(only)) => only.to_owned(),
        (None, None) => "-".into(),
    };
    PrinterRow {
        id: p.id.to_owned(),
        name: output::or_dash(p.name),
        url: p.url.to_owned(),
        auto_connect: if p.auto_connect { "auto" } else { "off" }.into(),
        model,
        location: output::or_dash(p.location),
        tags: if p.tags.is_empty() {
            "-".into()
        } else {
            p.tags.join(", ")
        },
    }
}

fn summaries(config: &Config) -> Vec<PrinterSummary<'_>> {
    config
        .printers
        .iter()
        .map(|(id, profile)| PrinterSummary::new(id, profile))
        .collect()
}

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_config(global)?;
    let printers = summaries(&config);
    let out = output::render_list(
        global.output,
        &printers,
        printer_row,
        |p| p.id.to_owned(),
    )?;
    output::print_output(&out, global.quiet)
}
