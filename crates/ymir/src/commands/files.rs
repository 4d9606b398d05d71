//! `ymir files <printer>`: list files on the printer host's local storage.

use chrono::Local;
use tabled::Tabled;

use ymir_core::PrinterFile;

use crate::cli::{GlobalOpts, PrinterArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "Name")]
    display: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Uploaded")]
    uploaded: String,
}

fn file_row(f: &PrinterFile) -> FileRow {
    FileRow {
        display: f.display.clone(),
        path: f.path.clone(),
        kind: output::or_dash(f.kind.as_deref()),
        size: output::or_dash(f.size.map(human_size)),
        uploaded: output::or_dash(
            f.uploaded_at
                .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()),
        ),
    }
}

pub async fn handle(args: PrinterArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_config(global)?;
    let monitor = super::build_monitor(&config, &args.printer)?;
    let files = monitor
        .list_files()
        .await
        .map_err(|e| CliError::from_core(e, &args.printer))?;

    let out = output::render_list(global.output, &files, file_row, |f| f.path.clone())?;
    output::print_output(&out, global.quiet)
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for &next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}
