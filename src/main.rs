mod app;
mod graph;
mod util;
mod wallet;

use clap::Parser;

use wallet::{DetailLevel, JsonDirSource};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory holding captured explorer exports, one `<address>.json` per address.
    #[arg(long)]
    data_dir: std::path::PathBuf,

    /// Address whose transaction neighborhood to inspect first.
    #[arg(long)]
    address: String,

    /// How many transaction records feed the graph.
    #[arg(long, value_enum, default_value = "medium")]
    detail: DetailLevel,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "txscope",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::TxScopeApp::new(
                cc,
                JsonDirSource::new(args.data_dir.clone()),
                args.address.clone(),
                args.detail,
            )))
        }),
    )
}
