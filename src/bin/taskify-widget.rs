//! Read-only projection of today's reminders, as the home-screen widget shows them

use anyhow::Result;
use chrono::Local;
use clap::Parser;

use taskify::config::Config;
use taskify::store::TaskStoreReader;
use taskify::widget::{render_entry, WidgetTimeline, WIDGET_KIND};

#[derive(Parser)]
#[command(name = "taskify-widget")]
#[command(about = "Show the tasks due today the way the widget does")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Output the timeline entry as JSON
    #[arg(long)]
    json: bool,
    /// Ignore the cached entry and rebuild from the task store
    #[arg(long)]
    fresh: bool,
}

fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let reader = TaskStoreReader::open(&config.data_location);
    let timeline = WidgetTimeline::new(config.widget_dir(), WIDGET_KIND);

    let now = Local::now();
    let entry = if args.fresh {
        timeline.rebuild(&reader, now)
    } else {
        timeline.current(&reader, now)
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        print!("{}", render_entry(&entry));
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {:#}", e);
        std::process::exit(2);
    }
}
