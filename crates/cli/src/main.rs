use anyhow::{Context, Result};
use clap::{Arg, Command};

mod commands;

fn build_cli() -> Command {
    Command::new("storynook")
        .version("0.1.0")
        .author("Storynook Contributors")
        .about("Bedtime story library manager and player")
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .value_name("PATH")
                .help("Path to the database file")
                .default_value("storynook.db")
                .global(true),
        )
        .arg(
            Arg::new("media-dir")
                .short('m')
                .long("media-dir")
                .value_name("DIR")
                .help("Directory holding imported media files")
                .default_value("media")
                .global(true),
        )
        .subcommand(Command::new("init").about("Initialize the database and media directory"))
        .subcommand(
            Command::new("list")
                .about("List all stories in the library")
                .arg(
                    Arg::new("songs")
                        .short('s')
                        .long("songs")
                        .help("Show only songs")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("add")
                .about("Add a story, copying its audio into the library")
                .arg(Arg::new("audio").required(true).value_name("FILE").help("Path to the audio file"))
                .arg(Arg::new("title").short('t').long("title").value_name("TITLE").help("Story title"))
                .arg(Arg::new("voiced-by").short('v').long("voiced-by").value_name("NAME").help("Who recorded the story"))
                .arg(Arg::new("kind").short('k').long("kind").value_name("KIND").help("Kind of recording").value_parser(["story", "song"]).default_value("story"))
                .arg(Arg::new("image").short('i').long("image").value_name("FILE").help("Thumbnail image (optional)")),
        )
        .subcommand(
            Command::new("info")
                .about("Show detailed information about a story")
                .arg(Arg::new("id").required(true).value_name("STORY_ID").help("Story ID")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a story and its media files")
                .arg(Arg::new("id").required(true).value_name("STORY_ID").help("Story ID to delete")),
        )
        .subcommand(
            Command::new("reconcile")
                .about("Repair the library: sweep orphan files, purge broken records"),
        )
        .subcommand(Command::new("stats").about("Show library statistics"))
        .subcommand(
            Command::new("play")
                .about("Play a story through the playback controller")
                .arg(Arg::new("id").required(true).value_name("STORY_ID").help("Story ID to play"))
                .arg(
                    Arg::new("queue")
                        .short('q')
                        .long("queue")
                        .value_name("STORY_ID")
                        .help("Additional story IDs to queue after the first")
                        .action(clap::ArgAction::Append),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = build_cli().get_matches();

    let db_path = matches
        .get_one::<String>("database")
        .map(|s| s.as_str())
        .unwrap_or("storynook.db");
    let media_dir = matches
        .get_one::<String>("media-dir")
        .map(|s| s.as_str())
        .unwrap_or("media");

    match matches.subcommand() {
        Some(("init", _)) => commands::init_library(db_path, media_dir).await,
        Some(("list", sub_matches)) => commands::list_stories(db_path, media_dir, sub_matches).await,
        Some(("add", sub_matches)) => commands::add_story(db_path, media_dir, sub_matches).await,
        Some(("info", sub_matches)) => commands::show_story_info(db_path, media_dir, sub_matches).await,
        Some(("delete", sub_matches)) => commands::delete_story(db_path, media_dir, sub_matches).await,
        Some(("reconcile", _)) => commands::reconcile(db_path, media_dir).await,
        Some(("stats", _)) => commands::show_stats(db_path, media_dir).await,
        Some(("play", sub_matches)) => commands::play_story(db_path, media_dir, sub_matches).await,
        _ => {
            build_cli().print_help().context("Failed to print help")?;
            Ok(())
        }
    }
}
