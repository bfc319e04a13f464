use std::path::PathBuf;

use chanlog::{LogBridge, LogConfig, LoggingSystem};

fn main() {
    let dir = PathBuf::from("/tmp/chanlog_example_rotation");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();

    let logging = LoggingSystem::new();
    let config = LogConfig::new(&dir, "app.log")
        .with_size(4_096)
        .with_count(3)
        .with_level("main", "debug")
        .with_level("rotation_demo", "info")
        .with_level("DEFAULT", "warn")
        .with_console(true);
    if let Err(e) = logging.initialise(&config) {
        logging.fatal(&format!("unable to start logging: {e}")).exit();
    }
    LogBridge::new(logging.clone())
        .install()
        .expect("Unable to install log bridge");

    let main = logging.channel("main").unwrap();
    let worker = logging.channel("worker").unwrap();
    for i in 0..200 {
        chanlog::debug!(main, "Log message number {i}");
        worker.info("hidden until the level is lowered");
        if i == 100 {
            logging.update_channel_level("worker", "info").unwrap();
        }
    }
    log::info!(target: "rotation_demo", "routed through the log facade");

    println!("{}", logging.list_levels().to_json().unwrap());
    logging.finalise();

    let files: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with("app.log"))
        .collect();

    println!("\n--- Rotation Summary ---");
    println!("Log directory: {}", dir.display());
    println!("Files (count=3 rolls + live file): {}", files.len());
    for f in &files {
        println!("  {f}");
    }
    assert!(files.len() <= 4, "count should keep at most 3 rolled files");
}
