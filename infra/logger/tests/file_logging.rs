use fhub_logger::Logger;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn file_logging_writes_json_lines() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");

    let logger = Logger::builder("fhub-file-logging")
        .console(false)
        .dir(Some(log_dir.clone()))
        .json(true)
        .init()?;
    assert!(logger.has_file_output());

    tracing::info!(tracking_number = "TAS1", "package received");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(&log_file)?;
    assert!(contents.contains("\"tracking_number\":\"TAS1\""), "got: {contents}");

    Ok(())
}
