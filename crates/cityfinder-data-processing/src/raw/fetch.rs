use super::{DataSource, Result};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};
use zip::ZipArchive;

/// Downloads the zipped dump for `data_source` and extracts its city file to `dest`.
///
/// The archive is streamed into a temporary file first; `dest` is only written once the
/// download has completed, so an interrupted download never leaves a truncated dump behind.
#[instrument(name = "Download city dump", skip_all, fields(source = %data_source), level = "info")]
pub fn download_data(data_source: DataSource, dest: &Path) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let url = data_source.geonames_url();

    let zip_temp_file = rt.block_on(async {
        let client = Client::new();
        download_to_temp_file(&client, &url).await
    })?;
    info!(path = ?zip_temp_file.path(), "ZIP download complete");

    extract_entry_from_zip(zip_temp_file.path(), data_source.file_name(), dest)
}

async fn download_to_temp_file(client: &Client, url: &str) -> Result<NamedTempFile> {
    info!(url, "Starting download");
    let response = client.get(url).send().await?.error_for_status()?;

    let total_size = response.content_length().unwrap_or(0);

    let pb = ProgressBar::new(total_size);
    let style = ProgressStyle::default_bar()
        .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
        .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars("█░"));
    pb.set_style(style);
    pb.set_message(format!(
        "Downloading {}",
        url.split('/').next_back().unwrap_or(url)
    ));

    let temp_file = NamedTempFile::new()?;
    let mut dest_file = tokio::fs::File::create(temp_file.path()).await?;

    let mut stream = response.bytes_stream();
    while let Some(item) = stream.next().await {
        let chunk = item?;
        dest_file.write_all(&chunk).await?;
        pb.inc(chunk.len() as u64);
    }
    dest_file.flush().await?;
    pb.finish_and_clear();
    Ok(temp_file)
}

fn extract_entry_from_zip(zip_file_path: &Path, entry_name: &str, dest: &Path) -> Result<()> {
    let zip_fs_file = fs::File::open(zip_file_path)?;
    let mut archive = ZipArchive::new(zip_fs_file)?;

    let mut file_in_zip = archive.by_name(entry_name)?;

    let dest_dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dest_dir)?;
    // Extract next to the destination and rename, so readers never see a partial file.
    let staging = NamedTempFile::new_in(dest_dir)?;
    let mut staging_file = staging.reopen()?;
    std::io::copy(&mut file_in_zip, &mut staging_file)?;
    staging.persist(dest).map_err(|e| e.error)?;

    info!(path = ?dest, "File extracted successfully");
    Ok(())
}
