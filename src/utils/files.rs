use std::path::{Path, PathBuf};

use anyhow::Result;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::info;

use crate::error::{BotError, BotResult};

const PHOTO_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

fn is_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PHOTO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

async fn download_file(bot: &Bot, file_id: &str, dest_dir: &Path, file_name: &str) -> Result<String> {
    let file = bot.get_file(file_id).await?;
    tokio::fs::create_dir_all(dest_dir).await?;

    let file_path: PathBuf = dest_dir.join(file_name);
    let mut dst = tokio::fs::File::create(&file_path).await?;
    bot.download_file(&file.path, &mut dst).await?;

    info!("Downloaded file to {}", file_path.display());
    Ok(file_path.display().to_string())
}

/// Downloads a Telegram photo under a unique name derived from its file id.
pub async fn download_photo(
    bot: &Bot,
    photo_id: &str,
    dest_dir: &Path,
    suffix: &str,
) -> Result<String> {
    let file_name = format!("photo_{photo_id}{suffix}.jpg");
    download_file(bot, photo_id, dest_dir, &file_name).await
}

/// Downloads a Telegram document, keeping its original name in the suffix.
pub async fn download_document(
    bot: &Bot,
    document_id: &str,
    document_name: &str,
    dest_dir: &Path,
    suffix: &str,
) -> Result<String> {
    let file_name = format!("doc_{document_id}{suffix}_{document_name}");
    download_file(bot, document_id, dest_dir, &file_name).await
}

/// Sends a stored file to a chat, as a photo when the extension says so
/// and as a document otherwise.
pub async fn send_file_message(
    bot: &Bot,
    chat_id: ChatId,
    file_path: &str,
    caption: Option<&str>,
) -> BotResult<()> {
    let path = PathBuf::from(file_path);
    let input = InputFile::file(path.clone());

    let result = if is_photo(&path) {
        match caption {
            Some(caption) => bot.send_photo(chat_id, input).caption(caption).await,
            None => bot.send_photo(chat_id, input).await,
        }
    } else {
        match caption {
            Some(caption) => bot.send_document(chat_id, input).caption(caption).await,
            None => bot.send_document(chat_id, input).await,
        }
    };

    result.map_err(|source| BotError::Delivery {
        chat_id: chat_id.0,
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_extension_detection() {
        assert!(is_photo(Path::new("a/b/picture.jpg")));
        assert!(is_photo(Path::new("picture.PNG")));
        assert!(is_photo(Path::new("picture.webp")));
        assert!(!is_photo(Path::new("homework.pdf")));
        assert!(!is_photo(Path::new("no_extension")));
    }
}
