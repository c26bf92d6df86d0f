// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Photo downloads from Telegram file storage.
//!
//! Bytes are fetched here so the file URL, which carries the bot token,
//! never leaves the transport.

use supper_core::SupperError;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::FileId;
use tracing::debug;

use crate::transport_error;

/// Largest file the Bot API lets a bot download.
pub const MAX_DOWNLOAD_BYTES: u32 = 20 * 1024 * 1024;

/// Resolves `file_id` with `getFile`, then downloads its content.
pub async fn download_file(bot: &Bot, file_id: &str) -> Result<Vec<u8>, SupperError> {
    let file = bot
        .get_file(FileId(file_id.to_string()))
        .await
        .map_err(|e| transport_error(bot.token(), "getFile", e))?;

    if file.meta.size > MAX_DOWNLOAD_BYTES {
        return Err(SupperError::Transport {
            message: format!("file {file_id} is too large ({} bytes)", file.meta.size),
            source: None,
        });
    }

    let mut buf = Vec::with_capacity(file.meta.size as usize);
    bot.download_file(&file.path, &mut buf)
        .await
        .map_err(|e| transport_error(bot.token(), "file download", e))?;

    debug!(file_id, size = buf.len(), "downloaded file from Telegram");
    Ok(buf)
}
