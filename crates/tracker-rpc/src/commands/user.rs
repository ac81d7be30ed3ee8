use super::Session;
use crate::cli::OutputFormat;
use crate::output::output_result;
use anyhow::{Context, Result};

pub fn handle_user(session: &Session<'_>, format: OutputFormat) -> Result<()> {
    let user = session
        .client
        .user_info(session.ctx, session.tracker)
        .context("Failed to fetch current user")?;

    output_result(&user, format);
    Ok(())
}
