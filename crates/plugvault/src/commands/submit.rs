//! Plugin submission command

use anyhow::{anyhow, Context, Result};
use dialoguer::Confirm;
use plugvault_manager::PluginManager;
use plugvault_repository::SubmissionRequest;

use super::common::{open_manager, sync};
use crate::cli::{GlobalArgs, SubmitArgs};
use crate::output;

/// Upload the image, abandoning the submission if that fails
async fn upload(manager: &PluginManager, token: &str, args: &SubmitArgs) -> Result<String> {
    let spinner = output::spinner(&format!("Uploading {}...", args.image));
    let result = manager.upload_image(token, args.image.as_std_path()).await;
    spinner.finish_and_clear();

    match result {
        Ok(message) => Ok(message),
        Err(e) => {
            if let Err(cancel) = manager.cancel_upload().await {
                output::warning(&format!("Could not cancel the submission: {}", cancel));
            }
            Err(anyhow::Error::new(e).context("Failed to upload plugin image"))
        }
    }
}

/// Submit a new plugin for review
///
/// Posts the metadata, then uploads the thumbnail against the token the
/// repository hands back.
pub async fn run(args: SubmitArgs, global: &GlobalArgs) -> Result<()> {
    if !args.image.is_file() {
        return Err(anyhow!("Image {} does not exist", args.image));
    }

    let manager = open_manager(global)?;
    sync(&manager, false).await?;
    if manager.is_name_in_use(&args.name) {
        return Err(anyhow!("A plugin named '{}' already exists", args.name));
    }

    let mut request = SubmissionRequest::new(&args.name);
    request.username = args.username.clone();
    request.user_email = args.email.clone();
    request.repo_url = args.repo_url.clone();
    request.description = args.description.clone();
    request.tags = args.tags.clone();

    output::header("Submission");
    output::kv("Name", &request.name);
    output::kv("Submitter", &format!("{} <{}>", request.username, request.user_email));
    output::kv("Source", &request.repo_url);
    if !request.tags.is_empty() {
        output::kv("Tags", &request.tags.join(", "));
    }

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt("Submit this plugin?")
            .default(true)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            output::info("Cancelled");
            return Ok(());
        }
    }

    let token = manager
        .request_upload_slot(&request)
        .await
        .context("Repository rejected the submission")?;
    let message = upload(&manager, &token, &args).await?;

    output::success("Plugin submitted");
    if !message.trim().is_empty() {
        output::info(message.trim());
    }
    Ok(())
}
