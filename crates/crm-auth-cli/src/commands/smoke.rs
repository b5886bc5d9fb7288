use anyhow::{Context, Result, bail};
use crm_auth::config::loader::load_config;
use crm_auth::{ClientContext, CredentialService, IssuedCredential};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;

use crate::cli::{OutputFormat, SmokeArgs};
use crate::output::{print_success, print_value};

#[derive(Serialize)]
struct SmokeReport {
    kind: String,
    owner: String,
    expires_at: String,
    validated: bool,
    revoked: bool,
    rejected_after_revoke: bool,
}

/// Runs issue, validate, revoke and validate again against an in-memory
/// service built from the loaded configuration.
pub async fn run(path: Option<&str>, args: &SmokeArgs, format: OutputFormat) -> Result<()> {
    let config = load_config(path).context("Configuration is invalid")?;
    let service = CredentialService::from_config(config)?;

    let context = args
        .session
        .as_ref()
        .map(|client| ClientContext::new(None, client.clone()));

    let (issued, validated) = match &context {
        Some(context) => {
            let issued = service
                .issue_session(args.owner.clone(), context.clone(), None)
                .await?;
            let ok = service
                .validate_session(issued.as_str(), context)
                .await
                .is_ok();
            (issued, ok)
        }
        None => {
            let issued = service
                .issue_token(
                    args.owner.clone(),
                    args.scopes.iter().cloned(),
                    service.tokens().default_ttl(),
                )
                .await?;
            let ok = service.validate_token(issued.as_str()).await.is_ok();
            (issued, ok)
        }
    };

    let revoked = service.revoke(issued.as_str()).await;
    let rejected_after_revoke = match &context {
        Some(context) => service.validate_session(issued.as_str(), context).await,
        None => service.validate_token(issued.as_str()).await,
    }
    .is_err();

    let report = report(&issued, &args.owner, validated, revoked, rejected_after_revoke)?;
    print_value(&serde_json::to_value(&report)?, format);

    if !(validated && revoked && rejected_after_revoke) {
        bail!("Credential lifecycle check failed");
    }
    if matches!(format, OutputFormat::Text) {
        print_success("Credential lifecycle check passed");
    }
    Ok(())
}

fn report(
    issued: &IssuedCredential,
    owner: &str,
    validated: bool,
    revoked: bool,
    rejected_after_revoke: bool,
) -> Result<SmokeReport> {
    Ok(SmokeReport {
        kind: issued.kind.to_string(),
        owner: owner.to_string(),
        expires_at: issued.expires_at.format(&Rfc3339)?,
        validated,
        revoked,
        rejected_after_revoke,
    })
}
