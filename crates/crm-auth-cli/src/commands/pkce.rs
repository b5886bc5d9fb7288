use anyhow::{Result, bail};
use crm_auth::generate_challenge;
use crm_auth::oauth::verify_pair;
use serde_json::json;

use crate::cli::{OutputFormat, PkceVerifyArgs};
use crate::output::{print_success, print_value};

pub fn generate(format: OutputFormat) -> Result<()> {
    let pkce = generate_challenge()?;
    print_value(
        &json!({
            "code_verifier": pkce.verifier.as_str(),
            "code_challenge": pkce.challenge.as_str(),
            "code_challenge_method": pkce.method.as_str(),
        }),
        format,
    );
    Ok(())
}

pub fn verify(args: &PkceVerifyArgs) -> Result<()> {
    if let Err(e) = verify_pair(&args.verifier, &args.challenge, &args.method) {
        let field = if e.is_verifier_error() {
            "code_verifier"
        } else if e.is_challenge_error() {
            "code_challenge"
        } else {
            "pair"
        };
        tracing::debug!(field, error = %e, "PKCE verification rejected");
        bail!("{} ({field}): {e}", e.oauth_error_code());
    }
    print_success("PKCE verifier matches challenge");
    Ok(())
}
