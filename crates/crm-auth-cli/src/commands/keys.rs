use anyhow::Result;
use crm_auth::EncryptionKey;
use serde_json::json;

use crate::cli::{KeyEncoding, KeygenArgs, OutputFormat};
use crate::output::print_value;

pub fn keygen(args: &KeygenArgs, format: OutputFormat) -> Result<()> {
    let key = EncryptionKey::generate()?;
    let encoded = match args.encoding {
        KeyEncoding::Hex => key.to_hex(),
        KeyEncoding::Base64 => key.to_base64(),
    };

    match format {
        OutputFormat::Json => print_value(
            &json!({ "env": crm_auth::token::DEFAULT_KEY_ENV, "key": encoded }),
            format,
        ),
        // Plain text stays pipeable into a secret store.
        OutputFormat::Text => println!("{encoded}"),
    }
    Ok(())
}
