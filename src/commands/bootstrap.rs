//! Bootstrap command - Migrations followed by role provisioning.

use super::{connect, print_json};
use crate::cli::args::BootstrapArgs;
use crate::config::Config;
use crate::domain::{CredentialRequest, Fingerprint, Identifier};
use crate::errors::AppResult;
use crate::services::BootstrapRequest;

/// Execute the bootstrap command
pub async fn execute(args: BootstrapArgs, config: Config) -> AppResult<()> {
    // Reject bad role names before touching the database
    let roles = args
        .roles
        .into_iter()
        .map(|spec| {
            let request = CredentialRequest::new(Identifier::parse(spec.username)?, spec.secret_id);
            Ok(if args.no_ssl {
                request.without_ssl()
            } else {
                request
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let services = connect(&config).await?;
    let outcome = services
        .bootstrap()
        .apply(BootstrapRequest {
            previous_fingerprint: args.previous_fingerprint.map(Fingerprint::new),
            roles,
        })
        .await?;

    tracing::info!(
        fingerprint = %outcome.completion.fingerprint(),
        roles = outcome.credentials.len(),
        "Bootstrap complete"
    );
    print_json(&outcome)
}
