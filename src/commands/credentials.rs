//! Credential commands - Provisioning and direct password changes.

use super::{connect, print_json};
use crate::cli::args::{ChangePasswordArgs, ProvisionArgs};
use crate::config::Config;
use crate::domain::{CredentialRequest, Identifier, Password, PasswordChange};
use crate::errors::AppResult;
use crate::services::BootstrapService;

/// Execute the provision command
pub async fn provision(args: ProvisionArgs, config: Config) -> AppResult<()> {
    let mut request = CredentialRequest::new(Identifier::parse(args.username)?, args.secret_id);
    if let Some(password) = args.password {
        request = request.with_password(Password::new(password)?);
    }
    if args.no_ssl {
        request = request.without_ssl();
    }

    let services = connect(&config).await?;
    let provisioned = services.bootstrap().provision(request).await?;
    print_json(&provisioned)
}

/// Execute the change-password command
pub async fn change_password(args: ChangePasswordArgs, config: Config) -> AppResult<()> {
    let change = PasswordChange {
        username: Identifier::parse(args.username)?,
        password: Password::new(args.password)?,
    };

    let services = connect(&config).await?;
    services.bootstrap().change_password(change).await
}
