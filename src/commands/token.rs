//! Sign-jwt command - Prints an API key for a role.

use super::secret_store;
use crate::cli::args::SignJwtArgs;
use crate::config::Config;
use crate::domain::{ExpiresIn, TokenRequest};
use crate::errors::AppResult;
use crate::services::{TokenIssuer, TokenService};

/// Execute the sign-jwt command
pub async fn execute(args: SignJwtArgs, config: Config) -> AppResult<()> {
    let expires_in: ExpiresIn = args.expires_in.parse()?;
    let request = TokenRequest::for_role(&args.role, args.issuer, expires_in);

    let issuer = TokenIssuer::new(secret_store(&config), config.jwt_secret_id.clone());
    println!("{}", issuer.issue(&request).await?);
    Ok(())
}
