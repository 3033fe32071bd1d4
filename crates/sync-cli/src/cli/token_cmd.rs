use super::*;
pub(super) fn handle_token(args: TokenArgs, ctx: &CliContext) -> anyhow::Result<()> {
    let account = auth::account_for_base_url(&ctx.config.base_url)?;
    match args.command {
        TokenCommands::Set(args) => {
            let token = args.token.trim();
            if token.is_empty() {
                anyhow::bail!("token must not be empty");
            }
            auth::set_token(&account, token)?;
            auth::get_token(&account)
                .context("read token from keyring after write")?
                .context("token missing from keyring after write")?;
            info!(account = %account, "token stored");
            println!("Token stored for {account}");
        }
        TokenCommands::Clear => {
            if auth::clear_token(&account)? {
                println!("Token removed for {account}");
            } else {
                println!("No token stored for {account}");
            }
        }
    }
    Ok(())
}
