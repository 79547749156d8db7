use clap::Parser;
use drive_oauth::{DRIVE_SCOPE, GOOGLE_TOKEN_URL, OAuthConfig, generate_auth_url, obtain_refresh_token};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// OAuth 2.0 helper tool that obtains a Google Drive refresh token
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// OAuth client ID
    #[arg(long, env = "CLIENT_ID")]
    client_id: String,

    /// OAuth client secret
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// OAuth scope to request
    #[arg(long, default_value = DRIVE_SCOPE)]
    scope: String,

    /// Token endpoint used for the code exchange
    #[arg(long, env = "OAUTH_TOKEN_URL", default_value = GOOGLE_TOKEN_URL)]
    token_url: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = OAuthConfig::new(args.client_id, args.client_secret)
        .with_scope(args.scope)
        .with_token_url(args.token_url);

    let (auth_url, verifier) = generate_auth_url(&config);

    println!("\nOpen this URL in a private/incognito window and approve access:\n");
    println!("{}", auth_url);
    print!("\nPaste authorization code here: ");
    std::io::stdout().flush()?;

    let mut code = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut code).await?;

    // One exchange per run; the operator reruns the tool on failure
    match obtain_refresh_token(&config, &code, &verifier).await {
        Ok(refresh_token) => {
            println!("\nREFRESH TOKEN:\n{}", refresh_token);
            println!("\nSet it as REFRESH_TOKEN for drive-uploader.");
            Ok(())
        }
        Err(e) => {
            eprintln!("\nError getting token: {}", e);
            Err(e.into())
        }
    }
}
