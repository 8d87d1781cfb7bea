use anyhow::{Context, bail};
use curator_client::{ClientConfig, ClientContext};

const USAGE: &str = "usage: curator-client <status | login <email> <password> | login-token <id-token> | logout | can <permission>...>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    curator_observability::init();

    let config = ClientConfig::from_env().context("invalid configuration")?;
    let mut ctx = ClientContext::bootstrap(config).await?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["status"] => print_status(&ctx),
        ["login", email, password] => {
            ctx.sign_in(email, password).await?;
            println!("signed in");
            print_status(&ctx);
        }
        ["login-token", id_token] => {
            ctx.sign_in_with_id_token(id_token).await?;
            println!("signed in");
            print_status(&ctx);
        }
        ["logout"] => {
            if ctx.sign_out().await {
                println!("signed out");
            } else {
                println!("signed out locally");
                eprintln!("warning: logout did not complete cleanly; the server may not have been notified (see logs)");
            }
        }
        ["can", codes @ ..] if !codes.is_empty() => {
            for code in codes {
                let granted = ctx.store().has_permission(code);
                println!("{code}: {}", if granted { "granted" } else { "denied" });
            }
        }
        _ => bail!(USAGE),
    }

    Ok(())
}

fn print_status(ctx: &ClientContext) {
    let store = ctx.store();
    if !store.is_authenticated() {
        println!("not signed in");
        return;
    }

    let who = store
        .user()
        .map(|u| u.display_name())
        .unwrap_or_else(|| "unknown user".to_string());
    let role = store
        .role()
        .and_then(|r| r.name.clone())
        .unwrap_or_else(|| "no role".to_string());
    println!("signed in as {who} ({role}){}", if store.is_superuser() { " [superuser]" } else { "" });

    let mut granted: Vec<_> = store
        .granted_permission_keys()
        .into_iter()
        .map(|code| code.to_string())
        .collect();
    granted.sort();
    println!("permissions: {}", if granted.is_empty() { "none".to_string() } else { granted.join(", ") });
}
