//! Seed an initial admin account on a ragline deployment.
//!
//! Signs in as the target admin user to detect an existing account; when
//! absent, creates it via sign-up. Re-running against an already seeded
//! service is a no-op success.
//!
//! # Usage
//!
//! ```bash
//! # Seed the default admin user against RAGLINE_BASE_URL
//! ragline-seed
//!
//! # Seed a custom admin user
//! ragline-seed --base-url https://rag.example.com/ \
//!     --username admin --email admin@example.com --password s3cret
//! ```

use arrrg::CommandLine;
use arrrg_derive::CommandLine;

use ragline::{NewUser, Ragline};

const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
const DEFAULT_ADMIN_PASSWORD: &str = "adminpassword";

/// Command-line arguments for the ragline-seed tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
struct Args {
    /// Base URL of the ragline service.
    #[arrrg(optional, "Base URL of the ragline service", "URL")]
    base_url: Option<String>,

    /// Username of the admin account.
    #[arrrg(optional, "Username of the admin account (default: admin)", "NAME")]
    username: Option<String>,

    /// Email of the admin account.
    #[arrrg(optional, "Email of the admin account", "EMAIL")]
    email: Option<String>,

    /// Password of the admin account.
    #[arrrg(optional, "Password of the admin account", "PASSWORD")]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = Args::from_command_line_relaxed("ragline-seed [OPTIONS]");

    let username = args
        .username
        .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string());
    let email = args.email.unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string());
    let password = args
        .password
        .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string());

    let client = Ragline::new(args.base_url)?;

    // An existing account means the deployment is already seeded.
    match client.sign_in(&username, &password).await {
        Ok(_) => {
            println!("Admin user '{username}' already exists.");
            return Ok(());
        }
        Err(err) if err.is_authentication() => {}
        Err(err) => return Err(err.into()),
    }

    let new_user = NewUser::new(&username, &email, &password);
    match client.sign_up(&new_user).await {
        Ok(user) => {
            println!(
                "Admin user '{}' created successfully{}",
                user.username,
                user.id
                    .map(|id| format!(" with ID: {id}"))
                    .unwrap_or_default()
            );
            if !user.active {
                println!("Note: the account is inactive until activated server-side.");
            }
            Ok(())
        }
        Err(err) if err.is_bad_request() => {
            // Account exists but the supplied password differs.
            println!("Admin user '{username}' already exists.");
            Ok(())
        }
        Err(err) => {
            eprintln!("Error creating admin user: {err}");
            Err(err.into())
        }
    }
}
