// Command dispatch for the `ssw` binary

use anyhow::{Context, Result};
use clap::Subcommand;
use dialoguer::Password;
use serde::Serialize;
use std::sync::Arc;

use crate::auth::TokenStore;
use crate::endpoints::{AuthApi, CharacterApi, ShipApi};
use crate::http_client::ApiClient;
use crate::models::{
    AuthResponse, CharacterAttributes, CreateCharacterRequest, CreateShipRequest,
    LoginCredentials, ShipStats, ShipType, SignupCredentials,
};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account and store its session
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        display_name: String,
        /// Prompted for when omitted
        #[arg(long, env = "SSW_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long, env = "SSW_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in profile
    Me,

    /// Character commands
    #[command(subcommand)]
    Character(CharacterCommand),

    /// Ship commands
    #[command(subcommand)]
    Ship(ShipCommand),
}

#[derive(Subcommand, Debug)]
pub enum CharacterCommand {
    /// Create a character for the logged-in profile
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "sol")]
        home_sector: String,
        #[arg(long, default_value = "4")]
        piloting: u8,
        #[arg(long, default_value = "4")]
        engineering: u8,
        #[arg(long, default_value = "4")]
        science: u8,
        #[arg(long, default_value = "4")]
        tactics: u8,
        #[arg(long, default_value = "4")]
        leadership: u8,
    },
    /// Show one character
    Get { id: String },
    /// List characters of the logged-in profile
    List,
    /// Rename a character
    Rename { id: String, name: String },
}

#[derive(Subcommand, Debug)]
pub enum ShipCommand {
    /// Create a ship owned by a character
    Create {
        #[arg(long)]
        owner: String,
        #[arg(long = "type", default_value = "scout")]
        ship_type: ShipType,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "6")]
        hull_strength: u8,
        #[arg(long, default_value = "6")]
        shield_capacity: u8,
        #[arg(long, default_value = "6")]
        speed: u8,
        #[arg(long, default_value = "6")]
        cargo_space: u8,
        #[arg(long, default_value = "6")]
        sensors: u8,
    },
    /// Show one ship
    Get { id: String },
    /// List ships owned by a character
    List {
        #[arg(long)]
        owner: String,
    },
    /// Rename a ship
    Rename { id: String, name: String },
}

/// Execute one command against the shared client
pub async fn run(command: Command, client: Arc<ApiClient>) -> Result<()> {
    let store = client.store().clone();

    match command {
        Command::Signup {
            email,
            display_name,
            password,
        } => {
            let credentials = SignupCredentials {
                email,
                password: password_or_prompt(password)?,
                display_name,
            };
            let session = AuthApi::new(client.clone()).signup(&credentials).await?;
            start_session(&client, store.as_ref(), &session).await?;
            println!("Account created.");
        }

        Command::Login { email, password } => {
            let credentials = LoginCredentials {
                email,
                password: password_or_prompt(password)?,
            };
            let session = AuthApi::new(client.clone()).login(&credentials).await?;
            start_session(&client, store.as_ref(), &session).await?;
            println!("Logged in.");
        }

        Command::Logout => {
            store.clear_tokens().await.context("Failed to clear stored session")?;
            println!("Logged out.");
        }

        Command::Me => {
            let profile = AuthApi::new(client.clone()).me().await?;
            print_json(&profile)?;
        }

        Command::Character(command) => run_character(command, client, store.as_ref()).await?,

        Command::Ship(command) => run_ship(command, client).await?,
    }

    Ok(())
}

async fn run_character(
    command: CharacterCommand,
    client: Arc<ApiClient>,
    store: &dyn TokenStore,
) -> Result<()> {
    let api = CharacterApi::new(client);

    match command {
        CharacterCommand::Create {
            name,
            home_sector,
            piloting,
            engineering,
            science,
            tactics,
            leadership,
        } => {
            let request = CreateCharacterRequest {
                profile_id: require_profile_id(store).await?,
                name,
                home_sector,
                attributes: CharacterAttributes {
                    piloting,
                    engineering,
                    science,
                    tactics,
                    leadership,
                },
            };
            print_json(&api.create(&request).await?)?;
        }
        CharacterCommand::Get { id } => print_json(&api.get_by_id(&id).await?)?,
        CharacterCommand::List => {
            let profile_id = require_profile_id(store).await?;
            print_json(&api.get_by_profile(&profile_id).await?)?;
        }
        CharacterCommand::Rename { id, name } => {
            let ack = api.rename(&id, &name).await?;
            println!("{}", ack.message);
        }
    }

    Ok(())
}

async fn run_ship(command: ShipCommand, client: Arc<ApiClient>) -> Result<()> {
    let api = ShipApi::new(client);

    match command {
        ShipCommand::Create {
            owner,
            ship_type,
            name,
            hull_strength,
            shield_capacity,
            speed,
            cargo_space,
            sensors,
        } => {
            let request = CreateShipRequest {
                owner_id: owner,
                ship_type,
                name,
                stat_allocation: ShipStats {
                    hull_strength,
                    shield_capacity,
                    speed,
                    cargo_space,
                    sensors,
                },
            };
            print_json(&api.create(&request).await?)?;
        }
        ShipCommand::Get { id } => print_json(&api.get_by_id(&id).await?)?,
        ShipCommand::List { owner } => print_json(&api.get_by_owner(&owner).await?)?,
        ShipCommand::Rename { id, name } => {
            let ack = api.rename(&id, &name).await?;
            println!("{}", ack.message);
        }
    }

    Ok(())
}

/// Persist a new session and cache the profile id it belongs to
pub async fn start_session(
    client: &Arc<ApiClient>,
    store: &dyn TokenStore,
    session: &AuthResponse,
) -> Result<()> {
    store
        .set_tokens(&session.access_token, &session.refresh_token)
        .await
        .context("Failed to store session tokens")?;

    let profile = AuthApi::new(client.clone()).me().await?;
    store
        .set_profile_id(&profile.profile_id)
        .await
        .context("Failed to store profile id")?;

    tracing::info!(
        profile_id = %profile.profile_id,
        "Session started for {}",
        profile.display_name
    );
    Ok(())
}

async fn require_profile_id(store: &dyn TokenStore) -> Result<String> {
    store
        .profile_id()
        .await
        .context("Failed to read profile id")?
        .context("Not logged in (run `ssw login` first)")
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password")?,
    };

    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }
    Ok(password)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to format output")?;
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::config::ClientSettings;
    use clap::Parser;
    use mockito::Server;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    #[test]
    fn test_parse_ship_create() {
        let cli = TestCli::parse_from([
            "ssw", "ship", "create", "--owner", "c1", "--type", "trader", "--speed", "10",
        ]);
        match cli.command {
            Command::Ship(ShipCommand::Create {
                owner,
                ship_type,
                speed,
                sensors,
                ..
            }) => {
                assert_eq!(owner, "c1");
                assert_eq!(ship_type, ShipType::Trader);
                assert_eq!(speed, 10);
                assert_eq!(sensors, 6);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_password_must_not_be_empty() {
        assert!(password_or_prompt(Some(String::new())).is_err());
        assert_eq!(password_or_prompt(Some("hunter2".into())).unwrap(), "hunter2");
    }

    #[tokio::test]
    async fn test_start_session_stores_tokens_and_profile() {
        let mut server = Server::new_async().await;
        let me_mock = server
            .mock("GET", "/auth/me")
            .match_header("authorization", "Bearer access-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":{"account_id":"a1","email":"nova@example.com","status":"active",
                "home_region":"eu","profile_id":"p-7","display_name":"Nova","active_sessions":1}}"#,
            )
            .create_async()
            .await;

        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
        let settings = ClientSettings {
            base_url: server.url(),
            ..ClientSettings::default()
        };
        let client = Arc::new(ApiClient::new(&settings, store.clone()).unwrap());

        let session = AuthResponse {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 900,
            session_id: "s1".to_string(),
        };
        start_session(&client, store.as_ref(), &session).await.unwrap();

        assert_eq!(store.refresh_token().await.unwrap().as_deref(), Some("refresh-1"));
        assert_eq!(store.profile_id().await.unwrap().as_deref(), Some("p-7"));
        me_mock.assert_async().await;
    }
}
