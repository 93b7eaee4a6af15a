use std::{error::Error, io::Write};

use chrono::{DateTime, Duration, Utc};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Currency, Engine, Role, users};
use migration::MigratorTrait;
use sea_orm::{ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "ledger_admin")]
#[command(about = "Admin utilities for shared ledgers (bootstrap users, ledgers, invitations)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./ledgers.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Ledger(Ledger),
    Invitation(Invitation),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct Ledger {
    #[command(subcommand)]
    command: LedgerCommand,
}

#[derive(Subcommand, Debug)]
enum LedgerCommand {
    Create(LedgerCreateArgs),
}

#[derive(Args, Debug)]
struct LedgerCreateArgs {
    /// Username of the owner.
    #[arg(long)]
    owner: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, value_parser = parse_currency)]
    currency: Option<Currency>,
}

#[derive(Args, Debug)]
struct Invitation {
    #[command(subcommand)]
    command: InvitationCommand,
}

#[derive(Subcommand, Debug)]
enum InvitationCommand {
    Create(InvitationCreateArgs),
}

#[derive(Args, Debug)]
struct InvitationCreateArgs {
    /// Username of the inviting member.
    #[arg(long = "as")]
    actor: String,
    #[arg(long)]
    ledger: Uuid,
    #[arg(long, default_value = "viewer", value_parser = parse_role)]
    role: Role,
    /// 0 means unlimited.
    #[arg(long, default_value_t = 0)]
    max_uses: u32,
    /// Lifetime in hours; omitted means the invitation never expires.
    #[arg(long)]
    expires_in_hours: Option<i64>,
    /// Base URL printed in front of the token.
    #[arg(long, env = "PUBLIC_URL", default_value = "http://localhost:43000")]
    public_url: String,
}

fn parse_currency(raw: &str) -> Result<Currency, String> {
    Currency::try_from(raw).map_err(|err| err.to_string())
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::try_from(raw).map_err(|err| err.to_string())
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let first = prompt_password("Password: ")?;
        if first.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        if first == prompt_password("Confirm password: ")? {
            return Ok(first);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Resolves a username to the user id the engine works with.
async fn user_id(
    db: &DatabaseConnection,
    username: &str,
) -> Result<String, Box<dyn Error + Send + Sync>> {
    let user = users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await?;
    match user {
        Some(user) => Ok(user.id),
        None => Err(format!("user not found: {username}").into()),
    }
}

fn expiry(hours: Option<i64>) -> Option<DateTime<Utc>> {
    hours.map(|hours| Utc::now() + Duration::hours(hours))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            if users::Entity::find()
                .filter(users::Column::Username.eq(&args.username))
                .one(&db)
                .await?
                .is_some()
            {
                eprintln!("user already exists: {}", args.username);
                std::process::exit(1);
            }

            let password = prompt_password_twice()?;
            let id = Uuid::new_v4().to_string();
            let user = users::ActiveModel {
                id: Set(id.clone()),
                username: Set(args.username.clone()),
                password: Set(password),
            };
            users::Entity::insert(user).exec(&db).await?;

            println!("created user: {} ({id})", args.username);
        }
        Command::Ledger(Ledger {
            command: LedgerCommand::Create(args),
        }) => {
            let owner = user_id(&db, &args.owner).await?;
            let engine = Engine::builder().database(db.clone()).build().await?;
            let ledger = engine
                .create_ledger(&owner, &args.name, args.description.as_deref(), args.currency)
                .await?;
            println!(
                "created ledger: {} ({}, {})",
                ledger.name, ledger.id, ledger.currency
            );
        }
        Command::Invitation(Invitation {
            command: InvitationCommand::Create(args),
        }) => {
            let actor = user_id(&db, &args.actor).await?;
            let engine = Engine::builder().database(db.clone()).build().await?;
            let invitation = engine
                .create_invitation(
                    &actor,
                    args.ledger,
                    args.role,
                    args.max_uses,
                    expiry(args.expires_in_hours),
                )
                .await?;
            println!("token: {}", invitation.token);
            println!(
                "link:  {}/join/{}",
                args.public_url.trim_end_matches('/'),
                invitation.token
            );
        }
    }

    Ok(())
}
