use std::error::Error;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use engine::{Engine, Grams, MaterialCategory};
use migration::MigratorTrait;
use sea_orm::Database;

#[derive(Parser, Debug)]
#[command(name = "millroom_admin")]
#[command(about = "Admin utilities for Millroom (bootstrap materials)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./millroom.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Material(Material),
}

#[derive(Args, Debug)]
struct Material {
    #[command(subcommand)]
    command: MaterialCommand,
}

#[derive(Subcommand, Debug)]
enum MaterialCommand {
    Create(MaterialCreateArgs),
    List(MaterialListArgs),
}

#[derive(Args, Debug)]
struct MaterialCreateArgs {
    #[arg(long)]
    name: String,
    /// `rubber`, `chemical`, or any other category label.
    #[arg(long, default_value = "rubber")]
    category: String,
    /// Opening stock in kilograms, e.g. `100.5`. Posts an initial entry.
    #[arg(long)]
    opening_balance: Option<String>,
}

#[derive(Args, Debug)]
struct MaterialListArgs {
    #[arg(long)]
    category: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = Database::connect(&cli.database_url).await?;
    migration::Migrator::up(&db, None).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Material(material) => match material.command {
            MaterialCommand::Create(args) => {
                let opening = args
                    .opening_balance
                    .as_deref()
                    .map(str::parse::<Grams>)
                    .transpose()?;
                let material = engine
                    .new_material(
                        &args.name,
                        MaterialCategory::from(args.category.as_str()),
                        opening,
                        Utc::now(),
                    )
                    .await?;
                println!(
                    "created material {} ({}) with balance {}",
                    material.name, material.id, material.balance_g
                );
            }
            MaterialCommand::List(args) => {
                let mut materials = engine.materials(args.category.as_deref()).await?;
                materials.sort_by(|a, b| a.name.cmp(&b.name));
                for material in materials {
                    println!(
                        "{}\t{}\t{}\t{}",
                        material.id, material.name, material.category, material.balance_g
                    );
                }
            }
        },
    }

    Ok(())
}
