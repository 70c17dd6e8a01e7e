use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;

use persona_director::features::personas::{selector_options, CREATE_SMART_CHOICE};
use persona_director::{
    ApiOverrides, Config, Director, GenerateRequest, OpenAiClient, Selector, TemplateChoice,
};

#[derive(Parser)]
#[command(name = "persona-director")]
#[command(about = "Evolve a persisted character persona and render image prompts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or update a persona and print its prompts
    Generate {
        /// "Create New (Smart)", "Force Reset (Overwrite)" or an existing persona file
        #[arg(short, long, default_value = CREATE_SMART_CHOICE)]
        persona: String,

        /// Name used when creating a persona
        #[arg(short, long, default_value = "New_Character")]
        name: String,

        /// Description of a new character, or the change to apply
        #[arg(short, long)]
        instruction: String,

        /// "default" or a template file in the templates directory
        #[arg(short, long, default_value = "default")]
        template: String,

        /// Overrides api_url from the config file
        #[arg(long, env = "DIRECTOR_API_URL", default_value = "")]
        api_url: String,

        /// Overrides api_key from the config file
        #[arg(long, env = "DIRECTOR_API_KEY", default_value = "", hide_env_values = true)]
        api_key: String,

        /// Overrides model_name from the config file
        #[arg(long, env = "DIRECTOR_MODEL", default_value = "")]
        model: String,
    },
    /// List persona selector options
    Personas,
    /// List prompt templates
    Templates,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    let director = Director::from_config(&config, Arc::new(OpenAiClient::new()));

    match cli.command {
        Command::Generate {
            persona,
            name,
            instruction,
            template,
            api_url,
            api_key,
            model,
        } => {
            info!("Generating prompts for '{persona}'");
            let request = GenerateRequest {
                selector: Selector::from_choice(&persona),
                new_name: name,
                instruction,
                template: TemplateChoice::from_choice(&template),
                overrides: ApiOverrides {
                    api_url,
                    api_key,
                    model_name: model,
                },
            };

            match director.generate_prompt(&request).await {
                Ok(output) => {
                    let (positive, negative, state) = output.into_tuple();
                    println!("positive_prompt:\n{positive}\n");
                    println!("negative_prompt:\n{negative}\n");
                    println!("debug_state:\n{state}");
                }
                Err(e) => {
                    error!("{e}");
                    return Err(e.into());
                }
            }
        }
        Command::Personas => {
            for option in selector_options(director.store())? {
                println!("{option}");
            }
        }
        Command::Templates => {
            for option in director.templates().options()? {
                println!("{option}");
            }
        }
    }

    Ok(())
}
