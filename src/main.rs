// SPDX-License-Identifier: MIT

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;

use turnstile_rs::template::{TemplateRenderer, TemplateSpec};
use turnstile_rs::ConfigLoader;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a requirement config against a turn fixture
    Check {
        /// Path to the requirement YAML
        #[arg(short, long)]
        config: String,

        /// Path to the turn fixture YAML (session + analyzed text)
        #[arg(short, long)]
        turn: String,
    },
    /// Render a template spec against a params file
    Render {
        /// Path to the template YAML
        #[arg(short, long)]
        template: String,

        /// Path to a YAML mapping of render parameters
        #[arg(short, long)]
        params: String,
    },
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Check { config, turn } => {
            let loader = ConfigLoader::default();
            let requirement = loader
                .load_requirement(&config)
                .with_context(|| format!("loading requirement from {config}"))?;
            let mut fixture = loader
                .load_turn(&turn)
                .with_context(|| format!("loading turn fixture from {turn}"))?;

            log::info!(
                "checking '{}' for session '{}'",
                requirement.type_name(),
                fixture.session.id
            );
            let result = requirement.check(
                &fixture.text,
                &mut fixture.session,
                fixture.params.as_ref(),
            )?;
            println!("{result}");
        }
        Commands::Render { template, params } => {
            let template_src = std::fs::read_to_string(&template)
                .with_context(|| format!("reading template from {template}"))?;
            let spec: TemplateSpec =
                serde_yaml::from_str(&template_src).context("parsing template spec")?;
            let renderer = TemplateRenderer::compile(&spec)?;

            let params_src = std::fs::read_to_string(&params)
                .with_context(|| format!("reading params from {params}"))?;
            let context: serde_json::Map<String, serde_json::Value> =
                serde_yaml::from_str(&params_src).context("parsing render params")?;

            let rendered = renderer.render(&context)?;
            println!("{rendered}");
        }
    }

    Ok(())
}
