use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use flowhub_designer::config::DesignerConfig;
use flowhub_designer::designer::{
    ConnectPipeline, CustomRenderer, Diagram, Palette, parse_bpmn, render_document,
};
use flowhub_designer::export::write_output;

/// Process designer toolkit: connection rules and shape rendering for BPMN
#[derive(Parser, Debug)]
#[command(name = "flowhub-designer")]
#[command(version)]
#[command(about = "Check and render FlowHub BPMN process diagrams", long_about = None)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a designer config file (TOML or YAML)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a BPMN diagram to SVG, PNG or PDF
    Render {
        /// Input .bpmn file (use "-" for stdin)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file path (extension determines format: .svg, .png or .pdf)
        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,

        /// Raster scale multiplier for PNG output
        #[arg(long)]
        png_scale: Option<f32>,

        /// Padding around the diagram in pixels
        #[arg(long)]
        padding: Option<f32>,
    },
    /// Replay every sequence flow through the connection rules
    Check {
        /// Input .bpmn file (use "-" for stdin)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Print findings as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the palette entries as JSON
    Palette,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<(), String> {
    let args = Args::parse();

    let default_filter = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = match args.config {
        Some(ref path) => DesignerConfig::load(path).map_err(|e| e.to_string())?,
        None => DesignerConfig::default(),
    };

    match args.command {
        Command::Render {
            input,
            output,
            png_scale,
            padding,
        } => {
            let diagram = load_diagram(&input)?;
            let mut export = config.export.clone();
            if let Some(padding) = padding {
                export.padding = padding;
            }
            let scale = png_scale.unwrap_or(export.png_scale);

            let renderer = CustomRenderer::with_style(config.style.clone());
            let (svg, _, _) = render_document(&diagram, &renderer, &export);
            write_output(&svg, &output, scale).map_err(|e| e.to_string())?;
            eprintln!("Saved to: {}", output.display());
        }
        Command::Check { input, json } => {
            let diagram = load_diagram(&input)?;
            let findings = diagram.audit(&ConnectPipeline::with_connect_rules());

            if json {
                let report = serde_json::to_string_pretty(&findings)
                    .map_err(|e| format!("Failed to serialize findings: {}", e))?;
                println!("{}", report);
            } else {
                for finding in &findings {
                    println!(
                        "{} ({} -> {}): {}",
                        finding.flow_id,
                        finding.source,
                        finding.target,
                        finding.rejection.message(config.locale)
                    );
                }
            }

            if !findings.is_empty() {
                return Err(format!(
                    "{} sequence flow(s) violate connection rules",
                    findings.len()
                ));
            }
            if !json {
                println!(
                    "OK: {} elements, {} sequence flows",
                    diagram.nodes().len(),
                    diagram.flows().len()
                );
            }
        }
        Command::Palette => {
            let listing = serde_json::to_string_pretty(&Palette::new())
                .map_err(|e| format!("Failed to serialize palette: {}", e))?;
            println!("{}", listing);
        }
        Command::Completions { shell } => {
            let mut command = Args::command();
            clap_complete::generate(
                shell,
                &mut command,
                "flowhub-designer",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

fn load_diagram(input: &Path) -> Result<Diagram, String> {
    let source = if input.to_str() == Some("-") {
        let mut buffer = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        buffer
    } else {
        std::fs::read_to_string(input).map_err(|e| format!("Failed to read input file: {}", e))?
    };

    parse_bpmn(&source).map_err(|e| e.to_string())
}
